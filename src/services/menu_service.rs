use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::menu::{CreateMenuItemRequest, MenuList, UpdateMenuItemRequest},
    entity::menu_items::{ActiveModel as MenuActive, Column as MenuCol, Entity as MenuItems, Model as MenuModel},
    error::{AppError, AppResult},
    middleware::auth::AdminAccess,
    models::{MenuCategory, MenuItem, from_cents, to_cents},
    response::{ApiResponse, Meta},
    routes::params::MenuQuery,
    state::AppState,
};

fn parse_category(raw: &str) -> AppResult<MenuCategory> {
    MenuCategory::parse(raw.trim())
        .ok_or_else(|| AppError::bad_request("Category must be one of drinks, food, desserts"))
}

fn check_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Name is required"));
    }
    Ok(name.to_string())
}

/// Returns the price in cents.
fn check_price(price: Decimal) -> AppResult<i64> {
    if price < Decimal::ZERO {
        return Err(AppError::bad_request("Price cannot be negative"));
    }
    to_cents(price).ok_or_else(|| AppError::bad_request("Price allows at most two decimal places"))
}

pub async fn list_menu(state: &AppState, query: MenuQuery) -> AppResult<ApiResponse<MenuList>> {
    let mut condition = Condition::all();
    if let Some(category) = query.category {
        condition = condition.add(MenuCol::Category.eq(category.as_str()));
    }
    if let Some(available) = query.available {
        condition = condition.add(MenuCol::Available.eq(available));
    }

    let items = MenuItems::find()
        .filter(condition)
        .order_by_asc(MenuCol::Category)
        .order_by_asc(MenuCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(menu_item_from_entity)
        .collect::<Vec<_>>();

    let meta = Meta::total(items.len() as u64);
    Ok(ApiResponse::success("Menu", MenuList(items), Some(meta)))
}

pub async fn get_menu_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<MenuItem>> {
    let model = MenuItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "OK",
        menu_item_from_entity(model),
        Some(Meta::empty()),
    ))
}

pub async fn create_menu_item(
    state: &AppState,
    actor: &AdminAccess,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let name = check_name(&payload.name)?;
    let price = payload
        .price
        .ok_or_else(|| AppError::bad_request("Price is required"))
        .and_then(check_price)?;
    let category = parse_category(&payload.category)?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let model = MenuActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        price_cents: Set(price),
        category: Set(category.as_str().to_string()),
        description: Set(payload.description.trim().to_string()),
        image: Set(payload.image.trim().to_string()),
        available: Set(payload.available.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        actor.user_id(),
        "menu_item_created",
        Some("menu_items"),
        serde_json::json!({ "menu_item_id": model.id, "name": model.name }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_from_entity(model),
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    actor: &AdminAccess,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let existing = MenuItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: MenuActive = existing.into();
    if let Some(name) = payload.name.as_deref() {
        active.name = Set(check_name(name)?);
    }
    if let Some(price) = payload.price {
        active.price_cents = Set(check_price(price)?);
    }
    if let Some(category) = payload.category.as_deref() {
        active.category = Set(parse_category(category)?.as_str().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(image) = payload.image {
        active.image = Set(image.trim().to_string());
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    active.updated_at = Set(Utc::now().into());

    let model = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        actor.user_id(),
        "menu_item_updated",
        Some("menu_items"),
        serde_json::json!({ "menu_item_id": model.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item updated",
        menu_item_from_entity(model),
        Some(Meta::empty()),
    ))
}

pub async fn delete_menu_item(
    state: &AppState,
    actor: &AdminAccess,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = MenuItems::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        actor.user_id(),
        "menu_item_deleted",
        Some("menu_items"),
        serde_json::json!({ "menu_item_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

fn menu_item_from_entity(model: MenuModel) -> MenuItem {
    let category = MenuCategory::parse(&model.category).unwrap_or_else(|| {
        tracing::warn!(menu_item_id = %model.id, category = %model.category, "unknown menu category, treating as food");
        MenuCategory::Food
    });
    MenuItem {
        id: model.id,
        name: model.name,
        price: from_cents(model.price_cents),
        category,
        description: model.description,
        image: model.image,
        available: model.available,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
