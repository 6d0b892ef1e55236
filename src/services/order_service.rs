use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderItemInput, OrderList},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, from_cents, to_cents},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::credential_store,
    state::AppState,
};

/// Validated order input with its total settled, amounts in cents.
#[derive(Debug)]
struct OrderDraft {
    table_number: i32,
    items: Vec<DraftLine>,
    total_cents: i64,
    customer_name: String,
    phone_number: String,
}

#[derive(Debug)]
struct DraftLine {
    item_id: String,
    name: String,
    price_cents: i64,
    quantity: i32,
}

fn validate(payload: CreateOrderRequest) -> AppResult<OrderDraft> {
    let CreateOrderRequest {
        table_number,
        items,
        total_amount,
        customer_name,
        phone_number,
    } = payload;

    let table_number = match table_number {
        Some(n) if n >= 1 => n,
        Some(_) => return Err(AppError::bad_request("Table number must be at least 1")),
        None => return Err(AppError::bad_request("Table number is required")),
    };
    let customer_name = customer_name.trim().to_string();
    let phone_number = phone_number.trim().to_string();
    if customer_name.is_empty() || phone_number.is_empty() {
        return Err(AppError::bad_request(
            "Customer name and phone number are required",
        ));
    }
    if items.is_empty() {
        return Err(AppError::bad_request("Order must contain at least one item"));
    }

    let items = items
        .into_iter()
        .map(validate_item)
        .collect::<AppResult<Vec<_>>>()?;

    let computed = items
        .iter()
        .try_fold(0i64, |sum, item| {
            item.price_cents
                .checked_mul(i64::from(item.quantity))
                .and_then(|line| sum.checked_add(line))
        })
        .ok_or_else(|| AppError::bad_request("Order total is out of range"))?;

    if let Some(claimed) = total_amount {
        if to_cents(claimed) != Some(computed) {
            return Err(AppError::bad_request(format!(
                "totalAmount {claimed} does not match items total {}",
                from_cents(computed).normalize()
            )));
        }
    }

    Ok(OrderDraft {
        table_number,
        items,
        total_cents: computed,
        customer_name,
        phone_number,
    })
}

fn validate_item(input: OrderItemInput) -> AppResult<DraftLine> {
    let item_id = input.item_id.trim().to_string();
    let name = input.name.trim().to_string();
    if item_id.is_empty() || name.is_empty() {
        return Err(AppError::bad_request("Each item needs an itemId and a name"));
    }
    if input.price < Decimal::ZERO {
        return Err(AppError::bad_request("Item price cannot be negative"));
    }
    let price_cents = to_cents(input.price)
        .ok_or_else(|| AppError::bad_request("Item price allows at most two decimal places"))?;
    if input.quantity < 1 {
        return Err(AppError::bad_request("Item quantity must be at least 1"));
    }
    Ok(DraftLine {
        item_id,
        name,
        price_cents,
        quantity: input.quantity,
    })
}

/// Persist a new pending order. `owner` comes from an optional token; the
/// back-reference on the user is written after commit and may fail alone.
pub async fn create_order(
    state: &AppState,
    owner: Option<Uuid>,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let draft = validate(payload)?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let order_id = Uuid::new_v4();

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(order_id),
        table_number: Set(draft.table_number),
        total_cents: Set(draft.total_cents),
        status: Set(OrderStatus::Pending.as_str().into()),
        customer_name: Set(draft.customer_name),
        phone_number: Set(draft.phone_number),
        user_id: Set(owner),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(draft.items.len());
    for (position, item) in draft.items.into_iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| AppError::bad_request("Too many items in one order"))?;
        let row = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            position: Set(position),
            item_id: Set(item.item_id),
            name: Set(item.name),
            price_cents: Set(item.price_cents),
            quantity: Set(item.quantity),
        }
        .insert(&txn)
        .await?;
        items.push(row);
    }

    txn.commit().await?;

    if let Some(user_id) = owner {
        if let Err(err) = credential_store::append_order(&state.orm, user_id, order_id).await {
            tracing::warn!(error = %err, %user_id, %order_id, "order history update failed");
        }
    }

    tracing::info!(%order_id, table = order.table_number, attributed = owner.is_some(), "order placed");

    Ok(ApiResponse::success(
        "Order placed",
        order_from_entity(order, items),
        Some(Meta::empty()),
    ))
}

/// Mark an order completed. Completing a completed order changes nothing.
pub async fn complete_order(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Completed.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.ne(OrderStatus::Completed.as_str()))
        .exec(&state.orm)
        .await?;

    let order = load_order(&state.orm, id).await?.ok_or(AppError::NotFound)?;

    if result.rows_affected > 0 {
        tracing::info!(order_id = %id, staff_id = %actor.user_id, "order completed");
        audit::record(
            &state.orm,
            Some(actor.user_id),
            "order_completed",
            Some("orders"),
            serde_json::json!({ "order_id": id }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Order marked as completed",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Every order, newest first, narrowed by the query filters.
pub async fn list_all(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(phone) = query.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        condition = condition.add(OrderCol::PhoneNumber.contains(phone));
    }
    if let Some(from) = query.from {
        condition = condition.add(OrderCol::CreatedAt.gte(DateTimeWithTimeZone::from(from)));
    }
    if let Some(to) = query.to {
        condition = condition.add(OrderCol::CreatedAt.lte(DateTimeWithTimeZone::from(to)));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let (models, meta) = match query.pagination() {
        Some((page, per_page, offset)) => {
            let total = finder.clone().count(&state.orm).await?;
            let models = finder
                .limit(per_page)
                .offset(offset)
                .all(&state.orm)
                .await?;
            (models, Meta::new(page, per_page, total))
        }
        None => {
            let models = finder.all(&state.orm).await?;
            let total = models.len() as u64;
            (models, Meta::total(total))
        }
    };

    let orders = attach_items(&state.orm, models).await?;
    Ok(ApiResponse::success("OK", OrderList(orders), Some(meta)))
}

/// Orders attributed to `user_id`, newest first.
pub async fn list_for_user(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<OrderList>> {
    let orders = orders_for_user(&state.orm, user_id).await?;
    let meta = Meta::total(orders.len() as u64);
    Ok(ApiResponse::success("OK", OrderList(orders), Some(meta)))
}

pub async fn orders_for_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Vec<Order>> {
    let models = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(conn)
        .await?;
    attach_items(conn, models).await
}

/// Orders in the sequence `ids` lists them. Ids that no longer exist are
/// skipped.
pub async fn orders_by_ids<C: ConnectionTrait>(conn: &C, ids: Vec<Uuid>) -> AppResult<Vec<Order>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut found: HashMap<Uuid, OrderModel> = Orders::find()
        .filter(OrderCol::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|model| (model.id, model))
        .collect();
    let models = ids.iter().filter_map(|id| found.remove(id)).collect();
    attach_items(conn, models).await
}

async fn load_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<Order>> {
    let Some(model) = Orders::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;
    Ok(Some(order_from_entity(model, items)))
}

async fn attach_items<C: ConnectionTrait>(
    conn: &C,
    models: Vec<OrderModel>,
) -> AppResult<Vec<Order>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut grouped: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?
    {
        grouped.entry(item.order_id).or_default().push(item);
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let items = grouped.remove(&model.id).unwrap_or_default();
            order_from_entity(model, items)
        })
        .collect())
}

fn order_from_entity(model: OrderModel, items: Vec<OrderItemModel>) -> Order {
    let status = OrderStatus::parse(&model.status).unwrap_or_else(|| {
        tracing::warn!(order_id = %model.id, status = %model.status, "unknown order status, treating as pending");
        OrderStatus::Pending
    });
    Order {
        id: model.id,
        table_number: model.table_number,
        items: items.into_iter().map(order_item_from_entity).collect(),
        total_amount: from_cents(model.total_cents),
        status,
        customer_name: model.customer_name,
        phone_number: model.phone_number,
        user_id: model.user_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        item_id: model.item_id,
        name: model.name,
        price: from_cents(model.price_cents),
        quantity: model.quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: i32) -> OrderItemInput {
        priced(Decimal::from(price), quantity)
    }

    fn priced(price: Decimal, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            item_id: "m1".into(),
            name: "Latte".into(),
            price,
            quantity,
        }
    }

    fn request(items: Vec<OrderItemInput>, total: Option<Decimal>) -> CreateOrderRequest {
        CreateOrderRequest {
            table_number: Some(4),
            items,
            total_amount: total,
            customer_name: "Ravi".into(),
            phone_number: "9000000000".into(),
        }
    }

    #[test]
    fn total_is_computed_when_omitted() {
        let draft = validate(request(vec![item(120, 2), item(50, 1)], None)).unwrap();
        assert_eq!(draft.total_cents, 29_000);
    }

    #[test]
    fn claimed_total_must_match() {
        assert!(validate(request(vec![item(120, 2)], Some(Decimal::from(240)))).is_ok());
        let err = validate(request(vec![item(120, 2)], Some(Decimal::from(100)))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn fractional_prices_sum_exactly() {
        let espresso = priced(Decimal::new(35, 1), 2);
        let draft = validate(request(vec![espresso], Some(Decimal::new(70, 1)))).unwrap();
        assert_eq!(draft.total_cents, 700);

        let lines = vec![priced(Decimal::new(10, 2), 1), priced(Decimal::new(20, 2), 1)];
        assert!(validate(request(lines, Some(Decimal::new(3, 1)))).is_ok());

        let off_by_a_cent = priced(Decimal::new(35, 1), 2);
        assert!(validate(request(vec![off_by_a_cent], Some(Decimal::new(701, 2)))).is_err());
    }

    #[test]
    fn sub_cent_prices_are_rejected() {
        assert!(validate(request(vec![priced(Decimal::new(1005, 3), 1)], None)).is_err());
    }

    #[test]
    fn bad_inputs_are_rejected() {
        assert!(validate(request(vec![], None)).is_err());
        assert!(validate(request(vec![item(120, 0)], None)).is_err());
        assert!(validate(request(vec![item(-1, 1)], None)).is_err());

        let mut no_table = request(vec![item(120, 1)], None);
        no_table.table_number = None;
        assert!(validate(no_table).is_err());

        let mut no_name = request(vec![item(120, 1)], None);
        no_name.customer_name = "  ".into();
        assert!(validate(no_name).is_err());
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        assert!(validate(request(vec![priced(Decimal::MAX, 2)], None)).is_err());
        let huge = Decimal::from(i64::MAX / 100);
        assert!(validate(request(vec![priced(huge, 2)], None)).is_err());
    }
}
