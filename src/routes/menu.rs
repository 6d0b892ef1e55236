use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::menu::{CreateMenuItemRequest, MenuList, UpdateMenuItemRequest},
    error::{AppResult, ErrorBody},
    middleware::auth::AdminAccess,
    models::MenuItem,
    response::ApiResponse,
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        params::MenuQuery,
    },
    services::menu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menu).post(create_menu_item))
        .route(
            "/{id}",
            get(get_menu_item)
                .put(update_menu_item)
                .delete(delete_menu_item),
        )
}

#[utoipa::path(
    get,
    path = "/api/menu",
    params(MenuQuery),
    responses(
        (status = 200, description = "Menu items", body = ApiResponse<MenuList>)
    ),
    tag = "Menu"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MenuQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = menu_service::list_menu(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item", body = ApiResponse<MenuItem>),
        (status = 404, description = "Unknown menu item", body = ErrorBody)
    ),
    tag = "Menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::get_menu_item(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/menu",
    request_body = CreateMenuItemRequest,
    params(("x-admin-pin" = Option<String>, Header, description = "Admin PIN, instead of an admin token")),
    responses(
        (status = 201, description = "Menu item created", body = ApiResponse<MenuItem>),
        (status = 400, description = "Invalid menu item", body = ErrorBody),
        (status = 401, description = "Neither PIN nor token", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    access: AdminAccess,
    AppJson(payload): AppJson<CreateMenuItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MenuItem>>)> {
    let resp = menu_service::create_menu_item(&state, &access, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/menu/{id}",
    request_body = UpdateMenuItemRequest,
    params(
        ("id" = Uuid, Path, description = "Menu item id"),
        ("x-admin-pin" = Option<String>, Header, description = "Admin PIN, instead of an admin token")
    ),
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItem>),
        (status = 404, description = "Unknown menu item", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    access: AdminAccess,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::update_menu_item(&state, &access, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/menu/{id}",
    params(
        ("id" = Uuid, Path, description = "Menu item id"),
        ("x-admin-pin" = Option<String>, Header, description = "Admin PIN, instead of an admin token")
    ),
    responses(
        (status = 200, description = "Menu item deleted"),
        (status = 404, description = "Unknown menu item", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    access: AdminAccess,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = menu_service::delete_menu_item(&state, &access, id).await?;
    Ok(Json(resp))
}
