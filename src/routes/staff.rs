use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::OrderList,
    error::{AppResult, ErrorBody},
    middleware::auth::{AuthUser, ensure_staff},
    models::Order,
    response::ApiResponse,
    routes::{
        extract::{AppPath, AppQuery},
        params::OrderListQuery,
    },
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}/complete", put(complete_order))
}

#[utoipa::path(
    get,
    path = "/api/staff/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "All orders, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not staff", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_staff(&user)?;
    let resp = order_service::list_all(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/staff/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed (idempotent)", body = ApiResponse<Order>),
        (status = 400, description = "Malformed order id", body = ErrorBody),
        (status = 403, description = "Not staff", body = ErrorBody),
        (status = 404, description = "Unknown order", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn complete_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    ensure_staff(&user)?;
    let resp = order_service::complete_order(&state, &user, id).await?;
    Ok(Json(resp))
}
