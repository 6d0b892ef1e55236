use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{orders::OrderList, users::ProfileWithOrders},
    error::{AppResult, ErrorBody},
    middleware::auth::{AuthUser, ensure_role},
    models::Role,
    response::ApiResponse,
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/orders", get(my_orders))
}

#[utoipa::path(
    get,
    path = "/api/user/profile",
    responses(
        (status = 200, description = "Profile with order history", body = ApiResponse<ProfileWithOrders>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not a customer", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProfileWithOrders>>> {
    ensure_role(&user, &[Role::User])?;
    let resp = user_service::profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/orders",
    responses(
        (status = 200, description = "Own orders, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not a customer", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_role(&user, &[Role::User])?;
    let resp = user_service::orders(&state, &user).await?;
    Ok(Json(resp))
}
