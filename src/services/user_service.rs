use crate::{
    dto::{orders::OrderList, users::ProfileWithOrders},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::{credential_store, order_service},
    state::AppState,
};

/// The caller's profile with the orders recorded in their history, oldest
/// first.
pub async fn profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ProfileWithOrders>> {
    let history = credential_store::order_history(&state.orm, user.user_id).await?;
    let orders = order_service::orders_by_ids(&state.orm, history).await?;

    Ok(ApiResponse::success(
        "Profile",
        ProfileWithOrders {
            profile: user.user.profile(),
            orders,
        },
        Some(Meta::empty()),
    ))
}

pub async fn orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    order_service::list_for_user(state, user.user_id).await
}
