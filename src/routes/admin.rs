use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::admin::{CreateStaffRequest, UpdatePasswordRequest, UserList},
    error::{AppResult, ErrorBody},
    middleware::auth::AdminAccess,
    models::UserProfile,
    response::ApiResponse,
    routes::extract::{AppJson, AppPath},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/staff", post(create_staff))
        .route("/staff/{id}/password", put(update_staff_password))
        .route("/staff/{id}", delete(delete_staff))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(("x-admin-pin" = Option<String>, Header, description = "Admin PIN, instead of an admin token")),
    responses(
        (status = 200, description = "Users with order counts", body = ApiResponse<UserList>),
        (status = 401, description = "Neither PIN nor token", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _access: AdminAccess,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = admin_service::list_users(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/staff",
    request_body = CreateStaffRequest,
    params(("x-admin-pin" = Option<String>, Header, description = "Admin PIN, instead of an admin token")),
    responses(
        (status = 201, description = "Staff account created", body = ApiResponse<UserProfile>),
        (status = 400, description = "Missing fields or short password", body = ErrorBody),
        (status = 409, description = "Username taken", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_staff(
    State(state): State<AppState>,
    access: AdminAccess,
    AppJson(payload): AppJson<CreateStaffRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserProfile>>)> {
    let resp = admin_service::create_staff(&state, &access, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/admin/staff/{id}/password",
    request_body = UpdatePasswordRequest,
    params(
        ("id" = Uuid, Path, description = "Staff user id"),
        ("x-admin-pin" = Option<String>, Header, description = "Admin PIN, instead of an admin token")
    ),
    responses(
        (status = 200, description = "Password updated", body = ApiResponse<UserProfile>),
        (status = 400, description = "Not a staff account", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_staff_password(
    State(state): State<AppState>,
    access: AdminAccess,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = admin_service::update_staff_password(&state, &access, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/staff/{id}",
    params(
        ("id" = Uuid, Path, description = "Staff user id"),
        ("x-admin-pin" = Option<String>, Header, description = "Admin PIN, instead of an admin token")
    ),
    responses(
        (status = 200, description = "Staff account deleted"),
        (status = 400, description = "Not a staff account", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_staff(
    State(state): State<AppState>,
    access: AdminAccess,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::delete_staff(&state, &access, id).await?;
    Ok(Json(resp))
}
