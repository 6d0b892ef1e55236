use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{
        AuthResponse, SendVerificationRequest, SendVerificationResponse, StaffLoginRequest,
        VerifyCodeRequest,
    },
    error::{AppResult, ErrorBody},
    response::ApiResponse,
    routes::extract::AppJson,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-verification", post(send_verification))
        .route("/verify-code", post(verify_code))
        .route("/staff/login", post(staff_login))
}

#[utoipa::path(
    post,
    path = "/api/auth/send-verification",
    request_body = SendVerificationRequest,
    responses(
        (status = 200, description = "Code issued", body = ApiResponse<SendVerificationResponse>),
        (status = 400, description = "Missing or malformed phone number", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn send_verification(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendVerificationRequest>,
) -> AppResult<Json<ApiResponse<SendVerificationResponse>>> {
    let resp = auth_service::send_verification(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Phone verified", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Wrong or expired code", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyCodeRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let resp = auth_service::verify_code(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/staff/login",
    request_body = StaffLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn staff_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<StaffLoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let resp = auth_service::staff_login(&state, payload).await?;
    Ok(Json(resp))
}
