use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;

use crate::{
    audit,
    dto::auth::{
        AuthResponse, SendVerificationRequest, SendVerificationResponse, StaffLoginRequest,
        VerifyCodeRequest,
    },
    error::{AppError, AppResult},
    models::Account,
    response::{ApiResponse, Meta},
    services::credential_store,
    state::AppState,
};

const INVALID_CODE: &str = "Invalid verification code";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn send_verification(
    state: &AppState,
    payload: SendVerificationRequest,
) -> AppResult<ApiResponse<SendVerificationResponse>> {
    let SendVerificationRequest { phone_number, name } = payload;
    if phone_number.trim().is_empty() || name.trim().is_empty() {
        return Err(AppError::bad_request("Phone number and name are required"));
    }

    let phone_number = state.verifier.normalize(&phone_number)?;
    let mut user =
        credential_store::find_or_create_customer(&state.orm, &phone_number, &name).await?;

    let code = state
        .verifier
        .generate_code(&state.orm, &mut user, Utc::now())
        .await?;
    let delivery = state.verifier.deliver(&phone_number, &code).await;

    Ok(ApiResponse::success(
        delivery.message(),
        SendVerificationResponse {
            phone_number,
            delivery: delivery.mode(),
            test_code: delivery.test_code().map(str::to_string),
        },
        Some(Meta::empty()),
    ))
}

pub async fn verify_code(
    state: &AppState,
    payload: VerifyCodeRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let VerifyCodeRequest { phone_number, code } = payload;
    if phone_number.trim().is_empty() || code.trim().is_empty() {
        return Err(AppError::bad_request(
            "Phone number and verification code are required",
        ));
    }

    let phone_number = state.verifier.normalize(&phone_number)?;
    let mut user = credential_store::find_by_phone(&state.orm, &phone_number)
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CODE))?;

    state.verifier.verify(&state.orm, &mut user, &code).await?;

    let token = state.tokens.issue(&user)?;

    audit::record(
        &state.orm,
        Some(user.id),
        "customer_verified",
        Some("users"),
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Phone number verified successfully",
        AuthResponse {
            token,
            user: user.profile(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn staff_login(
    state: &AppState,
    payload: StaffLoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let StaffLoginRequest { username, password } = payload;
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    let mut user = credential_store::find_by_username(&state.orm, username)
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

    let password_ok = match &user.account {
        Account::Staff(staff) => staff
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(hash, &password)),
        Account::Customer(_) => false,
    };
    if !password_ok {
        tracing::info!(username, "staff login rejected");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    user.last_login = Utc::now();
    let user = credential_store::save(&state.orm, &user).await?;
    let token = state.tokens.issue(&user)?;

    audit::record(
        &state.orm,
        Some(user.id),
        "staff_login",
        Some("users"),
        serde_json::json!({ "user_id": user.id, "role": user.role() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            token,
            user: user.profile(),
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "s3cret"));
        assert!(!verify_password(&hash, "wrong"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("not-a-hash", "anything"));
    }
}
