#![allow(dead_code)]

use std::sync::Arc;

use cafe_orders_api::{
    config::{AppConfig, AppEnv},
    db::run_migrations,
    dto::auth::{SendVerificationRequest, VerifyCodeRequest},
    middleware::auth::AuthUser,
    models::{Role, User},
    services::{
        auth_service,
        credential_store::{self, NewUser},
    },
    sms::{LocalGateway, SmsGateway},
    state::AppState,
};
use sea_orm::{ConnectOptions, Database};

pub const TEST_PIN: &str = "837337";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        env: AppEnv::Development,
        jwt_secret: "integration-test-secret".into(),
        admin_pin: Some(TEST_PIN.into()),
        default_country_code: "+91".into(),
        twilio: None,
        cors_origins: Vec::new(),
    }
}

pub async fn setup_state() -> anyhow::Result<AppState> {
    setup_state_with(Arc::new(LocalGateway)).await
}

/// Fresh in-memory database. One pooled connection keeps the schema alive
/// for the whole test.
pub async fn setup_state_with(gateway: Arc<dyn SmsGateway>) -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, &test_config(), gateway))
}

/// Runs the send/verify flow and returns the verified customer and token.
pub async fn verified_customer(
    state: &AppState,
    phone_number: &str,
    name: &str,
) -> anyhow::Result<(User, String)> {
    let sent = auth_service::send_verification(
        state,
        SendVerificationRequest {
            phone_number: phone_number.into(),
            name: name.into(),
        },
    )
    .await?;
    let sent = sent.data.expect("send data");
    let code = sent.test_code.expect("local delivery exposes the code");

    let verified = auth_service::verify_code(
        state,
        VerifyCodeRequest {
            phone_number: sent.phone_number.clone(),
            code,
        },
    )
    .await?
    .data
    .expect("verify data");

    let user = credential_store::find_by_id(&state.orm, verified.user.id)
        .await?
        .expect("verified user is stored");
    Ok((user, verified.token))
}

pub async fn staff_member(
    state: &AppState,
    role: Role,
    username: &str,
    password: &str,
) -> anyhow::Result<(User, String)> {
    let hash = auth_service::hash_password(password)?;
    let user = credential_store::create(
        &state.orm,
        NewUser::staff(role, format!("{username} (test)"), username, hash),
    )
    .await?;
    let token = state.tokens.issue(&user)?;
    Ok((user, token))
}

pub fn as_auth_user(user: &User) -> AuthUser {
    AuthUser {
        user_id: user.id,
        role: user.role(),
        user: user.clone(),
    }
}
