use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::{AppConfig, AppEnv},
    middleware::auth::Guard,
    services::{token_service::TokenIssuer, verification_service::VerificationEngine},
    sms::SmsGateway,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub env: AppEnv,
    pub tokens: TokenIssuer,
    pub verifier: VerificationEngine,
    pub guard: Guard,
    pub admin_pin: Option<String>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: &AppConfig, gateway: Arc<dyn SmsGateway>) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret);
        Self {
            guard: Guard::new(orm.clone(), tokens.clone()),
            verifier: VerificationEngine::new(gateway, config.default_country_code.clone()),
            orm,
            env: config.env,
            tokens,
            admin_pin: config.admin_pin.clone(),
        }
    }
}
