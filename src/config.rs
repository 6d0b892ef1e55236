use std::env;

/// Signing key used when `JWT_SECRET` is missing outside production.
pub const DEV_JWT_SECRET: &str = "cafe-orders-dev-secret-do-not-deploy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub verify_service_sid: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub env: AppEnv,
    pub jwt_secret: String,
    pub admin_pin: Option<String>,
    pub default_country_code: String,
    pub twilio: Option<TwilioConfig>,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => AppEnv::Production,
            _ => AppEnv::Development,
        };

        let jwt_secret = match non_empty_var("JWT_SECRET") {
            Some(secret) => secret,
            None if env == AppEnv::Production => {
                anyhow::bail!("JWT_SECRET must be set when APP_ENV=production")
            }
            None => {
                tracing::warn!("JWT_SECRET is not set, using the development signing key");
                DEV_JWT_SECRET.to_string()
            }
        };

        let twilio = match (
            non_empty_var("TWILIO_ACCOUNT_SID"),
            non_empty_var("TWILIO_AUTH_TOKEN"),
            non_empty_var("TWILIO_VERIFY_SERVICE_SID"),
        ) {
            (Some(account_sid), Some(auth_token), Some(verify_service_sid)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                verify_service_sid,
            }),
            _ => None,
        };

        let cors_origins = non_empty_var("CORS_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            database_url,
            host,
            env,
            jwt_secret,
            admin_pin: non_empty_var("ADMIN_PIN"),
            default_country_code: non_empty_var("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|| "+91".to_string()),
            twilio,
            cors_origins,
        })
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnv::Production
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
