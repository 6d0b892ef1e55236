//! One-time phone codes: generation, delivery and confirmation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Account, CustomerAccount, PendingCode, User},
    services::credential_store,
    sms::{GatewayKind, SendReceipt, SmsGateway},
};

pub const CODE_TTL_MINUTES: i64 = 10;

/// How a code reached (or did not reach) the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sms { status: String },
    /// No provider configured.
    Local { code: String },
    /// The provider failed; the code is handed back instead.
    Fallback { code: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Sms,
    Local,
    Fallback,
}

impl Delivery {
    pub fn mode(&self) -> DeliveryMode {
        match self {
            Delivery::Sms { .. } => DeliveryMode::Sms,
            Delivery::Local { .. } => DeliveryMode::Local,
            Delivery::Fallback { .. } => DeliveryMode::Fallback,
        }
    }

    pub fn test_code(&self) -> Option<&str> {
        match self {
            Delivery::Sms { .. } => None,
            Delivery::Local { code } | Delivery::Fallback { code, .. } => Some(code),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Delivery::Sms { .. } => "Verification code sent successfully via SMS",
            Delivery::Local { .. } => "Verification code generated (development mode)",
            Delivery::Fallback { .. } => "SMS service temporarily unavailable. Using test mode.",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Verification code has expired")]
    Expired,
    #[error("Invalid verification code")]
    Mismatch,
    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Expired | VerifyError::Mismatch => AppError::unauthorized(err.to_string()),
            VerifyError::Store(inner) => inner,
        }
    }
}

/// Uniform 6-digit code in `[100000, 999999]`.
pub fn random_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Canonical form of a phone number: no separators, always with a country
/// code. Numbers without a leading `+` get `default_country_code`.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> AppResult<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let normalized = if compact.starts_with('+') {
        compact
    } else {
        format!("{default_country_code}{compact}")
    };

    let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
    if digits.len() < 6 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::bad_request("Invalid phone number"));
    }

    Ok(normalized)
}

#[derive(Clone)]
pub struct VerificationEngine {
    gateway: Arc<dyn SmsGateway>,
    default_country_code: String,
    code_ttl: Duration,
}

impl VerificationEngine {
    pub fn new(gateway: Arc<dyn SmsGateway>, default_country_code: impl Into<String>) -> Self {
        Self {
            gateway,
            default_country_code: default_country_code.into(),
            code_ttl: Duration::minutes(CODE_TTL_MINUTES),
        }
    }

    pub fn gateway_kind(&self) -> GatewayKind {
        self.gateway.kind()
    }

    pub fn normalize(&self, raw: &str) -> AppResult<String> {
        normalize_phone(raw, &self.default_country_code)
    }

    /// Issue a fresh code for a customer and persist it.
    pub async fn generate_code<C: ConnectionTrait>(
        &self,
        conn: &C,
        user: &mut User,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let Account::Customer(customer) = &mut user.account else {
            return Err(AppError::bad_request("Phone verification is only for customers"));
        };

        let code = random_code();
        customer.pending_code = Some(PendingCode {
            code: code.clone(),
            expires_at: now + self.code_ttl,
        });
        *user = credential_store::save(conn, user).await?;

        Ok(code)
    }

    pub async fn deliver(&self, phone_number: &str, code: &str) -> Delivery {
        match self.gateway.send_code(phone_number, code).await {
            Ok(SendReceipt::Dispatched { status }) => {
                tracing::info!(phone_number, status = %status, "verification sms dispatched");
                Delivery::Sms { status }
            }
            Ok(SendReceipt::NotDispatched) => {
                tracing::debug!(phone_number, code, "verification code kept local");
                Delivery::Local {
                    code: code.to_string(),
                }
            }
            Err(err) => {
                tracing::warn!(phone_number, error = %err, "sms provider failed, falling back to test mode");
                Delivery::Fallback {
                    code: code.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    pub async fn verify<C: ConnectionTrait>(
        &self,
        conn: &C,
        user: &mut User,
        submitted: &str,
    ) -> Result<(), VerifyError> {
        self.verify_at(conn, user, submitted, Utc::now()).await
    }

    /// Confirm `submitted` for `user` as of `now`. On success the user is
    /// marked verified, the pending code is cleared and the record saved.
    pub async fn verify_at<C: ConnectionTrait>(
        &self,
        conn: &C,
        user: &mut User,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VerifyError> {
        let submitted = submitted.trim();
        let Account::Customer(customer) = &mut user.account else {
            return Err(VerifyError::Mismatch);
        };

        if customer
            .pending_code
            .as_ref()
            .is_some_and(|pending| pending.is_expired(now))
        {
            return Err(VerifyError::Expired);
        }

        let approved = match self.gateway.check_code(&customer.phone_number, submitted).await {
            Ok(Some(approved)) => approved,
            Ok(None) => matches_pending(customer, submitted),
            Err(err) => {
                tracing::warn!(error = %err, "sms provider check failed, comparing stored code");
                matches_pending(customer, submitted)
            }
        };
        if !approved {
            return Err(VerifyError::Mismatch);
        }

        customer.is_verified = true;
        customer.pending_code = None;
        user.last_login = now;
        *user = credential_store::save(conn, user).await?;

        tracing::info!(user_id = %user.id, "customer verified");
        Ok(())
    }
}

fn matches_pending(customer: &CustomerAccount, submitted: &str) -> bool {
    customer
        .pending_code
        .as_ref()
        .is_some_and(|pending| pending.code == submitted)
}
