use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Account, Role, User},
    services::{credential_store, token_service::TokenIssuer},
    state::AppState,
};

pub const ADMIN_PIN_HEADER: &str = "x-admin-pin";

/// A request whose token resolved to a live, permitted user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub user: User,
}

pub fn ensure_role(user: &AuthUser, roles: &[Role]) -> Result<(), AppError> {
    if !roles.contains(&user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[Role::Staff, Role::Admin])
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, &[Role::Admin])
}

/// Resolves bearer tokens to users and applies the access policy.
#[derive(Clone)]
pub struct Guard {
    orm: DatabaseConnection,
    tokens: TokenIssuer,
}

impl Guard {
    pub fn new(orm: DatabaseConnection, tokens: TokenIssuer) -> Self {
        Self { orm, tokens }
    }

    /// Checks run in order; the first failure wins.
    pub async fn authenticate(&self, token: Option<&str>) -> AppResult<AuthUser> {
        let token = token.ok_or_else(|| AppError::unauthorized("Access denied. No token provided."))?;

        let identity = self
            .tokens
            .verify(token)
            .map_err(|_| AppError::unauthorized("Invalid token."))?;

        let user = credential_store::find_by_id(&self.orm, identity.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid token. User not found."))?;

        match &user.account {
            Account::Customer(customer) if !customer.is_verified => {
                return Err(AppError::unauthorized(
                    "User not verified. Please complete phone verification.",
                ));
            }
            Account::Staff(staff) if staff.password_hash.is_none() => {
                return Err(AppError::unauthorized("Account not properly set up."));
            }
            _ => {}
        }

        Ok(AuthUser {
            user_id: user.id,
            role: user.role(),
            user,
        })
    }

    /// Lenient resolution: any failure, including a lookup error, yields
    /// `None`.
    pub async fn identify(&self, token: Option<&str>) -> Option<User> {
        let identity = match self.tokens.verify(token?) {
            Ok(identity) => identity,
            Err(err) => {
                tracing::debug!(error = %err, "token ignored");
                return None;
            }
        };

        match credential_store::find_by_id(&self.orm, identity.user_id).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "user lookup for optional token failed");
                None
            }
        }
    }

    pub fn require_role(&self, user: &AuthUser, roles: &[Role]) -> AppResult<()> {
        ensure_role(user, roles)
    }
}

/// Token from `Authorization`, with or without the `Bearer ` prefix.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match raw.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => raw,
    };
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.guard.authenticate(bearer_token(&parts.headers)).await
    }
}

/// The caller, when a valid token names an existing user. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthUser(pub Option<User>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(state.guard.identify(bearer_token(&parts.headers)).await))
    }
}

/// Passed either by the configured admin PIN or by an admin session.
#[derive(Debug, Clone)]
pub enum AdminAccess {
    Pin,
    Admin(AuthUser),
}

impl AdminAccess {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AdminAccess::Pin => None,
            AdminAccess::Admin(user) => Some(user.user_id),
        }
    }
}

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let (Some(expected), Some(supplied)) = (
            state.admin_pin.as_deref(),
            parts
                .headers
                .get(ADMIN_PIN_HEADER)
                .and_then(|value| value.to_str().ok()),
        ) {
            if pin_matches(expected, supplied) {
                return Ok(AdminAccess::Pin);
            }
            tracing::warn!("admin pin rejected");
        }

        let user = state.guard.authenticate(bearer_token(&parts.headers)).await?;
        state.guard.require_role(&user, &[Role::Admin])?;
        Ok(AdminAccess::Admin(user))
    }
}

fn pin_matches(expected: &str, supplied: &str) -> bool {
    let (a, b) = (expected.as_bytes(), supplied.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_optional() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_needs_a_separator() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("BearerXYZ"));
        assert_eq!(bearer_token(&headers), Some("BearerXYZ"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer\tXYZ"));
        assert_eq!(bearer_token(&headers), Some("XYZ"));
    }

    #[test]
    fn pin_comparison() {
        assert!(pin_matches("837337", "837337"));
        assert!(!pin_matches("837337", "837338"));
        assert!(!pin_matches("837337", "83733"));
    }
}
