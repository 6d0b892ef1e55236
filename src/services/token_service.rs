use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Role, User},
};

pub const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// Identity asserted by a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Mints and checks HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(TOKEN_TTL_DAYS),
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> AppResult<String> {
        let expiration = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role(),
            phone_number: user.phone_number().map(str::to_string),
            iat: issued_at.timestamp().max(0) as usize,
            exp: expiration.timestamp().max(0) as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub fn verify(&self, token: &str) -> Result<TokenIdentity, InvalidToken> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| InvalidToken)?;

        let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| InvalidToken)?;

        Ok(TokenIdentity {
            user_id,
            role: decoded.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, CustomerAccount, StaffAccount};

    fn customer() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            created_at: now,
            last_login: now,
            account: Account::Customer(CustomerAccount {
                phone_number: "+919999999999".into(),
                is_verified: true,
                pending_code: None,
            }),
        }
    }

    #[test]
    fn issued_token_verifies_with_identity_and_role() {
        let issuer = TokenIssuer::new("secret");
        let user = customer();
        let token = issuer.issue(&user).unwrap();

        let identity = issuer.verify(&token).unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn staff_token_carries_staff_role() {
        let issuer = TokenIssuer::new("secret");
        let user = User {
            account: Account::Staff(StaffAccount {
                role: Role::Staff,
                username: "barista".into(),
                password_hash: Some("hash".into()),
            }),
            ..customer()
        };
        let token = issuer.issue(&user).unwrap();
        assert_eq!(issuer.verify(&token).unwrap().role, Role::Staff);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenIssuer::new("one").issue(&customer()).unwrap();
        assert_eq!(TokenIssuer::new("two").verify(&token), Err(InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("secret");
        let issued_at = Utc::now() - Duration::days(TOKEN_TTL_DAYS + 1);
        let token = issuer.issue_at(&customer(), issued_at).unwrap();
        assert_eq!(issuer.verify(&token), Err(InvalidToken));
    }

    #[test]
    fn garbage_is_rejected() {
        let issuer = TokenIssuer::new("secret");
        assert_eq!(issuer.verify("not.a.token"), Err(InvalidToken));
        assert_eq!(issuer.verify(""), Err(InvalidToken));
    }
}
