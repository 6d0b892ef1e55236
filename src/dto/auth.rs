use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::UserProfile, services::verification_service::DeliveryMode};

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SendVerificationRequest {
    pub phone_number: String,
    pub name: String,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendVerificationResponse {
    pub phone_number: String,
    pub delivery: DeliveryMode,
    /// Present only when the code was not sent by SMS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct StaffLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}
