use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::UserProfile;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateStaffRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub orders_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList(pub Vec<UserSummary>);
