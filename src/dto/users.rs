use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, UserProfile};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileWithOrders {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub orders: Vec<Order>,
}
