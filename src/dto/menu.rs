use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::MenuItem;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub price: Option<Decimal>,
    /// One of `drinks`, `food`, `desserts`.
    pub category: String,
    pub description: String,
    pub image: String,
    /// Defaults to `true`.
    pub available: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuList(pub Vec<MenuItem>);
