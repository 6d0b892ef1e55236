use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Order;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderItemInput {
    pub item_id: String,
    pub name: String,
    /// At most two decimal places.
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub table_number: Option<i32>,
    pub items: Vec<OrderItemInput>,
    /// Must equal the sum of `price * quantity`; computed when omitted.
    pub total_amount: Option<Decimal>,
    pub customer_name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList(pub Vec<Order>);
