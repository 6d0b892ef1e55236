use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "staff" => Some(Role::Staff),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            _ => None,
        }
    }
}

/// A one-time code waiting to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerAccount {
    pub phone_number: String,
    pub is_verified: bool,
    pub pending_code: Option<PendingCode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffAccount {
    /// Either `Role::Staff` or `Role::Admin`.
    pub role: Role,
    pub username: String,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    Customer(CustomerAccount),
    Staff(StaffAccount),
}

/// A stored identity: the shared fields plus exactly one account kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub account: Account,
}

impl User {
    pub fn role(&self) -> Role {
        match &self.account {
            Account::Customer(_) => Role::User,
            Account::Staff(staff) => staff.role,
        }
    }

    pub fn is_verified(&self) -> bool {
        match &self.account {
            Account::Customer(customer) => customer.is_verified,
            Account::Staff(_) => true,
        }
    }

    pub fn phone_number(&self) -> Option<&str> {
        match &self.account {
            Account::Customer(customer) => Some(customer.phone_number.as_str()),
            Account::Staff(_) => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match &self.account {
            Account::Customer(_) => None,
            Account::Staff(staff) => Some(staff.username.as_str()),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            role: self.role(),
            phone_number: self.phone_number().map(str::to_string),
            username: self.username().map(str::to_string),
            is_verified: self.is_verified(),
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Public view of a user. Never carries password or code material.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub item_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub table_number: i32,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub customer_name: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MenuCategory {
    Drinks,
    Food,
    Desserts,
}

impl MenuCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Drinks => "drinks",
            MenuCategory::Food => "food",
            MenuCategory::Desserts => "desserts",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "drinks" => Some(MenuCategory::Drinks),
            "food" => Some(MenuCategory::Food),
            "desserts" => Some(MenuCategory::Desserts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub category: MenuCategory,
    pub description: String,
    pub image: String,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Amounts are exchanged as decimals and stored as whole cents. Anything
/// finer than a cent has no stored form and yields `None`.
pub fn to_cents(amount: Decimal) -> Option<i64> {
    let amount = amount.normalize();
    if amount.scale() > 2 {
        return None;
    }
    amount.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn customer(verified: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            created_at: now,
            last_login: now,
            account: Account::Customer(CustomerAccount {
                phone_number: "+919999999999".into(),
                is_verified: verified,
                pending_code: None,
            }),
        }
    }

    #[test]
    fn role_follows_account_kind() {
        let user = customer(false);
        assert_eq!(user.role(), Role::User);
        assert!(!user.is_verified());

        let staff = User {
            account: Account::Staff(StaffAccount {
                role: Role::Admin,
                username: "boss".into(),
                password_hash: None,
            }),
            ..user
        };
        assert_eq!(staff.role(), Role::Admin);
        assert!(staff.is_verified());
        assert_eq!(staff.username(), Some("boss"));
        assert_eq!(staff.phone_number(), None);
    }

    #[test]
    fn profile_omits_the_other_kind_fields() {
        let json = serde_json::to_value(customer(true).profile()).unwrap();
        assert_eq!(json["phoneNumber"], "+919999999999");
        assert_eq!(json["isVerified"], true);
        assert_eq!(json["role"], "user");
        assert!(json.get("username").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn pending_code_expires_strictly_after_deadline() {
        let now = Utc::now();
        let code = PendingCode {
            code: "123456".into(),
            expires_at: now,
        };
        assert!(!code.is_expired(now));
        assert!(code.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn status_and_role_strings_round_trip() {
        for status in [OrderStatus::Pending, OrderStatus::Completed] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        for role in [Role::User, Role::Staff, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn cents_conversion_keeps_two_places() {
        assert_eq!(to_cents(Decimal::new(35, 1)), Some(350));
        assert_eq!(to_cents(Decimal::new(7000, 3)), Some(700));
        assert_eq!(to_cents(Decimal::from(140)), Some(14000));
        assert_eq!(to_cents(Decimal::new(1001, 3)), None);
        assert_eq!(from_cents(350), Decimal::new(35, 1));
    }
}
