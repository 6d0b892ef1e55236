use sea_orm::entity::prelude::*;

/// One row per identity. `role` decides which of the customer columns
/// (`phone_number`, verification state) or staff columns (`username`,
/// `password_hash`) are authoritative.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub role: String,
    pub name: String,
    #[sea_orm(unique)]
    pub phone_number: Option<String>,
    #[sea_orm(unique)]
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub is_verified: bool,
    pub verification_code: Option<String>,
    pub verification_expiry: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub last_login: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
    #[sea_orm(has_many = "super::user_orders::Entity")]
    UserOrders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::user_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
