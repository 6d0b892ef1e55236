pub mod audit_logs;
pub mod menu_items;
pub mod order_items;
pub mod orders;
pub mod user_orders;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use menu_items::Entity as MenuItems;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use user_orders::Entity as UserOrders;
pub use users::Entity as Users;
