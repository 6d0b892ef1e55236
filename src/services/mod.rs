pub mod admin_service;
pub mod auth_service;
pub mod credential_store;
pub mod menu_service;
pub mod order_service;
pub mod token_service;
pub mod user_service;
pub mod verification_service;
