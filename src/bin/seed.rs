use cafe_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::menu_items::{ActiveModel as MenuActive, Column as MenuCol, Entity as MenuItems},
    models::{MenuCategory, Role},
    services::{
        auth_service::hash_password,
        credential_store::{self, NewUser},
    },
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Prices in cents.
const SAMPLE_MENU: &[(&str, i64, MenuCategory, &str)] = &[
    ("Espresso", 350, MenuCategory::Drinks, "Single shot, dark roast"),
    ("Cappuccino", 450, MenuCategory::Drinks, "Espresso with steamed milk foam"),
    ("Club Sandwich", 895, MenuCategory::Food, "Triple-decker with fries"),
    ("Chocolate Brownie", 375, MenuCategory::Desserts, "Warm, with walnuts"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let admin_id = ensure_admin(&orm, &username, &password).await?;
    let added = seed_menu(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, menu items added: {added}");
    Ok(())
}

async fn ensure_admin(orm: &DatabaseConnection, username: &str, password: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = credential_store::find_by_username(orm, username).await? {
        return Ok(existing.id);
    }

    let password_hash = hash_password(password)?;
    let admin = credential_store::create(
        orm,
        NewUser::staff(Role::Admin, "Administrator", username, password_hash),
    )
    .await?;
    Ok(admin.id)
}

async fn seed_menu(orm: &DatabaseConnection) -> anyhow::Result<usize> {
    let mut added = 0;
    for (name, price, category, description) in SAMPLE_MENU {
        let exists = MenuItems::find()
            .filter(MenuCol::Name.eq(*name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = Utc::now();
        MenuActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            price_cents: Set(*price),
            category: Set(category.as_str().to_string()),
            description: Set(description.to_string()),
            image: Set(String::new()),
            available: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
        added += 1;
    }
    Ok(added)
}
