use anyhow::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

use crate::entity::{AuditLogs, MenuItems, OrderItems, Orders, UserOrders, Users, orders};

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Create every table and index the service needs. Safe to run repeatedly.
///
/// Tables are derived from the entity definitions and created parents first
/// so foreign keys resolve.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(conn.get_database_backend());

    create_table(conn, &schema, Users).await?;
    create_table(conn, &schema, Orders).await?;
    create_table(conn, &schema, OrderItems).await?;
    create_table(conn, &schema, UserOrders).await?;
    create_table(conn, &schema, MenuItems).await?;
    create_table(conn, &schema, AuditLogs).await?;

    let backend = conn.get_database_backend();
    let by_created_at = Index::create()
        .if_not_exists()
        .name("idx_orders_created_at")
        .table(Orders)
        .col(orders::Column::CreatedAt)
        .to_owned();
    conn.execute(backend.build(&by_created_at)).await?;

    let by_user = Index::create()
        .if_not_exists()
        .name("idx_orders_user_id")
        .table(Orders)
        .col(orders::Column::UserId)
        .to_owned();
    conn.execute(backend.build(&by_user)).await?;

    Ok(())
}

async fn create_table<E>(conn: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    conn.execute(conn.get_database_backend().build(&stmt)).await?;
    tracing::debug!(table = entity.table_name(), "table ensured");
    Ok(())
}
