use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Schema, Statement};
use std::env;
use tracing::info;

use crate::domain::thermometer::entity::thermometer;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    info!("Successfully connected to the database.");

    let should_update_schema = env::var("DB_SCHEMA_UPDATE")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid DB_SCHEMA_UPDATE value, defaulting to false. Use 'true' or 'false'."
            );
            false
        });

    if should_update_schema {
        sync_schema(&db).await?;
    } else {
        info!("Skipping database schema synchronization (DB_SCHEMA_UPDATE is not true).");
    }

    Ok(db)
}

async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    info!("Starting database schema synchronization...");

    create_table_if_not_exists(db, &schema, thermometer::Entity).await?;
    // One row per (thermometer, channel); unregistration only flips is_active
    create_index_if_not_exists(
        db,
        "uq_thermometer_device_channel",
        "thermometer",
        &["thermometer_id", "channel_id"],
        true,
    )
    .await?;
    create_index_if_not_exists(
        db,
        "idx_thermometer_active_created",
        "thermometer",
        &["is_active", "created_at"],
        false,
    )
    .await?;

    info!("Database schema synchronization completed.");
    Ok(())
}

async fn create_index_if_not_exists(
    db: &DatabaseConnection,
    index_name: &str,
    table_name: &str,
    columns: &[&str],
    unique: bool,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let sql = format!(
        "CREATE {}INDEX {} ON {} ({})",
        if unique { "UNIQUE " } else { "" },
        index_name,
        table_name,
        columns.join(", ")
    );

    match db.execute(Statement::from_string(backend, sql)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let err_str = e.to_string().to_lowercase();
            if err_str.contains("duplicate") || err_str.contains("exists") {
                Ok(())
            } else {
                tracing::error!("Failed to create index {}: {}", index_name, e);
                Err(e)
            }
        }
    }
}

async fn create_table_if_not_exists<E>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr>
where
    E: sea_orm::EntityTrait,
{
    let backend = db.get_database_backend();
    let create_stmt: Statement =
        backend.build(schema.create_table_from_entity(entity).if_not_exists());

    db.execute(create_stmt).await.map(|_| ()).map_err(|e| {
        tracing::error!("Failed to create table: {}", e);
        e
    })
}
