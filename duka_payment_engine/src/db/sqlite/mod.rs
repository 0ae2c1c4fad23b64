mod attempts;
mod db;
mod orders;

use std::env;

pub use db::SqliteDatabase;
use log::info;
use sqlx::{migrate, sqlite::SqlitePoolOptions, SqlitePool};

use crate::traits::PaymentGatewayError;

const SQLITE_DB_URL: &str = "sqlite://data/duka_store.db";

pub fn db_url() -> String {
    let result = env::var("DPS_DATABASE_URL").unwrap_or_else(|_| {
        info!("DPS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, PaymentGatewayError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), PaymentGatewayError> {
    migrate!("./src/db/sqlite/migrations")
        .run(pool)
        .await
        .map_err(|e| PaymentGatewayError::DatabaseError(e.to_string()))?;
    info!("🗃️ Migrations complete");
    Ok(())
}
