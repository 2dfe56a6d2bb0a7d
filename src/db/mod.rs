//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod billing_companies;
mod quotations;
mod repository;
mod suppliers;
mod vehicles;
mod workshops;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id TEXT PRIMARY KEY,
            plate TEXT NOT NULL,
            brand TEXT NOT NULL,
            model TEXT NOT NULL,
            year INTEGER,
            color TEXT,
            chassis TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS suppliers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cnpj TEXT,
            phone TEXT,
            email TEXT,
            contact_name TEXT,
            street TEXT,
            number TEXT,
            neighborhood TEXT,
            city TEXT,
            state TEXT,
            zip_code TEXT,
            parts_type TEXT NOT NULL DEFAULT 'both',
            specialization TEXT NOT NULL DEFAULT 'general',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workshops (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cnpj TEXT,
            phone TEXT,
            contact_name TEXT,
            city TEXT,
            state TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS billing_companies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cnpj TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            city TEXT,
            state TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quotations (
            id TEXT PRIMARY KEY,
            vehicle_id TEXT NOT NULL REFERENCES vehicles(id),
            workshop_id TEXT REFERENCES workshops(id),
            billing_company_id TEXT REFERENCES billing_companies(id),
            status TEXT NOT NULL DEFAULT 'pending',
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS quotation_parts (
            id TEXT PRIMARY KEY,
            quotation_id TEXT NOT NULL REFERENCES quotations(id),
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            code TEXT,
            quantity INTEGER NOT NULL DEFAULT 1,
            unit_price REAL
        );

        CREATE TABLE IF NOT EXISTS quotation_suppliers (
            id TEXT PRIMARY KEY,
            quotation_id TEXT NOT NULL REFERENCES quotations(id),
            supplier_id TEXT NOT NULL REFERENCES suppliers(id),
            created_at TEXT NOT NULL,
            UNIQUE (quotation_id, supplier_id)
        );

        CREATE TABLE IF NOT EXISTS supplier_offers (
            id TEXT PRIMARY KEY,
            quotation_id TEXT NOT NULL REFERENCES quotations(id),
            supplier_id TEXT NOT NULL REFERENCES suppliers(id),
            part_id TEXT NOT NULL REFERENCES quotation_parts(id),
            price REAL NOT NULL,
            delivery_days INTEGER,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Indexes for the list filters and dependent-row lookups
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_vehicles_created_at ON vehicles(created_at);
        CREATE INDEX IF NOT EXISTS idx_suppliers_state ON suppliers(state);
        CREATE INDEX IF NOT EXISTS idx_suppliers_created_at ON suppliers(created_at);
        CREATE INDEX IF NOT EXISTS idx_quotations_vehicle ON quotations(vehicle_id);
        CREATE INDEX IF NOT EXISTS idx_quotation_parts_quotation ON quotation_parts(quotation_id);
        CREATE INDEX IF NOT EXISTS idx_quotation_suppliers_supplier ON quotation_suppliers(supplier_id);
        CREATE INDEX IF NOT EXISTS idx_supplier_offers_supplier ON supplier_offers(supplier_id);
        CREATE INDEX IF NOT EXISTS idx_supplier_offers_quotation ON supplier_offers(quotation_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
