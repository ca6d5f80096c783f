//! Startup and health checks of the SQLite schema.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

/// Tables the API reads from or writes to.
pub const REQUIRED_TABLES: &[&str] = &[
    "users",
    "locations",
    "weather_data",
    "crops",
    "crop_stages",
    "fields",
    "crop_plantings",
    "agricultural_risks",
    "agronomic_recommendations",
    "regional_risk_scores",
];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check the migrations table and every table in [`REQUIRED_TABLES`].
    pub async fn validate(&self) -> Result<DatabaseHealth, DatabaseValidationError> {
        if !self.table_exists("_sqlx_migrations").await? {
            warn!("database has no migrations table");
            return Ok(DatabaseHealth {
                is_initialized: false,
                migrations_applied: 0,
                latest_migration: None,
                missing_tables: REQUIRED_TABLES.iter().map(|t| t.to_string()).collect(),
            });
        }

        let migrations_applied =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await?;
        let latest_migration = self.latest_migration().await?;
        let missing_tables = self.missing_tables(REQUIRED_TABLES).await?;

        if missing_tables.is_empty() {
            info!(migrations_applied, "database validation complete");
        } else {
            warn!(?missing_tables, "database is missing tables");
        }

        Ok(DatabaseHealth {
            is_initialized: true,
            migrations_applied,
            latest_migration,
            missing_tables,
        })
    }

    pub async fn missing_tables(
        &self,
        required_tables: &[&str],
    ) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing = Vec::new();
        for table in required_tables {
            if !self.table_exists(table).await? {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseValidationError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn latest_migration(&self) -> Result<Option<String>, DatabaseValidationError> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub is_initialized: bool,
    #[ts(type = "number")]
    pub migrations_applied: i64,
    pub latest_migration: Option<String>,
    pub missing_tables: Vec<String>,
}

impl DatabaseHealth {
    pub fn is_ok(&self) -> bool {
        self.is_initialized && self.missing_tables.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.is_initialized {
            "Database not initialized - migrations need to be run".to_string()
        } else if !self.missing_tables.is_empty() {
            format!("Database is missing tables: {}", self.missing_tables.join(", "))
        } else {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        }
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    #[tokio::test]
    async fn migrated_database_is_healthy() {
        let db = DBService::new_in_memory().await.unwrap();
        let health = DatabaseValidator::new(db.pool).validate().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(health.migrations_applied, 1);
        assert_eq!(health.latest_migration.as_deref(), Some("init schema"));
        assert!(health.summary().starts_with("Database OK"));
    }

    #[tokio::test]
    async fn empty_database_is_not_initialized() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let health = DatabaseValidator::new(pool).validate().await.unwrap();
        assert!(!health.is_ok());
        assert_eq!(health.missing_tables.len(), REQUIRED_TABLES.len());
    }
}
