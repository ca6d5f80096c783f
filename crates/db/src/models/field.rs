use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::validation::{Validate, ValidationErrors};

/// A farmed plot ("chacra") owned by a user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub user_id: i64,
    #[ts(type = "number | null")]
    pub location_id: Option<i64>,
    pub name: String,
    pub area_hectares: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateField {
    #[ts(type = "number")]
    pub user_id: i64,
    #[ts(type = "number | null")]
    pub location_id: Option<i64>,
    pub name: String,
    pub area_hectares: f64,
}

impl Validate for CreateField {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("name", &self.name);
        if !(self.area_hectares.is_finite() && self.area_hectares > 0.0) {
            errors.add("areaHectares", "must be greater than 0");
        }
        errors.into_result()
    }
}

const FIELD_COLUMNS: &str = "id, user_id, location_id, name, area_hectares, created_at";

impl Field {
    pub async fn create(pool: &SqlitePool, data: &CreateField) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Field>(&format!(
            r#"INSERT INTO fields (user_id, location_id, name, area_hectares)
               VALUES ($1, $2, $3, $4)
               RETURNING {FIELD_COLUMNS}"#
        ))
        .bind(data.user_id)
        .bind(data.location_id)
        .bind(data.name.trim())
        .bind(data.area_hectares)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Field>(&format!("SELECT {FIELD_COLUMNS} FROM fields WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Field>(&format!("SELECT {FIELD_COLUMNS} FROM fields ORDER BY name ASC"))
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_user_id(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Field>(&format!(
            "SELECT {FIELD_COLUMNS} FROM fields WHERE user_id = $1 ORDER BY name ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
