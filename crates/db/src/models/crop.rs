use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::validation::{Validate, ValidationErrors};

const DEFAULT_COLOR: &str = "#64748b";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    #[ts(type = "number")]
    pub id: i64,
    pub name: String,
    pub scientific_name: String,
    /// Short machine name, e.g. `soybean`.
    pub crop_type: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateCrop {
    pub name: String,
    pub scientific_name: String,
    pub crop_type: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Validate for CreateCrop {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("name", &self.name);
        errors.require_non_empty("scientificName", &self.scientific_name);
        errors.require_non_empty("cropType", &self.crop_type);
        if self.color.as_deref().is_some_and(|c| !is_hex_color(c)) {
            errors.add("color", "must be a #rrggbb hex colour");
        }
        errors.into_result()
    }
}

const CROP_COLUMNS: &str = "id, name, scientific_name, crop_type, description, color, created_at";

impl Crop {
    pub async fn create(pool: &SqlitePool, data: &CreateCrop) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Crop>(&format!(
            r#"INSERT INTO crops (name, scientific_name, crop_type, description, color)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {CROP_COLUMNS}"#
        ))
        .bind(data.name.trim())
        .bind(data.scientific_name.trim())
        .bind(data.crop_type.trim().to_lowercase())
        .bind(&data.description)
        .bind(data.color.as_deref().unwrap_or(DEFAULT_COLOR))
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Crop>(&format!("SELECT {CROP_COLUMNS} FROM crops ORDER BY id ASC"))
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Crop>(&format!("SELECT {CROP_COLUMNS} FROM crops WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
