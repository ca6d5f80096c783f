use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::validation::{Validate, ValidationErrors};

/// A crop sown on a field on a given date.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CropPlanting {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub field_id: i64,
    #[ts(type = "number")]
    pub crop_id: i64,
    pub variety: Option<String>,
    pub planting_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl CropPlanting {
    /// Whole days elapsed since planting; negative before the planting date.
    pub fn days_since_planting(&self, today: NaiveDate) -> i64 {
        (today - self.planting_date).num_days()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateCropPlanting {
    #[ts(type = "number")]
    pub crop_id: i64,
    pub variety: Option<String>,
    pub planting_date: NaiveDate,
}

impl Validate for CreateCropPlanting {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(variety) = &self.variety {
            errors.require_max_len("variety", variety, 120);
        }
        errors.into_result()
    }
}

const PLANTING_COLUMNS: &str = "id, field_id, crop_id, variety, planting_date, created_at";

impl CropPlanting {
    pub async fn create(
        pool: &SqlitePool,
        field_id: i64,
        data: &CreateCropPlanting,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CropPlanting>(&format!(
            r#"INSERT INTO crop_plantings (field_id, crop_id, variety, planting_date)
               VALUES ($1, $2, $3, $4)
               RETURNING {PLANTING_COLUMNS}"#
        ))
        .bind(field_id)
        .bind(data.crop_id)
        .bind(&data.variety)
        .bind(data.planting_date)
        .fetch_one(pool)
        .await
    }

    /// Plantings on a field, most recent first.
    pub async fn find_by_field_id(
        pool: &SqlitePool,
        field_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CropPlanting>(&format!(
            r#"SELECT {PLANTING_COLUMNS}
               FROM crop_plantings
               WHERE field_id = $1
               ORDER BY planting_date DESC, id DESC"#
        ))
        .bind(field_id)
        .fetch_all(pool)
        .await
    }
}
