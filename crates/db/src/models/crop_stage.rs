use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::validation::{Validate, ValidationErrors};

/// A phenological stage of a crop, e.g. soybean R1 (beginning bloom).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CropStage {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub crop_id: i64, // Foreign key to Crop
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    /// Days after planting the stage usually begins.
    pub day_range_start: i32,
    pub day_range_end: i32,
    pub is_critical: bool,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    /// Daily water need in mm.
    pub water_requirement: Option<f64>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl CropStage {
    pub fn contains_day(&self, day: i64) -> bool {
        (i64::from(self.day_range_start)..=i64::from(self.day_range_end)).contains(&day)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateCropStage {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub day_range_start: i32,
    pub day_range_end: i32,
    pub is_critical: Option<bool>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub water_requirement: Option<f64>,
    pub sort_order: i32,
}

impl Validate for CreateCropStage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("name", &self.name);
        errors.require_non_empty("label", &self.label);
        if self.day_range_start < 0 {
            errors.add("dayRangeStart", "must not be negative");
        }
        if self.day_range_start > self.day_range_end {
            errors.add("dayRangeEnd", "must not be before dayRangeStart");
        }
        if let (Some(min), Some(max)) = (self.temperature_min, self.temperature_max) {
            if min > max {
                errors.add("temperatureMax", "must not be below temperatureMin");
            }
        }
        errors.require_optional_range("waterRequirement", self.water_requirement, 0.0, 50.0);
        errors.into_result()
    }
}

const STAGE_COLUMNS: &str = "id, crop_id, name, label, description, day_range_start, day_range_end, \
     is_critical, temperature_min, temperature_max, water_requirement, sort_order, created_at";

impl CropStage {
    pub async fn create(
        pool: &SqlitePool,
        crop_id: i64,
        data: &CreateCropStage,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CropStage>(&format!(
            r#"INSERT INTO crop_stages (crop_id, name, label, description, day_range_start,
                   day_range_end, is_critical, temperature_min, temperature_max,
                   water_requirement, sort_order)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING {STAGE_COLUMNS}"#
        ))
        .bind(crop_id)
        .bind(data.name.trim())
        .bind(data.label.trim())
        .bind(&data.description)
        .bind(data.day_range_start)
        .bind(data.day_range_end)
        .bind(data.is_critical.unwrap_or(false))
        .bind(data.temperature_min)
        .bind(data.temperature_max)
        .bind(data.water_requirement)
        .bind(data.sort_order)
        .fetch_one(pool)
        .await
    }

    /// Stages of a crop in growth order.
    pub async fn find_by_crop_id(pool: &SqlitePool, crop_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CropStage>(&format!(
            r#"SELECT {STAGE_COLUMNS}
               FROM crop_stages
               WHERE crop_id = $1
               ORDER BY sort_order ASC, id ASC"#
        ))
        .bind(crop_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CropStage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM crop_stages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support;

    fn stage(name: &str, start: i32, end: i32, sort_order: i32) -> CreateCropStage {
        CreateCropStage {
            name: name.to_string(),
            label: format!("{name} label"),
            description: None,
            day_range_start: start,
            day_range_end: end,
            is_critical: None,
            temperature_min: Some(15.0),
            temperature_max: Some(30.0),
            water_requirement: Some(3.5),
            sort_order,
        }
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let mut data = stage("V1", 15, 10, 1);
        data.temperature_min = Some(31.0);
        let fields: Vec<_> = data
            .validate()
            .unwrap_err()
            .errors
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["dayRangeEnd", "temperatureMax"]);
    }

    #[tokio::test]
    async fn stages_come_back_in_sort_order() {
        let pool = test_support::pool().await;
        let crop_id = test_support::crop(&pool).await;
        CropStage::create(&pool, crop_id, &stage("R1", 40, 50, 4)).await.unwrap();
        CropStage::create(&pool, crop_id, &stage("VE", 5, 10, 1)).await.unwrap();

        let stages = CropStage::find_by_crop_id(&pool, crop_id).await.unwrap();
        let names: Vec<_> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["VE", "R1"]);
        assert!(stages[0].contains_day(7));
        assert!(!stages[0].contains_day(11));
    }
}
