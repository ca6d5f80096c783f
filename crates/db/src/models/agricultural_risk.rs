use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::validation::{Validate, ValidationErrors};

/// Adverse weather events tracked for crops.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, TS,
    EnumString, Display,
)]
#[sqlx(type_name = "risk_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskType {
    Drought,
    Frost,
    Hail,
    Flood,
    Heat,
    Disease,
}

impl RiskType {
    pub const ALL: [RiskType; 6] = [
        RiskType::Drought,
        RiskType::Frost,
        RiskType::Hail,
        RiskType::Flood,
        RiskType::Heat,
        RiskType::Disease,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskDetails {
    pub duration: Option<String>,
    pub impact_description: Option<String>,
    pub recommended_actions: Vec<String>,
    /// Event-specific facts such as the pathogen or expected hail intensity.
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AgriculturalRisk {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub location_id: i64,
    #[ts(type = "number")]
    pub crop_id: i64,
    #[ts(type = "number | null")]
    pub crop_stage_id: Option<i64>,
    pub date: NaiveDate,
    pub risk_type: RiskType,
    /// 0 to 100.
    pub risk_level: i32,
    /// 0 to 1.
    pub probability: f64,
    #[sqlx(json)]
    pub details: RiskDetails,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgriculturalRisk {
    #[ts(type = "number")]
    pub location_id: i64,
    #[ts(type = "number")]
    pub crop_id: i64,
    #[ts(type = "number | null")]
    pub crop_stage_id: Option<i64>,
    pub date: NaiveDate,
    pub risk_type: RiskType,
    pub risk_level: i32,
    pub probability: f64,
    #[serde(default)]
    pub details: RiskDetails,
}

impl Validate for CreateAgriculturalRisk {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_range("riskLevel", self.risk_level, 0, 100);
        if self.probability.is_finite() {
            errors.require_range("probability", self.probability, 0.0, 1.0);
        } else {
            errors.add("probability", "must be a finite number");
        }
        errors.into_result()
    }
}

const RISK_COLUMNS: &str = "id, location_id, crop_id, crop_stage_id, date, risk_type, risk_level, \
     probability, details, created_at";

impl AgriculturalRisk {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateAgriculturalRisk,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AgriculturalRisk>(&format!(
            r#"INSERT INTO agricultural_risks (location_id, crop_id, crop_stage_id, date,
                   risk_type, risk_level, probability, details)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {RISK_COLUMNS}"#
        ))
        .bind(data.location_id)
        .bind(data.crop_id)
        .bind(data.crop_stage_id)
        .bind(data.date)
        .bind(data.risk_type)
        .bind(data.risk_level)
        .bind(data.probability)
        .bind(Json(&data.details))
        .fetch_one(pool)
        .await
    }

    /// Risks for a crop, soonest first.
    pub async fn find_by_crop_id(pool: &SqlitePool, crop_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        Self::find_filtered(pool, None, Some(crop_id)).await
    }

    /// Risks matching every filter that is set, soonest first.
    pub async fn find_filtered(
        pool: &SqlitePool,
        location_id: Option<i64>,
        crop_id: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AgriculturalRisk>(&format!(
            r#"SELECT {RISK_COLUMNS}
               FROM agricultural_risks
               WHERE ($1 IS NULL OR location_id = $1)
                 AND ($2 IS NULL OR crop_id = $2)
               ORDER BY date ASC, risk_level DESC, id ASC"#
        ))
        .bind(location_id)
        .bind(crop_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support;

    fn drought(location_id: i64, crop_id: i64, date: &str, level: i32) -> CreateAgriculturalRisk {
        CreateAgriculturalRisk {
            location_id,
            crop_id,
            crop_stage_id: None,
            date: date.parse().unwrap(),
            risk_type: RiskType::Drought,
            risk_level: level,
            probability: 0.8,
            details: RiskDetails {
                duration: Some("7 days".to_string()),
                recommended_actions: vec!["Implement irrigation if available".to_string()],
                ..Default::default()
            },
        }
    }

    #[test]
    fn level_and_probability_bounds() {
        let mut data = drought(1, 1, "2023-12-15", 101);
        data.probability = 1.5;
        let err = data.validate().unwrap_err();
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn details_accept_partial_json() {
        let details: RiskDetails =
            serde_json::from_str(r#"{"notes":{"pathogen":"Rust"}}"#).unwrap();
        assert_eq!(details.notes.get("pathogen").map(String::as_str), Some("Rust"));
        assert!(details.recommended_actions.is_empty());
    }

    #[tokio::test]
    async fn filters_combine() {
        let pool = test_support::pool().await;
        let location_id = test_support::location(&pool).await;
        let crop_id = test_support::crop(&pool).await;
        AgriculturalRisk::create(&pool, &drought(location_id, crop_id, "2023-12-18", 65))
            .await
            .unwrap();
        let first = AgriculturalRisk::create(&pool, &drought(location_id, crop_id, "2023-12-15", 75))
            .await
            .unwrap();
        assert_eq!(first.details.duration.as_deref(), Some("7 days"));

        let by_crop = AgriculturalRisk::find_by_crop_id(&pool, crop_id).await.unwrap();
        assert_eq!(by_crop.len(), 2);
        assert_eq!(by_crop[0].risk_level, 75);

        let none = AgriculturalRisk::find_filtered(&pool, Some(location_id + 1), Some(crop_id))
            .await
            .unwrap();
        assert!(none.is_empty());
        let all = AgriculturalRisk::find_filtered(&pool, None, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
