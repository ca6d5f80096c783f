use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

use super::{
    agricultural_risk::RiskType,
    validation::{Validate, ValidationErrors},
};

/// Current risk scores (0 to 100) of one agricultural region.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegionalRiskScore {
    #[ts(type = "number")]
    pub id: i64,
    pub region_name: String,
    pub drought: i32,
    pub frost: i32,
    pub hail: i32,
    pub flood: i32,
    pub heat: i32,
    pub disease: i32,
    pub updated_at: DateTime<Utc>,
}

impl RegionalRiskScore {
    pub fn score(&self, risk_type: RiskType) -> i32 {
        match risk_type {
            RiskType::Drought => self.drought,
            RiskType::Frost => self.frost,
            RiskType::Hail => self.hail,
            RiskType::Flood => self.flood,
            RiskType::Heat => self.heat,
            RiskType::Disease => self.disease,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRegionalRiskScore {
    pub region_name: String,
    pub drought: i32,
    pub frost: i32,
    pub hail: i32,
    pub flood: i32,
    pub heat: i32,
    pub disease: i32,
}

impl Validate for UpsertRegionalRiskScore {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("regionName", &self.region_name);
        for (field, value) in [
            ("drought", self.drought),
            ("frost", self.frost),
            ("hail", self.hail),
            ("flood", self.flood),
            ("heat", self.heat),
            ("disease", self.disease),
        ] {
            errors.require_range(field, value, 0, 100);
        }
        errors.into_result()
    }
}

const REGIONAL_COLUMNS: &str =
    "id, region_name, drought, frost, hail, flood, heat, disease, updated_at";

impl RegionalRiskScore {
    /// Insert a region or replace the scores of an existing one with the same name.
    pub async fn upsert(
        pool: &SqlitePool,
        data: &UpsertRegionalRiskScore,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RegionalRiskScore>(&format!(
            r#"INSERT INTO regional_risk_scores (region_name, drought, frost, hail, flood, heat, disease)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT(region_name) DO UPDATE SET
                   drought = excluded.drought,
                   frost = excluded.frost,
                   hail = excluded.hail,
                   flood = excluded.flood,
                   heat = excluded.heat,
                   disease = excluded.disease,
                   updated_at = datetime('now', 'subsec')
               RETURNING {REGIONAL_COLUMNS}"#
        ))
        .bind(data.region_name.trim())
        .bind(data.drought)
        .bind(data.frost)
        .bind(data.hail)
        .bind(data.flood)
        .bind(data.heat)
        .bind(data.disease)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RegionalRiskScore>(&format!(
            "SELECT {REGIONAL_COLUMNS} FROM regional_risk_scores ORDER BY region_name ASC"
        ))
        .fetch_all(pool)
        .await
    }
}
