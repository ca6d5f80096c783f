use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::{
    agricultural_risk::RiskType,
    validation::{Validate, ValidationErrors},
};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, TS,
    EnumString, Display, Default,
)]
#[sqlx(type_name = "recommendation_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecommendationPriority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

/// Advice issued for a crop, optionally tied to a risk type and stage.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AgronomicRecommendation {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub crop_id: i64,
    #[ts(type = "number | null")]
    pub crop_stage_id: Option<i64>,
    pub risk_type: Option<RiskType>,
    pub title: String,
    pub body: String,
    #[sqlx(json)]
    pub actions: Vec<String>,
    pub source: Option<String>,
    pub priority: RecommendationPriority,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgronomicRecommendation {
    #[ts(type = "number")]
    pub crop_id: i64,
    #[ts(type = "number | null")]
    pub crop_stage_id: Option<i64>,
    pub risk_type: Option<RiskType>,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub actions: Vec<String>,
    pub source: Option<String>,
    /// Derived from the crop's current risk level when omitted.
    pub priority: Option<RecommendationPriority>,
}

impl Validate for CreateAgronomicRecommendation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("title", &self.title);
        errors.require_max_len("title", &self.title, 200);
        errors.require_non_empty("body", &self.body);
        if self.actions.iter().any(|a| a.trim().is_empty()) {
            errors.add("actions", "must not contain empty entries");
        }
        errors.into_result()
    }
}

const RECOMMENDATION_COLUMNS: &str =
    "id, crop_id, crop_stage_id, risk_type, title, body, actions, source, priority, issued_at";

impl AgronomicRecommendation {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateAgronomicRecommendation,
        priority: RecommendationPriority,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AgronomicRecommendation>(&format!(
            r#"INSERT INTO agronomic_recommendations (crop_id, crop_stage_id, risk_type, title,
                   body, actions, source, priority)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {RECOMMENDATION_COLUMNS}"#
        ))
        .bind(data.crop_id)
        .bind(data.crop_stage_id)
        .bind(data.risk_type)
        .bind(data.title.trim())
        .bind(data.body.trim())
        .bind(Json(&data.actions))
        .bind(&data.source)
        .bind(priority)
        .fetch_one(pool)
        .await
    }

    /// Recommendations for a crop, most pressing first.
    pub async fn find_by_crop_id(pool: &SqlitePool, crop_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AgronomicRecommendation>(&format!(
            r#"SELECT {RECOMMENDATION_COLUMNS}
               FROM agronomic_recommendations
               WHERE crop_id = $1
               ORDER BY CASE priority
                            WHEN 'urgent' THEN 0
                            WHEN 'high' THEN 1
                            WHEN 'medium' THEN 2
                            ELSE 3
                        END ASC,
                        issued_at DESC,
                        id DESC"#
        ))
        .bind(crop_id)
        .fetch_all(pool)
        .await
    }
}
