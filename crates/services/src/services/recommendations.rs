//! Agronomic advice attached to crops.

use db::models::{
    agricultural_risk::AgriculturalRisk,
    agronomic_recommendation::{
        AgronomicRecommendation, CreateAgronomicRecommendation, RecommendationPriority,
    },
    crop::Crop,
    validation::{Validate, ValidationErrors},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use super::risk::{priority_for_level, stage_of_crop};

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("crop {0} not found")]
    CropNotFound(i64),
}

/// Priority implied by the worst recorded risk of the crop, restricted to
/// `data.risk_type` when set. Without matching risks the priority is medium.
pub fn derive_priority(
    data: &CreateAgronomicRecommendation,
    risks: &[AgriculturalRisk],
) -> RecommendationPriority {
    risks
        .iter()
        .filter(|r| r.crop_id == data.crop_id)
        .filter(|r| data.risk_type.is_none_or(|t| t == r.risk_type))
        .map(|r| r.risk_level)
        .max()
        .map(priority_for_level)
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct RecommendationService {
    pool: SqlitePool,
}

impl RecommendationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        data: &CreateAgronomicRecommendation,
    ) -> Result<AgronomicRecommendation, RecommendationError> {
        data.validate()?;
        if Crop::find_by_id(&self.pool, data.crop_id).await?.is_none() {
            return Err(RecommendationError::CropNotFound(data.crop_id));
        }
        if let Some(stage_id) = data.crop_stage_id {
            stage_of_crop(&self.pool, stage_id, data.crop_id).await??;
        }

        let priority = match data.priority {
            Some(priority) => priority,
            None => {
                let risks = AgriculturalRisk::find_by_crop_id(&self.pool, data.crop_id).await?;
                derive_priority(data, &risks)
            }
        };
        let recommendation = AgronomicRecommendation::create(&self.pool, data, priority).await?;
        info!(
            crop_id = recommendation.crop_id,
            priority = %recommendation.priority,
            "recommendation issued"
        );
        Ok(recommendation)
    }

    /// Recommendations for a crop, most urgent first.
    pub async fn for_crop(
        &self,
        crop_id: i64,
    ) -> Result<Vec<AgronomicRecommendation>, RecommendationError> {
        if Crop::find_by_id(&self.pool, crop_id).await?.is_none() {
            return Err(RecommendationError::CropNotFound(crop_id));
        }
        Ok(AgronomicRecommendation::find_by_crop_id(&self.pool, crop_id).await?)
    }
}
