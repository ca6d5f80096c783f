//! Crop growth stages: the crop view and the stage each planting is in.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use db::models::{
    agricultural_risk::AgriculturalRisk,
    crop::Crop,
    crop_planting::{CreateCropPlanting, CropPlanting},
    crop_stage::{CreateCropStage, CropStage},
    field::Field,
    validation::{Validate, ValidationErrors},
};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum PhenologyError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("crop {0} not found")]
    CropNotFound(i64),
    #[error("field {0} not found")]
    FieldNotFound(i64),
}

/// Crops with the selected crop's stages and risks.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CropView {
    pub available_crops: Vec<Crop>,
    pub selected_crop: Option<Crop>,
    pub stages: Vec<CropStage>,
    pub critical_stages: Vec<CropStage>,
    pub current_stage: Option<CropStage>,
    pub risks: Vec<AgriculturalRisk>,
}

impl CropView {
    /// Without a `selected_stage_id` the current stage is the second critical
    /// stage, if there is one. An id matching none of the crop's stages
    /// selects nothing.
    pub fn build(
        crops: Vec<Crop>,
        selected_crop_id: i64,
        stages: Vec<CropStage>,
        selected_stage_id: Option<i64>,
        risks: Vec<AgriculturalRisk>,
    ) -> Self {
        let selected_crop = crops.iter().find(|c| c.id == selected_crop_id).cloned();

        let mut stages: Vec<CropStage> = stages
            .into_iter()
            .filter(|s| s.crop_id == selected_crop_id)
            .collect();
        stages.sort_by_key(|s| s.sort_order);

        let critical_stages: Vec<CropStage> =
            stages.iter().filter(|s| s.is_critical).cloned().collect();
        let current_stage = match selected_stage_id {
            Some(id) => stages.iter().find(|s| s.id == id).cloned(),
            None => critical_stages.get(1).cloned(),
        };

        let risks = risks
            .into_iter()
            .filter(|r| r.crop_id == selected_crop_id)
            .collect();

        Self {
            available_crops: crops,
            selected_crop,
            stages,
            critical_stages,
            current_stage,
            risks,
        }
    }
}

/// Stage for `day` days after planting. Between stages the last one that
/// already started counts; before the first stage there is none.
pub fn stage_for_day(stages: &[CropStage], day: i64) -> Option<&CropStage> {
    stages.iter().find(|s| s.contains_day(day)).or_else(|| {
        stages
            .iter()
            .filter(|s| i64::from(s.day_range_start) <= day)
            .max_by_key(|s| (s.day_range_start, s.sort_order))
    })
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PlantingStatus {
    #[serde(flatten)]
    #[ts(flatten)]
    pub planting: CropPlanting,
    pub crop_name: Option<String>,
    #[ts(type = "number")]
    pub days_since_planting: i64,
    pub current_stage: Option<CropStage>,
}

impl PlantingStatus {
    pub fn new(planting: CropPlanting, crop: Option<&Crop>, stages: &[CropStage], today: NaiveDate) -> Self {
        let days_since_planting = planting.days_since_planting(today);
        Self {
            current_stage: stage_for_day(stages, days_since_planting).cloned(),
            crop_name: crop.map(|c| c.name.clone()),
            days_since_planting,
            planting,
        }
    }
}

#[derive(Clone)]
pub struct PhenologyService {
    pool: SqlitePool,
}

impl PhenologyService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn crop(&self, crop_id: i64) -> Result<Crop, PhenologyError> {
        Crop::find_by_id(&self.pool, crop_id)
            .await?
            .ok_or(PhenologyError::CropNotFound(crop_id))
    }

    pub async fn crop_view(
        &self,
        crop_id: i64,
        stage_id: Option<i64>,
    ) -> Result<CropView, PhenologyError> {
        self.crop(crop_id).await?;
        let crops = Crop::find_all(&self.pool).await?;
        let stages = CropStage::find_by_crop_id(&self.pool, crop_id).await?;
        let risks = AgriculturalRisk::find_by_crop_id(&self.pool, crop_id).await?;
        Ok(CropView::build(crops, crop_id, stages, stage_id, risks))
    }

    pub async fn stages(&self, crop_id: i64) -> Result<Vec<CropStage>, PhenologyError> {
        self.crop(crop_id).await?;
        Ok(CropStage::find_by_crop_id(&self.pool, crop_id).await?)
    }

    pub async fn add_stage(
        &self,
        crop_id: i64,
        data: &CreateCropStage,
    ) -> Result<CropStage, PhenologyError> {
        data.validate()?;
        self.crop(crop_id).await?;
        let stage = CropStage::create(&self.pool, crop_id, data).await?;
        info!(crop_id, stage_id = stage.id, name = %stage.name, "crop stage created");
        Ok(stage)
    }

    pub async fn add_planting(
        &self,
        field_id: i64,
        data: &CreateCropPlanting,
    ) -> Result<CropPlanting, PhenologyError> {
        data.validate()?;
        self.field(field_id).await?;
        self.crop(data.crop_id).await?;
        let planting = CropPlanting::create(&self.pool, field_id, data).await?;
        info!(field_id, crop_id = data.crop_id, "crop planted");
        Ok(planting)
    }

    async fn field(&self, field_id: i64) -> Result<Field, PhenologyError> {
        Field::find_by_id(&self.pool, field_id)
            .await?
            .ok_or(PhenologyError::FieldNotFound(field_id))
    }

    /// Every planting on a field with the stage it is in today.
    pub async fn planting_statuses(
        &self,
        field_id: i64,
    ) -> Result<Vec<PlantingStatus>, PhenologyError> {
        self.planting_statuses_on(field_id, Utc::now().date_naive()).await
    }

    pub async fn planting_statuses_on(
        &self,
        field_id: i64,
        today: NaiveDate,
    ) -> Result<Vec<PlantingStatus>, PhenologyError> {
        self.field(field_id).await?;
        let plantings = CropPlanting::find_by_field_id(&self.pool, field_id).await?;

        let mut crops: HashMap<i64, (Option<Crop>, Vec<CropStage>)> = HashMap::new();
        let mut statuses = Vec::with_capacity(plantings.len());
        for planting in plantings {
            if !crops.contains_key(&planting.crop_id) {
                let crop = Crop::find_by_id(&self.pool, planting.crop_id).await?;
                let stages = CropStage::find_by_crop_id(&self.pool, planting.crop_id).await?;
                crops.insert(planting.crop_id, (crop, stages));
            }
            let status = match crops.get(&planting.crop_id) {
                Some((crop, stages)) => PlantingStatus::new(planting, crop.as_ref(), stages, today),
                None => PlantingStatus::new(planting, None, &[], today),
            };
            statuses.push(status);
        }
        Ok(statuses)
    }
}
