//! Risk banding and the regional risk table.

use std::cmp::Ordering;

use db::models::{
    agricultural_risk::{AgriculturalRisk, CreateAgriculturalRisk, RiskType},
    agronomic_recommendation::RecommendationPriority,
    crop::Crop,
    crop_stage::CropStage,
    location::Location,
    regional_risk::{RegionalRiskScore, UpsertRegionalRiskScore},
    validation::{Validate, ValidationErrors},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum RiskServiceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("location {0} not found")]
    LocationNotFound(i64),
    #[error("crop {0} not found")]
    CropNotFound(i64),
}

/// Severity band of a 0 to 100 risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: i32) -> Self {
        if score >= 75 {
            Self::High
        } else if score >= 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

pub fn risk_label(risk_type: RiskType) -> &'static str {
    match risk_type {
        RiskType::Drought => "Drought",
        RiskType::Frost => "Frost",
        RiskType::Hail => "Hail",
        RiskType::Flood => "Flood",
        RiskType::Heat => "Heat",
        RiskType::Disease => "Disease",
    }
}

pub fn priority_for_level(level: i32) -> RecommendationPriority {
    match level {
        l if l >= 75 => RecommendationPriority::Urgent,
        l if l >= 50 => RecommendationPriority::High,
        l if l >= 25 => RecommendationPriority::Medium,
        _ => RecommendationPriority::Low,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RegionalRiskSummary {
    #[serde(flatten)]
    #[ts(flatten)]
    pub scores: RegionalRiskScore,
    pub highest_risk: RiskType,
    pub highest_risk_level: i32,
    pub highest_risk_band: RiskLevel,
    pub highest_risk_label: String,
}

impl RegionalRiskSummary {
    pub fn from_scores(scores: RegionalRiskScore) -> Self {
        // Strictly greater keeps the earlier risk type on ties.
        let (highest_risk, highest_risk_level) = RiskType::ALL
            .iter()
            .skip(1)
            .fold((RiskType::ALL[0], scores.score(RiskType::ALL[0])), |best, &t| {
                let level = scores.score(t);
                if level > best.1 { (t, level) } else { best }
            });
        Self {
            scores,
            highest_risk,
            highest_risk_level,
            highest_risk_band: RiskLevel::from_score(highest_risk_level),
            highest_risk_label: risk_label(highest_risk).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskSortColumn {
    Region,
    Risk(RiskType),
}

#[derive(Debug, Error)]
#[error("unknown sort column: {0}")]
pub struct UnknownSortColumn(pub String);

impl std::str::FromStr for RiskSortColumn {
    type Err = UnknownSortColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("region") {
            return Ok(Self::Region);
        }
        s.to_ascii_lowercase()
            .parse::<RiskType>()
            .map(Self::Risk)
            .map_err(|_| UnknownSortColumn(s.to_string()))
    }
}

impl RiskSortColumn {
    /// Region names read naturally A to Z, risk columns worst first.
    pub fn default_direction(self) -> SortDirection {
        match self {
            Self::Region => SortDirection::Asc,
            Self::Risk(_) => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, TS)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    Desc,
}

pub fn summarize_regions(scores: Vec<RegionalRiskScore>) -> Vec<RegionalRiskSummary> {
    scores.into_iter().map(RegionalRiskSummary::from_scores).collect()
}

pub fn sort_regions(
    summaries: &mut [RegionalRiskSummary],
    column: RiskSortColumn,
    direction: SortDirection,
) {
    summaries.sort_by(|a, b| {
        let ordering = match column {
            RiskSortColumn::Region => compare_names(&a.scores.region_name, &b.scores.region_name),
            RiskSortColumn::Risk(t) => a.scores.score(t).cmp(&b.scores.score(t)),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[derive(Clone)]
pub struct RiskService {
    pool: SqlitePool,
}

impl RiskService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        data: &CreateAgriculturalRisk,
    ) -> Result<AgriculturalRisk, RiskServiceError> {
        data.validate()?;
        if Location::find_by_id(&self.pool, data.location_id).await?.is_none() {
            return Err(RiskServiceError::LocationNotFound(data.location_id));
        }
        if Crop::find_by_id(&self.pool, data.crop_id).await?.is_none() {
            return Err(RiskServiceError::CropNotFound(data.crop_id));
        }
        if let Some(stage_id) = data.crop_stage_id {
            stage_of_crop(&self.pool, stage_id, data.crop_id).await??;
        }

        let risk = AgriculturalRisk::create(&self.pool, data).await?;
        info!(
            crop_id = risk.crop_id,
            location_id = risk.location_id,
            risk_type = %risk.risk_type,
            risk_level = risk.risk_level,
            "agricultural risk recorded"
        );
        Ok(risk)
    }

    pub async fn list(
        &self,
        location_id: Option<i64>,
        crop_id: Option<i64>,
    ) -> Result<Vec<AgriculturalRisk>, RiskServiceError> {
        Ok(AgriculturalRisk::find_filtered(&self.pool, location_id, crop_id).await?)
    }

    pub async fn for_crop(&self, crop_id: i64) -> Result<Vec<AgriculturalRisk>, RiskServiceError> {
        if Crop::find_by_id(&self.pool, crop_id).await?.is_none() {
            return Err(RiskServiceError::CropNotFound(crop_id));
        }
        Ok(AgriculturalRisk::find_by_crop_id(&self.pool, crop_id).await?)
    }

    /// Regional table sorted by `column`, in its default direction unless given.
    pub async fn regional(
        &self,
        column: RiskSortColumn,
        direction: Option<SortDirection>,
    ) -> Result<Vec<RegionalRiskSummary>, RiskServiceError> {
        let mut summaries = summarize_regions(RegionalRiskScore::find_all(&self.pool).await?);
        sort_regions(
            &mut summaries,
            column,
            direction.unwrap_or(column.default_direction()),
        );
        Ok(summaries)
    }

    pub async fn upsert_regional(
        &self,
        data: &UpsertRegionalRiskScore,
    ) -> Result<RegionalRiskSummary, RiskServiceError> {
        data.validate()?;
        let scores = RegionalRiskScore::upsert(&self.pool, data).await?;
        info!(region = %scores.region_name, "regional risk scores updated");
        Ok(RegionalRiskSummary::from_scores(scores))
    }
}

/// `Ok(Err(..))` when the stage is missing or belongs to another crop.
pub(crate) async fn stage_of_crop(
    pool: &SqlitePool,
    stage_id: i64,
    crop_id: i64,
) -> Result<Result<CropStage, ValidationErrors>, sqlx::Error> {
    Ok(match CropStage::find_by_id(pool, stage_id).await? {
        Some(stage) if stage.crop_id == crop_id => Ok(stage),
        _ => Err(ValidationErrors::single(
            "cropStageId",
            format!("is not a stage of crop {crop_id}"),
        )),
    })
}
