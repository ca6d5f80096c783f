use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    agricultural_risk::{AgriculturalRisk, CreateAgriculturalRisk},
    regional_risk::UpsertRegionalRiskScore,
    validation::ValidationErrors,
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::risk::{RegionalRiskSummary, RiskSortColumn, SortDirection};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppQuery},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RisksQuery {
    pub location_id: Option<i64>,
    pub crop_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RegionalQuery {
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
}

pub async fn create_risk(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<CreateAgriculturalRisk>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AgriculturalRisk>>), ApiError> {
    let risk = deployment.risks().record(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(risk))))
}

pub async fn get_risks(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<RisksQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<AgriculturalRisk>>>, ApiError> {
    let risks = deployment
        .risks()
        .list(query.location_id, query.crop_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(risks)))
}

/// GET /api/risks/regional
/// `sort` is `region` or a risk type; defaults to `region`.
pub async fn get_regional(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<RegionalQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<RegionalRiskSummary>>>, ApiError> {
    let column = match query.sort.as_deref() {
        Some(sort) => sort
            .parse::<RiskSortColumn>()
            .map_err(|e| ValidationErrors::single("sort", e.to_string()))?,
        None => RiskSortColumn::Region,
    };
    let regions = deployment.risks().regional(column, query.direction).await?;
    Ok(ResponseJson(ApiResponse::success(regions)))
}

/// PUT /api/risks/regional
/// Creates the region or replaces its scores.
pub async fn put_regional(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<UpsertRegionalRiskScore>,
) -> Result<ResponseJson<ApiResponse<RegionalRiskSummary>>, ApiError> {
    let summary = deployment.risks().upsert_regional(&payload).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/risks",
        Router::new()
            .route("/", get(get_risks).post(create_risk))
            .route("/regional", get(get_regional).put(put_regional)),
    )
}
