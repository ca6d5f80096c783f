use axum::{
    Router, extract::State, http::StatusCode, response::Json as ResponseJson, routing::post,
};
use db::models::agronomic_recommendation::{
    AgronomicRecommendation, CreateAgronomicRecommendation,
};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, extract::AppJson};

/// POST /api/recommendations
/// Without an explicit priority it follows the crop's worst matching risk.
pub async fn create_recommendation(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<CreateAgronomicRecommendation>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AgronomicRecommendation>>), ApiError> {
    let recommendation = deployment.recommendations().create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(recommendation)),
    ))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/recommendations", post(create_recommendation))
}
