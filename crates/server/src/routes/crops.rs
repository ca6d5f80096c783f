use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    agricultural_risk::AgriculturalRisk,
    agronomic_recommendation::AgronomicRecommendation,
    crop::{CreateCrop, Crop},
    crop_stage::{CreateCropStage, CropStage},
    validation::Validate,
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::phenology::CropView;
use tracing::info;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropViewQuery {
    pub stage_id: Option<i64>,
}

pub async fn get_crops(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Crop>>>, ApiError> {
    let crops = Crop::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(crops)))
}

pub async fn create_crop(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<CreateCrop>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Crop>>), ApiError> {
    payload.validate()?;
    let crop = Crop::create(&deployment.db().pool, &payload).await?;
    info!(crop_id = crop.id, name = %crop.name, "crop created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(crop))))
}

pub async fn get_crop(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Crop>>, ApiError> {
    let crop = Crop::find_by_id(&deployment.db().pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("crop {id} not found")))?;
    Ok(ResponseJson(ApiResponse::success(crop)))
}

pub async fn get_stages(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Vec<CropStage>>>, ApiError> {
    let stages = deployment.phenology().stages(id).await?;
    Ok(ResponseJson(ApiResponse::success(stages)))
}

pub async fn create_stage(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<CreateCropStage>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CropStage>>), ApiError> {
    let stage = deployment.phenology().add_stage(id, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(stage))))
}

/// GET /api/crops/{id}/view
/// Stages, critical stages and risks of the crop, with `stageId` as the
/// selected stage.
pub async fn get_crop_view(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<CropViewQuery>,
) -> Result<ResponseJson<ApiResponse<CropView>>, ApiError> {
    let view = deployment.phenology().crop_view(id, query.stage_id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub async fn get_crop_risks(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Vec<AgriculturalRisk>>>, ApiError> {
    let risks = deployment.risks().for_crop(id).await?;
    Ok(ResponseJson(ApiResponse::success(risks)))
}

pub async fn get_crop_recommendations(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Vec<AgronomicRecommendation>>>, ApiError> {
    let recommendations = deployment.recommendations().for_crop(id).await?;
    Ok(ResponseJson(ApiResponse::success(recommendations)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/crops",
        Router::new()
            .route("/", get(get_crops).post(create_crop))
            .route("/{id}", get(get_crop))
            .route("/{id}/stages", get(get_stages).post(create_stage))
            .route("/{id}/view", get(get_crop_view))
            .route("/{id}/risks", get(get_crop_risks))
            .route("/{id}/recommendations", get(get_crop_recommendations)),
    )
}
