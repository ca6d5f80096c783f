use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    crop_planting::{CreateCropPlanting, CropPlanting},
    field::{CreateField, Field},
    validation::Validate,
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::phenology::PlantingStatus;
use tracing::info;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsQuery {
    pub user_id: Option<i64>,
}

pub async fn get_fields(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<FieldsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Field>>>, ApiError> {
    let pool = &deployment.db().pool;
    let fields = match query.user_id {
        Some(user_id) => Field::find_by_user_id(pool, user_id).await?,
        None => Field::find_all(pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(fields)))
}

pub async fn create_field(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<CreateField>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Field>>), ApiError> {
    payload.validate()?;
    let field = Field::create(&deployment.db().pool, &payload).await?;
    info!(field_id = field.id, user_id = field.user_id, "field created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(field))))
}

pub async fn get_field(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Field>>, ApiError> {
    let field = Field::find_by_id(&deployment.db().pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("field {id} not found")))?;
    Ok(ResponseJson(ApiResponse::success(field)))
}

/// GET /api/fields/{id}/plantings
/// Each planting with the growth stage it has reached today.
pub async fn get_plantings(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Vec<PlantingStatus>>>, ApiError> {
    let statuses = deployment.phenology().planting_statuses(id).await?;
    Ok(ResponseJson(ApiResponse::success(statuses)))
}

pub async fn create_planting(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<CreateCropPlanting>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CropPlanting>>), ApiError> {
    let planting = deployment.phenology().add_planting(id, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(planting))))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/fields",
        Router::new()
            .route("/", get(get_fields).post(create_field))
            .route("/{id}", get(get_field))
            .route("/{id}/plantings", get(get_plantings).post(create_planting)),
    )
}
