use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use serde::Deserialize;
use services::services::map::MapMarker;
use utils::{map::MapLayer, response::ApiResponse};

use crate::{DeploymentImpl, error::ApiError, extract::AppQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayersQuery {
    pub user_id: Option<i64>,
}

/// GET /api/map/layers
/// Default layers, or the user's saved layer state when `userId` is given.
pub async fn get_layers(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<LayersQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<MapLayer>>>, ApiError> {
    let layers = deployment.map().layers(query.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(layers.into_layers())))
}

pub async fn get_markers(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<MapMarker>>>, ApiError> {
    let markers = deployment.map().markers().await?;
    Ok(ResponseJson(ApiResponse::success(markers)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/map",
        Router::new()
            .route("/layers", get(get_layers))
            .route("/locations", get(get_markers)),
    )
}
