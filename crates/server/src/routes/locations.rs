use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    location::{CreateLocation, Location},
    validation::{Validate, ValidationErrors},
};
use deployment::Deployment;
use serde::Deserialize;
use tracing::info;
use utils::{
    map::{bounding_box, is_valid_coordinates},
    response::ApiResponse,
};

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
};

const DEFAULT_NEARBY_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
}

/// GET /api/locations
pub async fn get_locations(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<LocationsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Location>>>, ApiError> {
    let pool = &deployment.db().pool;
    let locations = match query.user_id {
        Some(user_id) => Location::find_by_user_id(pool, user_id).await?,
        None => Location::find_all(pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(locations)))
}

/// POST /api/locations
pub async fn create_location(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<CreateLocation>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Location>>), ApiError> {
    payload.validate()?;
    let location = Location::create(&deployment.db().pool, &payload).await?;
    info!(location_id = location.id, name = %location.name, "location created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(location))))
}

/// GET /api/locations/{id}
pub async fn get_location(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Location>>, ApiError> {
    let location = Location::find_by_id(&deployment.db().pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("location {id} not found")))?;
    Ok(ResponseJson(ApiResponse::success(location)))
}

/// GET /api/locations/nearby
pub async fn get_nearby(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<NearbyQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Location>>>, ApiError> {
    let radius_km = query.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
    let mut errors = ValidationErrors::new();
    if !is_valid_coordinates(query.lat, query.lng) {
        errors.add("lat", "coordinates are out of range");
    }
    if !(radius_km.is_finite() && radius_km > 0.0) {
        errors.add("radiusKm", "must be greater than 0");
    }
    errors.into_result()?;

    let bounds = bounding_box(query.lat, query.lng, radius_km);
    let locations = Location::find_in_bounds(&deployment.db().pool, &bounds).await?;
    Ok(ResponseJson(ApiResponse::success(locations)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/locations",
        Router::new()
            .route("/", get(get_locations).post(create_location))
            .route("/nearby", get(get_nearby))
            .route("/{id}", get(get_location)),
    )
}
