use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch, post},
};
use db::models::{
    user::{CreateUser, LoginRequest, UpdateUserPreferences, User},
    validation::Validate,
};
use deployment::Deployment;
use services::services::{
    auth::{hash_password, verify_password},
    map::UpdateMapLayer,
};
use tracing::{info, warn};
use utils::{map::MapLayer, response::ApiResponse};

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath},
};

async fn load_user(deployment: &DeploymentImpl, id: i64) -> Result<User, ApiError> {
    User::find_by_id(&deployment.db().pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

/// POST /api/users
pub async fn create_user(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<CreateUser>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    payload.validate()?;
    let password_hash = hash_password(&payload.password).await?;
    let user = User::create(&deployment.db().pool, &payload, &password_hash).await?;
    info!(user_id = user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(user))))
}

/// POST /api/users/login
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = User::find_by_username(&deployment.db().pool, payload.username.trim()).await?;
    let verified = match &user {
        Some(user) => verify_password(&payload.password, &user.password_hash).await,
        None => false,
    };
    match user {
        Some(user) if verified => Ok(ResponseJson(ApiResponse::success(user))),
        _ => {
            warn!(username = %payload.username, "failed login");
            Err(ApiError::Unauthorized)
        }
    }
}

/// GET /api/users/{id}
pub async fn get_user(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = load_user(&deployment, id).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// PATCH /api/users/{id}/preferences
pub async fn update_preferences(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateUserPreferences>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = load_user(&deployment, id).await?;
    let preferences = payload.apply(&user.preferences);
    let user = User::update_preferences(&deployment.db().pool, id, &preferences)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// PATCH /api/users/{id}/map-layers/{layer_id}
pub async fn update_map_layer(
    State(deployment): State<DeploymentImpl>,
    AppPath((id, layer_id)): AppPath<(i64, String)>,
    AppJson(payload): AppJson<UpdateMapLayer>,
) -> Result<ResponseJson<ApiResponse<Vec<MapLayer>>>, ApiError> {
    let layers = deployment
        .map()
        .update_user_layer(id, &layer_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(layers.into_layers())))
}

/// POST /api/users/{id}/map-layers/reset
pub async fn reset_map_layers(
    State(deployment): State<DeploymentImpl>,
    AppPath(id): AppPath<i64>,
) -> Result<ResponseJson<ApiResponse<Vec<MapLayer>>>, ApiError> {
    let layers = deployment.map().reset_user_layers(id).await?;
    Ok(ResponseJson(ApiResponse::success(layers.into_layers())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/users",
        Router::new()
            .route("/", post(create_user))
            .route("/login", post(login))
            .route("/{id}", get(get_user))
            .route("/{id}/preferences", patch(update_preferences))
            .route("/{id}/map-layers/{layer_id}", patch(update_map_layer))
            .route("/{id}/map-layers/reset", post(reset_map_layers)),
    )
}
