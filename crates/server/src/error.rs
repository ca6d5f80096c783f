use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::validation::ValidationErrors;
use services::services::{
    auth::AuthError, database_validator::DatabaseValidationError, export::ExportError,
    map::MapServiceError, phenology::PhenologyError, recommendations::RecommendationError,
    risk::RiskServiceError, weather::WeatherServiceError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("invalid username or password")]
    Unauthorized,
    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<WeatherServiceError> for ApiError {
    fn from(err: WeatherServiceError) -> Self {
        match err {
            WeatherServiceError::Database(e) => ApiError::Database(e),
            WeatherServiceError::Validation(e) => ApiError::Validation(e),
            e @ WeatherServiceError::LocationNotFound(_) => ApiError::NotFound(e.to_string()),
        }
    }
}

impl From<PhenologyError> for ApiError {
    fn from(err: PhenologyError) -> Self {
        match err {
            PhenologyError::Database(e) => ApiError::Database(e),
            PhenologyError::Validation(e) => ApiError::Validation(e),
            e @ (PhenologyError::CropNotFound(_) | PhenologyError::FieldNotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
        }
    }
}

impl From<RiskServiceError> for ApiError {
    fn from(err: RiskServiceError) -> Self {
        match err {
            RiskServiceError::Database(e) => ApiError::Database(e),
            RiskServiceError::Validation(e) => ApiError::Validation(e),
            e @ (RiskServiceError::LocationNotFound(_) | RiskServiceError::CropNotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
        }
    }
}

impl From<RecommendationError> for ApiError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::Database(e) => ApiError::Database(e),
            RecommendationError::Validation(e) => ApiError::Validation(e),
            e @ RecommendationError::CropNotFound(_) => ApiError::NotFound(e.to_string()),
        }
    }
}

impl From<MapServiceError> for ApiError {
    fn from(err: MapServiceError) -> Self {
        match err {
            MapServiceError::Database(e) => ApiError::Database(e),
            e @ (MapServiceError::UserNotFound(_) | MapServiceError::LayerNotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Weather(e) => e.into(),
            ExportError::Serialize(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseValidationError> for ApiError {
    fn from(err: DatabaseValidationError) -> Self {
        match err {
            DatabaseValidationError::Database(e) => ApiError::Database(e),
        }
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

fn database_error(err: &sqlx::Error) -> (StatusCode, &'static str) {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_unique_violation() {
            return (StatusCode::CONFLICT, "Resource already exists");
        }
        if db_err.is_foreign_key_violation() {
            return (StatusCode::BAD_REQUEST, "Referenced resource does not exist");
        }
        if db_err.is_check_violation() {
            return (StatusCode::BAD_REQUEST, "Value out of range");
        }
    }
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<(), ValidationErrors>::error_with_data("Validation failed", errors),
            ),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ApiResponse::error(&message))
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, ApiResponse::error(&message)),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::error("Invalid username or password"),
            ),
            ApiError::Database(err) => {
                let (status, message) = database_error(&err);
                if status.is_server_error() {
                    error!(error = %err, "database error");
                }
                (status, ApiResponse::error(message))
            }
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error(INTERNAL_MESSAGE),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_map_to_404() {
        let response = ApiError::from(WeatherServiceError::LocationNotFound(3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = ApiError::from(MapServiceError::LayerNotFound("snow".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_400() {
        let errors = ValidationErrors::single("name", "must not be empty");
        let response = ApiError::from(PhenologyError::Validation(errors)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pool_errors_map_to_500() {
        let response = ApiError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
