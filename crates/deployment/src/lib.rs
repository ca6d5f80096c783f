use async_trait::async_trait;
use db::{DBService, DBServiceError};
use services::services::{
    database_validator::DatabaseValidator, map::MapService, phenology::PhenologyService,
    recommendations::RecommendationService, risk::RiskService, weather::WeatherService,
};
use thiserror::Error;
use utils::config::{ConfigError, ServerConfig};

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DBServiceError),
}

/// What a running backend hands to request handlers.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>
    where
        Self: Sized;

    fn config(&self) -> &ServerConfig;

    fn db(&self) -> &DBService;

    fn weather(&self) -> WeatherService {
        WeatherService::new(self.db().pool.clone())
    }

    fn phenology(&self) -> PhenologyService {
        PhenologyService::new(self.db().pool.clone())
    }

    fn risks(&self) -> RiskService {
        RiskService::new(self.db().pool.clone())
    }

    fn recommendations(&self) -> RecommendationService {
        RecommendationService::new(self.db().pool.clone())
    }

    fn map(&self) -> MapService {
        MapService::new(self.db().pool.clone())
    }

    fn database_validator(&self) -> DatabaseValidator {
        DatabaseValidator::new(self.db().pool.clone())
    }
}
