use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::database_validator::DatabaseValidator;
use tracing::{info, warn};
use utils::config::ServerConfig;

/// A backend running against a local SQLite file.
#[derive(Clone)]
pub struct LocalDeployment {
    config: ServerConfig,
    db: DBService,
}

impl LocalDeployment {
    pub async fn from_config(config: ServerConfig) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url, config.database_max_connections).await?;

        match DatabaseValidator::new(db.pool.clone()).validate().await {
            Ok(health) if health.is_ok() => info!("{}", health.summary()),
            Ok(health) => warn!("{}", health.summary()),
            Err(e) => warn!(error = %e, "database validation failed"),
        }

        Ok(Self { config, db })
    }

    /// An in-memory database, used by tests.
    pub async fn in_memory() -> Result<Self, DeploymentError> {
        Ok(Self {
            config: ServerConfig::default(),
            db: DBService::new_in_memory().await?,
        })
    }

    /// Wrap an existing database handle.
    pub fn with_db(config: ServerConfig, db: DBService) -> Self {
        Self { config, db }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = ServerConfig::from_env()?;
        Self::from_config(config).await
    }

    fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_deployment_is_migrated() {
        let deployment = LocalDeployment::in_memory().await.unwrap();
        let health = deployment.database_validator().validate().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(deployment.config().port, 3001);
    }

    #[tokio::test]
    async fn from_config_creates_the_database() {
        let config = ServerConfig {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            ..ServerConfig::default()
        };
        let deployment = LocalDeployment::from_config(config).await.unwrap();
        assert!(deployment.map().markers().await.unwrap().is_empty());
    }
}
