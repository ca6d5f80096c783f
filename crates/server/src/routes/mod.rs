use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::DeploymentImpl;

pub mod crops;
pub mod fields;
pub mod health;
pub mod locations;
pub mod map;
pub mod recommendations;
pub mod risks;
pub mod users;
pub mod weather;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api_routes = Router::new()
        .merge(health::router(&deployment))
        .merge(weather::router(&deployment))
        .merge(locations::router(&deployment))
        .merge(users::router(&deployment))
        .merge(crops::router(&deployment))
        .merge(fields::router(&deployment))
        .merge(risks::router(&deployment))
        .merge(recommendations::router(&deployment))
        .merge(map::router(&deployment))
        .with_state(deployment);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
