pub mod auth;
pub mod database_validator;
pub mod export;
pub mod map;
pub mod phenology;
pub mod recommendations;
pub mod risk;
pub mod weather;
