pub mod chart;
pub mod config;
pub mod map;
pub mod response;
pub mod units;
