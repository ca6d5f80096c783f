use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::validation::{Validate, ValidationErrors};

/// Which view of the weather a record belongs to.
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "data_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeatherDataType {
    Current,
    Historical,
    Forecast,
}

/// One weather observation or prediction. Readings are metric
/// (°C, %, km/h, degrees, mm, hPa, km).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub location_id: i64,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub precipitation: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub uv_index: Option<f64>,
    pub data_type: WeatherDataType,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateWeatherData {
    #[ts(type = "number")]
    pub location_id: i64,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub precipitation: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub uv_index: Option<f64>,
    pub data_type: WeatherDataType,
}

impl Validate for CreateWeatherData {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_optional_range("temperature", self.temperature, -90.0, 60.0);
        errors.require_optional_range("humidity", self.humidity, 0.0, 100.0);
        errors.require_optional_range("windSpeed", self.wind_speed, 0.0, 500.0);
        errors.require_optional_range("windDirection", self.wind_direction, 0.0, 360.0);
        errors.require_optional_range("precipitation", self.precipitation, 0.0, 2000.0);
        errors.require_optional_range("pressure", self.pressure, 800.0, 1100.0);
        errors.require_optional_range("visibility", self.visibility, 0.0, 500.0);
        errors.require_optional_range("uvIndex", self.uv_index, 0.0, 20.0);
        errors.into_result()
    }
}

const WEATHER_COLUMNS: &str = "id, location_id, timestamp, temperature, humidity, wind_speed, \
     wind_direction, precipitation, pressure, visibility, uv_index, data_type";

impl WeatherData {
    pub async fn create(pool: &SqlitePool, data: &CreateWeatherData) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WeatherData>(&format!(
            r#"INSERT INTO weather_data (location_id, timestamp, temperature, humidity, wind_speed,
                   wind_direction, precipitation, pressure, visibility, uv_index, data_type)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING {WEATHER_COLUMNS}"#
        ))
        .bind(data.location_id)
        .bind(data.timestamp)
        .bind(data.temperature)
        .bind(data.humidity)
        .bind(data.wind_speed)
        .bind(data.wind_direction)
        .bind(data.precipitation)
        .bind(data.pressure)
        .bind(data.visibility)
        .bind(data.uv_index)
        .bind(data.data_type)
        .fetch_one(pool)
        .await
    }

    /// Most recent record of `data_type` for a location.
    pub async fn find_latest(
        pool: &SqlitePool,
        location_id: i64,
        data_type: WeatherDataType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WeatherData>(&format!(
            r#"SELECT {WEATHER_COLUMNS}
               FROM weather_data
               WHERE location_id = $1 AND data_type = $2
               ORDER BY timestamp DESC, id DESC
               LIMIT 1"#
        ))
        .bind(location_id)
        .bind(data_type)
        .fetch_optional(pool)
        .await
    }

    /// Records with `start <= timestamp < end`, oldest first.
    pub async fn find_in_range(
        pool: &SqlitePool,
        location_id: i64,
        data_type: WeatherDataType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WeatherData>(&format!(
            r#"SELECT {WEATHER_COLUMNS}
               FROM weather_data
               WHERE location_id = $1
                 AND data_type = $2
                 AND timestamp >= $3
                 AND timestamp < $4
               ORDER BY timestamp ASC, id ASC"#
        ))
        .bind(location_id)
        .bind(data_type)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }
}
