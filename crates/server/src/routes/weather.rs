use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use db::models::{
    user::User,
    weather_data::{CreateWeatherData, WeatherData},
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{
    export::{ExportFormat, export_historical},
    weather::{
        CurrentWeather, DEFAULT_FORECAST_DAYS, DisplayUnits, ForecastDay, HistoricalChart,
        HistoricalWeather, UnitOverrides, WeatherDashboard,
    },
};
use tracing::debug;
use utils::{
    chart::ChartMetric,
    response::ApiResponse,
    units::{PressureUnit, TemperatureUnit, WindSpeedUnit},
};

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppQuery},
};

const DEFAULT_LOCATION_ID: i64 = 1;

/// Display options shared by the current and dashboard views.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuery {
    pub location_id: Option<i64>,
    pub user_id: Option<i64>,
    pub temperature_unit: Option<TemperatureUnit>,
    pub wind_speed_unit: Option<WindSpeedUnit>,
    pub pressure_unit: Option<PressureUnit>,
}

impl CurrentQuery {
    fn location_id(&self) -> i64 {
        self.location_id.unwrap_or(DEFAULT_LOCATION_ID)
    }

    async fn units(&self, deployment: &DeploymentImpl) -> Result<DisplayUnits, ApiError> {
        let overrides = UnitOverrides {
            temperature_unit: self.temperature_unit,
            wind_speed_unit: self.wind_speed_unit,
            pressure_unit: self.pressure_unit,
        };
        let preferences = match self.user_id {
            Some(user_id) => Some(
                User::find_by_id(&deployment.db().pool, user_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?
                    .preferences,
            ),
            None => None,
        };
        Ok(DisplayUnits::resolve(overrides, preferences.as_ref()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    pub location_id: Option<i64>,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalQuery {
    pub location_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartQuery {
    pub location_id: Option<i64>,
    pub metric: Option<ChartMetric>,
    pub smoothing: Option<usize>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub location_id: Option<i64>,
    pub format: Option<ExportFormat>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// POST /api/weather
pub async fn create_weather(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<CreateWeatherData>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<WeatherData>>), ApiError> {
    let record = deployment.weather().record(&payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(record))))
}

/// GET /api/weather/current
/// `data` is null when the location has no current reading.
pub async fn get_current(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<CurrentQuery>,
) -> Result<ResponseJson<ApiResponse<Option<CurrentWeather>>>, ApiError> {
    let units = query.units(&deployment).await?;
    let current = deployment.weather().current(query.location_id(), units).await?;
    Ok(ResponseJson(ApiResponse::success(current)))
}

/// GET /api/weather/forecast
pub async fn get_forecast(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<ForecastQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ForecastDay>>>, ApiError> {
    let location_id = query.location_id.unwrap_or(DEFAULT_LOCATION_ID);
    let days = query.days.unwrap_or(DEFAULT_FORECAST_DAYS);
    let forecast = deployment.weather().forecast(location_id, days).await?;
    debug!(location_id, days = forecast.len(), "forecast served");
    Ok(ResponseJson(ApiResponse::success(forecast)))
}

/// GET /api/weather/historical
pub async fn get_historical(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<HistoricalQuery>,
) -> Result<ResponseJson<ApiResponse<HistoricalWeather>>, ApiError> {
    let historical = deployment
        .weather()
        .historical(
            query.location_id.unwrap_or(DEFAULT_LOCATION_ID),
            query.start_date,
            query.end_date,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(historical)))
}

/// GET /api/weather/historical/chart
pub async fn get_historical_chart(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<ChartQuery>,
) -> Result<ResponseJson<ApiResponse<HistoricalChart>>, ApiError> {
    let chart = deployment
        .weather()
        .historical_chart(
            query.location_id.unwrap_or(DEFAULT_LOCATION_ID),
            query.metric.unwrap_or(ChartMetric::Temperature),
            query.smoothing,
            query.start_date,
            query.end_date,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(chart)))
}

/// GET /api/weather/export
/// Responds with the file itself rather than the JSON envelope.
pub async fn export_weather(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<ExportQuery>,
) -> Result<Response, ApiError> {
    let file = export_historical(
        &deployment.weather(),
        query.location_id.unwrap_or(DEFAULT_LOCATION_ID),
        query.format.unwrap_or_default(),
        query.start_date,
        query.end_date,
    )
    .await?;
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.body,
    )
        .into_response())
}

/// GET /api/weather/dashboard
pub async fn get_dashboard(
    State(deployment): State<DeploymentImpl>,
    AppQuery(query): AppQuery<CurrentQuery>,
) -> Result<ResponseJson<ApiResponse<WeatherDashboard>>, ApiError> {
    let units = query.units(&deployment).await?;
    let dashboard = deployment.weather().dashboard(query.location_id(), units).await?;
    Ok(ResponseJson(ApiResponse::success(dashboard)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/weather",
        Router::new()
            .route("/", post(create_weather))
            .route("/current", get(get_current))
            .route("/forecast", get(get_forecast))
            .route("/historical", get(get_historical))
            .route("/historical/chart", get(get_historical_chart))
            .route("/export", get(export_weather))
            .route("/dashboard", get(get_dashboard)),
    )
}
