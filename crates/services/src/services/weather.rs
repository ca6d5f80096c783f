//! Current, forecast and historical weather views for one location.

use chrono::{DateTime, Days, NaiveDate, Utc};
use db::models::{
    location::Location,
    user::UserPreferences,
    validation::{Validate, ValidationErrors},
    weather_data::{CreateWeatherData, WeatherData, WeatherDataType},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use utils::{
    chart::{ChartMetric, axis_domain, moving_average, tick_values},
    units::{
        PressureUnit, TemperatureUnit, VisibilityUnit, WindSpeedUnit, format_percentage,
        format_precipitation, format_pressure, format_temperature, format_visibility,
        format_wind_speed, round_to, wind_direction,
    },
};

pub const DEFAULT_FORECAST_DAYS: u32 = 7;
pub const MAX_FORECAST_DAYS: u32 = 16;
pub const DEFAULT_HISTORY_DAYS: u64 = 30;
const CHART_PADDING_PERCENT: f64 = 10.0;
const CHART_TICK_COUNT: usize = 5;

#[derive(Debug, Error)]
pub enum WeatherServiceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("location {0} not found")]
    LocationNotFound(i64),
}

/// Units requested by the caller. Unset units fall back to the user's
/// preferences, then to metric.
#[derive(Debug, Clone, Copy, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UnitOverrides {
    pub temperature_unit: Option<TemperatureUnit>,
    pub wind_speed_unit: Option<WindSpeedUnit>,
    pub pressure_unit: Option<PressureUnit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DisplayUnits {
    pub temperature: TemperatureUnit,
    pub wind_speed: WindSpeedUnit,
    pub pressure: PressureUnit,
}

impl DisplayUnits {
    pub fn resolve(overrides: UnitOverrides, preferences: Option<&UserPreferences>) -> Self {
        let base = preferences
            .map(|p| Self {
                temperature: p.temperature_unit,
                wind_speed: p.wind_speed_unit,
                pressure: p.pressure_unit,
            })
            .unwrap_or_default();
        Self {
            temperature: overrides.temperature_unit.unwrap_or(base.temperature),
            wind_speed: overrides.wind_speed_unit.unwrap_or(base.wind_speed),
            pressure: overrides.pressure_unit.unwrap_or(base.pressure),
        }
    }

    fn visibility(self) -> VisibilityUnit {
        match self.wind_speed {
            WindSpeedUnit::Mph => VisibilityUnit::Mi,
            _ => VisibilityUnit::Km,
        }
    }
}

/// Readings formatted for display. Missing readings stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeatherDisplay {
    pub units: DisplayUnits,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub wind_speed: Option<String>,
    pub wind_direction: Option<String>,
    pub precipitation: Option<String>,
    pub pressure: Option<String>,
    pub visibility: Option<String>,
    pub uv_index: Option<String>,
}

impl CurrentWeatherDisplay {
    pub fn new(reading: &WeatherData, units: DisplayUnits) -> Self {
        Self {
            units,
            temperature: reading
                .temperature
                .map(|t| format_temperature(t, units.temperature, 0)),
            humidity: reading.humidity.map(format_percentage),
            wind_speed: reading
                .wind_speed
                .map(|s| format_wind_speed(s, units.wind_speed)),
            wind_direction: reading.wind_direction.map(|d| wind_direction(d).to_string()),
            precipitation: reading.precipitation.map(|p| format_precipitation(p, None)),
            pressure: reading.pressure.map(|p| format_pressure(p, units.pressure)),
            visibility: reading
                .visibility
                .map(|v| format_visibility(v, units.visibility())),
            uv_index: reading.uv_index.map(|u| format!("{u:.0}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    #[serde(flatten)]
    #[ts(flatten)]
    pub reading: WeatherData,
    pub display: CurrentWeatherDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub enum WeatherCondition {
    Sunny,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Cloudy,
    Rain,
}

impl WeatherCondition {
    /// Condition for a chance of rain in percent.
    pub fn from_precipitation_chance(chance: f64) -> Self {
        if chance < 15.0 {
            Self::Sunny
        } else if chance < 40.0 {
            Self::PartlyCloudy
        } else if chance < 70.0 {
            Self::Cloudy
        } else {
            Self::Rain
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Weekday abbreviation, e.g. `Mon`.
    pub day: String,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Chance of rain in percent.
    pub precipitation: Option<f64>,
    pub condition: WeatherCondition,
}

fn fold_max(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(a.max(v)),
        (a, v) => a.or(v),
    }
}

fn fold_min(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(a.min(v)),
        (a, v) => a.or(v),
    }
}

/// Group forecast records (oldest first) by UTC calendar day, keeping at
/// most `days` days.
pub fn summarize_forecast(records: &[WeatherData], days: usize) -> Vec<ForecastDay> {
    let mut summary: Vec<ForecastDay> = Vec::new();
    for record in records {
        let date = record.timestamp.date_naive();
        let same_day = summary.last().is_some_and(|d| d.date == date);
        if !same_day {
            if summary.len() == days {
                break;
            }
            summary.push(ForecastDay {
                date,
                day: date.format("%a").to_string(),
                high: None,
                low: None,
                precipitation: None,
                condition: WeatherCondition::Sunny,
            });
        }
        if let Some(day) = summary.last_mut() {
            day.high = fold_max(day.high, record.temperature);
            day.low = fold_min(day.low, record.temperature);
            day.precipitation = fold_max(day.precipitation, record.precipitation);
            day.condition =
                WeatherCondition::from_precipitation_chance(day.precipitation.unwrap_or(0.0));
        }
    }
    summary
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Fill in missing bounds: the end defaults to `today`, the start to
    /// `default_days` days ending at the end.
    pub fn resolve(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
        default_days: u64,
    ) -> Result<Self, ValidationErrors> {
        let end_date = end_date.unwrap_or(today);
        let start_date = match start_date {
            Some(start) => start,
            None => end_date
                .checked_sub_days(Days::new(default_days.saturating_sub(1)))
                .unwrap_or(NaiveDate::MIN),
        };
        if end_date < start_date {
            return Err(ValidationErrors::single(
                "endDate",
                "must not be before startDate",
            ));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Half-open timestamp bounds covering every day of the range.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start_date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self
            .end_date
            .succ_opt()
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        (start, end)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalWeather {
    #[serde(flatten)]
    #[ts(flatten)]
    pub range: DateRange,
    pub records: Vec<WeatherData>,
}

pub fn metric_value(record: &WeatherData, metric: ChartMetric) -> Option<f64> {
    match metric {
        ChartMetric::Temperature => record.temperature,
        ChartMetric::Humidity => record.humidity,
        ChartMetric::Precipitation => record.precipitation,
        ChartMetric::WindSpeed => record.wind_speed,
        ChartMetric::Pressure => record.pressure,
        ChartMetric::Visibility => record.visibility,
        ChartMetric::UvIndex => record.uv_index,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalChart {
    pub metric: ChartMetric,
    pub color: String,
    #[serde(flatten)]
    #[ts(flatten)]
    pub range: DateRange,
    pub points: Vec<ChartPoint>,
    /// `[min, max]` of the y axis, absent when there are no points.
    pub domain: Option<[f64; 2]>,
    pub ticks: Vec<f64>,
}

impl HistoricalChart {
    /// Series of `metric` over `records`, skipping records without it.
    /// A `smoothing` window of 2 or more applies a centred moving average.
    pub fn build(
        records: &[WeatherData],
        metric: ChartMetric,
        smoothing: Option<usize>,
        range: DateRange,
    ) -> Self {
        let samples: Vec<(DateTime<Utc>, f64)> = records
            .iter()
            .filter_map(|r| metric_value(r, metric).map(|v| (r.timestamp, v)))
            .collect();
        let raw: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
        let values = moving_average(&raw, smoothing.unwrap_or(1));

        let points = samples
            .iter()
            .zip(values.iter())
            .map(|((timestamp, _), &value)| ChartPoint {
                timestamp: *timestamp,
                value,
                label: metric.format_tick(round_to(value, 1)),
            })
            .collect();
        let domain = axis_domain(&values, CHART_PADDING_PERCENT);
        let ticks = domain
            .map(|(min, max)| tick_values(min, max, CHART_TICK_COUNT))
            .unwrap_or_default();

        Self {
            metric,
            color: metric.color().to_string(),
            range,
            points,
            domain: domain.map(|(min, max)| [min, max]),
            ticks,
        }
    }
}

/// Everything the dashboard shows for one location.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDashboard {
    pub location: Location,
    pub current: Option<CurrentWeather>,
    pub forecast: Vec<ForecastDay>,
    pub historical: HistoricalWeather,
}

#[derive(Clone)]
pub struct WeatherService {
    pool: SqlitePool,
}

impl WeatherService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn location(&self, location_id: i64) -> Result<Location, WeatherServiceError> {
        Location::find_by_id(&self.pool, location_id)
            .await?
            .ok_or(WeatherServiceError::LocationNotFound(location_id))
    }

    pub async fn record(
        &self,
        data: &CreateWeatherData,
    ) -> Result<WeatherData, WeatherServiceError> {
        data.validate()?;
        self.location(data.location_id).await?;
        let record = WeatherData::create(&self.pool, data).await?;
        info!(
            location_id = record.location_id,
            data_type = %record.data_type,
            "weather record stored"
        );
        Ok(record)
    }

    pub async fn current(
        &self,
        location_id: i64,
        units: DisplayUnits,
    ) -> Result<Option<CurrentWeather>, WeatherServiceError> {
        self.location(location_id).await?;
        let reading =
            WeatherData::find_latest(&self.pool, location_id, WeatherDataType::Current).await?;
        if reading.is_none() {
            debug!(location_id, "no current weather");
        }
        Ok(reading.map(|reading| CurrentWeather {
            display: CurrentWeatherDisplay::new(&reading, units),
            reading,
        }))
    }

    pub async fn forecast(
        &self,
        location_id: i64,
        days: u32,
    ) -> Result<Vec<ForecastDay>, WeatherServiceError> {
        let mut errors = ValidationErrors::new();
        errors.require_range("days", days, 1, MAX_FORECAST_DAYS);
        errors.into_result()?;
        self.location(location_id).await?;

        let today = Utc::now().date_naive();
        let range = DateRange {
            start_date: today,
            end_date: today
                .checked_add_days(Days::new(u64::from(days) - 1))
                .unwrap_or(NaiveDate::MAX),
        };
        let (start, end) = range.bounds();
        let records = WeatherData::find_in_range(
            &self.pool,
            location_id,
            WeatherDataType::Forecast,
            start,
            end,
        )
        .await?;
        Ok(summarize_forecast(&records, days as usize))
    }

    pub async fn historical(
        &self,
        location_id: i64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<HistoricalWeather, WeatherServiceError> {
        let range = DateRange::resolve(
            start_date,
            end_date,
            Utc::now().date_naive(),
            DEFAULT_HISTORY_DAYS,
        )?;
        self.location(location_id).await?;
        self.historical_in(location_id, range).await
    }

    pub(crate) async fn historical_in(
        &self,
        location_id: i64,
        range: DateRange,
    ) -> Result<HistoricalWeather, WeatherServiceError> {
        let (start, end) = range.bounds();
        let records = WeatherData::find_in_range(
            &self.pool,
            location_id,
            WeatherDataType::Historical,
            start,
            end,
        )
        .await?;
        Ok(HistoricalWeather { range, records })
    }

    pub async fn historical_chart(
        &self,
        location_id: i64,
        metric: ChartMetric,
        smoothing: Option<usize>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<HistoricalChart, WeatherServiceError> {
        let historical = self.historical(location_id, start_date, end_date).await?;
        Ok(HistoricalChart::build(
            &historical.records,
            metric,
            smoothing,
            historical.range,
        ))
    }

    pub async fn dashboard(
        &self,
        location_id: i64,
        units: DisplayUnits,
    ) -> Result<WeatherDashboard, WeatherServiceError> {
        let location = self.location(location_id).await?;
        let current = self.current(location_id, units).await?;
        let forecast = self.forecast(location_id, DEFAULT_FORECAST_DAYS).await?;
        let historical = self.historical(location_id, None, None).await?;
        Ok(WeatherDashboard {
            location,
            current,
            forecast,
            historical,
        })
    }
}
