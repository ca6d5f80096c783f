//! Download of historical weather as CSV or JSON.

use chrono::{NaiveDate, Utc};
use db::models::{location::Location, weather_data::WeatherData};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::weather::{DateRange, WeatherService, WeatherServiceError};

pub const DEFAULT_EXPORT_DAYS: u64 = 7;

const CSV_HEADER: [&str; 11] = [
    "location",
    "timestamp",
    "dataType",
    "temperature",
    "humidity",
    "windSpeed",
    "windDirection",
    "precipitation",
    "pressure",
    "visibility",
    "uvIndex",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Weather(#[from] WeatherServiceError),
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub content_type: &'static str,
    pub file_name: String,
    pub body: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    location: &'a Location,
    #[serde(flatten)]
    range: DateRange,
    records: &'a [WeatherData],
}

/// Quote a CSV field when it holds a comma, quote or line break.
pub fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn to_csv(location: &Location, records: &[WeatherData]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");
    let name = escape_csv(&location.name);
    for record in records {
        let row = [
            name.clone(),
            record.timestamp.to_rfc3339(),
            record.data_type.to_string(),
            number(record.temperature),
            number(record.humidity),
            number(record.wind_speed),
            number(record.wind_direction),
            number(record.precipitation),
            number(record.pressure),
            number(record.visibility),
            number(record.uv_index),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let parts: Vec<&str> = slug.split('-').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        "location".to_string()
    } else {
        parts.join("-")
    }
}

pub fn export_file_name(location: &Location, range: DateRange, format: ExportFormat) -> String {
    format!(
        "weather-{}-{}-{}.{}",
        slug(&location.name),
        range.start_date,
        range.end_date,
        format
    )
}

pub async fn export_historical(
    weather: &WeatherService,
    location_id: i64,
    format: ExportFormat,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<ExportedFile, ExportError> {
    let range = DateRange::resolve(
        start_date,
        end_date,
        Utc::now().date_naive(),
        DEFAULT_EXPORT_DAYS,
    )
    .map_err(WeatherServiceError::from)?;
    let location = weather.location(location_id).await?;
    let historical = weather.historical_in(location_id, range).await?;

    let body = match format {
        ExportFormat::Csv => to_csv(&location, &historical.records),
        ExportFormat::Json => serde_json::to_string_pretty(&JsonExport {
            location: &location,
            range,
            records: &historical.records,
        })?,
    };
    info!(
        location_id,
        %format,
        records = historical.records.len(),
        "historical weather exported"
    );
    Ok(ExportedFile {
        content_type: format.content_type(),
        file_name: export_file_name(&location, range, format),
        body,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use db::models::weather_data::WeatherDataType;

    use super::*;

    fn location(name: &str) -> Location {
        Location {
            id: 1,
            name: name.to_string(),
            latitude: -34.9,
            longitude: -56.16,
            is_favorite: false,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn csv_escaping() {
        assert_eq!(escape_csv("Salto"), "Salto");
        assert_eq!(escape_csv("Colonia, UY"), "\"Colonia, UY\"");
        assert_eq!(escape_csv("the \"farm\""), "\"the \"\"farm\"\"\"");
    }

    #[test]
    fn csv_rows_leave_missing_readings_empty() {
        let record = WeatherData {
            id: 1,
            location_id: 1,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            temperature: Some(21.5),
            humidity: None,
            wind_speed: Some(10.0),
            wind_direction: None,
            precipitation: Some(0.0),
            pressure: None,
            visibility: None,
            uv_index: None,
            data_type: WeatherDataType::Historical,
        };
        let csv = to_csv(&location("Colonia, UY"), &[record]);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(
            lines[1],
            "\"Colonia, UY\",2024-05-01T12:00:00+00:00,historical,21.5,,10,,0,,,"
        );
        assert_eq!(lines[2], "");
    }

    #[test]
    fn file_names_use_a_slug() {
        let range = DateRange {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
        };
        assert_eq!(
            export_file_name(&location("San José de Mayo"), range, ExportFormat::Json),
            "weather-san-jos-de-mayo-2024-05-01-2024-05-07.json"
        );
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
