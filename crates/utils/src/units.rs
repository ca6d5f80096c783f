//! Unit conversions and display formatting for weather readings.
//!
//! Stored readings are metric: °C, km/h, hPa, km, mm.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    Kmh,
    Mph,
    Ms,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
pub enum PressureUnit {
    #[default]
    #[serde(rename = "hPa")]
    #[strum(serialize = "hPa")]
    HPa,
    #[serde(rename = "mmHg")]
    #[strum(serialize = "mmHg")]
    MmHg,
    #[serde(rename = "inHg")]
    #[strum(serialize = "inHg")]
    InHg,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VisibilityUnit {
    #[default]
    Km,
    Mi,
}

const KM_TO_MILES: f64 = 0.621371;
const HPA_TO_MMHG: f64 = 0.750062;
const HPA_TO_INHG: f64 = 0.0295301;
const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl WindSpeedUnit {
    pub fn label(self) -> &'static str {
        match self {
            Self::Kmh => "km/h",
            Self::Mph => "mph",
            Self::Ms => "m/s",
        }
    }

    pub fn from_kmh(self, kmh: f64) -> f64 {
        match self {
            Self::Kmh => kmh,
            Self::Mph => kmh * KM_TO_MILES,
            Self::Ms => kmh / 3.6,
        }
    }
}

impl PressureUnit {
    pub fn from_hpa(self, hpa: f64) -> f64 {
        match self {
            Self::HPa => hpa,
            Self::MmHg => hpa * HPA_TO_MMHG,
            Self::InHg => hpa * HPA_TO_INHG,
        }
    }

    fn precision(self) -> usize {
        match self {
            Self::InHg => 2,
            _ => 0,
        }
    }
}

impl VisibilityUnit {
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Self::Km => km,
            Self::Mi => km * KM_TO_MILES,
        }
    }
}

/// Rounds to `decimals` places with ties going away from zero.
///
/// `format!("{:.1}", ..)` rounds exact ties to even, so displayed values are
/// rounded here first and only then formatted.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Rounds to the nearest integer with ties going towards positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, round_to(value, decimals))
}

pub fn format_temperature(celsius: f64, unit: TemperatureUnit, precision: usize) -> String {
    format!("{}{}", fixed(unit.from_celsius(celsius), precision), unit.symbol())
}

pub fn format_wind_speed(kmh: f64, unit: WindSpeedUnit) -> String {
    format!("{} {}", fixed(unit.from_kmh(kmh), 1), unit.label())
}

/// Eight-point compass heading for a bearing in degrees.
///
/// Negative bearings are measured anticlockwise from north.
pub fn wind_direction(degrees: f64) -> &'static str {
    let index = (round_half_up(degrees / 45.0) as i64).rem_euclid(8) as usize;
    COMPASS_POINTS[index]
}

pub fn format_pressure(hpa: f64, unit: PressureUnit) -> String {
    format!("{} {}", fixed(unit.from_hpa(hpa), unit.precision()), unit)
}

pub fn format_precipitation(mm: f64, timeframe: Option<&str>) -> String {
    let amount = fixed(mm, 1);
    match timeframe {
        Some(timeframe) => format!("{amount} mm/{timeframe}"),
        None => format!("{amount} mm"),
    }
}

pub fn format_percentage(value: f64) -> String {
    format!("{}%", round_half_up(value) as i64)
}

pub fn format_visibility(km: f64, unit: VisibilityUnit) -> String {
    format!("{} {}", fixed(unit.from_km(km), 1), unit)
}
