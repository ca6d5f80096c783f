//! Helpers for preparing chart series.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use crate::units::round_half_up;

/// A plottable weather metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ChartMetric {
    Temperature,
    Humidity,
    Precipitation,
    WindSpeed,
    Pressure,
    Visibility,
    UvIndex,
}

const FALLBACK_COLOR: &str = "#64748b";

impl ChartMetric {
    pub fn color(self) -> &'static str {
        match self {
            Self::Temperature => "#ef4444",
            Self::Precipitation => "#3b82f6",
            Self::Humidity => "#22c55e",
            Self::WindSpeed => "#14b8a6",
            Self::Pressure => "#f97316",
            Self::Visibility => "#a855f7",
            Self::UvIndex => "#ec4899",
        }
    }

    pub fn format_tick(self, value: f64) -> String {
        match self {
            Self::Temperature => format!("{value}°C"),
            Self::Precipitation => format!("{value} mm"),
            Self::Humidity => format!("{value}%"),
            Self::WindSpeed => format!("{value} km/h"),
            Self::Pressure => format!("{value} hPa"),
            Self::Visibility => format!("{value} km"),
            Self::UvIndex => format!("{value}"),
        }
    }
}

/// Colour for a metric name, gray when the name is unknown.
pub fn chart_color(metric: &str) -> &'static str {
    metric
        .parse::<ChartMetric>()
        .map(ChartMetric::color)
        .unwrap_or(FALLBACK_COLOR)
}

/// Y-axis bounds with `padding_percent` of the range added on both sides.
/// The lower bound never drops below zero.
pub fn axis_domain(values: &[f64], padding_percent: f64) -> Option<(f64, f64)> {
    let (min, max) = values.iter().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })?;
    let padding = (max - min) * padding_percent / 100.0;
    Some(((min - padding).max(0.0), max + padding))
}

/// `count` evenly spaced ticks from `min` to `max`, rounded to one decimal.
pub fn tick_values(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![round1(min)];
    }
    let step = (max - min) / (count - 1) as f64;
    (0..count).map(|i| round1(min + i as f64 * step)).collect()
}

/// Centred moving average. The window shrinks at the edges of the series.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window < 2 {
        return values.to_vec();
    }
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half).min(values.len() - 1);
            let slice = &values[start..=end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_metric_falls_back_to_gray() {
        assert_eq!(chart_color("windSpeed"), "#14b8a6");
        assert_eq!(chart_color("cloudCover"), "#64748b");
    }

    #[test]
    fn axis_domain_pads_and_clamps_at_zero() {
        assert_eq!(axis_domain(&[10.0, 20.0], 10.0), Some((9.0, 21.0)));
        assert_eq!(axis_domain(&[0.0, 30.0], 10.0), Some((0.0, 33.0)));
        assert_eq!(axis_domain(&[], 10.0), None);
    }

    #[test]
    fn ticks_are_evenly_spaced() {
        assert_eq!(tick_values(0.0, 20.0, 5), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(tick_values(0.0, 1.0, 4), vec![0.0, 0.3, 0.7, 1.0]);
        assert_eq!(tick_values(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn moving_average_shrinks_window_at_edges() {
        let smoothed = moving_average(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(smoothed, vec![1.5, 2.0, 3.0, 3.5]);
    }

    #[test]
    fn moving_average_small_window_is_identity() {
        assert_eq!(moving_average(&[5.0, 1.0], 1), vec![5.0, 1.0]);
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn tick_labels_carry_units() {
        assert_eq!(ChartMetric::Humidity.format_tick(40.0), "40%");
        assert_eq!(ChartMetric::Pressure.format_tick(1013.5), "1013.5 hPa");
    }
}
