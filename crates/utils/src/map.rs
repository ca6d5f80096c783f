//! Colour scales and coordinate helpers for the weather map.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

const KM_PER_LAT_DEGREE: f64 = 110.574;
const KM_PER_LNG_DEGREE_AT_EQUATOR: f64 = 111.32;
const MERCATOR_HALF_EXTENT: f64 = 20037508.34;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lng..=self.max_lng).contains(&lng)
    }
}

/// Display state of one overlay on the weather map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct MapLayer {
    pub id: String,
    pub name: String,
    pub color: String,
    pub is_visible: bool,
    /// Percent, 0 to 100.
    pub opacity: u8,
}

impl MapLayer {
    pub fn opacity_fraction(&self) -> f64 {
        f64::from(self.opacity) / 100.0
    }
}

fn normalize(value: f64, offset: f64, span: f64) -> f64 {
    ((value + offset) / span).clamp(0.0, 1.0)
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Blue (-20 °C) to red (40 °C).
pub fn temperature_color(celsius: f64) -> Rgb {
    let n = normalize(celsius, 20.0, 60.0);
    let r = (n * 255.0).round();
    let b = ((1.0 - n) * 255.0).round();
    let g = (r.min(b) / 2.0).round();
    Rgb {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

/// Green (calm) to blue (100 km/h).
pub fn wind_speed_color(kmh: f64) -> Rgb {
    let n = normalize(kmh, 0.0, 100.0);
    Rgb {
        r: 0,
        g: channel((1.0 - n) * 255.0),
        b: channel(n * 255.0),
    }
}

/// Light to dark blue, saturating at 50 mm.
pub fn precipitation_color(mm: f64) -> Rgb {
    let n = normalize(mm, 0.0, 50.0);
    Rgb {
        r: channel(100.0 - n * 100.0),
        g: channel(150.0 - n * 100.0),
        b: channel(120.0 + n * 135.0),
    }
}

pub fn is_valid_coordinates(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Approximate box of `radius_km` around a centre point.
pub fn bounding_box(center_lat: f64, center_lng: f64, radius_km: f64) -> BoundingBox {
    let km_per_lng_degree = KM_PER_LNG_DEGREE_AT_EQUATOR * center_lat.to_radians().cos();
    let lat_delta = radius_km / KM_PER_LAT_DEGREE;
    let lng_delta = radius_km / km_per_lng_degree;

    BoundingBox {
        min_lng: center_lng - lng_delta,
        min_lat: center_lat - lat_delta,
        max_lng: center_lng + lng_delta,
        max_lat: center_lat + lat_delta,
    }
}

/// WGS84 degrees to spherical Web Mercator metres, as `(x, y)`.
pub fn to_web_mercator(lat: f64, lng: f64) -> (f64, f64) {
    let x = lng * MERCATOR_HALF_EXTENT / 180.0;
    let y = ((90.0 + lat) * std::f64::consts::PI / 360.0).tan().ln() / (std::f64::consts::PI / 180.0);
    (x, y * MERCATOR_HALF_EXTENT / 180.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_scale_endpoints() {
        assert_eq!(temperature_color(-20.0).css(), "rgb(0, 0, 255)");
        assert_eq!(temperature_color(40.0).css(), "rgb(255, 0, 0)");
        assert_eq!(temperature_color(10.0).css(), "rgb(128, 64, 128)");
        assert_eq!(temperature_color(100.0), temperature_color(40.0));
    }

    #[test]
    fn wind_and_precipitation_scales() {
        assert_eq!(wind_speed_color(0.0).css(), "rgb(0, 255, 0)");
        assert_eq!(wind_speed_color(50.0).css(), "rgb(0, 128, 128)");
        assert_eq!(precipitation_color(0.0).css(), "rgb(100, 150, 120)");
        assert_eq!(precipitation_color(80.0).css(), "rgb(0, 50, 255)");
    }

    #[test]
    fn layer_opacity_as_fraction() {
        let layer = MapLayer {
            id: "wind".to_string(),
            name: "Wind Speed".to_string(),
            color: "#3b82f6".to_string(),
            is_visible: true,
            opacity: 60,
        };
        assert!((layer.opacity_fraction() - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn coordinate_validation() {
        assert!(is_valid_coordinates(40.7128, -74.006));
        assert!(!is_valid_coordinates(91.0, 0.0));
        assert!(!is_valid_coordinates(0.0, -180.5));
    }

    #[test]
    fn bounding_box_at_equator() {
        let bbox = bounding_box(0.0, 0.0, 110.574);
        assert!((bbox.max_lat - 1.0).abs() < 1e-9);
        assert!((bbox.max_lng - 110.574 / 111.32).abs() < 1e-9);
        assert!(bbox.contains(0.5, -0.5));
        assert!(!bbox.contains(1.5, 0.0));
    }

    #[test]
    fn mercator_origin_and_edge() {
        let (x, y) = to_web_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
        let (x, _) = to_web_mercator(0.0, 180.0);
        assert!((x - 20037508.34).abs() < 1e-6);
    }
}
