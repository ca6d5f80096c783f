//! Map overlays and location markers.

use std::collections::BTreeMap;

use db::models::{
    location::Location,
    user::User,
    weather_data::{WeatherData, WeatherDataType},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use utils::map::{
    MapLayer, precipitation_color, temperature_color, to_web_mercator, wind_speed_color,
};

#[derive(Debug, Error)]
pub enum MapServiceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error("map layer '{0}' not found")]
    LayerNotFound(String),
}

const DEFAULT_LAYERS: [(&str, &str, &str, bool, u8); 7] = [
    ("temperature", "Temperature", "#ef4444", true, 80),
    ("wind", "Wind Speed", "#3b82f6", true, 60),
    ("precipitation", "Precipitation", "#22c55e", true, 70),
    ("clouds", "Clouds", "#a855f7", false, 60),
    ("pressure", "Pressure", "#f97316", false, 60),
    ("visibility", "Visibility", "#14b8a6", false, 60),
    ("uvIndex", "UV Index", "#ef4444", false, 60),
];

/// The ordered set of map overlays with their current display state.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayers {
    layers: Vec<MapLayer>,
}

impl Default for MapLayers {
    fn default() -> Self {
        Self::defaults()
    }
}

impl MapLayers {
    pub fn defaults() -> Self {
        let layers = DEFAULT_LAYERS
            .iter()
            .map(|&(id, name, color, is_visible, opacity)| MapLayer {
                id: id.to_string(),
                name: name.to_string(),
                color: color.to_string(),
                is_visible,
                opacity,
            })
            .collect();
        Self { layers }
    }

    /// Defaults with the visibility and opacity of stored overrides applied.
    /// Overrides for ids that are not a known layer are ignored.
    pub fn with_overrides(overrides: &BTreeMap<String, MapLayer>) -> Self {
        let mut layers = Self::defaults();
        for layer in &mut layers.layers {
            if let Some(stored) = overrides.get(&layer.id) {
                layer.is_visible = stored.is_visible;
                layer.opacity = stored.opacity.min(100);
            }
        }
        layers
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<MapLayer> {
        self.layers
    }

    pub fn get(&self, id: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut MapLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Returns `false` when no layer has this id.
    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.is_visible = !layer.is_visible;
                true
            }
            None => false,
        }
    }

    pub fn set_visibility(&mut self, id: &str, is_visible: bool) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.is_visible = is_visible;
                true
            }
            None => false,
        }
    }

    /// Opacity is clamped to 0..=100.
    pub fn update_opacity(&mut self, id: &str, opacity: i64) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.opacity = opacity.clamp(0, 100) as u8;
                true
            }
            None => false,
        }
    }

    pub fn visible(&self) -> Vec<&MapLayer> {
        self.layers.iter().filter(|l| l.is_visible).collect()
    }

    pub fn reset(&mut self) {
        *self = Self::defaults();
    }

    /// Layers whose state differs from the defaults, keyed by id.
    pub fn overrides(&self) -> BTreeMap<String, MapLayer> {
        let defaults = Self::defaults();
        self.layers
            .iter()
            .zip(defaults.layers.iter())
            .filter(|(layer, default)| layer != default)
            .map(|(layer, _)| (layer.id.clone(), layer.clone()))
            .collect()
    }
}

/// Partial update of one layer. `toggle` is applied before the explicit values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMapLayer {
    #[serde(default)]
    pub toggle: bool,
    pub is_visible: Option<bool>,
    #[ts(type = "number | null")]
    pub opacity: Option<i64>,
}

/// A location on the map with its latest current reading.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub location: Location,
    pub current: Option<WeatherData>,
    pub temperature_color: Option<String>,
    pub wind_speed_color: Option<String>,
    pub precipitation_color: Option<String>,
    /// Web Mercator metres.
    pub x: f64,
    pub y: f64,
}

impl MapMarker {
    pub fn new(location: Location, current: Option<WeatherData>) -> Self {
        let (x, y) = to_web_mercator(location.latitude, location.longitude);
        let reading = current.as_ref();
        Self {
            temperature_color: reading
                .and_then(|w| w.temperature)
                .map(|t| temperature_color(t).css()),
            wind_speed_color: reading
                .and_then(|w| w.wind_speed)
                .map(|s| wind_speed_color(s).css()),
            precipitation_color: reading
                .and_then(|w| w.precipitation)
                .map(|p| precipitation_color(p).css()),
            location,
            current,
            x,
            y,
        }
    }
}

#[derive(Clone)]
pub struct MapService {
    pool: SqlitePool,
}

impl MapService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Default layers, or the user's stored state when a user is given.
    pub async fn layers(&self, user_id: Option<i64>) -> Result<MapLayers, MapServiceError> {
        match user_id {
            Some(id) => {
                let user = self.user(id).await?;
                Ok(MapLayers::with_overrides(&user.preferences.map_layers))
            }
            None => Ok(MapLayers::defaults()),
        }
    }

    pub async fn update_user_layer(
        &self,
        user_id: i64,
        layer_id: &str,
        update: &UpdateMapLayer,
    ) -> Result<MapLayers, MapServiceError> {
        let mut user = self.user(user_id).await?;
        let mut layers = MapLayers::with_overrides(&user.preferences.map_layers);
        if layers.get(layer_id).is_none() {
            return Err(MapServiceError::LayerNotFound(layer_id.to_string()));
        }

        if update.toggle {
            layers.toggle_visibility(layer_id);
        }
        if let Some(is_visible) = update.is_visible {
            layers.set_visibility(layer_id, is_visible);
        }
        if let Some(opacity) = update.opacity {
            layers.update_opacity(layer_id, opacity);
        }

        user.preferences.map_layers = layers.overrides();
        User::update_preferences(&self.pool, user_id, &user.preferences)
            .await?
            .ok_or(MapServiceError::UserNotFound(user_id))?;
        debug!(user_id, layer_id, "map layer updated");
        Ok(layers)
    }

    pub async fn reset_user_layers(&self, user_id: i64) -> Result<MapLayers, MapServiceError> {
        let mut user = self.user(user_id).await?;
        user.preferences.map_layers.clear();
        User::update_preferences(&self.pool, user_id, &user.preferences)
            .await?
            .ok_or(MapServiceError::UserNotFound(user_id))?;
        info!(user_id, "map layers reset to defaults");
        Ok(MapLayers::defaults())
    }

    pub async fn markers(&self) -> Result<Vec<MapMarker>, MapServiceError> {
        let locations = Location::find_all(&self.pool).await?;
        let mut markers = Vec::with_capacity(locations.len());
        for location in locations {
            let current =
                WeatherData::find_latest(&self.pool, location.id, WeatherDataType::Current).await?;
            markers.push(MapMarker::new(location, current));
        }
        Ok(markers)
    }

    async fn user(&self, id: i64) -> Result<User, MapServiceError> {
        User::find_by_id(&self.pool, id)
            .await?
            .ok_or(MapServiceError::UserNotFound(id))
    }
}
