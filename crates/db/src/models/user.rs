use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::{
    map::MapLayer,
    units::{PressureUnit, TemperatureUnit, WindSpeedUnit},
};

use super::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Display preferences stored as JSON alongside the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub theme: Theme,
    pub temperature_unit: TemperatureUnit,
    pub wind_speed_unit: WindSpeedUnit,
    pub pressure_unit: PressureUnit,
    #[ts(type = "number | null")]
    pub default_location: Option<i64>,
    #[ts(type = "Array<number>")]
    pub favorite_locations: Vec<i64>,
    /// Overrides of the default map layers, keyed by layer id.
    pub map_layers: BTreeMap<String, MapLayer>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[ts(type = "number")]
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub email: String,
    #[sqlx(json)]
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub preferences: Option<UserPreferences>,
}

impl Validate for CreateUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("username", &self.username);
        errors.require_max_len("username", &self.username, 64);
        if self.password.chars().count() < 6 {
            errors.add("password", "must be at least 6 characters");
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            errors.add("email", "must be a valid email address");
        }
        errors.into_result()
    }
}

/// Partial update of [`UserPreferences`]. Unset fields keep their value;
/// `defaultLocation: null` clears the default location.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPreferences {
    pub theme: Option<Theme>,
    pub temperature_unit: Option<TemperatureUnit>,
    pub wind_speed_unit: Option<WindSpeedUnit>,
    pub pressure_unit: Option<PressureUnit>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[ts(type = "number | null")]
    pub default_location: Option<Option<i64>>,
    #[ts(type = "Array<number> | null")]
    pub favorite_locations: Option<Vec<i64>>,
}

impl UpdateUserPreferences {
    pub fn apply(&self, preferences: &UserPreferences) -> UserPreferences {
        UserPreferences {
            theme: self.theme.unwrap_or(preferences.theme),
            temperature_unit: self.temperature_unit.unwrap_or(preferences.temperature_unit),
            wind_speed_unit: self.wind_speed_unit.unwrap_or(preferences.wind_speed_unit),
            pressure_unit: self.pressure_unit.unwrap_or(preferences.pressure_unit),
            default_location: self.default_location.unwrap_or(preferences.default_location),
            favorite_locations: self
                .favorite_locations
                .clone()
                .unwrap_or_else(|| preferences.favorite_locations.clone()),
            map_layers: preferences.map_layers.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

const USER_COLUMNS: &str = "id, username, password_hash, email, preferences, created_at";

impl User {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateUser,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        let preferences = data.preferences.clone().unwrap_or_default();
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (username, password_hash, email, preferences)
               VALUES ($1, $2, $3, $4)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(data.username.trim())
        .bind(password_hash)
        .bind(data.email.trim())
        .bind(Json(&preferences))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Replace the stored preferences. Returns `None` when the user does not exist.
    pub async fn update_preferences(
        pool: &SqlitePool,
        id: i64,
        preferences: &UserPreferences,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET preferences = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(preferences))
        .fetch_optional(pool)
        .await
    }
}
