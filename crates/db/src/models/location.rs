use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::map::{BoundingBox, is_valid_coordinates};

use super::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[ts(type = "number")]
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_favorite: bool,
    #[ts(type = "number | null")]
    pub user_id: Option<i64>, // Foreign key to User
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_favorite: Option<bool>,
    #[ts(type = "number | null")]
    pub user_id: Option<i64>,
}

impl Validate for CreateLocation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("name", &self.name);
        errors.require_max_len("name", &self.name, 120);
        if !is_valid_coordinates(self.latitude, self.longitude) {
            errors.require_range("latitude", self.latitude, -90.0, 90.0);
            errors.require_range("longitude", self.longitude, -180.0, 180.0);
        }
        errors.into_result()
    }
}

const LOCATION_COLUMNS: &str = "id, name, latitude, longitude, is_favorite, user_id, created_at";

impl Location {
    pub async fn create(pool: &SqlitePool, data: &CreateLocation) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            r#"INSERT INTO locations (name, latitude, longitude, is_favorite, user_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {LOCATION_COLUMNS}"#
        ))
        .bind(data.name.trim())
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.is_favorite.unwrap_or(false))
        .bind(data.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations ORDER BY is_favorite DESC, name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user_id(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            r#"SELECT {LOCATION_COLUMNS}
               FROM locations
               WHERE user_id = $1
               ORDER BY is_favorite DESC, name ASC"#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_in_bounds(
        pool: &SqlitePool,
        bounds: &BoundingBox,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            r#"SELECT {LOCATION_COLUMNS}
               FROM locations
               WHERE latitude BETWEEN $1 AND $2
                 AND longitude BETWEEN $3 AND $4
               ORDER BY name ASC"#
        ))
        .bind(bounds.min_lat)
        .bind(bounds.max_lat)
        .bind(bounds.min_lng)
        .bind(bounds.max_lng)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support;
    use utils::map::bounding_box;

    fn montevideo() -> CreateLocation {
        CreateLocation {
            name: "Montevideo".to_string(),
            latitude: -34.9011,
            longitude: -56.1645,
            is_favorite: Some(true),
            user_id: None,
        }
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let data = CreateLocation {
            latitude: 120.0,
            ..montevideo()
        };
        let err = data.validate().unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "latitude");
    }

    #[tokio::test]
    async fn favorites_sort_first() {
        let pool = test_support::pool().await;
        Location::create(
            &pool,
            &CreateLocation {
                name: "Artigas".to_string(),
                is_favorite: None,
                ..montevideo()
            },
        )
        .await
        .unwrap();
        Location::create(&pool, &montevideo()).await.unwrap();

        let all = Location::find_all(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Montevideo");
        assert!(all[0].is_favorite);
        assert!(!all[1].is_favorite);
    }

    #[tokio::test]
    async fn bounds_query_filters_far_locations() {
        let pool = test_support::pool().await;
        Location::create(&pool, &montevideo()).await.unwrap();
        Location::create(
            &pool,
            &CreateLocation {
                name: "New York".to_string(),
                latitude: 40.7128,
                longitude: -74.006,
                is_favorite: None,
                user_id: None,
            },
        )
        .await
        .unwrap();

        let nearby = Location::find_in_bounds(&pool, &bounding_box(-34.9, -56.2, 50.0))
            .await
            .unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].name, "Montevideo");
    }

    #[tokio::test]
    async fn unknown_user_is_a_foreign_key_violation() {
        let pool = test_support::pool().await;
        let err = Location::create(
            &pool,
            &CreateLocation {
                user_id: Some(42),
                ..montevideo()
            },
        )
        .await
        .unwrap_err();
        assert!(
            err.as_database_error()
                .map(|e| e.is_foreign_key_violation())
                .unwrap_or(false)
        );
    }
}
