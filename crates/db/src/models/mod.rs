pub mod agricultural_risk;
pub mod agronomic_recommendation;
pub mod crop;
pub mod crop_planting;
pub mod crop_stage;
pub mod field;
pub mod location;
pub mod regional_risk;
pub mod user;
pub mod validation;
pub mod weather_data;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::DBService;

    pub async fn pool() -> sqlx::SqlitePool {
        DBService::new_in_memory().await.unwrap().pool
    }

    pub async fn user(pool: &sqlx::SqlitePool) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, email) VALUES ('grower', 'x', 'g@example.com') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn location(pool: &sqlx::SqlitePool) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO locations (name, latitude, longitude) VALUES ('Paysandú', -32.32, -58.08) RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn crop(pool: &sqlx::SqlitePool) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO crops (name, scientific_name, crop_type) VALUES ('Soybean', 'Glycine max', 'soybean') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }
}
