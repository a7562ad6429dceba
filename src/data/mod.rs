//! Queries against the store. Handlers call these and never write SQL
//! themselves.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::VerificationStatus;

pub mod analytics;
pub mod bookings;
pub mod users;
pub mod verifications;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("verification already {}", current.as_str())]
    AlreadyReviewed { current: VerificationStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) async fn count(pool: &SqlitePool, query: &str, params: &[&str]) -> Result<i64, sqlx::Error> {
    let mut query = sqlx::query_scalar::<_, i64>(query);
    for param in params {
        query = query.bind(*param);
    }
    query.fetch_one(pool).await
}

pub(crate) async fn sum(pool: &SqlitePool, query: &str, params: &[&str]) -> Result<f64, sqlx::Error> {
    let mut query = sqlx::query_scalar::<_, f64>(query);
    for param in params {
        query = query.bind(*param);
    }
    query.fetch_one(pool).await
}

// Rows of `(key, count)` from a `GROUP BY` query.
pub(crate) async fn tally(pool: &SqlitePool, query: &str) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(query).fetch_all(pool).await
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

    use crate::db::run_migrations;

    pub async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    pub async fn insert_profile(pool: &SqlitePool, id: &str, role: &str, name: &str, created_at: &str) {
        sqlx::query(
            "INSERT INTO profiles (id, role, name, email, phone, status, created_at) VALUES (?, ?, ?, ?, ?, 'active', ?)",
        )
        .bind(id)
        .bind(role)
        .bind(name)
        .bind(format!("{id}@example.com"))
        .bind(format!("+961 {id}"))
        .bind(created_at)
        .execute(pool)
        .await
        .expect("insert profile");
    }

    pub async fn insert_booking(
        pool: &SqlitePool,
        id: &str,
        customer_id: Option<&str>,
        category: Option<&str>,
        status: &str,
        price: Option<f64>,
        created_at: &str,
    ) {
        sqlx::query(
            "INSERT INTO bookings (id, customer_id, service_category, service_type, status, location, price, created_at) VALUES (?, ?, ?, 'Repair', ?, 'Beirut', ?, ?)",
        )
        .bind(id)
        .bind(customer_id)
        .bind(category)
        .bind(status)
        .bind(price)
        .bind(created_at)
        .execute(pool)
        .await
        .expect("insert booking");
    }

    pub async fn insert_verification(
        pool: &SqlitePool,
        id: &str,
        user_id: &str,
        status: &str,
        created_at: &str,
    ) {
        sqlx::query(
            r#"INSERT INTO provider_verifications
               (id, user_id, categories, hourly_rate, availability, government_id_image_url,
                professional_license_image_url, verification_status, created_at, updated_at)
               VALUES (?, ?, '["Plumbing","Electrical"]', 30.0, '{"mon":"9-5"}', 'gov.png', NULL, ?, ?, ?)"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(status)
        .bind(created_at)
        .bind(created_at)
        .execute(pool)
        .await
        .expect("insert verification");
    }
}
