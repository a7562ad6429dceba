#![allow(dead_code)]

use allin_admin::{
    config::{AdminSeed, Config},
    db,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub const ADMIN_EMAIL: &str = "ops@allin.com";
pub const ADMIN_PASSWORD: &str = "correct horse";

pub async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::run_migrations(&pool).await.expect("migrations");
    pool
}

pub fn config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        max_connections: 1,
        session_ttl_hours: 24,
        admin: AdminSeed {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            name: "Ops Admin".to_string(),
        },
        seed_demo: false,
    }
}

pub async fn seeded_pool() -> SqlitePool {
    let pool = pool().await;
    db::seed_defaults(&pool, &config()).await.expect("seed admin");
    pool
}

pub async fn profile(pool: &SqlitePool, id: &str, role: &str, name: &str, created_at: &str) {
    sqlx::query(
        "INSERT INTO profiles (id, role, name, email, phone, status, created_at) VALUES (?, ?, ?, ?, ?, 'active', ?)",
    )
    .bind(id)
    .bind(role)
    .bind(name)
    .bind(format!("{id}@example.com"))
    .bind("+961 70 000 000")
    .bind(created_at)
    .execute(pool)
    .await
    .expect("insert profile");
}

pub async fn booking(
    pool: &SqlitePool,
    id: &str,
    customer_id: &str,
    category: &str,
    status: &str,
    price: f64,
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

pub async fn verification(pool: &SqlitePool, id: &str, user_id: &str, status: &str) {
    sqlx::query(
        r#"INSERT INTO provider_verifications
           (id, user_id, city, field_of_work, categories, hourly_rate, availability,
            government_id_image_url, verification_status, created_at, updated_at)
           VALUES (?, ?, 'Tripoli', 'Carpentry', '["Carpentry"]', 40.0, '{"sat":"10-14"}',
                   'docs/id.png', ?, '2026-10-10T09:00:00Z', '2026-10-10T09:00:00Z')"#,
    )
    .bind(id)
    .bind(user_id)
    .bind(status)
    .execute(pool)
    .await
    .expect("insert verification");
}
