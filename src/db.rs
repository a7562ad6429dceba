use std::{fs, path::Path, str::FromStr};

use chrono::{Duration, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    auth::{hash_password, new_id},
    config::{AdminSeed, Config},
    models::{now_timestamp, timestamp, Role, STATUS_ACTIVE},
};

pub async fn connect(config: &Config) -> Result<SqlitePool, Box<dyn std::error::Error>> {
    ensure_sqlite_dir(&config.database_url)?;

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connect_options)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else {
        db_url.strip_prefix("sqlite:")
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool, config: &Config) -> Result<(), sqlx::Error> {
    seed_admin(pool, &config.admin).await?;
    if config.seed_demo {
        seed_demo(pool).await?;
    }
    Ok(())
}

async fn seed_admin(pool: &SqlitePool, admin: &AdminSeed) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM admin_accounts LIMIT 1")
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(&admin.password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let now = now_timestamp();
    let profile_id = new_id();

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"INSERT INTO profiles (id, role, name, email, status, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&profile_id)
    .bind(Role::Admin.as_str())
    .bind(&admin.name)
    .bind(&admin.email)
    .bind(STATUS_ACTIVE)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"INSERT INTO admin_accounts (id, profile_id, email, password_hash, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(&profile_id)
    .bind(admin.email.trim().to_lowercase())
    .bind(password_hash)
    .bind(&now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    log::info!("Seeded admin account {}", admin.email);
    Ok(())
}

async fn seed_demo(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let exists = sqlx::query_as::<_, (String,)>("SELECT id FROM bookings LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        return Ok(());
    }

    let now = Utc::now();
    let customers = [
        ("Maya Haddad", "maya@example.com", "+961 70 111 222"),
        ("Karim Nassar", "karim@example.com", "+961 71 333 444"),
    ];
    let mut customer_ids = Vec::new();
    for (index, (name, email, phone)) in customers.iter().enumerate() {
        let id = new_id();
        sqlx::query(
            r#"INSERT INTO profiles (id, role, name, email, phone, status, created_at)
               VALUES (?, 'customer', ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(STATUS_ACTIVE)
        .bind(timestamp(now - Duration::days(40 - index as i64 * 20)))
        .execute(pool)
        .await?;
        customer_ids.push(id);
    }

    let applicant_id = new_id();
    sqlx::query(
        r#"INSERT INTO profiles (id, role, name, email, phone, status, created_at)
           VALUES (?, 'customer', 'Omar Khalil', 'omar@example.com', '+961 76 555 666', 'pending', ?)"#,
    )
    .bind(&applicant_id)
    .bind(timestamp(now - Duration::days(3)))
    .execute(pool)
    .await?;

    sqlx::query(
        r#"INSERT INTO provider_verifications
           (id, user_id, phone, city, years_experience, field_of_work, categories, hourly_rate,
            availability, government_id_image_url, verification_status, created_at, updated_at)
           VALUES (?, ?, '+961 76 555 666', 'Beirut', 7, 'Plumbing', '["Plumbing","Heating"]', 25.0,
                   '{"weekdays":"08:00-17:00"}', 'uploads/omar-id.png', 'pending', ?, ?)"#,
    )
    .bind(new_id())
    .bind(&applicant_id)
    .bind(timestamp(now - Duration::days(2)))
    .bind(timestamp(now - Duration::days(2)))
    .execute(pool)
    .await?;

    let bookings = [
        ("Plumbing", "Leak repair", "completed", 80.0, 35),
        ("Electrical", "Outlet install", "completed", 120.0, 5),
        ("Cleaning", "Deep clean", "pending", 60.0, 1),
        ("Plumbing", "Drain unclog", "in_progress", 45.0, 0),
    ];
    for (index, (category, service_type, status, price, days_ago)) in bookings.iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO bookings
               (id, customer_id, service_category, service_type, status, location, price, created_at)
               VALUES (?, ?, ?, ?, ?, 'Beirut', ?, ?)"#,
        )
        .bind(new_id())
        .bind(&customer_ids[index % customer_ids.len()])
        .bind(category)
        .bind(service_type)
        .bind(status)
        .bind(price)
        .bind(timestamp(now - Duration::days(*days_ago)))
        .execute(pool)
        .await?;
    }

    log::info!("Seeded demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_sqlite_dir_ignores_memory_urls() {
        assert!(ensure_sqlite_dir("sqlite::memory:").is_ok());
        assert!(ensure_sqlite_dir("sqlite://:memory:").is_ok());
        assert!(ensure_sqlite_dir("postgres://localhost/allin").is_ok());
    }
}
