use sqlx::SqlitePool;

use super::{count, non_empty, tally, DataError, Pagination};
use crate::models::{Page, Profile};

const PROFILE_COLUMNS: &str = "id, role, name, email, phone, rating, status, created_at";

pub async fn get_users(
    pool: &SqlitePool,
    role: Option<&str>,
    page: Pagination,
) -> Result<Page<Profile>, DataError> {
    let role = non_empty(role);
    let data = sqlx::query_as::<_, Profile>(&format!(
        r#"SELECT {PROFILE_COLUMNS}
           FROM profiles
           WHERE (? IS NULL OR role = ?)
           ORDER BY created_at DESC, id
           LIMIT ? OFFSET ?"#
    ))
    .bind(role)
    .bind(role)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    let total = match role {
        Some(role) => count(pool, "SELECT COUNT(*) FROM profiles WHERE role = ?", &[role]).await?,
        None => count(pool, "SELECT COUNT(*) FROM profiles", &[]).await?,
    };

    Ok(Page { data, count: total })
}

pub async fn get_user_by_id(pool: &SqlitePool, id: &str) -> Result<Profile, DataError> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ? LIMIT 1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DataError::NotFound("User not found"))
}

pub async fn update_user_status(pool: &SqlitePool, id: &str, status: &str) -> Result<(), DataError> {
    let result = sqlx::query("UPDATE profiles SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DataError::NotFound("User not found"));
    }
    Ok(())
}

pub async fn count_by_role(pool: &SqlitePool) -> Result<Vec<(String, i64)>, DataError> {
    Ok(tally(pool, "SELECT role, COUNT(*) FROM profiles GROUP BY role").await?)
}

pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(String, i64)>, DataError> {
    Ok(tally(
        pool,
        "SELECT COALESCE(status, ''), COUNT(*) FROM profiles GROUP BY COALESCE(status, '')",
    )
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::testing, models::Role};

    async fn seeded() -> SqlitePool {
        let pool = testing::pool().await;
        testing::insert_profile(&pool, "c1", "customer", "Maya", "2026-09-01T10:00:00Z").await;
        testing::insert_profile(&pool, "c2", "customer", "Karim", "2026-09-02T10:00:00Z").await;
        testing::insert_profile(&pool, "p1", "provider", "Omar", "2026-09-03T10:00:00Z").await;
        testing::insert_profile(&pool, "a1", "admin", "Lina", "2026-09-04T10:00:00Z").await;
        pool
    }

    #[actix_web::test]
    async fn role_filter_only_returns_that_role() {
        let pool = seeded().await;
        let page = get_users(&pool, Some("customer"), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.count, 2);
        assert!(page.data.iter().all(|profile| profile.role == Role::Customer));
    }

    #[actix_web::test]
    async fn count_is_total_not_page_length() {
        let pool = seeded().await;
        let page = get_users(&pool, None, Pagination::new(Some(2), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.count, 4);
        assert_eq!(page.data.len(), 2);
        // newest first, skipping the newest one
        assert_eq!(page.data[0].id, "p1");
        assert_eq!(page.data[1].id, "c2");
    }

    #[actix_web::test]
    async fn blank_role_means_all_roles() {
        let pool = seeded().await;
        let page = get_users(&pool, Some(""), Pagination::default()).await.unwrap();
        assert_eq!(page.count, 4);
    }

    #[actix_web::test]
    async fn status_update_and_lookup() {
        let pool = seeded().await;
        update_user_status(&pool, "c1", "suspended").await.unwrap();
        let profile = get_user_by_id(&pool, "c1").await.unwrap();
        assert_eq!(profile.status.as_deref(), Some("suspended"));

        assert!(matches!(
            update_user_status(&pool, "missing", "active").await,
            Err(DataError::NotFound(_))
        ));
        assert!(matches!(
            get_user_by_id(&pool, "missing").await,
            Err(DataError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn counts_group_every_profile() {
        let pool = seeded().await;
        update_user_status(&pool, "c1", "suspended").await.unwrap();

        let mut by_role = count_by_role(&pool).await.unwrap();
        by_role.sort();
        assert_eq!(
            by_role,
            vec![("admin".into(), 1), ("customer".into(), 2), ("provider".into(), 1)]
        );
        let by_status = count_by_status(&pool).await.unwrap();
        assert!(by_status.contains(&("suspended".to_string(), 1)));
        assert!(by_status.contains(&("active".to_string(), 3)));
    }
}
