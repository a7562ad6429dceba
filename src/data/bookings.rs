use sqlx::SqlitePool;

use super::{count, non_empty, sum, tally, DataError, Pagination};
use crate::models::{Booking, BookingRow, Page, BOOKING_COMPLETED};

pub async fn get_bookings(
    pool: &SqlitePool,
    status: Option<&str>,
    page: Pagination,
) -> Result<Page<Booking>, DataError> {
    let status = non_empty(status);
    let rows = sqlx::query_as::<_, BookingRow>(
        r#"SELECT b.id, b.customer_id, b.provider_id, b.service_category, b.service_type,
                  b.status, b.scheduled_time, b.location, b.notes, b.price, b.created_at,
                  c.name AS customer_name, c.phone AS customer_phone,
                  p.name AS provider_name, p.phone AS provider_phone
           FROM bookings b
           LEFT JOIN profiles c ON b.customer_id = c.id
           LEFT JOIN profiles p ON b.provider_id = p.id
           WHERE (? IS NULL OR b.status = ?)
           ORDER BY b.created_at DESC, b.id
           LIMIT ? OFFSET ?"#,
    )
    .bind(status)
    .bind(status)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    let total = match status {
        Some(status) => count(pool, "SELECT COUNT(*) FROM bookings WHERE status = ?", &[status]).await?,
        None => count(pool, "SELECT COUNT(*) FROM bookings", &[]).await?,
    };

    Ok(Page {
        data: rows.into_iter().map(Booking::from).collect(),
        count: total,
    })
}

pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(String, i64)>, DataError> {
    Ok(tally(pool, "SELECT status, COUNT(*) FROM bookings GROUP BY status").await?)
}

pub async fn completed_revenue(pool: &SqlitePool) -> Result<f64, DataError> {
    Ok(sum(
        pool,
        "SELECT TOTAL(price) FROM bookings WHERE status = ?",
        &[BOOKING_COMPLETED],
    )
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing;

    #[actix_web::test]
    async fn joins_customer_display_fields_and_filters_by_status() {
        let pool = testing::pool().await;
        testing::insert_profile(&pool, "c1", "customer", "Maya", "2026-09-01T10:00:00Z").await;
        testing::insert_booking(&pool, "b1", Some("c1"), Some("Plumbing"), "completed", Some(80.0), "2026-09-05T10:00:00Z").await;
        testing::insert_booking(&pool, "b2", None, None, "pending", None, "2026-09-06T10:00:00Z").await;

        let all = get_bookings(&pool, None, Pagination::default()).await.unwrap();
        assert_eq!(all.count, 2);
        assert_eq!(all.data[0].id, "b2");
        assert!(all.data[0].customer.is_none());

        let completed = get_bookings(&pool, Some("completed"), Pagination::default())
            .await
            .unwrap();
        assert_eq!(completed.count, 1);
        let booking = &completed.data[0];
        assert_eq!(booking.status, "completed");
        let customer = booking.customer.as_ref().unwrap();
        assert_eq!(customer.name.as_deref(), Some("Maya"));
        assert!(booking.provider.is_none());
    }

    #[actix_web::test]
    async fn status_counts_and_completed_revenue_cover_all_rows() {
        let pool = testing::pool().await;
        testing::insert_booking(&pool, "b1", None, None, "completed", Some(80.0), "2026-09-05T10:00:00Z").await;
        testing::insert_booking(&pool, "b2", None, None, "completed", Some(20.5), "2026-09-06T10:00:00Z").await;
        testing::insert_booking(&pool, "b3", None, None, "pending", Some(99.0), "2026-09-07T10:00:00Z").await;

        let mut by_status = count_by_status(&pool).await.unwrap();
        by_status.sort();
        assert_eq!(by_status, vec![("completed".into(), 2), ("pending".into(), 1)]);
        assert_eq!(completed_revenue(&pool).await.unwrap(), 100.5);
    }
}
