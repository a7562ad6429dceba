//! Dashboard aggregates. Grouping happens in SQL; Rust only formats bucket
//! labels, computes growth, and merges the activity feed.

use std::cmp::Reverse;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;

use super::{count, sum, DataError};
use crate::models::{
    timestamp, ActivityItem, ActivityKind, CategoryShare, DailyBookings, DashboardSnapshot,
    DashboardStats, RevenuePoint, VerificationStatus, ACTIVE_BOOKING_STATUSES, BOOKING_COMPLETED,
};

// Month-over-month change in percent. Zero when there is no previous period
// to compare against.
pub fn growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

// Boundaries of the current and previous calendar months, as stored
// timestamps. The previous month is `[previous_start, current_start)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    pub current_start: String,
    pub previous_start: String,
}

impl MonthWindow {
    pub fn around(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let current = today.with_day(1).unwrap_or(today);
        let previous = current.checked_sub_months(Months::new(1)).unwrap_or(current);
        Self {
            current_start: start_of_day(current),
            previous_start: start_of_day(previous),
        }
    }
}

fn start_of_day(date: NaiveDate) -> String {
    timestamp(date.and_time(NaiveTime::MIN).and_utc())
}

pub async fn get_dashboard_stats(pool: &SqlitePool, now: DateTime<Utc>) -> Result<DashboardStats, DataError> {
    let window = MonthWindow::around(now);
    let current = window.current_start.as_str();
    let previous = window.previous_start.as_str();
    let approved = VerificationStatus::Approved.as_str();

    let approved_only = [approved];
    let pending_only = [VerificationStatus::Pending.as_str()];
    let completed_only = [BOOKING_COMPLETED];
    let since_current = [current];
    let previous_month = [previous, current];
    let approved_since_current = [approved, current];
    let approved_previous_month = [approved, previous, current];
    let completed_since_current = [BOOKING_COMPLETED, current];
    let completed_previous_month = [BOOKING_COMPLETED, previous, current];

    let (
        total_users,
        total_providers,
        total_bookings,
        total_revenue,
        pending_verifications,
        active_bookings,
    ) = tokio::try_join!(
        count(pool, "SELECT COUNT(*) FROM profiles", &[]),
        count(
            pool,
            "SELECT COUNT(*) FROM provider_verifications WHERE verification_status = ?",
            &approved_only,
        ),
        count(pool, "SELECT COUNT(*) FROM bookings", &[]),
        sum(pool, "SELECT TOTAL(price) FROM bookings WHERE status = ?", &completed_only),
        count(
            pool,
            "SELECT COUNT(*) FROM provider_verifications WHERE verification_status = ?",
            &pending_only,
        ),
        count(
            pool,
            "SELECT COUNT(*) FROM bookings WHERE status IN (?, ?, ?)",
            &ACTIVE_BOOKING_STATUSES,
        ),
    )?;

    let (
        users_this_month,
        users_last_month,
        providers_this_month,
        providers_last_month,
        bookings_this_month,
        bookings_last_month,
        revenue_this_month,
        revenue_last_month,
    ) = tokio::try_join!(
        count(pool, "SELECT COUNT(*) FROM profiles WHERE created_at >= ?", &since_current),
        count(
            pool,
            "SELECT COUNT(*) FROM profiles WHERE created_at >= ? AND created_at < ?",
            &previous_month,
        ),
        count(
            pool,
            "SELECT COUNT(*) FROM provider_verifications WHERE verification_status = ? AND reviewed_at >= ?",
            &approved_since_current,
        ),
        count(
            pool,
            "SELECT COUNT(*) FROM provider_verifications WHERE verification_status = ? AND reviewed_at >= ? AND reviewed_at < ?",
            &approved_previous_month,
        ),
        count(pool, "SELECT COUNT(*) FROM bookings WHERE created_at >= ?", &since_current),
        count(
            pool,
            "SELECT COUNT(*) FROM bookings WHERE created_at >= ? AND created_at < ?",
            &previous_month,
        ),
        sum(
            pool,
            "SELECT TOTAL(price) FROM bookings WHERE status = ? AND created_at >= ?",
            &completed_since_current,
        ),
        sum(
            pool,
            "SELECT TOTAL(price) FROM bookings WHERE status = ? AND created_at >= ? AND created_at < ?",
            &completed_previous_month,
        ),
    )?;

    Ok(DashboardStats {
        total_users,
        total_providers,
        total_bookings,
        total_revenue,
        pending_verifications,
        active_bookings,
        user_growth: growth(users_this_month as f64, users_last_month as f64),
        provider_growth: growth(providers_this_month as f64, providers_last_month as f64),
        booking_growth: growth(bookings_this_month as f64, bookings_last_month as f64),
        revenue_growth: growth(revenue_this_month, revenue_last_month),
    })
}

pub const REVENUE_MONTHS: u32 = 6;
pub const BOOKING_DAYS: u32 = 7;
pub const ACTIVITY_LIMIT: i64 = 10;

pub async fn get_dashboard_snapshot(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<DashboardSnapshot, DataError> {
    let (stats, revenue, bookings, categories, activity) = tokio::try_join!(
        get_dashboard_stats(pool, now),
        get_revenue_by_month(pool, now, REVENUE_MONTHS),
        get_bookings_by_day(pool, now, BOOKING_DAYS),
        get_category_distribution(pool),
        get_recent_activity(pool, ACTIVITY_LIMIT),
    )?;

    Ok(DashboardSnapshot {
        stats,
        revenue,
        bookings,
        categories,
        activity,
    })
}

pub async fn get_revenue_by_month(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    months: u32,
) -> Result<Vec<RevenuePoint>, DataError> {
    let since = now.checked_sub_months(Months::new(months)).unwrap_or(now);
    let rows = sqlx::query_as::<_, (Option<String>, f64)>(
        r#"SELECT strftime('%Y-%m', created_at) AS bucket, TOTAL(price) AS revenue
           FROM bookings
           WHERE status = ? AND created_at >= ?
           GROUP BY bucket
           ORDER BY bucket"#,
    )
    .bind(BOOKING_COMPLETED)
    .bind(timestamp(since))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(bucket, revenue)| {
            let month = month_label(&bucket?)?;
            Some(RevenuePoint { month, revenue })
        })
        .collect())
}

pub async fn get_bookings_by_day(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    days: u32,
) -> Result<Vec<DailyBookings>, DataError> {
    let first_day = now.date_naive() - Duration::days(i64::from(days.max(1)) - 1);
    let rows = sqlx::query_as::<_, (Option<String>, i64)>(
        r#"SELECT date(created_at) AS day, COUNT(*) AS bookings
           FROM bookings
           WHERE created_at >= ?
           GROUP BY day
           ORDER BY day"#,
    )
    .bind(start_of_day(first_day))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(date, bookings)| {
            let date = date?;
            let day = weekday_label(&date)?;
            Some(DailyBookings { day, date, bookings })
        })
        .collect())
}

pub async fn get_category_distribution(pool: &SqlitePool) -> Result<Vec<CategoryShare>, DataError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"SELECT COALESCE(NULLIF(TRIM(service_category), ''), 'Other') AS name, COUNT(*) AS value
           FROM bookings
           GROUP BY name
           ORDER BY value DESC, name"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, value)| CategoryShare { name, value })
        .collect())
}

pub async fn get_recent_activity(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityItem>, DataError> {
    let (bookings, verifications, users) = tokio::try_join!(
        sqlx::query_as::<_, (String, String, Option<String>)>(
            r#"SELECT b.created_at, b.status, c.name
               FROM bookings b
               LEFT JOIN profiles c ON b.customer_id = c.id
               ORDER BY b.created_at DESC
               LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(pool),
        sqlx::query_as::<_, (String, String, Option<String>)>(
            r#"SELECT v.created_at, v.verification_status, p.name
               FROM provider_verifications v
               LEFT JOIN profiles p ON v.user_id = p.id
               ORDER BY v.created_at DESC
               LIMIT ?"#,
        )
        .bind(limit)
        .fetch_all(pool),
        sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT created_at, role, name FROM profiles ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool),
    )?;

    let bookings = bookings.into_iter().map(|(time, status, name)| ActivityItem {
        title: format!("Booking {status} by {}", name.as_deref().unwrap_or("Unknown")),
        time,
        kind: ActivityKind::Booking,
        status,
    });
    let verifications = verifications.into_iter().map(|(time, status, name)| ActivityItem {
        title: format!(
            "Provider verification {status}: {}",
            name.as_deref().unwrap_or("Unknown")
        ),
        time,
        kind: ActivityKind::Verification,
        status,
    });
    let users = users.into_iter().map(|(time, role, name)| ActivityItem {
        title: format!("New {role} signup: {}", name.as_deref().unwrap_or("Unknown")),
        time,
        kind: ActivityKind::User,
        status: "new".to_string(),
    });

    Ok(merge_activity(
        bookings.chain(verifications).chain(users),
        usize::try_from(limit).unwrap_or(0),
    ))
}

// Newest first, truncated to `limit`. Unparseable timestamps sort last.
pub fn merge_activity(items: impl IntoIterator<Item = ActivityItem>, limit: usize) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = items.into_iter().collect();
    items.sort_by_key(|item| {
        Reverse(
            DateTime::parse_from_rfc3339(&item.time)
                .ok()
                .map(|at| at.with_timezone(&Utc)),
        )
    });
    items.truncate(limit);
    items
}

pub fn month_label(bucket: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(&format!("{bucket}-01"), "%Y-%m-%d").ok()?;
    Some(date.format("%b %Y").to_string())
}

pub fn weekday_label(date: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(date.format("%a").to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::data::testing;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn growth_is_zero_without_a_previous_period() {
        assert_eq!(growth(5.0, 0.0), 0.0);
        assert_eq!(growth(0.0, 0.0), 0.0);
        assert_eq!(growth(15.0, 10.0), 50.0);
        assert_eq!(growth(5.0, 10.0), -50.0);
    }

    #[test]
    fn month_window_handles_january() {
        let window = MonthWindow::around(Utc.with_ymd_and_hms(2027, 1, 15, 8, 30, 0).unwrap());
        assert_eq!(window.current_start, "2027-01-01T00:00:00Z");
        assert_eq!(window.previous_start, "2026-12-01T00:00:00Z");
    }

    #[test]
    fn labels() {
        assert_eq!(month_label("2026-10").as_deref(), Some("Oct 2026"));
        assert_eq!(weekday_label("2026-10-19").as_deref(), Some("Mon"));
        assert_eq!(month_label("garbage"), None);
    }

    #[test]
    fn activity_merge_sorts_newest_first_and_truncates() {
        let item = |time: &str, kind| ActivityItem {
            title: time.to_string(),
            time: time.to_string(),
            kind,
            status: "new".to_string(),
        };
        let merged = merge_activity(
            vec![
                item("2026-10-01T00:00:00Z", ActivityKind::Booking),
                item("not a time", ActivityKind::User),
                item("2026-10-03T00:00:00Z", ActivityKind::Verification),
                item("2026-10-02T00:00:00+02:00", ActivityKind::User),
            ],
            3,
        );
        let times: Vec<_> = merged.iter().map(|item| item.time.as_str()).collect();
        assert_eq!(
            times,
            vec!["2026-10-03T00:00:00Z", "2026-10-02T00:00:00+02:00", "2026-10-01T00:00:00Z"]
        );
    }

    #[actix_web::test]
    async fn empty_store_has_zero_growth_everywhere() {
        let pool = testing::pool().await;
        let stats = get_dashboard_stats(&pool, now()).await.unwrap();
        assert_eq!(stats, DashboardStats::default());
        for value in [
            stats.user_growth,
            stats.provider_growth,
            stats.booking_growth,
            stats.revenue_growth,
        ] {
            assert!(value.is_finite());
            assert_eq!(value, 0.0);
        }
    }

    #[actix_web::test]
    async fn stats_compare_calendar_months() {
        let pool = testing::pool().await;
        testing::insert_profile(&pool, "u1", "customer", "A", "2026-09-10T00:00:00Z").await;
        testing::insert_profile(&pool, "u2", "customer", "B", "2026-10-02T00:00:00Z").await;
        testing::insert_profile(&pool, "u3", "customer", "C", "2026-10-03T00:00:00Z").await;
        testing::insert_booking(&pool, "b1", Some("u1"), Some("Plumbing"), "completed", Some(100.0), "2026-09-30T23:59:59Z").await;
        testing::insert_booking(&pool, "b2", Some("u2"), Some("Plumbing"), "completed", Some(150.0), "2026-10-05T00:00:00Z").await;
        testing::insert_booking(&pool, "b3", Some("u2"), None, "in_progress", Some(40.0), "2026-10-06T00:00:00Z").await;
        testing::insert_verification(&pool, "v1", "u3", "pending", "2026-10-07T00:00:00Z").await;

        let stats = get_dashboard_stats(&pool, now()).await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_bookings, 3);
        assert_eq!(stats.total_revenue, 250.0);
        assert_eq!(stats.pending_verifications, 1);
        assert_eq!(stats.active_bookings, 1);
        assert_eq!(stats.total_providers, 0);
        assert_eq!(stats.user_growth, 100.0);
        assert_eq!(stats.booking_growth, 100.0);
        assert_eq!(stats.revenue_growth, 50.0);
        assert_eq!(stats.provider_growth, 0.0);
    }

    #[actix_web::test]
    async fn revenue_buckets_sum_completed_bookings_per_month() {
        let pool = testing::pool().await;
        testing::insert_booking(&pool, "b1", None, None, "completed", Some(80.0), "2026-09-03T10:00:00Z").await;
        testing::insert_booking(&pool, "b2", None, None, "completed", Some(45.5), "2026-09-28T10:00:00Z").await;
        testing::insert_booking(&pool, "b3", None, None, "pending", Some(500.0), "2026-09-20T10:00:00Z").await;
        testing::insert_booking(&pool, "b4", None, None, "completed", Some(30.0), "2026-10-01T10:00:00Z").await;
        testing::insert_booking(&pool, "b5", None, None, "completed", Some(999.0), "2025-01-01T10:00:00Z").await;

        let revenue = get_revenue_by_month(&pool, now(), 6).await.unwrap();
        assert_eq!(
            revenue,
            vec![
                RevenuePoint { month: "Sep 2026".into(), revenue: 125.5 },
                RevenuePoint { month: "Oct 2026".into(), revenue: 30.0 },
            ]
        );
    }

    #[actix_web::test]
    async fn bookings_by_day_covers_the_requested_window() {
        let pool = testing::pool().await;
        testing::insert_booking(&pool, "b1", None, None, "pending", None, "2026-10-12T23:00:00Z").await;
        testing::insert_booking(&pool, "b2", None, None, "pending", None, "2026-10-13T08:00:00Z").await;
        testing::insert_booking(&pool, "b3", None, None, "pending", None, "2026-10-19T08:00:00Z").await;
        testing::insert_booking(&pool, "b4", None, None, "pending", None, "2026-10-19T09:00:00Z").await;

        let days = get_bookings_by_day(&pool, now(), 7).await.unwrap();
        assert_eq!(
            days,
            vec![
                DailyBookings { day: "Tue".into(), date: "2026-10-13".into(), bookings: 1 },
                DailyBookings { day: "Mon".into(), date: "2026-10-19".into(), bookings: 2 },
            ]
        );
    }

    #[actix_web::test]
    async fn missing_categories_count_as_other() {
        let pool = testing::pool().await;
        testing::insert_booking(&pool, "b1", None, Some("Plumbing"), "pending", None, "2026-10-01T00:00:00Z").await;
        testing::insert_booking(&pool, "b2", None, Some("Plumbing"), "pending", None, "2026-10-02T00:00:00Z").await;
        testing::insert_booking(&pool, "b3", None, None, "pending", None, "2026-10-03T00:00:00Z").await;

        let categories = get_category_distribution(&pool).await.unwrap();
        assert_eq!(
            categories,
            vec![
                CategoryShare { name: "Plumbing".into(), value: 2 },
                CategoryShare { name: "Other".into(), value: 1 },
            ]
        );
    }

    #[actix_web::test]
    async fn recent_activity_merges_all_sources() {
        let pool = testing::pool().await;
        testing::insert_profile(&pool, "u1", "customer", "Maya", "2026-10-01T00:00:00Z").await;
        testing::insert_booking(&pool, "b1", Some("u1"), None, "pending", None, "2026-10-02T00:00:00Z").await;
        testing::insert_verification(&pool, "v1", "u1", "pending", "2026-10-03T00:00:00Z").await;

        let activity = get_recent_activity(&pool, 2).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].title, "Provider verification pending: Maya");
        assert_eq!(activity[0].kind, ActivityKind::Verification);
        assert_eq!(activity[1].title, "Booking pending by Maya");
    }
}
