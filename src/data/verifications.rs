use sqlx::{types::Json, Sqlite, SqliteConnection, SqlitePool};

use super::{non_empty, DataError};
use crate::models::{
    now_timestamp, ReviewDecision, Role, VerificationRecord, VerificationRow, STATUS_APPROVED,
    STATUS_REJECTED,
};

const SELECT_VERIFICATION: &str = r#"
    SELECT v.id, v.user_id, v.phone, v.address, v.city, v.years_experience,
           v.government_id_image_url, v.professional_license_image_url, v.field_of_work,
           v.categories, v.hourly_rate, v.availability, v.verification_status,
           v.admin_notes, v.reviewed_by, v.reviewed_at, v.created_at, v.updated_at,
           p.id AS profile_id, p.name AS profile_name, p.phone AS profile_phone,
           p.rating AS profile_rating, p.created_at AS profile_created_at
    FROM provider_verifications v
    LEFT JOIN profiles p ON v.user_id = p.id"#;

pub async fn get_provider_verifications(
    pool: &SqlitePool,
    status: Option<&str>,
) -> Result<Vec<VerificationRecord>, DataError> {
    let status = non_empty(status);
    let rows = sqlx::query_as::<_, VerificationRow>(&format!(
        r#"{SELECT_VERIFICATION}
           WHERE (? IS NULL OR v.verification_status = ?)
           ORDER BY v.created_at DESC, v.id"#
    ))
    .bind(status)
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(VerificationRecord::from).collect())
}

pub async fn get_provider_verification_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<VerificationRecord, DataError> {
    let mut conn = pool.acquire().await?;
    fetch_by_id(&mut conn, id).await
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> Result<VerificationRecord, DataError> {
    let row = sqlx::query_as::<Sqlite, VerificationRow>(&format!(
        "{SELECT_VERIFICATION} WHERE v.id = ? LIMIT 1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(VerificationRecord::from)
        .ok_or(DataError::NotFound("Verification not found"))
}

// Approval upserts the provider record and promotes the owning profile; all
// writes share one transaction. The status update runs before any read so
// concurrent reviewers queue on the write lock instead of racing a stale read.
pub async fn update_verification_status(
    pool: &SqlitePool,
    id: &str,
    decision: ReviewDecision,
    admin_id: &str,
    admin_notes: Option<&str>,
) -> Result<(), DataError> {
    let mut tx = pool.begin().await?;
    let now = now_timestamp();
    let target = decision.as_status();

    let claimed = sqlx::query(
        r#"UPDATE provider_verifications
           SET verification_status = ?, reviewed_by = ?, reviewed_at = ?,
               admin_notes = COALESCE(?, admin_notes), updated_at = ?
           WHERE id = ? AND verification_status NOT IN (?, ?)"#,
    )
    .bind(target.as_str())
    .bind(admin_id)
    .bind(&now)
    .bind(admin_notes)
    .bind(&now)
    .bind(id)
    .bind(STATUS_APPROVED)
    .bind(STATUS_REJECTED)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let verification = fetch_by_id(&mut tx, id).await?;

    if claimed == 0 {
        if verification.verification_status != target {
            return Err(DataError::AlreadyReviewed {
                current: verification.verification_status,
            });
        }
        sqlx::query(
            "UPDATE provider_verifications SET admin_notes = COALESCE(?, admin_notes), updated_at = ? WHERE id = ?",
        )
        .bind(admin_notes)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        return Ok(());
    }

    match decision {
        ReviewDecision::Approved => {
            upsert_provider(&mut tx, &verification, &now).await?;
            let result = sqlx::query("UPDATE profiles SET role = ?, status = ? WHERE id = ?")
                .bind(Role::Provider.as_str())
                .bind(STATUS_APPROVED)
                .bind(&verification.user_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(DataError::NotFound("Applicant profile not found"));
            }
        }
        ReviewDecision::Rejected => {
            let result = sqlx::query("UPDATE profiles SET status = ? WHERE id = ?")
                .bind(STATUS_REJECTED)
                .bind(&verification.user_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(DataError::NotFound("Applicant profile not found"));
            }
        }
    }

    tx.commit().await?;
    log::info!(
        "Verification {id} for user {} marked {} by {admin_id}",
        verification.user_id,
        target.as_str()
    );
    Ok(())
}

async fn upsert_provider(
    conn: &mut SqliteConnection,
    verification: &VerificationRecord,
    now: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO providers (id, user_id, categories, hourly_rate, availability, documents, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(id) DO UPDATE SET
             categories = excluded.categories,
             hourly_rate = excluded.hourly_rate,
             availability = excluded.availability,
             documents = excluded.documents,
             updated_at = excluded.updated_at"#,
    )
    .bind(&verification.user_id)
    .bind(&verification.user_id)
    .bind(Json(&verification.categories))
    .bind(verification.hourly_rate)
    .bind(verification.availability.as_ref().map(Json))
    .bind(Json(verification.documents()))
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
