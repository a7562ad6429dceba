use actix_web::{
    body::BoxBody,
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::{ServiceRequest, ServiceResponse},
    http::{header, Uri},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest, HttpResponse,
};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    models::{now_timestamp, timestamp, AdminAccountRow},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "allin_session";

#[derive(Clone, Debug)]
pub struct AdminSession {
    pub token: String,
    pub account_id: String,
    pub profile_id: String,
    pub email: String,
    pub display_name: String,
    pub expires_at: String,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub async fn authenticate_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<AdminAccountRow>, sqlx::Error> {
    let account = sqlx::query_as::<_, AdminAccountRow>(
        r#"SELECT a.id, a.profile_id, a.email, a.password_hash, p.name AS display_name
           FROM admin_accounts a
           JOIN profiles p ON a.profile_id = p.id
           WHERE a.email = ?
           LIMIT 1"#,
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    Ok(account.filter(|account| verify_password(password, &account.password_hash)))
}

pub async fn create_session(
    pool: &SqlitePool,
    account_id: &str,
    ttl_hours: i64,
) -> Result<String, sqlx::Error> {
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO admin_sessions (token, account_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(account_id)
    .bind(timestamp(now))
    .bind(timestamp(now + Duration::hours(ttl_hours)))
    .execute(pool)
    .await?;
    Ok(token)
}

pub async fn find_session(pool: &SqlitePool, token: &str) -> Result<Option<AdminSession>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, String, String, Option<String>, String)>(
        r#"SELECT s.token, a.id, a.profile_id, a.email, p.name, s.expires_at
           FROM admin_sessions s
           JOIN admin_accounts a ON s.account_id = a.id
           JOIN profiles p ON a.profile_id = p.id
           WHERE s.token = ?
           LIMIT 1"#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let Some((token, account_id, profile_id, email, name, expires_at)) = row else {
        return Ok(None);
    };

    if expires_at <= now_timestamp() {
        revoke_session(pool, &token).await?;
        return Ok(None);
    }

    Ok(Some(AdminSession {
        token,
        account_id,
        profile_id,
        display_name: name.unwrap_or_else(|| email.clone()),
        email,
        expires_at,
    }))
}

pub async fn revoke_session(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM admin_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub fn session_cookie(req: &HttpRequest, token: &str, ttl_hours: i64) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(ttl_hours));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn clear_session_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

fn login_url(uri: &Uri) -> String {
    let target = uri.path_and_query().map_or(uri.path(), |target| target.as_str());
    match askama::filters::urlencode(target) {
        Ok(next) => format!("/login?next={next}"),
        Err(_) => "/login".to_string(),
    }
}

pub fn login_redirect_target(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with("/dashboard") && !next.starts_with("//") => next,
        _ => "/dashboard",
    }
}

pub async fn session_gate<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: actix_web::body::MessageBody + 'static,
{
    let token = req.cookie(SESSION_COOKIE).map(|cookie| cookie.value().to_string());
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let session = match (token, state) {
        (Some(token), Some(state)) if !token.is_empty() => {
            match find_session(&state.db, &token).await {
                Ok(session) => session,
                Err(err) => {
                    log::error!("Session lookup failed: {err}");
                    return Ok(req.into_response(HttpResponse::InternalServerError().finish()));
                }
            }
        }
        _ => None,
    };

    let Some(session) = session else {
        let response = HttpResponse::SeeOther()
            .insert_header((header::LOCATION, login_url(req.uri())))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish();
        return Ok(req.into_response(response));
    };

    req.extensions_mut().insert(session);
    let res = next.call(req).await?;
    Ok(res.map_into_boxed_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing;

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[test]
    fn login_url_keeps_the_query_string() {
        let uri = Uri::from_static("/dashboard/users?role=provider&q=a%20b");
        assert_eq!(
            login_url(&uri),
            "/login?next=/dashboard/users%3Frole%3Dprovider%26q%3Da%2520b"
        );
        assert_eq!(login_url(&Uri::from_static("/dashboard")), "/login?next=/dashboard");
    }

    #[test]
    fn only_dashboard_paths_are_redirect_targets() {
        assert_eq!(login_redirect_target(Some("/dashboard/users")), "/dashboard/users");
        assert_eq!(login_redirect_target(Some("https://evil.example")), "/dashboard");
        assert_eq!(login_redirect_target(Some("/api/users")), "/dashboard");
        assert_eq!(login_redirect_target(None), "/dashboard");
    }

    async fn account(pool: &SqlitePool) -> String {
        testing::insert_profile(pool, "admin-profile", "admin", "Lina", "2026-09-01T00:00:00Z").await;
        sqlx::query(
            "INSERT INTO admin_accounts (id, profile_id, email, password_hash, created_at) VALUES ('acc-1', 'admin-profile', 'lina@allin.com', ?, '2026-09-01T00:00:00Z')",
        )
        .bind(hash_password("hunter22").unwrap())
        .execute(pool)
        .await
        .unwrap();
        "acc-1".to_string()
    }

    #[actix_web::test]
    async fn credentials_are_checked_case_insensitively_by_email() {
        let pool = testing::pool().await;
        account(&pool).await;

        let ok = authenticate_credentials(&pool, " Lina@AllIn.com ", "hunter22").await.unwrap();
        assert_eq!(ok.map(|account| account.profile_id).as_deref(), Some("admin-profile"));
        assert!(authenticate_credentials(&pool, "lina@allin.com", "nope").await.unwrap().is_none());
        assert!(authenticate_credentials(&pool, "who@allin.com", "hunter22").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn sessions_resolve_until_revoked_or_expired() {
        let pool = testing::pool().await;
        let account_id = account(&pool).await;

        let token = create_session(&pool, &account_id, 1).await.unwrap();
        let session = find_session(&pool, &token).await.unwrap().unwrap();
        assert_eq!(session.display_name, "Lina");
        assert_eq!(session.profile_id, "admin-profile");

        revoke_session(&pool, &token).await.unwrap();
        assert!(find_session(&pool, &token).await.unwrap().is_none());

        let expired = create_session(&pool, &account_id, -1).await.unwrap();
        assert!(find_session(&pool, &expired).await.unwrap().is_none());
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }
}
