use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub session_ttl_hours: i64,
}

impl AppState {
    pub fn new(db: SqlitePool, session_ttl_hours: i64) -> Self {
        Self {
            db,
            session_ttl_hours,
        }
    }
}
