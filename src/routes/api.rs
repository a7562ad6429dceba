use actix_web::{error::InternalError, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    data::{
        analytics, bookings, non_empty, users, verifications, Pagination,
    },
    error::{ApiError, ErrorBody},
    models::{ReviewDecision, STATUS_ACTIVE, STATUS_SUSPENDED},
    state::AppState,
};

#[derive(Deserialize)]
struct UsersQuery {
    role: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Deserialize)]
struct BookingsQuery {
    status: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Deserialize)]
struct VerificationsQuery {
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationUpdatePayload {
    status: Option<String>,
    #[serde(alias = "admin_id")]
    admin_id: Option<String>,
    #[serde(alias = "admin_notes")]
    admin_notes: Option<String>,
}

#[derive(Deserialize)]
struct UserUpdatePayload {
    status: Option<String>,
    admin_notes: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let body = HttpResponse::BadRequest().json(ErrorBody {
                    error: format!("Invalid request body: {err}"),
                });
                InternalError::from_response(err, body).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let body = HttpResponse::BadRequest().json(ErrorBody {
                    error: format!("Invalid query parameters: {err}"),
                });
                InternalError::from_response(err, body).into()
            }))
            .service(web::resource("/users").route(web::get().to(list_users)))
            .service(
                web::resource("/users/{id}")
                    .route(web::get().to(get_user))
                    .route(web::patch().to(update_user)),
            )
            .service(web::resource("/bookings").route(web::get().to(list_bookings)))
            .service(web::resource("/verifications").route(web::get().to(list_verifications)))
            .service(
                web::resource("/verifications/{id}")
                    .route(web::get().to(get_verification))
                    .route(web::patch().to(update_verification)),
            )
            .service(web::resource("/dashboard/stats").route(web::get().to(dashboard_stats)))
            .default_service(web::to(not_found)),
    );
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody {
        error: format!("No route for {} {}", req.method(), req.path()),
    })
}

async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<UsersQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Pagination::new(query.limit, query.offset);
    let result = users::get_users(&state.db, query.role.as_deref(), page)
        .await
        .map_err(ApiError::from_data("Failed to fetch users"))?;
    Ok(HttpResponse::Ok().json(result))
}

async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let profile = users::get_user_by_id(&state.db, &path.into_inner())
        .await
        .map_err(ApiError::from_data("Failed to fetch user"))?;
    Ok(HttpResponse::Ok().json(profile))
}

async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UserUpdatePayload>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let payload = payload.into_inner();
    let Some(status) = non_empty(payload.status.as_deref()) else {
        return Err(ApiError::bad_request("Status is required"));
    };
    if status != STATUS_ACTIVE && status != STATUS_SUSPENDED {
        return Err(ApiError::bad_request(
            "Status must be either active or suspended",
        ));
    }

    users::update_user_status(&state.db, &user_id, status)
        .await
        .map_err(ApiError::from_data("Failed to update user"))?;

    match non_empty(payload.admin_notes.as_deref()) {
        Some(notes) => log::info!("User {user_id} set to {status}: {notes}"),
        None => log::info!("User {user_id} set to {status}"),
    }
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

async fn list_bookings(
    state: web::Data<AppState>,
    query: web::Query<BookingsQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Pagination::new(query.limit, query.offset);
    let result = bookings::get_bookings(&state.db, query.status.as_deref(), page)
        .await
        .map_err(ApiError::from_data("Failed to fetch bookings"))?;
    Ok(HttpResponse::Ok().json(result))
}

async fn list_verifications(
    state: web::Data<AppState>,
    query: web::Query<VerificationsQuery>,
) -> Result<HttpResponse, ApiError> {
    let records = verifications::get_provider_verifications(&state.db, query.status.as_deref())
        .await
        .map_err(ApiError::from_data("Failed to fetch verifications"))?;
    Ok(HttpResponse::Ok().json(records))
}

async fn get_verification(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let record = verifications::get_provider_verification_by_id(&state.db, &path.into_inner())
        .await
        .map_err(ApiError::from_data("Failed to fetch verification"))?;
    Ok(HttpResponse::Ok().json(record))
}

async fn update_verification(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<VerificationUpdatePayload>,
) -> Result<HttpResponse, ApiError> {
    let verification_id = path.into_inner();
    let payload = payload.into_inner();

    let (Some(status), Some(admin_id)) = (
        non_empty(payload.status.as_deref()),
        non_empty(payload.admin_id.as_deref()),
    ) else {
        return Err(ApiError::bad_request("Status and adminId are required"));
    };
    let Some(decision) = ReviewDecision::parse(status) else {
        return Err(ApiError::bad_request(
            "Status must be either approved or rejected",
        ));
    };

    verifications::update_verification_status(
        &state.db,
        &verification_id,
        decision,
        admin_id,
        non_empty(payload.admin_notes.as_deref()),
    )
    .await
    .map_err(ApiError::from_data("Failed to update verification"))?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

async fn dashboard_stats(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let snapshot = analytics::get_dashboard_snapshot(&state.db, Utc::now())
        .await
        .map_err(ApiError::from_data("Failed to fetch dashboard stats"))?;
    Ok(HttpResponse::Ok().json(snapshot))
}
