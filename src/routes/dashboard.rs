use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use askama::Template;
use chrono::Utc;
use serde::Deserialize;

use crate::{
    auth::{session_gate, AdminSession},
    data::{
        analytics, bookings, non_empty, users, verifications, DataError, Pagination, MAX_PAGE_SIZE,
    },
    models::{
        Booking, DashboardSnapshot, Profile, ReviewDecision, Role, VerificationRecord,
        VerificationStatus, BOOKING_STATUSES, STATUS_ACTIVE, STATUS_SUSPENDED,
    },
    state::AppState,
    templates::{money, percent, render, short_date},
    views::{
        filter_by_query, tab_counts, tab_label, tabs_from_totals, total_for, TabCount, ViewState,
    },
};

const ALL_TAB: &str = "all";

#[derive(Clone, Debug)]
struct StatCard {
    label: String,
    value: String,
    growth: String,
    has_growth: bool,
    trending_up: bool,
}

#[derive(Clone, Debug)]
struct Bar {
    label: String,
    value: String,
    width: u32,
}

#[derive(Clone, Debug)]
struct ActivityView {
    title: String,
    time: String,
    kind: String,
    status: String,
}

#[derive(Clone, Debug)]
struct UserView {
    id: String,
    name: String,
    email: String,
    phone: String,
    role: String,
    status: String,
    rating: String,
    joined: String,
    is_suspended: bool,
}

#[derive(Clone, Debug)]
struct BookingView {
    id: String,
    service: String,
    category: String,
    customer: String,
    provider: String,
    location: String,
    scheduled: String,
    price: String,
    status: String,
    status_label: String,
}

#[derive(Clone, Debug)]
struct VerificationView {
    id: String,
    name: String,
    phone: String,
    city: String,
    address: String,
    field_of_work: String,
    categories: String,
    hourly_rate: String,
    experience: String,
    status: String,
    status_label: String,
    submitted: String,
    reviewed_by: String,
    reviewed_at: String,
    admin_notes: String,
    availability: String,
    documents: Vec<DocumentLink>,
    is_open: bool,
}

#[derive(Clone, Debug)]
struct DocumentLink {
    url: String,
    linkable: bool,
}

#[derive(Template)]
#[template(path = "dashboard/overview.html")]
struct OverviewTemplate {
    admin_name: String,
    cards: Vec<StatCard>,
    revenue: ViewState<Bar>,
    days: ViewState<Bar>,
    categories: ViewState<Bar>,
    activity: ViewState<ActivityView>,
    error: String,
    has_error: bool,
}

#[derive(Template)]
#[template(path = "dashboard/users.html")]
struct UsersTemplate {
    admin_name: String,
    users: ViewState<UserView>,
    tabs: Vec<TabCount>,
    query: String,
    active_count: usize,
    suspended_count: usize,
    total: i64,
    shown: usize,
    truncated: bool,
}

#[derive(Template)]
#[template(path = "dashboard/bookings.html")]
struct BookingsTemplate {
    admin_name: String,
    bookings: ViewState<BookingView>,
    tabs: Vec<TabCount>,
    query: String,
    completed_revenue: String,
    total: i64,
    shown: usize,
    truncated: bool,
}

#[derive(Template)]
#[template(path = "dashboard/verifications.html")]
struct VerificationsTemplate {
    admin_name: String,
    verifications: ViewState<VerificationView>,
    tabs: Vec<TabCount>,
    query: String,
}

#[derive(Template)]
#[template(path = "dashboard/verification_detail.html")]
struct VerificationDetailTemplate {
    admin_name: String,
    verification: VerificationView,
    notice: String,
    has_notice: bool,
    error: String,
    has_error: bool,
}

#[derive(Template)]
#[template(path = "dashboard/settings.html")]
struct SettingsTemplate {
    admin_name: String,
    email: String,
    profile_id: String,
    session_expires: String,
}

#[derive(Deserialize)]
struct UsersFilter {
    role: Option<String>,
    q: Option<String>,
}

#[derive(Deserialize)]
struct BookingsFilter {
    status: Option<String>,
    q: Option<String>,
}

#[derive(Deserialize)]
struct VerificationsFilter {
    status: Option<String>,
    q: Option<String>,
}

#[derive(Deserialize)]
struct DetailFlash {
    notice: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct UserStatusForm {
    status: String,
}

#[derive(Deserialize)]
struct ReviewForm {
    decision: String,
    notes: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .wrap(from_fn(session_gate))
            .service(web::resource("").route(web::get().to(overview)))
            .service(web::resource("/").route(web::get().to(overview)))
            .service(web::resource("/users").route(web::get().to(list_users)))
            .service(web::resource("/users/{id}/status").route(web::post().to(update_user_status)))
            .service(web::resource("/bookings").route(web::get().to(list_bookings)))
            .service(web::resource("/verifications").route(web::get().to(list_verifications)))
            .service(web::resource("/verifications/{id}").route(web::get().to(verification_detail)))
            .service(
                web::resource("/verifications/{id}/review").route(web::post().to(review_verification)),
            )
            .service(web::resource("/settings").route(web::get().to(settings))),
    );
}

async fn overview(state: web::Data<AppState>, auth: web::ReqData<AdminSession>) -> Result<HttpResponse> {
    let template = match analytics::get_dashboard_snapshot(&state.db, Utc::now()).await {
        Ok(snapshot) => overview_from_snapshot(auth.display_name.clone(), snapshot),
        Err(err) => {
            log::error!("Failed to fetch dashboard stats: {err}");
            let message = "Failed to load dashboard statistics".to_string();
            OverviewTemplate {
                admin_name: auth.display_name.clone(),
                cards: Vec::new(),
                revenue: ViewState::Failed(message.clone()),
                days: ViewState::Failed(message.clone()),
                categories: ViewState::Failed(message.clone()),
                activity: ViewState::Failed(message.clone()),
                error: message,
                has_error: true,
            }
        }
    };
    Ok(render(template))
}

fn overview_from_snapshot(admin_name: String, snapshot: DashboardSnapshot) -> OverviewTemplate {
    let stats = snapshot.stats;
    let cards = vec![
        stat_card("Total users", stats.total_users.to_string(), Some(stats.user_growth)),
        stat_card("Providers", stats.total_providers.to_string(), Some(stats.provider_growth)),
        stat_card("Bookings", stats.total_bookings.to_string(), Some(stats.booking_growth)),
        stat_card("Revenue", money(stats.total_revenue), Some(stats.revenue_growth)),
        stat_card("Pending verifications", stats.pending_verifications.to_string(), None),
        stat_card("Active bookings", stats.active_bookings.to_string(), None),
    ];

    let revenue_max = snapshot.revenue.iter().map(|point| point.revenue).fold(0.0, f64::max);
    let revenue = snapshot
        .revenue
        .iter()
        .map(|point| Bar {
            label: point.month.clone(),
            value: money(point.revenue),
            width: bar_width(point.revenue, revenue_max),
        })
        .collect();

    let days_max = snapshot.bookings.iter().map(|day| day.bookings).max().unwrap_or(0) as f64;
    let days = snapshot
        .bookings
        .iter()
        .map(|day| Bar {
            label: format!("{} {}", day.day, day.date),
            value: day.bookings.to_string(),
            width: bar_width(day.bookings as f64, days_max),
        })
        .collect();

    let categories_max = snapshot
        .categories
        .iter()
        .map(|category| category.value)
        .max()
        .unwrap_or(0) as f64;
    let categories = snapshot
        .categories
        .iter()
        .map(|category| Bar {
            label: category.name.clone(),
            value: category.value.to_string(),
            width: bar_width(category.value as f64, categories_max),
        })
        .collect();

    let activity = snapshot
        .activity
        .into_iter()
        .map(|item| ActivityView {
            kind: item.kind_label().to_string(),
            title: item.title,
            time: item.time,
            status: item.status,
        })
        .collect();

    OverviewTemplate {
        admin_name,
        cards,
        revenue: ViewState::from_items(revenue),
        days: ViewState::from_items(days),
        categories: ViewState::from_items(categories),
        activity: ViewState::from_items(activity),
        error: String::new(),
        has_error: false,
    }
}

fn stat_card(label: &str, value: String, growth: Option<f64>) -> StatCard {
    StatCard {
        label: label.to_string(),
        value,
        growth: growth.map(percent).unwrap_or_default(),
        has_growth: growth.is_some(),
        trending_up: growth.is_some_and(|growth| growth >= 0.0),
    }
}

fn bar_width(value: f64, max: f64) -> u32 {
    if max <= 0.0 {
        return 0;
    }
    ((value / max) * 100.0).round().clamp(0.0, 100.0) as u32
}

async fn list_users(
    state: web::Data<AppState>,
    auth: web::ReqData<AdminSession>,
    query: web::Query<UsersFilter>,
) -> Result<HttpResponse> {
    let role = non_empty(query.role.as_deref())
        .and_then(Role::parse)
        .map(|role| role.as_str())
        .unwrap_or(ALL_TAB);
    let search = query.q.clone().unwrap_or_default();

    let loaded = tokio::try_join!(
        users::get_users(&state.db, None, Pagination::new(Some(MAX_PAGE_SIZE), None)),
        users::count_by_role(&state.db),
        users::count_by_status(&state.db),
    );
    let (result, by_role, by_status) = match loaded {
        Ok((page, by_role, by_status)) => (Ok(page), by_role, by_status),
        Err(err) => (Err(err), Vec::new(), Vec::new()),
    };

    let total = result.as_ref().map(|page| page.count).unwrap_or(0);
    let shown = result.as_ref().map(|page| page.data.len()).unwrap_or(0);
    let mut tabs = vec![all_tab(total, role == ALL_TAB)];
    let roles: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
    tabs.extend(tabs_from_totals(&by_role, &roles, role));

    let users = ViewState::from_result(
        result.map(|page| {
            let in_tab = page
                .data
                .into_iter()
                .filter(|profile| role == ALL_TAB || profile.role.as_str() == role)
                .collect();
            filter_by_query(in_tab, &search)
                .into_iter()
                .map(user_view)
                .collect()
        }),
        "Failed to fetch users",
    );

    Ok(render(UsersTemplate {
        admin_name: auth.display_name.clone(),
        users,
        tabs,
        query: search,
        active_count: total_for(&by_status, STATUS_ACTIVE),
        suspended_count: total_for(&by_status, STATUS_SUSPENDED),
        total,
        shown,
        truncated: i64::try_from(shown).unwrap_or(i64::MAX) < total,
    }))
}

async fn update_user_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AdminSession>,
    path: web::Path<String>,
    form: web::Form<UserStatusForm>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let status = form.into_inner().status;
    if status != STATUS_ACTIVE && status != STATUS_SUSPENDED {
        return Ok(HttpResponse::BadRequest().body("Invalid status"));
    }

    match users::update_user_status(&state.db, &user_id, &status).await {
        Ok(()) => log::info!("{} set user {user_id} to {status}", auth.email),
        Err(DataError::NotFound(message)) => return Ok(HttpResponse::NotFound().body(message)),
        Err(err) => return Err(actix_web::error::ErrorInternalServerError(err)),
    }

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/dashboard/users"))
        .finish())
}

async fn list_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AdminSession>,
    query: web::Query<BookingsFilter>,
) -> Result<HttpResponse> {
    let status = non_empty(query.status.as_deref())
        .and_then(|status| BOOKING_STATUSES.into_iter().find(|known| *known == status))
        .unwrap_or(ALL_TAB);
    let search = query.q.clone().unwrap_or_default();

    let loaded = tokio::try_join!(
        bookings::get_bookings(&state.db, None, Pagination::new(Some(MAX_PAGE_SIZE), None)),
        bookings::count_by_status(&state.db),
        bookings::completed_revenue(&state.db),
    );
    let (result, by_status, completed_revenue) = match loaded {
        Ok((page, by_status, revenue)) => (Ok(page), by_status, revenue),
        Err(err) => (Err(err), Vec::new(), 0.0),
    };

    let total = result.as_ref().map(|page| page.count).unwrap_or(0);
    let shown = result.as_ref().map(|page| page.data.len()).unwrap_or(0);
    let mut tabs = vec![all_tab(total, status == ALL_TAB)];
    tabs.extend(tabs_from_totals(&by_status, &BOOKING_STATUSES, status));

    let bookings = ViewState::from_result(
        result.map(|page| {
            let in_tab = page
                .data
                .into_iter()
                .filter(|booking| status == ALL_TAB || booking.status == status)
                .collect();
            filter_by_query(in_tab, &search)
                .into_iter()
                .map(booking_view)
                .collect()
        }),
        "Failed to fetch bookings",
    );

    Ok(render(BookingsTemplate {
        admin_name: auth.display_name.clone(),
        bookings,
        tabs,
        query: search,
        completed_revenue: money(completed_revenue),
        total,
        shown,
        truncated: i64::try_from(shown).unwrap_or(i64::MAX) < total,
    }))
}

async fn list_verifications(
    state: web::Data<AppState>,
    auth: web::ReqData<AdminSession>,
    query: web::Query<VerificationsFilter>,
) -> Result<HttpResponse> {
    let status = match non_empty(query.status.as_deref()) {
        Some(ALL_TAB) => ALL_TAB,
        Some(status) => VerificationStatus::parse(status)
            .map(|status| status.as_str())
            .unwrap_or(VerificationStatus::Pending.as_str()),
        None => VerificationStatus::Pending.as_str(),
    };
    let search = query.q.clone().unwrap_or_default();

    let result = verifications::get_provider_verifications(&state.db, None).await;
    let fetched: Vec<VerificationRecord> = result.as_ref().map(Clone::clone).unwrap_or_default();

    let mut tabs = vec![all_tab(fetched.len() as i64, status == ALL_TAB)];
    let statuses: Vec<&str> = VerificationStatus::ALL.iter().map(VerificationStatus::as_str).collect();
    tabs.extend(tab_counts(&fetched, &statuses, status, |record| {
        record.verification_status.as_str()
    }));

    let verifications = ViewState::from_result(
        result.map(|records| {
            let in_tab = records
                .into_iter()
                .filter(|record| status == ALL_TAB || record.verification_status.as_str() == status)
                .collect();
            filter_by_query(in_tab, &search)
                .into_iter()
                .map(verification_view)
                .collect()
        }),
        "Failed to fetch verifications",
    );

    Ok(render(VerificationsTemplate {
        admin_name: auth.display_name.clone(),
        verifications,
        tabs,
        query: search,
    }))
}

async fn verification_detail(
    state: web::Data<AppState>,
    auth: web::ReqData<AdminSession>,
    path: web::Path<String>,
    flash: web::Query<DetailFlash>,
) -> Result<HttpResponse> {
    let record = match verifications::get_provider_verification_by_id(&state.db, &path.into_inner()).await {
        Ok(record) => record,
        Err(DataError::NotFound(message)) => return Ok(HttpResponse::NotFound().body(message)),
        Err(err) => return Err(actix_web::error::ErrorInternalServerError(err)),
    };

    let flash = flash.into_inner();
    let notice = flash.notice.unwrap_or_default();
    let error = flash.error.unwrap_or_default();
    Ok(render(VerificationDetailTemplate {
        admin_name: auth.display_name.clone(),
        verification: verification_view(record),
        has_notice: !notice.is_empty(),
        notice,
        has_error: !error.is_empty(),
        error,
    }))
}

async fn review_verification(
    state: web::Data<AppState>,
    auth: web::ReqData<AdminSession>,
    path: web::Path<String>,
    form: web::Form<ReviewForm>,
) -> Result<HttpResponse> {
    let verification_id = path.into_inner();
    let form = form.into_inner();
    let detail_url = format!("/dashboard/verifications/{verification_id}");

    let Some(decision) = ReviewDecision::parse(form.decision.trim()) else {
        return Ok(redirect(&format!("{detail_url}?error=Choose+approve+or+reject")));
    };

    let outcome = verifications::update_verification_status(
        &state.db,
        &verification_id,
        decision,
        &auth.profile_id,
        non_empty(form.notes.as_deref()),
    )
    .await;

    match outcome {
        Ok(()) => Ok(redirect(&format!(
            "{detail_url}?notice=Verification+{}",
            decision.as_status().as_str()
        ))),
        Err(DataError::NotFound(message)) => Ok(HttpResponse::NotFound().body(message)),
        Err(DataError::AlreadyReviewed { current }) => Ok(redirect(&format!(
            "{detail_url}?error=Already+{}",
            current.as_str()
        ))),
        Err(err) => {
            log::error!("Failed to update verification {verification_id}: {err}");
            Ok(redirect(&format!("{detail_url}?error=Update+failed")))
        }
    }
}

async fn settings(auth: web::ReqData<AdminSession>) -> Result<HttpResponse> {
    Ok(render(SettingsTemplate {
        admin_name: auth.display_name.clone(),
        email: auth.email.clone(),
        profile_id: auth.profile_id.clone(),
        session_expires: auth.expires_at.clone(),
    }))
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .finish()
}

fn all_tab(count: i64, selected: bool) -> TabCount {
    TabCount {
        value: ALL_TAB.to_string(),
        label: tab_label(ALL_TAB),
        count: usize::try_from(count).unwrap_or(0),
        selected,
    }
}

fn or_dash(value: Option<String>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "-".to_string())
}

// Applicant-supplied references only become links for http(s) URLs or
// same-site paths.
fn is_safe_link(url: &str) -> bool {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return true;
    }
    if url.starts_with("//") || url.starts_with('\\') {
        return false;
    }
    let scheme_end = url.find(|c| matches!(c, '/' | '?' | '#')).unwrap_or(url.len());
    !url[..scheme_end].contains(':')
}

fn user_view(profile: Profile) -> UserView {
    let status = profile.status.unwrap_or_default();
    UserView {
        id: profile.id,
        name: or_dash(profile.name),
        email: or_dash(profile.email),
        phone: or_dash(profile.phone),
        role: profile.role.as_str().to_string(),
        is_suspended: status == STATUS_SUSPENDED,
        status: or_dash(Some(status)),
        rating: profile
            .rating
            .map(|rating| format!("{rating:.1}"))
            .unwrap_or_else(|| "-".to_string()),
        joined: short_date(&profile.created_at),
    }
}

fn booking_view(booking: Booking) -> BookingView {
    BookingView {
        id: booking.id,
        service: or_dash(booking.service_type),
        category: booking
            .service_category
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| "Other".to_string()),
        customer: or_dash(booking.customer.and_then(|customer| customer.name)),
        provider: booking
            .provider
            .and_then(|provider| provider.name)
            .unwrap_or_else(|| "Unassigned".to_string()),
        location: or_dash(booking.location),
        scheduled: or_dash(booking.scheduled_time),
        price: booking.price.map(money).unwrap_or_else(|| "-".to_string()),
        status_label: tab_label(&booking.status),
        status: booking.status,
    }
}

fn verification_view(record: VerificationRecord) -> VerificationView {
    let documents = record
        .documents()
        .into_iter()
        .map(|url| DocumentLink {
            linkable: is_safe_link(&url),
            url,
        })
        .collect();
    let is_open = !record.verification_status.is_reviewed();
    let name = record.display_name().to_string();
    let availability = record
        .availability
        .as_ref()
        .and_then(|value| serde_json::to_string_pretty(value).ok());
    VerificationView {
        id: record.id,
        name,
        phone: or_dash(record.phone),
        city: or_dash(record.city),
        address: or_dash(record.address),
        field_of_work: or_dash(record.field_of_work),
        categories: if record.categories.is_empty() {
            "-".to_string()
        } else {
            record.categories.join(", ")
        },
        hourly_rate: record
            .hourly_rate
            .map(|rate| format!("{}/hr", money(rate)))
            .unwrap_or_else(|| "-".to_string()),
        experience: record
            .years_experience
            .map(|years| format!("{years} years"))
            .unwrap_or_else(|| "-".to_string()),
        status: record.verification_status.as_str().to_string(),
        status_label: tab_label(record.verification_status.as_str()),
        submitted: short_date(&record.created_at),
        reviewed_by: or_dash(record.reviewed_by),
        reviewed_at: or_dash(record.reviewed_at),
        admin_notes: or_dash(record.admin_notes),
        availability: or_dash(availability),
        documents,
        is_open,
    }
}
