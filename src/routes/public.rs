use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use askama::Template;
use serde::Deserialize;

use crate::{
    auth::{
        authenticate_credentials, clear_session_cookie, create_session, login_redirect_target,
        revoke_session, session_cookie, SESSION_COOKIE,
    },
    state::AppState,
    templates::{render, render_with_status},
};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    title: &'static str,
    categories: Vec<&'static str>,
}

#[derive(Template)]
#[template(path = "about.html")]
struct AboutTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "contact.html")]
struct ContactTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "careers.html")]
struct CareersTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "terms.html")]
struct TermsTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "privacy.html")]
struct PrivacyTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "cookies.html")]
struct CookiesTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    title: &'static str,
    email: String,
    next: String,
    error: String,
    has_error: bool,
}

#[derive(Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    email: Option<String>,
    password: Option<String>,
    next: Option<String>,
}

const SERVICE_CATEGORIES: [&str; 6] = [
    "Plumbing",
    "Electrical",
    "Carpentry",
    "Painting",
    "Cleaning",
    "Appliance Repair",
];

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(web::resource("/about").route(web::get().to(about)))
        .service(web::resource("/contact").route(web::get().to(contact)))
        .service(web::resource("/careers").route(web::get().to(careers)))
        .service(web::resource("/terms").route(web::get().to(terms)))
        .service(web::resource("/privacy").route(web::get().to(privacy)))
        .service(web::resource("/cookies").route(web::get().to(cookies)))
        .service(
            web::resource("/login")
                .route(web::get().to(show_login))
                .route(web::post().to(login)),
        )
        .service(web::resource("/logout").route(web::post().to(logout)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn home() -> Result<HttpResponse> {
    Ok(render(HomeTemplate {
        title: "Home services, handled",
        categories: SERVICE_CATEGORIES.to_vec(),
    }))
}

async fn about() -> Result<HttpResponse> {
    Ok(render(AboutTemplate { title: "About us" }))
}

async fn contact() -> Result<HttpResponse> {
    Ok(render(ContactTemplate { title: "Contact" }))
}

async fn careers() -> Result<HttpResponse> {
    Ok(render(CareersTemplate { title: "Careers" }))
}

async fn terms() -> Result<HttpResponse> {
    Ok(render(TermsTemplate {
        title: "Terms of service",
    }))
}

async fn privacy() -> Result<HttpResponse> {
    Ok(render(PrivacyTemplate {
        title: "Privacy policy",
    }))
}

async fn cookies() -> Result<HttpResponse> {
    Ok(render(CookiesTemplate {
        title: "Cookie policy",
    }))
}

fn login_page(email: String, next: String, error: &str) -> LoginTemplate {
    LoginTemplate {
        title: "Admin sign in",
        email,
        next,
        has_error: !error.is_empty(),
        error: error.to_string(),
    }
}

async fn show_login(query: web::Query<LoginQuery>) -> Result<HttpResponse> {
    let next = login_redirect_target(query.next.as_deref()).to_string();
    Ok(render(login_page(String::new(), next, "")))
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let email = form.email.unwrap_or_default().trim().to_string();
    let password = form.password.unwrap_or_default();
    let next = login_redirect_target(form.next.as_deref()).to_string();

    if email.is_empty() || password.is_empty() {
        return Ok(render_with_status(
            actix_web::http::StatusCode::BAD_REQUEST,
            login_page(email, next, "Please enter both email and password"),
        ));
    }

    let account = authenticate_credentials(&state.db, &email, &password)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    let Some(account) = account else {
        log::warn!("Failed sign-in attempt for {email}");
        return Ok(render_with_status(
            actix_web::http::StatusCode::UNAUTHORIZED,
            login_page(email, next, "Invalid email or password"),
        ));
    };

    let token = create_session(&state.db, &account.id, state.session_ttl_hours)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;
    log::info!("{} signed in", account.email);

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, next))
        .cookie(session_cookie(&req, &token, state.session_ttl_hours))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        revoke_session(&state.db, cookie.value())
            .await
            .map_err(actix_web::error::ErrorInternalServerError)?;
    }

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/login"))
        .cookie(clear_session_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}
