pub mod auth;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod templates;
pub mod views;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};

use crate::{config::Config, state::AppState};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let pool = db::connect(&config).await?;

    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool, &config).await?;

    let state = AppState::new(pool, config.session_ttl_hours);

    let address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting AllIn on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
