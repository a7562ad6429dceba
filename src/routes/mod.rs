pub mod api;
pub mod dashboard;
pub mod public;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(public::configure)
        .configure(api::configure)
        .configure(dashboard::configure);
}
