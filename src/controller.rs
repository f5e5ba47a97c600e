use actix_web::dev::HttpServiceFactory;
use actix_web::web;

pub mod subscriptions;
pub mod weather;

/// All REST endpoints consumed by the frontend
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api")
        .configure(subscriptions::configure)
        .configure(weather::configure)
}
