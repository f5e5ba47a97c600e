use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{error, get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use sqlx::SqlitePool;

use tracing_actix_web::TracingLogger;

use crate::client::{ConfirmationNotifier, EmailClient, EmailNotifier, LogNotifier, WeatherClient};
use crate::controller;
use crate::error::Error;
use crate::repo::SqliteSubscriptionRepo;
use crate::service::SubscriptionService;
use crate::settings::Settings;

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}

/// Build the subscription service and weather client described by the settings
pub fn build(
    settings: &Settings,
    pool: SqlitePool,
) -> anyhow::Result<(SubscriptionService, WeatherClient)> {
    let notifier: Arc<dyn ConfirmationNotifier> = match &settings.email {
        Some(email) => {
            let email_client = EmailClient::new(
                email.sender()?,
                email.api_timeout(),
                email.api_base_url()?,
                email.api_auth_token(),
            )?;
            Arc::new(EmailNotifier::new(email_client))
        }
        None => {
            tracing::warn!("No email settings, confirmation links will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let subscription_service = SubscriptionService::new(
        Arc::new(SqliteSubscriptionRepo::new(pool)),
        notifier,
        settings.app.frontend_base_url()?,
        settings.subscriptions.frequencies()?,
    );

    let weather_client = WeatherClient::new(
        settings.weather.api_base_url()?,
        settings.weather.api_key(),
        settings.weather.api_timeout(),
    )?;

    Ok((subscription_service, weather_client))
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    subscription_service: SubscriptionService,
    weather_client: WeatherClient,
) -> anyhow::Result<Server> {
    // Wrap application data
    let subscription_service = web::Data::new(subscription_service);
    let weather_client = web::Data::new(weather_client);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(subscription_service.clone())
            .app_data(weather_client.clone())
            // Malformed bodies and queries share the validation error shape
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                error::Error::from(Error::Validation(err.to_string()))
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                error::Error::from(Error::Validation(err.to_string()))
            }))
            .service(health_check)
            .service(controller::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
