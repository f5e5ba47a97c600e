use std::net::TcpListener;

use anyhow::Context;

use weather_subscriptions::settings::Settings;
use weather_subscriptions::{app, db, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info", std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().context("Failed to load settings")?;

    let pool = db::connect(settings.database.options()).await?;

    let (subscription_service, weather_client) = app::build(&settings, pool)?;

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    app::run(listener, subscription_service, weather_client)?
        .await
        .context("Failed to run app")
}
