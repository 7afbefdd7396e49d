use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use std::error::Error;

use rcompanion::config::CompanionConfig;
use rcompanion::data::open_database;

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let figment = rocket::Config::figment();
    let config = CompanionConfig::from_figment(&figment)?;
    let connection = open_database(&config.database_path)?;

    tracing::info!(database = %config.database_path, "database ready");

    rcompanion::rocket_with(figment, config, connection)
        .launch()
        .await?;

    Ok(())
}
