use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use barberbook::config::AppConfig;
use barberbook::db;
use barberbook::services::clock::{BusinessClock, SystemTimeSource};
use barberbook::services::messaging::twilio::TwilioSmsProvider;
use barberbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let clock = BusinessClock::new(&config.business_timezone, Box::new(SystemTimeSource))?;
    tracing::info!("business timezone: {}", clock.timezone());

    let messaging = TwilioSmsProvider::from_config(&config);
    if config.twilio_account_sid.is_empty() {
        tracing::warn!("TWILIO_ACCOUNT_SID not set, outgoing SMS will fail");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        messaging: Box::new(messaging),
        clock,
    });

    let app = barberbook::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
