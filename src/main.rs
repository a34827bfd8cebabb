use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cleanline::config::AppConfig;
use cleanline::db;
use cleanline::services::mailer::resend::ResendMailer;
use cleanline::services::mailer::{LogMailer, Mailer};
use cleanline::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD not set, admin login is disabled");
    }

    let conn = db::init_db(&config.database_url)?;

    let mailer: Box<dyn Mailer> = match &config.resend_api_key {
        Some(key) => {
            tracing::info!("using Resend email provider (from: {})", config.email_from);
            Box::new(ResendMailer::new(key.clone(), config.email_from.clone()))
        }
        None => {
            tracing::info!("RESEND_API_KEY not set, notifications will be logged only");
            Box::new(LogMailer)
        }
    };

    let port = config.port;
    let state = Arc::new(AppState::new(conn, config, mailer)?);
    let app = cleanline::build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
