use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::ActivityEvent;
use crate::services::mailer::Mailer;
use crate::services::session::SessionIssuer;

const ACTIVITY_CHANNEL_CAPACITY: usize = 256;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub sessions: SessionIssuer,
    pub mailer: Box<dyn Mailer>,
    pub activity_tx: broadcast::Sender<ActivityEvent>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig, mailer: Box<dyn Mailer>) -> anyhow::Result<Self> {
        let secret = match &config.session_secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                tracing::warn!("SESSION_SECRET not set, admin sessions will not survive a restart");
                SessionIssuer::random_secret()
            }
        };
        let sessions = SessionIssuer::new(
            &secret,
            chrono::Duration::hours(config.session_ttl_hours),
        )?;
        let (activity_tx, _) = broadcast::channel(ACTIVITY_CHANNEL_CAPACITY);

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            sessions,
            mailer,
            activity_tx,
        })
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}
