//! # Application State
//!
//! Everything a command needs, opened once at startup and shared across
//! requests.
//!
//! ## Thread Safety
//! `Database` wraps a `SqlitePool`, which is thread-safe and cheap to
//! clone. Configuration and the report clock are read-only after startup,
//! so no mutex is needed.

use tracing::info;

use remedy_core::period::ReportClock;
use remedy_db::{Database, DbConfig, ReportRepository};

use crate::config::AppConfig;
use crate::error::ApiError;

/// Shared state handed to every command.
#[derive(Debug, Clone)]
pub struct AppState {
    db: Database,
    config: AppConfig,
    clock: ReportClock,
}

impl AppState {
    /// Opens the configured database and runs pending migrations.
    pub async fn open(config: AppConfig) -> Result<Self, ApiError> {
        let db = Database::new(config.db_config()).await?;
        info!(db_path = ?config.db_path, store = %config.store_name, "Database connected");
        AppState::new(db, config)
    }

    /// In-memory store with default settings.
    pub async fn in_memory() -> Result<Self, ApiError> {
        let db = Database::new(DbConfig::in_memory()).await?;
        AppState::new(db, AppConfig::default())
    }

    pub fn new(db: Database, config: AppConfig) -> Result<Self, ApiError> {
        let clock = config.report_clock()?;
        Ok(AppState { db, config, clock })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Report repository on the configured local calendar.
    pub fn reports(&self) -> ReportRepository {
        self.db.reports(self.clock)
    }
}
