//! # remedy-api: Command Layer for Remedy Pharmacy
//!
//! The functions an HTTP router calls. Each command takes the shared
//! [`AppState`] plus a request DTO and returns
//! `Result<ApiResponse<T>, ApiError>`.
//!
//! ## Module Organization
//! ```text
//! remedy_api/
//! ├── lib.rs          ◄─── You are here (tracing + startup)
//! ├── config.rs       ◄─── REMEDY_* environment configuration
//! ├── state.rs        ◄─── AppState (Database, config, report clock)
//! ├── response.rs     ◄─── { status, msg, ...payload } envelope
//! ├── error.rs        ◄─── ApiError + HTTP status mapping
//! └── commands/
//!     ├── medicine.rs ◄─── Stock-in, catalogue CRUD, batch corrections
//!     ├── sale.rs     ◄─── Checkout and sale history
//!     ├── stock.rs    ◄─── Availability, expiry, valuation, movement
//!     └── report.rs   ◄─── Profit summaries and trends
//! ```
//!
//! ## Startup
//! ```rust,ignore
//! remedy_api::init_tracing();
//! let state = remedy_api::start().await?;
//!
//! // inside a route handler
//! let response = commands::sale::sell_medicine(&state, request).await;
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod response;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ErrorCode};
pub use response::{ApiResponse, ApiResult};
pub use state::AppState;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,remedy=debug,sqlx=warn";

/// Initializes the tracing subscriber.
///
/// ## Configuration
/// Set `RUST_LOG` to control log levels:
/// - `RUST_LOG=debug` - Show all debug logs
/// - `RUST_LOG=remedy_db=trace` - Trace-level for the database crate
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Loads configuration from the environment and opens the database.
pub async fn start() -> Result<AppState, ApiError> {
    let config = AppConfig::load()?;
    info!(
        db_path = ?config.db_path,
        utc_offset_minutes = config.utc_offset_minutes,
        "Starting Remedy Pharmacy backend"
    );

    AppState::open(config).await
}
