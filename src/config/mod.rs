//! Configuration module for the tracker service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication
    pub api_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
    /// Directory that saved exports are written into
    pub export_dir: PathBuf,
    /// Export file imported in replace mode at startup
    pub import_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("TRACKER_API_PSK").ok().filter(|k| !k.is_empty());

        let bind_addr = match env::var("TRACKER_BIND_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Invalid TRACKER_BIND_ADDR {:?} ({}), using default", raw, e);
                default_bind_addr()
            }),
            Err(_) => default_bind_addr(),
        };

        let log_level = env::var("TRACKER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let json_logs = env::var("TRACKER_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let export_dir = env::var("TRACKER_EXPORT_DIR")
            .unwrap_or_else(|_| "./exports".to_string())
            .into();

        let import_path = env::var("TRACKER_IMPORT_PATH").ok().map(PathBuf::from);

        Self {
            api_psk,
            bind_addr,
            log_level,
            json_logs,
            export_dir,
            import_path,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}
