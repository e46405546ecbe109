//! Application configuration constants.
//!
//! Scheduler tuning lives here as constants; database and server
//! settings are loaded at startup.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== Scheduler Configuration ====================

/// Delay before a failed card (Again/Hard) comes back
pub const FAILURE_RETRY_MINUTES: i64 = 5;

/// Stability a Learning card is reset to when it graduates on Good
pub const PROMOTION_STABILITY: f64 = 1.5;

/// Interval after graduating from Learning to Review
pub const PROMOTION_INTERVAL_DAYS: i64 = 1;

/// Stability multiplier on failure
pub const FAILURE_STABILITY_FACTOR: f64 = 0.8;

/// Stability multiplier on Good for cards past Learning
pub const GOOD_STABILITY_FACTOR: f64 = 1.2;

/// Stability multiplier on Easy and Perfect
pub const EASY_STABILITY_FACTOR: f64 = 1.5;

/// Floor applied to stability after every answer
pub const MIN_STABILITY: f64 = 0.1;

/// Difficulty bounds
pub const MIN_DIFFICULTY: f64 = 0.1;
pub const MAX_DIFFICULTY: f64 = 1.0;

/// Difficulty shift per rating step away from Good
pub const DIFFICULTY_STEP: f64 = 0.1;

// ==================== Session Configuration ====================

/// Review sessions expire after this many hours without access
pub const SESSION_EXPIRY_HOURS: i64 = 1;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

// ==================== Runtime Configuration ====================

/// Default server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port
pub const SERVER_PORT: u16 = 3000;

/// Default database location
pub const DEFAULT_DB_PATH: &str = "data/vocab.db";

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
  database: Option<DatabaseConfig>,
  server: Option<ServerConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
  path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
  addr: Option<String>,
  port: Option<u16>,
}

/// Settings resolved at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub database_path: PathBuf,
  pub server_addr: String,
  pub server_port: u16,
}

impl Settings {
  /// Load settings with priority: config.toml > .env / environment > default
  pub fn load() -> Self {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file_config = match std::fs::read_to_string("config.toml") {
      Ok(contents) => parse_config(&contents),
      Err(_) => AppConfig::default(),
    };

    Self::resolve(file_config, |key| std::env::var(key).ok())
  }

  fn resolve(config: AppConfig, env: impl Fn(&str) -> Option<String>) -> Self {
    let database_path = match config.database.and_then(|db| db.path) {
      Some(path) => {
        tracing::info!("Using database from config.toml: {}", path);
        PathBuf::from(path)
      }
      None => match env("DATABASE_PATH") {
        Some(path) => {
          tracing::info!("Using database from DATABASE_PATH env: {}", path);
          PathBuf::from(path)
        }
        None => {
          let default = PathBuf::from(DEFAULT_DB_PATH);
          tracing::info!("Using default database path: {}", default.display());
          default
        }
      },
    };

    let (file_addr, file_port) = match config.server {
      Some(server) => (server.addr, server.port),
      None => (None, None),
    };

    let server_port = file_port
      .or_else(|| {
        env("SERVER_PORT").and_then(|p| match p.parse::<u16>() {
          Ok(port) => Some(port),
          Err(_) => {
            tracing::warn!("Ignoring invalid SERVER_PORT: {}", p);
            None
          }
        })
      })
      .unwrap_or(SERVER_PORT);

    Self {
      database_path,
      server_addr: file_addr.unwrap_or_else(|| SERVER_ADDR.to_string()),
      server_port,
    }
  }

  /// Get the full server bind address
  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.server_addr, self.server_port)
  }
}

fn parse_config(contents: &str) -> AppConfig {
  match toml::from_str::<AppConfig>(contents) {
    Ok(config) => config,
    Err(e) => {
      tracing::warn!("Ignoring malformed config.toml: {}", e);
      AppConfig::default()
    }
  }
}
