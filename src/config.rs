use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation.
    Json,
}

/// Command-line and environment configuration for the `cardledger` binary.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Settings {
    /// Operation script CSV file
    pub input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYMENTS_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `cardledger=debug`
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[arg(long, env = "APP_NAME", default_value = "payments")]
    pub app_name: String,

    #[arg(long, env = "ENV", default_value = "local")]
    pub environment: String,
}

impl Settings {
    pub fn context(&self) -> ServiceContext {
        ServiceContext {
            app_name: self.app_name.clone(),
            environment: self.environment.clone(),
        }
    }
}

/// Deployment identity handed to services at construction and attached to their spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    pub app_name: String,
    pub environment: String,
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self {
            app_name: "payments".to_string(),
            environment: "local".to_string(),
        }
    }
}
