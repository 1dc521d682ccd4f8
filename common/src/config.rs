//! Application configuration.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the working directory. Variables already present in the process
//! environment win over the file.

use std::path::PathBuf;

use crate::errors::{AppError, AppResult};
use crate::utils::SqlValidator;

/// Default listen address.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default location of the persisted connection registry.
pub const DEFAULT_CONNECTIONS_FILE: &str = "connections.json";

/// Table and columns the fixed statements run against.
///
/// Set once at startup by the operator; request input never reaches these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    /// Table name, optionally schema-qualified (`SCHEMA.TABLE`).
    pub table: String,
    /// Column the recent-rows statement orders by, descending.
    pub id_column: String,
    /// Column the filter statement compares against the bound value.
    pub filter_column: String,
}

impl Default for QueryTarget {
    fn default() -> Self {
        Self {
            table: "SMS.SMS".to_string(),
            id_column: "ID".to_string(),
            filter_column: "MOBILE".to_string(),
        }
    }
}

impl QueryTarget {
    /// Rejects identifiers that could not safely be spliced into a statement.
    pub fn validate(&self) -> AppResult<()> {
        SqlValidator::validate_identifier(&self.table)?;
        SqlValidator::validate_identifier(&self.id_column)?;
        SqlValidator::validate_identifier(&self.filter_column)?;
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, one line per event.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Runtime configuration for the console service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and response metadata.
    pub service_name: String,
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Path of the JSON file backing the connection registry.
    pub connections_file: PathBuf,
    /// Shared secret for the admin gate. `None` locks the admin surface.
    pub admin_password: Option<String>,
    /// Target of the fixed statements.
    pub query_target: QueryTarget,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "query-console".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connections_file: PathBuf::from(DEFAULT_CONNECTIONS_FILE),
            admin_password: None,
            query_target: QueryTarget::default(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Loads configuration for the named service.
    ///
    /// Reads `.env` first (missing file is fine), then the process environment.
    pub fn load_with_service(service_name: &str) -> AppResult<Self> {
        // A missing .env is the normal case in production.
        let _ = dotenvy::dotenv();
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("SERVER_PORT is not a port number: {}", raw)))?,
            None => defaults.port,
        };

        let log_format = match non_empty("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::Config(format!("unknown LOG_FORMAT: {}", other)));
            }
        };

        let target_defaults = QueryTarget::default();
        let query_target = QueryTarget {
            table: non_empty("QUERY_TABLE").unwrap_or(target_defaults.table),
            id_column: non_empty("QUERY_ID_COLUMN").unwrap_or(target_defaults.id_column),
            filter_column: non_empty("QUERY_FILTER_COLUMN").unwrap_or(target_defaults.filter_column),
        };
        query_target.validate()?;

        Ok(Self {
            service_name: service_name.to_string(),
            host: non_empty("SERVER_HOST").unwrap_or(defaults.host),
            port,
            connections_file: non_empty("CONNECTIONS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.connections_file),
            admin_password: non_empty("ADMIN_PASSWORD"),
            query_target,
            log_format,
        })
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
