//! Application error types.
//!
//! Every fallible operation in the console returns [`AppResult`]. Errors that
//! reach the HTTP layer are rendered with a generic, client-safe message; the
//! detail carried by the variant is only ever written to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field was missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested connection name is not registered.
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    /// The data store could not be reached.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// A statement failed to execute.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// Reading or writing the connections file failed.
    ///
    /// Logged by the registry and never surfaced to a caller.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// The admin gate rejected the request.
    #[error("unauthorized")]
    Unauthorized,

    /// An identifier destined for a statement was rejected.
    #[error("unsafe sql: {0}")]
    UnsafeSql(String),

    /// Startup configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Page rendering or other unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status class for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ConnectionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::DatabaseConnection(_)
            | AppError::DatabaseQuery(_)
            | AppError::Persistence(_)
            | AppError::UnsafeSql(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ConnectionNotFound(_) => "NOT_FOUND",
            AppError::DatabaseConnection(_) => "CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "QUERY_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::UnsafeSql(_) => "UNSAFE_SQL",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message that is safe to show to the client.
    ///
    /// Validation messages are echoed because they describe the caller's own
    /// input; everything else collapses to a fixed sentence.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::ConnectionNotFound(_) => "Selected database not found".to_string(),
            AppError::DatabaseConnection(_) => "Failed to connect to the database".to_string(),
            AppError::DatabaseQuery(_) => "Failed to execute query".to_string(),
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Persistence(_)
            | AppError::UnsafeSql(_)
            | AppError::Config(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Logs the full error; server faults at error level, client errors at warn.
    pub fn log(&self) {
        if self.status_code().is_server_error() {
            tracing::error!(code = self.code(), error = %self, "请求处理失败");
        } else {
            tracing::warn!(code = self.code(), error = %self, "请求被拒绝");
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect::<Vec<_>>();
        // Fields sharing one message (name and dsn) report it once.
        messages.sort();
        messages.dedup();
        AppError::Validation(messages.join("; "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let body = ApiResponse::err(self.code(), self.public_message());
        (self.status_code(), Json(body)).into_response()
    }
}
