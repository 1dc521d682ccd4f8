//! The two fixed statements.
//!
//! Nothing else is ever sent to a data store. Identifiers come from the
//! startup [`QueryTarget`]; the filter value is always a bound parameter.

use common::config::QueryTarget;
use common::errors::{AppError, AppResult};

/// Row cap for [`QueryTemplate::RecentRows`].
pub const RECENT_ROWS_LIMIT: usize = 20;

/// SQL dialect, derived from the DSN scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Picks the dialect for a DSN such as `postgres://…` or `sqlite:path`.
    ///
    /// # Errors
    /// `AppError::DatabaseConnection` for schemes no driver is built for.
    pub fn from_dsn(dsn: &str) -> AppResult<Self> {
        let scheme = dsn
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| AppError::DatabaseConnection("DSN has no scheme".into()))?;

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(AppError::DatabaseConnection(format!(
                "unsupported DSN scheme: {}",
                other
            ))),
        }
    }

    /// Placeholder for the first positional parameter.
    fn first_placeholder(self) -> &'static str {
        match self {
            Dialect::Postgres => "$1",
            Dialect::MySql | Dialect::Sqlite => "?",
        }
    }
}

/// One of the two statements the console can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTemplate {
    /// Latest rows by identifier, newest first, capped at [`RECENT_ROWS_LIMIT`].
    RecentRows,
    /// Rows whose filter column equals the value.
    FilterByValue(String),
}

impl QueryTemplate {
    /// Maps the form's inputs onto a template.
    pub fn select(filter_value: &str, skip_filter: bool) -> Self {
        if skip_filter {
            QueryTemplate::RecentRows
        } else {
            QueryTemplate::FilterByValue(filter_value.to_string())
        }
    }

    /// Statement text for `target` in `dialect`.
    pub fn sql(&self, target: &QueryTarget, dialect: Dialect) -> String {
        match self {
            QueryTemplate::RecentRows => format!(
                "SELECT * FROM {} ORDER BY {} DESC LIMIT {}",
                target.table, target.id_column, RECENT_ROWS_LIMIT
            ),
            QueryTemplate::FilterByValue(_) => format!(
                "SELECT * FROM {} WHERE {} = {}",
                target.table,
                target.filter_column,
                dialect.first_placeholder()
            ),
        }
    }

    /// Value to bind as the first parameter, if any.
    pub fn bind_value(&self) -> Option<&str> {
        match self {
            QueryTemplate::RecentRows => None,
            QueryTemplate::FilterByValue(value) => Some(value),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            QueryTemplate::RecentRows => "recent_rows",
            QueryTemplate::FilterByValue(_) => "filter_by_value",
        }
    }
}
