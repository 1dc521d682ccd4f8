//! Fixed-query models.
//!
//! The console runs one of two predetermined statements; these types carry
//! the caller's choice in and the three projected columns out.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// JSON request body for running the fixed query.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// Name of the registered connection to use.
    #[validate(length(min = 1, message = "Connection name is required"))]
    pub connection: String,

    /// Value compared against the filter column. Ignored when `skip_filter` is set.
    #[serde(default)]
    pub value: String,

    /// Return the most recent rows instead of filtering.
    #[serde(default)]
    pub skip_filter: bool,
}

/// Form body posted by the query page.
#[derive(Debug, Deserialize)]
pub struct FetchForm {
    /// Selected connection name.
    #[serde(default)]
    pub database: String,
    /// Filter value.
    #[serde(default)]
    pub value: String,
    /// Checkbox; browsers send `on` when ticked and omit the field otherwise.
    #[serde(default, rename = "executeWithoutValue")]
    pub execute_without_value: Option<String>,
}

impl FetchForm {
    /// Whether the "execute without value" box was ticked.
    pub fn skip_filter(&self) -> bool {
        self.execute_without_value.as_deref() == Some("on")
    }
}

/// One result row, projected onto three text columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QueryResultRow {
    pub column1: String,
    pub column2: String,
    pub column3: String,
}

/// Result envelope for the JSON query endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Returned rows.
    pub rows: Vec<QueryResultRow>,

    /// Number of rows returned.
    pub row_count: usize,

    /// Rows dropped because they could not be scanned.
    pub skipped_rows: usize,

    /// Query execution time in milliseconds.
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Wraps dispatcher output with its timing.
    pub fn new(rows: Vec<QueryResultRow>, skipped_rows: usize, execution_time_ms: u64) -> Self {
        Self {
            row_count: rows.len(),
            rows,
            skipped_rows,
            execution_time_ms,
        }
    }
}
