//! Query dispatcher.
//!
//! Resolves a connection name, opens a one-off connection with the driver
//! matching the DSN scheme, runs one of the fixed statements and projects
//! each row onto three text columns.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};
use uuid::Uuid;

use common::config::QueryTarget;
use common::errors::{AppError, AppResult};
use common::models::query::QueryResultRow;

use crate::registry::ConnectionRegistry;
use crate::statements::{Dialect, QueryTemplate};

/// Open connection to one of the supported data stores.
pub enum DataStoreConnection {
    Postgres(PgConnection),
    MySql(MySqlConnection),
    Sqlite(SqliteConnection),
}

impl DataStoreConnection {
    async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            DataStoreConnection::Postgres(conn) => conn.close().await,
            DataStoreConnection::MySql(conn) => conn.close().await,
            DataStoreConnection::Sqlite(conn) => conn.close().await,
        }
    }
}

/// Opens data-store connections from a DSN.
#[async_trait]
pub trait DataStoreConnector: Send + Sync {
    /// Opens a fresh connection. The caller owns and closes it.
    async fn connect(&self, dialect: Dialect, dsn: &str) -> AppResult<DataStoreConnection>;
}

/// Connector backed by sqlx's postgres, mysql and sqlite drivers.
#[derive(Debug, Default)]
pub struct SqlxConnector;

impl SqlxConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataStoreConnector for SqlxConnector {
    async fn connect(&self, dialect: Dialect, dsn: &str) -> AppResult<DataStoreConnection> {
        let conn = match dialect {
            Dialect::Postgres => PgConnection::connect(dsn)
                .await
                .map(DataStoreConnection::Postgres),
            Dialect::MySql => MySqlConnection::connect(dsn)
                .await
                .map(DataStoreConnection::MySql),
            Dialect::Sqlite => SqliteConnection::connect(dsn)
                .await
                .map(DataStoreConnection::Sqlite),
        };
        conn.map_err(|e| AppError::DatabaseConnection(e.to_string()))
    }
}

/// Rows that scanned, plus how many did not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScannedRows {
    pub rows: Vec<QueryResultRow>,
    pub skipped: usize,
}

/// Runs the fixed statements against registered connections.
pub struct QueryDispatcher {
    registry: Arc<ConnectionRegistry>,
    connector: Arc<dyn DataStoreConnector>,
    target: QueryTarget,
}

impl QueryDispatcher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        connector: Arc<dyn DataStoreConnector>,
        target: QueryTarget,
    ) -> Self {
        Self {
            registry,
            connector,
            target,
        }
    }

    /// Runs the recent-rows statement when `skip_filter` is set, otherwise
    /// the filter statement with `filter_value` bound.
    ///
    /// Rows that fail to scan are logged, counted and skipped. An unknown
    /// `connection_name` fails before any connection is attempted.
    pub async fn execute(
        &self,
        connection_name: &str,
        filter_value: &str,
        skip_filter: bool,
    ) -> AppResult<ScannedRows> {
        let dsn = self.registry.resolve(connection_name).await?;
        let template = QueryTemplate::select(filter_value, skip_filter);

        let dialect = Dialect::from_dsn(&dsn).inspect_err(|e| {
            tracing::error!(connection = %connection_name, error = %e, "Database connection error");
        })?;
        let sql = template.sql(&self.target, dialect);

        let mut conn = self.connector.connect(dialect, &dsn).await.inspect_err(|e| {
            tracing::error!(connection = %connection_name, error = %e, "Database connection error");
        })?;

        let fetched = fetch_and_scan(&mut conn, &sql, &template, connection_name).await;
        if let Err(e) = conn.close().await {
            tracing::warn!(connection = %connection_name, error = %e, "Failed to close connection cleanly");
        }

        let scanned = fetched.map_err(|e| {
            tracing::error!(
                connection = %connection_name,
                template = template.label(),
                error = %e,
                "Query execution error"
            );
            AppError::DatabaseQuery(e.to_string())
        })?;

        tracing::info!(
            connection = %connection_name,
            template = template.label(),
            returned = scanned.rows.len(),
            skipped = scanned.skipped,
            "Query executed"
        );
        Ok(scanned)
    }
}

/// Runs `sql` on the concrete driver and scans the rows it returns.
///
/// Only fetching can fail here; decoding happens per row afterwards.
async fn fetch_and_scan(
    conn: &mut DataStoreConnection,
    sql: &str,
    template: &QueryTemplate,
    connection_name: &str,
) -> Result<ScannedRows, sqlx::Error> {
    let value = template.bind_value();
    let scanned = match conn {
        DataStoreConnection::Postgres(conn) => {
            let mut query = sqlx::query(sql);
            if let Some(value) = value {
                query = query.bind(value);
            }
            let rows = query.fetch_all(conn).await?;
            scan_rows(&rows, pg_column_text, connection_name)
        }
        DataStoreConnection::MySql(conn) => {
            let mut query = sqlx::query(sql);
            if let Some(value) = value {
                query = query.bind(value);
            }
            let rows = query.fetch_all(conn).await?;
            scan_rows(&rows, mysql_column_text, connection_name)
        }
        DataStoreConnection::Sqlite(conn) => {
            let mut query = sqlx::query(sql);
            if let Some(value) = value {
                query = query.bind(value);
            }
            let rows = query.fetch_all(conn).await?;
            scan_rows(&rows, sqlite_column_text, connection_name)
        }
    };
    Ok(scanned)
}

fn scan_rows<R, F>(rows: &[R], column_text: F, connection_name: &str) -> ScannedRows
where
    R: Row,
    F: Fn(&R, usize) -> Result<String, sqlx::Error>,
{
    let mut scanned = ScannedRows {
        rows: Vec::with_capacity(rows.len()),
        skipped: 0,
    };
    for (index, row) in rows.iter().enumerate() {
        match scan_row(row, &column_text) {
            Ok(row) => scanned.rows.push(row),
            Err(e) => {
                tracing::warn!(connection = %connection_name, row = index, error = %e, "Row scan error");
                scanned.skipped += 1;
            }
        }
    }
    scanned
}

/// Projects the first three columns of `row` onto text.
fn scan_row<R, F>(row: &R, column_text: &F) -> Result<QueryResultRow, sqlx::Error>
where
    F: Fn(&R, usize) -> Result<String, sqlx::Error>,
{
    Ok(QueryResultRow {
        column1: column_text(row, 0)?,
        column2: column_text(row, 1)?,
        column3: column_text(row, 2)?,
    })
}

/// Returns early with the column as text if it decodes as one of the types.
/// NULL decodes as any of them and becomes an empty string.
macro_rules! return_if_decodes {
    ($row:expr, $index:expr, [$($ty:ty),+ $(,)?]) => {
        $(
            if let Ok(value) = $row.try_get::<Option<$ty>, _>($index) {
                return Ok(value.map(|v| v.to_string()).unwrap_or_default());
            }
        )+
    };
}

fn pg_column_text(row: &PgRow, index: usize) -> Result<String, sqlx::Error> {
    return_if_decodes!(
        row,
        index,
        [i64, i32, i16, f64, f32, bool, NaiveDateTime, DateTime<Utc>, NaiveDate, NaiveTime, Uuid]
    );
    row.try_get::<Option<String>, _>(index)
        .map(Option::unwrap_or_default)
}

fn mysql_column_text(row: &MySqlRow, index: usize) -> Result<String, sqlx::Error> {
    return_if_decodes!(
        row,
        index,
        [i64, u64, f64, f32, NaiveDateTime, DateTime<Utc>, NaiveDate, NaiveTime]
    );
    row.try_get::<Option<String>, _>(index)
        .map(Option::unwrap_or_default)
}

// SQLite checks the stored value, not the declared column type, so a
// DATETIME column holding text decodes as a string.
fn sqlite_column_text(row: &SqliteRow, index: usize) -> Result<String, sqlx::Error> {
    return_if_decodes!(row, index, [i64, f64]);
    row.try_get::<Option<String>, _>(index)
        .map(Option::unwrap_or_default)
}
