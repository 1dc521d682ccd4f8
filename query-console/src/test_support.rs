//! SQLite fixtures shared by the unit and router tests.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};

use common::config::QueryTarget;

/// Target matching the table created by [`seed_sms`].
pub fn sms_target() -> QueryTarget {
    QueryTarget {
        table: "sms".into(),
        id_column: "ID".into(),
        filter_column: "MOBILE".into(),
    }
}

/// Opens (creating if needed) the SQLite file at `path`.
pub async fn open_sqlite(path: &Path) -> SqliteConnection {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap()
}

/// DSN the registry stores for the SQLite file at `path`.
pub fn sqlite_dsn(path: &Path) -> String {
    format!("sqlite:{}", path.display())
}

/// Creates `sms(ID, MOBILE, BODY)` with `count` rows; even IDs share one number.
pub async fn seed_sms(path: &Path, count: i64) {
    let mut conn = open_sqlite(path).await;
    sqlx::query("CREATE TABLE sms (ID INTEGER PRIMARY KEY, MOBILE TEXT NOT NULL, BODY TEXT)")
        .execute(&mut conn)
        .await
        .unwrap();
    for id in 1..=count {
        let mobile = if id % 2 == 0 { "0700000000" } else { "0711111111" };
        sqlx::query("INSERT INTO sms (ID, MOBILE, BODY) VALUES (?, ?, ?)")
            .bind(id)
            .bind(mobile)
            .bind(format!("message {}", id))
            .execute(&mut conn)
            .await
            .unwrap();
    }
    conn.close().await.unwrap();
}
