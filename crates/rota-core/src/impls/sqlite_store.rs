//! SqliteDrawStore - 組み込みの `used_names` テーブル
//!
//! 1 接続のプールで書き込みを直列化する。

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::domain::{ConfigError, CorruptRecord, DrawRecord, Name, RecordId, RecordScan, StoreError};
use crate::ports::DrawStore;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS used_names (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";
const SELECT_ALL: &str = "SELECT id, name, date FROM used_names ORDER BY id";
const INSERT_ONE: &str = "INSERT INTO used_names (name, date) VALUES (?, ?) RETURNING id, date";
const DELETE_ALL: &str = "DELETE FROM used_names";

pub struct SqliteDrawStore {
    pool: SqlitePool,
}

impl SqliteDrawStore {
    /// Lazily connect to a `sqlite:` URL. The database file is created on
    /// first use if missing.
    pub fn connect(url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidConnectionTarget {
            kind: "relationalTable".to_string(),
            target: url.to_string(),
            reason,
        };
        if !url.starts_with("sqlite:") {
            return Err(invalid("expected a sqlite: URL".to_string()));
        }
        let options = SqliteConnectOptions::from_str(url).map_err(|e| invalid(e.to_string()))?;
        Ok(Self::with_options(options))
    }

    pub fn open_path(path: impl AsRef<Path>) -> Self {
        Self::with_options(SqliteConnectOptions::new().filename(path))
    }

    fn with_options(options: SqliteConnectOptions) -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy_with(options.create_if_missing(true));
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn scan(&self) -> Result<RecordScan, StoreError> {
        let rows = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;
        Ok(RecordScan::collect(rows.iter().map(row_to_record)))
    }
}

fn row_to_record(row: &SqliteRow) -> Result<DrawRecord, CorruptRecord> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| CorruptRecord::new("used_names", format!("unreadable id: {e}")))?;
    let location = format!("used_names id={id}");
    let name: String = row
        .try_get("name")
        .map_err(|e| CorruptRecord::new(location.clone(), format!("unreadable name: {e}")))?;
    let name = Name::from(name);
    let date: Option<NaiveDateTime> = row.try_get("date").map_err(|e| {
        CorruptRecord::new(location.clone(), format!("unreadable date: {e}"))
            .with_name(Some(name.clone()))
    })?;
    let date = date
        .ok_or_else(|| CorruptRecord::new(location, "date is NULL").with_name(Some(name.clone())))?;

    Ok(DrawRecord::new(RecordId::new(id), name, date.and_utc()))
}

#[async_trait]
impl DrawStore for SqliteDrawStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        tracing::debug!("ensured sqlite table used_names");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError> {
        Ok(self.scan().await?.records)
    }

    async fn used_names(&self) -> Result<Vec<Name>, StoreError> {
        Ok(self.scan().await?.used_names())
    }

    async fn append(&self, name: &Name, at: DateTime<Utc>) -> Result<DrawRecord, StoreError> {
        let row = sqlx::query(INSERT_ONE)
            .bind(name.as_str())
            .bind(at.naive_utc())
            .fetch_one(&self.pool)
            .await?;
        let id: i64 = row.try_get("id")?;
        let stored: NaiveDateTime = row.try_get("date")?;
        Ok(DrawRecord::new(RecordId::new(id), name.clone(), stored.and_utc()))
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        sqlx::query(DELETE_ALL).execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
