//! PgDrawStore - PostgreSQL の `used_names` テーブル
//!
//! # 実装詳細
//! - `sqlx::PgPool`（connect_lazy: 最初のクエリで接続）
//! - 各操作は単一ステートメントなのでそれ自体がアトミック
//! - `date` は TIMESTAMP（UTC, マイクロ秒精度）。append は DB に保存された値を返す

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use crate::domain::{ConfigError, CorruptRecord, DrawRecord, Name, RecordId, RecordScan, StoreError};
use crate::ports::DrawStore;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS used_names (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    date TIMESTAMP DEFAULT (now() AT TIME ZONE 'utc')
)";
/// Tables created by older deployments capped names at VARCHAR(50).
const WIDEN_NAME: &str = "ALTER TABLE used_names ALTER COLUMN name TYPE TEXT";
const SELECT_ALL: &str = "SELECT id, name, date FROM used_names ORDER BY id";
const INSERT_ONE: &str = "INSERT INTO used_names (name, date) VALUES ($1, $2) RETURNING id, date";
const DELETE_ALL: &str = "DELETE FROM used_names";

const MAX_CONNECTIONS: u32 = 5;

pub struct PgDrawStore {
    pool: PgPool,
}

impl PgDrawStore {
    /// Build a lazily-connecting pool for a `postgres://` URL.
    ///
    /// Must be called inside a tokio runtime. Reachability is only checked
    /// by the first operation (normally `initialize`).
    pub fn connect(url: &str) -> Result<Self, ConfigError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_lazy(url)
            .map_err(|e| ConfigError::InvalidConnectionTarget {
                kind: "relationalTable".to_string(),
                target: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn scan(&self) -> Result<RecordScan, StoreError> {
        let rows = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;
        Ok(RecordScan::collect(rows.iter().map(row_to_record)))
    }
}

fn row_to_record(row: &PgRow) -> Result<DrawRecord, CorruptRecord> {
    let id: i32 = row
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

    Ok(DrawRecord::new(
        RecordId::new(i64::from(id)),
        name,
        date.and_utc(),
    ))
}

#[async_trait]
impl DrawStore for PgDrawStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(WIDEN_NAME).execute(&self.pool).await?;
        tracing::debug!("ensured postgres table used_names");
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
        let id: i32 = row.try_get("id")?;
        let stored: NaiveDateTime = row.try_get("date")?;
        Ok(DrawRecord::new(
            RecordId::new(i64::from(id)),
            name.clone(),
            stored.and_utc(),
        ))
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        sqlx::query(DELETE_ALL).execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
