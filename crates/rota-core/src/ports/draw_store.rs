//! DrawStore port - 抽選記録の正本（source of truth）
//!
//! DrawStore は以下を管理します：
//! - 抽選記録（DrawRecord）の読み込み・追加・全削除
//! - 保存先の初期化（テーブル / ファイルの作成）
//!
//! # 実装
//! - `InMemoryDrawStore`: 開発・テスト用
//! - `CsvDrawStore`: `Name,Date` ヘッダーの CSV ファイル
//! - `SqliteDrawStore` / `PgDrawStore`: `used_names` テーブル

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{DrawRecord, Name, StoreError, sort_newest_first};

/// DrawStore は抽選記録を永続化する
///
/// # 設計原則
/// - `append` / `clear_all` はアトミック（失敗時は呼び出し前の状態のまま）
/// - `load_all` は空のとき空の Vec を返す（エラーにしない）
/// - 壊れた行はスキップしてログに出す（load 全体は中断しない）
/// - 壊れた行でも名前が読めるなら `used_names()` には含める
#[async_trait]
pub trait DrawStore: Send + Sync {
    /// Create the table/file if absent. Never destroys existing records.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Every stored record, in a stable order (by id).
    async fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError>;

    /// Persist one record and return it with its assigned id.
    async fn append(&self, name: &Name, at: DateTime<Utc>) -> Result<DrawRecord, StoreError>;

    /// Remove every record.
    async fn clear_all(&self) -> Result<(), StoreError>;

    /// Names that count as drawn this cycle. Includes names recovered from
    /// corrupt rows that `load_all` skips.
    async fn used_names(&self) -> Result<Vec<Name>, StoreError> {
        Ok(self.load_all().await?.into_iter().map(|r| r.name).collect())
    }

    /// Records ordered by `drawn_at`, most recent first.
    async fn load_history(&self) -> Result<Vec<DrawRecord>, StoreError> {
        let mut records = self.load_all().await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Release pools or handles. Further calls are not expected afterwards.
    async fn close(&self) {}
}

#[async_trait]
impl<S: DrawStore + ?Sized> DrawStore for Arc<S> {
    async fn initialize(&self) -> Result<(), StoreError> {
        (**self).initialize().await
    }

    async fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError> {
        (**self).load_all().await
    }

    async fn append(&self, name: &Name, at: DateTime<Utc>) -> Result<DrawRecord, StoreError> {
        (**self).append(name, at).await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        (**self).clear_all().await
    }

    async fn used_names(&self) -> Result<Vec<Name>, StoreError> {
        (**self).used_names().await
    }

    async fn load_history(&self) -> Result<Vec<DrawRecord>, StoreError> {
        (**self).load_history().await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
