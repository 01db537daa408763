//! EngineBuilder - 設定から DrawEngine を組み立てる
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - storage kind ごとの DrawStore 選択

use std::sync::Arc;

use crate::config::{RelationalBackend, RotaConfig, StorageKind};
use crate::domain::ConfigError;
use crate::impls::{CsvDrawStore, InMemoryDrawStore, PgDrawStore, SqliteDrawStore};
use crate::ports::{Chooser, Clock, DrawStore};

use super::engine::DrawEngine;

/// Engine over whichever store the configuration selected.
pub type DynDrawEngine = DrawEngine<Arc<dyn DrawStore>>;

/// Build the store named by the configuration.
///
/// Relational stores connect lazily, so an unreachable database surfaces
/// later as `StoreError::Unavailable` from `initialize`, not here.
/// Must be called inside a tokio runtime.
pub fn open_store(config: &RotaConfig) -> Result<Arc<dyn DrawStore>, ConfigError> {
    let target = config.connection_target.trim();
    let store: Arc<dyn DrawStore> = match config.storage_kind {
        StorageKind::Memory => Arc::new(InMemoryDrawStore::new()),
        StorageKind::File => Arc::new(CsvDrawStore::new(target)),
        StorageKind::RelationalTable => match RelationalBackend::from_url(target) {
            Some(RelationalBackend::Postgres) => Arc::new(PgDrawStore::connect(target)?),
            Some(RelationalBackend::Sqlite) => Arc::new(SqliteDrawStore::connect(target)?),
            None => {
                return Err(ConfigError::InvalidConnectionTarget {
                    kind: config.storage_kind.to_string(),
                    target: target.to_string(),
                    reason: "expected a postgres:// or sqlite: URL".to_string(),
                });
            }
        },
    };
    Ok(store)
}

/// EngineBuilder は設定を検証して DrawEngine を生成
///
/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::new(RotaConfig::from_path("rota.json")?)
///     .build()?;
/// engine.initialize().await?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に roster と connection target を検証
/// - 不正なら ConfigError を返し、draw は一度も実行されない
pub struct EngineBuilder {
    config: RotaConfig,
    clock: Option<Arc<dyn Clock>>,
    chooser: Option<Arc<dyn Chooser>>,
}

impl EngineBuilder {
    pub fn new(config: RotaConfig) -> Self {
        Self {
            config,
            clock: None,
            chooser: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn chooser(mut self, chooser: Arc<dyn Chooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    pub fn build(self) -> Result<DynDrawEngine, ConfigError> {
        let roster = self.config.validate()?;
        let store = open_store(&self.config)?;
        tracing::debug!(
            storage_kind = %self.config.storage_kind,
            roster_size = roster.len(),
            "building draw engine"
        );

        let mut engine = DrawEngine::new(roster, store);
        if let Some(clock) = self.clock {
            engine = engine.with_clock(clock);
        }
        if let Some(chooser) = self.chooser {
            engine = engine.with_chooser(chooser);
        }
        Ok(engine)
    }
}
