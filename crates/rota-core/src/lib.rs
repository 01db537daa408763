//! rota-core
//!
//! Draw-without-replacement over a fixed roster of names, with the draw
//! history kept in a pluggable store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Name, NameRoster, DrawRecord, DrawOutcome, errors）
//! - **ports**: 抽象化レイヤー（DrawStore, Clock, Chooser）
//! - **app**: アプリケーションロジック（DrawEngine, EngineBuilder, RosterStatus）
//! - **impls**: DrawStore の実装（InMemory / CSV / SQLite / PostgreSQL）
//! - **config**: 起動時に一度だけ読む設定

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
pub mod config;

pub use app::{DrawEngine, EngineBuilder, RosterStatus};
pub use config::{RotaConfig, StorageKind};
pub use domain::{ConfigError, DrawOutcome, DrawRecord, Name, NameRoster, StoreError};
