//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **DrawEngine**: 抽選（draw / reset_all / history / status）
//! - **EngineBuilder**: 設定から store と engine を組み立てる
//! - **RosterStatus**: 現在のサイクルの集計

pub mod builder;
pub mod engine;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{DynDrawEngine, EngineBuilder, open_store};
pub use self::engine::{DrawEngine, available_names};
pub use self::status::RosterStatus;
