//! Impls - DrawStore の実装
//!
//! # 含まれる実装
//! - **InMemoryDrawStore**: 開発・テスト用（障害注入つき）
//! - **CsvDrawStore**: フラットファイル
//! - **SqliteDrawStore**: 組み込みテーブル
//! - **PgDrawStore**: リモートの PostgreSQL テーブル

pub mod inmem_store;
pub mod csv_store;
pub mod sqlite_store;
pub mod pg_store;

// 主要な型を再エクスポート
pub use self::inmem_store::InMemoryDrawStore;
pub use self::csv_store::CsvDrawStore;
pub use self::sqlite_store::SqliteDrawStore;
pub use self::pg_store::PgDrawStore;
