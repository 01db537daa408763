//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（ファイル, SQLite, PostgreSQL, 乱数, 時刻）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - DrawStore が source of truth（正本）
//! - DrawEngine は呼び出し間で状態を持たない

pub mod draw_store;
pub mod clock;
pub mod chooser;

// 主要な trait を再エクスポート
pub use self::draw_store::DrawStore;
pub use self::clock::{Clock, SystemClock, FixedClock};
pub use self::chooser::{Chooser, SeededChooser, ThreadRngChooser};
