//! State - 名前ごとの状態とサイクル全体のモード
//!
//! # 状態遷移
//! - 名前: Available -> Drawn（draw 成功時）
//! - 全体: 全員 Drawn -> clear_all -> 全員 Available（draw 内で自動、または reset_all で強制）

use serde::{Deserialize, Serialize};

/// NameState は 1 つの名前の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameState {
    Available,
    Drawn,
}

/// CycleMode はサイクル全体のモード
///
/// - Cycling: 少なくとも 1 件の記録がある
/// - JustReset: 記録が空（起動直後・リセット直後）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    Cycling,
    JustReset,
}

impl CycleMode {
    pub fn from_record_count(count: usize) -> Self {
        if count == 0 {
            CycleMode::JustReset
        } else {
            CycleMode::Cycling
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_means_just_reset() {
        assert_eq!(CycleMode::from_record_count(0), CycleMode::JustReset);
        assert_eq!(CycleMode::from_record_count(2), CycleMode::Cycling);
    }
}
