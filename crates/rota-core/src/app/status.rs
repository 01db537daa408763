//! Status - 現在のサイクルの見える化
//!
//! 誰がもう引かれて、誰がまだ残っているかを表示用にまとめる。

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{CycleMode, DrawRecord, Name, NameRoster, NameState};

/// RosterStatus は store の内容を roster に照らした集計
///
/// # 使用例
/// ```ignore
/// let status = engine.status().await?;
/// println!("{} / {} drawn", status.drawn.len(), status.total);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterStatus {
    pub mode: CycleMode,
    /// Distinct roster names.
    pub total: usize,
    /// Drawn this cycle, roster order.
    pub drawn: Vec<Name>,
    /// Still available this cycle, roster order.
    pub available: Vec<Name>,
}

impl RosterStatus {
    pub fn from_records(roster: &NameRoster, records: &[DrawRecord]) -> Self {
        let used: Vec<Name> = records.iter().map(|r| r.name.clone()).collect();
        Self::from_used_names(roster, &used)
    }

    /// `used` may hold names of corrupt rows that have no `DrawRecord`.
    pub fn from_used_names(roster: &NameRoster, used: &[Name]) -> Self {
        let set: HashSet<&Name> = used.iter().collect();
        let (drawn, available): (Vec<Name>, Vec<Name>) = roster
            .distinct()
            .into_iter()
            .partition(|name| set.contains(name));
        Self {
            mode: CycleMode::from_record_count(used.len()),
            total: drawn.len() + available.len(),
            drawn,
            available,
        }
    }

    /// `None` when the name is not on the roster.
    pub fn state_of(&self, name: &Name) -> Option<NameState> {
        if self.available.contains(name) {
            Some(NameState::Available)
        } else if self.drawn.contains(name) {
            Some(NameState::Drawn)
        } else {
            None
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }
}
