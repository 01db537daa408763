//! Chooser port - ランダム選択の抽象化
//!
//! 候補集合からの一様ランダム選択を差し替え可能にします。
//! - ThreadRngChooser（本番用）
//! - SeededChooser（テスト用、決定的）

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooser は `0..len` から一様に 1 つのインデックスを選ぶ
///
/// `len` は常に 1 以上で呼ばれる。
pub trait Chooser: Send + Sync {
    fn choose_index(&self, len: usize) -> usize;
}

/// ThreadRngChooser は `rand::thread_rng` を使う
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngChooser;

impl Chooser for ThreadRngChooser {
    fn choose_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// SeededChooser はシードから決定的な列を生成する
#[derive(Debug)]
pub struct SeededChooser {
    rng: Mutex<StdRng>,
}

impl SeededChooser {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Chooser for SeededChooser {
    fn choose_index(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .gen_range(0..len)
    }
}
