//! InMemoryDrawStore - 開発用・テスト用の正本
//!
//! # 学習ポイント
//! - tokio::sync::Mutex による排他制御
//! - 障害注入（fail_next_append など）で原子性をテスト

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{DrawRecord, Name, RecordId, StoreError};
use crate::ports::DrawStore;

#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    fail_next_append: bool,
    fail_next_clear: bool,
}

#[derive(Debug)]
struct InMemoryState {
    records: Vec<DrawRecord>,
    /// Never reset, so ids stay unique across clears.
    next_id: i64,
    faults: Faults,
}

/// InMemoryDrawStore は Vec に記録を保持する
///
/// プロセス終了で記録は消える。`memory` storage kind と、テストでの
/// 障害シミュレーションに使う。
#[derive(Debug)]
pub struct InMemoryDrawStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryDrawStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                records: Vec::new(),
                next_id: 1,
                faults: Faults::default(),
            }),
        }
    }

    /// Seed with pre-existing records (e.g. state left by an earlier run).
    pub fn with_records(records: Vec<DrawRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id.value()).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(InMemoryState {
                records,
                next_id,
                faults: Faults::default(),
            }),
        }
    }

    /// While set, every operation fails with `StoreError::Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.faults.unavailable = unavailable;
    }

    /// The next `append` fails without persisting anything.
    pub async fn fail_next_append(&self) {
        self.state.lock().await.faults.fail_next_append = true;
    }

    /// The next `clear_all` fails without removing anything.
    pub async fn fail_next_clear(&self) {
        self.state.lock().await.faults.fail_next_clear = true;
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }
}

impl Default for InMemoryDrawStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_available(state: &InMemoryState) -> Result<(), StoreError> {
    if state.faults.unavailable {
        return Err(StoreError::unavailable("in-memory store marked unavailable"));
    }
    Ok(())
}

#[async_trait]
impl DrawStore for InMemoryDrawStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        check_available(&*self.state.lock().await)
    }

    async fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError> {
        let state = self.state.lock().await;
        check_available(&state)?;
        Ok(state.records.clone())
    }

    async fn append(&self, name: &Name, at: DateTime<Utc>) -> Result<DrawRecord, StoreError> {
        let mut state = self.state.lock().await;
        check_available(&state)?;
        if std::mem::take(&mut state.faults.fail_next_append) {
            return Err(StoreError::unavailable("injected append failure"));
        }

        let record = DrawRecord::new(RecordId::new(state.next_id), name.clone(), at);
        state.next_id += 1;
        state.records.push(record.clone());
        Ok(record)
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        check_available(&state)?;
        if std::mem::take(&mut state.faults.fail_next_clear) {
            return Err(StoreError::unavailable("injected clear failure"));
        }
        state.records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids() {
        let store = InMemoryDrawStore::new();
        let a = store.append(&Name::from("Alice"), t0()).await.unwrap();
        let b = store.append(&Name::from("Bob"), t0()).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.load_all().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn ids_stay_unique_across_clear() {
        let store = InMemoryDrawStore::new();
        let a = store.append(&Name::from("Alice"), t0()).await.unwrap();
        store.clear_all().await.unwrap();
        let b = store.append(&Name::from("Alice"), t0()).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let store = InMemoryDrawStore::new();
        store.append(&Name::from("Alice"), t0()).await.unwrap();
        store
            .append(&Name::from("Bob"), t0() + Duration::hours(1))
            .await
            .unwrap();

        let history = store.load_history().await.unwrap();
        assert_eq!(history[0].name, "Bob");
        assert_eq!(history[1].name, "Alice");
    }

    #[tokio::test]
    async fn injected_append_failure_persists_nothing() {
        let store = InMemoryDrawStore::new();
        store.append(&Name::from("Alice"), t0()).await.unwrap();
        let before = store.load_all().await.unwrap();

        store.fail_next_append().await;
        let err = store.append(&Name::from("Bob"), t0()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.load_all().await.unwrap(), before);

        // one-shot: the following append succeeds
        store.append(&Name::from("Bob"), t0()).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_operation() {
        let store = InMemoryDrawStore::new();
        store.set_unavailable(true).await;
        assert!(store.initialize().await.is_err());
        assert!(store.load_all().await.is_err());
        assert!(store.clear_all().await.is_err());

        store.set_unavailable(false).await;
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeded_records_continue_the_id_sequence() {
        let seeded = DrawRecord::new(RecordId::new(5), Name::from("Alice"), t0());
        let store = InMemoryDrawStore::with_records(vec![seeded]);
        let next = store.append(&Name::from("Bob"), t0()).await.unwrap();
        assert_eq!(next.id, RecordId::new(6));
    }
}
