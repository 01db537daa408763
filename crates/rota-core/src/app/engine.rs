//! DrawEngine: picks an undrawn name, persists it, resets on exhaustion.
//!
//! The engine keeps no decision state between calls. Every draw recomputes
//! availability from the store, so restarts cannot drift from what is
//! persisted.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::status::RosterStatus;
use crate::domain::{DrawOutcome, DrawRecord, Name, NameRoster, StoreError};
use crate::ports::{Chooser, Clock, DrawStore, SystemClock, ThreadRngChooser};

/// Roster names not yet drawn, in roster order, duplicates collapsed.
///
/// Used names outside the roster are ignored.
pub fn available_names(roster: &NameRoster, used: &[Name]) -> Vec<Name> {
    let used: HashSet<&Name> = used.iter().collect();
    roster
        .distinct()
        .into_iter()
        .filter(|name| !used.contains(name))
        .collect()
}

pub struct DrawEngine<S> {
    roster: NameRoster,
    store: S,
    clock: Arc<dyn Clock>,
    chooser: Arc<dyn Chooser>,
    /// Keeps load+append and load+clear of one draw from interleaving with
    /// another draw or reset on this engine.
    write_lock: Mutex<()>,
}

impl<S: DrawStore> DrawEngine<S> {
    pub fn new(roster: NameRoster, store: S) -> Self {
        Self {
            roster,
            store,
            clock: Arc::new(SystemClock),
            chooser: Arc::new(ThreadRngChooser),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn Chooser>) -> Self {
        self.chooser = chooser;
        self
    }

    pub fn roster(&self) -> &NameRoster {
        &self.roster
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ensure the backing table/file exists. Call once at startup.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.store.initialize().await?;
        info!(roster_size = self.roster.distinct().len(), "draw store ready");
        Ok(())
    }

    /// Draw one name.
    ///
    /// Storage failures are reported as `DrawOutcome::Failed`; no retry is
    /// attempted and nothing is persisted.
    pub async fn draw(&self) -> DrawOutcome {
        let _guard = self.write_lock.lock().await;
        match self.try_draw().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "draw failed");
                DrawOutcome::Failed(e)
            }
        }
    }

    async fn try_draw(&self) -> Result<DrawOutcome, StoreError> {
        let used = self.store.used_names().await?;
        let available = available_names(&self.roster, &used);
        debug!(
            drawn = used.len(),
            available = available.len(),
            "computed availability"
        );

        if available.is_empty() {
            self.store.clear_all().await?;
            warn!(cleared = used.len(), "every name has been drawn; starting a new cycle");
            return Ok(DrawOutcome::ExhaustedAndReset);
        }

        let selected = available[self.chooser.choose_index(available.len())].clone();
        let record = self.store.append(&selected, self.clock.now()).await?;
        info!(name = %selected, id = %record.id, "name drawn");
        Ok(DrawOutcome::Selected {
            name: selected,
            record,
        })
    }

    /// Clear every record. Safe to call on an empty store.
    pub async fn reset_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.clear_all().await?;
        info!("draw history cleared");
        Ok(())
    }

    /// Records, most recent first.
    pub async fn history(&self) -> Result<Vec<DrawRecord>, StoreError> {
        self.store.load_history().await
    }

    pub async fn status(&self) -> Result<RosterStatus, StoreError> {
        let used = self.store.used_names().await?;
        Ok(RosterStatus::from_used_names(&self.roster, &used))
    }

    /// Release the store's resources.
    pub async fn shutdown(&self) {
        self.store.close().await;
    }
}
