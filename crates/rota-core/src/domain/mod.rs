//! Domain model (names, roster, records, outcomes, errors).
//!
//! Storage-agnostic: nothing here knows about files, tables, or drivers.

pub mod errors;
pub mod name;
pub mod outcome;
pub mod record;
pub mod roster;
pub mod state;

pub use self::errors::{ConfigError, CorruptRecord, StoreError};
pub use self::name::Name;
pub use self::outcome::DrawOutcome;
pub use self::record::{DrawRecord, RecordId, RecordScan, sort_newest_first};
pub use self::roster::NameRoster;
pub use self::state::{CycleMode, NameState};
