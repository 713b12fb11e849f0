//! Live-tree synchronization.
//!
//! Two halves: skill directory sync (copy/remove/reconcile whole skill
//! directories) and tracked file placement (agent and command documents,
//! ownership- and integrity-gated). Both sides never touch content this
//! system does not own.

pub mod files;
pub mod skills;

pub use files::{FileMapping, PlaceOutcome, RemoveOutcome, manifest_mappings, place_files, remove_files};
pub use skills::{SyncOutcome, UnsyncOutcome, resync, sync, unsync};
