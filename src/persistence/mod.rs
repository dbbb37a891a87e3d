//! Persistence layer for the incident store.
//!
//! # File Layout
//!
//! ```text
//! <state_path>        # JSON snapshot of every incident record
//! <state_path>.tmp    # transient, only present mid-write
//! ```
//!
//! # Crash Safety
//!
//! Every upsert rewrites the snapshot with write-to-temp-then-rename and
//! fsyncs both the file and its directory, so a crash leaves either the old
//! or the new snapshot on disk. The in-memory map is only updated after the
//! write succeeds.

pub mod fsync;
pub mod snapshot;
pub mod store;

pub use snapshot::{SCHEMA_VERSION, SnapshotError, StoreSnapshot};
pub use store::{FileIncidentStore, IncidentStore, MemoryIncidentStore, StoreError};
