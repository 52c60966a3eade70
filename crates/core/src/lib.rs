//! Core library for the Shizu event lineup assistant.
//!
//! The ledger keeps every known DJ and promo video under a unique name. A
//! lineup picks and orders entries from that ledger for one event and turns
//! them into the export document consumed by the playout side, probing
//! video files for their dimensions along the way.

pub mod config;
pub mod error;
pub mod export;
pub mod ledger;
pub mod lineup;
pub mod probe;

pub use config::{AppConfig, BackupConfig, ProbeConfig, RenamePolicy, StreamConfig};
pub use error::{EntryKind, Result, ShizuError};
pub use export::{DjExport, DjSource, Exporter, LineupExport, PromoExport};
pub use ledger::{
    DjRecord, DjUpdate, LedgerDocument, LedgerHandle, LedgerRegistry, LedgerSummary, PromoRecord,
    PromoUpdate,
};
pub use lineup::{Lineup, LineupDjEntry, LineupDocument, LineupSummary};
pub use probe::{FfprobeProbe, MediaProbe, NullProbe, Resolution, StaticProbe};
