//! Memory tables, value stores and the per-run session
//!
//! Defines the append-only record tables, the typed side-value stores keyed
//! by record identity, feedback score propagation, and the session that owns
//! all of them for one run.

pub mod history;
pub mod scoring;
pub mod session;
pub mod table;
pub mod types;
pub mod values;

pub use history::HistoryEntry;
pub use scoring::{ScoreOrchestrator, ScoreReport, ScoringTables};
pub use session::{MemorySession, RETRIEVED_ADVICE_SOURCE, SessionStats, USER_ADVICE_SOURCE};
pub use table::{MemoryTable, cosine_similarity};
pub use types::{MemoryRecord, RecordId, RunId, Value, ValueKind};
pub use values::{ValueRecord, ValueStore};
