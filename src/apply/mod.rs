//! Apply Module
//!
//! The replicated state machine side of a cell: usage metrics, the per-entry
//! apply context, the sequential apply path, and the background task that
//! hands accumulated metrics to shard-lifecycle logic.
//!
//! ```text
//! committed entries ──> CellStateMachine ──> CommandExecutor
//!                             │
//!                             │ pending ApplyMetrics
//!                             ▼
//!                       MetricsReporter ──> split / compaction consumer
//! ```

pub mod context;
pub mod metrics;
pub mod reporter;
pub mod state_machine;

pub use context::ApplyContext;
pub use metrics::{payload_len, ApplyMetrics};
pub use reporter::{CellReport, MetricsReporter, MetricsSource, ReporterConfig};
pub use state_machine::{AppliedBatch, CellStateMachine};
