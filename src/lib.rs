//! Aula - on-device behavioral analytics engine for classroom monitoring
//!
//! Aula turns noisy per-frame vision signals (who is visible, a raw
//! hand-raised flag, head-pose angles) into durable behavioral events and
//! per-person session summaries through a deterministic pipeline:
//! attention scoring → debounced event confirmation → per-entity
//! aggregation → session report.
//!
//! ## Modules
//!
//! - **debounce**: hysteresis state machine confirming discrete events
//! - **attention**: head-pose angles to a 0-100 attention score
//! - **session**: per-entity accumulation, attendance ledger, fan-out
//! - **report**: end-of-session reduction into behavior-log entries
//! - **monitor**: owned-session facade with concurrent snapshot reads
//! - **schema**: vision.frame.v1 records for offline replay

pub mod attention;
pub mod collaborators;
pub mod config;
pub mod debounce;
pub mod error;
pub mod monitor;
pub mod report;
pub mod schema;
pub mod session;
pub mod types;

pub use attention::AttentionScorer;
pub use config::{AttentionConfig, DebounceConfig, EngineConfig};
pub use debounce::{DetectorState, EventDebouncer};
pub use error::EngineError;
pub use monitor::BehaviorMonitor;
pub use report::SessionReportGenerator;
pub use session::Session;

// Schema exports
pub use schema::{FrameLog, FrameLogAdapter, FrameRecord, SCHEMA_VERSION};

/// Aula version embedded in session reports and CLI output
pub const AULA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports and diagnostics
pub const PRODUCER_NAME: &str = "aula";
