//! vision.frame.v1 schema support
//!
//! Frame record definitions and the adapter for replaying captured logs
//! through the pipeline.

pub mod adapter;
pub mod frame;

pub use adapter::{FrameLog, FrameLogAdapter, ValidationResult};
pub use frame::{FrameRecord, ValidationError, SCHEMA_VERSION};
