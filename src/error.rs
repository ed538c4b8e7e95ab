//! Error types for Aula

use thiserror::Error;

/// Errors that can occur in the behavioral engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse frame log: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid frame record: {0}")]
    InvalidFrame(String),

    #[error("No monitoring session is active")]
    NoActiveSession,

    #[error("A monitoring session is already active")]
    SessionAlreadyActive,

    #[error("Cannot start a session: no identities registered in the roster")]
    EmptyRoster,

    #[error("Roster query failed: {0}")]
    RosterError(String),

    #[error("Collaborator failure: {0}")]
    CollaboratorError(String),
}
