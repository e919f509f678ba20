//! Error types for the intake core.

use crate::application::state::{FormStep, WizardState};
use crate::application::suggestion::SuggestionCategory;
use crate::application::validator::FieldErrors;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Snapshot storage errors. Never surfaced to the person filling the form.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by the AI suggestion or registration collaborators.
///
/// The state machine is left untouched when one of these is returned, so
/// the same action can be retried.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} rejected the request (HTTP {status_code}): {message}")]
    Rejected {
        service: &'static str,
        status_code: u16,
        message: String,
    },

    #[error("{service} returned an empty response")]
    EmptyResponse { service: &'static str },

    #[error("{service} response discarded: the application was reset while it was in flight")]
    Discarded { service: &'static str },
}

/// Rejected state-machine operations.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("Operation '{operation}' is not allowed while {state}")]
    NotAllowed {
        operation: &'static str,
        state: WizardState,
    },

    #[error("Step validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Another request is still in flight")]
    Busy,

    #[error("Unknown field '{field}' for step {step}")]
    UnknownField { step: FormStep, field: String },

    #[error("No pending suggestion for {category}")]
    NoPendingSuggestion { category: SuggestionCategory },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
