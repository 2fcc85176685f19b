// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
///
/// Edit operations themselves never fail; they clamp or reject. These errors
/// describe bad input arriving at the edges of the engine (time strings,
/// configuration values, identifiers named on the command line).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),
    /// Invalid time range
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),
    /// Referenced clip does not exist
    #[error("Clip not found: {0}")]
    ClipNotFound(String),
    /// Referenced assembly item does not exist
    #[error("Assembly item not found: {0}")]
    ItemNotFound(String),
    /// An edit was rejected by the assembly rules
    #[error("Edit rejected: {0}")]
    EditRejected(String),
}
