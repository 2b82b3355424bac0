//! Error types for batch lookups

use thiserror::Error;

/// Errors that can occur before a batch run starts
#[derive(Debug, Error)]
pub enum BatchError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
