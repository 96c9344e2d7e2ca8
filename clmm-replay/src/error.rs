//! Centralized error types for the replay service.

use thiserror::Error;

/// Top-level replay error, wrapping `clmm_core::Error` alongside the
/// service's own storage/ingest/configuration failure modes.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("pool engine error: {0}")]
    Core(#[from] clmm_core::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("ingest error: {0}")]
    Ingest(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReplayError>;
