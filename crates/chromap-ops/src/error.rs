//! Error types for remapping operations.

use chromap_core::Rect;
use thiserror::Error;

/// Error type for remapping operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Parameter outside its documented range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A supplied buffer does not cover the region an invocation reads or writes.
    #[error("{pad}: required region {required} not available in {available}")]
    RegionUnavailable {
        /// Which buffer fell short ("source", "aux", "output", ...)
        pad: &'static str,
        /// Region the invocation needs
        required: Rect,
        /// Window the buffer actually holds
        available: Rect,
    },

    /// Malformed composition graph.
    #[error("graph error: {0}")]
    Graph(String),

    /// Buffer-level error from chromap-core.
    #[error(transparent)]
    Core(#[from] chromap_core::Error),
}

/// Result type for remapping operations.
pub type OpsResult<T> = Result<T, OpsError>;
