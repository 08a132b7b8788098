//! Error types for chromap-core.
//!
//! Buffer construction and region access are the only fallible operations in
//! this crate. Numeric degeneracies (near-zero divisors, flat regions) are never
//! errors; they are absorbed where they occur.
//!
//! # Usage
//!
//! ```rust
//! use chromap_core::{Error, Rect, Result};
//!
//! fn check(window: Rect, needed: Rect) -> Result<()> {
//!     if !window.contains_rect(&needed) {
//!         return Err(Error::RegionUnavailable { needed, window });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(Rect::from_size(4, 4), Rect::new(-1, 0, 2, 2)).is_err());
//! ```

use crate::Rect;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or accessing image buffers.
#[derive(Debug, Error)]
pub enum Error {
    /// A region was requested that the buffer does not hold.
    ///
    /// Returned when a host asks for an output region whose required input
    /// (including halo) is not covered by the supplied buffer window.
    #[error("region {needed} is not available in window {window}")]
    RegionUnavailable {
        /// Region that was requested
        needed: Rect,
        /// Window of stored samples
        window: Rect,
    },

    /// Invalid image dimensions.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Sample buffer length doesn't match the window and channel count.
    #[error("data length {got} does not match {expected} samples for {window}")]
    DataLength {
        /// Expected number of samples
        expected: usize,
        /// Supplied number of samples
        got: usize,
        /// Window the data was meant for
        window: Rect,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }
}
