//! # chromap-core
//!
//! Core types for local-contrast chroma remapping.
//!
//! This crate provides the foundational types used by the remapping kernels:
//!
//! - [`Rect`] - integer pixel rectangles with intersection, enlarge and tiling
//! - [`Image`], [`Plane`], [`ColorImage`] - float buffers that know both their
//!   image bounds and the window of samples they actually store
//! - [`boundary`] - clamp-to-edge sampling used for every out-of-bounds read
//! - [`NeutralReference`] and [`luminance`] - the tint model and Rec.709 luma
//!
//! ## Crate Structure
//!
//! ```text
//! chromap-core (this crate)
//!    ^
//!    |
//!    +-- chromap-ops (gradients, region planning, kernels, composition)
//!    +-- chromap-cli (command-line front end)
//! ```
//!
//! ## Coordinates
//!
//! All coordinates are absolute image coordinates with (0, 0) at the top-left
//! and y growing downward. A buffer's window may start at any offset, including
//! negative ones, and pixel accessors always take absolute coordinates.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod boundary;
pub mod error;
pub mod image;
pub mod pixel;
pub mod rect;

// Re-exports for convenience
pub use error::*;
pub use image::*;
pub use pixel::{
    luminance, luminance_plane, luminance_row, NeutralReference, REC709_LUMA, REC709_LUMA_B, REC709_LUMA_G,
    REC709_LUMA_R,
};
pub use rect::*;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use chromap_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::boundary::{clamp_to_edge, sample};
    pub use crate::error::{Error, Result};
    pub use crate::image::{ColorImage, Image, Plane};
    pub use crate::pixel::{luminance, luminance_plane, NeutralReference};
    pub use crate::rect::Rect;
}
