//! # chromap-ops
//!
//! Local-contrast chroma remapping.
//!
//! Given a source image and an optional auxiliary ("reference") image, the
//! remap keeps the source luminance and adopts chroma from the reference,
//! scaled by how the local luminance gradient of the source compares to the
//! reference's. Flat or noisy reference regions no longer leak color into
//! detailed source regions.
//!
//! # Modules
//!
//! - [`gradient`] - relative gradient and image density estimators
//! - [`region`] - halo arithmetic and buffer coverage checks
//! - [`kernel`] - per-pixel chroma transfer with all technologies
//! - [`driver`] - row-streaming execution over an output rectangle
//! - [`parallel`] - tiled execution on the Rayon pool
//! - [`compose`] - whole-image composition graphs and the exposure map
//!
//! # Example
//!
//! ```rust
//! use chromap_core::{ColorImage, Rect};
//! use chromap_ops::{remap_images, RemapParams, Technology};
//!
//! let source = ColorImage::filled(Rect::from_size(8, 8), [0.5, 0.5, 0.5, 1.0]);
//! let reference = ColorImage::filled(Rect::from_size(8, 8), [0.8, 0.4, 0.2, 1.0]);
//!
//! let params = RemapParams {
//!     technology: Technology::ChromaTransfer,
//!     ..Default::default()
//! };
//! let out = remap_images(&source, Some(&reference), &params).unwrap();
//! assert_eq!(out.pixel(0, 0)[3], 1.0);
//! ```
//!
//! # Invocation contract
//!
//! ```rust,ignore
//! use chromap_ops::{remap, RegionPlanner};
//!
//! // Inputs must hold the output rect grown by the halo (clipped to bounds)
//! let planner = RegionPlanner::for_source(Some(&luma));
//! let needed = planner.required_input_for_output(tile);
//! remap(&luma, &color, Some(&aux), &mut out, tile, &params)?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod compose;
pub mod driver;
pub mod gradient;
pub mod kernel;
pub mod region;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use compose::{exposure_map, ExposureMapParams, Graph, NodeId, Op};
pub use driver::{remap, remap_images, DriverState, RemapInputs, RowStreamDriver};
pub use error::{OpsError, OpsResult};
pub use gradient::{image_density, relative_gradient};
pub use kernel::{ChromaTransferKernel, KernelInput, RemapParams, Technology};
pub use region::{RegionPlanner, HALO};

#[cfg(feature = "parallel")]
pub use parallel::{remap_images_tiled, remap_tiled};
