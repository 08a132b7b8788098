//! Region planning for neighborhood kernels.
//!
//! Every output pixel reads its four direct neighbors, so producing a region
//! needs the region plus a 1-pixel halo of input. The planner answers the
//! three questions a host scheduler asks:
//!
//! - [`bounding_box`](RegionPlanner::bounding_box): where is the output defined?
//! - [`required_input_for_output`](RegionPlanner::required_input_for_output):
//!   what input must be available to compute a region?
//! - [`invalidated_by_change`](RegionPlanner::invalidated_by_change): which
//!   output goes stale when an input region changes?
//!
//! ```text
//! required = enlarge(output ∩ bounds, 1)      (empty if output ∩ bounds is)
//! invalid  = enlarge(changed, 1)
//! ```
//!
//! Intersection with the bounding box happens before enlargement, so asking
//! for a region wholly outside the image requires nothing.

use chromap_core::{Image, Plane, Rect};

use crate::{OpsError, OpsResult};

/// Neighborhood radius of every kernel in this crate.
pub const HALO: u32 = 1;

/// Answers region queries for one source bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionPlanner {
    bounds: Rect,
}

impl RegionPlanner {
    /// Planner for a source whose bounding box is `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }

    /// Planner for a possibly absent source; no source means an empty box.
    pub fn for_source(source: Option<&Plane>) -> Self {
        Self::new(source.map(Plane::bounds).unwrap_or(Rect::EMPTY))
    }

    /// The output's bounding box, equal to the source's.
    #[inline]
    pub fn bounding_box(&self) -> Rect {
        self.bounds
    }

    /// Part of `output` that lies inside the bounding box.
    #[inline]
    pub fn active_output(&self, output: Rect) -> Rect {
        output.intersect(&self.bounds).unwrap_or(Rect::EMPTY)
    }

    /// Input needed to compute `output`: `(output ∩ bounds)` enlarged by one
    /// pixel on every side, or the empty rectangle if the intersection is empty.
    ///
    /// ```rust
    /// use chromap_core::Rect;
    /// use chromap_ops::region::RegionPlanner;
    ///
    /// let planner = RegionPlanner::new(Rect::from_size(100, 100));
    /// assert_eq!(
    ///     planner.required_input_for_output(Rect::new(10, 10, 20, 20)),
    ///     Rect::new(9, 9, 22, 22)
    /// );
    /// ```
    pub fn required_input_for_output(&self, output: Rect) -> Rect {
        match output.intersect(&self.bounds) {
            Some(active) => active.enlarge(HALO),
            None => Rect::EMPTY,
        }
    }

    /// Output region affected by a change of `input`: `input` enlarged by one.
    ///
    /// Applied to every rectangle, so an empty change at `(x, y)` still
    /// invalidates the 2x2 block around that corner.
    pub fn invalidated_by_change(&self, input: Rect) -> Rect {
        input.enlarge(HALO)
    }
}

/// Checks that `image` stores every sample it may be asked for inside `needed`.
///
/// Reads are clamped to the image's bounds first, so only `needed ∩ bounds`
/// has to be present in the window.
///
/// # Errors
///
/// [`OpsError::RegionUnavailable`] naming `pad` when samples are missing.
pub fn ensure_available<const N: usize>(
    pad: &'static str,
    image: &Image<N>,
    needed: Rect,
) -> OpsResult<()> {
    let Some(required) = needed.intersect(&image.bounds()) else {
        return Ok(());
    };
    if image.window().contains_rect(&required) {
        Ok(())
    } else {
        Err(OpsError::RegionUnavailable {
            pad,
            required,
            available: image.window(),
        })
    }
}

/// Checks that `image` can receive writes for all of `rect`.
///
/// # Errors
///
/// [`OpsError::RegionUnavailable`] naming `pad` when `rect` leaves the window.
pub fn ensure_writable<const N: usize>(
    pad: &'static str,
    image: &Image<N>,
    rect: Rect,
) -> OpsResult<()> {
    if image.window().contains_rect(&rect) {
        Ok(())
    } else {
        Err(OpsError::RegionUnavailable {
            pad,
            required: rect,
            available: image.window(),
        })
    }
}
