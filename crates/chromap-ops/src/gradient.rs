//! Local gradient estimation over a three-row sliding window.
//!
//! Every kernel in this crate looks at the same 4-neighborhood of a
//! luminance sample:
//!
//! ```text
//!            top[x]
//!   mid[x-1]  mid[x]  mid[x+1]
//!           bottom[x]
//! ```
//!
//! From it the estimator derives a central-difference gradient magnitude
//! normalized by the local mean, i.e. a *relative* (contrast) gradient:
//!
//! ```text
//! dx   = mid[x-1] - mid[x+1]
//! dy   = top[x]   - bottom[x]
//! sum  = mid[x-1] + mid[x+1] + top[x] + bottom[x]
//! grad = sqrt(dx² + dy²) * (4 / sum) * 0.5      (0 when |sum| <= 1e-4)
//! ```
//!
//! Rows are kept in a [`RowWindow`]: three owned buffers that rotate instead
//! of being reallocated as the scan moves down.
//!
//! # Filters
//!
//! - [`relative_gradient`] - the gradient above as an image
//! - [`image_density`] - `sqrt(1 + (grad * max_dim)²)`, the local stretch of
//!   the image relative to a flat map

use chromap_core::{boundary, Plane, Rect};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::region::{self, RegionPlanner};
use crate::OpsResult;

/// Magnitude below which a neighborhood sum counts as zero.
pub const GRADIENT_EPSILON: f32 = 1e-4;

/// Gradient magnitude and neighborhood sum at one sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalGradient {
    /// Relative gradient magnitude (0 in flat or black neighborhoods).
    pub magnitude: f32,
    /// Sum of the four direct neighbors.
    pub local_sum: f32,
}

impl LocalGradient {
    /// Whether the neighborhood sum was too small to normalize by.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.local_sum.abs() <= GRADIENT_EPSILON
    }
}

/// Estimates the relative gradient at column `x` of `mid`.
///
/// `x` indexes the row buffers directly, so `1 <= x < len - 1` must hold.
#[inline]
pub fn estimate(top: &[f32], mid: &[f32], bottom: &[f32], x: usize) -> LocalGradient {
    let left = mid[x - 1];
    let right = mid[x + 1];
    let up = top[x];
    let down = bottom[x];

    let dx = left - right;
    let dy = up - down;
    let local_sum = left + right + up + down;

    let magnitude = if local_sum.abs() > GRADIENT_EPSILON {
        (dx * dx + dy * dy).sqrt() * (4.0 / local_sum) * 0.5
    } else {
        0.0
    };

    LocalGradient {
        magnitude,
        local_sum,
    }
}

/// Three owned row buffers of one luminance plane.
///
/// ```text
/// rotate():  top <- mid, mid <- bottom, bottom <- old top (recycled)
/// ```
#[derive(Debug, Clone)]
pub struct RowWindow {
    rows: [Vec<f32>; 3],
}

impl RowWindow {
    /// Allocates three zeroed rows of `width` samples.
    pub fn new(width: usize) -> Self {
        Self {
            rows: [vec![0.0; width], vec![0.0; width], vec![0.0; width]],
        }
    }

    /// Samples per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Row above the current one.
    #[inline]
    pub fn top(&self) -> &[f32] {
        &self.rows[0]
    }

    /// Current row.
    #[inline]
    pub fn mid(&self) -> &[f32] {
        &self.rows[1]
    }

    /// Row below the current one.
    #[inline]
    pub fn bottom(&self) -> &[f32] {
        &self.rows[2]
    }

    /// Mutable top row, used while priming.
    #[inline]
    pub fn top_mut(&mut self) -> &mut [f32] {
        &mut self.rows[0]
    }

    /// Mutable current row, used while priming.
    #[inline]
    pub fn mid_mut(&mut self) -> &mut [f32] {
        &mut self.rows[1]
    }

    /// Mutable bottom row; receives the next scan line.
    #[inline]
    pub fn bottom_mut(&mut self) -> &mut [f32] {
        &mut self.rows[2]
    }

    /// Advances the window one row down without reallocating.
    #[inline]
    pub fn rotate(&mut self) {
        self.rows.rotate_left(1);
    }

    /// Gradient at buffer column `x` of the current row.
    #[inline]
    pub fn estimate(&self, x: usize) -> LocalGradient {
        estimate(self.top(), self.mid(), self.bottom(), x)
    }
}

/// Runs `f` over every pixel of `rect` with the plane's row window.
///
/// `f` maps each local gradient to the output sample; results land in a new
/// plane whose window is `rect`.
fn scan_plane<F>(plane: &Plane, rect: Rect, mut f: F) -> OpsResult<Plane>
where
    F: FnMut(LocalGradient) -> f32,
{
    let mut out = Plane::from_window(plane.bounds(), rect, vec![0.0; rect.area() as usize])?;
    if rect.is_empty() {
        return Ok(out);
    }

    let x0 = rect.x - region::HALO as i32;
    let mut window = RowWindow::new(rect.width as usize + 2 * region::HALO as usize);
    boundary::read_row(plane, x0, rect.y - 1, window.top_mut());
    boundary::read_row(plane, x0, rect.y, window.mid_mut());

    for y in rect.y..rect.bottom() {
        boundary::read_row(plane, x0, y + 1, window.bottom_mut());
        let row = out.row_mut(y);
        for (i, v) in row.iter_mut().enumerate() {
            let x = i + region::HALO as usize;
            *v = f(window.estimate(x));
        }
        window.rotate();
    }

    Ok(out)
}

/// Resolves the part of `rect` a whole-plane filter computes and checks the
/// plane holds its halo.
fn filter_region(plane: &Plane, rect: Rect) -> OpsResult<Rect> {
    let planner = RegionPlanner::new(plane.bounds());
    let active = planner.active_output(rect);
    region::ensure_available("input", plane, planner.required_input_for_output(rect))?;
    Ok(active)
}

/// Relative gradient magnitude of `plane` over `rect`.
///
/// Only the part of `rect` inside the plane's bounds is computed; the result
/// keeps the input's bounds and stores exactly that part.
///
/// # Errors
///
/// [`OpsError::RegionUnavailable`](crate::OpsError::RegionUnavailable) if the
/// plane's window lacks the 1-pixel halo around `rect`.
///
/// # Example
///
/// ```rust
/// use chromap_core::{Plane, Rect};
/// use chromap_ops::gradient::relative_gradient;
///
/// let flat = Plane::filled(Rect::from_size(8, 8), [0.3]);
/// let grad = relative_gradient(&flat, flat.bounds()).unwrap();
/// assert!(grad.data().iter().all(|&g| g == 0.0));
/// ```
pub fn relative_gradient(plane: &Plane, rect: Rect) -> OpsResult<Plane> {
    let active = filter_region(plane, rect)?;
    trace!(rect = %active, "relative_gradient");
    scan_plane(plane, active, |g| g.magnitude)
}

/// Image density of `plane` over `rect`.
///
/// `sqrt(1 + 0.25 * (dx² + dy²) * (4 / sum)² * max_dim²)` where `max_dim` is
/// the longer side of the plane's bounding box. Flat or black neighborhoods
/// have density 1.
///
/// # Errors
///
/// Same as [`relative_gradient`].
pub fn image_density(plane: &Plane, rect: Rect) -> OpsResult<Plane> {
    let active = filter_region(plane, rect)?;
    let bounds = plane.bounds();
    let max_dim = bounds.width.max(bounds.height) as f32;
    trace!(rect = %active, max_dim, "image_density");
    scan_plane(plane, active, |g| {
        if g.is_degenerate() {
            1.0
        } else {
            let stretch = g.magnitude * max_dim;
            (1.0 + stretch * stretch).sqrt()
        }
    })
}
