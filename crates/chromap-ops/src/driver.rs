//! Row-streaming execution of the chroma transfer kernel.
//!
//! One invocation computes one output rectangle:
//!
//! ```text
//! Init       resolve the input rect, allocate rows once
//! Priming    load top/mid luminance rows of source and aux
//! Streaming  per scan line: load bottom rows and color rows,
//!            run the kernel per column, emit the row, rotate
//! Done       buffers dropped with the driver
//! ```
//!
//! Rows are read through the clamp-to-edge policy, so the halo outside the
//! image repeats the edge. Nothing survives an invocation; disjoint output
//! rectangles can run concurrently (see [`crate::parallel`]).
//!
//! # Example
//!
//! ```rust
//! use chromap_core::{ColorImage, Rect};
//! use chromap_ops::{remap_images, RemapParams};
//!
//! let source = ColorImage::filled(Rect::from_size(16, 16), [0.4, 0.4, 0.4, 1.0]);
//! let reference = ColorImage::filled(Rect::from_size(16, 16), [0.6, 0.3, 0.2, 1.0]);
//! let out = remap_images(&source, Some(&reference), &RemapParams::default()).unwrap();
//! assert_eq!(out.bounds(), source.bounds());
//! ```

use chromap_core::{boundary, luminance_plane, ColorImage, Plane, Rect};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::gradient::RowWindow;
use crate::kernel::{ChromaTransferKernel, KernelInput, RemapParams};
use crate::region::{self, RegionPlanner, HALO};
use crate::OpsResult;

/// Images one invocation reads.
#[derive(Debug, Clone, Copy)]
pub struct RemapInputs<'a> {
    /// Source luminance; its bounds are the output's bounding box.
    pub source_luma: &'a Plane,
    /// Source color, read for alpha.
    pub source_color: &'a ColorImage,
    /// Reference color; absent reads as zero.
    pub aux: Option<&'a ColorImage>,
}

impl<'a> RemapInputs<'a> {
    /// Bundles the inputs of one invocation.
    pub fn new(source_luma: &'a Plane, source_color: &'a ColorImage, aux: Option<&'a ColorImage>) -> Self {
        Self {
            source_luma,
            source_color,
            aux,
        }
    }

    /// Planner over the source bounding box.
    pub fn planner(&self) -> RegionPlanner {
        RegionPlanner::new(self.source_luma.bounds())
    }

    /// Checks every input holds what computing `output_rect` reads.
    ///
    /// # Errors
    ///
    /// [`OpsError::RegionUnavailable`](crate::OpsError::RegionUnavailable)
    /// naming the first input that falls short.
    pub fn check(&self, output_rect: Rect) -> OpsResult<()> {
        let planner = self.planner();
        let required = planner.required_input_for_output(output_rect);
        let active = planner.active_output(output_rect);
        region::ensure_available("source", self.source_luma, required)?;
        region::ensure_available("source color", self.source_color, active)?;
        if let Some(aux) = self.aux {
            region::ensure_available("aux", aux, required)?;
        }
        Ok(())
    }
}

/// Stage of a [`RowStreamDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Buffers allocated, nothing read yet.
    Init,
    /// Top and middle luminance rows loaded, no row emitted yet.
    Priming,
    /// Emitting rows; holds the next output row.
    Streaming(i32),
    /// Every row emitted.
    Done,
}

/// Streams the kernel over one rectangle, one output row at a time.
#[derive(Debug)]
pub struct RowStreamDriver<'a> {
    inputs: RemapInputs<'a>,
    kernel: ChromaTransferKernel,
    rect: Rect,
    state: DriverState,
    source_rows: RowWindow,
    aux_rows: RowWindow,
    aux_scratch: Vec<f32>,
    source_color: Vec<f32>,
    aux_color: Vec<f32>,
    out_row: Vec<f32>,
}

impl<'a> RowStreamDriver<'a> {
    /// Allocates buffers for computing `rect`, which must lie inside the
    /// source bounding box and have its halo available (see
    /// [`RemapInputs::check`]).
    pub fn new(inputs: RemapInputs<'a>, kernel: ChromaTransferKernel, rect: Rect) -> Self {
        let out_width = rect.width as usize;
        let in_width = out_width + 2 * HALO as usize;
        let aux_scratch = if inputs.aux.is_some() {
            vec![0.0; in_width * 4]
        } else {
            Vec::new()
        };
        Self {
            inputs,
            kernel,
            rect,
            state: if rect.is_empty() {
                DriverState::Done
            } else {
                DriverState::Init
            },
            source_rows: RowWindow::new(in_width),
            aux_rows: RowWindow::new(in_width),
            aux_scratch,
            source_color: vec![0.0; out_width * 4],
            aux_color: vec![0.0; out_width * 4],
            out_row: vec![0.0; out_width * 4],
        }
    }

    /// Current stage.
    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Rectangle being computed.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    fn halo_x(&self) -> i32 {
        self.rect.x - HALO as i32
    }

    fn read_luma_rows(&mut self, y: i32, slot: fn(&mut RowWindow) -> &mut [f32]) {
        let x0 = self.halo_x();
        boundary::read_row(self.inputs.source_luma, x0, y, slot(&mut self.source_rows));
        if let Some(aux) = self.inputs.aux {
            boundary::read_luma_row(aux, x0, y, &mut self.aux_scratch, slot(&mut self.aux_rows));
        }
    }

    /// Loads the rows above and at the first output row.
    ///
    /// Only acts in [`DriverState::Init`]; [`next_row`](Self::next_row)
    /// calls it when needed.
    pub fn prime(&mut self) {
        if self.state != DriverState::Init {
            return;
        }
        let y = self.rect.y;
        trace!(rect = %self.rect, "priming row window");
        self.read_luma_rows(y - 1, RowWindow::top_mut);
        self.read_luma_rows(y, RowWindow::mid_mut);
        self.state = DriverState::Priming;
    }

    /// Computes the next output row.
    ///
    /// Returns its y coordinate and RGBA samples for `rect().x..rect().right()`,
    /// or `None` once every row has been emitted.
    pub fn next_row(&mut self) -> Option<(i32, &[f32])> {
        self.prime();
        let y = match self.state {
            DriverState::Priming => self.rect.y,
            DriverState::Streaming(y) => y,
            DriverState::Init | DriverState::Done => return None,
        };

        self.read_luma_rows(y + 1, RowWindow::bottom_mut);
        let x = self.rect.x;
        boundary::read_row(self.inputs.source_color, x, y, &mut self.source_color);
        if let Some(aux) = self.inputs.aux {
            boundary::read_row(aux, x, y, &mut self.aux_color);
        }

        let src = &self.source_rows;
        let aux = &self.aux_rows;
        for (i, out) in self.out_row.chunks_exact_mut(4).enumerate() {
            let col = i + HALO as usize;
            let ca = &self.aux_color[i * 4..i * 4 + 3];
            let input = KernelInput {
                source_luma: src.mid()[col],
                aux_luma: aux.mid()[col],
                source_gradient: src.estimate(col).magnitude,
                aux_gradient: aux.estimate(col).magnitude,
                aux_color: [ca[0], ca[1], ca[2]],
                alpha: self.source_color[i * 4 + 3],
            };
            out.copy_from_slice(&self.kernel.apply(&input));
        }

        self.source_rows.rotate();
        self.aux_rows.rotate();
        self.state = if y + 1 < self.rect.bottom() {
            DriverState::Streaming(y + 1)
        } else {
            DriverState::Done
        };
        Some((y, self.out_row.as_slice()))
    }
}

/// Fills the parts of `rect` outside `active` with transparent black.
fn clear_outside(output: &mut ColorImage, rect: Rect, active: Rect) -> OpsResult<()> {
    if rect == active || rect.is_empty() {
        return Ok(());
    }
    let zeros = vec![0.0; rect.width as usize * 4];
    for y in rect.y..rect.bottom() {
        if active.is_empty() || y < active.y || y >= active.bottom() {
            output.write_row(y, rect.x, &zeros)?;
            continue;
        }
        let left = (active.x - rect.x) as usize;
        let right = (rect.right() - active.right()) as usize;
        output.write_row(y, rect.x, &zeros[..left * 4])?;
        output.write_row(y, active.right(), &zeros[..right * 4])?;
    }
    Ok(())
}

/// Runs the chroma transfer over `output_rect`.
///
/// Pixels of `output_rect` outside the source bounding box are written as
/// transparent black. All regions are checked before the first write, so a
/// failed call leaves `output` untouched.
///
/// # Errors
///
/// - [`OpsError::InvalidParameter`](crate::OpsError::InvalidParameter) for
///   out-of-range `params`
/// - [`OpsError::RegionUnavailable`](crate::OpsError::RegionUnavailable) when
///   an input lacks the halo around `output_rect` or `output` cannot hold it
pub fn remap(
    source_luma: &Plane,
    source_color: &ColorImage,
    aux: Option<&ColorImage>,
    output: &mut ColorImage,
    output_rect: Rect,
    params: &RemapParams,
) -> OpsResult<()> {
    params.validate()?;
    let inputs = RemapInputs::new(source_luma, source_color, aux);
    region::ensure_writable("output", output, output_rect)?;
    inputs.check(output_rect)?;

    let active = inputs.planner().active_output(output_rect);
    trace!(
        output = %output_rect,
        active = %active,
        technology = %params.technology,
        aux = aux.is_some(),
        "remap"
    );

    clear_outside(output, output_rect, active)?;

    let kernel = ChromaTransferKernel::new(params);
    let mut driver = RowStreamDriver::new(inputs, kernel, active);
    while let Some((y, row)) = driver.next_row() {
        output.write_row(y, active.x, row)?;
    }
    Ok(())
}

/// Remaps a whole image: derives the source luminance, runs over the full
/// bounding box and returns the result.
///
/// # Errors
///
/// Same as [`remap`].
pub fn remap_images(
    source: &ColorImage,
    aux: Option<&ColorImage>,
    params: &RemapParams,
) -> OpsResult<ColorImage> {
    let luma = luminance_plane(source);
    let bounds = source.bounds();
    debug!(bounds = %bounds, "remap_images");
    let mut output = ColorImage::new(bounds);
    remap(&luma, source, aux, &mut output, bounds, params)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Technology;
    use crate::OpsError;
    use approx::assert_abs_diff_eq;

    fn gray(w: u32, h: u32, y: f32) -> ColorImage {
        ColorImage::filled(Rect::from_size(w, h), [y, y, y, 1.0])
    }

    #[test]
    fn test_gray_scenario() {
        let src = gray(3, 3, 0.5);
        let out = remap_images(&src, Some(&src), &RemapParams::default()).unwrap();
        assert_eq!(out.pixel(1, 1), [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_driver_states() {
        let src = gray(4, 2, 0.5);
        let luma = luminance_plane(&src);
        let inputs = RemapInputs::new(&luma, &src, None);
        let kernel = ChromaTransferKernel::new(&RemapParams::default());
        let mut driver = RowStreamDriver::new(inputs, kernel, src.bounds());
        assert_eq!(driver.state(), DriverState::Init);
        driver.prime();
        assert_eq!(driver.state(), DriverState::Priming);
        driver.prime();
        assert_eq!(driver.state(), DriverState::Priming);

        let (y, row) = driver.next_row().unwrap();
        assert_eq!(y, 0);
        assert_eq!(row.len(), 16);
        assert_eq!(driver.state(), DriverState::Streaming(1));
        assert_eq!(driver.next_row().map(|(y, _)| y), Some(1));
        assert_eq!(driver.state(), DriverState::Done);
        assert!(driver.next_row().is_none());
    }

    #[test]
    fn test_empty_rect_is_done() {
        let src = gray(4, 4, 0.5);
        let luma = luminance_plane(&src);
        let inputs = RemapInputs::new(&luma, &src, None);
        let kernel = ChromaTransferKernel::new(&RemapParams::default());
        let mut driver = RowStreamDriver::new(inputs, kernel, Rect::EMPTY);
        assert_eq!(driver.state(), DriverState::Done);
        assert!(driver.next_row().is_none());
    }

    #[test]
    fn test_absent_aux_gives_tinted_gray() {
        let src = ColorImage::filled(Rect::from_size(5, 5), [0.8, 0.4, 0.2, 0.75]);
        let out = remap_images(&src, None, &RemapParams::default()).unwrap();
        let y = chromap_core::luminance([0.8, 0.4, 0.2]);
        for (_, _, px) in out.pixels() {
            for c in 0..3 {
                assert_abs_diff_eq!(px[c], y, epsilon = 1e-6);
            }
            assert_eq!(px[3], 0.75);
        }
    }

    #[test]
    fn test_outside_bounds_cleared() {
        let src = gray(4, 4, 0.5);
        let luma = luminance_plane(&src);
        let mut out = ColorImage::filled(Rect::new(-2, -2, 8, 8), [9.0; 4]);
        remap(&luma, &src, Some(&src), &mut out, Rect::new(-2, -2, 8, 8), &RemapParams::default())
            .unwrap();
        assert_eq!(out.pixel(-1, 0), [0.0; 4]);
        assert_eq!(out.pixel(5, 5), [0.0; 4]);
        assert_eq!(out.pixel(2, -2), [0.0; 4]);
        assert_eq!(out.pixel(0, 0), [0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_failure_leaves_output_untouched() {
        let src = gray(8, 8, 0.5);
        let luma = luminance_plane(&src);
        let tile = luma.crop(Rect::new(2, 2, 4, 4)).unwrap();
        let mut out = ColorImage::filled(src.bounds(), [7.0; 4]);
        let err = remap(&tile, &src, None, &mut out, Rect::new(2, 2, 4, 4), &RemapParams::default())
            .unwrap_err();
        assert!(matches!(err, OpsError::RegionUnavailable { pad: "source", .. }));
        assert!(out.data().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_output_window_checked() {
        let src = gray(8, 8, 0.5);
        let luma = luminance_plane(&src);
        let mut out = ColorImage::new(Rect::from_size(4, 4));
        let err = remap(&luma, &src, None, &mut out, src.bounds(), &RemapParams::default())
            .unwrap_err();
        assert!(matches!(err, OpsError::RegionUnavailable { pad: "output", .. }));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let src = gray(3, 3, 0.5);
        let params = RemapParams {
            global_saturation: 6.0,
            ..Default::default()
        };
        assert!(matches!(
            remap_images(&src, None, &params),
            Err(OpsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_aux_gradient_technology() {
        // Horizontal ramp in the aux image
        let mut aux = gray(5, 3, 0.0);
        for (x, y) in aux.bounds().iter_coords().collect::<Vec<_>>() {
            let v = 0.2 + 0.1 * x as f32;
            aux.set_pixel(x, y, [v, v, v, 1.0]);
        }
        let src = gray(5, 3, 0.5);
        let params = RemapParams {
            technology: Technology::AuxGradient,
            ..Default::default()
        };
        let out = remap_images(&src, Some(&aux), &params).unwrap();
        let grad = crate::gradient::relative_gradient(&luminance_plane(&aux), aux.bounds()).unwrap();
        for (x, y, px) in out.pixels() {
            assert_eq!(px[0], grad.pixel(x, y)[0]);
        }
    }
}
