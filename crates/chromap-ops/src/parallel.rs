//! Parallel tiled remapping using Rayon.
//!
//! The output rectangle is cut into tiles, each tile runs as an independent
//! [`remap`] invocation on the Rayon pool, and the finished tiles are pasted
//! into the destination. Every tile reads its own halo through the same
//! clamp-to-edge policy, so the stitched result is bit-identical to one
//! whole-rectangle invocation.
//!
//! # Example
//!
//! ```rust
//! use chromap_core::{luminance_plane, ColorImage, Rect};
//! use chromap_ops::{parallel, RemapParams};
//!
//! let src = ColorImage::filled(Rect::from_size(256, 256), [0.3, 0.3, 0.3, 1.0]);
//! let luma = luminance_plane(&src);
//! let mut out = ColorImage::new(src.bounds());
//! parallel::remap_tiled(&luma, &src, None, &mut out, src.bounds(), &RemapParams::default(), 64, 64)
//!     .unwrap();
//! ```

use chromap_core::{ColorImage, Plane, Rect};
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::driver::{remap, RemapInputs};
use crate::kernel::RemapParams;
use crate::region;
use crate::OpsResult;

/// Default tile edge used by hosts that don't pick their own.
pub const DEFAULT_TILE_SIZE: u32 = 128;

/// Tiled, parallel [`remap`].
///
/// Tiles are `tile_width x tile_height` (0 counts as 1), laid out row-major
/// from the top-left of `output_rect`. All regions are validated once up
/// front and tiles are stitched only after every tile succeeded, so a failed
/// call leaves `output` untouched.
///
/// # Errors
///
/// Same as [`remap`].
#[allow(clippy::too_many_arguments)]
pub fn remap_tiled(
    source_luma: &Plane,
    source_color: &ColorImage,
    aux: Option<&ColorImage>,
    output: &mut ColorImage,
    output_rect: Rect,
    params: &RemapParams,
    tile_width: u32,
    tile_height: u32,
) -> OpsResult<()> {
    params.validate()?;
    region::ensure_writable("output", output, output_rect)?;
    RemapInputs::new(source_luma, source_color, aux).check(output_rect)?;

    let tiles: Vec<Rect> = output_rect.tiles(tile_width, tile_height).collect();
    debug!(
        output = %output_rect,
        tiles = tiles.len(),
        tile_width,
        tile_height,
        "remap_tiled"
    );

    let bounds = output.bounds();
    let done = tiles
        .par_iter()
        .map(|&tile| -> OpsResult<ColorImage> {
            let mut buf = ColorImage::from_window(bounds, tile, vec![0.0; tile.area() as usize * 4])?;
            remap(source_luma, source_color, aux, &mut buf, tile, params)?;
            Ok(buf)
        })
        .collect::<OpsResult<Vec<_>>>()?;

    for tile in &done {
        output.paste(tile)?;
    }
    Ok(())
}

/// Tiled remap of a whole image with square tiles.
///
/// # Errors
///
/// Same as [`remap`].
pub fn remap_images_tiled(
    source: &ColorImage,
    aux: Option<&ColorImage>,
    params: &RemapParams,
    tile_size: u32,
) -> OpsResult<ColorImage> {
    let luma = chromap_core::luminance_plane(source);
    let bounds = source.bounds();
    let mut output = ColorImage::new(bounds);
    remap_tiled(&luma, source, aux, &mut output, bounds, params, tile_size, tile_size)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap_images;
    use crate::OpsError;

    fn noise(w: u32, h: u32, seed: u32) -> ColorImage {
        // Small LCG, enough to give every pixel a distinct gradient
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32
        };
        let mut img = ColorImage::new(Rect::from_size(w, h));
        img.map_pixels(|_| [next(), next(), next(), 0.5 + 0.5 * next()]);
        img
    }

    #[test]
    fn test_tiled_matches_whole() {
        let src = noise(37, 23, 1);
        let aux = noise(37, 23, 2);
        let params = RemapParams::default();
        let whole = remap_images(&src, Some(&aux), &params).unwrap();
        for tile in [1, 5, 16, 64] {
            let tiled = remap_images_tiled(&src, Some(&aux), &params, tile).unwrap();
            assert_eq!(tiled.data(), whole.data(), "tile size {tile}");
        }
    }

    #[test]
    fn test_tiled_failure_is_atomic() {
        let src = noise(16, 16, 3);
        let luma = chromap_core::luminance_plane(&src);
        let cropped = luma.crop(Rect::new(0, 0, 8, 8)).unwrap();
        let mut out = ColorImage::filled(src.bounds(), [3.0; 4]);
        let err = remap_tiled(&cropped, &src, None, &mut out, src.bounds(), &RemapParams::default(), 4, 4)
            .unwrap_err();
        assert!(matches!(err, OpsError::RegionUnavailable { .. }));
        assert!(out.data().iter().all(|&v| v == 3.0));
    }
}
