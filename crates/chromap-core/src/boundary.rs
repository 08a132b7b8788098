//! Clamp-to-edge boundary policy.
//!
//! Reads outside an image's bounding box return the nearest edge sample. This
//! is the only abyss policy the kernels use: gradients at the image border are
//! computed as if the edge row/column were repeated outward.
//!
//! ```text
//!   bounds            read at x = -1  ->  sample at x = 0
//!   ┌───────┐         read at x = w   ->  sample at x = w-1
//!   │ a b c │ c c
//!   └───────┘
//! ```
//!
//! Reads are total: a clamped coordinate that still misses the stored window
//! is clamped into the window as well, and an image without samples reads as
//! zero. Callers that need exact results validate their window up front (see
//! `chromap_ops::region`).

use crate::{luminance_row, ColorImage, Image, Rect};

/// Clamps (x, y) into `rect`. `rect` must be non-empty.
#[inline]
pub fn clamp_to_edge(rect: &Rect, x: i32, y: i32) -> (i32, i32) {
    (
        x.clamp(rect.x, rect.right() - 1),
        y.clamp(rect.y, rect.bottom() - 1),
    )
}

/// Samples `image` at (x, y) with clamp-to-edge semantics.
#[inline]
pub fn sample<const N: usize>(image: &Image<N>, x: i32, y: i32) -> [f32; N] {
    let window = image.window();
    if window.is_empty() {
        return [0.0; N];
    }
    let bounds = image.bounds();
    let (x, y) = if bounds.is_empty() {
        (x, y)
    } else {
        clamp_to_edge(&bounds, x, y)
    };
    let (x, y) = clamp_to_edge(&window, x, y);
    image.pixel(x, y)
}

/// Reads `out.len() / N` pixels of row `y` starting at column `x`.
///
/// Equivalent to sampling every pixel of the span with [`sample`], with the
/// row lookup hoisted out of the loop.
pub fn read_row<const N: usize>(image: &Image<N>, x: i32, y: i32, out: &mut [f32]) {
    let count = out.len() / N;
    let window = image.window();
    if window.is_empty() {
        out.fill(0.0);
        return;
    }

    let bounds = image.bounds();
    let src_y = if bounds.is_empty() {
        y
    } else {
        clamp_to_edge(&bounds, x, y).1
    };
    let src_y = clamp_to_edge(&window, x, src_y).1;
    let row = image.row(src_y);

    for (i, px) in out.chunks_exact_mut(N).enumerate().take(count) {
        let sx = x + i as i32;
        let sx = if bounds.is_empty() {
            sx
        } else {
            clamp_to_edge(&bounds, sx, src_y).0
        };
        let sx = sx.clamp(window.x, window.right() - 1);
        let idx = (sx - window.x) as usize * N;
        px.copy_from_slice(&row[idx..idx + N]);
    }
}

/// Reads the Rec.709 luminance of row `y`, columns `x..x + out.len()`.
///
/// `scratch` receives the RGBA samples and must hold `4 * out.len()` floats.
pub fn read_luma_row(image: &ColorImage, x: i32, y: i32, scratch: &mut [f32], out: &mut [f32]) {
    let scratch = &mut scratch[..out.len() * 4];
    read_row(image, x, y, scratch);
    luminance_row(scratch, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Plane;

    fn grid() -> Plane {
        // 3x3: value = 10*y + x
        let data = (0..9).map(|i| (10 * (i / 3) + i % 3) as f32).collect();
        Plane::from_data(Rect::from_size(3, 3), data).unwrap()
    }

    #[test]
    fn test_inside_reads_exact() {
        let g = grid();
        assert_eq!(sample(&g, 1, 2), [21.0]);
    }

    #[test]
    fn test_outside_clamps_to_edge() {
        let g = grid();
        assert_eq!(sample(&g, -1, -1), [0.0]);
        assert_eq!(sample(&g, 5, 1), [12.0]);
        assert_eq!(sample(&g, 1, 9), [21.0]);
        assert_eq!(sample(&g, -4, 7), [20.0]);
    }

    #[test]
    fn test_clamp_uses_bounds_not_window() {
        let g = grid();
        let tile = g.crop(Rect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(sample(&tile, 3, 1), [12.0]);
        assert_eq!(sample(&tile, 2, 5), [22.0]);
    }

    #[test]
    fn test_empty_image_reads_zero() {
        let empty = Plane::new(Rect::EMPTY);
        assert_eq!(sample(&empty, 0, 0), [0.0]);
        let mut row = [7.0; 3];
        read_row(&empty, -1, 0, &mut row);
        assert_eq!(row, [0.0; 3]);
    }

    #[test]
    fn test_read_row_matches_sample() {
        let g = grid();
        for y in -1..4 {
            let mut row = [0.0; 5];
            read_row(&g, -1, y, &mut row);
            for (i, v) in row.iter().enumerate() {
                assert_eq!([*v], sample(&g, -1 + i as i32, y));
            }
        }
    }

    #[test]
    fn test_read_luma_row() {
        let img = ColorImage::filled(Rect::from_size(2, 1), [0.5, 0.5, 0.5, 1.0]);
        let mut scratch = [0.0; 16];
        let mut luma = [0.0; 4];
        read_luma_row(&img, -1, 0, &mut scratch, &mut luma);
        for y in luma {
            approx::assert_abs_diff_eq!(y, 0.5, epsilon = 1e-6);
        }
    }
}
