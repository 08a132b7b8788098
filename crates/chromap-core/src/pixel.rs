//! Luminance and neutral-reference helpers.
//!
//! # Luminance
//!
//! Luminance planes are derived from RGBA with the Rec.709 weights
//! `Y = 0.2126*R + 0.7152*G + 0.0722*B`. The kernels never need colorimetric
//! accuracy, only that source, auxiliary and output share one working space.
//!
//! # Neutral reference
//!
//! A [`NeutralReference`] is the color that should be treated as "no tint"
//! (white or neutral gray). Images that are not white balanced carry their
//! achromatic axis along that color instead of along R=G=B. From it we derive:
//!
//! - its own luminance `Yw`
//! - per channel `Yw / ref[c]` (tinted -> neutral)
//! - per channel `ref[c] / Yw` (neutral -> tinted)
//!
//! ```rust
//! use chromap_core::{luminance, NeutralReference};
//!
//! let warm = NeutralReference::new([1.0, 0.8, 0.6, 1.0]);
//! let gray = 0.5;
//! let tinted = warm.tint(gray);
//! assert!((luminance(tinted) - gray).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};

use crate::{ColorImage, Plane};

/// Rec.709 luminance coefficient for red channel.
pub const REC709_LUMA_R: f32 = 0.2126;

/// Rec.709 luminance coefficient for green channel.
pub const REC709_LUMA_G: f32 = 0.7152;

/// Rec.709 luminance coefficient for blue channel.
pub const REC709_LUMA_B: f32 = 0.0722;

/// Rec.709 luminance coefficients as an array [R, G, B].
pub const REC709_LUMA: [f32; 3] = [REC709_LUMA_R, REC709_LUMA_G, REC709_LUMA_B];

/// Divisor magnitude below which a reference channel counts as zero.
const REFERENCE_EPSILON: f32 = 1e-6;

/// Rec.709 luminance of an RGB triple.
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC709_LUMA_R + rgb[1] * REC709_LUMA_G + rgb[2] * REC709_LUMA_B
}

/// Writes the luminance of every RGBA pixel in `rgba` into `out`.
///
/// `out` must hold `rgba.len() / 4` samples; extra samples are left untouched.
#[inline]
pub fn luminance_row(rgba: &[f32], out: &mut [f32]) {
    for (px, y) in rgba.chunks_exact(4).zip(out.iter_mut()) {
        *y = luminance([px[0], px[1], px[2]]);
    }
}

/// Luminance plane of a color image, with the same bounds and window.
pub fn luminance_plane(image: &ColorImage) -> Plane {
    image.map_channels(|[r, g, b, _]| [luminance([r, g, b])])
}

/// The color that represents white / neutral gray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct NeutralReference {
    color: [f32; 4],
    luminance: f32,
    tinted_to_neutral: [f32; 3],
    neutral_to_tinted: [f32; 3],
}

impl NeutralReference {
    /// Derives the tint factors for `color` (RGBA, alpha ignored).
    ///
    /// A reference with no luminance degenerates to the identity tint.
    pub fn new(color: [f32; 4]) -> Self {
        let y = luminance([color[0], color[1], color[2]]);
        let mut tinted_to_neutral = [1.0; 3];
        let mut neutral_to_tinted = [1.0; 3];

        if y.abs() > REFERENCE_EPSILON {
            for c in 0..3 {
                neutral_to_tinted[c] = color[c] / y;
                tinted_to_neutral[c] = if color[c].abs() > REFERENCE_EPSILON {
                    y / color[c]
                } else {
                    0.0
                };
            }
        }

        Self {
            color,
            luminance: y,
            tinted_to_neutral,
            neutral_to_tinted,
        }
    }

    /// Plain white, the identity reference.
    pub fn white() -> Self {
        Self::new([1.0, 1.0, 1.0, 1.0])
    }

    /// The reference color as given.
    #[inline]
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Luminance of the reference color.
    #[inline]
    pub fn luminance(&self) -> f32 {
        self.luminance
    }

    /// Per-channel `Yw / ref[c]`; 0 where the channel is zero.
    #[inline]
    pub fn tinted_to_neutral(&self) -> [f32; 3] {
        self.tinted_to_neutral
    }

    /// Per-channel `ref[c] / Yw`.
    #[inline]
    pub fn neutral_to_tinted(&self) -> [f32; 3] {
        self.neutral_to_tinted
    }

    /// The tinted gray of luminance `y`: `y * ref[c] / Yw` per channel.
    #[inline]
    pub fn tint(&self, y: f32) -> [f32; 3] {
        [
            y * self.neutral_to_tinted[0],
            y * self.neutral_to_tinted[1],
            y * self.neutral_to_tinted[2],
        ]
    }
}

impl Default for NeutralReference {
    fn default() -> Self {
        Self::white()
    }
}

impl From<[f32; 4]> for NeutralReference {
    fn from(color: [f32; 4]) -> Self {
        Self::new(color)
    }
}

impl From<NeutralReference> for [f32; 4] {
    fn from(reference: NeutralReference) -> Self {
        reference.color
    }
}
