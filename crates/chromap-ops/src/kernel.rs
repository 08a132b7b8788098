//! Per-pixel chroma transfer.
//!
//! The kernel moves the chroma of an auxiliary (reference) image onto the
//! luminance of a source image. Given at one pixel:
//!
//! - `Ys`, `Ya`: source / auxiliary luminance
//! - `Gs`, `Ga`: source / auxiliary relative gradient (see [`crate::gradient`])
//! - `Ca`: auxiliary color, and the source alpha
//!
//! it computes
//!
//! ```text
//! luminance_ratio = Ys / Ya                         (0 if |Ya| <= eps)
//! gradient_ratio  = Gs / Ga                         (1 if Ga <= eps)
//! raw             = (Ya * gradient_ratio / Ys)^(1/2.2)  perceptual
//!                 =  Ya * gradient_ratio / Ys           linear
//!                                                   (1 if Ys <= eps)
//! t               = 3π/2 * (1 - 1 / (0.5 * raw^(0.6 * scale) + 1))
//! factor          = 1 - t * cos(t)
//!
//! tinted_gray[c]  = Ys * n2t[c]
//! chroma_aux[c]   = Ca[c] - Ya * n2t[c]
//! recombined[c]   = tinted_gray[c] + luminance_ratio * chroma_aux[c] * factor * saturation
//! ```
//!
//! and finally scales every channel's chroma delta `recombined - tinted_gray`
//! by one shared ratio so the result stays above zero and below
//! `max(1, tinted_gray)` without shifting hue.
//!
//! `n2t` is the neutral-to-tinted factor of the [`NeutralReference`].
//!
//! # Technologies
//!
//! [`Technology`] selects the value written per pixel. Everything except
//! [`Technology::ChromaTransfer`] is a diagnostic view of one intermediate.

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use chromap_core::NeutralReference;
use serde::{Deserialize, Serialize};

use crate::{OpsError, OpsResult};

/// Denominator magnitude below which a ratio falls back to its neutral value.
pub const KERNEL_EPSILON: f32 = 1e-4;

/// Offset keeping the gamut-clip denominators away from zero.
const CLIP_EPSILON: f32 = 1e-5;

/// Exponent of the perceptual adoption correction.
const PERCEPTUAL_GAMMA: f32 = 2.2;

/// Valid range of [`RemapParams::scale`].
pub const SCALE_RANGE: (f32, f32) = (0.0, 3.0);

/// Valid range of [`RemapParams::global_saturation`].
pub const SATURATION_RANGE: (f32, f32) = (0.0, 5.0);

/// What the kernel writes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Technology {
    /// Gamut-clipped recombination of aux chroma onto source luminance.
    #[default]
    ChromaTransfer,
    /// Contrast ratio `Gs / Ga` as grey.
    GradientRatio,
    /// HSY chromaticity of the auxiliary chroma vector.
    AuxChromaticity,
    /// Auxiliary chromaticity divided by `Ya`.
    AuxSaturation,
    /// Recombination without the gamut clip.
    Unclipped,
    /// Auxiliary gradient `Ga` as grey.
    AuxGradient,
}

impl Technology {
    /// All variants, in declaration order.
    pub const ALL: [Technology; 6] = [
        Technology::ChromaTransfer,
        Technology::GradientRatio,
        Technology::AuxChromaticity,
        Technology::AuxSaturation,
        Technology::Unclipped,
        Technology::AuxGradient,
    ];

    /// Kebab-case name, as used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Technology::ChromaTransfer => "chroma-transfer",
            Technology::GradientRatio => "gradient-ratio",
            Technology::AuxChromaticity => "aux-chromaticity",
            Technology::AuxSaturation => "aux-saturation",
            Technology::Unclipped => "unclipped",
            Technology::AuxGradient => "aux-gradient",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Technology {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        Technology::ALL
            .into_iter()
            .find(|t| t.name() == key)
            .ok_or_else(|| {
                let names: Vec<_> = Technology::ALL.iter().map(|t| t.name()).collect();
                OpsError::InvalidParameter(format!(
                    "unknown technology '{s}', expected one of: {}",
                    names.join(", ")
                ))
            })
    }
}

/// Remap parameters.
///
/// Deserializes with defaults for missing fields:
///
/// ```rust
/// use chromap_ops::{RemapParams, Technology};
///
/// let p: RemapParams = serde_yaml::from_str("scale: 0.5\ntechnology: aux-gradient").unwrap();
/// assert_eq!(p.scale, 0.5);
/// assert_eq!(p.global_saturation, 1.0);
/// assert_eq!(p.technology, Technology::AuxGradient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapParams {
    /// Strength of chroma adoption, in [0, 3].
    pub scale: f32,
    /// Multiplier on the transferred chroma, in [0, 5].
    pub global_saturation: f32,
    /// Track perceived rather than linear contrast change.
    pub perceptual: bool,
    /// Value written per pixel.
    pub technology: Technology,
    /// Color that counts as untinted.
    pub neutral_reference: NeutralReference,
}

impl Default for RemapParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            global_saturation: 1.0,
            perceptual: true,
            technology: Technology::ChromaTransfer,
            neutral_reference: NeutralReference::white(),
        }
    }
}

impl RemapParams {
    /// Checks every parameter against its range.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> OpsResult<()> {
        check_range("scale", self.scale, SCALE_RANGE)?;
        check_range("global_saturation", self.global_saturation, SATURATION_RANGE)?;
        if !self.neutral_reference.color().iter().all(|c| c.is_finite()) {
            return Err(OpsError::InvalidParameter(
                "neutral_reference must be finite".into(),
            ));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: f32, (lo, hi): (f32, f32)) -> OpsResult<()> {
    if value.is_finite() && (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(OpsError::InvalidParameter(format!(
            "{name} = {value} outside [{lo}, {hi}]"
        )))
    }
}

/// Samples the kernel reads at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KernelInput {
    /// Source luminance `Ys`.
    pub source_luma: f32,
    /// Auxiliary luminance `Ya`.
    pub aux_luma: f32,
    /// Source relative gradient `Gs`.
    pub source_gradient: f32,
    /// Auxiliary relative gradient `Ga`.
    pub aux_gradient: f32,
    /// Auxiliary RGB `Ca`.
    pub aux_color: [f32; 3],
    /// Source alpha, copied to the output.
    pub alpha: f32,
}

/// Intermediate values of one kernel evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelTerms {
    /// `Ys / Ya`.
    pub luminance_ratio: f32,
    /// `Gs / Ga`.
    pub gradient_ratio: f32,
    /// Output of the adoption curve.
    pub factor: f32,
    /// `Ys * n2t`.
    pub tinted_gray: [f32; 3],
    /// `Ca - Ya * n2t`.
    pub chroma_aux: [f32; 3],
    /// Chroma-transferred color before the gamut clip.
    pub recombined: [f32; 3],
}

/// `Ys / Ya`, or 0 when `Ya` is near zero.
#[inline]
pub fn luminance_ratio(source_luma: f32, aux_luma: f32) -> f32 {
    if aux_luma.abs() > KERNEL_EPSILON {
        source_luma / aux_luma
    } else {
        0.0
    }
}

/// `Gs / Ga`, or 1 when the auxiliary is flat.
#[inline]
pub fn gradient_ratio(source_gradient: f32, aux_gradient: f32) -> f32 {
    if aux_gradient > KERNEL_EPSILON {
        source_gradient / aux_gradient
    } else {
        1.0
    }
}

/// Raw chroma adoption `Ya * gradient_ratio / Ys`, gamma-corrected when
/// `perceptual`. Negative values clamp to 0; a near-black source yields 1.
#[inline]
pub fn chroma_adoption(source_luma: f32, aux_luma: f32, gradient_ratio: f32, perceptual: bool) -> f32 {
    if source_luma <= KERNEL_EPSILON {
        return 1.0;
    }
    let linear = (aux_luma * gradient_ratio / source_luma).max(0.0);
    if perceptual {
        linear.powf(1.0 / PERCEPTUAL_GAMMA)
    } else {
        linear
    }
}

/// The adoption curve: maps a raw adoption value to the chroma factor.
///
/// `raw = 1` gives `factor ≈ 1`; large values saturate at `t = 3π/2`.
#[inline]
pub fn adoption_curve(raw: f32, scale: f32) -> f32 {
    let t = 3.0 * FRAC_PI_2 * (1.0 - 1.0 / (0.5 * raw.powf(0.6 * scale) + 1.0));
    1.0 - t * t.cos()
}

/// HSY chromaticity `sqrt(Σc² - c0c1 - c1c2 - c0c2)` of a chroma vector.
#[inline]
pub fn chromaticity(c: [f32; 3]) -> f32 {
    let sq = c[0] * c[0] + c[1] * c[1] + c[2] * c[2];
    let cross = c[0] * c[1] + c[1] * c[2] + c[0] * c[2];
    (sq - cross).max(0.0).sqrt()
}

/// Shared clip ratio for pulling `recombined` back into gamut around
/// `tinted_gray`.
///
/// The minimum over all channels of the negative-headroom ratio
/// `tg / (tg - min(rec, -1e-5))` and the positive-headroom ratio
/// `1 - max(0, rec - max(1, tg)) / (rec - tg + 1e-5)`.
pub fn gamut_clip_ratio(tinted_gray: [f32; 3], recombined: [f32; 3]) -> f32 {
    let mut ratio = f32::INFINITY;
    for (&tg, &rec) in tinted_gray.iter().zip(&recombined) {
        let below = tg - rec.min(-CLIP_EPSILON);
        let negative = if below.abs() > f32::MIN_POSITIVE {
            tg / below
        } else {
            1.0
        };

        let excess = (rec - tg.max(1.0)).max(0.0);
        let positive = if excess > 0.0 {
            1.0 - excess / (rec - tg + CLIP_EPSILON)
        } else {
            1.0
        };

        ratio = ratio.min(negative).min(positive);
    }
    ratio
}

/// Applies [`gamut_clip_ratio`]: `tg + ratio * (rec - tg)` per channel.
#[inline]
pub fn gamut_clip(tinted_gray: [f32; 3], recombined: [f32; 3]) -> [f32; 3] {
    let ratio = gamut_clip_ratio(tinted_gray, recombined);
    std::array::from_fn(|c| tinted_gray[c] + ratio * (recombined[c] - tinted_gray[c]))
}

/// The per-pixel kernel with its parameters resolved.
#[derive(Debug, Clone, Copy)]
pub struct ChromaTransferKernel {
    scale: f32,
    global_saturation: f32,
    perceptual: bool,
    technology: Technology,
    neutral_to_tinted: [f32; 3],
}

impl ChromaTransferKernel {
    /// Builds a kernel from validated parameters.
    pub fn new(params: &RemapParams) -> Self {
        Self {
            scale: params.scale,
            global_saturation: params.global_saturation,
            perceptual: params.perceptual,
            technology: params.technology,
            neutral_to_tinted: params.neutral_reference.neutral_to_tinted(),
        }
    }

    /// Selected technology.
    #[inline]
    pub fn technology(&self) -> Technology {
        self.technology
    }

    /// Computes every intermediate of the chroma transfer.
    #[inline]
    pub fn terms(&self, px: &KernelInput) -> KernelTerms {
        let ys = px.source_luma;
        let ya = px.aux_luma;

        let luminance_ratio = luminance_ratio(ys, ya);
        let gradient_ratio = gradient_ratio(px.source_gradient, px.aux_gradient);
        let raw = chroma_adoption(ys, ya, gradient_ratio, self.perceptual);
        let factor = adoption_curve(raw, self.scale);

        let n2t = self.neutral_to_tinted;
        let tinted_gray = [ys * n2t[0], ys * n2t[1], ys * n2t[2]];
        let chroma_aux = std::array::from_fn(|c| px.aux_color[c] - ya * n2t[c]);
        let gain = luminance_ratio * factor * self.global_saturation;
        let recombined = std::array::from_fn(|c| tinted_gray[c] + chroma_aux[c] * gain);

        KernelTerms {
            luminance_ratio,
            gradient_ratio,
            factor,
            tinted_gray,
            chroma_aux,
            recombined,
        }
    }

    /// Output RGBA for one pixel.
    #[inline]
    pub fn apply(&self, px: &KernelInput) -> [f32; 4] {
        let alpha = px.alpha;
        let terms = self.terms(px);
        let [r, g, b] = match self.technology {
            Technology::ChromaTransfer => gamut_clip(terms.tinted_gray, terms.recombined),
            Technology::Unclipped => terms.recombined,
            Technology::GradientRatio => [terms.gradient_ratio; 3],
            Technology::AuxChromaticity => [chromaticity(terms.chroma_aux); 3],
            Technology::AuxSaturation => {
                let sat = if px.aux_luma > KERNEL_EPSILON {
                    chromaticity(terms.chroma_aux) / px.aux_luma
                } else {
                    0.0
                };
                [sat; 3]
            }
            Technology::AuxGradient => [px.aux_gradient; 3],
        };
        [r, g, b, alpha]
    }
}
