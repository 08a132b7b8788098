//! Remap command
//!
//! Transfers chroma from a reference image onto a source image.
//! Parameters come from `--config` (YAML) with individual flags on top.

use crate::RemapArgs;
use anyhow::{bail, Context, Result};
use chromap_core::NeutralReference;
use chromap_ops::{parallel, remap_images, RemapParams, Technology};
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// Reads remap parameters from a YAML file.
pub fn load_params(path: &Path) -> Result<RemapParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
}

/// Applies command-line overrides to `params`.
fn apply_overrides(mut params: RemapParams, args: &RemapArgs) -> Result<RemapParams> {
    if let Some(scale) = args.scale {
        params.scale = scale;
    }
    if let Some(saturation) = args.saturation {
        params.global_saturation = saturation;
    }
    if args.linear {
        params.perceptual = false;
    }
    if let Some(name) = &args.technology {
        params.technology = name.parse::<Technology>()?;
    }
    if let Some(color) = &args.neutral {
        params.neutral_reference = NeutralReference::new(super::parse_color(color)?);
    }
    params.validate()?;
    Ok(params)
}

pub fn run(args: RemapArgs, verbose: bool) -> Result<()> {
    trace!(source = %args.source.display(), "remap::run");

    let base = match &args.config {
        Some(path) => load_params(path)?,
        None => RemapParams::default(),
    };
    let params = apply_overrides(base, &args)?;
    debug!(?params, "remap parameters");

    let source = super::load_image(&args.source)?;
    let aux = args.aux.as_deref().map(super::load_image).transpose()?;
    if let Some(aux) = &aux {
        if aux.bounds() != source.bounds() {
            bail!(
                "Reference is {}x{} but source is {}x{}",
                aux.width(),
                aux.height(),
                source.width(),
                source.height()
            );
        }
    }

    info!(
        technology = %params.technology,
        scale = params.scale,
        saturation = params.global_saturation,
        w = source.width(),
        h = source.height(),
        "Remapping"
    );
    if verbose {
        println!(
            "Remapping {} ({}) with {}",
            args.source.display(),
            params.technology,
            args.aux
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "no reference".into())
        );
    }

    let output = match args.tile {
        Some(tile) => parallel::remap_images_tiled(&source, aux.as_ref(), &params, tile)?,
        None => remap_images(&source, aux.as_ref(), &params)?,
    };

    super::save_image(&args.output, &output)?;

    if verbose {
        println!("Done.");
    }
    Ok(())
}
