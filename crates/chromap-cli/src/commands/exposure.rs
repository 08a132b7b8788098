//! Exposure-map command
//!
//! Keeps the luminance of the new exposure and takes color from the old one.

use crate::ExposureMapArgs;
use anyhow::{bail, Result};
use chromap_core::NeutralReference;
use chromap_ops::{exposure_map, ExposureMapParams};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

pub fn run(args: ExposureMapArgs, verbose: bool) -> Result<()> {
    trace!(new = %args.new.display(), old = %args.old.display(), "exposure::run");

    let mut params = ExposureMapParams::default();
    if let Some(gamma) = args.gamma {
        params.chroma_scale_gamma = gamma;
    }
    if let Some(color) = &args.neutral {
        params.white = NeutralReference::new(super::parse_color(color)?);
    }
    params.validate()?;

    let new = super::load_image(&args.new)?;
    let old = super::load_image(&args.old)?;
    if new.bounds() != old.bounds() {
        bail!(
            "Old exposure is {}x{} but new is {}x{}",
            old.width(),
            old.height(),
            new.width(),
            new.height()
        );
    }

    info!(gamma = params.chroma_scale_gamma, w = new.width(), h = new.height(), "Exposure map");
    if verbose {
        println!(
            "Mapping {} onto {} (gamma={})",
            args.old.display(),
            args.new.display(),
            params.chroma_scale_gamma
        );
    }

    let output = exposure_map(&new, &old, &params)?;
    super::save_image(&args.output, &output)?;

    if verbose {
        println!("Done.");
    }
    Ok(())
}
