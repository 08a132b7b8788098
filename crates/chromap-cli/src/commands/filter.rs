//! Gradient and density commands
//!
//! Write the relative gradient or the image density of an image's
//! luminance as a gray image.

use crate::FilterArgs;
use anyhow::Result;
use chromap_core::{luminance_plane, Plane, Rect};
use chromap_ops::{image_density, relative_gradient, OpsResult};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

fn run_filter(
    args: FilterArgs,
    verbose: bool,
    name: &str,
    filter: fn(&Plane, Rect) -> OpsResult<Plane>,
) -> Result<()> {
    trace!(input = %args.input.display(), filter = name, "filter::run");

    let image = super::load_image(&args.input)?;
    let luma = luminance_plane(&image);
    info!(filter = name, w = image.width(), h = image.height(), "Applying filter");
    if verbose {
        println!("Computing {} of {}", name, args.input.display());
    }

    let result = filter(&luma, luma.bounds())?;
    super::save_image(&args.output, &super::plane_to_gray(&result))?;

    if verbose {
        println!("Done.");
    }
    Ok(())
}

pub fn run_gradient(args: FilterArgs, verbose: bool) -> Result<()> {
    run_filter(args, verbose, "relative gradient", relative_gradient)
}

pub fn run_density(args: FilterArgs, verbose: bool) -> Result<()> {
    run_filter(args, verbose, "image density", image_density)
}
