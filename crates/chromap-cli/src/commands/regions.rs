//! Regions command
//!
//! Prints the region arithmetic for one rectangle of an image.

use crate::RegionsArgs;
use anyhow::{anyhow, Result};
use chromap_core::Rect;
use chromap_ops::RegionPlanner;

/// Formats the bounding box, required input and invalidated output for `rect`.
pub fn describe(planner: &RegionPlanner, rect: Rect) -> String {
    format!(
        "bounding box:   {}\nrequired input: {}\ninvalidated:    {}",
        planner.bounding_box(),
        planner.required_input_for_output(rect),
        planner.invalidated_by_change(rect)
    )
}

pub fn run(args: RegionsArgs) -> Result<()> {
    let rect: Rect = args.rect.parse().map_err(|e: String| anyhow!(e))?;
    let planner = RegionPlanner::new(Rect::from_size(args.width, args.height));
    println!("{}", describe(&planner, rect));
    Ok(())
}
