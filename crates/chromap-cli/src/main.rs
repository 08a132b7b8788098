//! chromap - local-contrast chroma remapping CLI
//!
//! Remaps images, writes the intermediate gradient and density maps, runs
//! the exposure-map graph and answers region queries.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "chromap")]
#[command(author, version, about = "Local-contrast chroma remapping")]
#[command(long_about = "
Transfers chroma from a reference image onto a source image, scaled by how
the local luminance gradients of the two compare.

Examples:
  chromap remap gray.exr reference.exr -o out.exr
  chromap remap gray.png ref.png -o out.png --scale 1.5 --saturation 1.2
  chromap remap gray.exr ref.exr -o out.exr --config params.yaml --tile 256
  chromap gradient input.exr -o gradient.exr
  chromap density input.exr -o density.exr
  chromap exposure-map new.exr old.exr -o mapped.exr --gamma 1.0
  chromap regions --width 1920 --height 1080 --rect 0,0,256,256
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Transfer chroma from a reference image onto a source
    #[command(visible_alias = "r")]
    Remap(RemapArgs),

    /// Write the relative gradient map of an image
    #[command(visible_alias = "g")]
    Gradient(FilterArgs),

    /// Write the image density map of an image
    Density(FilterArgs),

    /// Carry the color of an old exposure over to a new one
    #[command(name = "exposure-map", visible_alias = "em")]
    ExposureMap(ExposureMapArgs),

    /// Print the regions a rectangle needs and invalidates
    Regions(RegionsArgs),
}

#[derive(Args)]
struct RemapArgs {
    /// Source image (luminance is kept)
    source: PathBuf,

    /// Reference image (chroma is taken from it)
    aux: Option<PathBuf>,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// YAML file with remap parameters; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strength of the adoption curve (0-3)
    #[arg(short, long)]
    scale: Option<f32>,

    /// Global saturation multiplier (0-5)
    #[arg(long)]
    saturation: Option<f32>,

    /// Compare luminances linearly instead of perceptually
    #[arg(long)]
    linear: bool,

    /// Output technology: chroma-transfer, gradient-ratio, aux-chromaticity,
    /// aux-saturation, unclipped, aux-gradient
    #[arg(short, long)]
    technology: Option<String>,

    /// Neutral reference color: r,g,b[,a]
    #[arg(long)]
    neutral: Option<String>,

    /// Process in parallel tiles of this size
    #[arg(long)]
    tile: Option<u32>,
}

#[derive(Args)]
struct FilterArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct ExposureMapArgs {
    /// Image whose luminance is kept
    new: PathBuf,

    /// Image whose color is carried over
    old: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Chroma scale gamma (0.1-3.0)
    #[arg(short, long)]
    gamma: Option<f32>,

    /// White reference color: r,g,b[,a]
    #[arg(long)]
    neutral: Option<String>,
}

#[derive(Args)]
struct RegionsArgs {
    /// Image width
    #[arg(long)]
    width: u32,

    /// Image height
    #[arg(long)]
    height: u32,

    /// Rectangle: x,y,w,h
    #[arg(long)]
    rect: String,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when running under a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Remap(args) => commands::remap::run(args, cli.verbose),
        Commands::Gradient(args) => commands::filter::run_gradient(args, cli.verbose),
        Commands::Density(args) => commands::filter::run_density(args, cli.verbose),
        Commands::ExposureMap(args) => commands::exposure::run(args, cli.verbose),
        Commands::Regions(args) => commands::regions::run(args),
    }
}
