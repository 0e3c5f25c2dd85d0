//! Binary entrypoint for the circular gallery.

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use circular_gallery::config::Configuration;
use circular_gallery::{app, playlist};

#[derive(Debug, Parser)]
#[command(name = "circular-gallery", about = "Scrollable image gallery on a curved band")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Images to show ahead of the configured library
    #[arg(value_name = "IMAGES")]
    images: Vec<PathBuf>,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("circular_gallery={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = match &cli.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Configuration::default(),
    };
    let cfg_images = std::mem::take(&mut cfg.images);
    let cfg = cfg.validated().context("validating configuration")?;

    let explicit: Vec<PathBuf> = cli.images.into_iter().chain(cfg_images).collect();
    let items = playlist::build_playlist(&explicit, cfg.photo_library_path.as_deref())?;
    ensure!(!items.is_empty(), "no images to show");
    info!(count = items.len(), "playlist ready");

    app::run_gallery(items, cfg)
}
