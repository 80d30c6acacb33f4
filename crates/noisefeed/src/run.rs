//! Translates the CLI surface into a renderer launch.

use anyhow::{Context, Result};
use renderer::{ImageSequenceVideo, Renderer, RendererConfig, TestPatternVideo, VideoSource};
use scheduler::{FixedControls, ShaderVariant, WarpControls};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{parse_surface_size, Cli};
use crate::settings::Settings;

pub fn initialise_tracing() {
    let default_filter = "warn,noisefeed=info,renderer=info,scheduler=info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let variant = cli
        .variant
        .or(settings.variant()?)
        .unwrap_or(ShaderVariant::NoiseFeedback);
    let controls = merge_controls(&cli, settings.controls());

    let mut config = RendererConfig {
        variant,
        ..RendererConfig::default()
    };
    if let Some(size) = &cli.size {
        config.surface_size = parse_surface_size(size)
            .map_err(anyhow::Error::msg)
            .context("invalid --size")?;
    }
    config.target_fps = cli.fps.filter(|fps| *fps > 0.0);

    let video: Box<dyn VideoSource> = match &cli.video {
        Some(directory) => Box::new(ImageSequenceVideo::open(directory)?),
        None => Box::new(TestPatternVideo::default()),
    };

    info!(%variant, width = config.surface_size.0, height = config.surface_size.1, "starting");

    Renderer::new(config)
        .with_video(video)
        .with_controls(Box::new(FixedControls(controls)))
        .run()
}

/// CLI flags win over settings-file values; everything is re-clamped so a
/// flag cannot push a control out of its documented range.
fn merge_controls(cli: &Cli, base: WarpControls) -> WarpControls {
    WarpControls::clamped(
        cli.speed.unwrap_or(base.speed),
        cli.large_waves.unwrap_or(base.large_waves),
        cli.small_waves.unwrap_or(base.small_waves),
        cli.interference.unwrap_or(base.interference),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_flags_override_base_controls() {
        let cli = Cli::parse_from(["noisefeed", "warp", "--speed", "2.0"]);
        let merged = merge_controls(&cli, WarpControls::default());
        assert_eq!(merged.speed, 2.0);
        assert_eq!(merged.interference, WarpControls::default().interference);
    }

    #[test]
    fn cli_flags_are_clamped_on_merge() {
        let cli = Cli::parse_from(["noisefeed", "--interference", "7.0"]);
        let merged = merge_controls(&cli, WarpControls::default());
        assert_eq!(merged.interference, 1.0);
    }
}
