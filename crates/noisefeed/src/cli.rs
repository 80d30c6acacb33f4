use std::path::PathBuf;

use clap::Parser;
use scheduler::ShaderVariant;

#[derive(Parser, Debug)]
#[command(
    name = "noisefeed",
    author,
    version,
    about = "Animated noise/video-feedback visuals",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Shader variant: `feedback` (fbm palette with a trail) or `warp`
    /// (noise-warped video with interference).
    #[arg(value_name = "VARIANT", value_parser = parse_variant)]
    pub variant: Option<ShaderVariant>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Optional FPS cap (0 = every vblank).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Directory of image frames to play as the video input; defaults to a
    /// procedural test pattern.
    #[arg(long, value_name = "DIR")]
    pub video: Option<PathBuf>,

    /// Settings file (TOML). CLI flags override it.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Warp playback speed (0-3).
    #[arg(long, value_name = "VALUE")]
    pub speed: Option<f32>,

    /// Large wave strength (0-3).
    #[arg(long, value_name = "VALUE")]
    pub large_waves: Option<f32>,

    /// Small wave strength (0-0.5).
    #[arg(long, value_name = "VALUE")]
    pub small_waves: Option<f32>,

    /// Interference strength (0-1).
    #[arg(long, value_name = "VALUE")]
    pub interference: Option<f32>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_variant(value: &str) -> Result<ShaderVariant, String> {
    match value.to_ascii_lowercase().as_str() {
        "feedback" | "noise" => Ok(ShaderVariant::NoiseFeedback),
        "warp" | "video" => Ok(ShaderVariant::VideoWarp),
        other => Err(format!(
            "unknown variant '{other}' (expected `feedback` or `warp`)"
        )),
    }
}

/// Parses `WIDTHxHEIGHT` into physical pixels.
pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("surface size must be non-zero, got '{value}'"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_parse_case_insensitively() {
        assert_eq!(
            parse_variant("Feedback").unwrap(),
            ShaderVariant::NoiseFeedback
        );
        assert_eq!(parse_variant("WARP").unwrap(), ShaderVariant::VideoWarp);
        assert!(parse_variant("spiral").is_err());
    }

    #[test]
    fn surface_size_accepts_both_separators() {
        assert_eq!(parse_surface_size("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size("640X480").unwrap(), (640, 480));
    }

    #[test]
    fn surface_size_rejects_degenerate_input() {
        assert!(parse_surface_size("1920").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("axb").is_err());
    }
}
