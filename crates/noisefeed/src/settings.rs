//! Optional TOML settings file.
//!
//! ```toml
//! variant = "warp"
//!
//! [controls]
//! speed = 1.5
//! large_waves = 2.0
//! small_waves = 0.1
//! interference = 0.4
//! ```
//!
//! Control values outside their documented bounds are clamped on load; an
//! unknown variant name is an error because silently falling back would mask
//! a typo.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use scheduler::{ShaderVariant, WarpControls};

use crate::cli::parse_variant;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    variant: Option<String>,
    #[serde(default)]
    controls: ControlsTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ControlsTable {
    speed: Option<f32>,
    large_waves: Option<f32>,
    small_waves: Option<f32>,
    interference: Option<f32>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("failed to parse settings at {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn variant(&self) -> Result<Option<ShaderVariant>> {
        self.variant
            .as_deref()
            .map(|name| parse_variant(name).map_err(anyhow::Error::msg))
            .transpose()
    }

    /// Controls with file values layered over the defaults, clamped into
    /// their documented bounds.
    pub fn controls(&self) -> WarpControls {
        let defaults = WarpControls::default();
        WarpControls::clamped(
            self.controls.speed.unwrap_or(defaults.speed),
            self.controls.large_waves.unwrap_or(defaults.large_waves),
            self.controls.small_waves.unwrap_or(defaults.small_waves),
            self.controls.interference.unwrap_or(defaults.interference),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_yield_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert!(settings.variant().unwrap().is_none());
        assert_eq!(settings.controls(), WarpControls::default());
    }

    #[test]
    fn partial_controls_layer_over_defaults() {
        let settings = Settings::from_toml_str(
            r#"
[controls]
speed = 2.5
"#,
        )
        .unwrap();
        let controls = settings.controls();
        assert_eq!(controls.speed, 2.5);
        assert_eq!(controls.large_waves, WarpControls::default().large_waves);
    }

    #[test]
    fn out_of_range_controls_are_clamped() {
        let settings = Settings::from_toml_str(
            r#"
[controls]
speed = 9.0
small_waves = -2.0
"#,
        )
        .unwrap();
        let controls = settings.controls();
        assert_eq!(controls.speed, 3.0);
        assert_eq!(controls.small_waves, 0.0);
    }

    #[test]
    fn variant_parses_or_errors() {
        let settings = Settings::from_toml_str(r#"variant = "warp""#).unwrap();
        assert_eq!(settings.variant().unwrap(), Some(ShaderVariant::VideoWarp));

        let settings = Settings::from_toml_str(r#"variant = "bogus""#).unwrap();
        assert!(settings.variant().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml_str("tempo = 4").is_err());
    }
}
