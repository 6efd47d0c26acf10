// Render options, loadable from a JSON config file

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Largest canvas accepted, in pixels (a 10000 x 10000 bitmap)
pub const MAX_PIXELS: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    /// Bar listing as JSON instead of an image
    #[serde(rename = "json")]
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("Unknown output format '{}' (expected png, svg or json)", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    #[serde(default = "default_bar_color")]
    pub bar_color: String,
    /// Bar width as a fraction of the category slot
    #[serde(default = "default_bar_width")]
    pub bar_width: f64,
    #[serde(default = "default_bar_alpha")]
    pub bar_alpha: f64,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_bar_color() -> String { "blue".to_string() }
fn default_bar_width() -> f64 { 0.8 }
fn default_bar_alpha() -> f64 { 1.0 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
            bar_color: default_bar_color(),
            bar_width: default_bar_width(),
            bar_alpha: default_bar_alpha(),
        }
    }
}

impl RenderOptions {
    /// Parse options from JSON text; missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let options: RenderOptions =
            serde_json::from_str(text).context("Invalid render options JSON")?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!(
                "Image dimensions must be positive (width: {}, height: {})",
                self.width,
                self.height
            );
        }
        let pixels = u64::from(self.width) * u64::from(self.height);
        if pixels > MAX_PIXELS {
            anyhow::bail!(
                "Image of {}x{} exceeds the {} pixel limit",
                self.width,
                self.height,
                MAX_PIXELS
            );
        }
        if !(self.bar_width > 0.0 && self.bar_width <= 1.0) {
            anyhow::bail!("Bar width must be in (0, 1], got {}", self.bar_width);
        }
        if !(0.0..=1.0).contains(&self.bar_alpha) {
            anyhow::bail!("Bar alpha must be in [0, 1], got {}", self.bar_alpha);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let options = RenderOptions::from_json_str("{}").unwrap();
        assert_eq!(options, RenderOptions::default());
    }

    #[test]
    fn test_partial_override() {
        let options =
            RenderOptions::from_json_str(r#"{"width": 1024, "type": "svg", "bar_color": "green"}"#)
                .unwrap();
        assert_eq!(options.width, 1024);
        assert_eq!(options.height, 600);
        assert_eq!(options.format, OutputFormat::Svg);
        assert_eq!(options.bar_color, "green");
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(RenderOptions::from_json_str(r#"{"width": 0}"#).is_err());
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let err = RenderOptions::from_json_str(r#"{"width": 40000, "height": 40000}"#).unwrap_err();
        assert!(err.root_cause().to_string().contains("pixel limit"));
        // 10000 x 10000 sits exactly on the limit
        assert!(RenderOptions::from_json_str(r#"{"width": 10000, "height": 10000}"#).is_ok());
    }

    #[test]
    fn test_bar_shape_options() {
        let options =
            RenderOptions::from_json_str(r#"{"bar_width": 0.5, "bar_alpha": 0.25}"#).unwrap();
        assert_eq!(options.bar_width, 0.5);
        assert_eq!(options.bar_alpha, 0.25);
        assert!(RenderOptions::from_json_str(r#"{"bar_width": 1.5}"#).is_err());
        assert!(RenderOptions::from_json_str(r#"{"bar_width": 0}"#).is_err());
        assert!(RenderOptions::from_json_str(r#"{"bar_alpha": -0.1}"#).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(RenderOptions::from_json_str(r#"{"type": "gif"}"#).is_err());
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }
}
