//! Editor configuration
//!
//! Settings can be built programmatically, loaded from a TOML file, or
//! overridden through `PDF_CANVAS_*` environment variables.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scene::Color;

/// Tunable behavior for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of snapshots kept for undo
    pub history_depth: usize,
    /// Zoom applied when a document is opened
    pub default_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Amount added or removed by a single zoom step
    pub zoom_step: f32,
    /// Keep the shape tool active after a shape is drawn
    pub sticky_shapes: bool,
    /// Drop render results that were superseded by a newer request
    pub discard_stale_renders: bool,
    /// Press-to-release window (ms) for a link press to count as a click
    pub link_click_ms: u64,
    /// Longest side of an uploaded image after scaling
    pub max_image_size: u32,
    /// Widest a signature image may be placed
    pub max_signature_width: u32,
    /// Text color for new annotations
    pub annotation_text_color: Color,
    /// Background color for new annotations
    pub annotation_background: Color,
    /// Extra reach (canvas units) when hit testing thin objects
    pub hit_tolerance: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 20,
            default_zoom: 1.5,
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_step: 0.2,
            sticky_shapes: false,
            discard_stale_renders: true,
            link_click_ms: 200,
            max_image_size: 300,
            max_signature_width: 200,
            annotation_text_color: Color::BLACK,
            annotation_background: Color::rgb(0xff, 0xeb, 0x3b),
            hit_tolerance: 4.0,
        }
    }
}

impl EditorConfig {
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_default_zoom(mut self, zoom: f32) -> Self {
        self.default_zoom = zoom;
        self
    }

    pub fn with_sticky_shapes(mut self, sticky: bool) -> Self {
        self.sticky_shapes = sticky;
        self
    }

    pub fn with_discard_stale_renders(mut self, discard: bool) -> Self {
        self.discard_stale_renders = discard;
        self
    }

    pub fn with_annotation_colors(mut self, text: Color, background: Color) -> Self {
        self.annotation_text_color = text;
        self.annotation_background = background;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDF_CANVAS_HISTORY_DEPTH`: undo depth (default: 20)
    /// - `PDF_CANVAS_DEFAULT_ZOOM`: initial zoom (default: 1.5)
    /// - `PDF_CANVAS_STICKY_SHAPES`: `true` keeps the shape tool armed
    /// - `PDF_CANVAS_DISCARD_STALE_RENDERS`: `false` lets late renders land
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a variable lookup on top of `self`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
            value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue(key.to_string()))
        }

        if let Some(val) = lookup("PDF_CANVAS_HISTORY_DEPTH") {
            self.history_depth = parse("PDF_CANVAS_HISTORY_DEPTH", &val)?;
        }
        if let Some(val) = lookup("PDF_CANVAS_DEFAULT_ZOOM") {
            self.default_zoom = parse("PDF_CANVAS_DEFAULT_ZOOM", &val)?;
        }
        if let Some(val) = lookup("PDF_CANVAS_STICKY_SHAPES") {
            self.sticky_shapes = parse("PDF_CANVAS_STICKY_SHAPES", &val)?;
        }
        if let Some(val) = lookup("PDF_CANVAS_DISCARD_STALE_RENDERS") {
            self.discard_stale_renders = parse("PDF_CANVAS_DISCARD_STALE_RENDERS", &val)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults:
    /// ```toml
    /// history_depth = 20
    /// default_zoom = 1.5
    /// sticky_shapes = false
    /// annotation_background = "#ffeb3b"
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Checks that the zoom range and history depth are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::InvalidValue("history_depth".to_string()));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::InvalidValue("min_zoom".to_string()));
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.default_zoom) {
            return Err(ConfigError::InvalidValue("default_zoom".to_string()));
        }
        if self.zoom_step <= 0.0 {
            return Err(ConfigError::InvalidValue("zoom_step".to_string()));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history_depth, 20);
        assert_eq!(config.default_zoom, 1.5);
        assert_eq!(config.min_zoom, 0.5);
        assert_eq!(config.max_zoom, 3.0);
        assert!(!config.sticky_shapes);
        assert!(config.discard_stale_renders);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EditorConfig::default()
            .with_history_depth(5)
            .with_default_zoom(2.0)
            .with_sticky_shapes(true)
            .with_discard_stale_renders(false);

        assert_eq!(config.history_depth, 5);
        assert_eq!(config.default_zoom, 2.0);
        assert!(config.sticky_shapes);
        assert!(!config.discard_stale_renders);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PDF_CANVAS_HISTORY_DEPTH", "8"),
            ("PDF_CANVAS_STICKY_SHAPES", "true"),
        ]
        .into_iter()
        .collect();

        let config = EditorConfig::default()
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.history_depth, 8);
        assert!(config.sticky_shapes);
        assert_eq!(config.default_zoom, 1.5);
    }

    #[test]
    fn test_env_invalid_value() {
        let result = EditorConfig::default().apply_env(|key| {
            (key == "PDF_CANVAS_DEFAULT_ZOOM").then(|| "wide".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(key)) if key == "PDF_CANVAS_DEFAULT_ZOOM"
        ));
    }

    #[test]
    fn test_partial_toml() {
        let config = EditorConfig::from_toml_str(
            "history_depth = 3\nannotation_background = \"#fff4b8\"\n",
        )
        .unwrap();
        assert_eq!(config.history_depth, 3);
        assert_eq!(config.annotation_background, Color::rgb(0xff, 0xf4, 0xb8));
        assert_eq!(config.max_zoom, 3.0);
    }

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let result = EditorConfig::from_toml_str("min_zoom = 4.0\nmax_zoom = 2.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_rejects_zero_history_depth() {
        let result = EditorConfig::from_toml_str("history_depth = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "history_depth"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("editor.toml");

        let config = EditorConfig::default().with_history_depth(12).with_sticky_shapes(true);
        config.save_to_file(&path).unwrap();

        let loaded = EditorConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let result = EditorConfig::from_file("/nonexistent/editor.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
