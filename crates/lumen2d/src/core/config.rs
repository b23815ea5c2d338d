//! # Engine Configuration
//!
//! All runtime configuration in one serializable tree. Every struct has a
//! `Default`, so partial TOML/RON files only need the fields they change.
//!
//! ## Configuration Categories
//!
//! - **Window**: initial title and size
//! - **Backends**: optional preferred backend per capability
//! - **Graphics**: vertex buffer sizing, matrix stack depth, clear color
//! - **Audio**: master volume
//! - **Logging**: default log level

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

/// Window configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "lumen2d".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Preferred backend names, probed before the platform's default order
///
/// `None` keeps the default order. An unknown or unavailable name falls
/// back to the default order with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Platform/windowing backend (`"glfw"`, `"null"`)
    pub platform: Option<String>,
    /// Graphics backend (`"software"`, `"null"`)
    pub graphics: Option<String>,
    /// Audio backend (`"rodio"`, `"null"`)
    pub audio: Option<String>,
}

/// Graphics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Vertices reserved up front in the draw pipeline
    pub initial_vertex_capacity: usize,
    /// Maximum depth of the modelview matrix stack
    pub matrix_stack_depth: usize,
    /// Whether newly created textures use bilinear filtering
    pub smooth_textures: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            initial_vertex_capacity: 1024,
            matrix_stack_depth: 32,
            smooth_textures: false,
        }
    }
}

/// Audio configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Initial master volume (0.0 to 1.0)
    pub master_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { master_volume: 1.0 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level filter (`RUST_LOG` overrides it)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// # Complete Engine Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Backend preferences
    pub backends: BackendConfig,
    /// Graphics settings
    pub graphics: GraphicsConfig,
    /// Audio settings
    pub audio: AudioConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Create a configuration with the given window title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            window: WindowConfig {
                title: title.into(),
                ..WindowConfig::default()
            },
            ..Self::default()
        }
    }

    /// Set the initial window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Prefer a platform backend by name
    pub fn with_platform_backend(mut self, name: impl Into<String>) -> Self {
        self.backends.platform = Some(name.into());
        self
    }

    /// Prefer a graphics backend by name
    pub fn with_graphics_backend(mut self, name: impl Into<String>) -> Self {
        self.backends.graphics = Some(name.into());
        self
    }

    /// Prefer an audio backend by name
    pub fn with_audio_backend(mut self, name: impl Into<String>) -> Self {
        self.backends.audio = Some(name.into());
        self
    }
}

impl Config for EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if self.graphics.matrix_stack_depth == 0 {
            return Err(ConfigError::Invalid(
                "matrix stack depth must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.audio.master_volume) {
            return Err(ConfigError::Invalid(format!(
                "master volume must be within 0..=1, got {}",
                self.audio.master_volume
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [window]
            title = "Pong"

            [backends]
            graphics = "null"
        "#;
        let config = EngineConfig::from_str_with_format(text, "game.toml").unwrap();

        assert_eq!(config.window.title, "Pong");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.backends.graphics.as_deref(), Some("null"));
        assert_eq!(config.backends.platform, None);
        assert_eq!(config.graphics.matrix_stack_depth, 32);
    }

    #[test]
    fn test_ron_round_trip_through_text() {
        let config = EngineConfig::new("Ron Test").with_window_size(320, 200);
        let text = config.to_string_with_format("game.ron").unwrap();
        let parsed = EngineConfig::from_str_with_format(&text, "game.ron").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::from_str_with_format("", "game.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = EngineConfig::new("Bad").with_window_size(0, 480);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_volume() {
        let mut config = EngineConfig::default();
        config.audio.master_volume = 1.5;
        assert!(config.validate().is_err());
    }
}
