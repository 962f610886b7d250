//! Runtime configuration with TOML support.
//!
//! All sub-structs use `#[serde(default)]` so partial TOML files (e.g.
//! only overriding `[render]`) work correctly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LumoError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Render target and kernel parameters.
    pub render: RenderOptions,
    /// Camera projection and control parameters.
    pub camera: CameraOptions,
}

/// Render target and kernel parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    /// Output image width in pixels.
    pub width: u32,
    /// Output image height in pixels.
    pub height: u32,
    /// Path of the WGSL compute kernel loaded at engine startup.
    pub shader_path: PathBuf,
    /// Whether the sky gradient contributes light by default.
    pub sky_enabled: bool,
    /// Default exposure multiplier.
    pub exposure: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            shader_path: PathBuf::from("shaders/raytrace.wgsl"),
            sky_enabled: true,
            exposure: 1.0,
        }
    }
}

/// Camera projection and control parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub vfov: f32,
    /// Distance moved per key press.
    pub move_speed: f32,
    /// Initial eye position.
    pub origin: [f32; 3],
    /// Initial look-at target.
    pub look_at: [f32; 3],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            vfov: 60.0,
            move_speed: 0.5,
            origin: [0.0, 2.0, 8.0],
            look_at: [0.0, 0.0, 0.0],
        }
    }
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`LumoError::Io`] when the file cannot be read,
    /// [`LumoError::OptionsParse`] when its contents are not valid TOML.
    pub fn load(path: &Path) -> Result<Self, LumoError> {
        let content = std::fs::read_to_string(path).map_err(LumoError::Io)?;
        toml::from_str(&content).map_err(|e| LumoError::OptionsParse(e.to_string()))
    }

    /// Load options, falling back to defaults when the file is absent and
    /// logging (but tolerating) a malformed one.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("ignoring '{}': {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`LumoError::OptionsParse`] on serialization failure,
    /// [`LumoError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), LumoError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LumoError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(LumoError::Io)?;
        }
        std::fs::write(path, content).map_err(LumoError::Io)
    }

    /// Aspect ratio of the configured render target.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.render.width as f32 / self.render.height as f32
    }
}
