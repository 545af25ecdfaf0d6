//! TOML configuration for the headless viewer.
//!
//! ```toml
//! [core]
//! log_level = "info"
//!
//! [render]
//! width = 2048
//! height = 2048
//! msaa_nr_samples = 1
//!
//! [scene.cam]
//! position = [0.0, 1.0, 3.0]
//! lookat = [0.0, 0.0, 0.0]
//! fovy = 0.7
//! near = 0.01
//! far = 100.0
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

use std::path::Path;
use glam::Vec3;
use serde::Deserialize;
use crate::camera::projection::{validate_near_far, DEFAULT_FAR, DEFAULT_FOVY, DEFAULT_NEAR};
use crate::error::{Error, Result};
use crate::log::LogLevel;

/// Sample counts the depth rasterizer knows sample patterns for.
pub const SUPPORTED_SAMPLE_COUNTS: [u32; 4] = [1, 2, 4, 8];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub core: CoreConfig,
    pub render: RenderConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel. Linear depth can only be read back with 1.
    pub msaa_nr_samples: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 2048,
            msaa_nr_samples: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub cam: CamConfig,
}

/// Initial camera of a viewer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CamConfig {
    pub position: Vec3,
    pub lookat: Vec3,
    /// Vertical field of view in radians
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CamConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 3.0),
            lookat: Vec3::ZERO,
            fovy: DEFAULT_FOVY,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let render = &self.render;
        if render.width == 0 || render.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "render resolution must be non-zero, got {}x{}",
                render.width, render.height
            )));
        }
        if !SUPPORTED_SAMPLE_COUNTS.contains(&render.msaa_nr_samples) {
            return Err(Error::InvalidConfig(format!(
                "msaa_nr_samples must be one of {:?}, got {}",
                SUPPORTED_SAMPLE_COUNTS, render.msaa_nr_samples
            )));
        }

        let cam = &self.scene.cam;
        validate_near_far(cam.near, cam.far).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if !(cam.fovy.is_finite() && cam.fovy > 0.0 && cam.fovy < std::f32::consts::PI) {
            return Err(Error::InvalidConfig(format!("fovy must be in (0, pi), got {}", cam.fovy)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
