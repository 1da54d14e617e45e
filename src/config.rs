//! Viewer configuration.
//!
//! Settings are read from `<config dir>/meshview/config.json` when that file
//! exists. Every field is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{camera::CameraConfig, error::Result, render::ObjectOptions, view::RenderMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: [f32; 4],
    pub selection_color: [f32; 3],
    pub mode: RenderMode,
    pub log_level: String,
    pub camera: CameraConfig,
    /// Display options applied to objects created by the binary.
    pub object: ObjectOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "meshview".to_string(),
            width: 1280,
            height: 720,
            background: [1.0, 1.0, 1.0, 1.0],
            selection_color: [1.0, 1.0, 0.0],
            mode: RenderMode::Shaded,
            log_level: "info".to_string(),
            camera: CameraConfig::default(),
            object: ObjectOptions {
                show_lines: true,
                show_faces: true,
                ..Default::default()
            },
        }
    }
}

impl ViewerConfig {
    /// Location of the user config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("meshview").join("config.json"))
    }

    /// Loads the user config file, or the defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
