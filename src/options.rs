//! Viewer configuration with TOML support.
//!
//! All tunable settings (API endpoint, HTTP transport, camera projection)
//! live here. Every section uses `#[serde(default)]` so partial TOML files
//! (e.g. only overriding `[api]`) work correctly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SomavisError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ViewerOptions {
    /// Scene API endpoint options.
    pub api: ApiOptions,
    /// HTTP transport options.
    pub http: HttpOptions,
    /// Camera projection defaults.
    pub camera: CameraOptions,
}

impl ViewerOptions {
    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, SomavisError> {
        let content = std::fs::read_to_string(path).map_err(SomavisError::Io)?;
        toml::from_str(&content)
            .map_err(|e| SomavisError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), SomavisError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SomavisError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SomavisError::Io)?;
        }
        std::fs::write(path, content).map_err(SomavisError::Io)
    }
}

// ---------------------------------------------------------------------------
// API
// ---------------------------------------------------------------------------

/// Scene API endpoint options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiOptions {
    /// Base URL of the scene API (e.g. `https://host/tv/api`). The
    /// scene-detail path is appended to this.
    pub base_url: String,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_url: "/tv/api".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// HTTP transport options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpOptions {
    /// Global per-request timeout in seconds. The only stall protection a
    /// load has; there are no retries.
    pub timeout_secs: u64,
    /// Read chunk size in bytes for streaming downloads. Each chunk
    /// produces one progress event.
    pub chunk_size: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            chunk_size: 64 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Camera projection defaults, matching the upstream viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 55.0,
            znear: 0.1,
            zfar: 200_000.0,
        }
    }
}
