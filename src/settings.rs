//! User settings read from a JSON file.
//!
//! Every field is optional. Missing fields take the same defaults the camera
//! app uses when a preference has never been written.
//!
//! ```json
//! {
//!   "key_color": { "red": 0, "green": 255, "blue": 0 },
//!   "transparency": 125,
//!   "effect": "transparent_color_preview",
//!   "background": "basis/outline.png",
//!   "preset_dir": "presets"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transparency::KeyColor;

/// Default overlay transparency on the 0-255 scale.
pub const DEFAULT_TRANSPARENCY: u8 = 125;

/// Default directory holding the built-in outline images.
pub const DEFAULT_PRESET_DIR: &str = "presets";

/// Where the green-screen effect is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    /// Run color-key analysis on every preview frame.
    #[default]
    TransparentColorPreview,
    /// Plain preview, no per-frame analysis.
    None,
}

/// Settings consumed by the keying engine and session setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Color made transparent in keyed frames.
    pub key_color: KeyColor,
    /// Basis overlay transparency, 0 (invisible) to 255 (opaque).
    pub transparency: u8,
    /// Effect target.
    pub effect: EffectTarget,
    /// Basis image shown over the preview, if one was chosen.
    pub background: Option<PathBuf>,
    /// Directory containing the outline images of [`crate::BasisPreset`]s.
    pub preset_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_color: KeyColor::default(),
            transparency: DEFAULT_TRANSPARENCY,
            effect: EffectTarget::default(),
            background: None,
            preset_dir: PathBuf::from(DEFAULT_PRESET_DIR),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read and
    /// [`crate::Error::Settings`] if it is not valid settings JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Settings`] on malformed JSON or out-of-range values.
    pub fn from_json(data: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(data)?;
        if settings.background.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            settings.background = None;
        }
        Ok(settings)
    }

    /// The configured key color.
    #[must_use]
    pub fn key_color(&self) -> KeyColor {
        self.key_color
    }

    /// Basis overlay opacity in `[0, 1]`.
    #[must_use]
    pub fn overlay_opacity(&self) -> f32 {
        f32::from(self.transparency) / 255.0
    }
}
