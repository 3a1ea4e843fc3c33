//! Camera session configuration.
//!
//! Lens, zoom and overlay state are plain values owned by the caller and
//! passed into every session setup. Nothing here talks to camera hardware.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::settings::{EffectTarget, Settings};

/// Which camera the session binds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lens {
    /// Rear-facing camera.
    #[default]
    Back,
    /// Front-facing camera.
    Front,
}

impl Lens {
    /// The other lens.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Back => Self::Front,
            Self::Front => Self::Back,
        }
    }
}

/// Linear zoom as a progress value in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Zoom(u8);

impl Zoom {
    /// Maximum progress value.
    pub const MAX: u8 = 100;

    /// Create a zoom level, clamping to `0..=100`.
    #[must_use]
    pub fn new(progress: u8) -> Self {
        Self(progress.min(Self::MAX))
    }

    /// Zoom progress in `0..=100`.
    #[must_use]
    pub fn progress(self) -> u8 {
        self.0
    }

    /// Linear zoom in `[0, 1]` across the lens range.
    #[must_use]
    pub fn linear(self) -> f32 {
        f32::from(self.0) / f32::from(Self::MAX)
    }

    /// The value stored in a photo's `DigitalZoomRatio` tag.
    #[must_use]
    pub fn to_exif_value(self) -> String {
        self.0.to_string()
    }

    /// Parse a `DigitalZoomRatio` tag value written by [`Zoom::to_exif_value`].
    ///
    /// Fractional values are truncated and out-of-range values clamped. An
    /// empty tag means no zoom was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidZoom`] if the value is not a finite number.
    pub fn from_exif_value(value: &str) -> Result<Option<Self>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let parsed: f32 = value
            .parse()
            .map_err(|_| Error::InvalidZoom(value.to_string()))?;
        if !parsed.is_finite() {
            return Err(Error::InvalidZoom(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let progress = parsed.trunc().clamp(0.0, f32::from(Self::MAX)) as u8;
        Ok(Some(Self(progress)))
    }
}

/// Orientation applied to the basis overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayTransform {
    quarter_turns: u8,
    /// Mirror left-right.
    pub mirror_x: bool,
    /// Mirror top-bottom.
    pub mirror_y: bool,
}

impl OverlayTransform {
    /// Transform with the given clockwise rotation in quarter turns.
    #[must_use]
    pub fn rotated(quarter_turns: u32) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let quarter_turns = (quarter_turns % 4) as u8;
        Self {
            quarter_turns,
            ..Self::default()
        }
    }

    /// Clockwise rotation in degrees: 0, 90, 180 or 270.
    #[must_use]
    pub fn rotation_degrees(self) -> u16 {
        u16::from(self.quarter_turns) * 90
    }

    /// Clockwise rotation in quarter turns, `0..4`.
    #[must_use]
    pub fn quarter_turns(self) -> u8 {
        self.quarter_turns
    }

    /// Rotate a further 90 degrees clockwise.
    pub fn rotate(&mut self) {
        self.quarter_turns = (self.quarter_turns + 1) % 4;
    }

    /// Flip the left-right mirror.
    pub fn toggle_mirror_x(&mut self) {
        self.mirror_x = !self.mirror_x;
    }

    /// Flip the top-bottom mirror.
    pub fn toggle_mirror_y(&mut self) {
        self.mirror_y = !self.mirror_y;
    }

    /// Whether this transform leaves an image untouched.
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::default()
    }
}

/// Built-in body-part outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasisPreset {
    /// Left ear.
    LeftEar,
    /// Right ear.
    RightEar,
    /// Left foot.
    LeftFoot,
    /// Right foot.
    RightFoot,
    /// Left hand.
    LeftHand,
    /// Right hand.
    RightHand,
    /// Head.
    Head,
}

impl BasisPreset {
    /// All presets.
    pub const ALL: [Self; 7] = [
        Self::LeftEar,
        Self::RightEar,
        Self::LeftFoot,
        Self::RightFoot,
        Self::LeftHand,
        Self::RightHand,
        Self::Head,
    ];

    /// Name used to request the preset, e.g. `left_ear`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftFoot => "left_foot",
            Self::RightFoot => "right_foot",
            Self::LeftHand => "left_hand",
            Self::RightHand => "right_hand",
            Self::Head => "head",
        }
    }

    /// File name of the outline asset, e.g. `ear_left.png`.
    #[must_use]
    pub fn asset_name(self) -> &'static str {
        match self {
            Self::LeftEar => "ear_left.png",
            Self::RightEar => "ear_right.png",
            Self::LeftFoot => "foot_left.png",
            Self::RightFoot => "foot_right.png",
            Self::LeftHand => "hand_left.png",
            Self::RightHand => "hand_right.png",
            Self::Head => "head.png",
        }
    }
}

impl fmt::Display for BasisPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BasisPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownPreset(s.to_string()))
    }
}

/// Everything a camera session setup needs, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// Bound lens.
    pub lens: Lens,
    /// Linear zoom.
    pub zoom: Zoom,
    /// Effect target; decides whether frames are analyzed.
    pub effect: EffectTarget,
    /// Built-in outline, if the session was opened for one.
    pub preset: Option<BasisPreset>,
    overlay: OverlayTransform,
}

impl SessionConfig {
    /// Session defaults taking the effect target from settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            effect: settings.effect,
            ..Self::default()
        }
    }

    /// Session locked to a built-in outline.
    #[must_use]
    pub fn with_preset(mut self, preset: BasisPreset) -> Self {
        self.preset = Some(preset);
        self.overlay = OverlayTransform::default();
        self
    }

    /// Whether each preview frame goes through color-key analysis.
    #[must_use]
    pub fn analysis_enabled(&self) -> bool {
        self.effect == EffectTarget::TransparentColorPreview
    }

    /// Current overlay orientation.
    #[must_use]
    pub fn overlay(&self) -> OverlayTransform {
        self.overlay
    }

    /// Whether the overlay can be reoriented. Presets are fixed.
    #[must_use]
    pub fn overlay_adjustable(&self) -> bool {
        self.preset.is_none()
    }

    /// Replace the overlay orientation. Returns `false` for preset sessions.
    pub fn set_overlay(&mut self, overlay: OverlayTransform) -> bool {
        self.adjust_overlay(|o| *o = overlay)
    }

    /// Rotate the overlay 90 degrees. Returns `false` for preset sessions.
    pub fn rotate_overlay(&mut self) -> bool {
        self.adjust_overlay(OverlayTransform::rotate)
    }

    /// Toggle the left-right mirror. Returns `false` for preset sessions.
    pub fn mirror_overlay_x(&mut self) -> bool {
        self.adjust_overlay(OverlayTransform::toggle_mirror_x)
    }

    /// Toggle the top-bottom mirror. Returns `false` for preset sessions.
    pub fn mirror_overlay_y(&mut self) -> bool {
        self.adjust_overlay(OverlayTransform::toggle_mirror_y)
    }

    fn adjust_overlay(&mut self, f: impl FnOnce(&mut OverlayTransform)) -> bool {
        if !self.overlay_adjustable() {
            return false;
        }
        f(&mut self.overlay);
        true
    }

    /// Switch between front and back camera.
    pub fn toggle_lens(&mut self) {
        self.lens = self.lens.toggled();
    }

    /// Name prefix for captured photos: `{id}-{preset}`.
    ///
    /// Sessions without a preset use the id alone.
    #[must_use]
    pub fn capture_prefix(&self, id: &str) -> String {
        match self.preset {
            Some(preset) => format!("{id}-{preset}"),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lens_toggles_back_and_forth() {
        let mut session = SessionConfig::default();
        assert_eq!(session.lens, Lens::Back);
        session.toggle_lens();
        assert_eq!(session.lens, Lens::Front);
        session.toggle_lens();
        assert_eq!(session.lens, Lens::Back);
    }

    #[test]
    fn zoom_clamps_and_maps_to_linear() {
        assert_eq!(Zoom::new(250).progress(), 100);
        assert!((Zoom::new(50).linear() - 0.5).abs() < f32::EPSILON);
        assert!(Zoom::default().linear().abs() < f32::EPSILON);
    }

    #[test]
    fn zoom_exif_value_round_trips() {
        let zoom = Zoom::new(42);
        assert_eq!(zoom.to_exif_value(), "42");
        assert_eq!(Zoom::from_exif_value(&zoom.to_exif_value()).unwrap(), Some(zoom));
    }

    #[test]
    fn zoom_exif_value_truncates_and_clamps() {
        assert_eq!(Zoom::from_exif_value("37.9").unwrap(), Some(Zoom::new(37)));
        assert_eq!(Zoom::from_exif_value("1000").unwrap(), Some(Zoom::new(100)));
        assert_eq!(Zoom::from_exif_value("-3").unwrap(), Some(Zoom::new(0)));
        assert_eq!(Zoom::from_exif_value("  ").unwrap(), None);
        assert!(matches!(Zoom::from_exif_value("wide"), Err(Error::InvalidZoom(_))));
        assert!(Zoom::from_exif_value("NaN").is_err());
    }

    #[test]
    fn rotation_wraps_after_four_turns() {
        let mut t = OverlayTransform::default();
        for expected in [90, 180, 270, 0] {
            t.rotate();
            assert_eq!(t.rotation_degrees(), expected);
        }
        assert!(t.is_identity());
        assert_eq!(OverlayTransform::rotated(7).quarter_turns(), 3);
    }

    #[test]
    fn mirrors_toggle() {
        let mut session = SessionConfig::default();
        assert!(session.mirror_overlay_x());
        assert!(session.mirror_overlay_y());
        assert!(session.overlay().mirror_x && session.overlay().mirror_y);
        assert!(session.mirror_overlay_x());
        assert!(!session.overlay().mirror_x);
    }

    #[test]
    fn preset_locks_overlay() {
        let mut session = SessionConfig::default();
        session.rotate_overlay();
        let mut session = session.with_preset(BasisPreset::Head);

        assert!(session.overlay().is_identity());
        assert!(!session.overlay_adjustable());
        assert!(!session.rotate_overlay());
        assert!(!session.mirror_overlay_x());
        assert!(!session.set_overlay(OverlayTransform::rotated(1)));
        assert!(session.overlay().is_identity());
    }

    #[test]
    fn preset_names_parse() {
        for preset in BasisPreset::ALL {
            assert_eq!(preset.name().parse::<BasisPreset>().unwrap(), preset);
        }
        assert_eq!(BasisPreset::LeftEar.asset_name(), "ear_left.png");
        assert!(matches!(
            "tail".parse::<BasisPreset>(),
            Err(Error::UnknownPreset(_))
        ));
    }

    #[test]
    fn capture_prefix_includes_preset() {
        let session = SessionConfig::default().with_preset(BasisPreset::RightHand);
        assert_eq!(session.capture_prefix("p17"), "p17-right_hand");
        assert_eq!(SessionConfig::default().capture_prefix("p17"), "p17");
    }

    #[test]
    fn analysis_follows_effect_target() {
        let mut settings = Settings::default();
        assert!(SessionConfig::from_settings(&settings).analysis_enabled());
        settings.effect = EffectTarget::None;
        assert!(!SessionConfig::from_settings(&settings).analysis_enabled());
    }
}
