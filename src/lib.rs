//! Color-key transparency and overlay alignment for live camera frames.
//!
//! A camera preview is shown together with a static "basis" image (for
//! example a body-part outline) so a new photo can be lined up with an old
//! one. This crate holds the portable parts of that workflow: keying out a
//! chosen RGB color from each frame, orienting and blending the basis overlay,
//! and the caller-owned session state (lens, zoom, overlay orientation).
//!
//! # Quick Start
//!
//! ```no_run
//! use camera_align::{apply_transparency, KeyColor};
//!
//! let frame = image::open("frame.png").unwrap().to_rgba8();
//! let keyed = apply_transparency(&frame, KeyColor::new(0, 255, 0));
//! keyed.save("keyed.png").unwrap();
//! ```
//!
//! # Settings and sessions
//!
//! ```no_run
//! use std::path::Path;
//! use camera_align::{KeyingEngine, ProcessOptions, SessionConfig, Settings};
//!
//! let settings = Settings::load(Path::new("settings.json")).unwrap();
//! let mut session = SessionConfig::from_settings(&settings);
//! session.rotate_overlay();
//!
//! let engine = KeyingEngine::new(settings, session);
//! let result = engine.process_file(
//!     Path::new("frame.jpg"),
//!     Path::new("frame_keyed.png"),
//!     &ProcessOptions::default(),
//! );
//! println!("{}", result.message);
//! ```

#![deny(missing_docs)]

mod engine;
pub mod error;
pub mod overlay;
pub mod session;
pub mod settings;
pub mod transparency;
#[cfg(feature = "stream")]
pub mod worker;

pub use engine::{
    default_output_path, is_supported_image, save_image, KeyingEngine, ProcessOptions,
    ProcessResult, Summary,
};
pub use error::{Error, Result};
pub use session::{BasisPreset, Lens, OverlayTransform, SessionConfig, Zoom};
pub use settings::{EffectTarget, Settings};
pub use transparency::{
    apply_transparency, apply_transparency_in_place, apply_transparency_raw, count_transparent,
    KeyColor,
};
#[cfg(feature = "stream")]
pub use worker::{FrameWorker, KeySource, KeyedFrame};
