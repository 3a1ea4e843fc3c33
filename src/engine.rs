//! File and directory keying engine.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::overlay;
use crate::session::SessionConfig;
use crate::settings::Settings;
use crate::transparency::{self, KeyColor};

/// Options controlling file processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Key images even when the effect target disables analysis.
    pub force: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (analysis disabled).
    pub skipped: bool,
    /// Number of pixels made transparent.
    pub transparent_pixels: u64,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            transparent_pixels: 0,
            message: String::new(),
        }
    }

    fn failed(path: &Path, message: String) -> Self {
        Self {
            message,
            ..Self::new(path)
        }
    }
}

/// Keys frames with the configured color and optionally lays the basis
/// overlay on top.
///
/// The key color is read from the settings on every call, never cached.
pub struct KeyingEngine {
    settings: Settings,
    session: SessionConfig,
    basis: Option<RgbaImage>,
}

impl KeyingEngine {
    /// Create an engine from settings and a session.
    ///
    /// The basis overlay is the session preset's outline from
    /// `settings.preset_dir` when a preset is set, otherwise the settings
    /// background. A basis that cannot be opened is logged and skipped.
    #[must_use]
    pub fn new(settings: Settings, session: SessionConfig) -> Self {
        let basis = basis_path(&settings, &session).and_then(|path| load_basis(&path));
        Self {
            settings,
            session,
            basis,
        }
    }

    /// Create an engine with an explicit basis overlay.
    ///
    /// The settings background is cleared without being opened.
    #[must_use]
    pub fn with_basis_image(mut settings: Settings, session: SessionConfig, basis: RgbaImage) -> Self {
        settings.background = None;
        Self {
            settings,
            session,
            basis: Some(basis),
        }
    }

    /// The basis overlay in its stored orientation, if any.
    #[must_use]
    pub fn basis(&self) -> Option<&RgbaImage> {
        self.basis.as_ref()
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings, e.g. to change the key color between frames.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// The key color that the next call will use.
    #[must_use]
    pub fn key_color(&self) -> KeyColor {
        self.settings.key_color()
    }

    /// Key a frame with the configured key color.
    #[must_use]
    pub fn key(&self, frame: &RgbaImage) -> RgbaImage {
        transparency::apply_transparency(frame, self.key_color())
    }

    /// Key a frame and composite the oriented basis overlay over it.
    ///
    /// Without a basis this is the same as [`KeyingEngine::key`].
    #[must_use]
    pub fn render(&self, frame: &RgbaImage) -> RgbaImage {
        self.lay_basis(self.key(frame))
    }

    fn lay_basis(&self, keyed: RgbaImage) -> RgbaImage {
        match &self.basis {
            Some(basis) => {
                let oriented = self.session.overlay().apply(basis);
                overlay::composite(&keyed, &oriented, self.settings.overlay_opacity())
            }
            None => keyed,
        }
    }

    /// Process a single image file: load, key, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        if !opts.force && !self.session.analysis_enabled() {
            result.skipped = true;
            result.success = true;
            result.message = "Color-key preview disabled by settings".to_string();
            return result;
        }

        let frame = match image::open(input) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let keyed = self.key(&frame);
        result.transparent_pixels = transparency::count_transparent(&keyed);
        debug!(
            "{}: {}x{}, {} pixel(s) keyed out with {}",
            input.display(),
            frame.width(),
            frame.height(),
            result.transparent_pixels,
            self.key_color()
        );

        let rendered = self.lay_basis(keyed);

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&rendered, output) {
            Ok(()) => {
                result.success = true;
                result.message = format!("{} pixel(s) made transparent", result.transparent_pixels);
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Outputs are written as `<stem>.png` under `output_dir`. Inputs that
    /// share a stem (`a.png`, `a.bmp`) keep their extension instead
    /// (`a.png.png`, `a.bmp.png`). `output_dir` must not be `input_dir`.
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };
        inputs.sort();

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        if same_dir(input_dir, output_dir) {
            return vec![ProcessResult::failed(
                output_dir,
                "Output directory must differ from the input directory".to_string(),
            )];
        }

        let jobs: Vec<(PathBuf, Option<PathBuf>)> = inputs
            .iter()
            .cloned()
            .zip(output_names(&inputs))
            .map(|(input, name)| (input, name.map(|n| output_dir.join(n))))
            .collect();

        let process = |(input_path, output_path): &(PathBuf, Option<PathBuf>)| match output_path {
            Some(output_path) => self.process_file(input_path, output_path, opts),
            None => ProcessResult::failed(
                input_path,
                "Output name collides with another input".to_string(),
            ),
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter().map(process).collect()
        }
    }
}

/// Counts of keyed, skipped and failed files in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Files keyed and saved.
    pub keyed: u32,
    /// Files skipped because analysis was disabled.
    pub skipped: u32,
    /// Files that failed to load, key or save.
    pub failed: u32,
}

impl Summary {
    /// Tally a batch of results.
    #[must_use]
    pub fn of(results: &[ProcessResult]) -> Self {
        results.iter().fold(Self::default(), |mut s, r| {
            if r.skipped {
                s.skipped += 1;
            } else if r.success {
                s.keyed += 1;
            } else {
                s.failed += 1;
            }
            s
        })
    }

    /// Number of results tallied.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.keyed + self.skipped + self.failed
    }
}

fn basis_path(settings: &Settings, session: &SessionConfig) -> Option<PathBuf> {
    match session.preset {
        Some(preset) => Some(settings.preset_dir.join(preset.asset_name())),
        None => settings.background.clone(),
    }
}

fn load_basis(path: &Path) -> Option<RgbaImage> {
    match image::open(path) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            warn!(
                "basis {} cannot be opened, continuing without overlay: {e}",
                path.display()
            );
            None
        }
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Output file name per input; `None` where the name is already taken.
fn output_names(inputs: &[PathBuf]) -> Vec<Option<String>> {
    let stem_of = |p: &PathBuf| {
        p.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase()
    };

    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for input in inputs {
        *stem_counts.entry(stem_of(input)).or_default() += 1;
    }

    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let name = if stem_counts[&stem_of(input)] > 1 {
                input.file_name().unwrap_or_default().to_string_lossy().into_owned()
            } else {
                input.file_stem().unwrap_or_default().to_string_lossy().into_owned()
            };
            let name = format!("{name}.png");
            taken.insert(name.to_lowercase()).then_some(name)
        })
        .collect()
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save a keyed image in a format that keeps its alpha channel.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for formats without alpha (such as
/// JPEG) or unknown extensions, and an I/O or encoding error if writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{format:?} cannot store transparency"
            )));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_keyed.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_keyed.png"))
}
