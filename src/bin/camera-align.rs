use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{debug, info};

use camera_align::{
    default_output_path, BasisPreset, KeyColor, KeyingEngine, OverlayTransform, ProcessOptions,
    ProcessResult, SessionConfig, Settings, Summary,
};

#[derive(Parser)]
#[command(
    name = "camera-align",
    about = "Key out a color from camera frames and lay an alignment overlay on top",
    version,
    after_help = "Simple usage: camera-align <image> --key 0,255,0  (writes <name>_keyed.png)\n\n\
                  Settings are read from a JSON file (key_color, transparency, effect, background).\n\
                  Command-line flags override the file."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_keyed.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Key color as r,g,b (overrides settings)
    #[arg(short, long)]
    key: Option<KeyColor>,

    /// Key images even when the effect target is "none"
    #[arg(short, long)]
    force: bool,

    /// Basis overlay image (overrides the settings background)
    #[arg(long, conflicts_with = "preset")]
    overlay: Option<PathBuf>,

    /// Overlay transparency 0-255 (overrides settings)
    #[arg(long)]
    transparency: Option<u8>,

    /// Built-in outline; disables overlay rotation and mirroring
    #[arg(long)]
    preset: Option<BasisPreset>,

    /// Directory holding the built-in outline images (overrides settings)
    #[arg(long)]
    preset_dir: Option<PathBuf>,

    /// Rotate the overlay clockwise by this many quarter turns
    #[arg(long, default_value = "0")]
    rotate: u32,

    /// Mirror the overlay left-right
    #[arg(long)]
    mirror_x: bool,

    /// Mirror the overlay top-bottom
    #[arg(long)]
    mirror_y: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let opts = ProcessOptions {
        force: cli.force,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let mut settings = match &cli.settings {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: Cannot read settings {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Some(key) = cli.key {
        settings.key_color = key;
    }
    if let Some(transparency) = cli.transparency {
        settings.transparency = transparency;
    }
    if let Some(dir) = cli.preset_dir {
        settings.preset_dir = dir;
    }

    let overlay_image = match &cli.overlay {
        Some(path) => match image::open(path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                eprintln!("Error: Cannot open overlay {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => None,
    };

    let mut session = SessionConfig::from_settings(&settings);
    if let Some(preset) = cli.preset {
        session = session.with_preset(preset);
    }
    let mut transform = OverlayTransform::rotated(cli.rotate);
    transform.mirror_x = cli.mirror_x;
    transform.mirror_y = cli.mirror_y;
    if !transform.is_identity() && !session.set_overlay(transform) {
        eprintln!("Error: Overlay orientation is fixed for preset outlines");
        process::exit(1);
    }

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        info!(
            "Key color {} (overlay {:.0}% opaque)",
            settings.key_color(),
            settings.overlay_opacity() * 100.0
        );
        if opts.force && !session.analysis_enabled() {
            eprintln!("WARNING: Force mode - keying despite effect target \"none\"");
        }
    }
    debug!("session: {session:?}");

    let engine = match overlay_image {
        Some(basis) => KeyingEngine::with_basis_image(settings, session, basis),
        None => KeyingEngine::new(settings, session),
    };
    if let Some(preset) = engine.session().preset {
        if engine.basis().is_none() {
            eprintln!("WARNING: Outline for preset {preset} not found, keying without overlay");
        }
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: camera-align <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, &opts)]
    };

    for r in &results {
        print_result(r, &opts);
    }

    let summary = Summary::of(&results);
    if summary.total() > 1 && !opts.quiet {
        print_summary(&summary);
    }

    if summary.failed > 0 {
        process::exit(1);
    }
}

fn print_summary(summary: &Summary) {
    let mut parts = vec![format!("Keyed: {}", summary.keyed)];
    if summary.skipped > 0 {
        parts.push(format!("Skipped: {}", summary.skipped));
    }
    if summary.failed > 0 {
        parts.push(format!("Failed: {}", summary.failed));
    }
    eprintln!();
    eprintln!("[Summary] {} (Total: {})", parts.join(", "), summary.total());
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            eprintln!("[OK] {filename} ({} transparent)", result.transparent_pixels);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
