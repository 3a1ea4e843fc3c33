//! Key one color out of a single image.
//!
//! Usage:
//! ```sh
//! cargo run --example key_frame -- input.jpg output.png 0,255,0
//! ```

use std::env;
use std::process;

use camera_align::{KeyColor, KeyingEngine, ProcessOptions, SessionConfig, Settings};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <input> <output.png> <r,g,b>", args[0]);
        process::exit(1);
    }

    let key: KeyColor = match args[3].parse() {
        Ok(k) => k,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let settings = Settings {
        key_color: key,
        ..Settings::default()
    };
    let session = SessionConfig::from_settings(&settings);
    let engine = KeyingEngine::new(settings, session);
    let result = engine.process_file(args[1].as_ref(), args[2].as_ref(), &ProcessOptions::default());

    if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
