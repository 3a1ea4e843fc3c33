//! Error types for the camera-align crate.

/// Errors that can occur while keying frames or preparing a camera session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A raw pixel buffer does not hold exactly `width * height` RGBA pixels.
    #[error("invalid image buffer: {len} bytes cannot hold {width}x{height} RGBA pixels")]
    InvalidImageBuffer {
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
        /// Actual buffer length in bytes.
        len: usize,
    },

    /// A key color could not be parsed from its text form.
    #[error("invalid key color: {0}")]
    InvalidKeyColor(String),

    /// A recorded zoom value is not a number.
    #[error("invalid zoom value: {0:?}")]
    InvalidZoom(String),

    /// The basis preset name is not one of the built-in outlines.
    #[error("unknown basis preset: {0}")]
    UnknownPreset(String),

    /// The settings file is not valid JSON for [`crate::settings::Settings`].
    #[error("failed to parse settings: {0}")]
    Settings(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
