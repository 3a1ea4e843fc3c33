//! Color-key transparency for camera frames.
//!
//! Every pixel whose RGB equals the key color exactly becomes fully
//! transparent; every other pixel is written fully opaque. Color channels are
//! never modified. There is no tolerance band: `(0, 254, 0)` does not match a
//! `(0, 255, 0)` key.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Alpha written for pixels that match the key color.
const TRANSPARENT: u8 = 0;

/// Alpha written for every other pixel.
const OPAQUE: u8 = 255;

/// The RGB triple treated as transparent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyColor {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl KeyColor {
    /// Create a key color from its channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Build a key color from three decimal channel strings.
    ///
    /// Surrounding whitespace is ignored and an empty channel counts as `0`,
    /// matching how unset channel preferences behave.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyColor`] if a channel is not an integer in `0..=255`.
    pub fn from_channels(red: &str, green: &str, blue: &str) -> Result<Self> {
        Ok(Self {
            red: parse_channel(red)?,
            green: parse_channel(green)?,
            blue: parse_channel(blue)?,
        })
    }

    /// Whether the given RGB bytes equal this key exactly.
    #[inline]
    #[must_use]
    pub fn matches(self, rgb: [u8; 3]) -> bool {
        rgb == [self.red, self.green, self.blue]
    }
}

fn parse_channel(text: &str) -> Result<u8> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<u8>()
        .map_err(|e| Error::InvalidKeyColor(format!("channel {text:?}: {e}")))
}

impl FromStr for KeyColor {
    type Err = Error;

    /// Parse `"r,g,b"`, e.g. `"0,255,0"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        match parts.as_slice() {
            [r, g, b] => Self::from_channels(r, g, b),
            _ => Err(Error::InvalidKeyColor(format!(
                "expected \"r,g,b\", got {s:?}"
            ))),
        }
    }
}

impl fmt::Display for KeyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

/// Key a frame into a newly allocated image of the same dimensions.
///
/// Pixels equal to `key` get alpha 0, all others alpha 255. The input's own
/// alpha is ignored. An empty image produces an empty image.
#[must_use]
pub fn apply_transparency(input: &RgbaImage, key: KeyColor) -> RgbaImage {
    let mut output = input.clone();
    apply_transparency_in_place(&mut output, key);
    output
}

/// Key a frame in place, reusing its buffer.
pub fn apply_transparency_in_place(image: &mut RgbaImage, key: KeyColor) {
    key_pixels(image, key);
}

/// Key a raw RGBA byte buffer of `width * height` pixels.
///
/// # Errors
///
/// Returns [`Error::InvalidImageBuffer`] if `rgba.len()` is not exactly
/// `width * height * 4`. Nothing is processed in that case.
pub fn apply_transparency_raw(
    width: u32,
    height: u32,
    rgba: &[u8],
    key: KeyColor,
) -> Result<RgbaImage> {
    let invalid = || Error::InvalidImageBuffer {
        width,
        height,
        len: rgba.len(),
    };

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(invalid)?;
    if rgba.len() != expected {
        return Err(invalid());
    }

    let mut image = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or_else(invalid)?;
    key_pixels(&mut image, key);
    Ok(image)
}

/// Count fully transparent pixels.
#[must_use]
pub fn count_transparent(image: &RgbaImage) -> u64 {
    image
        .as_raw()
        .chunks_exact(4)
        .filter(|px| px[3] == TRANSPARENT)
        .count() as u64
}

fn key_pixels(image: &mut RgbaImage, key: KeyColor) {
    let buf: &mut [u8] = image;
    for px in buf.chunks_exact_mut(4) {
        px[3] = if key.matches([px[0], px[1], px[2]]) {
            TRANSPARENT
        } else {
            OPAQUE
        };
    }
}
