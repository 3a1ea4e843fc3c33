//! Basis overlay preparation.
//!
//! The basis image is reoriented by an [`OverlayTransform`] and blended over a
//! frame at the configured opacity.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::session::OverlayTransform;

impl OverlayTransform {
    /// Apply rotation (clockwise) and then mirroring to an image.
    ///
    /// Odd quarter turns swap width and height.
    #[must_use]
    pub fn apply(self, image: &RgbaImage) -> RgbaImage {
        let mut out = match self.quarter_turns() {
            1 => imageops::rotate90(image),
            2 => imageops::rotate180(image),
            3 => imageops::rotate270(image),
            _ => image.clone(),
        };
        if self.mirror_x {
            imageops::flip_horizontal_in_place(&mut out);
        }
        if self.mirror_y {
            imageops::flip_vertical_in_place(&mut out);
        }
        out
    }
}

/// Blend `basis` over `frame` at `opacity`.
///
/// The basis is scaled to fit inside the frame with its aspect ratio kept and
/// centered; frame pixels outside it are left alone. Each basis pixel
/// contributes `opacity * alpha / 255`; `opacity` is clamped to `[0, 1]`. The
/// result keeps the frame's dimensions, and a pixel's alpha never drops below
/// the frame's.
#[must_use]
pub fn composite(frame: &RgbaImage, basis: &RgbaImage, opacity: f32) -> RgbaImage {
    let (width, height) = frame.dimensions();
    let mut out = frame.clone();
    if width == 0 || height == 0 || basis.width() == 0 || basis.height() == 0 {
        return out;
    }

    let opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
    if opacity == 0.0 {
        return out;
    }

    let (fit_w, fit_h) = fit_within(basis.dimensions(), (width, height));
    let scaled;
    let basis = if basis.dimensions() == (fit_w, fit_h) {
        basis
    } else {
        scaled = imageops::resize(basis, fit_w, fit_h, FilterType::Triangle);
        &scaled
    };

    let (left, top) = ((width - fit_w) / 2, (height - fit_h) / 2);
    for (x, y, src) in basis.enumerate_pixels() {
        let dst = out.get_pixel_mut(left + x, top + y);
        *dst = blend(*dst, *src, opacity);
    }
    out
}

/// Largest size with the aspect ratio of `src` that fits in `bounds`.
#[allow(clippy::cast_possible_truncation)]
fn fit_within(src: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (u64::from(src.0), u64::from(src.1));
    let (bw, bh) = (u64::from(bounds.0), u64::from(bounds.1));
    // Compare sw/sh against bw/bh without floats.
    let (w, h) = if sw * bh >= bw * sh {
        (bw, (sh * bw + sw / 2) / sw)
    } else {
        ((sw * bh + sh / 2) / sh, bh)
    };
    (w.clamp(1, bw) as u32, h.clamp(1, bh) as u32)
}

fn blend(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let a = opacity * f32::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let mut out = dst;
    for ch in 0..3 {
        let mixed = f32::from(src[ch]) * a + f32::from(dst[ch]) * (1.0 - a);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            out[ch] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cover = (a * 255.0).round().clamp(0.0, 255.0) as u8;
    out[3] = dst[3].max(cover);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each pixel encodes its own coordinates.
    fn marked(width: u32, height: u32) -> RgbaImage {
        let coord = |v: u32| u8::try_from(v).unwrap();
        RgbaImage::from_fn(width, height, |x, y| Rgba([coord(x), coord(y), 0, 255]))
    }

    #[test]
    fn identity_transform_copies() {
        let img = marked(3, 2);
        assert_eq!(OverlayTransform::default().apply(&img), img);
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let img = marked(3, 2);
        let out = OverlayTransform::rotated(1).apply(&img);
        assert_eq!(out.dimensions(), (2, 3));
        // Bottom-left source pixel lands top-left after a clockwise turn.
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 1, 0, 255]));
    }

    #[test]
    fn half_turn_equals_both_mirrors() {
        let img = marked(4, 3);
        let half = OverlayTransform::rotated(2).apply(&img);

        let mut both = OverlayTransform::default();
        both.toggle_mirror_x();
        both.toggle_mirror_y();
        assert_eq!(half, both.apply(&img));
    }

    #[test]
    fn mirror_x_flips_columns() {
        let img = marked(3, 1);
        let mut t = OverlayTransform::default();
        t.toggle_mirror_x();
        let out = t.apply(&img);
        assert_eq!(*out.get_pixel(0, 0), Rgba([2, 0, 0, 255]));
        assert_eq!(*out.get_pixel(2, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn zero_opacity_returns_frame() {
        let frame = marked(4, 4);
        let basis = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        assert_eq!(composite(&frame, &basis, 0.0), frame);
        assert_eq!(composite(&frame, &basis, f32::NAN), frame);
    }

    #[test]
    fn full_opacity_replaces_frame() {
        let frame = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let basis = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 255]));
        let out = composite(&frame, &basis, 1.5);
        for px in out.pixels() {
            assert_eq!(*px, Rgba([200, 100, 50, 255]));
        }
    }

    #[test]
    fn half_opacity_mixes_and_lifts_alpha() {
        let frame = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let basis = RgbaImage::from_pixel(1, 1, Rgba([200, 200, 200, 255]));
        let out = composite(&frame, &basis, 0.5);
        assert_eq!(*out.get_pixel(0, 0), Rgba([100, 100, 100, 128]));
    }

    #[test]
    fn transparent_basis_pixels_leave_frame_alone() {
        let frame = marked(2, 2);
        let basis = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 0]));
        assert_eq!(composite(&frame, &basis, 1.0), frame);
    }

    #[test]
    fn basis_is_fitted_and_centered() {
        let frame = RgbaImage::from_pixel(8, 6, Rgba([0, 0, 0, 255]));
        let basis = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let out = composite(&frame, &basis, 1.0);
        assert_eq!(out.dimensions(), (8, 6));

        // A square basis becomes 6x6 with one untouched column on each side.
        for y in 0..6 {
            assert_eq!(*out.get_pixel(0, y), Rgba([0, 0, 0, 255]));
            assert_eq!(*out.get_pixel(7, y), Rgba([0, 0, 0, 255]));
            for x in 1..7 {
                assert!(out.get_pixel(x, y)[0] >= 250);
            }
        }
    }

    #[test]
    fn turned_basis_keeps_its_aspect_ratio() {
        let frame = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let basis = RgbaImage::from_pixel(2, 4, Rgba([255, 255, 255, 255]));
        let turned = OverlayTransform::rotated(1).apply(&basis);
        assert_eq!(turned.dimensions(), (4, 2));

        let out = composite(&frame, &turned, 1.0);
        for x in 0..4 {
            assert_eq!(*out.get_pixel(x, 0), Rgba([0, 0, 0, 255]));
            assert_eq!(*out.get_pixel(x, 1), Rgba([255, 255, 255, 255]));
            assert_eq!(*out.get_pixel(x, 2), Rgba([255, 255, 255, 255]));
            assert_eq!(*out.get_pixel(x, 3), Rgba([0, 0, 0, 255]));
        }
    }

    #[test]
    fn fit_within_preserves_ratio() {
        assert_eq!(fit_within((2, 2), (8, 6)), (6, 6));
        assert_eq!(fit_within((4, 2), (4, 4)), (4, 2));
        assert_eq!(fit_within((1, 100), (10, 10)), (1, 10));
        assert_eq!(fit_within((640, 480), (640, 480)), (640, 480));
    }
}
