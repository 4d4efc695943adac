//! WCAG color math

use serde::{Deserialize, Serialize};

/// An sRGB color with channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`, each channel truncated to an integer in `0..=255`
    pub fn to_hex(&self) -> String {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0) as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

/// Decode a packed `0xRRGGBB` color. Zero is the format's "unset" value
/// and reads as black.
pub fn rgb_from_packed_int(value: u32) -> Rgb {
    if value == 0 {
        return Rgb::BLACK;
    }
    let channel = |shift: u32| ((value >> shift) & 0xFF) as f64 / 255.0;
    Rgb::new(channel(16), channel(8), channel(0))
}

/// WCAG relative luminance
pub fn luminance(color: Rgb) -> f64 {
    fn linear(c: f64) -> f64 {
        if c <= 0.03928 {
            c
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * linear(color.r) + 0.7152 * linear(color.g) + 0.0722 * linear(color.b)
}

/// WCAG contrast ratio, from 1.0 (identical) to 21.0 (black on white)
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = luminance(a);
    let lb = luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_black_on_white_is_21() {
        let ratio = contrast_ratio(Rgb::BLACK, Rgb::WHITE);
        assert!((ratio - 21.0).abs() < 1e-9, "got {}", ratio);
    }

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(Rgb::BLACK), 0.0);
        assert!((luminance(Rgb::WHITE) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_packed_zero_is_black() {
        assert_eq!(rgb_from_packed_int(0), Rgb::BLACK);
    }

    #[test]
    fn test_packed_channels() {
        let c = rgb_from_packed_int(0xFF8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.to_hex(), "#ff8000");
    }

    #[test]
    fn test_mid_gray_fails_normal_text() {
        // #777777 on white is about 4.48:1, just under AA
        let ratio = contrast_ratio(rgb_from_packed_int(0x777777), Rgb::WHITE);
        assert!(ratio < 4.5 && ratio > 4.4, "got {}", ratio);
    }

    fn channel() -> impl Strategy<Value = f64> {
        0.0f64..=1.0
    }

    proptest! {
        #[test]
        fn contrast_is_symmetric(
            r1 in channel(), g1 in channel(), b1 in channel(),
            r2 in channel(), g2 in channel(), b2 in channel(),
        ) {
            let a = Rgb::new(r1, g1, b1);
            let b = Rgb::new(r2, g2, b2);
            prop_assert_eq!(contrast_ratio(a, b), contrast_ratio(b, a));
        }

        #[test]
        fn contrast_with_self_is_one(r in channel(), g in channel(), b in channel()) {
            let c = Rgb::new(r, g, b);
            prop_assert_eq!(contrast_ratio(c, c), 1.0);
        }

        #[test]
        fn contrast_is_bounded(
            r1 in channel(), g1 in channel(), b1 in channel(),
            r2 in channel(), g2 in channel(), b2 in channel(),
        ) {
            let ratio = contrast_ratio(Rgb::new(r1, g1, b1), Rgb::new(r2, g2, b2));
            prop_assert!(ratio >= 1.0);
            prop_assert!(ratio <= 21.0 + 1e-9);
        }
    }
}
