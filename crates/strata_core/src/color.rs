//! Linear RGB colors and sRGB transfer functions.

use strata_math::Vec3;

/// Color type alias (linear RGB, typically 0-1)
pub type Color = Vec3;

/// Convert a single sRGB-encoded channel to linear.
#[inline]
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a single linear channel to sRGB encoding.
#[inline]
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Decode a gamma-encoded color into linear space.
pub fn from_srgb(c: Color) -> Color {
    Color::new(srgb_to_linear(c.x), srgb_to_linear(c.y), srgb_to_linear(c.z))
}

/// Encode a linear color with the sRGB transfer curve.
pub fn to_srgb(c: Color) -> Color {
    Color::new(linear_to_srgb(c.x), linear_to_srgb(c.y), linear_to_srgb(c.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_to_linear() {
        // Black stays black
        assert!((srgb_to_linear(0.0) - 0.0).abs() < 0.001);

        // White stays white
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128.0 / 255.0);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }

    #[test]
    fn test_gamma_round_trip() {
        let colors = [
            Color::new(0.0, 0.5, 1.0),
            Color::new(0.001, 0.02, 0.2),
            Color::new(0.73, 0.11, 0.9),
        ];
        for c in colors {
            let back = to_srgb(from_srgb(c));
            assert!((back - c).abs().max_element() < 1e-5, "{:?} -> {:?}", c, back);
        }
    }
}
