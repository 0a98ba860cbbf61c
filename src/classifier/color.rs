//! # Color Preview
//!
//! A local, approximate swatch built from the first three spectral channels.
//! Purely cosmetic: the authoritative skin type always comes from the backend.
//!
//! The swatch also carries an Individual Typology Angle estimate
//! (sRGB → CIE-Lab under D65 → `atan((L* - 50) / b*)`) that is only shown in
//! debug output.

use crate::constants::{PREVIEW_MAX, PREVIEW_SCALE, SENSOR_CHANNEL_COUNT};
use crate::device::frame::Readings;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// CSS-style `rgb(r,g,b)` string.
    pub fn css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Converts to CIE-Lab (D65 white point).
    pub fn to_lab(&self) -> Lab {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);

        let x = (0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / D65_XN;
        let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
        let z = (0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b) / D65_ZN;

        let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

/// A CIE-Lab color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    /// Individual Typology Angle in degrees.
    ///
    /// With `b* == 0` the angle is ±90° (sign of `L* - 50`), 0° for mid grey.
    pub fn ita_degrees(&self) -> f64 {
        let dl = self.l - 50.0;
        if self.b.abs() < f64::EPSILON {
            return 90.0 * if dl > 0.0 { 1.0 } else if dl < 0.0 { -1.0 } else { 0.0 };
        }
        (dl / self.b).atan().to_degrees()
    }
}

const D65_XN: f64 = 0.950_47;
const D65_ZN: f64 = 1.088_83;

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

/// Scales one raw channel into a color component. Non-finite and negative
/// readings give 0, anything past the top of the range gives 255.
pub fn scale_channel(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    (value * PREVIEW_SCALE).clamp(0.0, PREVIEW_MAX) as u8
}

/// The preview swatch plus its approximate ITA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPreview {
    pub color: Rgb,
    pub approx_ita: f64,
}

impl ColorPreview {
    /// Builds the swatch from channels 0, 1 and 2.
    pub fn from_readings(readings: &Readings) -> Self {
        let color = Rgb::new(
            scale_channel(readings[0]),
            scale_channel(readings[1]),
            scale_channel(readings[2]),
        );
        ColorPreview {
            color,
            approx_ita: color.to_lab().ita_degrees(),
        }
    }
}

/// Reading vector the dashboard's "simulate skin type" buttons produce for a
/// target color: the first three channels reverse the preview scaling, the
/// remaining channels carry the mean.
pub fn simulated_readings(r: u8, g: u8, b: u8) -> Readings {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let mut readings = [(r + g + b) / (3.0 * PREVIEW_SCALE); SENSOR_CHANNEL_COUNT];
    readings[0] = r / PREVIEW_SCALE;
    readings[1] = g / PREVIEW_SCALE;
    readings[2] = b / PREVIEW_SCALE;
    readings
}
