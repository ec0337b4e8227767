//! Color types and conversion functions for the synchronization engine.
//!
//! Provides five color types (`Srgb`, `LinearRgb`, `Xyz`, `Lab`, `Hsv`) and
//! pure conversion functions between them. All conversions are pure functions
//! (no methods with side effects). Uses `f64` throughout for precision.
//!
//! LAB is computed relative to the D50 illuminant per ICC convention: sRGB is
//! linearized, taken to XYZ with the standard D65 matrix, then re-referenced
//! to D50 with a fixed Bradford adaptation matrix. This matches the behavior
//! of professional image editors, which exchange LAB values in the D50 frame.

use crate::error::SyncError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// sRGB display color with components in [0, 1].
///
/// Serializes as a hex string `"#RRGGBB"` for human-readable formats.
/// The hex round-trip has 8-bit quantization (1/255 precision loss),
/// which is acceptable since hex colors are inherently 8-bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Linear (scene-referred) RGB color, the canonical storage space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// CIE 1931 XYZ tristimulus values, D50-referenced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// CIE LAB color: L in [0, 100], a and b in [-128, 127].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// HSV color with all components normalized to [0, 1].
///
/// Display units (hue in degrees, saturation/value in percent) exist only at
/// the host boundary; see [`crate::sync::SyncEngine::hsv_degrees`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Srgb {
    pub const BLACK: Srgb = Srgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parses a hex color string of exactly the form `#RRGGBB` (case
    /// insensitive, 7 characters including the `#`).
    ///
    /// Returns `SyncError::InvalidColor` for any other length, a missing `#`,
    /// or non-hex digits. Interactive paths that must never fail use
    /// [`hex_to_srgb_lenient`] instead.
    pub fn from_hex(hex: &str) -> Result<Srgb, SyncError> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| SyncError::InvalidColor(format!("missing '#' prefix in {hex:?}")))?;
        if digits.len() != 6 {
            return Err(SyncError::InvalidColor(format!(
                "expected 6 hex digits, got {}",
                digits.len()
            )));
        }
        // All-ASCII-hex up front, so the byte slices below always land on
        // char boundaries; multi-byte input must error, not panic.
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SyncError::InvalidColor(format!(
                "non-hex digits in {hex:?}"
            )));
        }
        let r = u8::from_str_radix(&digits[0..2], 16)
            .map_err(|e| SyncError::InvalidColor(format!("invalid red component: {e}")))?;
        let g = u8::from_str_radix(&digits[2..4], 16)
            .map_err(|e| SyncError::InvalidColor(format!("invalid green component: {e}")))?;
        let b = u8::from_str_radix(&digits[4..6], 16)
            .map_err(|e| SyncError::InvalidColor(format!("invalid blue component: {e}")))?;
        Ok(Srgb {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        })
    }

    /// Converts the color to an uppercase hex string like `"#FF8040"`.
    ///
    /// Components are quantized to 8-bit (0-255) with rounding.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_bytes();
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    /// Quantizes to an 8-bit byte triple with rounding.
    pub fn to_bytes(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    /// Builds a color from an 8-bit byte triple.
    pub fn from_bytes(bytes: [u8; 3]) -> Srgb {
        Srgb {
            r: bytes[0] as f64 / 255.0,
            g: bytes[1] as f64 / 255.0,
            b: bytes[2] as f64 / 255.0,
        }
    }

    /// Clamps all components to [0, 1].
    pub fn clamped(self) -> Srgb {
        Srgb {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}

/// Parses a hex string, substituting black for any malformed input.
///
/// This is the interactive-path decoder: a bad hex value degrades to black
/// and the session continues, it never raises.
pub fn hex_to_srgb_lenient(hex: &str) -> Srgb {
    Srgb::from_hex(hex).unwrap_or(Srgb::BLACK)
}

impl Serialize for Srgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Srgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Srgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl LinearRgb {
    pub const BLACK: LinearRgb = LinearRgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Clamps all components to [0, 1].
    pub fn clamped(self) -> LinearRgb {
        LinearRgb {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}

/// Largest per-channel absolute difference between two linear colors.
///
/// This is the distance used by the grouping and change-detection paths.
pub fn channel_distance(a: LinearRgb, b: LinearRgb) -> f64 {
    (a.r - b.r)
        .abs()
        .max((a.g - b.g).abs())
        .max((a.b - b.b).abs())
}

// ---------------------------------------------------------------------------
// sRGB transfer function
// ---------------------------------------------------------------------------

/// Applies inverse sRGB gamma to convert a single sRGB component to linear.
pub fn srgb_channel_to_linear(c: f64) -> f64 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Applies sRGB gamma to convert a single linear component to sRGB.
pub fn linear_channel_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Converts sRGB to linear RGB by applying inverse sRGB gamma per channel.
pub fn srgb_to_linear(c: Srgb) -> LinearRgb {
    LinearRgb {
        r: srgb_channel_to_linear(c.r),
        g: srgb_channel_to_linear(c.g),
        b: srgb_channel_to_linear(c.b),
    }
}

/// Converts linear RGB to sRGB by applying sRGB gamma per channel.
///
/// The output is clamped to [0, 1]; only clamped values are ever stored.
pub fn linear_to_srgb(c: LinearRgb) -> Srgb {
    Srgb {
        r: linear_channel_to_srgb(c.r).clamp(0.0, 1.0),
        g: linear_channel_to_srgb(c.g).clamp(0.0, 1.0),
        b: linear_channel_to_srgb(c.b).clamp(0.0, 1.0),
    }
}

// ---------------------------------------------------------------------------
// XYZ (D50) via Bradford adaptation
// ---------------------------------------------------------------------------

/// Standard sRGB (D65) to XYZ matrix, rows.
const SRGB_TO_XYZ_D65: [[f64; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

/// Inverse of [`SRGB_TO_XYZ_D65`].
const XYZ_D65_TO_SRGB: [[f64; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

/// Bradford chromatic adaptation from D65 to D50, rows.
const BRADFORD_D65_TO_D50: [[f64; 3]; 3] = [
    [1.0478112, 0.0228866, -0.0501270],
    [0.0295424, 0.9904844, -0.0170491],
    [-0.0092345, 0.0150436, 0.7521316],
];

/// Bradford chromatic adaptation from D50 back to D65, rows.
const BRADFORD_D50_TO_D65: [[f64; 3]; 3] = [
    [0.9555766, -0.0230393, 0.0631636],
    [-0.0282895, 1.0099416, 0.0210077],
    [0.0122982, -0.0204830, 1.3299098],
];

/// D50 reference white used by the ICC LAB transform.
const D50_WHITE: [f64; 3] = [0.96422, 1.0, 0.82521];

/// Linear results with magnitude below this are snapped to exactly zero
/// before gamma encoding, so matrix sign noise never shows as a tiny
/// non-black channel.
const NEAR_ZERO: f64 = 1e-4;

fn mat_mul(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Converts sRGB to D50-referenced XYZ: linearize, apply the sRGB-D65
/// matrix, then the Bradford D65->D50 adaptation.
pub fn srgb_to_xyz_d50(c: Srgb) -> Xyz {
    let lin = srgb_to_linear(c);
    let d65 = mat_mul(&SRGB_TO_XYZ_D65, [lin.r, lin.g, lin.b]);
    let d50 = mat_mul(&BRADFORD_D65_TO_D50, d65);
    Xyz {
        x: d50[0],
        y: d50[1],
        z: d50[2],
    }
}

/// Converts D50-referenced XYZ back to sRGB.
///
/// Near-zero linear intermediates (|c| < 1e-4) are snapped to exactly 0
/// before gamma encoding; the output is clamped to [0, 1].
pub fn xyz_d50_to_srgb(c: Xyz) -> Srgb {
    let d65 = mat_mul(&BRADFORD_D50_TO_D65, [c.x, c.y, c.z]);
    let lin = mat_mul(&XYZ_D65_TO_SRGB, d65);
    let encode = |v: f64| {
        let v = if v.abs() < NEAR_ZERO { 0.0 } else { v };
        linear_channel_to_srgb(v).clamp(0.0, 1.0)
    };
    Srgb {
        r: encode(lin[0]),
        g: encode(lin[1]),
        b: encode(lin[2]),
    }
}

// ---------------------------------------------------------------------------
// CIE LAB (ICC-standard constants, D50 white)
// ---------------------------------------------------------------------------

/// ICC threshold for the piecewise cube-root transform (216/24389).
pub const LAB_EPSILON: f64 = 216.0 / 24389.0;

/// ICC slope for the linear segment of the transform (24389/27).
pub const LAB_KAPPA: f64 = 24389.0 / 27.0;

/// Converts D50 XYZ to CIE LAB.
///
/// L is clamped to [0, 100] and a/b to [-128, 127] before returning;
/// intermediates may transiently leave those ranges.
pub fn xyz_to_lab(c: Xyz) -> Lab {
    let f = |t: f64| {
        if t > LAB_EPSILON {
            t.cbrt()
        } else {
            (LAB_KAPPA * t + 16.0) / 116.0
        }
    };
    let fx = f(c.x / D50_WHITE[0]);
    let fy = f(c.y / D50_WHITE[1]);
    let fz = f(c.z / D50_WHITE[2]);
    Lab {
        l: (116.0 * fy - 16.0).clamp(0.0, 100.0),
        a: (500.0 * (fx - fy)).clamp(-128.0, 127.0),
        b: (200.0 * (fy - fz)).clamp(-128.0, 127.0),
    }
}

/// Converts CIE LAB back to D50 XYZ.
///
/// L below 0.01 is treated as exact black (fy = 16/116), avoiding the
/// reference editor's singularity just above zero lightness.
pub fn lab_to_xyz(c: Lab) -> Xyz {
    let fy = if c.l < 0.01 {
        16.0 / 116.0
    } else {
        (c.l + 16.0) / 116.0
    };
    let fx = fy + c.a / 500.0;
    let fz = fy - c.b / 200.0;

    let fx3 = fx * fx * fx;
    let fz3 = fz * fz * fz;
    let xr = if fx3 > LAB_EPSILON {
        fx3
    } else {
        (116.0 * fx - 16.0) / LAB_KAPPA
    };
    let yr = if c.l > LAB_KAPPA * LAB_EPSILON {
        let t = (c.l + 16.0) / 116.0;
        t * t * t
    } else {
        c.l / LAB_KAPPA
    };
    let zr = if fz3 > LAB_EPSILON {
        fz3
    } else {
        (116.0 * fz - 16.0) / LAB_KAPPA
    };

    Xyz {
        x: xr * D50_WHITE[0],
        y: yr * D50_WHITE[1],
        z: zr * D50_WHITE[2],
    }
}

/// Convenience: sRGB to LAB via the chain sRGB -> XYZ(D50) -> LAB.
pub fn srgb_to_lab(c: Srgb) -> Lab {
    xyz_to_lab(srgb_to_xyz_d50(c))
}

/// Convenience: LAB to sRGB via the chain LAB -> XYZ(D50) -> sRGB.
pub fn lab_to_srgb(c: Lab) -> Srgb {
    xyz_d50_to_srgb(lab_to_xyz(c))
}

// ---------------------------------------------------------------------------
// HSV (hexagonal transform)
// ---------------------------------------------------------------------------

/// Converts sRGB to HSV with all components in [0, 1].
///
/// A degenerate input (`max == min`, i.e. gray) yields hue 0; zero value
/// yields zero saturation.
pub fn srgb_to_hsv(c: Srgb) -> Hsv {
    let c = c.clamped();
    let max = c.r.max(c.g).max(c.b);
    let min = c.r.min(c.g).min(c.b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max } else { 0.0 };
    if delta <= 0.0 {
        return Hsv { h: 0.0, s, v: max };
    }

    let h = if max == c.r {
        (c.g - c.b) / delta
    } else if max == c.g {
        2.0 + (c.b - c.r) / delta
    } else {
        4.0 + (c.r - c.g) / delta
    };
    Hsv {
        h: (h / 6.0).rem_euclid(1.0),
        s,
        v: max,
    }
}

/// Converts HSV (all components in [0, 1]) to sRGB.
///
/// Hue wraps at 1.0 back to 0.0; zero saturation yields achromatic gray.
pub fn hsv_to_srgb(c: Hsv) -> Srgb {
    let h = c.h.rem_euclid(1.0);
    let s = c.s.clamp(0.0, 1.0);
    let v = c.v.clamp(0.0, 1.0);

    if s <= 0.0 {
        return Srgb { r: v, g: v, b: v };
    }

    let h6 = h * 6.0;
    let sector = (h6.floor() as usize) % 6;
    let f = h6 - h6.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Srgb { r, g, b }
}
