use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{SkytraceError, SkytraceResult};

/// Straight-alpha color with normalized `0..=1` channels.
///
/// Deserializes from `"#RRGGBB"`, `"#RRGGBBAA"`, `{"r","g","b","a"?}` or `[r, g, b, a?]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StyleColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl StyleColor {
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            1.0,
        )
    }

    pub fn parse_hex(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> Result<u8, String> {
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
        }

        if !s.is_ascii() {
            return Err(format!("hex color \"{s}\" must be ASCII"));
        }

        let (r, g, b, a) = match s.len() {
            6 => (hex_byte(&s[0..2])?, hex_byte(&s[2..4])?, hex_byte(&s[4..6])?, 255),
            8 => (
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            ),
            _ => {
                return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
            }
        };

        Ok(Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        ))
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        let l = |a: f64, b: f64| a + (b - a) * t;
        Self::rgba(
            l(self.r, other.r),
            l(self.g, other.g),
            l(self.b, other.b),
            l(self.a, other.a),
        )
    }

    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }

        let a = self.a.clamp(0.0, 1.0);
        Rgba8Premul {
            r: to_u8(self.r.clamp(0.0, 1.0) * a),
            g: to_u8(self.g.clamp(0.0, 1.0) * a),
            b: to_u8(self.b.clamp(0.0, 1.0) * a),
            a: to_u8(a),
        }
    }
}

impl<'de> Deserialize<'de> for StyleColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Self::parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgba(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

const VIRIDIS: [&str; 9] = [
    "#440154", "#472d7b", "#3b528b", "#2c728e", "#21918c", "#28ae80", "#5ec962", "#addc30",
    "#fde725",
];

const PLASMA: [&str; 9] = [
    "#0d0887", "#4c02a1", "#7e03a8", "#a92395", "#cc4778", "#e56b5d", "#f89441", "#fdc328",
    "#f0f921",
];

const GREYS: [&str; 2] = ["#ffffff", "#000000"];

/// Gradient used for the altitude scale. Low altitudes map to the first stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Viridis,
    Plasma,
    Greys,
    Custom { stops: Vec<StyleColor> },
}

impl Palette {
    pub fn stops(&self) -> Vec<StyleColor> {
        let builtin = |hex: &[&str]| {
            hex.iter()
                .filter_map(|h| StyleColor::parse_hex(h).ok())
                .collect::<Vec<_>>()
        };
        match self {
            Self::Viridis => builtin(&VIRIDIS),
            Self::Plasma => builtin(&PLASMA),
            Self::Greys => builtin(&GREYS),
            Self::Custom { stops } => stops.clone(),
        }
    }

    /// Evenly spaced stops, linearly blended. `t` is clamped to `0..=1`.
    pub fn sample(&self, t: f64) -> StyleColor {
        let stops = self.stops();
        match stops.as_slice() {
            [] => StyleColor::rgba(0.0, 0.0, 0.0, 1.0),
            [only] => *only,
            _ => {
                let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
                let span = (stops.len() - 1) as f64;
                let pos = t * span;
                let i = (pos.floor() as usize).min(stops.len() - 2);
                stops[i].lerp(stops[i + 1], pos - i as f64)
            }
        }
    }
}

/// Monotonic altitude → color mapping, clamped to `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScale {
    pub palette: Palette,
    pub min: f64,
    pub max: f64,
}

impl Default for ColorScale {
    fn default() -> Self {
        // Feet, the unit ADS-B feeds report altitude in.
        Self {
            palette: Palette::Viridis,
            min: 1_000.0,
            max: 38_000.0,
        }
    }
}

impl ColorScale {
    pub fn new(palette: Palette, min: f64, max: f64) -> SkytraceResult<Self> {
        let s = Self { palette, min, max };
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> SkytraceResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(SkytraceError::validation(format!(
                "color scale bounds must be finite with min < max (got {}..{})",
                self.min, self.max
            )));
        }
        if let Palette::Custom { stops } = &self.palette
            && stops.len() < 2
        {
            return Err(SkytraceError::validation(
                "custom palette needs at least 2 stops",
            ));
        }
        Ok(())
    }

    /// Normalized position of `altitude` on the scale.
    pub fn position(&self, altitude: f64) -> f64 {
        ((altitude - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    pub fn color_at(&self, altitude: f64) -> Rgba8Premul {
        self.palette.sample(self.position(altitude)).to_rgba8_premul()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/color.rs"]
mod tests;
