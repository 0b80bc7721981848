use once_cell::sync::Lazy;

use crate::error::{ViewError, ViewResult};

mod hex_color;

pub use hex_color::*;

/// 8-bit sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(raw: &str) -> ViewResult<Self> {
        HexColor::new(raw)
            .to_color()
            .ok_or_else(|| ViewError::InvalidColor(raw.to_string()))
    }

    pub fn to_linear_rgba_f32(self) -> [f32; 4] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a as f32 / 255.0,
        ]
    }

    /// Linear, premultiplied color after applying a layer opacity.
    pub fn premultiplied_linear(self, opacity: f32) -> [f32; 4] {
        let [r, g, b, a] = self.to_linear_rgba_f32();
        let alpha = a * opacity.clamp(0.0, 1.0);
        [r * alpha, g * alpha, b * alpha, alpha]
    }
}

impl std::str::FromStr for Color {
    type Err = ViewError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(raw)
    }
}

static SRGB8_TO_LINEAR: Lazy<[f32; 256]> = Lazy::new(|| {
    let mut t = [0.0f32; 256];
    for (i, slot) in t.iter_mut().enumerate() {
        *slot = srgb_to_linear_f32(i as f32 / 255.0);
    }
    t
});

pub fn srgb_to_linear(c: u8) -> f32 {
    SRGB8_TO_LINEAR[c as usize]
}

pub fn srgb_to_linear_f32(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
