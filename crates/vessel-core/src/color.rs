//! Additive color blending with base-preference rounding.
//!
//! Used by dye recipes to mix a newly added dye into an already colored
//! vessel. The rounding rule deliberately biases ties toward the base color
//! so a trace amount of a second color does not visibly shift a saturated
//! base.

use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks a `0xRRGGBB` value.
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    /// Packs into a `0xRRGGBB` value.
    pub const fn packed(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// Blends `extras` into `base`, averaging per channel.
///
/// On a nonzero remainder the channel rounds up only when the base's own
/// channel value exceeds the truncated quotient; otherwise it truncates.
/// Pure and deterministic, invariant under reordering of `extras`.
pub fn blend(base: Rgb, extras: &[Rgb]) -> Rgb {
    let mut r = base.r as u32;
    let mut g = base.g as u32;
    let mut b = base.b as u32;
    for extra in extras {
        r += extra.r as u32;
        g += extra.g as u32;
        b += extra.b as u32;
    }
    let count = extras.len() as u32 + 1;
    Rgb::new(
        divide(r, base.r, count),
        divide(g, base.g, count),
        divide(b, base.b, count),
    )
}

/// Divides a channel sum, rounding up when the base channel is preferred.
fn divide(sum: u32, pref: u8, divisor: u32) -> u8 {
    let mut channel = sum / divisor;
    if sum % divisor != 0 && u32::from(pref) > channel {
        channel += 1;
    }
    channel as u8
}
