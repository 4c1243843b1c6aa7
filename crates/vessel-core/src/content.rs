//! Typed content values with override-aware queries.
//!
//! A vessel holds exactly one [`ContentValue`]. Content kinds are a closed
//! enum dispatched by match, but the override-delegation semantics of an
//! open model are preserved: a dye content opportunistically answers color
//! queries with its own color, without ever being stored as a color value.

use crate::color::Rgb;
use crate::id::{FluidId, PotionId};
use crate::registry::ContentRegistry;
use crate::render::TextureKey;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Dye colors
// ---------------------------------------------------------------------------

/// The sixteen standard dye colors, with fixed RGB values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DyeColor {
    White,
    Orange,
    Magenta,
    LightBlue,
    Yellow,
    Lime,
    Pink,
    Gray,
    LightGray,
    Cyan,
    Purple,
    Blue,
    Brown,
    Green,
    Red,
    Black,
}

impl DyeColor {
    pub const ALL: [DyeColor; 16] = [
        DyeColor::White,
        DyeColor::Orange,
        DyeColor::Magenta,
        DyeColor::LightBlue,
        DyeColor::Yellow,
        DyeColor::Lime,
        DyeColor::Pink,
        DyeColor::Gray,
        DyeColor::LightGray,
        DyeColor::Cyan,
        DyeColor::Purple,
        DyeColor::Blue,
        DyeColor::Brown,
        DyeColor::Green,
        DyeColor::Red,
        DyeColor::Black,
    ];

    /// The color this dye tints liquid to.
    pub const fn rgb(self) -> Rgb {
        match self {
            DyeColor::White => Rgb::from_packed(0xF9FFFE),
            DyeColor::Orange => Rgb::from_packed(0xF9801D),
            DyeColor::Magenta => Rgb::from_packed(0xC74EBD),
            DyeColor::LightBlue => Rgb::from_packed(0x3AB3DA),
            DyeColor::Yellow => Rgb::from_packed(0xFED83D),
            DyeColor::Lime => Rgb::from_packed(0x80C71F),
            DyeColor::Pink => Rgb::from_packed(0xF38BAA),
            DyeColor::Gray => Rgb::from_packed(0x474F52),
            DyeColor::LightGray => Rgb::from_packed(0x9D9D97),
            DyeColor::Cyan => Rgb::from_packed(0x169C9C),
            DyeColor::Purple => Rgb::from_packed(0x8932B8),
            DyeColor::Blue => Rgb::from_packed(0x3C44AA),
            DyeColor::Brown => Rgb::from_packed(0x835432),
            DyeColor::Green => Rgb::from_packed(0x5E7C16),
            DyeColor::Red => Rgb::from_packed(0xB02E26),
            DyeColor::Black => Rgb::from_packed(0x1D1D21),
        }
    }

    /// Stable name used in persisted records.
    pub const fn name(self) -> &'static str {
        match self {
            DyeColor::White => "white",
            DyeColor::Orange => "orange",
            DyeColor::Magenta => "magenta",
            DyeColor::LightBlue => "light_blue",
            DyeColor::Yellow => "yellow",
            DyeColor::Lime => "lime",
            DyeColor::Pink => "pink",
            DyeColor::Gray => "gray",
            DyeColor::LightGray => "light_gray",
            DyeColor::Cyan => "cyan",
            DyeColor::Purple => "purple",
            DyeColor::Blue => "blue",
            DyeColor::Brown => "brown",
            DyeColor::Green => "green",
            DyeColor::Red => "red",
            DyeColor::Black => "black",
        }
    }

    pub fn from_name(name: &str) -> Option<DyeColor> {
        DyeColor::ALL.into_iter().find(|dye| dye.name() == name)
    }
}

// ---------------------------------------------------------------------------
// Content values
// ---------------------------------------------------------------------------

/// Discriminant tag for content kinds, used for record keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Empty,
    Fluid,
    Dye,
    Color,
    Potion,
}

impl ContentKind {
    /// Stable key used in persisted records.
    pub const fn key(self) -> &'static str {
        match self {
            ContentKind::Empty => "empty",
            ContentKind::Fluid => "fluid",
            ContentKind::Dye => "dye",
            ContentKind::Color => "color",
            ContentKind::Potion => "potion",
        }
    }
}

/// The typed payload a cell currently holds. Immutable once constructed;
/// a "changed" content is always a new value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum ContentValue {
    #[default]
    Empty,
    Fluid(FluidId),
    Dye(DyeColor),
    Color(Rgb),
    Potion(PotionId),
}

impl ContentValue {
    pub const fn kind(self) -> ContentKind {
        match self {
            ContentValue::Empty => ContentKind::Empty,
            ContentValue::Fluid(_) => ContentKind::Fluid,
            ContentValue::Dye(_) => ContentKind::Dye,
            ContentValue::Color(_) => ContentKind::Color,
            ContentValue::Potion(_) => ContentKind::Potion,
        }
    }

    /// Exact-kind fluid query.
    pub fn fluid(self) -> Option<FluidId> {
        match self {
            ContentValue::Fluid(id) => Some(id),
            _ => None,
        }
    }

    /// Exact-kind dye query.
    pub fn dye(self) -> Option<DyeColor> {
        match self {
            ContentValue::Dye(dye) => Some(dye),
            _ => None,
        }
    }

    /// Color query with override delegation: a dye content answers with its
    /// own color even though it is not stored as a color value.
    pub fn color(self) -> Option<Rgb> {
        match self {
            ContentValue::Color(rgb) => Some(rgb),
            ContentValue::Dye(dye) => Some(dye.rgb()),
            _ => None,
        }
    }

    /// Exact-kind potion query.
    pub fn potion(self) -> Option<PotionId> {
        match self {
            ContentValue::Potion(id) => Some(id),
            _ => None,
        }
    }

    /// True if the contents hold the given fluid.
    pub fn contains_fluid(self, fluid: FluidId) -> bool {
        self.fluid() == Some(fluid)
    }

    /// True if the cell is empty or holds water, the only contents other
    /// grid handlers understand.
    pub fn is_simple(self, registry: &ContentRegistry) -> bool {
        match self {
            ContentValue::Empty => true,
            ContentValue::Fluid(id) => registry.is_water(id),
            _ => false,
        }
    }

    /// Texture used to render the liquid surface.
    pub fn texture_key(self, registry: &ContentRegistry) -> TextureKey {
        match self {
            ContentValue::Empty => TextureKey::new("content/empty"),
            ContentValue::Fluid(id) => registry.fluid_texture(id),
            // dyes and mixed colors render as tinted water
            ContentValue::Dye(_) | ContentValue::Color(_) => TextureKey::new("content/water"),
            ContentValue::Potion(id) => registry.potion_texture(id),
        }
    }

    /// Tint applied to the liquid texture.
    pub fn tint(self, registry: &ContentRegistry) -> Rgb {
        match self {
            ContentValue::Empty | ContentValue::Fluid(_) => Rgb::WHITE,
            ContentValue::Dye(dye) => dye.rgb(),
            ContentValue::Color(rgb) => rgb,
            ContentValue::Potion(id) => registry.potion_tint(id),
        }
    }
}

// Equality is override-aware and symmetric: a dye equals the color value it
// answers for. Everything else requires same kind and same value.
impl PartialEq for ContentValue {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (ContentValue::Empty, ContentValue::Empty) => true,
            (ContentValue::Fluid(a), ContentValue::Fluid(b)) => a == b,
            (ContentValue::Potion(a), ContentValue::Potion(b)) => a == b,
            (ContentValue::Dye(_) | ContentValue::Color(_), ContentValue::Dye(_) | ContentValue::Color(_)) => {
                self.color() == other.color()
            }
            _ => false,
        }
    }
}

impl Eq for ContentValue {}

// Hash must agree with the override-aware equality, so dyes hash through
// their color form.
impl Hash for ContentValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match *self {
            ContentValue::Empty => 0u8.hash(state),
            ContentValue::Fluid(id) => {
                1u8.hash(state);
                id.hash(state);
            }
            ContentValue::Dye(_) | ContentValue::Color(_) => {
                2u8.hash(state);
                self.color().hash(state);
            }
            ContentValue::Potion(id) => {
                3u8.hash(state);
                id.hash(state);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// Persisted form of a content value: a kind key plus a kind-specific
/// payload string. Name-keyed so records survive registry reordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub kind: String,
    pub value: String,
}

impl ContentValue {
    /// Serializes to a persisted record.
    pub fn to_record(self, registry: &ContentRegistry) -> ContentRecord {
        let value = match self {
            ContentValue::Empty => String::new(),
            ContentValue::Fluid(id) => registry.fluid_name(id).unwrap_or_default().to_string(),
            ContentValue::Dye(dye) => dye.name().to_string(),
            ContentValue::Color(rgb) => format!("{:06x}", rgb.packed()),
            ContentValue::Potion(id) => registry.potion_name(id).unwrap_or_default().to_string(),
        };
        ContentRecord {
            kind: self.kind().key().to_string(),
            value,
        }
    }

    /// Deserializes from a persisted record.
    ///
    /// Fails closed: an unknown kind, unknown name, or malformed payload
    /// yields `Empty` rather than an error, so corrupt persisted state can
    /// never prevent a cell from loading.
    pub fn from_record(record: &ContentRecord, registry: &ContentRegistry) -> ContentValue {
        match record.kind.as_str() {
            "fluid" => registry
                .fluid_id(&record.value)
                .map(ContentValue::Fluid)
                .unwrap_or_default(),
            "dye" => DyeColor::from_name(&record.value)
                .map(ContentValue::Dye)
                .unwrap_or_default(),
            "color" => u32::from_str_radix(&record.value, 16)
                .ok()
                .filter(|&packed| packed <= 0xFF_FFFF)
                .map(|packed| ContentValue::Color(Rgb::from_packed(packed)))
                .unwrap_or_default(),
            "potion" => registry
                .potion_id(&record.value)
                .map(ContentValue::Potion)
                .unwrap_or_default(),
            _ => ContentValue::Empty,
        }
    }
}
