//! Stable keys and snapshots for the rendering collaborator.
//!
//! The core never bakes geometry. It supplies a texture key, a frost flag,
//! and a fine level offset; the rendering layer owns its own bake cache
//! keyed on [`ModelKey`] so identical combinations are never rebaked.

use crate::id::CellPos;

/// Interned name of a liquid texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureKey(String);

impl TextureKey {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bake cache key: texture identity plus fine offset. Two cells with the
/// same key render identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub texture: TextureKey,
    pub offset: i8,
}

/// Snapshot of everything the rendering layer needs for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelData {
    pub pos: CellPos,
    pub texture: TextureKey,
    /// True when the resolved temperature is freezing; selects the frosted
    /// model variant.
    pub frosted: bool,
    pub offset: i8,
}

impl ModelData {
    /// The bake cache key for this snapshot.
    pub fn key(&self) -> ModelKey {
        ModelKey {
            texture: self.texture.clone(),
            offset: self.offset,
        }
    }
}

/// Geometric offset of the liquid surface for a fine level offset, in
/// model units (one sixteenth of a block per step).
pub fn visual_offset(offset: i8) -> f32 {
    f32::from(offset) * 0.0625
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_snapshots_share_a_bake_key() {
        let a = ModelData {
            pos: CellPos::new(0, 0, 0),
            texture: TextureKey::new("content/water"),
            frosted: false,
            offset: 2,
        };
        let b = ModelData {
            pos: CellPos::new(5, 1, -3),
            texture: TextureKey::new("content/water"),
            frosted: true,
            offset: 2,
        };
        // position and frost are not part of the bake key
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn offset_distinguishes_bake_keys() {
        let base = TextureKey::new("content/water");
        let a = ModelKey { texture: base.clone(), offset: 0 };
        let b = ModelKey { texture: base, offset: -1 };
        assert_ne!(a, b);
    }

    #[test]
    fn visual_offset_scales_linearly() {
        assert_eq!(visual_offset(0), 0.0);
        assert_eq!(visual_offset(3), 0.1875);
        assert_eq!(visual_offset(-3), -0.1875);
    }
}
