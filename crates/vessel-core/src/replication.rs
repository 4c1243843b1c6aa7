//! State replication from the authoritative cell to observers.
//!
//! Every committed change to contents or level offset emits a
//! [`CellDelta`]; transform changes emit a visual-only [`TransformDelta`].
//! Unchanged fields are omitted as a size optimization, not a correctness
//! requirement: observers apply deltas idempotently by setting fields,
//! never incrementing them.

use crate::content::ContentValue;
use crate::id::{CellPos, Ticks, TransformId};
use crate::registry::RecipeBook;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Packets
// ---------------------------------------------------------------------------

/// Delta for a cell's replicated contents and fine level offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDelta {
    pub pos: CellPos,
    /// New contents, or `None` for unchanged.
    pub contents: Option<ContentValue>,
    /// New level offset, or `None` for unchanged.
    pub offset: Option<i8>,
}

/// Visual-only delta announcing the in-progress transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformDelta {
    pub pos: CellPos,
    /// The newly armed transform, or `None` for idle.
    pub transform: Option<TransformId>,
}

/// Errors from the replication codec.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("packet encoding failed: {0}")]
    Encode(String),
    #[error("packet decoding failed: {0}")]
    Decode(String),
}

/// Encodes a cell delta to wire bytes.
pub fn encode_cell_delta(delta: &CellDelta) -> Result<Vec<u8>, ReplicationError> {
    bitcode::serialize(delta).map_err(|e| ReplicationError::Encode(e.to_string()))
}

/// Decodes a cell delta from wire bytes.
pub fn decode_cell_delta(bytes: &[u8]) -> Result<CellDelta, ReplicationError> {
    bitcode::deserialize(bytes).map_err(|e| ReplicationError::Decode(e.to_string()))
}

/// Encodes a transform delta to wire bytes.
pub fn encode_transform_delta(delta: &TransformDelta) -> Result<Vec<u8>, ReplicationError> {
    bitcode::serialize(delta).map_err(|e| ReplicationError::Encode(e.to_string()))
}

/// Decodes a transform delta from wire bytes.
pub fn decode_transform_delta(bytes: &[u8]) -> Result<TransformDelta, ReplicationError> {
    bitcode::deserialize(bytes).map_err(|e| ReplicationError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Receives deltas emitted by authoritative cells. The embedder's network
/// layer implements this to fan packets out to observers.
pub trait ReplicationSink {
    fn cell_delta(&mut self, delta: CellDelta);
    fn transform_delta(&mut self, delta: TransformDelta);
}

/// Sink that drops everything. Used where no observers exist.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReplicationSink for NullSink {
    fn cell_delta(&mut self, _delta: CellDelta) {}
    fn transform_delta(&mut self, _delta: TransformDelta) {}
}

// ---------------------------------------------------------------------------
// Observer mirror
// ---------------------------------------------------------------------------

/// Non-authoritative mirror of one cell, driven entirely by deltas. Never
/// originates mutations; the local timer exists only for visual progress.
#[derive(Debug, Clone, Default)]
pub struct ObserverCell {
    contents: ContentValue,
    level_offset: i8,
    transform: Option<TransformId>,
    timer: Ticks,
}

impl ObserverCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> ContentValue {
        self.contents
    }

    pub fn level_offset(&self) -> i8 {
        self.level_offset
    }

    pub fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    /// Applies a cell delta. Idempotent: applying the same delta twice
    /// leaves the mirror identical to applying it once.
    pub fn apply(&mut self, delta: &CellDelta) {
        if let Some(contents) = delta.contents {
            self.contents = contents;
        }
        if let Some(offset) = delta.offset {
            self.level_offset = offset;
        }
    }

    /// Applies a transform delta, resetting the visual timer.
    pub fn apply_transform(&mut self, delta: &TransformDelta) {
        self.transform = delta.transform;
        self.timer = 0;
    }

    /// Advances the visual timer, mirroring the authoritative count.
    pub fn tick(&mut self) {
        if self.transform.is_some() {
            self.timer += 1;
        }
    }

    /// Number of transform progress particles to display, `0..=5`.
    pub fn transform_particles(&self, book: &RecipeBook) -> u32 {
        let Some(transform) = self.transform.and_then(|id| book.transform(id)) else {
            return 0;
        };
        // a local timer can outrun the duration between deltas
        (self.timer * 5 / transform.duration()).min(5) as u32
    }
}
