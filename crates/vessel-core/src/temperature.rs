//! Environmental temperature derivation and caching.
//!
//! A cell's temperature is derived from its neighborhood: a heat source
//! below makes it boil, chilling blocks on both sides of a horizontal axis
//! make it freeze, and the ambient world supplies fallbacks. The resolved
//! value is cached per cell and invalidated by topology events for the
//! relevant neighbor only.

use crate::id::{Axis, CellPos, Direction};

/// Resolved thermal state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Temperature {
    #[default]
    Normal,
    Boiling,
    Freezing,
}

/// World probe supplied by the embedder. All queries are synchronous reads
/// of the surrounding grid; the engine never mutates through this trait.
pub trait Environment {
    /// True if the block directly below the position is an active heat
    /// source.
    fn heat_below(&self, pos: CellPos) -> bool;

    /// True if the neighbor one step in `dir` is a chilling block.
    fn chilled(&self, pos: CellPos, dir: Direction) -> bool;

    /// True if the ambient climate at the position is cold enough to
    /// freeze standing water.
    fn ambient_cold(&self, pos: CellPos) -> bool;

    /// True if the world as a whole evaporates water (boiling fallback).
    fn ultrawarm(&self) -> bool;
}

/// Checks whether both opposing neighbors along `dir`'s axis are chilling.
/// A single chilling neighbor is deliberately insufficient.
fn axis_freezing(env: &dyn Environment, pos: CellPos, dir: Direction) -> bool {
    env.chilled(pos, dir) && env.chilled(pos, dir.opposite())
}

/// True if either horizontal axis has chilling blocks on both sides.
pub fn is_freezing(env: &dyn Environment, pos: CellPos) -> bool {
    axis_freezing(env, pos, Direction::North) || axis_freezing(env, pos, Direction::West)
}

/// Resolves the temperature from the four input conditions.
///
/// Precedence, highest first: boiling and freezing cancel to normal,
/// boiling alone boils, freezing alone freezes, an ultrawarm world boils,
/// a cold climate freezes, anything else is normal.
pub fn resolve(boiling: bool, freezing: bool, ambient_cold: bool, ultrawarm: bool) -> Temperature {
    if boiling {
        return if freezing {
            Temperature::Normal
        } else {
            Temperature::Boiling
        };
    }
    if freezing {
        return Temperature::Freezing;
    }
    if ultrawarm {
        return Temperature::Boiling;
    }
    if ambient_cold {
        return Temperature::Freezing;
    }
    Temperature::Normal
}

/// Per-cell temperature cache.
///
/// The two neighbor flags are cached independently so a topology event for
/// the cell below invalidates only the boiling flag and a side event only
/// the freezing flag. Any invalidation clears the resolved value.
#[derive(Debug, Clone, Default)]
pub struct TemperatureCache {
    boiling: Option<bool>,
    freezing: Option<bool>,
    resolved: Option<Temperature>,
}

impl TemperatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached temperature, computing any missing pieces.
    pub fn get(&mut self, env: &dyn Environment, pos: CellPos) -> Temperature {
        if let Some(temperature) = self.resolved {
            return temperature;
        }
        let boiling = *self.boiling.get_or_insert_with(|| env.heat_below(pos));
        let freezing = *self.freezing.get_or_insert_with(|| is_freezing(env, pos));
        let temperature = resolve(boiling, freezing, env.ambient_cold(pos), env.ultrawarm());
        self.resolved = Some(temperature);
        temperature
    }

    /// Invalidates the cache for a topology change in the given direction.
    /// Returns true if anything was invalidated.
    pub fn neighbor_changed(&mut self, dir: Direction) -> bool {
        match dir {
            Direction::Down => {
                self.boiling = None;
                self.resolved = None;
                true
            }
            dir if dir.axis() != Axis::Y => {
                self.freezing = None;
                self.resolved = None;
                true
            }
            _ => false,
        }
    }
}
