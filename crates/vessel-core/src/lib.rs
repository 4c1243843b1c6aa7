//! Stateful container reaction engine.
//!
//! A vessel holds a typed content value and a quantized fill level, stored
//! as a coarse stage plus a fine offset. Item and entity stimuli are
//! evaluated against an instant recipe registry; sustained environmental
//! conditions drive timed transforms. All mutation happens on the
//! authoritative side and is mirrored to observers through minimal deltas.
//!
//! The flow for one stimulus:
//!
//! 1. The cell snapshots its contents, level and derived temperature into
//!    a [`context::Context`], together with the stimulus stack.
//! 2. The [`matcher`] finds a matching [`recipe::Recipe`] (cached last
//!    match first) and applies it, possibly repeatedly.
//! 3. The cell commits the mutated context, normalizes the level back
//!    into stage and offset, and emits at most one
//!    [`replication::CellDelta`].
//!
//! Registries are built once at startup ([`registry::ContentRegistryBuilder`],
//! [`registry::RecipeBookBuilder`]), validated, then frozen and shared.

pub mod cell;
pub mod color;
pub mod content;
pub mod context;
pub mod id;
pub mod matcher;
pub mod recipe;
pub mod registry;
pub mod render;
pub mod replication;
pub mod temperature;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
