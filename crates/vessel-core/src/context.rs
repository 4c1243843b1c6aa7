//! Transient recipe evaluation context.
//!
//! A [`Context`] binds working copies of a cell's contents and level to an
//! optional item stimulus for the duration of one query-and-apply cycle.
//! Recipes mutate only through the context; the cell commits the result
//! afterwards. Contexts are never persisted.

use crate::cell::MAX_LEVEL;
use crate::content::ContentValue;
use crate::id::ItemId;
use crate::temperature::Temperature;
use serde::{Deserialize, Serialize};

/// A stack of identical items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: ItemId,
    pub count: u32,
}

impl ItemStack {
    /// The empty stack, returned when no stimulus is active.
    pub const EMPTY: ItemStack = ItemStack {
        kind: ItemId(u32::MAX),
        count: 0,
    };

    pub const fn new(kind: ItemId, count: u32) -> Self {
        Self { kind, count }
    }

    pub const fn is_empty(self) -> bool {
        self.count == 0
    }
}

/// Sound cue emitted by a recipe application. Playback is the embedder's
/// concern; repetition across re-applications is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Splash,
    BobberSplash,
    ContainerFill,
    ContainerEmpty,
    Brew,
}

/// Side effects collected during one evaluation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextEffects {
    /// The stimulus stack after all applications, if one was active.
    pub stack: Option<ItemStack>,
    /// New artifacts to spawn next to the cell.
    pub spawned: Vec<ItemStack>,
    /// Sound cues, in emission order.
    pub sounds: Vec<Sound>,
}

/// Transient view used while matching and applying recipes.
#[derive(Debug, Clone)]
pub struct Context {
    contents: ContentValue,
    level: u8,
    temperature: Temperature,
    stack: Option<ItemStack>,
    spawned: Vec<ItemStack>,
    sounds: Vec<Sound>,
}

impl Context {
    /// Context without an item stimulus (transform evaluation, ticks).
    pub fn for_cell(contents: ContentValue, level: u8, temperature: Temperature) -> Self {
        Self {
            contents,
            level,
            temperature,
            stack: None,
            spawned: Vec::new(),
            sounds: Vec::new(),
        }
    }

    /// Context with an item stimulus (insertion, dropped items).
    pub fn with_stack(
        contents: ContentValue,
        level: u8,
        temperature: Temperature,
        stack: ItemStack,
    ) -> Self {
        Self {
            stack: Some(stack),
            ..Self::for_cell(contents, level, temperature)
        }
    }

    pub fn contents(&self) -> ContentValue {
        self.contents
    }

    /// Replaces the contents. Always a whole new value, never an in-place
    /// mutation.
    pub fn set_contents(&mut self, contents: ContentValue) {
        self.contents = contents;
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Sets the fill level, clamped to `0..=MAX_LEVEL`.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(MAX_LEVEL);
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn is_boiling(&self) -> bool {
        self.temperature == Temperature::Boiling
    }

    /// The stimulus stack. Querying outside an item context is a
    /// programmer error: loud in debug builds, empty stack in release.
    pub fn stack(&self) -> ItemStack {
        debug_assert!(
            self.stack.is_some(),
            "queried the stimulus stack outside an item context"
        );
        self.stack.unwrap_or(ItemStack::EMPTY)
    }

    pub fn has_stack(&self) -> bool {
        self.stack.is_some()
    }

    /// Consumes `count` items from the stimulus stack.
    pub fn shrink_stack(&mut self, count: u32) {
        debug_assert!(
            self.stack.is_some(),
            "shrank the stimulus stack outside an item context"
        );
        if let Some(stack) = self.stack.as_mut() {
            stack.count = stack.count.saturating_sub(count);
        }
    }

    /// Replaces an emptied stimulus stack, or spawns the stack as a new
    /// artifact if the stimulus still holds items.
    pub fn set_or_give_stack(&mut self, stack: ItemStack) {
        match self.stack {
            Some(current) if !current.is_empty() => self.spawned.push(stack),
            _ => self.stack = Some(stack),
        }
    }

    /// Spawns a new artifact next to the cell.
    pub fn give_stack(&mut self, stack: ItemStack) {
        self.spawned.push(stack);
    }

    /// Queues a sound cue.
    pub fn play_sound(&mut self, sound: Sound) {
        self.sounds.push(sound);
    }

    /// Tears the context down into its collected side effects.
    pub fn finish(self) -> ContextEffects {
        ContextEffects {
            stack: self.stack,
            spawned: self.spawned,
            sounds: self.sounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(count: u32) -> Context {
        Context::with_stack(
            ContentValue::Empty,
            0,
            Temperature::Normal,
            ItemStack::new(ItemId(7), count),
        )
    }

    #[test]
    fn level_is_clamped() {
        let mut ctx = Context::for_cell(ContentValue::Empty, 0, Temperature::Normal);
        ctx.set_level(200);
        assert_eq!(ctx.level(), MAX_LEVEL);
        ctx.set_level(0);
        assert_eq!(ctx.level(), 0);
    }

    #[test]
    fn shrink_consumes_from_stimulus() {
        let mut ctx = ctx_with(3);
        ctx.shrink_stack(1);
        assert_eq!(ctx.stack().count, 2);
        ctx.shrink_stack(5);
        assert!(ctx.stack().is_empty());
    }

    #[test]
    fn set_or_give_replaces_emptied_stack() {
        let mut ctx = ctx_with(1);
        ctx.shrink_stack(1);
        ctx.set_or_give_stack(ItemStack::new(ItemId(9), 1));
        let effects = ctx.finish();
        assert_eq!(effects.stack, Some(ItemStack::new(ItemId(9), 1)));
        assert!(effects.spawned.is_empty());
    }

    #[test]
    fn set_or_give_spawns_when_stack_remains() {
        let mut ctx = ctx_with(4);
        ctx.shrink_stack(1);
        ctx.set_or_give_stack(ItemStack::new(ItemId(9), 1));
        let effects = ctx.finish();
        assert_eq!(effects.stack, Some(ItemStack::new(ItemId(7), 3)));
        assert_eq!(effects.spawned, vec![ItemStack::new(ItemId(9), 1)]);
    }

    #[test]
    fn sounds_collected_in_order() {
        let mut ctx = ctx_with(1);
        ctx.play_sound(Sound::Splash);
        ctx.play_sound(Sound::ContainerFill);
        assert_eq!(
            ctx.finish().sounds,
            vec![Sound::Splash, Sound::ContainerFill]
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside an item context")]
    fn stack_query_without_stimulus_panics_in_debug() {
        let ctx = Context::for_cell(ContentValue::Empty, 0, Temperature::Normal);
        let _ = ctx.stack();
    }
}
