//! Recipe and transform traits plus the built-in rule set.
//!
//! Instant recipes run fully within one stimulus event; transforms complete
//! after a duration of continuous matching. Predicates must be side-effect
//! free and applications may mutate only through the [`Context`], so the
//! matcher can safely re-evaluate and re-apply without double-counting
//! anything but sounds (which are allowed to repeat).

use crate::cell::MAX_LEVEL;
use crate::color::blend;
use crate::content::{ContentValue, DyeColor};
use crate::context::{Context, ItemStack, Sound};
use crate::id::{FluidId, ItemId, Ticks};
use crate::registry::ContentRegistry;
use crate::temperature::Temperature;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A rule applied fully within one stimulus event.
pub trait Recipe {
    /// Stable name, used for logging and diagnostics.
    fn name(&self) -> &str;

    /// Pure predicate over the context. Must not mutate anything.
    fn matches(&self, ctx: &Context) -> bool;

    /// Applies the recipe, mutating only through the context.
    fn apply(&self, ctx: &mut Context);

    /// Declaration-time validation. Unresolvable references are rejected
    /// here, before the recipe ever reaches the matcher.
    fn validate(&self, _registry: &ContentRegistry) -> Result<(), String> {
        Ok(())
    }
}

/// A timed rule that completes after [`duration`](Transform::duration)
/// ticks of continuous matching.
pub trait Transform {
    /// Stable name; also the persisted identifier for deferred resolution.
    fn name(&self) -> &str;

    /// Pure predicate over the context.
    fn matches(&self, ctx: &Context) -> bool;

    /// Ticks of continuous matching before the transform fires.
    fn duration(&self) -> Ticks;

    /// The content the cell holds once the transform fires.
    fn output(&self, ctx: &Context) -> ContentValue;

    /// Sound cue played when the transform fires.
    fn sound(&self) -> Sound {
        Sound::Brew
    }

    /// Declaration-time validation.
    fn validate(&self, _registry: &ContentRegistry) -> Result<(), String> {
        Ok(())
    }
}

/// Checks that a referenced fluid id resolves in the registry.
fn require_fluid(registry: &ContentRegistry, fluid: FluidId) -> Result<(), String> {
    if registry.fluid(fluid).is_none() {
        return Err(format!("references unknown fluid {fluid:?}"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fill recipe
// ---------------------------------------------------------------------------

/// Empties a filled container item into the vessel, setting it to a full
/// vessel of the container's fluid.
pub struct FillRecipe {
    pub name: String,
    /// The filled container item consumed by the recipe.
    pub filled_item: ItemId,
    /// Empty container handed back, if any.
    pub empty_item: Option<ItemId>,
    pub fluid: FluidId,
}

impl Recipe for FillRecipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, ctx: &Context) -> bool {
        if !ctx.has_stack() {
            return false;
        }
        let stack = ctx.stack();
        if stack.is_empty() || stack.kind != self.filled_item {
            return false;
        }
        // refill only an empty vessel or a partial vessel of the same fluid
        ctx.level() == 0
            || (ctx.contents().contains_fluid(self.fluid) && ctx.level() < MAX_LEVEL)
    }

    fn apply(&self, ctx: &mut Context) {
        ctx.shrink_stack(1);
        if let Some(empty) = self.empty_item {
            ctx.set_or_give_stack(ItemStack::new(empty, 1));
        }
        ctx.set_contents(ContentValue::Fluid(self.fluid));
        ctx.set_level(MAX_LEVEL);
        ctx.play_sound(Sound::ContainerEmpty);
    }

    fn validate(&self, registry: &ContentRegistry) -> Result<(), String> {
        require_fluid(registry, self.fluid)
    }
}

// ---------------------------------------------------------------------------
// Drain recipe
// ---------------------------------------------------------------------------

/// Fills an empty container item from a full vessel, draining it.
pub struct DrainRecipe {
    pub name: String,
    /// The empty container item consumed by the recipe.
    pub empty_item: ItemId,
    /// Filled container handed back.
    pub filled_item: ItemId,
    pub fluid: FluidId,
}

impl Recipe for DrainRecipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, ctx: &Context) -> bool {
        if !ctx.has_stack() {
            return false;
        }
        let stack = ctx.stack();
        // only a full vessel can fill a container
        !stack.is_empty()
            && stack.kind == self.empty_item
            && ctx.level() == MAX_LEVEL
            && ctx.contents().contains_fluid(self.fluid)
    }

    fn apply(&self, ctx: &mut Context) {
        ctx.shrink_stack(1);
        ctx.set_or_give_stack(ItemStack::new(self.filled_item, 1));
        ctx.set_level(0);
        ctx.play_sound(Sound::ContainerFill);
    }

    fn validate(&self, registry: &ContentRegistry) -> Result<(), String> {
        require_fluid(registry, self.fluid)
    }
}

// ---------------------------------------------------------------------------
// Dye recipe
// ---------------------------------------------------------------------------

/// Mixes a solid dye into the vessel's liquid. Water becomes the dye's
/// content; an already colored liquid blends additively, biased toward the
/// newly added dye.
pub struct DyeRecipe {
    pub name: String,
    /// The dye item consumed per application.
    pub dye_item: ItemId,
    pub dye: DyeColor,
    /// The fluid that counts as plain water for this recipe.
    pub water: FluidId,
}

impl DyeRecipe {
    /// True if the contents can take this dye: water always can, a colored
    /// liquid only if it is not already exactly this color.
    fn can_dye(&self, contents: ContentValue) -> bool {
        contents.contains_fluid(self.water)
            || contents
                .color()
                .map(|color| color != self.dye.rgb())
                .unwrap_or(false)
    }
}

impl Recipe for DyeRecipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, ctx: &Context) -> bool {
        if !ctx.has_stack() {
            return false;
        }
        let stack = ctx.stack();
        ctx.level() > 0
            && !stack.is_empty()
            && stack.kind == self.dye_item
            && self.can_dye(ctx.contents())
    }

    fn apply(&self, ctx: &mut Context) {
        if ctx.contents().contains_fluid(self.water) {
            ctx.shrink_stack(1);
            ctx.set_contents(ContentValue::Dye(self.dye));
            ctx.play_sound(Sound::BobberSplash);
        } else if let Some(color) = ctx.contents().color() {
            ctx.shrink_stack(1);
            // the added dye is the base: ties round toward it
            ctx.set_contents(ContentValue::Color(blend(self.dye.rgb(), &[color])));
            ctx.play_sound(Sound::Splash);
        }
    }

    fn validate(&self, registry: &ContentRegistry) -> Result<(), String> {
        require_fluid(registry, self.water)?;
        if !registry.is_water(self.water) {
            return Err(format!("fluid {:?} is not water", self.water));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fluid transform
// ---------------------------------------------------------------------------

/// Converts one fluid into another after sustained exposure to the
/// required temperature.
pub struct FluidTransform {
    pub name: String,
    pub input: FluidId,
    pub output: FluidId,
    pub temperature: Temperature,
    pub duration: Ticks,
}

impl Transform for FluidTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, ctx: &Context) -> bool {
        ctx.level() > 0
            && ctx.contents().contains_fluid(self.input)
            && ctx.temperature() == self.temperature
    }

    fn duration(&self) -> Ticks {
        self.duration
    }

    fn output(&self, _ctx: &Context) -> ContentValue {
        ContentValue::Fluid(self.output)
    }

    fn validate(&self, registry: &ContentRegistry) -> Result<(), String> {
        require_fluid(registry, self.input)?;
        require_fluid(registry, self.output)
    }
}
