//! Recipe lookup with last-match caching, bounded re-application, and the
//! timed transform state machine.
//!
//! Registries may hold dozens of entries and are queried potentially every
//! simulation tick per cell, so both matchers try the last successful
//! recipe before falling back to a full in-order scan.

use crate::content::ContentValue;
use crate::context::{Context, Sound};
use crate::id::{RecipeId, Ticks, TransformId};
use crate::registry::RecipeBook;

/// Hard cap on re-applications of one recipe within a single stimulus.
/// Recipes should stop matching after a handful of applications; the cap
/// only exists to bound a misbehaving predicate.
pub const REAPPLY_CAP: u32 = 64;

// ---------------------------------------------------------------------------
// Instant recipe matcher
// ---------------------------------------------------------------------------

/// Outcome of a bounded re-application run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatedApply {
    pub recipe: RecipeId,
    /// Total applications performed, `1..=REAPPLY_CAP`.
    pub applications: u32,
    /// True if the cap stopped a still-matching recipe.
    pub capped: bool,
}

/// Instant recipe matcher with a last-match cache.
#[derive(Debug, Clone, Default)]
pub struct RecipeMatcher {
    last: Option<RecipeId>,
}

impl RecipeMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a matching recipe: the cached last match first, then a full
    /// scan in registration order. A scan hit updates the cache.
    pub fn find(&mut self, book: &RecipeBook, ctx: &Context) -> Option<RecipeId> {
        if let Some(id) = self.last {
            if book.recipe(id).is_some_and(|recipe| recipe.matches(ctx)) {
                return Some(id);
            }
        }
        for (id, recipe) in book.recipes() {
            if recipe.matches(ctx) {
                self.last = Some(id);
                return Some(id);
            }
        }
        None
    }

    /// Finds and applies one recipe. No match is a no-op.
    pub fn apply_once(&mut self, book: &RecipeBook, ctx: &mut Context) -> Option<RecipeId> {
        let id = self.find(book, ctx)?;
        if let Some(recipe) = book.recipe(id) {
            recipe.apply(ctx);
        }
        Some(id)
    }

    /// Finds one recipe and applies it repeatedly while it keeps matching
    /// the mutated context, up to [`REAPPLY_CAP`] applications.
    ///
    /// Hitting the cap logs a warning and stops cleanly; the context is
    /// left as if the final application were the last.
    pub fn apply_repeated(&mut self, book: &RecipeBook, ctx: &mut Context) -> Option<RepeatedApply> {
        let id = self.find(book, ctx)?;
        let recipe = book.recipe(id)?;
        recipe.apply(ctx);
        let mut applications = 1;
        while applications < REAPPLY_CAP && recipe.matches(ctx) {
            recipe.apply(ctx);
            applications += 1;
        }
        let capped = applications == REAPPLY_CAP && recipe.matches(ctx);
        if capped {
            tracing::warn!(
                recipe = recipe.name(),
                applications,
                "recipe matched too many times in a single stimulus; \
                 its predicate should stop holding once the level or contents change"
            );
        }
        Some(RepeatedApply {
            recipe: id,
            applications,
            capped,
        })
    }
}

// ---------------------------------------------------------------------------
// Transform matcher
// ---------------------------------------------------------------------------

/// Observable state of the transform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    /// No transform in progress.
    Idle,
    /// A transform matches and its timer is counting up.
    Armed { transform: TransformId, timer: Ticks },
}

/// A transform that completed this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFired {
    pub transform: TransformId,
    pub output: ContentValue,
    pub sound: Sound,
}

/// Timed transform state machine.
///
/// Idle until a transform matches, Armed while its timer counts up, fires
/// once the timer reaches the duration. Re-evaluation happens whenever the
/// cell's observable inputs change, not just on the periodic tick, and the
/// timer resets only when the active transform actually changes.
#[derive(Debug, Clone)]
pub struct TransformMatcher {
    active: Option<TransformId>,
    last: Option<TransformId>,
    /// Persisted transform name not yet resolved against a book. While
    /// set, evaluation is deferred rather than run against incomplete
    /// data.
    pending_name: Option<String>,
    timer: Ticks,
    needs_update: bool,
}

impl Default for TransformMatcher {
    fn default() -> Self {
        Self {
            active: None,
            last: None,
            pending_name: None,
            timer: 0,
            // evaluate on the first tick after creation
            needs_update: true,
        }
    }
}

impl TransformMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores persisted state: the timer and an unresolved recipe name.
    pub fn restore(timer: Ticks, pending_name: Option<String>) -> Self {
        Self {
            timer,
            pending_name,
            ..Self::default()
        }
    }

    pub fn state(&self) -> TransformState {
        match self.active {
            Some(transform) => TransformState::Armed {
                transform,
                timer: self.timer,
            },
            None => TransformState::Idle,
        }
    }

    pub fn active(&self) -> Option<TransformId> {
        self.active
    }

    pub fn timer(&self) -> Ticks {
        self.timer
    }

    /// The identifier to persist: the unresolved name if attach has not
    /// happened yet, otherwise the active transform's name.
    pub fn persisted_name(&self, book: &RecipeBook) -> Option<String> {
        if let Some(name) = &self.pending_name {
            return Some(name.clone());
        }
        self.active
            .and_then(|id| book.transform(id))
            .map(|transform| transform.name().to_string())
    }

    /// Marks the observable inputs as changed so the next tick re-evaluates.
    pub fn invalidate(&mut self) {
        self.needs_update = true;
    }

    /// Second phase of loading: resolves the persisted name once the book
    /// is reachable. Unknown names resolve to no transform.
    pub fn attach(&mut self, book: &RecipeBook) {
        if let Some(name) = self.pending_name.take() {
            self.active = book.transform_id(&name);
            if self.active.is_none() {
                tracing::debug!(transform = name.as_str(), "persisted transform no longer exists");
            }
        }
    }

    /// Sets the active transform directly. Observer-side only; resets the
    /// timer.
    pub fn set_active(&mut self, transform: Option<TransformId>) {
        self.active = transform;
        self.timer = 0;
    }

    /// Re-evaluates which transform should be armed.
    ///
    /// Returns `Some(new_active)` when the active transform changed (the
    /// caller replicates it), `None` otherwise. Deferred while a persisted
    /// name is unresolved. The timer resets whenever the active transform
    /// stops matching, never while it continues to match.
    pub fn update(&mut self, book: &RecipeBook, ctx: &Context) -> Option<Option<TransformId>> {
        if self.pending_name.is_some() {
            return None;
        }
        if let Some(id) = self.active {
            if book.transform(id).is_some_and(|t| t.matches(ctx)) {
                return None;
            }
        }

        self.timer = 0;

        let mut found = None;
        if ctx.level() > 0 {
            if let Some(id) = self.last {
                if book.transform(id).is_some_and(|t| t.matches(ctx)) {
                    found = Some(id);
                }
            }
            if found.is_none() {
                for (id, transform) in book.transforms() {
                    if transform.matches(ctx) {
                        self.last = Some(id);
                        found = Some(id);
                        break;
                    }
                }
            }
        }

        if self.active != found {
            self.active = found;
            Some(found)
        } else {
            None
        }
    }

    /// Consumes the re-evaluation flag set by [`invalidate`](Self::invalidate).
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    /// Advances the armed timer by one tick. Fires the transform when the
    /// timer reaches its duration, resetting the timer.
    pub fn advance(&mut self, book: &RecipeBook, ctx: &Context) -> Option<TransformFired> {
        if self.pending_name.is_some() {
            return None;
        }
        let id = self.active?;
        let transform = book.transform(id)?;
        self.timer += 1;
        if self.timer < transform.duration() {
            return None;
        }
        self.timer = 0;
        Some(TransformFired {
            transform: id,
            output: transform.output(ctx),
            sound: transform.sound(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentValue;
    use crate::context::{Context, ItemStack};
    use crate::id::ItemId;
    use crate::recipe::{Recipe, Transform};
    use crate::registry::{ContentRegistry, ContentRegistryBuilder, RecipeBookBuilder};
    use crate::render::TextureKey;
    use crate::temperature::Temperature;
    use std::cell::Cell as StdCell;
    use std::rc::Rc;

    /// Recipe that matches while the context level is below a threshold and
    /// raises it by one per application, counting probe calls.
    struct StepRecipe {
        name: &'static str,
        below: u8,
        probes: Rc<StdCell<u32>>,
        applies: Rc<StdCell<u32>>,
    }

    impl Recipe for StepRecipe {
        fn name(&self) -> &str {
            self.name
        }
        fn matches(&self, ctx: &Context) -> bool {
            self.probes.set(self.probes.get() + 1);
            ctx.level() < self.below
        }
        fn apply(&self, ctx: &mut Context) {
            self.applies.set(self.applies.get() + 1);
            ctx.set_level(ctx.level() + 1);
        }
    }

    /// Recipe whose predicate never stops holding.
    struct StuckRecipe {
        applies: Rc<StdCell<u32>>,
    }

    impl Recipe for StuckRecipe {
        fn name(&self) -> &str {
            "stuck"
        }
        fn matches(&self, _ctx: &Context) -> bool {
            true
        }
        fn apply(&self, ctx: &mut Context) {
            self.applies.set(self.applies.get() + 1);
            ctx.shrink_stack(0);
        }
    }

    struct Counters {
        probes: Rc<StdCell<u32>>,
        applies: Rc<StdCell<u32>>,
    }

    fn counters() -> Counters {
        Counters {
            probes: Rc::new(StdCell::new(0)),
            applies: Rc::new(StdCell::new(0)),
        }
    }

    fn registry() -> ContentRegistry {
        let mut builder = ContentRegistryBuilder::new();
        builder.register_water("water", TextureKey::new("content/water"));
        builder.build().expect("registry")
    }

    fn ctx(level: u8) -> Context {
        Context::with_stack(
            ContentValue::Empty,
            level,
            Temperature::Normal,
            ItemStack::new(ItemId(0), 64),
        )
    }

    #[test]
    fn cached_recipe_skips_full_scan() {
        let reg = registry();
        let first = counters();
        let second = counters();
        let mut builder = RecipeBookBuilder::new();
        builder.add_recipe(Box::new(StepRecipe {
            name: "first",
            below: 12,
            probes: first.probes.clone(),
            applies: first.applies.clone(),
        }));
        builder.add_recipe(Box::new(StepRecipe {
            name: "second",
            below: 12,
            probes: second.probes.clone(),
            applies: second.applies.clone(),
        }));
        let book = builder.build(&reg).expect("book");

        let mut matcher = RecipeMatcher::new();
        let context = ctx(0);
        assert_eq!(matcher.find(&book, &context), Some(crate::id::RecipeId(0)));
        let probes_after_scan = first.probes.get();

        // second query hits the cache, the second recipe is never probed
        assert_eq!(matcher.find(&book, &context), Some(crate::id::RecipeId(0)));
        assert_eq!(first.probes.get(), probes_after_scan + 1);
        assert_eq!(second.probes.get(), 0);
    }

    #[test]
    fn failed_cache_falls_back_to_scan() {
        let reg = registry();
        let low = counters();
        let high = counters();
        let mut builder = RecipeBookBuilder::new();
        // only matches below level 2
        builder.add_recipe(Box::new(StepRecipe {
            name: "low",
            below: 2,
            probes: low.probes.clone(),
            applies: low.applies.clone(),
        }));
        builder.add_recipe(Box::new(StepRecipe {
            name: "high",
            below: 12,
            probes: high.probes.clone(),
            applies: high.applies.clone(),
        }));
        let book = builder.build(&reg).expect("book");

        let mut matcher = RecipeMatcher::new();
        assert_eq!(matcher.find(&book, &ctx(0)), Some(crate::id::RecipeId(0)));
        // cached recipe no longer matches at level 5; the scan still finds
        // the other entry
        assert_eq!(matcher.find(&book, &ctx(5)), Some(crate::id::RecipeId(1)));
        // and the new match is now the cache
        assert_eq!(matcher.find(&book, &ctx(5)), Some(crate::id::RecipeId(1)));
    }

    #[test]
    fn repeated_apply_stops_when_predicate_fails() {
        let reg = registry();
        let c = counters();
        let mut builder = RecipeBookBuilder::new();
        builder.add_recipe(Box::new(StepRecipe {
            name: "fill",
            below: 4,
            probes: c.probes.clone(),
            applies: c.applies.clone(),
        }));
        let book = builder.build(&reg).expect("book");

        let mut matcher = RecipeMatcher::new();
        let mut context = ctx(0);
        let outcome = matcher.apply_repeated(&book, &mut context).expect("match");

        assert_eq!(outcome.applications, 4);
        assert!(!outcome.capped);
        assert_eq!(context.level(), 4);
        assert_eq!(c.applies.get(), 4);
    }

    #[test]
    fn pathological_recipe_is_capped_at_sixty_four() {
        let reg = registry();
        let applies = Rc::new(StdCell::new(0));
        let mut builder = RecipeBookBuilder::new();
        builder.add_recipe(Box::new(StuckRecipe {
            applies: applies.clone(),
        }));
        let book = builder.build(&reg).expect("book");

        let mut matcher = RecipeMatcher::new();
        let mut context = ctx(0);
        let outcome = matcher.apply_repeated(&book, &mut context).expect("match");

        assert_eq!(outcome.applications, REAPPLY_CAP);
        assert!(outcome.capped);
        assert_eq!(applies.get(), REAPPLY_CAP);
    }

    /// Transform matching a fixed level with a fixed duration.
    struct LevelTransform {
        name: &'static str,
        level: u8,
        duration: Ticks,
        output: ContentValue,
    }

    impl Transform for LevelTransform {
        fn name(&self) -> &str {
            self.name
        }
        fn matches(&self, ctx: &Context) -> bool {
            ctx.level() == self.level
        }
        fn duration(&self) -> Ticks {
            self.duration
        }
        fn output(&self, _ctx: &Context) -> ContentValue {
            self.output
        }
    }

    fn transform_book() -> crate::registry::RecipeBook {
        let reg = registry();
        let mut builder = RecipeBookBuilder::new();
        builder.add_transform(Box::new(LevelTransform {
            name: "at_four",
            level: 4,
            duration: 3,
            output: ContentValue::Dye(crate::content::DyeColor::Red),
        }));
        builder.add_transform(Box::new(LevelTransform {
            name: "at_eight",
            level: 8,
            duration: 5,
            output: ContentValue::Dye(crate::content::DyeColor::Blue),
        }));
        builder.build(&reg).expect("book")
    }

    fn cell_ctx(level: u8) -> Context {
        Context::for_cell(ContentValue::Empty, level, Temperature::Normal)
    }

    #[test]
    fn fresh_matcher_is_idle_with_zero_timer() {
        let matcher = TransformMatcher::new();
        assert_eq!(matcher.state(), TransformState::Idle);
        assert_eq!(matcher.timer(), 0);
        assert_eq!(matcher.active(), None);
    }

    #[test]
    fn transform_arms_counts_and_fires() {
        let book = transform_book();
        let mut matcher = TransformMatcher::new();
        let context = cell_ctx(4);

        assert_eq!(matcher.update(&book, &context), Some(Some(TransformId(0))));
        assert!(matcher.advance(&book, &context).is_none());
        assert!(matcher.advance(&book, &context).is_none());
        let fired = matcher.advance(&book, &context).expect("fires on tick 3");
        assert_eq!(fired.transform, TransformId(0));
        assert_eq!(fired.output, ContentValue::Dye(crate::content::DyeColor::Red));
        assert_eq!(matcher.timer(), 0);
    }

    #[test]
    fn continued_match_keeps_timer() {
        let book = transform_book();
        let mut matcher = TransformMatcher::new();
        let context = cell_ctx(4);

        matcher.update(&book, &context);
        matcher.advance(&book, &context);
        assert_eq!(matcher.timer(), 1);

        // same transform still matches: no change, timer survives
        assert_eq!(matcher.update(&book, &context), None);
        assert_eq!(matcher.timer(), 1);
    }

    #[test]
    fn transform_change_resets_timer() {
        let book = transform_book();
        let mut matcher = TransformMatcher::new();

        matcher.update(&book, &cell_ctx(4));
        matcher.advance(&book, &cell_ctx(4));
        assert_eq!(matcher.timer(), 1);

        // level changed: a different transform matches, timer resets
        assert_eq!(matcher.update(&book, &cell_ctx(8)), Some(Some(TransformId(1))));
        assert_eq!(matcher.timer(), 0);
    }

    #[test]
    fn no_match_returns_to_idle() {
        let book = transform_book();
        let mut matcher = TransformMatcher::new();

        matcher.update(&book, &cell_ctx(4));
        assert!(matches!(matcher.state(), TransformState::Armed { .. }));

        assert_eq!(matcher.update(&book, &cell_ctx(1)), Some(None));
        assert_eq!(matcher.state(), TransformState::Idle);
        assert!(matcher.advance(&book, &cell_ctx(1)).is_none());
    }

    #[test]
    fn empty_cell_never_arms() {
        let book = transform_book();
        let mut matcher = TransformMatcher::new();
        // level 0 skips the search entirely
        assert_eq!(matcher.update(&book, &cell_ctx(0)), None);
        assert_eq!(matcher.state(), TransformState::Idle);
    }

    #[test]
    fn evaluation_deferred_while_name_unresolved() {
        let book = transform_book();
        let mut matcher = TransformMatcher::restore(2, Some("at_four".to_string()));

        // neither update nor advance run against incomplete data
        assert_eq!(matcher.update(&book, &cell_ctx(4)), None);
        assert!(matcher.advance(&book, &cell_ctx(4)).is_none());

        matcher.attach(&book);
        assert_eq!(matcher.active(), Some(TransformId(0)));
        // restored timer survives the attach
        assert_eq!(matcher.timer(), 2);
    }

    #[test]
    fn unknown_persisted_name_resolves_to_idle() {
        let book = transform_book();
        let mut matcher = TransformMatcher::restore(0, Some("gone".to_string()));
        matcher.attach(&book);
        assert_eq!(matcher.active(), None);
        assert_eq!(matcher.state(), TransformState::Idle);
    }

    #[test]
    fn persisted_name_round_trips() {
        let book = transform_book();
        let mut matcher = TransformMatcher::new();
        matcher.update(&book, &cell_ctx(4));
        assert_eq!(matcher.persisted_name(&book), Some("at_four".to_string()));

        let unresolved = TransformMatcher::restore(0, Some("at_eight".to_string()));
        assert_eq!(unresolved.persisted_name(&book), Some("at_eight".to_string()));
    }
}
