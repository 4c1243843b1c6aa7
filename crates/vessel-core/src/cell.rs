//! The authoritative cell: level/offset encoding, contents, stimulus entry
//! points, the transform tick pipeline, and the commit path that feeds
//! replication.
//!
//! All mutation happens on one logical simulation thread in discrete
//! ticks; observers only ever apply replicated deltas.

use crate::content::{ContentRecord, ContentValue};
use crate::context::{Context, ContextEffects, ItemStack, Sound};
use crate::id::{CellPos, Direction, PotionId, RecipeId, Ticks};
use crate::matcher::{RecipeMatcher, TransformMatcher, TransformState};
use crate::registry::{ContentRegistry, RecipeBook, HOT_FLUID_TEMPERATURE};
use crate::render::ModelData;
use crate::replication::{CellDelta, ReplicationSink, TransformDelta};
use crate::temperature::{Environment, Temperature, TemperatureCache};
use serde::{Deserialize, Serialize};

/// Maximum fill level of a cell.
pub const MAX_LEVEL: u8 = 12;

/// Ticks a dropped item waits after a failed match before the registry is
/// scanned again. Deliberately coarse: a recipe becoming newly valid
/// inside the window is not noticed until it closes.
pub const STIMULUS_COOLDOWN: u32 = 60;

// ---------------------------------------------------------------------------
// Level normalization
// ---------------------------------------------------------------------------

/// Decomposes a level into the coarse stage and fine offset.
///
/// The stage is the only externally visible level signal; the offset is
/// this engine's private refinement. Partially filled cells always carry
/// stage 1 with a negative offset, never stage 0, and an empty cell
/// forces offset 0. Invariant: `stage * 4 + offset == level`.
pub fn normalize(level: u8) -> (u8, i8) {
    match level.min(MAX_LEVEL) {
        0 => (0, 0),
        level @ 1..=3 => (1, level as i8 - 4),
        level => (level / 4, (level % 4) as i8),
    }
}

// ---------------------------------------------------------------------------
// Stimulus carriers
// ---------------------------------------------------------------------------

/// A dropped item stack sitting in the cell, carrying the processed flag
/// and cooldown that throttle registry scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntity {
    pub stack: ItemStack,
    crafted: bool,
    cooldown: u32,
}

impl ItemEntity {
    pub fn new(stack: ItemStack) -> Self {
        Self {
            stack,
            crafted: false,
            cooldown: 0,
        }
    }

    /// True once a recipe has consumed from this stack; it is skipped from
    /// then on so one stack is never processed twice.
    pub fn crafted(&self) -> bool {
        self.crafted
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// True when the stack has been fully consumed and the embedder should
    /// despawn the entity.
    pub fn depleted(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Result of a successful stimulus application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusOutcome {
    pub recipe: RecipeId,
    pub applications: u32,
    pub effects: ContextEffects,
}

/// What an entity touching the cell experiences. The embedder applies the
/// world-side consequences; level changes are already committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Nothing,
    /// Water put the entity out, consuming one level.
    Extinguished,
    /// A hot fluid burned the entity.
    Burned { damage: u8, fire_seconds: u8 },
    /// The potion contents applied their effects, consuming one level.
    PotionApplied(PotionId),
    /// A boiling vessel scalds whatever sits in it.
    Boiled { damage: u8 },
}

/// Properties of the touching entity the contact rules need.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityContact {
    pub burning: bool,
    pub fire_immune: bool,
    /// True if at least one of the potion's effects is not already active
    /// on the entity.
    pub wants_potion_effects: bool,
}

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// Persisted form of a cell. The transform is stored as a string key and
/// resolved in a separate attach step once the recipe book is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub contents: ContentRecord,
    pub level_offset: i8,
    pub timer: Ticks,
    pub transform: Option<String>,
}

// ---------------------------------------------------------------------------
// Cell state
// ---------------------------------------------------------------------------

/// The authoritative state of one vessel.
#[derive(Debug)]
pub struct CellState {
    pos: CellPos,
    contents: ContentValue,
    stage: u8,
    level_offset: i8,
    temperature: TemperatureCache,
    recipes: RecipeMatcher,
    transform: TransformMatcher,
}

impl CellState {
    /// Creates an empty cell at the given position.
    pub fn new(pos: CellPos) -> Self {
        Self {
            pos,
            contents: ContentValue::Empty,
            stage: 0,
            level_offset: 0,
            temperature: TemperatureCache::new(),
            recipes: RecipeMatcher::new(),
            transform: TransformMatcher::new(),
        }
    }

    pub fn pos(&self) -> CellPos {
        self.pos
    }

    pub fn contents(&self) -> ContentValue {
        self.contents
    }

    /// The coarse stage visible to the surrounding grid.
    pub fn stage(&self) -> u8 {
        self.stage
    }

    pub fn level_offset(&self) -> i8 {
        self.level_offset
    }

    /// The full fill level, `stage * 4 + offset`.
    pub fn level(&self) -> u8 {
        (i16::from(self.stage) * 4 + i16::from(self.level_offset)) as u8
    }

    pub fn transform_state(&self) -> TransformState {
        self.transform.state()
    }

    /// Resolved temperature, cached until a topology event invalidates it.
    pub fn temperature(&mut self, env: &dyn Environment) -> Temperature {
        self.temperature.get(env, self.pos)
    }

    /// True if other grid handlers may also act on this cell: nonnegative
    /// offset (no hidden partial fill) and simple contents.
    pub fn can_mimic_vanilla(&self, registry: &ContentRegistry) -> bool {
        self.level_offset >= 0 && self.contents.is_simple(registry)
    }

    /// Snapshot for the rendering collaborator.
    pub fn model_data(&mut self, registry: &ContentRegistry, env: &dyn Environment) -> ModelData {
        let frosted = self.temperature(env) == Temperature::Freezing;
        ModelData {
            pos: self.pos,
            texture: self.contents.texture_key(registry),
            frosted,
            offset: self.level_offset,
        }
    }

    // -- commit path --------------------------------------------------------

    /// Commits new contents and level, emitting at most one delta.
    ///
    /// Unchanged contents collapse to the sentinel; the offset is included
    /// whenever the level changed. Any committed change flags the
    /// transform pipeline for re-evaluation.
    pub fn update_state(
        &mut self,
        contents: ContentValue,
        level: u8,
        sink: &mut dyn ReplicationSink,
    ) {
        let (stage, offset) = normalize(level);
        // an empty vessel holds nothing
        let contents = if level == 0 {
            ContentValue::Empty
        } else {
            contents
        };

        let contents_delta = (contents != self.contents).then_some(contents);
        let level_changed = stage != self.stage || offset != self.level_offset;
        if contents_delta.is_none() && !level_changed {
            return;
        }

        if let Some(contents) = contents_delta {
            self.contents = contents;
        }
        self.stage = stage;
        self.level_offset = offset;

        sink.cell_delta(CellDelta {
            pos: self.pos,
            contents: contents_delta,
            offset: level_changed.then_some(offset),
        });
        self.transform.invalidate();
    }

    fn context_with_stack(&mut self, env: &dyn Environment, stack: ItemStack) -> Context {
        Context::with_stack(self.contents, self.level(), self.temperature(env), stack)
    }

    // -- stimulus entry points ----------------------------------------------

    /// Manual item insertion. Applies at most one recipe, commits, and
    /// returns the collected effects (including the caller's updated
    /// stack), or `None` if nothing matched.
    pub fn interact(
        &mut self,
        stack: ItemStack,
        book: &RecipeBook,
        env: &dyn Environment,
        sink: &mut dyn ReplicationSink,
    ) -> Option<StimulusOutcome> {
        let mut ctx = self.context_with_stack(env, stack);
        let recipe = self.recipes.apply_once(book, &mut ctx)?;
        let contents = ctx.contents();
        let level = ctx.level();
        let effects = ctx.finish();
        self.update_state(contents, level, sink);
        Some(StimulusOutcome {
            recipe,
            applications: 1,
            effects,
        })
    }

    /// Dropped-item stimulus with the bounded re-application loop.
    ///
    /// Already-processed items are skipped; a failed match sets a
    /// [`STIMULUS_COOLDOWN`] so the registry is not scanned every tick for
    /// an item nothing wants. A success consumes as many applications as
    /// keep matching, then marks the remaining stack processed. Spawned
    /// artifacts in the returned effects should be marked processed by the
    /// embedder as well.
    pub fn on_item_entity(
        &mut self,
        item: &mut ItemEntity,
        book: &RecipeBook,
        env: &dyn Environment,
        sink: &mut dyn ReplicationSink,
    ) -> Option<StimulusOutcome> {
        if item.crafted {
            return None;
        }
        if item.cooldown > 0 {
            item.cooldown -= 1;
            return None;
        }

        let mut ctx = self.context_with_stack(env, item.stack);
        let Some(applied) = self.recipes.apply_repeated(book, &mut ctx) else {
            item.cooldown = STIMULUS_COOLDOWN;
            return None;
        };

        let contents = ctx.contents();
        let level = ctx.level();
        let mut effects = ctx.finish();
        item.stack = effects.stack.take().unwrap_or(ItemStack::EMPTY);
        if !item.stack.is_empty() {
            item.crafted = true;
        }
        self.update_state(contents, level, sink);
        Some(StimulusOutcome {
            recipe: applied.recipe,
            applications: applied.applications,
            effects,
        })
    }

    /// An entity touched the liquid. Level consumption is committed here;
    /// the returned outcome tells the embedder what to do to the entity.
    pub fn on_entity_contact(
        &mut self,
        contact: EntityContact,
        registry: &ContentRegistry,
        env: &dyn Environment,
        sink: &mut dyn ReplicationSink,
    ) -> ContactOutcome {
        if self.level() == 0 {
            return ContactOutcome::Nothing;
        }

        if let Some(fluid) = self.contents.fluid() {
            if registry.is_water(fluid) {
                if contact.burning {
                    let level = self.level() - 1;
                    self.update_state(self.contents, level, sink);
                    return ContactOutcome::Extinguished;
                }
            } else if registry.fluid_temperature(fluid) > HOT_FLUID_TEMPERATURE
                && !contact.fire_immune
            {
                return ContactOutcome::Burned {
                    damage: 4,
                    fire_seconds: 15,
                };
            }
        } else if let Some(potion) = self.contents.potion() {
            if contact.wants_potion_effects {
                let level = self.level() - 1;
                self.update_state(self.contents, level, sink);
                return ContactOutcome::PotionApplied(potion);
            }
            return ContactOutcome::Nothing;
        }

        if self.temperature(env) == Temperature::Boiling {
            return ContactOutcome::Boiled { damage: 2 };
        }
        ContactOutcome::Nothing
    }

    // -- tick pipeline ------------------------------------------------------

    /// Advances the transform pipeline by one tick.
    ///
    /// Runs any deferred re-evaluation first, then counts the armed timer.
    /// A fired transform commits its content output at the current level
    /// and returns its sound cue; the commit flags another re-evaluation,
    /// which may immediately re-arm the same or a different transform on
    /// the next tick.
    pub fn tick(
        &mut self,
        book: &RecipeBook,
        env: &dyn Environment,
        sink: &mut dyn ReplicationSink,
    ) -> Option<Sound> {
        let ctx = Context::for_cell(self.contents, self.level(), self.temperature(env));

        if self.transform.take_needs_update() {
            if let Some(change) = self.transform.update(book, &ctx) {
                sink.transform_delta(TransformDelta {
                    pos: self.pos,
                    transform: change,
                });
            }
        }

        let fired = self.transform.advance(book, &ctx)?;
        // sound cue first, against the old contents
        let sound = fired.sound;
        self.update_state(fired.output, self.level(), sink);
        Some(sound)
    }

    /// Invalidates caches for a changed neighbor. Temperature-relevant
    /// directions also force a transform re-evaluation.
    pub fn neighbor_changed(&mut self, neighbor: CellPos) {
        let dir = Direction::from_delta(
            neighbor.x - self.pos.x,
            neighbor.y - self.pos.y,
            neighbor.z - self.pos.z,
        );
        if self.temperature.neighbor_changed(dir) {
            self.transform.invalidate();
        }
    }

    // -- persistence --------------------------------------------------------

    /// Serializes the cell's owned state. The coarse stage is persisted by
    /// the surrounding grid, not here.
    pub fn save(&self, book: &RecipeBook, registry: &ContentRegistry) -> CellRecord {
        CellRecord {
            contents: self.contents.to_record(registry),
            level_offset: self.level_offset,
            timer: self.transform.timer(),
            transform: self.transform.persisted_name(book),
        }
    }

    /// Restores a cell from its record and the externally persisted stage.
    ///
    /// Unknown content fails closed to empty. The transform name stays
    /// unresolved, deferring all transform evaluation, until
    /// [`attach`](Self::attach) is called with a reachable book.
    pub fn load(pos: CellPos, stage: u8, record: &CellRecord, registry: &ContentRegistry) -> Self {
        let contents = ContentValue::from_record(&record.contents, registry);
        // a corrupt stage/offset pair re-normalizes instead of yielding an
        // out-of-range level
        let level = i16::from(stage.min(3)) * 4 + i16::from(record.level_offset.clamp(-3, 3));
        let (stage, level_offset) = normalize(level.clamp(0, i16::from(MAX_LEVEL)) as u8);
        let contents = if stage == 0 {
            ContentValue::Empty
        } else {
            contents
        };
        Self {
            pos,
            contents,
            stage,
            level_offset,
            temperature: TemperatureCache::new(),
            recipes: RecipeMatcher::new(),
            transform: TransformMatcher::restore(record.timer, record.transform.clone()),
        }
    }

    /// Second load phase: resolves the persisted transform name once the
    /// book is available and queues a re-evaluation.
    pub fn attach(&mut self, book: &RecipeBook) {
        self.transform.attach(book);
        self.transform.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Fixture, RecordingSink, ScriptedEnv};
    use proptest::prelude::*;

    #[test]
    fn normalize_known_values() {
        assert_eq!(normalize(0), (0, 0));
        assert_eq!(normalize(1), (1, -3));
        assert_eq!(normalize(3), (1, -1));
        assert_eq!(normalize(4), (1, 0));
        assert_eq!(normalize(7), (1, 3));
        assert_eq!(normalize(8), (2, 0));
        assert_eq!(normalize(12), (3, 0));
    }

    proptest! {
        #[test]
        fn normalize_round_trips(level in 0u8..=12) {
            let (stage, offset) = normalize(level);
            prop_assert_eq!(i16::from(stage) * 4 + i16::from(offset), i16::from(level));
            prop_assert!((-3..=3).contains(&offset));
            prop_assert!(stage <= 3);
            // partially full never reads as externally empty
            if level > 0 {
                prop_assert!(stage >= 1);
            } else {
                prop_assert_eq!(offset, 0);
            }
        }
    }

    #[test]
    fn update_state_routes_through_normalization() {
        let f = Fixture::new();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));

        cell.update_state(ContentValue::Fluid(f.water), 2, &mut sink);
        assert_eq!(cell.stage(), 1);
        assert_eq!(cell.level_offset(), -2);
        assert_eq!(cell.level(), 2);
    }

    #[test]
    fn commit_emits_minimal_delta() {
        let f = Fixture::new();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));

        cell.update_state(ContentValue::Fluid(f.water), 12, &mut sink);
        assert_eq!(sink.cell_deltas.len(), 1);
        let delta = &sink.cell_deltas[0];
        assert_eq!(delta.contents, Some(ContentValue::Fluid(f.water)));
        assert_eq!(delta.offset, Some(0));

        // same contents, same level: no packet
        cell.update_state(ContentValue::Fluid(f.water), 12, &mut sink);
        assert_eq!(sink.cell_deltas.len(), 1);

        // contents change only: offset omitted
        cell.update_state(ContentValue::Dye(crate::content::DyeColor::Red), 12, &mut sink);
        assert_eq!(sink.cell_deltas.len(), 2);
        assert_eq!(sink.cell_deltas[1].offset, None);
    }

    #[test]
    fn level_zero_forces_empty_contents() {
        let f = Fixture::new();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));

        cell.update_state(ContentValue::Fluid(f.water), 6, &mut sink);
        cell.update_state(ContentValue::Fluid(f.water), 0, &mut sink);
        assert_eq!(cell.contents(), ContentValue::Empty);
        assert_eq!(cell.level_offset(), 0);
    }

    #[test]
    fn mimic_vanilla_requires_simple_contents_and_full_stages() {
        let f = Fixture::new();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));
        assert!(cell.can_mimic_vanilla(&f.registry));

        cell.update_state(ContentValue::Fluid(f.water), 8, &mut sink);
        assert!(cell.can_mimic_vanilla(&f.registry));

        // hidden partial fill
        cell.update_state(ContentValue::Fluid(f.water), 2, &mut sink);
        assert!(!cell.can_mimic_vanilla(&f.registry));

        cell.update_state(ContentValue::Dye(crate::content::DyeColor::Red), 8, &mut sink);
        assert!(!cell.can_mimic_vanilla(&f.registry));
    }

    #[test]
    fn failed_item_match_sets_cooldown() {
        let f = Fixture::new();
        let env = ScriptedEnv::default();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));
        // a dye on an empty vessel matches nothing
        let mut item = ItemEntity::new(ItemStack::new(f.dye_item, 1));

        assert!(cell
            .on_item_entity(&mut item, &f.book, &env, &mut sink)
            .is_none());
        assert_eq!(item.cooldown(), STIMULUS_COOLDOWN);

        // the cooldown decrements without touching the registry
        assert!(cell
            .on_item_entity(&mut item, &f.book, &env, &mut sink)
            .is_none());
        assert_eq!(item.cooldown(), STIMULUS_COOLDOWN - 1);
    }

    #[test]
    fn crafted_item_is_skipped() {
        let f = Fixture::new();
        let env = ScriptedEnv::default();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));

        let mut item = ItemEntity::new(ItemStack::new(f.water_bucket, 2));
        let outcome = cell
            .on_item_entity(&mut item, &f.book, &env, &mut sink)
            .expect("fill matches");
        assert_eq!(outcome.applications, 1);
        assert!(item.crafted());
        assert_eq!(cell.level(), MAX_LEVEL);

        // remaining stack is never processed again
        assert!(cell
            .on_item_entity(&mut item, &f.book, &env, &mut sink)
            .is_none());
    }

    #[test]
    fn contact_with_water_extinguishes() {
        let f = Fixture::new();
        let env = ScriptedEnv::default();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));
        cell.update_state(ContentValue::Fluid(f.water), 12, &mut sink);

        let outcome = cell.on_entity_contact(
            EntityContact {
                burning: true,
                ..EntityContact::default()
            },
            &f.registry,
            &env,
            &mut sink,
        );
        assert_eq!(outcome, ContactOutcome::Extinguished);
        assert_eq!(cell.level(), 11);
    }

    #[test]
    fn contact_with_hot_fluid_burns() {
        let f = Fixture::new();
        let env = ScriptedEnv::default();
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));
        cell.update_state(ContentValue::Fluid(f.magma), 12, &mut sink);

        let outcome =
            cell.on_entity_contact(EntityContact::default(), &f.registry, &env, &mut sink);
        assert!(matches!(outcome, ContactOutcome::Burned { .. }));
        // burning consumes nothing
        assert_eq!(cell.level(), 12);

        let immune = cell.on_entity_contact(
            EntityContact {
                fire_immune: true,
                ..EntityContact::default()
            },
            &f.registry,
            &env,
            &mut sink,
        );
        assert_eq!(immune, ContactOutcome::Nothing);
    }

    #[test]
    fn contact_with_boiling_water_scalds() {
        let f = Fixture::new();
        let env = ScriptedEnv {
            heat_below: true,
            ..ScriptedEnv::default()
        };
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));
        cell.update_state(ContentValue::Fluid(f.water), 12, &mut sink);

        let outcome =
            cell.on_entity_contact(EntityContact::default(), &f.registry, &env, &mut sink);
        assert_eq!(outcome, ContactOutcome::Boiled { damage: 2 });
    }

    #[test]
    fn empty_cell_contact_is_inert() {
        let f = Fixture::new();
        let env = ScriptedEnv {
            heat_below: true,
            ..ScriptedEnv::default()
        };
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(0, 0, 0));
        let outcome = cell.on_entity_contact(
            EntityContact {
                burning: true,
                ..EntityContact::default()
            },
            &f.registry,
            &env,
            &mut sink,
        );
        assert_eq!(outcome, ContactOutcome::Nothing);
    }

    #[test]
    fn save_load_attach_round_trips() {
        let f = Fixture::new();
        let env = ScriptedEnv {
            heat_below: true,
            ..ScriptedEnv::default()
        };
        let mut sink = RecordingSink::default();
        let mut cell = CellState::new(CellPos::new(1, 2, 3));
        cell.update_state(ContentValue::Fluid(f.water), 7, &mut sink);

        // arm the boil transform and run a few ticks
        cell.tick(&f.book, &env, &mut sink);
        cell.tick(&f.book, &env, &mut sink);
        let timer_before = match cell.transform_state() {
            TransformState::Armed { timer, .. } => timer,
            other => panic!("expected armed transform, got {other:?}"),
        };

        let record = cell.save(&f.book, &f.registry);
        assert_eq!(record.transform.as_deref(), Some("boil"));
        assert_eq!(record.level_offset, 3);
        assert_eq!(record.timer, timer_before);

        let mut restored = CellState::load(CellPos::new(1, 2, 3), cell.stage(), &record, &f.registry);
        assert_eq!(restored.level(), 7);
        assert_eq!(restored.contents(), ContentValue::Fluid(f.water));
        // transform evaluation is deferred until attach
        assert_eq!(restored.transform_state(), TransformState::Idle);
        assert!(restored.tick(&f.book, &env, &mut sink).is_none());

        restored.attach(&f.book);
        match restored.transform_state() {
            TransformState::Armed { timer, .. } => assert_eq!(timer, timer_before),
            other => panic!("expected armed transform after attach, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_record_loads_as_empty() {
        let f = Fixture::new();
        let record = CellRecord {
            contents: ContentRecord {
                kind: "fluid".to_string(),
                value: "ectoplasm".to_string(),
            },
            level_offset: 9,
            timer: 5,
            transform: Some("gone".to_string()),
        };
        let mut cell = CellState::load(CellPos::new(0, 0, 0), 2, &record, &f.registry);
        assert_eq!(cell.contents(), ContentValue::Empty);
        // offset clamped back into range
        assert_eq!(cell.level_offset(), 3);

        cell.attach(&f.book);
        assert_eq!(cell.transform_state(), TransformState::Idle);
    }

    #[test]
    fn corrupt_stage_offset_pair_renormalizes() {
        let f = Fixture::new();
        let record = CellRecord {
            contents: ContentRecord {
                kind: "fluid".to_string(),
                value: "water".to_string(),
            },
            level_offset: -3,
            timer: 0,
            transform: None,
        };
        // stage 0 with a negative offset would wrap the level
        let cell = CellState::load(CellPos::new(0, 0, 0), 0, &record, &f.registry);
        assert_eq!(cell.level(), 0);
        assert_eq!(cell.stage(), 0);
        assert_eq!(cell.level_offset(), 0);
        // and an empty vessel holds nothing
        assert_eq!(cell.contents(), ContentValue::Empty);

        let record = CellRecord {
            contents: ContentRecord {
                kind: "fluid".to_string(),
                value: "water".to_string(),
            },
            level_offset: 3,
            timer: 0,
            transform: None,
        };
        // stage 3 with a positive offset would exceed the maximum
        let cell = CellState::load(CellPos::new(0, 0, 0), 3, &record, &f.registry);
        assert_eq!(cell.level(), MAX_LEVEL);
        assert_eq!(cell.stage(), 3);
        assert_eq!(cell.level_offset(), 0);
    }

    #[test]
    fn side_neighbor_change_invalidates_freezing_only() {
        let mut env = ScriptedEnv {
            heat_below: true,
            ..ScriptedEnv::default()
        };
        let mut cell = CellState::new(CellPos::new(0, 0, 0));
        assert_eq!(cell.temperature(&env), Temperature::Boiling);

        // heat goes out, but only a side neighbor is reported changed:
        // the stale boiling flag is still trusted
        env.heat_below = false;
        cell.neighbor_changed(CellPos::new(1, 0, 0));
        assert_eq!(cell.temperature(&env), Temperature::Boiling);

        cell.neighbor_changed(CellPos::new(0, -1, 0));
        assert_eq!(cell.temperature(&env), Temperature::Normal);
    }
}
