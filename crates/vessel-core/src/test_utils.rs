//! Shared fixtures: a small prebuilt registry and recipe book, a scripted
//! environment, and a delta-recording sink. Compiled for this crate's
//! tests and exported behind the `test-utils` feature for downstream use.

use crate::color::Rgb;
use crate::content::DyeColor;
use crate::id::{CellPos, Direction, FluidId, ItemId, PotionId};
use crate::recipe::{DrainRecipe, DyeRecipe, FillRecipe, FluidTransform};
use crate::registry::{ContentRegistry, ContentRegistryBuilder, RecipeBook, RecipeBookBuilder};
use crate::render::TextureKey;
use crate::replication::{CellDelta, ReplicationSink, TransformDelta};
use crate::temperature::{Environment, Temperature};

/// A registry and recipe book with one of everything.
///
/// Fluids: `water`, `purified` and a hot `magma`. One `healing` potion.
/// Recipes: bucket fill/drain for water, red and blue dyes, and a `boil`
/// transform turning boiling water into purified water after 100 ticks.
pub struct Fixture {
    pub registry: ContentRegistry,
    pub book: RecipeBook,
    pub water: FluidId,
    pub purified: FluidId,
    pub magma: FluidId,
    pub healing: PotionId,
    pub water_bucket: ItemId,
    pub empty_bucket: ItemId,
    pub dye_item: ItemId,
    pub blue_dye_item: ItemId,
}

impl Fixture {
    pub fn new() -> Self {
        let water_bucket = ItemId(1);
        let empty_bucket = ItemId(2);
        let dye_item = ItemId(3);
        let blue_dye_item = ItemId(4);

        let mut contents = ContentRegistryBuilder::new();
        let water = contents.register_water("water", TextureKey::new("content/water"));
        let purified = contents.register_fluid(
            "purified_water",
            TextureKey::new("content/purified_water"),
            300,
        );
        let magma = contents.register_fluid("magma", TextureKey::new("content/magma"), 1300);
        let healing = contents.register_potion(
            "healing",
            TextureKey::new("content/potion"),
            Rgb::from_packed(0xF8_2423),
        );
        let registry = match contents.build() {
            Ok(registry) => registry,
            Err(err) => panic!("fixture registry: {err}"),
        };

        let mut recipes = RecipeBookBuilder::new();
        recipes.add_recipe(Box::new(FillRecipe {
            name: "fill_water".to_string(),
            filled_item: water_bucket,
            empty_item: Some(empty_bucket),
            fluid: water,
        }));
        recipes.add_recipe(Box::new(DrainRecipe {
            name: "drain_water".to_string(),
            empty_item: empty_bucket,
            filled_item: water_bucket,
            fluid: water,
        }));
        recipes.add_recipe(Box::new(DyeRecipe {
            name: "dye_red".to_string(),
            dye_item,
            dye: DyeColor::Red,
            water,
        }));
        recipes.add_recipe(Box::new(DyeRecipe {
            name: "dye_blue".to_string(),
            dye_item: blue_dye_item,
            dye: DyeColor::Blue,
            water,
        }));
        recipes.add_transform(Box::new(FluidTransform {
            name: "boil".to_string(),
            input: water,
            output: purified,
            temperature: Temperature::Boiling,
            duration: 100,
        }));
        let book = match recipes.build(&registry) {
            Ok(book) => book,
            Err(err) => panic!("fixture book: {err}"),
        };

        Self {
            registry,
            book,
            water,
            purified,
            magma,
            healing,
            water_bucket,
            empty_bucket,
            dye_item,
            blue_dye_item,
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment whose answers are plain fields.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEnv {
    pub heat_below: bool,
    pub chilled: Vec<Direction>,
    pub ambient_cold: bool,
    pub ultrawarm: bool,
}

impl Environment for ScriptedEnv {
    fn heat_below(&self, _pos: CellPos) -> bool {
        self.heat_below
    }
    fn chilled(&self, _pos: CellPos, dir: Direction) -> bool {
        self.chilled.contains(&dir)
    }
    fn ambient_cold(&self, _pos: CellPos) -> bool {
        self.ambient_cold
    }
    fn ultrawarm(&self) -> bool {
        self.ultrawarm
    }
}

/// Sink that records every delta in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub cell_deltas: Vec<CellDelta>,
    pub transform_deltas: Vec<TransformDelta>,
}

impl ReplicationSink for RecordingSink {
    fn cell_delta(&mut self, delta: CellDelta) {
        self.cell_deltas.push(delta);
    }
    fn transform_delta(&mut self, delta: TransformDelta) {
        self.transform_deltas.push(delta);
    }
}
