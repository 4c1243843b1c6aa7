//! Content and recipe registries.
//!
//! Both registries follow the same lifecycle: register everything at
//! process start through a builder, validate, then freeze. The built
//! registries are immutable and safe to share; identity is by id, and
//! name-to-id maps exist only for persisted records and deferred
//! resolution.

use crate::color::Rgb;
use crate::id::{FluidId, PotionId, RecipeId, TransformId};
use crate::recipe::{Recipe, Transform};
use crate::render::TextureKey;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Content registry
// ---------------------------------------------------------------------------

/// A fluid definition.
#[derive(Debug, Clone)]
pub struct FluidDef {
    pub name: String,
    pub texture: TextureKey,
    /// Attribute temperature in kelvin. Contact with fluids above
    /// [`HOT_FLUID_TEMPERATURE`] burns entities.
    pub temperature: i32,
    /// True for water and water-like fluids that other grid handlers
    /// understand.
    pub water: bool,
}

/// A potion definition.
#[derive(Debug, Clone)]
pub struct PotionDef {
    pub name: String,
    pub texture: TextureKey,
    pub tint: Rgb,
}

/// Contact with fluids hotter than this sets entities on fire.
pub const HOT_FLUID_TEMPERATURE: i32 = 450;

/// Builder for the immutable content registry.
#[derive(Debug, Default)]
pub struct ContentRegistryBuilder {
    fluids: Vec<FluidDef>,
    potions: Vec<PotionDef>,
}

impl ContentRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fluid. Returns its id.
    pub fn register_fluid(&mut self, name: &str, texture: TextureKey, temperature: i32) -> FluidId {
        let id = FluidId(self.fluids.len() as u32);
        self.fluids.push(FluidDef {
            name: name.to_string(),
            texture,
            temperature,
            water: false,
        });
        id
    }

    /// Registers a water-like fluid at ambient temperature.
    pub fn register_water(&mut self, name: &str, texture: TextureKey) -> FluidId {
        let id = self.register_fluid(name, texture, 300);
        self.fluids[id.0 as usize].water = true;
        id
    }

    /// Registers a potion. Returns its id.
    pub fn register_potion(&mut self, name: &str, texture: TextureKey, tint: Rgb) -> PotionId {
        let id = PotionId(self.potions.len() as u32);
        self.potions.push(PotionDef {
            name: name.to_string(),
            texture,
            tint,
        });
        id
    }

    /// Finalizes and builds the immutable registry.
    pub fn build(self) -> Result<ContentRegistry, RegistryError> {
        let fluid_name_to_id = index_names(self.fluids.iter().map(|f| f.name.as_str()), FluidId)?;
        let potion_name_to_id =
            index_names(self.potions.iter().map(|p| p.name.as_str()), PotionId)?;
        Ok(ContentRegistry {
            fluids: self.fluids,
            fluid_name_to_id,
            potions: self.potions,
            potion_name_to_id,
        })
    }
}

/// Builds a name-to-id map, rejecting duplicate names.
fn index_names<'a, I, T>(
    names: impl Iterator<Item = &'a str>,
    make_id: I,
) -> Result<HashMap<String, T>, RegistryError>
where
    I: Fn(u32) -> T,
{
    let mut map = HashMap::new();
    for (index, name) in names.enumerate() {
        if map.insert(name.to_string(), make_id(index as u32)).is_some() {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
    }
    Ok(map)
}

/// Immutable content registry. Frozen after build.
#[derive(Debug)]
pub struct ContentRegistry {
    fluids: Vec<FluidDef>,
    fluid_name_to_id: HashMap<String, FluidId>,
    potions: Vec<PotionDef>,
    potion_name_to_id: HashMap<String, PotionId>,
}

impl ContentRegistry {
    pub fn fluid(&self, id: FluidId) -> Option<&FluidDef> {
        self.fluids.get(id.0 as usize)
    }

    pub fn potion(&self, id: PotionId) -> Option<&PotionDef> {
        self.potions.get(id.0 as usize)
    }

    pub fn fluid_id(&self, name: &str) -> Option<FluidId> {
        self.fluid_name_to_id.get(name).copied()
    }

    pub fn potion_id(&self, name: &str) -> Option<PotionId> {
        self.potion_name_to_id.get(name).copied()
    }

    pub fn fluid_name(&self, id: FluidId) -> Option<&str> {
        self.fluid(id).map(|f| f.name.as_str())
    }

    pub fn potion_name(&self, id: PotionId) -> Option<&str> {
        self.potion(id).map(|p| p.name.as_str())
    }

    pub fn is_water(&self, id: FluidId) -> bool {
        self.fluid(id).map(|f| f.water).unwrap_or(false)
    }

    /// Attribute temperature of a fluid; ambient for dangling ids.
    pub fn fluid_temperature(&self, id: FluidId) -> i32 {
        self.fluid(id).map(|f| f.temperature).unwrap_or(300)
    }

    /// Texture for a fluid; a missing-texture key for dangling ids.
    pub fn fluid_texture(&self, id: FluidId) -> TextureKey {
        self.fluid(id)
            .map(|f| f.texture.clone())
            .unwrap_or_else(|| TextureKey::new("content/missing"))
    }

    pub fn potion_texture(&self, id: PotionId) -> TextureKey {
        self.potion(id)
            .map(|p| p.texture.clone())
            .unwrap_or_else(|| TextureKey::new("content/missing"))
    }

    pub fn potion_tint(&self, id: PotionId) -> Rgb {
        self.potion(id).map(|p| p.tint).unwrap_or(Rgb::WHITE)
    }

    pub fn fluid_count(&self) -> usize {
        self.fluids.len()
    }

    pub fn potion_count(&self) -> usize {
        self.potions.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate name: {0}")]
    DuplicateName(String),
}

// ---------------------------------------------------------------------------
// Recipe book
// ---------------------------------------------------------------------------

/// Builder for the immutable recipe book. Registration order is the scan
/// order the matcher falls back to.
#[derive(Default)]
pub struct RecipeBookBuilder {
    recipes: Vec<Box<dyn Recipe>>,
    transforms: Vec<Box<dyn Transform>>,
}

impl RecipeBookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instant recipe. Returns its id.
    pub fn add_recipe(&mut self, recipe: Box<dyn Recipe>) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(recipe);
        id
    }

    /// Registers a timed transform. Returns its id.
    pub fn add_transform(&mut self, transform: Box<dyn Transform>) -> TransformId {
        let id = TransformId(self.transforms.len() as u32);
        self.transforms.push(transform);
        id
    }

    /// Validates every declaration and builds the immutable book.
    /// Malformed recipes are rejected here and never reach the matcher.
    pub fn build(self, registry: &ContentRegistry) -> Result<RecipeBook, RecipeBookError> {
        for recipe in &self.recipes {
            recipe
                .validate(registry)
                .map_err(|reason| RecipeBookError::InvalidRecipe {
                    name: recipe.name().to_string(),
                    reason,
                })?;
        }
        let mut transform_name_to_id = HashMap::new();
        for (index, transform) in self.transforms.iter().enumerate() {
            transform
                .validate(registry)
                .map_err(|reason| RecipeBookError::InvalidRecipe {
                    name: transform.name().to_string(),
                    reason,
                })?;
            if transform.duration() == 0 {
                return Err(RecipeBookError::ZeroDuration(transform.name().to_string()));
            }
            let id = TransformId(index as u32);
            if transform_name_to_id
                .insert(transform.name().to_string(), id)
                .is_some()
            {
                return Err(RecipeBookError::DuplicateTransform(
                    transform.name().to_string(),
                ));
            }
        }
        Ok(RecipeBook {
            recipes: self.recipes,
            transforms: self.transforms,
            transform_name_to_id,
        })
    }
}

/// Immutable, queryable recipe registry: instant recipes and timed
/// transforms in registration order.
pub struct RecipeBook {
    recipes: Vec<Box<dyn Recipe>>,
    transforms: Vec<Box<dyn Transform>>,
    transform_name_to_id: HashMap<String, TransformId>,
}

impl RecipeBook {
    pub fn recipe(&self, id: RecipeId) -> Option<&dyn Recipe> {
        self.recipes.get(id.0 as usize).map(|r| r.as_ref())
    }

    pub fn transform(&self, id: TransformId) -> Option<&dyn Transform> {
        self.transforms.get(id.0 as usize).map(|t| t.as_ref())
    }

    /// Instant recipes in registration order, used by the fallback scan.
    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &dyn Recipe)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(index, recipe)| (RecipeId(index as u32), recipe.as_ref()))
    }

    /// Transforms in registration order.
    pub fn transforms(&self) -> impl Iterator<Item = (TransformId, &dyn Transform)> {
        self.transforms
            .iter()
            .enumerate()
            .map(|(index, transform)| (TransformId(index as u32), transform.as_ref()))
    }

    /// Resolves a persisted transform name to a live id, once the book is
    /// reachable. Unknown names resolve to `None`.
    pub fn transform_id(&self, name: &str) -> Option<TransformId> {
        self.transform_name_to_id.get(name).copied()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }
}

impl std::fmt::Debug for RecipeBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeBook")
            .field("recipes", &self.recipes.len())
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecipeBookError {
    #[error("recipe '{name}' is invalid: {reason}")]
    InvalidRecipe { name: String, reason: String },
    #[error("duplicate transform name: {0}")]
    DuplicateTransform(String),
    #[error("transform '{0}' has zero duration")]
    ZeroDuration(String),
}
