//! Scene container.

use glam::Vec3;

use super::{Entity, Light};

/// The world to render: a flat list of entities plus global lighting
/// parameters. Passed explicitly to every renderer entry point; there is no
/// global scene.
pub struct Scene {
    pub entities: Vec<Entity>,
    /// Constant ambient term, applied exactly once per frame by the
    /// lighting passes.
    pub ambient_light: Vec3,
    /// Clear color for forward rendering.
    pub background_color: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            ambient_light: Vec3::splat(0.1),
            background_color: Vec3::splat(0.1),
        }
    }

    /// Adds an entity and returns its index. Indices are stable as long as
    /// entities are not removed.
    pub fn add(&mut self, entity: impl Into<Entity>) -> usize {
        self.entities.push(entity.into());
        self.entities.len() - 1
    }

    /// The light at `index`, if that entity is a light.
    #[must_use]
    pub fn light(&self, index: usize) -> Option<&Light> {
        self.entities.get(index).and_then(Entity::as_light)
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.entities.get_mut(index).and_then(Entity::as_light_mut)
    }

    /// All lights in entity order.
    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.entities.iter().filter_map(Entity::as_light)
    }
}
