//! Scene entities.
//!
//! The entity set is a closed tagged union: drawable prefab instances and
//! lights. Frame passes match on the variant they care about instead of
//! downcasting through a common base.

use std::sync::Arc;

use glam::Mat4;

use crate::gfx::{GpuMesh, Material};

use super::Light;

/// One node of a prefab hierarchy. Transforms compose parent-to-child; a
/// node is drawable only when it carries both a mesh and a material.
#[derive(Clone)]
pub struct Node {
    pub name: String,
    /// Transform relative to the parent node.
    pub transform: Mat4,
    pub visible: bool,
    pub mesh: Option<Arc<dyn GpuMesh>>,
    pub material: Option<Arc<Material>>,
    pub children: Vec<Node>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            visible: true,
            mesh: None,
            material: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_surface(
        name: impl Into<String>,
        mesh: Arc<dyn GpuMesh>,
        material: Arc<Material>,
    ) -> Self {
        let mut node = Self::new(name);
        node.mesh = Some(mesh);
        node.material = Some(material);
        node
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }
}

/// A shareable mesh/material hierarchy, instanced into the scene through
/// [`PrefabInstance`].
pub struct Prefab {
    pub root: Node,
}

impl Prefab {
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root }
    }
}

/// Placement of a prefab in the world. The prefab reference is optional so
/// instances can exist while their asset is still loading; the collector
/// skips them until it arrives.
#[derive(Clone)]
pub struct PrefabInstance {
    pub transform: Mat4,
    pub visible: bool,
    pub prefab: Option<Arc<Prefab>>,
}

impl PrefabInstance {
    #[must_use]
    pub fn new(prefab: Arc<Prefab>, transform: Mat4) -> Self {
        Self {
            transform,
            visible: true,
            prefab: Some(prefab),
        }
    }
}

/// Everything that can live in a [`Scene`](super::Scene).
pub enum Entity {
    Prefab(PrefabInstance),
    Light(Light),
}

impl Entity {
    #[inline]
    #[must_use]
    pub fn visible(&self) -> bool {
        match self {
            Self::Prefab(instance) => instance.visible,
            Self::Light(light) => light.visible,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_light(&self) -> Option<&Light> {
        match self {
            Self::Light(light) => Some(light),
            Self::Prefab(_) => None,
        }
    }

    #[inline]
    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match self {
            Self::Light(light) => Some(light),
            Self::Prefab(_) => None,
        }
    }
}

impl From<Light> for Entity {
    fn from(light: Light) -> Self {
        Self::Light(light)
    }
}

impl From<PrefabInstance> for Entity {
    fn from(instance: PrefabInstance) -> Self {
        Self::Prefab(instance)
    }
}
