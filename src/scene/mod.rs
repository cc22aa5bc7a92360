//! Scene description: entities, cameras, lights and bounds.

pub mod bounds;
pub mod camera;
pub mod entity;
pub mod light;

mod scene;

pub use bounds::BoundingBox;
pub use camera::{Camera, Frustum, Projection};
pub use entity::{Entity, Node, Prefab, PrefabInstance};
pub use light::{Light, LightKind, ShadowMap};
pub use scene::Scene;
