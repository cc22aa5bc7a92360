//! Frame collection: flattening the scene into sorted render calls.

use std::cmp::Ordering;
use std::sync::Arc;

use glam::Mat4;

use crate::gfx::{AlphaMode, GpuMesh, Material};
use crate::scene::{BoundingBox, Camera, Entity, Node, Scene};

/// One drawable surface for the current frame: a mesh/material pair with
/// its resolved world transform and camera-relative sort key.
#[derive(Clone)]
pub struct RenderCall {
    pub mesh: Arc<dyn GpuMesh>,
    pub material: Arc<Material>,
    pub model: Mat4,
    /// World-space bounds, used for frustum tests in every pass.
    pub bounds: BoundingBox,
    /// Distance from the camera eye to the bounds center.
    pub distance: f32,
}

/// Walks the scene and fills `calls` with drawable surfaces and `lights`
/// with the entity indices of visible lights. Both vectors are cleared
/// first; neither is sorted.
///
/// Prefab hierarchies are traversed iteratively with an explicit worklist.
/// An invisible node prunes its whole subtree. Nodes carrying only one of
/// mesh/material contribute nothing.
pub fn collect_scene(
    scene: &Scene,
    camera: &Camera,
    calls: &mut Vec<RenderCall>,
    lights: &mut Vec<usize>,
) {
    calls.clear();
    lights.clear();

    for (index, entity) in scene.entities.iter().enumerate() {
        match entity {
            Entity::Prefab(instance) => {
                if !instance.visible {
                    continue;
                }
                let Some(prefab) = &instance.prefab else {
                    continue;
                };
                collect_prefab(&prefab.root, instance.transform, camera, calls);
            }
            Entity::Light(light) => {
                if light.visible {
                    lights.push(index);
                }
            }
        }
    }
}

fn collect_prefab(root: &Node, model: Mat4, camera: &Camera, calls: &mut Vec<RenderCall>) {
    let mut worklist: Vec<(&Node, Mat4)> = vec![(root, Mat4::IDENTITY)];
    while let Some((node, parent_global)) = worklist.pop() {
        if !node.visible {
            continue;
        }
        let global = parent_global * node.transform;
        match (&node.mesh, &node.material) {
            (Some(mesh), Some(material)) => {
                let world = model * global;
                let bounds = mesh.bounds().transform(&world);
                calls.push(RenderCall {
                    mesh: Arc::clone(mesh),
                    material: Arc::clone(material),
                    model: world,
                    bounds,
                    distance: camera.eye().distance(bounds.center()),
                });
            }
            (None, None) => {}
            _ => {
                log::warn!(
                    "node '{}' has only one of mesh/material, skipping",
                    node.name
                );
            }
        }
        // Reverse push keeps depth-first, first-child-first order.
        for child in node.children.iter().rev() {
            worklist.push((child, global));
        }
    }
}

/// Sorts calls for drawing: opaque, then masked, then blended, with blended
/// surfaces back to front. The sort is stable, so surfaces at equal
/// distance keep their collection order.
pub fn sort_render_calls(calls: &mut [RenderCall]) {
    calls.sort_by(|a, b| {
        let by_mode = a.material.alpha_mode.cmp(&b.material.alpha_mode);
        if by_mode == Ordering::Equal && a.material.alpha_mode == AlphaMode::Blend {
            b.distance.total_cmp(&a.distance)
        } else {
            by_mode
        }
    });
}
