//! Shadow Map Tests
//!
//! Tests for:
//! - Lazy allocation and release of per-light shadow resources
//! - Point lights never allocating shadow maps
//! - Spot/directional shadow camera construction
//! - Depth-only rendering discipline (color writes, blended exclusion)

mod common;

use glam::{Mat4, Vec3};

use candela::renderer::collect::{collect_scene, sort_render_calls};
use candela::renderer::passes::shadow::{
    SHADOW_MAP_SIZE, SHADOW_NEAR, generate_shadow_map,
};
use candela::scene::Projection;
use candela::{AlphaMode, Camera, Light, Material, RenderCall, Scene};

use common::{RecordingContext, surface_instance, unit_mesh};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn caster_scene() -> (Scene, Vec<RenderCall>) {
    let mut scene = Scene::new();
    scene.add(surface_instance(
        unit_mesh(36),
        std::sync::Arc::new(Material::default()),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
    ));
    let camera = {
        let mut camera = Camera::new_perspective(60.0, 1.0, 0.1, 1000.0);
        camera.look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera
    };
    let mut calls = Vec::new();
    let mut lights = Vec::new();
    collect_scene(&scene, &camera, &mut calls, &mut lights);
    sort_render_calls(&mut calls);
    (scene, calls)
}

// ============================================================================
// Resource lifecycle
// ============================================================================

#[test]
fn casting_spot_light_allocates_depth_only_target() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::spot(Vec3::ONE, 1.0, 50.0, 30.0, 2.0);
    light.cast_shadows = true;

    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    assert!(light.has_shadow_map());
    let shadow = light.shadow.as_ref().expect("shadow resources allocated");
    let desc = ctx.target_desc(shadow.target);
    assert_eq!(desc.width, SHADOW_MAP_SIZE);
    assert_eq!(desc.height, SHADOW_MAP_SIZE);
    assert_eq!(desc.color_attachments, 0, "shadow target is depth-only");
    assert!(desc.depth);
}

#[test]
fn allocation_happens_once_across_frames() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::spot(Vec3::ONE, 1.0, 50.0, 30.0, 2.0);
    light.cast_shadows = true;

    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();
    let first_target = light.shadow.as_ref().unwrap().target;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    assert_eq!(
        light.shadow.as_ref().unwrap().target,
        first_target,
        "second frame must reuse the existing target"
    );
    assert_eq!(ctx.created_targets.len(), 1);
}

#[test]
fn clearing_cast_shadows_releases_resources() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::spot(Vec3::ONE, 1.0, 50.0, 30.0, 2.0);
    light.cast_shadows = true;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();
    let target = light.shadow.as_ref().unwrap().target;

    light.cast_shadows = false;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    assert!(!light.has_shadow_map(), "resources released when flag clears");
    assert_eq!(ctx.destroyed_targets, vec![target]);

    // A third frame with the flag still clear must not double-free.
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();
    assert_eq!(ctx.destroyed_targets.len(), 1);
}

#[test]
fn point_lights_never_allocate_shadow_maps() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::point(Vec3::ONE, 1.0, 10.0);
    light.cast_shadows = true;

    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();
    assert!(light.shadow.is_none());
    assert!(ctx.created_targets.is_empty());
    assert!(ctx.draws.is_empty());
}

// ============================================================================
// Shadow camera construction
// ============================================================================

#[test]
fn spot_camera_covers_the_full_cone() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::spot(Vec3::ONE, 1.0, 40.0, 25.0, 2.0);
    light.cast_shadows = true;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    let camera = &light.shadow.as_ref().unwrap().camera;
    match camera.projection() {
        Projection::Perspective {
            fov_y,
            aspect,
            near,
            far,
        } => {
            assert!(
                approx(fov_y, 50.0_f32.to_radians()),
                "fov must be twice the cone half-angle, got {fov_y}"
            );
            assert!(approx(aspect, 1.0));
            assert!(approx(near, SHADOW_NEAR));
            assert!(approx(far, 40.0), "far plane follows max_distance");
        }
        other => panic!("spot shadow camera should be perspective, got {other:?}"),
    }
}

#[test]
fn directional_camera_is_orthographic_over_area() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::directional(Vec3::ONE, 1.0, 50.0);
    light.cast_shadows = true;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    let camera = &light.shadow.as_ref().unwrap().camera;
    match camera.projection() {
        Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            ..
        } => {
            assert!(approx(left, -25.0) && approx(right, 25.0));
            assert!(approx(bottom, -25.0) && approx(top, 25.0));
            assert!(approx(near, SHADOW_NEAR));
        }
        other => panic!("directional shadow camera should be orthographic, got {other:?}"),
    }
}

#[test]
fn shadow_camera_tracks_light_transform() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::spot(Vec3::ONE, 1.0, 40.0, 30.0, 2.0);
    light.cast_shadows = true;
    light.transform = Mat4::from_translation(Vec3::new(0.0, 8.0, 0.0))
        * Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2);
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    let camera = &light.shadow.as_ref().unwrap().camera;
    assert!(
        (camera.eye() - Vec3::new(0.0, 8.0, 0.0)).length() < EPSILON,
        "shadow camera eye follows the light position"
    );
    // Rotating -90 degrees about X points local -Z downward.
    assert!(
        (camera.center() - camera.eye() - Vec3::NEG_Y).length() < 1e-3,
        "shadow camera looks along the light direction"
    );
}

// ============================================================================
// Depth-only rendering
// ============================================================================

#[test]
fn shadow_draws_disable_color_writes() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();
    let (_, calls) = caster_scene();

    let mut light = Light::spot(Vec3::ONE, 1.0, 40.0, 45.0, 2.0);
    light.cast_shadows = true;
    // Aim the light at the caster sitting at z=-5.
    light.transform = Mat4::IDENTITY;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    let target = light.shadow.as_ref().unwrap().target;
    let draws = ctx.draws_to(target);
    assert_eq!(draws.len(), 1, "the caster should render into the map");
    assert!(!draws[0].color_write, "shadow pass writes depth only");
    assert_eq!(draws[0].program, "flat");
    assert!(ctx.color_write, "color writes restored after the pass");
}

#[test]
fn blended_surfaces_cast_no_shadows() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();

    let mut scene = Scene::new();
    scene.add(surface_instance(
        unit_mesh(36),
        std::sync::Arc::new(Material {
            alpha_mode: AlphaMode::Blend,
            ..Material::default()
        }),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
    ));
    let camera = Camera::new_perspective(60.0, 1.0, 0.1, 1000.0);
    let mut calls = Vec::new();
    let mut lights = Vec::new();
    collect_scene(&scene, &camera, &mut calls, &mut lights);

    let mut light = Light::spot(Vec3::ONE, 1.0, 40.0, 45.0, 2.0);
    light.cast_shadows = true;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    let target = light.shadow.as_ref().unwrap().target;
    assert!(
        ctx.draws_to(target).is_empty(),
        "blended surfaces must be excluded from the shadow pass"
    );
}

#[test]
fn casters_outside_the_light_frustum_are_culled() {
    let mut ctx = RecordingContext::new();
    let shaders = ctx.shader_provider();

    let mut scene = Scene::new();
    // Behind the light, which looks down -Z from the origin.
    scene.add(surface_instance(
        unit_mesh(36),
        std::sync::Arc::new(Material::default()),
        Mat4::from_translation(Vec3::new(0.0, 0.0, 20.0)),
    ));
    let camera = Camera::new_perspective(60.0, 1.0, 0.1, 1000.0);
    let mut calls = Vec::new();
    let mut lights = Vec::new();
    collect_scene(&scene, &camera, &mut calls, &mut lights);

    let mut light = Light::spot(Vec3::ONE, 1.0, 40.0, 45.0, 2.0);
    light.cast_shadows = true;
    generate_shadow_map(&mut ctx, &shaders, &mut light, &calls).unwrap();

    let target = light.shadow.as_ref().unwrap().target;
    assert!(ctx.draws_to(target).is_empty());
}
