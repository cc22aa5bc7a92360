//! Shadow map generation.
//!
//! Each shadow-casting light owns a depth-only target and a shadow camera.
//! Resources follow the light's `cast_shadows` flag: allocated the first
//! frame it is set, released the frame it clears. Point lights are skipped
//! entirely; they never allocate shadow resources.

use crate::errors::{RenderError, Result};
use crate::gfx::{AlphaMode, BlendMode, DepthFunc, GpuContext, ShaderProgram, ShaderProvider, TargetDesc};
use crate::renderer::collect::RenderCall;
use crate::scene::{Camera, Light, LightKind, ShadowMap};

use super::{debug_check, restore_baseline};

/// Shadow maps are square at this resolution.
pub const SHADOW_MAP_SIZE: u32 = 1024;

/// Near plane of every shadow camera.
pub const SHADOW_NEAR: f32 = 0.1;

/// Synchronizes one light's shadow resources with its flags and, when it
/// casts, renders the depth-only view of the frame's render calls.
///
/// Blended surfaces never cast shadows. Calls outside the shadow camera's
/// frustum are culled per call.
pub fn generate_shadow_map(
    ctx: &mut dyn GpuContext,
    shaders: &dyn ShaderProvider,
    light: &mut Light,
    calls: &[RenderCall],
) -> Result<()> {
    if light.is_point() {
        return Ok(());
    }
    if !light.cast_shadows {
        light.release_shadow_resources(ctx);
        return Ok(());
    }

    ensure_shadow_resources(ctx, light)?;
    aim_shadow_camera(light);

    let Some(program) = shaders.get("flat") else {
        log::warn!("flat shader unavailable, skipping shadow map");
        return Ok(());
    };
    let Some(shadow) = &light.shadow else {
        return Ok(());
    };

    ctx.bind_target(shadow.target);
    ctx.set_color_write(false);
    ctx.set_blend(BlendMode::Disabled);
    ctx.set_depth_func(DepthFunc::Less);
    ctx.clear(None, true);

    for call in calls {
        if call.material.alpha_mode == AlphaMode::Blend {
            continue;
        }
        if !shadow.camera.sees_bounds(&call.bounds) {
            continue;
        }
        render_depth_only(ctx, program.as_ref(), &shadow.camera, call);
    }

    ctx.unbind_target();
    restore_baseline(ctx);
    debug_check(ctx);
    Ok(())
}

fn render_depth_only(
    ctx: &mut dyn GpuContext,
    program: &dyn ShaderProgram,
    camera: &Camera,
    call: &RenderCall,
) {
    program.set_mat4("u_viewprojection", &camera.view_projection());
    program.set_mat4("u_model", &call.model);
    program.set_f32("u_alpha_cutoff", call.material.effective_alpha_cutoff());
    ctx.draw_mesh(call.mesh.as_ref(), program);
}

/// Allocates the depth target and camera if the light does not have them.
fn ensure_shadow_resources(ctx: &mut dyn GpuContext, light: &mut Light) -> Result<()> {
    if light.shadow.is_some() {
        return Ok(());
    }
    let target = ctx.create_target(&TargetDesc::depth_only("shadow map", SHADOW_MAP_SIZE))?;
    let Some(depth_texture) = ctx.depth_texture(target) else {
        ctx.destroy_target(target);
        return Err(RenderError::MissingAttachment {
            label: "shadow map".into(),
            attachment: "depth",
        });
    };
    light.shadow = Some(ShadowMap {
        target,
        depth_texture,
        camera: Camera::new_perspective(90.0, 1.0, SHADOW_NEAR, light.max_distance),
    });
    Ok(())
}

/// Points the shadow camera along the light and rebuilds its projection
/// from the light's current parameters.
fn aim_shadow_camera(light: &mut Light) {
    let position = light.position();
    let target = position + light.forward();
    let up = light.up();
    let kind = light.kind;
    let far = light.max_distance;

    let Some(shadow) = light.shadow.as_mut() else {
        return;
    };
    shadow.camera.look_at(position, target, up);
    match kind {
        LightKind::Spot { cone_angle, .. } => {
            // The cone angle is the half-angle; the frustum must cover the
            // full cone.
            shadow
                .camera
                .set_perspective(cone_angle * 2.0, 1.0, SHADOW_NEAR, far);
        }
        LightKind::Directional { area_size } => {
            let half = area_size * 0.5;
            shadow
                .camera
                .set_orthographic(-half, half, -half, half, SHADOW_NEAR, far);
        }
        LightKind::Point => {}
    }
}
