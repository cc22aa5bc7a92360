//! Frame resolve and debug overlays.

use glam::{Mat4, Vec2, Vec3};

use crate::gfx::{BlendMode, GpuContext, GpuMesh, TargetId, TextureId};
use crate::probes::ProbeGrid;

use super::{PassContext, debug_check, restore_baseline};

/// Side length of one shadow map inset in the debug strip.
const SHADOW_INSET_SIZE: u32 = 256;

/// Radius of the probe marker spheres.
const PROBE_MARKER_RADIUS: f32 = 0.1;

/// Resolves the HDR illumination target to the screen. With HDR enabled
/// the tone mapping shader maps the accumulated radiance down; otherwise
/// the target is blitted untouched.
pub(crate) fn resolve(ctx: &mut dyn GpuContext, pass: &PassContext<'_>, illumination: TargetId) {
    let Some(color) = ctx.color_texture(illumination, 0) else {
        return;
    };
    ctx.set_blend(BlendMode::Disabled);
    ctx.set_depth_test(false);

    match pass.shaders.get("tone_mapping") {
        Some(program) if pass.settings.hdr => {
            program.set_i32("u_tonemapper", pass.settings.tone_mapper.shader_index());
            ctx.blit(color, Some(program.as_ref()));
        }
        _ => {
            ctx.blit(color, None);
        }
    }

    restore_baseline(ctx);
    debug_check(ctx);
}

/// Splits the screen into quadrants showing the three G-buffer color
/// attachments and the linearized depth buffer.
pub(crate) fn show_gbuffers(ctx: &mut dyn GpuContext, pass: &PassContext<'_>, gbuffer: TargetId) {
    let half_w = pass.width / 2;
    let half_h = pass.height / 2;

    ctx.set_blend(BlendMode::Disabled);
    ctx.set_depth_test(false);

    if let Some(color) = ctx.color_texture(gbuffer, 0) {
        ctx.set_viewport(0, half_h as i32, half_w, half_h);
        ctx.blit(color, None);
    }
    if let Some(normal) = ctx.color_texture(gbuffer, 1) {
        ctx.set_viewport(half_w as i32, half_h as i32, half_w, half_h);
        ctx.blit(normal, None);
    }
    if let Some(extra) = ctx.color_texture(gbuffer, 2) {
        ctx.set_viewport(0, 0, half_w, half_h);
        ctx.blit(extra, None);
    }
    if let Some(depth) = ctx.depth_texture(gbuffer) {
        ctx.set_viewport(half_w as i32, 0, half_w, half_h);
        blit_depth(ctx, pass, depth, pass.camera.near(), pass.camera.far());
    }

    ctx.set_viewport(0, 0, pass.width, pass.height);
    restore_baseline(ctx);
    debug_check(ctx);
}

/// Shows the occlusion texture fullscreen.
pub(crate) fn show_ssao(ctx: &mut dyn GpuContext, texture: TextureId) {
    ctx.set_blend(BlendMode::Disabled);
    ctx.set_depth_test(false);
    ctx.blit(texture, None);
    restore_baseline(ctx);
    debug_check(ctx);
}

/// Draws each allocated shadow map in a strip of insets along the bottom
/// edge of the screen.
pub(crate) fn show_shadow_maps(ctx: &mut dyn GpuContext, pass: &PassContext<'_>, lights: &[usize]) {
    ctx.set_blend(BlendMode::Disabled);
    ctx.set_depth_test(false);

    let mut x = 0;
    for &index in lights {
        let Some(light) = pass.scene.light(index) else {
            continue;
        };
        let Some(shadow) = &light.shadow else {
            continue;
        };
        ctx.set_viewport(x, 0, SHADOW_INSET_SIZE, SHADOW_INSET_SIZE);
        blit_depth(
            ctx,
            pass,
            shadow.depth_texture,
            shadow.camera.near(),
            shadow.camera.far(),
        );
        x += SHADOW_INSET_SIZE as i32;
    }

    ctx.set_viewport(0, 0, pass.width, pass.height);
    restore_baseline(ctx);
    debug_check(ctx);
}

/// Draws a marker sphere at each probe position, shaded by the probe's
/// own coefficients so the field can be inspected in place.
pub(crate) fn show_probes(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    grid: &ProbeGrid,
    sphere: &dyn GpuMesh,
) {
    let Some(program) = pass.shaders.get("probe") else {
        return;
    };
    ctx.set_blend(BlendMode::Disabled);
    ctx.set_depth_test(false);

    program.set_mat4("u_viewprojection", &pass.camera.view_projection());
    program.set_vec3("u_camera_position", pass.camera.eye());
    for probe in grid.probes() {
        let model = Mat4::from_translation(probe.position)
            * Mat4::from_scale(Vec3::splat(PROBE_MARKER_RADIUS));
        program.set_mat4("u_model", &model);
        program.set_vec3_array("u_coeffs", &probe.sh.coeffs);
        ctx.draw_mesh(sphere, program.as_ref());
    }

    restore_baseline(ctx);
    debug_check(ctx);
}

/// Blits a depth texture through the linearizing depth shader, falling
/// back to a raw blit when the shader is unavailable.
fn blit_depth(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    depth: TextureId,
    near: f32,
    far: f32,
) {
    match pass.shaders.get("depth") {
        Some(program) => {
            program.set_vec2("u_camera_nearfar", Vec2::new(near, far));
            ctx.blit(depth, Some(program.as_ref()));
        }
        None => ctx.blit(depth, None),
    }
}
