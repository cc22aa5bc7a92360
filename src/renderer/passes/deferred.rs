//! Deferred light accumulation.
//!
//! Reconstructs lit color from the G-buffer into the HDR illumination
//! target. Point and spot lights rasterize a sphere volume scaled to their
//! influence radius with clockwise front faces, so the pass works with the
//! camera inside the volume; directional lights use a fullscreen quad.
//!
//! The scene ambient term is folded into whichever draw runs first and
//! zeroed for every later one, tracked by an explicit `ambient_pending`
//! flag. With no lights at all, one quad draw with zero light color still
//! runs so ambient and emissive reach the screen.

use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use crate::gfx::{
    BlendMode, CullMode, DepthFunc, GpuContext, GpuMesh, ShaderProgram, TargetId, TextureId,
    Winding,
};
use crate::probes::ProbeGrid;
use crate::scene::Scene;

use super::{
    PassContext, SLOT_GBUFFER_COLOR, SLOT_GBUFFER_DEPTH, SLOT_GBUFFER_EXTRA, SLOT_GBUFFER_NORMAL,
    SLOT_IRRADIANCE, SLOT_SSAO, debug_check, restore_baseline, upload_light,
};

pub(crate) fn render(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    illumination: TargetId,
    gbuffer: TargetId,
    ssao_texture: Option<TextureId>,
    probes: Option<&ProbeGrid>,
    lights: &[usize],
    sphere: &dyn GpuMesh,
    quad: &dyn GpuMesh,
) {
    let (Some(volume_program), Some(quad_program)) =
        (pass.shaders.get("deferred_ws"), pass.shaders.get("deferred"))
    else {
        log::warn!("deferred shaders unavailable, skipping light accumulation");
        return;
    };

    ctx.bind_target(illumination);
    ctx.clear(Some(Vec4::new(0.0, 0.0, 0.0, 1.0)), true);
    ctx.set_depth_write(false);
    ctx.set_blend(BlendMode::Disabled);

    for program in [volume_program.as_ref(), quad_program.as_ref()] {
        upload_gbuffer_bindings(ctx, pass, program, gbuffer, ssao_texture);
        upload_probe_bindings(program, probes);
    }

    let mut ambient_pending = true;
    let mut drew_any = false;
    let mut directional: SmallVec<[usize; 4]> = SmallVec::new();

    // Local light volumes. Clockwise fronts plus relaxed depth keep the
    // sphere visible when the camera is inside it.
    ctx.set_cull(CullMode::Back);
    ctx.set_front_face(Winding::Clockwise);
    ctx.set_depth_test(true);
    ctx.set_depth_func(DepthFunc::LessEqual);

    for &index in lights {
        let Some(light) = pass.scene.light(index) else {
            continue;
        };
        if light.is_directional() {
            directional.push(index);
            continue;
        }
        upload_light(
            volume_program.as_ref(),
            light,
            pass.settings.shadows_enabled,
        );
        upload_ambient(volume_program.as_ref(), pass.scene, probes, ambient_pending);
        let model = Mat4::from_translation(light.position())
            * Mat4::from_scale(Vec3::splat(light.max_distance));
        volume_program.set_mat4("u_model", &model);
        ctx.draw_mesh(sphere, volume_program.as_ref());

        ctx.set_blend(BlendMode::Additive);
        ambient_pending = false;
        drew_any = true;
    }

    // Directional lights cover the whole screen.
    ctx.set_front_face(Winding::CounterClockwise);
    ctx.set_cull(CullMode::Disabled);
    ctx.set_depth_test(false);
    ctx.set_blend(BlendMode::Additive);

    for &index in &directional {
        let Some(light) = pass.scene.light(index) else {
            continue;
        };
        upload_light(quad_program.as_ref(), light, pass.settings.shadows_enabled);
        upload_ambient(quad_program.as_ref(), pass.scene, probes, ambient_pending);
        ctx.draw_mesh(quad, quad_program.as_ref());

        ambient_pending = false;
        drew_any = true;
    }

    if !drew_any {
        // No lights: ambient and emissive still have to reach the target.
        ctx.set_blend(BlendMode::Disabled);
        quad_program.set_vec3("u_light_color", Vec3::ZERO);
        quad_program.set_i32("u_light_cast_shadows", 0);
        upload_ambient(quad_program.as_ref(), pass.scene, probes, ambient_pending);
        ctx.draw_mesh(quad, quad_program.as_ref());
    }

    ctx.unbind_target();
    restore_baseline(ctx);
    debug_check(ctx);
}

/// Binds the G-buffer attachments and reconstruction uniforms shared by
/// both deferred shaders.
fn upload_gbuffer_bindings(
    ctx: &dyn GpuContext,
    pass: &PassContext<'_>,
    program: &dyn ShaderProgram,
    gbuffer: TargetId,
    ssao_texture: Option<TextureId>,
) {
    if let Some(color) = ctx.color_texture(gbuffer, 0) {
        program.set_texture("u_color_texture", color, SLOT_GBUFFER_COLOR);
    }
    if let Some(normal) = ctx.color_texture(gbuffer, 1) {
        program.set_texture("u_normal_texture", normal, SLOT_GBUFFER_NORMAL);
    }
    if let Some(extra) = ctx.color_texture(gbuffer, 2) {
        program.set_texture("u_extra_texture", extra, SLOT_GBUFFER_EXTRA);
    }
    if let Some(depth) = ctx.depth_texture(gbuffer) {
        program.set_texture("u_depth_texture", depth, SLOT_GBUFFER_DEPTH);
    }

    program.set_texture(
        "u_ssao_texture",
        ssao_texture.unwrap_or_else(|| ctx.white_texture()),
        SLOT_SSAO,
    );

    let view_projection = pass.camera.view_projection();
    program.set_mat4("u_viewprojection", &view_projection);
    program.set_mat4("u_inverse_viewprojection", &view_projection.inverse());
    program.set_vec3("u_camera_position", pass.camera.eye());
    program.set_vec2(
        "u_iRes",
        glam::Vec2::new(1.0 / pass.width as f32, 1.0 / pass.height as f32),
    );
    program.set_i32("u_use_hdr", i32::from(pass.settings.hdr));
}

/// Binds the irradiance probe field, when one has been baked.
fn upload_probe_bindings(program: &dyn ShaderProgram, probes: Option<&ProbeGrid>) {
    let Some(grid) = probes else {
        program.set_i32("u_num_probes", 0);
        return;
    };
    let Some(texture) = grid.texture() else {
        program.set_i32("u_num_probes", 0);
        return;
    };
    program.set_texture("u_probes_texture", texture, SLOT_IRRADIANCE);
    program.set_i32("u_num_probes", grid.probe_count() as i32);
    program.set_vec3("u_irr_start", grid.start());
    program.set_vec3("u_irr_end", grid.end());
    program.set_vec3("u_irr_delta", grid.delta());
    program.set_vec3("u_irr_dims", grid.dims().as_vec3());
}

/// Writes the ambient term: the real value while it is still pending, zero
/// once any draw has already contributed it.
fn upload_ambient(
    program: &dyn ShaderProgram,
    scene: &Scene,
    probes: Option<&ProbeGrid>,
    pending: bool,
) {
    let ambient = if pending { scene.ambient_light } else { Vec3::ZERO };
    program.set_vec3("u_ambient_light", ambient);

    let use_probes = pending && probes.is_some_and(|grid| grid.texture().is_some());
    program.set_i32("u_use_irradiance", i32::from(use_probes));
}
