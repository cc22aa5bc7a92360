//! Geometry pass.
//!
//! Writes every opaque and masked surface into the G-buffer: albedo,
//! world normal, material extras and depth. Blended surfaces are excluded
//! unless dithered transparency converts them to screen-door coverage.

use glam::Vec4;

use crate::gfx::{AlphaMode, BlendMode, CullMode, GpuContext, ShaderProgram, TargetId};
use crate::renderer::collect::RenderCall;

use super::{
    PassContext, bind_material_textures, debug_check, restore_baseline, upload_surface_uniforms,
};

pub(crate) fn render(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    gbuffer: TargetId,
    calls: &[RenderCall],
) {
    let dithered = pass.settings.dithered_transparency;

    ctx.bind_target(gbuffer);
    ctx.clear(Some(Vec4::new(0.0, 0.0, 0.0, 1.0)), true);

    let Some(program) = pass.shaders.get("gbuffers") else {
        log::warn!("gbuffers shader unavailable, skipping geometry pass");
        ctx.unbind_target();
        restore_baseline(ctx);
        return;
    };

    ctx.set_blend(BlendMode::Disabled);
    for call in calls {
        if call.material.alpha_mode == AlphaMode::Blend && !dithered {
            continue;
        }
        if !pass.camera.sees_bounds(&call.bounds) {
            continue;
        }
        draw_call(ctx, pass, program.as_ref(), call, dithered);
    }

    ctx.unbind_target();
    restore_baseline(ctx);
    debug_check(ctx);
}

fn draw_call(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    program: &dyn ShaderProgram,
    call: &RenderCall,
    dithered: bool,
) {
    ctx.set_cull(if call.material.two_sided {
        CullMode::Disabled
    } else {
        CullMode::Back
    });

    upload_surface_uniforms(program, pass.camera, &call.model, &call.material);
    bind_material_textures(&*ctx, program, &call.material);
    program.set_i32(
        "u_dither",
        i32::from(dithered && call.material.is_blended()),
    );

    ctx.draw_mesh(call.mesh.as_ref(), program);
}
