//! Forward rendering.
//!
//! Draws every visible render call straight to the bound target, shaded
//! per the configured [`ShadingMode`]: unlit texturing, one additive draw
//! per light, or a single draw with all lights in uniform arrays.

use glam::Vec3;

use crate::gfx::{BlendMode, CullMode, DepthFunc, GpuContext, ShaderProgram};
use crate::renderer::collect::RenderCall;
use crate::renderer::settings::ShadingMode;

use super::{
    PassContext, bind_material_textures, debug_check, restore_baseline, upload_light,
    upload_surface_uniforms,
};

/// Uniform array capacity of the single-pass lighting shader.
pub const MAX_SINGLE_PASS_LIGHTS: usize = 8;

/// Renders `calls` to whatever target is currently bound. The caller is
/// responsible for binding and clearing; probe baking reuses this routine
/// against its capture target.
pub(crate) fn render(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    lights: &[usize],
    calls: &[RenderCall],
) {
    let program_name = match pass.settings.shading {
        ShadingMode::Unlit => "texture",
        ShadingMode::MultiPass => "light",
        ShadingMode::SinglePass => "single_light",
    };
    let Some(program) = pass.shaders.get(program_name) else {
        log::warn!("{program_name} shader unavailable, skipping forward pass");
        return;
    };

    for call in calls {
        if !pass.camera.sees_bounds(&call.bounds) {
            continue;
        }

        ctx.set_blend(if call.material.is_blended() {
            BlendMode::Alpha
        } else {
            BlendMode::Disabled
        });
        ctx.set_cull(if call.material.two_sided {
            CullMode::Disabled
        } else {
            CullMode::Back
        });

        upload_surface_uniforms(program.as_ref(), pass.camera, &call.model, &call.material);
        bind_material_textures(&*ctx, program.as_ref(), &call.material);

        match pass.settings.shading {
            ShadingMode::Unlit => {
                ctx.draw_mesh(call.mesh.as_ref(), program.as_ref());
            }
            ShadingMode::MultiPass => {
                multi_pass(ctx, pass, program.as_ref(), lights, call);
            }
            ShadingMode::SinglePass => {
                single_pass(ctx, pass, program.as_ref(), lights, call);
            }
        }

        // Per-object state back to neutral before the next call.
        ctx.set_blend(BlendMode::Disabled);
        ctx.set_depth_func(DepthFunc::Less);
    }

    restore_baseline(ctx);
    debug_check(ctx);
}

/// One draw per light. The first draw keeps the material's own blending
/// and carries the ambient term; every further draw accumulates
/// additively at equal depth with ambient zeroed.
fn multi_pass(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    program: &dyn ShaderProgram,
    lights: &[usize],
    call: &RenderCall,
) {
    if lights.is_empty() {
        program.set_vec3("u_ambient_light", pass.scene.ambient_light);
        program.set_vec3("u_light_color", Vec3::ZERO);
        program.set_i32("u_light_cast_shadows", 0);
        ctx.draw_mesh(call.mesh.as_ref(), program);
        return;
    }

    ctx.set_depth_func(DepthFunc::LessEqual);
    let mut ambient_pending = true;
    for &index in lights {
        let Some(light) = pass.scene.light(index) else {
            continue;
        };
        upload_light(program, light, pass.settings.shadows_enabled);
        program.set_vec3(
            "u_ambient_light",
            if ambient_pending {
                pass.scene.ambient_light
            } else {
                Vec3::ZERO
            },
        );
        ctx.draw_mesh(call.mesh.as_ref(), program);

        ctx.set_blend(BlendMode::Additive);
        ambient_pending = false;
    }
}

/// All lights in one draw through fixed-size uniform arrays. Lights beyond
/// the array capacity are dropped for the frame.
fn single_pass(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    program: &dyn ShaderProgram,
    lights: &[usize],
    call: &RenderCall,
) {
    let mut positions = [Vec3::ZERO; MAX_SINGLE_PASS_LIGHTS];
    let mut colors = [Vec3::ZERO; MAX_SINGLE_PASS_LIGHTS];
    let mut vectors = [Vec3::ZERO; MAX_SINGLE_PASS_LIGHTS];
    let mut cones = [Vec3::ZERO; MAX_SINGLE_PASS_LIGHTS];
    let mut max_distances = [0.0_f32; MAX_SINGLE_PASS_LIGHTS];
    let mut types = [0_i32; MAX_SINGLE_PASS_LIGHTS];

    let mut count = 0;
    for &index in lights {
        if count == MAX_SINGLE_PASS_LIGHTS {
            log::debug!(
                "single-pass shading limited to {MAX_SINGLE_PASS_LIGHTS} lights, dropping the rest"
            );
            break;
        }
        let Some(light) = pass.scene.light(index) else {
            continue;
        };
        positions[count] = light.position();
        colors[count] = light.scaled_color();
        vectors[count] = light.forward();
        cones[count] = light.cone_params();
        max_distances[count] = light.max_distance;
        types[count] = light.type_index();
        count += 1;
    }

    program.set_i32("u_num_lights", count as i32);
    program.set_vec3_array("u_light_position", &positions);
    program.set_vec3_array("u_light_color", &colors);
    program.set_vec3_array("u_light_vector", &vectors);
    program.set_vec3_array("u_light_cone", &cones);
    program.set_f32_array("u_light_max_distance", &max_distances);
    program.set_i32_array("u_light_type", &types);
    program.set_vec3("u_ambient_light", pass.scene.ambient_light);

    ctx.draw_mesh(call.mesh.as_ref(), program);
}
