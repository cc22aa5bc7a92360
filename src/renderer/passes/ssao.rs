//! Screen-space ambient occlusion.
//!
//! Samples the G-buffer depth with a fixed hemisphere kernel, then
//! optionally runs a blur into a scratch target. The caller hands in both
//! target handles and receives them back, possibly exchanged, so that the
//! first handle always names the texture lighting should read.

use glam::{Vec2, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gfx::{BlendMode, GpuContext, GpuMesh, TargetId};

use super::{PassContext, SLOT_GBUFFER_DEPTH, SLOT_GBUFFER_NORMAL, SLOT_SSAO, debug_check, restore_baseline};

/// Number of sample directions in the occlusion kernel.
pub const SSAO_KERNEL_SIZE: usize = 64;

// Fixed seed: the kernel must be identical across runs and instances.
const KERNEL_SEED: u64 = 0x55A0;

/// Builds the hemisphere sample kernel: directions uniform over the
/// sphere, radii biased toward the shell by a cube-root distribution, and
/// everything mirrored into the `z >= 0` hemisphere.
#[must_use]
pub fn generate_hemisphere_kernel(count: usize) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(KERNEL_SEED);
    let mut points = Vec::with_capacity(count);
    while points.len() < count {
        let u: f32 = rng.random_range(0.0..1.0);
        let v: f32 = rng.random_range(0.0..1.0);
        let theta = u * std::f32::consts::TAU;
        let cos_phi = 2.0 * v - 1.0;
        let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
        let radius: f32 = rng.random_range(0.0..1.0_f32).mul_add(0.9, 0.1).cbrt();

        let mut point = Vec3::new(
            radius * sin_phi * theta.cos(),
            radius * sin_phi * theta.sin(),
            radius * cos_phi,
        );
        point.z = point.z.abs();
        points.push(point);
    }
    points
}

/// Renders occlusion into `primary`, optionally blurring into `scratch`.
/// Returns `(readable, scratch)`: when the blur ran the handles come back
/// exchanged so the first one is always the texture to sample.
pub(crate) fn render(
    ctx: &mut dyn GpuContext,
    pass: &PassContext<'_>,
    primary: TargetId,
    scratch: TargetId,
    gbuffer: TargetId,
    kernel: &[Vec3],
    quad: &dyn GpuMesh,
) -> (TargetId, TargetId) {
    let Some(depth) = ctx.depth_texture(gbuffer) else {
        return (primary, scratch);
    };
    let Some(normal) = ctx.color_texture(gbuffer, 1) else {
        return (primary, scratch);
    };
    let Some(program) = pass.shaders.get("ssao") else {
        log::warn!("ssao shader unavailable, skipping occlusion pass");
        return (primary, scratch);
    };

    let inverse_resolution = Vec2::new(1.0 / pass.width as f32, 1.0 / pass.height as f32);
    let view_projection = pass.camera.view_projection();

    ctx.bind_target(primary);
    ctx.clear(Some(Vec4::ONE), false);
    ctx.set_depth_test(false);
    ctx.set_blend(BlendMode::Disabled);

    program.set_texture("u_depth_texture", depth, SLOT_GBUFFER_DEPTH);
    program.set_texture("u_normal_texture", normal, SLOT_GBUFFER_NORMAL);
    program.set_mat4("u_viewprojection", &view_projection);
    program.set_mat4("u_inverse_viewprojection", &view_projection.inverse());
    program.set_vec2("u_iRes", inverse_resolution);
    program.set_vec3_array("u_points", kernel);
    ctx.draw_mesh(quad, program.as_ref());
    ctx.unbind_target();

    let mut blurred = false;
    if pass.settings.ssao.blur {
        if let (Some(blur_program), Some(raw)) =
            (pass.shaders.get("ssao_blur"), ctx.color_texture(primary, 0))
        {
            ctx.bind_target(scratch);
            blur_program.set_texture("u_ssao_texture", raw, SLOT_SSAO);
            blur_program.set_vec2("u_iRes", inverse_resolution);
            ctx.draw_mesh(quad, blur_program.as_ref());
            ctx.unbind_target();
            blurred = true;
        }
    }

    restore_baseline(ctx);
    debug_check(ctx);

    if blurred {
        (scratch, primary)
    } else {
        (primary, scratch)
    }
}
