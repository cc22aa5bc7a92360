//! Frame passes.
//!
//! Each pass is a free function over the GPU context plus the borrowed
//! frame state it needs. Passes share two disciplines:
//!
//! - every pass calls [`restore_baseline`] before returning, so sticky GPU
//!   state never leaks into the next pass;
//! - every pass ends with [`debug_check`], which drains the context's
//!   error state and asserts in debug builds.

pub mod composite;
pub mod deferred;
pub mod forward;
pub mod gbuffer;
pub mod shadow;
pub mod ssao;

use glam::Mat4;

use crate::gfx::{
    BlendMode, CullMode, DepthFunc, GpuContext, Material, ShaderProgram, ShaderProvider, Winding,
};
use crate::renderer::settings::RendererSettings;
use crate::scene::{Camera, Light, Scene};

// Texture unit assignments, shared across passes so a shader role always
// finds its inputs in the same slots.
pub(crate) const SLOT_COLOR: u32 = 0;
pub(crate) const SLOT_NORMAL: u32 = 1;
pub(crate) const SLOT_EMISSIVE: u32 = 2;
pub(crate) const SLOT_OCCLUSION: u32 = 3;
pub(crate) const SLOT_METALLIC_ROUGHNESS: u32 = 4;
pub(crate) const SLOT_SHADOW_MAP: u32 = 5;
pub(crate) const SLOT_GBUFFER_COLOR: u32 = 6;
pub(crate) const SLOT_GBUFFER_NORMAL: u32 = 7;
pub(crate) const SLOT_GBUFFER_EXTRA: u32 = 8;
pub(crate) const SLOT_GBUFFER_DEPTH: u32 = 9;
pub(crate) const SLOT_SSAO: u32 = 10;
pub(crate) const SLOT_IRRADIANCE: u32 = 11;

/// Read-only frame state threaded through the passes.
pub(crate) struct PassContext<'a> {
    pub shaders: &'a dyn ShaderProvider,
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub settings: &'a RendererSettings,
    pub width: u32,
    pub height: u32,
}

/// Returns GPU state to the between-pass baseline: no blending, depth test
/// less with writes on, back-face culling with counter-clockwise fronts,
/// full color writes.
pub(crate) fn restore_baseline(ctx: &mut dyn GpuContext) {
    ctx.set_blend(BlendMode::Disabled);
    ctx.set_depth_test(true);
    ctx.set_depth_func(DepthFunc::Less);
    ctx.set_depth_write(true);
    ctx.set_color_write(true);
    ctx.set_cull(CullMode::Back);
    ctx.set_front_face(Winding::CounterClockwise);
}

/// Drains pending GPU errors at a pass boundary. Asserts in debug builds
/// so a failing pass is caught at its own boundary rather than blamed on a
/// later one.
pub(crate) fn debug_check(ctx: &mut dyn GpuContext) {
    let error = ctx.poll_error();
    debug_assert!(error.is_none(), "GPU error leaked from pass: {error:?}");
}

/// Uploads the uniforms every surface shader expects.
pub(crate) fn upload_surface_uniforms(
    program: &dyn ShaderProgram,
    camera: &Camera,
    model: &Mat4,
    material: &Material,
) {
    program.set_mat4("u_viewprojection", &camera.view_projection());
    program.set_vec3("u_camera_position", camera.eye());
    program.set_mat4("u_model", model);
    program.set_vec4("u_color", material.base_color);
    program.set_vec3("u_emissive_factor", material.emissive_factor);
    program.set_f32("u_alpha_cutoff", material.effective_alpha_cutoff());
}

/// Binds the material's texture set, substituting the context's builtin
/// white/black textures for missing slots so shaders can sample
/// unconditionally.
pub(crate) fn bind_material_textures(
    ctx: &dyn GpuContext,
    program: &dyn ShaderProgram,
    material: &Material,
) {
    let white = ctx.white_texture();
    let black = ctx.black_texture();
    program.set_texture(
        "u_texture",
        material.color_texture.unwrap_or(white),
        SLOT_COLOR,
    );
    program.set_texture(
        "u_normal_texture",
        material.normal_texture.unwrap_or(black),
        SLOT_NORMAL,
    );
    program.set_texture(
        "u_emissive_texture",
        material.emissive_texture.unwrap_or(white),
        SLOT_EMISSIVE,
    );
    program.set_texture(
        "u_occlusion_texture",
        material.occlusion_texture.unwrap_or(white),
        SLOT_OCCLUSION,
    );
    program.set_texture(
        "u_metallic_roughness_texture",
        material.metallic_roughness_texture.unwrap_or(white),
        SLOT_METALLIC_ROUGHNESS,
    );
}

/// Uploads one light's parameters, including its shadow map when shadow
/// sampling is enabled and the light has one.
pub(crate) fn upload_light(program: &dyn ShaderProgram, light: &Light, shadows_enabled: bool) {
    program.set_vec3("u_light_color", light.scaled_color());
    program.set_vec3("u_light_position", light.position());
    program.set_vec3("u_light_vector", light.forward());
    program.set_i32("u_light_type", light.type_index());
    program.set_f32("u_light_max_distance", light.max_distance);
    program.set_vec3("u_light_cone", light.cone_params());
    program.set_f32("u_area_size", light.area_size());

    match &light.shadow {
        Some(shadow) if shadows_enabled => {
            program.set_i32("u_light_cast_shadows", 1);
            program.set_texture("u_shadow_map", shadow.depth_texture, SLOT_SHADOW_MAP);
            program.set_mat4("u_shadow_viewprojection", &shadow.camera.view_projection());
            program.set_f32("u_shadow_bias", light.shadow_bias);
        }
        _ => {
            program.set_i32("u_light_cast_shadows", 0);
        }
    }
}
