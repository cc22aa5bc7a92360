//! GPU collaborator contracts.
//!
//! The renderer drives an immediate-state GPU through the traits in this
//! module. Implementations own the actual device resources; the renderer
//! only keeps opaque [`TargetId`]/[`TextureId`] handles and issues state
//! changes, uniform uploads and draws in pass order.
//!
//! State set through [`GpuContext`] is sticky: whatever a pass leaves behind
//! is what the next draw sees. Every pass in this crate therefore restores
//! the baseline state before returning (see `renderer::passes`).

pub mod material;

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};

pub use material::{AlphaMode, Material};

use crate::errors::Result;
use crate::scene::BoundingBox;

// ============================================================================
// Handles and descriptors
// ============================================================================

/// Opaque handle to a render target (a set of color attachments plus an
/// optional depth attachment) owned by the GPU context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

/// Opaque handle to a texture owned by the GPU context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Pixel format of a render target's color attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    /// 8-bit normalized RGBA, for LDR attachments like the G-buffer.
    #[default]
    Rgba8,
    /// Half-float RGBA, for HDR light accumulation.
    Rgba16F,
    /// Full-float RGBA, for data targets that get read back.
    Rgba32F,
}

/// Sampling filter for textures created through the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Linear,
    /// Required for data textures where texel identity matters, such as the
    /// packed probe coefficients.
    Nearest,
}

/// Blending state. The mode carries both the enable and the blend function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Disabled,
    /// `src_alpha, one_minus_src_alpha` - transparent surfaces.
    Alpha,
    /// `src_alpha, one` - light accumulation.
    Additive,
}

/// Depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthFunc {
    #[default]
    Less,
    /// Used when re-drawing geometry at identical depth (multi-pass
    /// lighting, light volumes over an existing depth buffer).
    LessEqual,
}

/// Face culling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    Disabled,
    #[default]
    Back,
}

/// Triangle winding considered front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winding {
    #[default]
    CounterClockwise,
    /// Light volumes flip the winding so the camera can sit inside the
    /// volume without the geometry being culled away.
    Clockwise,
}

/// Description of a render target to create.
#[derive(Debug, Clone, Copy)]
pub struct TargetDesc {
    /// Human-readable label, used in errors and GPU debugging tools.
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    /// Number of color attachments; zero for depth-only targets.
    pub color_attachments: u32,
    pub format: TextureFormat,
    /// Whether the target carries a depth attachment.
    pub depth: bool,
}

impl TargetDesc {
    /// A square depth-only target, as used for shadow maps.
    #[must_use]
    pub fn depth_only(label: &'static str, size: u32) -> Self {
        Self {
            label,
            width: size,
            height: size,
            color_attachments: 0,
            format: TextureFormat::Rgba8,
            depth: true,
        }
    }

    /// A single-attachment color target without depth.
    #[must_use]
    pub fn color_only(label: &'static str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label,
            width,
            height,
            color_attachments: 1,
            format,
            depth: false,
        }
    }
}

/// CPU-side image read back from a render target, row-major with row 0 at
/// the bottom of the image.
#[derive(Debug, Clone)]
pub struct FloatImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

impl FloatImage {
    /// An image filled with a constant value.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: Vec4) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; (width * height) as usize],
        }
    }

    /// Pixel at `(x, y)`; `y = 0` is the bottom row.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.width + x) as usize]
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// A mesh already resident on the GPU. The renderer never touches vertex
/// data; it only needs the object-space bounds for culling and the vertex
/// count for diagnostics.
pub trait GpuMesh {
    fn vertex_count(&self) -> u32;
    /// Object-space bounding box.
    fn bounds(&self) -> BoundingBox;
}

/// A compiled shader program. Uniform setters take `&self`; implementations
/// that need to stage uniform state may use interior mutability.
pub trait ShaderProgram {
    fn set_f32(&self, name: &str, value: f32);
    fn set_i32(&self, name: &str, value: i32);
    fn set_vec2(&self, name: &str, value: Vec2);
    fn set_vec3(&self, name: &str, value: Vec3);
    fn set_vec4(&self, name: &str, value: Vec4);
    fn set_mat4(&self, name: &str, value: &Mat4);
    /// Binds `texture` to `slot` and points the sampler uniform at it.
    fn set_texture(&self, name: &str, texture: TextureId, slot: u32);
    fn set_vec3_array(&self, name: &str, values: &[Vec3]);
    fn set_f32_array(&self, name: &str, values: &[f32]);
    fn set_i32_array(&self, name: &str, values: &[i32]);
}

/// Looks up shader programs by role name (`"gbuffers"`, `"deferred"`,
/// `"ssao"`, ...). A missing program is not an error: the pass that needed
/// it is skipped for the frame.
pub trait ShaderProvider {
    fn get(&self, name: &str) -> Option<Arc<dyn ShaderProgram>>;
}

/// The immediate-state GPU surface the renderer draws through.
pub trait GpuContext {
    // --- target lifecycle ---

    fn create_target(&mut self, desc: &TargetDesc) -> Result<TargetId>;
    fn destroy_target(&mut self, target: TargetId);
    /// Reallocates the target's attachments at a new size. Attachment
    /// handles previously returned for this target are invalidated.
    fn resize_target(&mut self, target: TargetId, width: u32, height: u32);

    /// Color attachment `index` of a target, if it exists.
    fn color_texture(&self, target: TargetId, index: u32) -> Option<TextureId>;
    /// Depth attachment of a target, if it has one.
    fn depth_texture(&self, target: TargetId) -> Option<TextureId>;

    /// Subsequent draws render into `target` until [`unbind_target`]
    /// restores the default framebuffer.
    ///
    /// [`unbind_target`]: GpuContext::unbind_target
    fn bind_target(&mut self, target: TargetId);
    fn unbind_target(&mut self);

    /// Synchronously reads color attachment 0 back to the CPU.
    fn read_back(&mut self, target: TargetId) -> Result<FloatImage>;

    // --- textures ---

    fn create_float_texture(
        &mut self,
        width: u32,
        height: u32,
        texels: &[Vec3],
        filter: TextureFilter,
    ) -> Result<TextureId>;
    fn update_float_texture(
        &mut self,
        texture: TextureId,
        width: u32,
        height: u32,
        texels: &[Vec3],
    ) -> Result<()>;

    /// A 1x1 white texture, bound in place of missing material textures.
    fn white_texture(&self) -> TextureId;
    /// A 1x1 black texture, bound in place of missing normal/emissive maps.
    fn black_texture(&self) -> TextureId;

    // --- render state ---

    fn set_blend(&mut self, mode: BlendMode);
    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_func(&mut self, func: DepthFunc);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_color_write(&mut self, enabled: bool);
    fn set_cull(&mut self, mode: CullMode);
    fn set_front_face(&mut self, winding: Winding);
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Clears the bound target. `color: None` leaves the color attachments
    /// untouched; `depth: false` leaves the depth attachment untouched.
    fn clear(&mut self, color: Option<Vec4>, depth: bool);

    fn draw_mesh(&mut self, mesh: &dyn GpuMesh, program: &dyn ShaderProgram);

    /// Draws `texture` as a fullscreen quad to the currently bound target
    /// (or the screen). With `program: None` the context's plain blit
    /// shader is used.
    fn blit(&mut self, texture: TextureId, program: Option<&dyn ShaderProgram>);

    /// Drains one pending GPU error, if the backend tracks them.
    fn poll_error(&mut self) -> Option<String> {
        None
    }
}
