//! Surface material description.

use glam::{Vec3, Vec4};

use super::TextureId;

/// How a surface's alpha channel is interpreted.
///
/// The variant order is the render-call sort order: opaque first, then
/// alpha-tested, then blended surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Alpha test against [`Material::alpha_cutoff`].
    Mask,
    /// Alpha blending. Blended surfaces are drawn back to front, skip the
    /// G-buffer (unless dithered) and never cast shadows.
    Blend,
}

/// Material parameters for one drawable surface.
///
/// Plain data: the asset layer fills it in, the renderer only reads it.
/// Missing textures are substituted with the context's builtin white or
/// black texture at bind time.
#[derive(Debug, Clone)]
pub struct Material {
    pub alpha_mode: AlphaMode,
    /// Cutoff for [`AlphaMode::Mask`]; ignored by the other modes.
    pub alpha_cutoff: f32,
    /// Disables back-face culling for this surface.
    pub two_sided: bool,
    pub base_color: Vec4,
    pub emissive_factor: Vec3,
    pub color_texture: Option<TextureId>,
    pub normal_texture: Option<TextureId>,
    pub emissive_texture: Option<TextureId>,
    pub occlusion_texture: Option<TextureId>,
    pub metallic_roughness_texture: Option<TextureId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            two_sided: false,
            base_color: Vec4::ONE,
            emissive_factor: Vec3::ZERO,
            color_texture: None,
            normal_texture: None,
            emissive_texture: None,
            occlusion_texture: None,
            metallic_roughness_texture: None,
        }
    }
}

impl Material {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the surface needs alpha blending at draw time.
    #[inline]
    #[must_use]
    pub fn is_blended(&self) -> bool {
        self.alpha_mode == AlphaMode::Blend
    }

    /// Effective alpha cutoff to upload: zero disables the shader-side test
    /// for modes other than [`AlphaMode::Mask`].
    #[inline]
    #[must_use]
    pub fn effective_alpha_cutoff(&self) -> f32 {
        if self.alpha_mode == AlphaMode::Mask {
            self.alpha_cutoff
        } else {
            0.0
        }
    }
}
