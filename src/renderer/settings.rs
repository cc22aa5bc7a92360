//! Renderer configuration as plain data.
//!
//! Settings are read at the start of each frame; changing them between
//! frames switches pipelines or toggles passes without touching resources.

use bitflags::bitflags;

/// Which frame pipeline renders drawables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPipeline {
    /// Per-object shading straight to the screen.
    Forward,
    /// G-buffer, SSAO and screen-space light accumulation.
    #[default]
    Deferred,
}

/// How the forward pipeline shades each object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    /// Textured albedo only, no lights.
    Unlit,
    /// One draw per affecting light, additively accumulated.
    #[default]
    MultiPass,
    /// All lights in one draw, up to the shader's array capacity.
    SinglePass,
}

/// Tone mapping operator applied when resolving the HDR accumulation
/// target to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMapper {
    /// Luminance-based Reinhard.
    #[default]
    ReinhardLuma,
    /// Filmic curve with toe and shoulder.
    Filmic,
}

impl ToneMapper {
    /// Index uploaded to the tone mapping shader.
    #[inline]
    #[must_use]
    pub fn shader_index(self) -> i32 {
        match self {
            Self::ReinhardLuma => 0,
            Self::Filmic => 1,
        }
    }
}

/// Ambient occlusion pass configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsaoSettings {
    pub enabled: bool,
    /// Run the separable blur over the raw occlusion output.
    pub blur: bool,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            blur: true,
        }
    }
}

bitflags! {
    /// Diagnostic overlays composited on top of the frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DebugView: u32 {
        /// Show the G-buffer attachments in four screen quadrants.
        const GBUFFERS = 1 << 0;
        /// Show the ambient occlusion texture fullscreen.
        const SSAO = 1 << 1;
        /// Show each allocated shadow map in an inset strip.
        const SHADOW_MAPS = 1 << 2;
        /// Draw a marker sphere at every irradiance probe, shaded by its
        /// own coefficients.
        const PROBES = 1 << 3;
    }
}

/// Top-level renderer switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererSettings {
    pub pipeline: RenderPipeline,
    pub shading: ShadingMode,
    /// Gates shadow *sampling* in lighting passes. Shadow map generation
    /// follows each light's own `cast_shadows` flag.
    pub shadows_enabled: bool,
    pub ssao: SsaoSettings,
    /// Accumulate light in HDR and tone map on resolve. When off the
    /// accumulation target is blitted as-is.
    pub hdr: bool,
    pub tone_mapper: ToneMapper,
    /// Let blended surfaces into the G-buffer via screen-door dithering.
    pub dithered_transparency: bool,
    pub debug_view: DebugView,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            pipeline: RenderPipeline::default(),
            shading: ShadingMode::default(),
            shadows_enabled: true,
            ssao: SsaoSettings::default(),
            hdr: true,
            tone_mapper: ToneMapper::default(),
            dithered_transparency: false,
            debug_view: DebugView::empty(),
        }
    }
}
