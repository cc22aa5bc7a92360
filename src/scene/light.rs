//! Light sources and their shadow resources.

use glam::{Mat4, Vec3};

use crate::gfx::{GpuContext, TargetId, TextureId};

use super::Camera;

/// Kind-specific light parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Omnidirectional, attenuated. Never casts shadows.
    Point,
    Spot {
        /// Half-angle of the cone, in degrees.
        cone_angle: f32,
        /// Angular falloff exponent.
        cone_exponent: f32,
    },
    Directional {
        /// Side length of the square area the ortho shadow camera covers.
        area_size: f32,
    },
}

/// Shadow map owned by a light: a depth-only render target plus the camera
/// that renders into it. Allocated lazily the first frame the light casts
/// shadows and released when it stops.
#[derive(Debug, Clone)]
pub struct ShadowMap {
    pub target: TargetId,
    /// Depth attachment of `target`, cached so lighting passes can bind it
    /// without going back to the context.
    pub depth_texture: TextureId,
    pub camera: Camera,
}

/// A light entity. Orientation and position come from `transform`; the
/// light shines down its local -Z axis.
#[derive(Debug, Clone)]
pub struct Light {
    pub transform: Mat4,
    pub visible: bool,
    pub color: Vec3,
    pub intensity: f32,
    /// Influence radius; also the far plane of the shadow camera.
    pub max_distance: f32,
    pub kind: LightKind,
    pub cast_shadows: bool,
    pub shadow_bias: f32,
    /// Present only while `cast_shadows` is set and the light kind supports
    /// shadow maps. The shadow pass keeps this in sync every frame.
    pub shadow: Option<ShadowMap>,
}

impl Light {
    #[must_use]
    pub fn new(kind: LightKind, color: Vec3, intensity: f32, max_distance: f32) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            visible: true,
            color,
            intensity,
            max_distance,
            kind,
            cast_shadows: false,
            shadow_bias: 0.001,
            shadow: None,
        }
    }

    #[must_use]
    pub fn point(color: Vec3, intensity: f32, max_distance: f32) -> Self {
        Self::new(LightKind::Point, color, intensity, max_distance)
    }

    #[must_use]
    pub fn spot(
        color: Vec3,
        intensity: f32,
        max_distance: f32,
        cone_angle: f32,
        cone_exponent: f32,
    ) -> Self {
        Self::new(
            LightKind::Spot {
                cone_angle,
                cone_exponent,
            },
            color,
            intensity,
            max_distance,
        )
    }

    #[must_use]
    pub fn directional(color: Vec3, intensity: f32, area_size: f32) -> Self {
        Self::new(LightKind::Directional { area_size }, color, intensity, 1000.0)
    }

    /// World-space position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// World-space emission direction (local -Z).
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.transform.transform_vector3(Vec3::NEG_Z).normalize_or(Vec3::NEG_Z)
    }

    /// World-space up vector (local +Y), used to orient the shadow camera.
    #[inline]
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.transform.transform_vector3(Vec3::Y).normalize_or(Vec3::Y)
    }

    #[inline]
    #[must_use]
    pub fn is_directional(&self) -> bool {
        matches!(self.kind, LightKind::Directional { .. })
    }

    #[inline]
    #[must_use]
    pub fn is_point(&self) -> bool {
        matches!(self.kind, LightKind::Point)
    }

    /// Shader-side light type index.
    #[inline]
    #[must_use]
    pub fn type_index(&self) -> i32 {
        match self.kind {
            LightKind::Point => 0,
            LightKind::Directional { .. } => 1,
            LightKind::Spot { .. } => 2,
        }
    }

    /// Cone parameters as uploaded to shaders: `(angle_degrees, exponent,
    /// cos(angle))`. Zero for non-spot lights.
    #[must_use]
    pub fn cone_params(&self) -> Vec3 {
        match self.kind {
            LightKind::Spot {
                cone_angle,
                cone_exponent,
            } => Vec3::new(cone_angle, cone_exponent, cone_angle.to_radians().cos()),
            _ => Vec3::ZERO,
        }
    }

    /// `area_size` for directional lights, zero otherwise.
    #[inline]
    #[must_use]
    pub fn area_size(&self) -> f32 {
        match self.kind {
            LightKind::Directional { area_size } => area_size,
            _ => 0.0,
        }
    }

    /// Effective emitted color.
    #[inline]
    #[must_use]
    pub fn scaled_color(&self) -> Vec3 {
        self.color * self.intensity
    }

    #[inline]
    #[must_use]
    pub fn has_shadow_map(&self) -> bool {
        self.shadow.is_some()
    }

    /// Frees the shadow target, if any. Idempotent.
    pub fn release_shadow_resources(&mut self, ctx: &mut dyn GpuContext) {
        if let Some(shadow) = self.shadow.take() {
            ctx.destroy_target(shadow.target);
        }
    }
}
