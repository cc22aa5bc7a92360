//! Camera with cached matrices and frustum.

use glam::{Mat4, Vec3, Vec4};

use super::BoundingBox;

/// Projection parameters. Angles are stored in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

/// A look-at camera. View, projection and the composed view-projection are
/// recomputed eagerly whenever eye pose or projection change, so reads are
/// always consistent and the frustum is ready for culling.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Vec3,
    center: Vec3,
    up: Vec3,
    projection: Projection,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    view_projection: Mat4,
    frustum: Frustum,
}

impl Camera {
    /// Perspective camera at the origin looking down -Z. `fov_y_degrees` is
    /// the full vertical field of view.
    #[must_use]
    pub fn new_perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            eye: Vec3::ZERO,
            center: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov_y: fov_y_degrees.to_radians(),
                aspect,
                near,
                far,
            },
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            frustum: Frustum::default(),
        };
        camera.update_matrices();
        camera
    }

    pub fn look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.eye = eye;
        self.center = center;
        self.up = up;
        self.update_matrices();
    }

    pub fn set_perspective(&mut self, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        };
        self.update_matrices();
    }

    pub fn set_orthographic(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
        self.update_matrices();
    }

    fn update_matrices(&mut self) {
        self.view_matrix = Mat4::look_at_rh(self.eye, self.center, self.up);
        self.projection_matrix = match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        };
        self.view_projection = self.projection_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(self.view_projection);
    }

    #[inline]
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    #[inline]
    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    #[inline]
    #[must_use]
    pub fn near(&self) -> f32 {
        match self.projection {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => near,
        }
    }

    #[inline]
    #[must_use]
    pub fn far(&self) -> f32 {
        match self.projection {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => far,
        }
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    #[inline]
    #[must_use]
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Conservative visibility test for a world-space box.
    #[inline]
    #[must_use]
    pub fn sees_box(&self, center: Vec3, half_extent: Vec3) -> bool {
        self.frustum.intersects_box(center, half_extent)
    }

    /// Conservative visibility test for world-space bounds.
    #[inline]
    #[must_use]
    pub fn sees_bounds(&self, bounds: &BoundingBox) -> bool {
        self.frustum.intersects_box(bounds.center(), bounds.half_extent())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(60.0, 1.0, 0.1, 1000.0)
    }
}

// ============================================================================
// Frustum
// ============================================================================

/// View frustum as six inward-facing planes `(nx, ny, nz, d)` with
/// `n . p + d >= 0` for points inside.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the planes from a view-projection matrix (Gribb-Hartmann),
    /// assuming a `[0, 1]` clip-space depth range.
    #[must_use]
    pub fn from_matrix(view_projection: Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near
            r3 - r2, // far
        ];
        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > f32::EPSILON {
                *plane /= length;
            }
        }
        Self { planes }
    }

    /// Conservative test of an axis-aligned box given by center and
    /// half-extent: returns `false` only when the box is entirely outside
    /// one plane, so partially visible boxes always pass.
    #[must_use]
    pub fn intersects_box(&self, center: Vec3, half_extent: Vec3) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            let distance = normal.dot(center) + plane.w;
            let radius = half_extent.dot(normal.abs());
            if distance + radius < 0.0 {
                return false;
            }
        }
        true
    }

    /// Point containment test.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_box(point, Vec3::ZERO)
    }
}
