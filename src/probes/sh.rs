//! Second-order spherical harmonics.
//!
//! Nine-coefficient (L2) RGB spherical harmonics: projection of cube-face
//! captures into coefficients, and reconstruction of radiance and
//! cosine-convolved irradiance. All directions are unit vectors in world
//! space.

use glam::Vec3;

use crate::gfx::FloatImage;

/// Coefficient count of an L2 expansion.
pub const SH_COEFFICIENTS: usize = 9;

// Real SH basis constants for bands 0..2.
const Y00: f32 = 0.282_095;
const Y1: f32 = 0.488_603;
const Y2_OFF: f32 = 1.092_548; // Y2-2, Y2-1, Y21
const Y20: f32 = 0.315_392;
const Y22: f32 = 0.546_274;

// Cosine-lobe convolution weights per band, divided by pi so that a
// uniform radiance field reconstructs to itself as irradiance.
const A0: f32 = 1.0;
const A1: f32 = 2.0 / 3.0;
const A2: f32 = 0.25;

/// Capture directions for the six cube faces as `(forward, up)` pairs, in
/// the order +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y),
    (Vec3::NEG_X, Vec3::Y),
    (Vec3::Y, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::Z),
    (Vec3::Z, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y),
];

/// Evaluates the nine basis functions for a unit direction.
#[must_use]
pub fn eval_basis(dir: Vec3) -> [f32; SH_COEFFICIENTS] {
    let Vec3 { x, y, z } = dir;
    [
        Y00,
        Y1 * y,
        Y1 * z,
        Y1 * x,
        Y2_OFF * x * y,
        Y2_OFF * y * z,
        Y20 * (3.0 * z * z - 1.0),
        Y2_OFF * x * z,
        Y22 * (x * x - y * y),
    ]
}

/// An RGB L2 spherical harmonics expansion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sh9 {
    pub coeffs: [Vec3; SH_COEFFICIENTS],
}

impl Sh9 {
    /// Accumulates one radiance sample from `dir` weighted by its solid
    /// angle.
    pub fn add_sample(&mut self, dir: Vec3, radiance: Vec3, solid_angle: f32) {
        let basis = eval_basis(dir);
        for (coeff, b) in self.coeffs.iter_mut().zip(basis) {
            *coeff += radiance * b * solid_angle;
        }
    }

    /// Reconstructs the projected radiance arriving from `dir`.
    #[must_use]
    pub fn radiance(&self, dir: Vec3) -> Vec3 {
        let basis = eval_basis(dir);
        self.coeffs
            .iter()
            .zip(basis)
            .fold(Vec3::ZERO, |sum, (coeff, b)| sum + *coeff * b)
    }

    /// Reconstructs diffuse irradiance for a surface normal, convolved
    /// with the clamped cosine lobe and normalized so a uniform field of
    /// radiance `R` yields irradiance `R`.
    #[must_use]
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let basis = eval_basis(normal);
        let band = [A0, A1, A1, A1, A2, A2, A2, A2, A2];
        let mut sum = Vec3::ZERO;
        for i in 0..SH_COEFFICIENTS {
            sum += self.coeffs[i] * basis[i] * band[i];
        }
        sum
    }
}

/// Projects six cube-face captures into an L2 expansion. Faces must be in
/// [`CUBE_FACES`] order and share the same square resolution. Each texel
/// is weighted by the solid angle it subtends, so face resolution only
/// affects precision, not magnitude.
#[must_use]
pub fn project_cube_faces(faces: &[FloatImage]) -> Sh9 {
    let mut sh = Sh9::default();
    for (face, (forward, up)) in faces.iter().zip(CUBE_FACES) {
        let right = forward.cross(up);
        let width = face.width as f32;
        let height = face.height as f32;
        for y in 0..face.height {
            // Read-back rows start at the image bottom, which is -up.
            let t = 2.0 * (y as f32 + 0.5) / height - 1.0;
            for x in 0..face.width {
                let s = 2.0 * (x as f32 + 0.5) / width - 1.0;
                let denom = 1.0 + s * s + t * t;
                let solid_angle = 4.0 / (width * height * denom * denom.sqrt());
                let dir = (forward + right * s + up * t).normalize();
                sh.add_sample(dir, face.pixel(x, y).truncate(), solid_angle);
            }
        }
    }
    sh
}
