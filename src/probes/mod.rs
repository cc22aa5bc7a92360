//! Irradiance probe field.
//!
//! A regular 3D lattice of probes, each storing incident light as an L2
//! spherical harmonics expansion. The renderer bakes the whole field by
//! capturing six cube faces per probe through the forward path; lighting
//! shaders sample the packed coefficient texture.

pub mod sh;

use glam::{UVec3, Vec3};

use crate::errors::{RenderError, Result};
use crate::gfx::{GpuContext, TargetDesc, TargetId, TextureFilter, TextureFormat, TextureId};

pub use sh::{CUBE_FACES, SH_COEFFICIENTS, Sh9};

/// Resolution of each cube-face capture.
pub const PROBE_CAPTURE_SIZE: u32 = 64;

/// Far plane of the probe capture cameras.
pub const PROBE_CAPTURE_FAR: f32 = 1000.0;

/// One probe: its world position, lattice cell and current coefficients.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub position: Vec3,
    pub cell: UVec3,
    pub sh: Sh9,
}

/// The probe lattice spanning an axis-aligned world region.
///
/// Probes are stored x-innermost: linear index `x + y*dx + z*dx*dy`. The
/// packed GPU texture holds one row per probe with nine RGB texels, so
/// shaders address coefficients as `(coefficient, probe_index)` with
/// nearest filtering.
pub struct ProbeGrid {
    start: Vec3,
    end: Vec3,
    dims: UVec3,
    delta: Vec3,
    probes: Vec<Probe>,
    texture: Option<TextureId>,
    capture_target: Option<TargetId>,
}

impl ProbeGrid {
    /// Builds the lattice covering `start..=end` with `dims` probes per
    /// axis. Every dimension must be at least 1; an axis of dimension 1
    /// collapses onto `start`.
    pub fn new(start: Vec3, end: Vec3, dims: UVec3) -> Result<Self> {
        if dims.x == 0 || dims.y == 0 || dims.z == 0 {
            return Err(RenderError::InvalidProbeGrid(dims.x, dims.y, dims.z));
        }
        let span = end - start;
        let delta = Vec3::new(
            if dims.x > 1 { span.x / (dims.x - 1) as f32 } else { 0.0 },
            if dims.y > 1 { span.y / (dims.y - 1) as f32 } else { 0.0 },
            if dims.z > 1 { span.z / (dims.z - 1) as f32 } else { 0.0 },
        );

        let mut probes = Vec::with_capacity((dims.x * dims.y * dims.z) as usize);
        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let cell = UVec3::new(x, y, z);
                    probes.push(Probe {
                        position: start + delta * cell.as_vec3(),
                        cell,
                        sh: Sh9::default(),
                    });
                }
            }
        }

        Ok(Self {
            start,
            end,
            dims,
            delta,
            probes,
            texture: None,
            capture_target: None,
        })
    }

    #[inline]
    #[must_use]
    pub fn start(&self) -> Vec3 {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> Vec3 {
        self.end
    }

    #[inline]
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Spacing between adjacent probes per axis; zero on collapsed axes.
    #[inline]
    #[must_use]
    pub fn delta(&self) -> Vec3 {
        self.delta
    }

    #[inline]
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Linear storage index of cell `(x, y, z)`.
    #[inline]
    #[must_use]
    pub fn linear_index(&self, x: u32, y: u32, z: u32) -> usize {
        (x + y * self.dims.x + z * self.dims.x * self.dims.y) as usize
    }

    #[must_use]
    pub fn probe(&self, index: usize) -> &Probe {
        &self.probes[index]
    }

    #[must_use]
    pub fn probe_at(&self, x: u32, y: u32, z: u32) -> &Probe {
        &self.probes[self.linear_index(x, y, z)]
    }

    #[must_use]
    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// The packed coefficient texture, once a bake has uploaded one.
    #[inline]
    #[must_use]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub(crate) fn set_probe_sh(&mut self, index: usize, sh: Sh9) {
        self.probes[index].sh = sh;
    }

    /// Lazily creates the shared capture target used for face renders.
    pub(crate) fn ensure_capture_target(&mut self, ctx: &mut dyn GpuContext) -> Result<TargetId> {
        if let Some(target) = self.capture_target {
            return Ok(target);
        }
        let desc = TargetDesc {
            label: "probe capture",
            width: PROBE_CAPTURE_SIZE,
            height: PROBE_CAPTURE_SIZE,
            color_attachments: 1,
            format: TextureFormat::Rgba32F,
            depth: true,
        };
        let target = ctx.create_target(&desc)?;
        self.capture_target = Some(target);
        Ok(target)
    }

    /// Coefficients flattened for upload: nine texels per probe, probes in
    /// storage order.
    #[must_use]
    pub fn pack_texels(&self) -> Vec<Vec3> {
        let mut texels = Vec::with_capacity(self.probes.len() * SH_COEFFICIENTS);
        for probe in &self.probes {
            texels.extend_from_slice(&probe.sh.coeffs);
        }
        texels
    }

    /// Uploads the packed coefficients, creating the texture on first use.
    /// The texture is `SH_COEFFICIENTS` wide and one row per probe, with
    /// nearest filtering.
    pub fn upload(&mut self, ctx: &mut dyn GpuContext) -> Result<()> {
        let texels = self.pack_texels();
        let width = SH_COEFFICIENTS as u32;
        let height = self.probes.len() as u32;
        match self.texture {
            Some(texture) => ctx.update_float_texture(texture, width, height, &texels),
            None => {
                self.texture =
                    Some(ctx.create_float_texture(width, height, &texels, TextureFilter::Nearest)?);
                Ok(())
            }
        }
    }

    /// Frees GPU resources owned by the grid. Idempotent.
    pub fn release(&mut self, ctx: &mut dyn GpuContext) {
        if let Some(target) = self.capture_target.take() {
            ctx.destroy_target(target);
        }
        self.texture = None;
    }

    /// CPU-side irradiance query: trilinearly interpolates the eight
    /// surrounding probes' coefficients and convolves with the normal.
    /// Positions outside the lattice clamp to its boundary. Mirrors what
    /// the lighting shader computes; used by visualization tooling.
    #[must_use]
    pub fn sample_irradiance(&self, position: Vec3, normal: Vec3) -> Vec3 {
        let local = (position - self.start) / self.delta_or_one();
        let clamped = local.clamp(Vec3::ZERO, (self.dims - UVec3::ONE).as_vec3());
        let base = clamped.floor();
        let frac = clamped - base;
        let base = base.as_uvec3();

        let mut sh = Sh9::default();
        for corner in 0..8_u32 {
            let offset = UVec3::new(corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
            let cell = (base + offset).min(self.dims - UVec3::ONE);
            let weight = |f: f32, bit: u32| if bit == 1 { f } else { 1.0 - f };
            let w = weight(frac.x, offset.x) * weight(frac.y, offset.y) * weight(frac.z, offset.z);
            if w <= 0.0 {
                continue;
            }
            let probe = self.probe_at(cell.x, cell.y, cell.z);
            for (dst, src) in sh.coeffs.iter_mut().zip(probe.sh.coeffs) {
                *dst += src * w;
            }
        }
        sh.irradiance(normal)
    }

    fn delta_or_one(&self) -> Vec3 {
        Vec3::new(
            if self.delta.x != 0.0 { self.delta.x } else { 1.0 },
            if self.delta.y != 0.0 { self.delta.y } else { 1.0 },
            if self.delta.z != 0.0 { self.delta.z } else { 1.0 },
        )
    }
}
