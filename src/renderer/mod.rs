//! The frame renderer.
//!
//! [`Renderer`] owns the screen-sized targets, the SSAO kernel, the
//! per-frame call lists and the optional probe field, and drives the
//! passes in order each frame:
//!
//! 1. collect and sort render calls, gather visible lights;
//! 2. synchronize and render shadow maps;
//! 3. deferred: G-buffer, SSAO, light accumulation, tone-mapped resolve;
//!    or forward: shaded draws straight to the screen;
//! 4. debug overlays, when enabled.

pub mod collect;
pub mod passes;
pub mod settings;

use std::sync::Arc;

use glam::Vec3;

use crate::errors::Result;
use crate::gfx::{FloatImage, GpuContext, GpuMesh, ShaderProvider, TargetDesc, TargetId, TextureFormat};
use crate::probes::{CUBE_FACES, PROBE_CAPTURE_FAR, ProbeGrid, sh};
use crate::scene::{Camera, Scene};

pub use collect::RenderCall;
pub use settings::{
    DebugView, RenderPipeline, RendererSettings, ShadingMode, SsaoSettings, ToneMapper,
};

use passes::PassContext;

/// Meshes the renderer draws that are not part of any scene: the
/// fullscreen quad and the unit sphere used as a light volume.
pub struct BuiltinMeshes {
    pub quad: Arc<dyn GpuMesh>,
    pub sphere: Arc<dyn GpuMesh>,
}

pub struct Renderer {
    pub settings: RendererSettings,
    width: u32,
    height: u32,
    gbuffer: TargetId,
    illumination: TargetId,
    ssao_primary: TargetId,
    ssao_scratch: TargetId,
    ssao_kernel: Vec<Vec3>,
    quad: Arc<dyn GpuMesh>,
    sphere: Arc<dyn GpuMesh>,
    render_calls: Vec<RenderCall>,
    frame_lights: Vec<usize>,
    probe_grid: Option<ProbeGrid>,
}

impl Renderer {
    /// Creates the renderer and its screen-sized targets.
    pub fn new(
        ctx: &mut dyn GpuContext,
        width: u32,
        height: u32,
        meshes: BuiltinMeshes,
    ) -> Result<Self> {
        let gbuffer = ctx.create_target(&TargetDesc {
            label: "gbuffer",
            width,
            height,
            color_attachments: 3,
            format: TextureFormat::Rgba8,
            depth: true,
        })?;
        let illumination = ctx.create_target(&TargetDesc {
            label: "illumination",
            width,
            height,
            color_attachments: 1,
            format: TextureFormat::Rgba16F,
            depth: true,
        })?;
        let ssao_primary = ctx.create_target(&TargetDesc::color_only(
            "ssao",
            width,
            height,
            TextureFormat::Rgba8,
        ))?;
        let ssao_scratch = ctx.create_target(&TargetDesc::color_only(
            "ssao blur",
            width,
            height,
            TextureFormat::Rgba8,
        ))?;

        Ok(Self {
            settings: RendererSettings::default(),
            width,
            height,
            gbuffer,
            illumination,
            ssao_primary,
            ssao_scratch,
            ssao_kernel: passes::ssao::generate_hemisphere_kernel(passes::ssao::SSAO_KERNEL_SIZE),
            quad: meshes.quad,
            sphere: meshes.sphere,
            render_calls: Vec::new(),
            frame_lights: Vec::new(),
            probe_grid: None,
        })
    }

    /// Reallocates all screen-sized targets.
    pub fn resize(&mut self, ctx: &mut dyn GpuContext, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        for target in [
            self.gbuffer,
            self.illumination,
            self.ssao_primary,
            self.ssao_scratch,
        ] {
            ctx.resize_target(target, width, height);
        }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn gbuffer_target(&self) -> TargetId {
        self.gbuffer
    }

    #[inline]
    #[must_use]
    pub fn illumination_target(&self) -> TargetId {
        self.illumination
    }

    /// The SSAO target lighting reads this frame.
    #[inline]
    #[must_use]
    pub fn ssao_target(&self) -> TargetId {
        self.ssao_primary
    }

    /// Render calls collected for the most recent frame, in draw order.
    #[must_use]
    pub fn render_calls(&self) -> &[RenderCall] {
        &self.render_calls
    }

    /// Entity indices of the lights gathered for the most recent frame.
    #[must_use]
    pub fn frame_lights(&self) -> &[usize] {
        &self.frame_lights
    }

    #[must_use]
    pub fn probe_grid(&self) -> Option<&ProbeGrid> {
        self.probe_grid.as_ref()
    }

    /// Installs a probe grid. Call [`bake_probes`](Self::bake_probes) to
    /// fill it; until then lighting ignores it.
    pub fn set_probe_grid(&mut self, grid: ProbeGrid) {
        self.probe_grid = Some(grid);
    }

    /// Removes the probe grid, freeing its GPU resources.
    pub fn clear_probe_grid(&mut self, ctx: &mut dyn GpuContext) {
        if let Some(mut grid) = self.probe_grid.take() {
            grid.release(ctx);
        }
    }

    // ========================================================================
    // Frame rendering
    // ========================================================================

    /// Renders one frame of `scene` from `camera` to the screen.
    ///
    /// The scene is mutable because shadow resources live on the lights
    /// and are synchronized here.
    pub fn render_scene(
        &mut self,
        ctx: &mut dyn GpuContext,
        shaders: &dyn ShaderProvider,
        scene: &mut Scene,
        camera: &Camera,
    ) -> Result<()> {
        let mut calls = std::mem::take(&mut self.render_calls);
        let mut lights = std::mem::take(&mut self.frame_lights);
        collect::collect_scene(scene, camera, &mut calls, &mut lights);
        collect::sort_render_calls(&mut calls);

        for &index in &lights {
            let Some(light) = scene.light_mut(index) else {
                continue;
            };
            passes::shadow::generate_shadow_map(ctx, shaders, light, &calls)?;
        }

        let pass = PassContext {
            shaders,
            scene,
            camera,
            settings: &self.settings,
            width: self.width,
            height: self.height,
        };

        match self.settings.pipeline {
            RenderPipeline::Deferred => {
                passes::gbuffer::render(ctx, &pass, self.gbuffer, &calls);

                let mut ssao_texture = None;
                if self.settings.ssao.enabled {
                    let (primary, scratch) = passes::ssao::render(
                        ctx,
                        &pass,
                        self.ssao_primary,
                        self.ssao_scratch,
                        self.gbuffer,
                        &self.ssao_kernel,
                        self.quad.as_ref(),
                    );
                    self.ssao_primary = primary;
                    self.ssao_scratch = scratch;
                    ssao_texture = ctx.color_texture(self.ssao_primary, 0);
                }

                passes::deferred::render(
                    ctx,
                    &pass,
                    self.illumination,
                    self.gbuffer,
                    ssao_texture,
                    self.probe_grid.as_ref(),
                    &lights,
                    self.sphere.as_ref(),
                    self.quad.as_ref(),
                );
                passes::composite::resolve(ctx, &pass, self.illumination);

                let debug_view = self.settings.debug_view;
                if debug_view.contains(DebugView::GBUFFERS) {
                    passes::composite::show_gbuffers(ctx, &pass, self.gbuffer);
                }
                if debug_view.contains(DebugView::SSAO) {
                    if let Some(texture) = ssao_texture {
                        passes::composite::show_ssao(ctx, texture);
                    }
                }
                if debug_view.contains(DebugView::SHADOW_MAPS) {
                    passes::composite::show_shadow_maps(ctx, &pass, &lights);
                }
                if debug_view.contains(DebugView::PROBES) {
                    if let Some(grid) = self.probe_grid.as_ref() {
                        passes::composite::show_probes(ctx, &pass, grid, self.sphere.as_ref());
                    }
                }
            }
            RenderPipeline::Forward => {
                ctx.clear(Some(scene.background_color.extend(1.0)), true);
                passes::forward::render(ctx, &pass, &lights, &calls);
                if self.settings.debug_view.contains(DebugView::SHADOW_MAPS) {
                    passes::composite::show_shadow_maps(ctx, &pass, &lights);
                }
                if self.settings.debug_view.contains(DebugView::PROBES) {
                    if let Some(grid) = self.probe_grid.as_ref() {
                        passes::composite::show_probes(ctx, &pass, grid, self.sphere.as_ref());
                    }
                }
            }
        }

        self.render_calls = calls;
        self.frame_lights = lights;
        Ok(())
    }

    // ========================================================================
    // Probe baking
    // ========================================================================

    /// Regenerates the whole probe field: captures six cube faces per
    /// probe through the forward path, projects each capture to spherical
    /// harmonics and uploads the packed coefficient texture. No-op without
    /// a grid installed.
    pub fn bake_probes(
        &mut self,
        ctx: &mut dyn GpuContext,
        shaders: &dyn ShaderProvider,
        scene: &Scene,
    ) -> Result<()> {
        let Some(mut grid) = self.probe_grid.take() else {
            return Ok(());
        };
        let result = self.bake_into_grid(ctx, shaders, scene, &mut grid);
        self.probe_grid = Some(grid);
        result
    }

    fn bake_into_grid(
        &mut self,
        ctx: &mut dyn GpuContext,
        shaders: &dyn ShaderProvider,
        scene: &Scene,
        grid: &mut ProbeGrid,
    ) -> Result<()> {
        let target = grid.ensure_capture_target(ctx)?;

        // Captures always run lit, whatever the on-screen shading mode is.
        let mut capture_settings = self.settings;
        capture_settings.shading = ShadingMode::MultiPass;
        capture_settings.debug_view = DebugView::empty();

        let mut faces: Vec<FloatImage> = Vec::with_capacity(CUBE_FACES.len());
        for index in 0..grid.probe_count() {
            let position = grid.probe(index).position;
            faces.clear();
            for (forward, up) in CUBE_FACES {
                let mut camera = Camera::new_perspective(90.0, 1.0, 0.1, PROBE_CAPTURE_FAR);
                camera.look_at(position, position + forward, up);
                faces.push(self.capture_face(
                    ctx,
                    shaders,
                    scene,
                    &camera,
                    &capture_settings,
                    target,
                )?);
            }
            grid.set_probe_sh(index, sh::project_cube_faces(&faces));
        }

        grid.upload(ctx)?;
        log::info!("baked {} irradiance probes", grid.probe_count());
        Ok(())
    }

    /// Forward-renders one capture view into `target` and reads it back.
    fn capture_face(
        &mut self,
        ctx: &mut dyn GpuContext,
        shaders: &dyn ShaderProvider,
        scene: &Scene,
        camera: &Camera,
        capture_settings: &RendererSettings,
        target: TargetId,
    ) -> Result<FloatImage> {
        let mut calls = std::mem::take(&mut self.render_calls);
        let mut lights = std::mem::take(&mut self.frame_lights);
        collect::collect_scene(scene, camera, &mut calls, &mut lights);
        collect::sort_render_calls(&mut calls);

        let pass = PassContext {
            shaders,
            scene,
            camera,
            settings: capture_settings,
            width: crate::probes::PROBE_CAPTURE_SIZE,
            height: crate::probes::PROBE_CAPTURE_SIZE,
        };

        ctx.bind_target(target);
        ctx.clear(Some(scene.background_color.extend(1.0)), true);
        passes::forward::render(ctx, &pass, &lights, &calls);
        ctx.unbind_target();

        self.render_calls = calls;
        self.frame_lights = lights;
        ctx.read_back(target)
    }
}
