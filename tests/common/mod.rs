//! Shared test fixtures: a recording GPU context and shader provider.
//!
//! The context implements the `gfx` contracts by assigning synthetic
//! handles and logging every state change and draw. Each draw snapshots
//! the uniforms last written to the issuing program, so tests can assert
//! on the exact values a pass uploaded.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};

use candela::{
    BlendMode, BoundingBox, BuiltinMeshes, CullMode, DepthFunc, FloatImage, GpuContext, GpuMesh,
    Material, Node, Prefab, PrefabInstance, Result, ShaderProgram, ShaderProvider, TargetDesc,
    TargetId, TextureFilter, TextureId, Winding,
};

pub const WHITE_TEXTURE: TextureId = TextureId(1);
pub const BLACK_TEXTURE: TextureId = TextureId(2);

// ============================================================================
// Uniform log shared between programs and the context
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    F32(f32),
    I32(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Texture(TextureId, u32),
    Vec3Array(Vec<Vec3>),
    F32Array(Vec<f32>),
    I32Array(Vec<i32>),
}

impl UniformValue {
    pub fn as_vec3(&self) -> Vec3 {
        match self {
            Self::Vec3(v) => *v,
            other => panic!("expected vec3 uniform, got {other:?}"),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Self::I32(v) => *v,
            other => panic!("expected i32 uniform, got {other:?}"),
        }
    }

    pub fn as_f32(&self) -> f32 {
        match self {
            Self::F32(v) => *v,
            other => panic!("expected f32 uniform, got {other:?}"),
        }
    }

    pub fn as_mat4(&self) -> Mat4 {
        match self {
            Self::Mat4(v) => *v,
            other => panic!("expected mat4 uniform, got {other:?}"),
        }
    }

    pub fn as_texture(&self) -> (TextureId, u32) {
        match self {
            Self::Texture(id, slot) => (*id, *slot),
            other => panic!("expected texture uniform, got {other:?}"),
        }
    }
}

#[derive(Default)]
struct SharedLog {
    /// Program that most recently had a uniform written.
    last_program: Option<String>,
    /// Current uniform values per program.
    uniforms: HashMap<String, HashMap<String, UniformValue>>,
}

// ============================================================================
// Recording shader program / provider
// ============================================================================

pub struct RecordingProgram {
    name: String,
    log: Rc<RefCell<SharedLog>>,
}

impl RecordingProgram {
    fn record(&self, uniform: &str, value: UniformValue) {
        let mut log = self.log.borrow_mut();
        log.last_program = Some(self.name.clone());
        log.uniforms
            .entry(self.name.clone())
            .or_default()
            .insert(uniform.to_string(), value);
    }
}

impl ShaderProgram for RecordingProgram {
    fn set_f32(&self, name: &str, value: f32) {
        self.record(name, UniformValue::F32(value));
    }
    fn set_i32(&self, name: &str, value: i32) {
        self.record(name, UniformValue::I32(value));
    }
    fn set_vec2(&self, name: &str, value: Vec2) {
        self.record(name, UniformValue::Vec2(value));
    }
    fn set_vec3(&self, name: &str, value: Vec3) {
        self.record(name, UniformValue::Vec3(value));
    }
    fn set_vec4(&self, name: &str, value: Vec4) {
        self.record(name, UniformValue::Vec4(value));
    }
    fn set_mat4(&self, name: &str, value: &Mat4) {
        self.record(name, UniformValue::Mat4(*value));
    }
    fn set_texture(&self, name: &str, texture: TextureId, slot: u32) {
        self.record(name, UniformValue::Texture(texture, slot));
    }
    fn set_vec3_array(&self, name: &str, values: &[Vec3]) {
        self.record(name, UniformValue::Vec3Array(values.to_vec()));
    }
    fn set_f32_array(&self, name: &str, values: &[f32]) {
        self.record(name, UniformValue::F32Array(values.to_vec()));
    }
    fn set_i32_array(&self, name: &str, values: &[i32]) {
        self.record(name, UniformValue::I32Array(values.to_vec()));
    }
}

/// Hands out a recording program for every role, except names explicitly
/// marked missing.
pub struct RecordingShaderProvider {
    log: Rc<RefCell<SharedLog>>,
    missing: HashSet<String>,
}

impl RecordingShaderProvider {
    pub fn mark_missing(&mut self, name: &str) {
        self.missing.insert(name.to_string());
    }
}

impl ShaderProvider for RecordingShaderProvider {
    fn get(&self, name: &str) -> Option<Arc<dyn ShaderProgram>> {
        if self.missing.contains(name) {
            return None;
        }
        Some(Arc::new(RecordingProgram {
            name: name.to_string(),
            log: Rc::clone(&self.log),
        }))
    }
}

// ============================================================================
// Recording GPU context
// ============================================================================

/// One recorded draw with the GPU state and uniforms in effect.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub target: Option<TargetId>,
    pub program: String,
    pub mesh_vertices: u32,
    pub blend: BlendMode,
    pub depth_test: bool,
    pub depth_func: DepthFunc,
    pub depth_write: bool,
    pub color_write: bool,
    pub cull: CullMode,
    pub front_face: Winding,
    pub uniforms: HashMap<String, UniformValue>,
}

impl DrawRecord {
    pub fn uniform(&self, name: &str) -> &UniformValue {
        self.uniforms
            .get(name)
            .unwrap_or_else(|| panic!("draw by '{}' has no uniform '{name}'", self.program))
    }
}

#[derive(Debug, Clone)]
pub struct BlitRecord {
    pub target: Option<TargetId>,
    pub texture: TextureId,
    pub program: Option<String>,
    pub viewport: Option<(i32, i32, u32, u32)>,
}

#[derive(Debug, Clone)]
pub struct ClearRecord {
    pub target: Option<TargetId>,
    pub color: Option<Vec4>,
    pub depth: bool,
}

struct TargetState {
    desc: TargetDesc,
    alive: bool,
}

pub struct RecordingContext {
    log: Rc<RefCell<SharedLog>>,
    next_id: u64,
    targets: HashMap<u64, TargetState>,
    bound: Option<TargetId>,
    viewport: Option<(i32, i32, u32, u32)>,
    blend: BlendMode,
    depth_test: bool,
    depth_func: DepthFunc,
    depth_write: bool,
    pub color_write: bool,
    cull: CullMode,
    front_face: Winding,
    /// Color returned by every `read_back`, settable per test.
    pub read_back_color: Vec4,
    pub draws: Vec<DrawRecord>,
    pub blits: Vec<BlitRecord>,
    pub clears: Vec<ClearRecord>,
    pub created_targets: Vec<(TargetId, TargetDesc)>,
    pub destroyed_targets: Vec<TargetId>,
    pub float_textures: HashMap<u64, (u32, u32, Vec<Vec3>, TextureFilter)>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(SharedLog::default())),
            next_id: 10,
            targets: HashMap::new(),
            bound: None,
            viewport: None,
            blend: BlendMode::Disabled,
            depth_test: true,
            depth_func: DepthFunc::Less,
            depth_write: true,
            color_write: true,
            cull: CullMode::Back,
            front_face: Winding::CounterClockwise,
            read_back_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            draws: Vec::new(),
            blits: Vec::new(),
            clears: Vec::new(),
            created_targets: Vec::new(),
            destroyed_targets: Vec::new(),
            float_textures: HashMap::new(),
        }
    }

    /// A provider recording into the same uniform log as this context.
    pub fn shader_provider(&self) -> RecordingShaderProvider {
        RecordingShaderProvider {
            log: Rc::clone(&self.log),
            missing: HashSet::new(),
        }
    }

    pub fn live_target_count(&self) -> usize {
        self.targets.values().filter(|t| t.alive).count()
    }

    pub fn target_desc(&self, target: TargetId) -> &TargetDesc {
        &self.targets[&target.0].desc
    }

    pub fn draws_by(&self, program: &str) -> Vec<&DrawRecord> {
        self.draws.iter().filter(|d| d.program == program).collect()
    }

    pub fn draws_to(&self, target: TargetId) -> Vec<&DrawRecord> {
        self.draws
            .iter()
            .filter(|d| d.target == Some(target))
            .collect()
    }

    pub fn reset_recording(&mut self) {
        self.draws.clear();
        self.blits.clear();
        self.clears.clear();
        self.created_targets.clear();
        self.destroyed_targets.clear();
    }
}

impl GpuContext for RecordingContext {
    fn create_target(&mut self, desc: &TargetDesc) -> Result<TargetId> {
        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.targets.insert(
            id.0,
            TargetState {
                desc: *desc,
                alive: true,
            },
        );
        self.created_targets.push((id, *desc));
        Ok(id)
    }

    fn destroy_target(&mut self, target: TargetId) {
        if let Some(state) = self.targets.get_mut(&target.0) {
            state.alive = false;
        }
        self.destroyed_targets.push(target);
    }

    fn resize_target(&mut self, target: TargetId, width: u32, height: u32) {
        if let Some(state) = self.targets.get_mut(&target.0) {
            state.desc.width = width;
            state.desc.height = height;
        }
    }

    fn color_texture(&self, target: TargetId, index: u32) -> Option<TextureId> {
        let state = self.targets.get(&target.0)?;
        (state.alive && index < state.desc.color_attachments)
            .then(|| TextureId(target.0 * 100 + 10 + u64::from(index)))
    }

    fn depth_texture(&self, target: TargetId) -> Option<TextureId> {
        let state = self.targets.get(&target.0)?;
        (state.alive && state.desc.depth).then(|| TextureId(target.0 * 100 + 9))
    }

    fn bind_target(&mut self, target: TargetId) {
        self.bound = Some(target);
    }

    fn unbind_target(&mut self) {
        self.bound = None;
    }

    fn read_back(&mut self, target: TargetId) -> Result<FloatImage> {
        let desc = self.targets[&target.0].desc;
        Ok(FloatImage::filled(
            desc.width,
            desc.height,
            self.read_back_color,
        ))
    }

    fn create_float_texture(
        &mut self,
        width: u32,
        height: u32,
        texels: &[Vec3],
        filter: TextureFilter,
    ) -> Result<TextureId> {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.float_textures
            .insert(id.0, (width, height, texels.to_vec(), filter));
        Ok(id)
    }

    fn update_float_texture(
        &mut self,
        texture: TextureId,
        width: u32,
        height: u32,
        texels: &[Vec3],
    ) -> Result<()> {
        if let Some(entry) = self.float_textures.get_mut(&texture.0) {
            entry.0 = width;
            entry.1 = height;
            entry.2 = texels.to_vec();
        }
        Ok(())
    }

    fn white_texture(&self) -> TextureId {
        WHITE_TEXTURE
    }

    fn black_texture(&self) -> TextureId {
        BLACK_TEXTURE
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.depth_func = func;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.color_write = enabled;
    }

    fn set_cull(&mut self, mode: CullMode) {
        self.cull = mode;
    }

    fn set_front_face(&mut self, winding: Winding) {
        self.front_face = winding;
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Some((x, y, width, height));
    }

    fn clear(&mut self, color: Option<Vec4>, depth: bool) {
        self.clears.push(ClearRecord {
            target: self.bound,
            color,
            depth,
        });
    }

    fn draw_mesh(&mut self, mesh: &dyn GpuMesh, _program: &dyn ShaderProgram) {
        let log = self.log.borrow();
        let program = log.last_program.clone().unwrap_or_default();
        let uniforms = log.uniforms.get(&program).cloned().unwrap_or_default();
        drop(log);
        self.draws.push(DrawRecord {
            target: self.bound,
            program,
            mesh_vertices: mesh.vertex_count(),
            blend: self.blend,
            depth_test: self.depth_test,
            depth_func: self.depth_func,
            depth_write: self.depth_write,
            color_write: self.color_write,
            cull: self.cull,
            front_face: self.front_face,
            uniforms,
        });
    }

    fn blit(&mut self, texture: TextureId, program: Option<&dyn ShaderProgram>) {
        let program = program.and_then(|_| self.log.borrow().last_program.clone());
        self.blits.push(BlitRecord {
            target: self.bound,
            texture,
            program,
            viewport: self.viewport,
        });
    }
}

// ============================================================================
// Meshes, materials, scenes
// ============================================================================

/// A mesh stub carrying only bounds and a vertex count.
pub struct MockMesh {
    pub vertices: u32,
    pub bounds: BoundingBox,
}

impl GpuMesh for MockMesh {
    fn vertex_count(&self) -> u32 {
        self.vertices
    }

    fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}

/// Unit-cube mesh centered at the origin.
pub fn unit_mesh(vertices: u32) -> Arc<dyn GpuMesh> {
    Arc::new(MockMesh {
        vertices,
        bounds: BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
    })
}

pub fn builtin_meshes() -> BuiltinMeshes {
    BuiltinMeshes {
        quad: unit_mesh(6),
        sphere: unit_mesh(960),
    }
}

/// A single-node prefab instance carrying `mesh`/`material` at `transform`.
pub fn surface_instance(
    mesh: Arc<dyn GpuMesh>,
    material: Arc<Material>,
    transform: Mat4,
) -> PrefabInstance {
    let root = Node::with_surface("surface", mesh, material);
    PrefabInstance::new(Arc::new(Prefab::new(root)), transform)
}
