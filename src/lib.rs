//! candela: a multi-pass 3D frame renderer.
//!
//! The crate turns a [`Scene`] into a frame through an immediate-state GPU
//! contract ([`gfx::GpuContext`]): render-call collection and sorting,
//! frustum culling, per-light shadow maps, a deferred path (G-buffer,
//! SSAO, screen-space light accumulation, tone-mapped resolve), a forward
//! path with three shading modes, and an irradiance probe field stored as
//! spherical harmonics.
//!
//! The GPU itself, windowing, and asset loading are collaborator
//! responsibilities: callers implement the `gfx` traits and hand the
//! renderer meshes, materials and shader programs by handle.

pub mod errors;
pub mod gfx;
pub mod probes;
pub mod renderer;
pub mod scene;

pub use errors::{RenderError, Result};
pub use gfx::{
    AlphaMode, BlendMode, CullMode, DepthFunc, FloatImage, GpuContext, GpuMesh, Material,
    ShaderProgram, ShaderProvider, TargetDesc, TargetId, TextureFilter, TextureFormat, TextureId,
    Winding,
};
pub use probes::{Probe, ProbeGrid, Sh9};
pub use renderer::{
    BuiltinMeshes, DebugView, RenderCall, RenderPipeline, Renderer, RendererSettings, ShadingMode,
    SsaoSettings, ToneMapper,
};
pub use scene::{
    BoundingBox, Camera, Entity, Frustum, Light, LightKind, Node, Prefab, PrefabInstance, Scene,
    ShadowMap,
};
