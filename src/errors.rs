//! Error types for the rendering pipeline.

use thiserror::Error;

/// Errors surfaced by renderer setup and resource management.
///
/// Per-frame recoverable conditions (missing shader, incomplete node,
/// invisible entity) are handled by skipping the unit of work and logging,
/// not by returning an error. `RenderError` is reserved for failures that
/// leave the renderer without a resource it needs.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The GPU context refused to create a render target.
    #[error("failed to create render target '{label}': {reason}")]
    TargetCreation { label: String, reason: String },

    /// The GPU context refused to create or update a texture.
    #[error("texture upload failed: {0}")]
    TextureUpload(String),

    /// Reading a render target back to the CPU failed.
    #[error("render target read-back failed: {0}")]
    ReadBack(String),

    /// A render target was created without the attachment we asked for.
    #[error("render target '{label}' is missing its {attachment} attachment")]
    MissingAttachment {
        label: String,
        attachment: &'static str,
    },

    /// Probe grid dimensions must be at least 1 on every axis.
    #[error("invalid probe grid dimensions {0}x{1}x{2}")]
    InvalidProbeGrid(u32, u32, u32),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
