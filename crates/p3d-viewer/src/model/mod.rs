//! Model data as seen by the renderer.
//!
//! This module provides:
//! - The [`ModelLoader`] contract the frame renderer reads chunks through.
//! - [`GpuModel`], a loader that uploads decoded meshes to GPU buffers.
//! - The [`ModelDecoder`] contract for format-specific decoders.

pub mod gpu_model;
pub mod types;

pub use self::gpu_model::GpuModel;
pub use self::types::{DecodedChunk, DecodedModel, MeshChunk};

use crate::error::LoadError;
use crate::gpu::{BufferId, Gpu};

/// Scene data consumed by the viewer core.
pub trait ModelLoader {
    /// Whether `format_hint` (usually a file extension) can be loaded.
    fn supports(&self, format_hint: &str) -> bool;

    /// Replaces the current model. On failure no model is loaded.
    fn load(&mut self, gpu: &mut dyn Gpu, bytes: &[u8], format_hint: &str)
        -> Result<(), LoadError>;

    /// Releases every GPU resource of the current model. Idempotent.
    fn clear(&mut self, gpu: &mut dyn Gpu);

    fn is_loaded(&self) -> bool;

    /// Radius of the sphere around the local origin containing the model;
    /// `0` when nothing is loaded.
    fn bounding_radius(&self) -> f32;

    fn material_count(&self) -> usize;

    fn chunks(&self) -> &[MeshChunk];

    /// The index buffer shared by all chunks.
    fn index_buffer(&self) -> Option<BufferId>;
}

/// Turns a model file into CPU-side mesh data.
pub trait ModelDecoder: Send + Sync {
    /// Format hints this decoder handles, lower-case, without a leading dot.
    fn extensions(&self) -> &[&str];

    fn decode(&self, bytes: &[u8]) -> Result<DecodedModel, LoadError>;
}

/// Normalises a format hint: trims, drops a leading dot, lower-cases.
pub fn normalize_format_hint(hint: &str) -> String {
    hint.trim().trim_start_matches('.').to_ascii_lowercase()
}
