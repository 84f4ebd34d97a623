//! Core model data types, CPU side and GPU side.

use crate::gpu::BufferId;

/// One draw range of the shared index buffer, as uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshChunk {
    pub position_buffer: BufferId,
    pub normal_buffer: Option<BufferId>,
    pub uv_buffer: Option<BufferId>,
    /// First index, counted in indices (not bytes).
    pub index_offset: u32,
    /// Zero means the chunk is skipped.
    pub index_count: u32,
    pub material: usize,
    pub has_uvs: bool,
}

impl MeshChunk {
    /// Byte offset of the first index in the 16-bit index buffer, or
    /// `None` when it does not fit a GL offset.
    pub fn index_byte_offset(&self) -> Option<i32> {
        let bytes = self
            .index_offset
            .checked_mul(std::mem::size_of::<u16>() as u32)?;
        i32::try_from(bytes).ok()
    }

    /// `(count, byte_offset)` for an indexed draw.
    pub fn draw_range(&self) -> Option<(i32, i32)> {
        Some((i32::try_from(self.index_count).ok()?, self.index_byte_offset()?))
    }
}

/// Decoded vertex data of one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedChunk {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub index_offset: u32,
    pub index_count: u32,
    pub material: usize,
}

/// Output of a [`super::ModelDecoder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedModel {
    pub chunks: Vec<DecodedChunk>,
    /// Shared 16-bit index buffer; chunks address ranges of it.
    pub indices: Vec<u16>,
    pub material_count: usize,
}

impl DecodedModel {
    /// Largest vertex distance from the local origin.
    pub fn bounding_radius(&self) -> f32 {
        self.chunks
            .iter()
            .flat_map(|c| c.positions.iter())
            .map(|p| glam::Vec3::from_array(*p).length())
            .filter(|r| r.is_finite())
            .fold(0.0, f32::max)
    }
}
