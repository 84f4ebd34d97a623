use super::{normalize_format_hint, DecodedModel, MeshChunk, ModelDecoder, ModelLoader};
use crate::error::LoadError;
use crate::gpu::{BufferId, BufferTarget, Gpu};

/// [`ModelLoader`] that picks a decoder by format hint and keeps the
/// decoded mesh in GPU buffers.
#[derive(Default)]
pub struct GpuModel {
    decoders: Vec<Box<dyn ModelDecoder>>,
    chunks: Vec<MeshChunk>,
    /// Every vertex buffer owned by `chunks`.
    vertex_buffers: Vec<BufferId>,
    index_buffer: Option<BufferId>,
    material_count: usize,
    bounding_radius: f32,
}

impl GpuModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(mut self, decoder: impl ModelDecoder + 'static) -> Self {
        self.register(decoder);
        self
    }

    pub fn register(&mut self, decoder: impl ModelDecoder + 'static) {
        self.decoders.push(Box::new(decoder));
    }

    fn decoder_for(&self, format_hint: &str) -> Option<&dyn ModelDecoder> {
        let hint = normalize_format_hint(format_hint);
        self.decoders
            .iter()
            .find(|d| d.extensions().iter().any(|e| *e == hint))
            .map(|d| d.as_ref())
    }

    fn upload(&mut self, gpu: &mut dyn Gpu, model: &DecodedModel) -> Result<(), LoadError> {
        for chunk in &model.chunks {
            let position_buffer =
                upload_buffer(gpu, BufferTarget::Array, bytemuck::cast_slice(&chunk.positions))?;
            self.vertex_buffers.push(position_buffer);

            let normal_buffer = match &chunk.normals {
                Some(normals) => {
                    let buf = upload_buffer(gpu, BufferTarget::Array, bytemuck::cast_slice(normals))?;
                    self.vertex_buffers.push(buf);
                    Some(buf)
                }
                None => None,
            };

            let uv_buffer = match &chunk.uvs {
                Some(uvs) => {
                    let buf = upload_buffer(gpu, BufferTarget::Array, bytemuck::cast_slice(uvs))?;
                    self.vertex_buffers.push(buf);
                    Some(buf)
                }
                None => None,
            };

            self.chunks.push(MeshChunk {
                position_buffer,
                normal_buffer,
                uv_buffer,
                index_offset: chunk.index_offset,
                index_count: chunk.index_count,
                material: chunk.material,
                has_uvs: uv_buffer.is_some(),
            });
        }

        self.index_buffer = Some(upload_buffer(
            gpu,
            BufferTarget::ElementArray,
            bytemuck::cast_slice(&model.indices),
        )?);

        gpu.bind_buffer(BufferTarget::Array, None);
        gpu.bind_buffer(BufferTarget::ElementArray, None);
        Ok(())
    }
}

fn upload_buffer(gpu: &mut dyn Gpu, target: BufferTarget, data: &[u8]) -> Result<BufferId, LoadError> {
    let buffer = gpu
        .create_buffer()
        .ok_or_else(|| LoadError::Gpu("could not create buffer".into()))?;
    gpu.buffer_data(target, buffer, data);
    Ok(buffer)
}

/// Rejects chunks that would make the GPU read out of bounds.
fn validate(model: &DecodedModel) -> Result<(), LoadError> {
    for (i, chunk) in model.chunks.iter().enumerate() {
        let vertices = chunk.positions.len();
        if chunk.normals.as_ref().is_some_and(|n| n.len() != vertices) {
            return Err(LoadError::Decode(format!("chunk {i}: normal count mismatch")));
        }
        if chunk.uvs.as_ref().is_some_and(|uv| uv.len() != vertices) {
            return Err(LoadError::Decode(format!("chunk {i}: uv count mismatch")));
        }

        let start = chunk.index_offset as usize;
        let end = start + chunk.index_count as usize;
        let Some(range) = model.indices.get(start..end) else {
            return Err(LoadError::Decode(format!(
                "chunk {i}: index range {start}..{end} exceeds {} indices",
                model.indices.len()
            )));
        };
        if range.iter().any(|&idx| idx as usize >= vertices) {
            return Err(LoadError::Decode(format!(
                "chunk {i}: index out of range for {vertices} vertices"
            )));
        }
    }
    Ok(())
}

impl ModelLoader for GpuModel {
    fn supports(&self, format_hint: &str) -> bool {
        self.decoder_for(format_hint).is_some()
    }

    fn load(&mut self, gpu: &mut dyn Gpu, bytes: &[u8], format_hint: &str) -> Result<(), LoadError> {
        let decoder = self
            .decoder_for(format_hint)
            .ok_or_else(|| LoadError::UnsupportedFormat(format_hint.to_owned()))?;
        let model = decoder.decode(bytes)?;
        validate(&model)?;

        self.clear(gpu);
        if let Err(err) = self.upload(gpu, &model) {
            self.clear(gpu);
            return Err(err);
        }
        self.material_count = model.material_count;
        self.bounding_radius = model.bounding_radius();

        log::debug!(
            "Uploaded {} chunks, {} indices, {} materials",
            self.chunks.len(),
            model.indices.len(),
            self.material_count
        );
        Ok(())
    }

    fn clear(&mut self, gpu: &mut dyn Gpu) {
        for buffer in self.vertex_buffers.drain(..) {
            gpu.delete_buffer(buffer);
        }
        if let Some(buffer) = self.index_buffer.take() {
            gpu.delete_buffer(buffer);
        }
        self.chunks.clear();
        self.material_count = 0;
        self.bounding_radius = 0.0;
    }

    fn is_loaded(&self) -> bool {
        self.index_buffer.is_some()
    }

    fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    fn material_count(&self) -> usize {
        self.material_count
    }

    fn chunks(&self) -> &[MeshChunk] {
        &self.chunks
    }

    fn index_buffer(&self) -> Option<BufferId> {
        self.index_buffer
    }
}
