#![allow(dead_code)]

use p3d_viewer::error::LoadError;
use p3d_viewer::gpu::recording::RecordingGpu;
use p3d_viewer::gpu::{BufferId, Gpu, TextureId};
use p3d_viewer::material::TextureCallback;
use p3d_viewer::model::{DecodedModel, GpuModel, MeshChunk, ModelDecoder, ModelLoader};
use p3d_viewer::platform::{builtin_asset, PlatformAdapter};
use p3d_viewer::{Viewer, ViewerConfig};
use std::collections::HashMap;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory platform. Texture loads complete on the next `poll` with a
/// 1x1 texture; every upload and release is recorded.
#[derive(Default)]
pub struct MockPlatform {
    pub assets: HashMap<String, String>,
    pub requested: Vec<String>,
    pub created: Vec<TextureId>,
    pub deleted: Vec<TextureId>,
    pending: Vec<TextureCallback>,
}

impl MockPlatform {
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl PlatformAdapter for MockPlatform {
    fn load_asset(&mut self, path: &str) -> Option<Vec<u8>> {
        match self.assets.get(path) {
            Some(src) => Some(src.as_bytes().to_vec()),
            None => builtin_asset(path).map(|src| src.as_bytes().to_vec()),
        }
    }

    fn load_texture(&mut self, url: &str, on_loaded: TextureCallback) {
        self.requested.push(url.to_owned());
        self.pending.push(on_loaded);
    }

    fn delete_texture(&mut self, gpu: &mut dyn Gpu, texture: TextureId) {
        self.deleted.push(texture);
        gpu.delete_texture(texture);
    }

    fn cancel_texture_loads(&mut self) {
        self.pending.clear();
    }

    fn poll(&mut self, gpu: &mut dyn Gpu) {
        for on_loaded in std::mem::take(&mut self.pending) {
            let texture = gpu.create_texture_rgba8(1, 1, &[255; 4]);
            self.created.extend(texture);
            if let Some(release) = on_loaded(texture) {
                self.delete_texture(gpu, release);
            }
        }
    }
}

/// Loader serving fixed chunks with made-up buffer handles.
pub struct StubModel {
    pub chunks: Vec<MeshChunk>,
    pub radius: f32,
    pub material_count: usize,
    loaded: bool,
}

impl StubModel {
    pub fn new(chunks: Vec<MeshChunk>, radius: f32, material_count: usize) -> Self {
        Self {
            chunks,
            radius,
            material_count,
            loaded: false,
        }
    }
}

impl ModelLoader for StubModel {
    fn supports(&self, format_hint: &str) -> bool {
        format_hint == "p3d"
    }

    fn load(&mut self, _gpu: &mut dyn Gpu, _bytes: &[u8], _hint: &str) -> Result<(), LoadError> {
        self.loaded = true;
        Ok(())
    }

    fn clear(&mut self, _gpu: &mut dyn Gpu) {
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn bounding_radius(&self) -> f32 {
        if self.loaded {
            self.radius
        } else {
            0.0
        }
    }

    fn material_count(&self) -> usize {
        if self.loaded {
            self.material_count
        } else {
            0
        }
    }

    fn chunks(&self) -> &[MeshChunk] {
        if self.loaded {
            &self.chunks
        } else {
            &[]
        }
    }

    fn index_buffer(&self) -> Option<BufferId> {
        self.loaded.then(|| BufferId::new(1000)).flatten()
    }
}

pub fn stub_chunk(index_offset: u32, index_count: u32, material: usize, has_uvs: bool) -> MeshChunk {
    MeshChunk {
        position_buffer: BufferId::new(900).unwrap(),
        normal_buffer: BufferId::new(901),
        uv_buffer: if has_uvs { BufferId::new(902) } else { None },
        index_offset,
        index_count,
        material,
        has_uvs,
    }
}

/// Decoder returning the same model for any non-empty input.
pub struct StaticDecoder(pub DecodedModel);

impl ModelDecoder for StaticDecoder {
    fn extensions(&self) -> &[&str] {
        &["p3d"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedModel, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::Decode("empty input".into()));
        }
        Ok(self.0.clone())
    }
}

pub fn viewer_with<M: ModelLoader + 'static>(model: M) -> Viewer<RecordingGpu, MockPlatform> {
    init_logging();
    let mut viewer = Viewer::with_config(
        RecordingGpu::new(),
        MockPlatform::default(),
        model,
        ViewerConfig::default(),
    );
    viewer.on_surface_created();
    viewer.on_surface_changed(800, 600);
    viewer
}

pub fn gpu_model(model: DecodedModel) -> GpuModel {
    GpuModel::new().with_decoder(StaticDecoder(model))
}
