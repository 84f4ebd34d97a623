//! The frame renderer. Owns the shader programs and turns the loaded model,
//! its materials and the camera into GL draw calls.

pub mod frame;
pub mod lights;
pub mod programs;

use self::{
    frame::FrameTransforms,
    lights::LightUniforms,
    programs::{ProgramManager, ShaderProgram},
};
use crate::{
    camera::OrbitCamera,
    config::ViewerConfig,
    gpu::{
        BufferTarget, Capability, CompareFunction, Gpu, ProgramId, ATTRIB_NORMAL, ATTRIB_POSITION,
        ATTRIB_UV,
    },
    material::{Material, MaterialStore},
    model::{MeshChunk, ModelLoader},
    platform::PlatformAdapter,
};
use std::ops::{Index, IndexMut};

/// Texture units of the textured variant.
const DIFFUSE_UNIT: u32 = 0;
const SPECULAR_UNIT: u32 = 1;

/// Shininess is stored normalised and uploaded as an exponent.
const SHININESS_SCALE: f32 = 255.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramVariant {
    Basic,
    Textured,
}

impl ProgramVariant {
    pub const ALL: [Self; 2] = [Self::Basic, Self::Textured];

    /// Chunks with UVs are drawn textured.
    pub fn for_chunk(chunk: &MeshChunk) -> Self {
        if chunk.has_uvs {
            Self::Textured
        } else {
            Self::Basic
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Basic => 0,
            Self::Textured => 1,
        }
    }
}

/// One value per [`ProgramVariant`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantTable<T>([T; 2]);

impl<T> Index<ProgramVariant> for VariantTable<T> {
    type Output = T;

    fn index(&self, variant: ProgramVariant) -> &T {
        &self.0[variant.index()]
    }
}

impl<T> IndexMut<ProgramVariant> for VariantTable<T> {
    fn index_mut(&mut self, variant: ProgramVariant) -> &mut T {
        &mut self.0[variant.index()]
    }
}

/// Everything a frame reads besides GPU state.
pub struct Scene<'a> {
    pub model: &'a dyn ModelLoader,
    pub materials: &'a MaterialStore,
    pub camera: &'a OrbitCamera,
    pub width: u32,
    pub height: u32,
}

/// Owns all rendering-related state.
#[derive(Debug, Default)]
pub struct Renderer {
    pub programs: ProgramManager,
    /// Set on the first chunk drawn with a variant in the current frame.
    common_uploaded: VariantTable<bool>,
    context_ready: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the programs for a fresh GPU context. Safe to call again
    /// after a context loss.
    pub fn on_surface_created(
        &mut self,
        gpu: &mut dyn Gpu,
        platform: &mut dyn PlatformAdapter,
        config: &ViewerConfig,
    ) {
        self.programs
            .build(gpu, platform, &config.vertex_shader, &config.fragment_shader);
        self.context_ready = true;
    }

    pub fn release(&mut self, gpu: &mut dyn Gpu) {
        self.programs.release(gpu);
        self.context_ready = false;
    }

    pub fn draw_frame(&mut self, gpu: &mut dyn Gpu, scene: &Scene<'_>, config: &ViewerConfig) {
        let radius = scene.model.bounding_radius();
        if !self.context_ready || !scene.model.is_loaded() || !(radius > 0.0) {
            gpu.clear(config.clear_color);
            return;
        }

        gpu.viewport(0, 0, scene.width as i32, scene.height as i32);
        gpu.clear(config.clear_color);
        gpu.set_capability(Capability::DepthTest, true);
        gpu.depth_func(CompareFunction::LessEqual);
        gpu.depth_mask(true);
        // Both faces are drawn.
        gpu.set_capability(Capability::CullFace, false);
        gpu.set_capability(Capability::ScissorTest, false);

        let frame = FrameTransforms::new(scene.camera, scene.width, scene.height, config);
        let lights = LightUniforms::in_view_space(&frame.normal_matrix);

        self.common_uploaded = VariantTable::default();
        let fallback = Material::default();
        let mut current: Option<ProgramId> = None;

        for chunk in scene.model.chunks() {
            if chunk.index_count == 0 {
                continue;
            }
            let Some((count, byte_offset)) = chunk.draw_range() else {
                log::warn!(
                    "Skipping chunk with index range {}+{} beyond GL limits",
                    chunk.index_offset,
                    chunk.index_count
                );
                continue;
            };
            bind_chunk_buffers(gpu, chunk, scene.model);

            let variant = ProgramVariant::for_chunk(chunk);
            let Some(program) = self.programs.get_mut(variant) else {
                continue;
            };
            if current != Some(program.id()) {
                gpu.use_program(Some(program.id()));
                current = Some(program.id());
            }

            let material = scene.materials.get(chunk.material).unwrap_or(&fallback);
            upload_material(gpu, program, material);

            if !self.common_uploaded[variant] {
                upload_common(gpu, program, &frame, &lights);
                self.common_uploaded[variant] = true;
            }

            gpu.draw_indexed_u16(count, byte_offset);
        }
    }
}

fn bind_chunk_buffers(gpu: &mut dyn Gpu, chunk: &MeshChunk, model: &dyn ModelLoader) {
    gpu.bind_buffer(BufferTarget::Array, Some(chunk.position_buffer));
    gpu.vertex_attrib_pointer(ATTRIB_POSITION, 3);
    gpu.enable_vertex_attrib_array(ATTRIB_POSITION);

    for (slot, buffer, components) in [
        (ATTRIB_NORMAL, chunk.normal_buffer, 3),
        (ATTRIB_UV, chunk.uv_buffer, 2),
    ] {
        match buffer {
            Some(buffer) => {
                gpu.bind_buffer(BufferTarget::Array, Some(buffer));
                gpu.vertex_attrib_pointer(slot, components);
                gpu.enable_vertex_attrib_array(slot);
            }
            None => gpu.disable_vertex_attrib_array(slot),
        }
    }

    gpu.bind_buffer(BufferTarget::ElementArray, model.index_buffer());
}

/// Per-chunk uniforms: textures, colors and shininess.
fn upload_material(gpu: &mut dyn Gpu, program: &mut ShaderProgram, material: &Material) {
    let mut diffuse_textured = false;
    if program.variant() == ProgramVariant::Textured {
        let diffuse = material.diffuse_texture();
        let specular = material.specular_texture();
        if diffuse.is_some() {
            gpu.bind_texture(DIFFUSE_UNIT, diffuse);
        }
        if specular.is_some() {
            gpu.bind_texture(SPECULAR_UNIT, specular);
        }
        let loc = program.uniform(gpu, "enableDiffuse");
        gpu.uniform_1_i32(loc.as_ref(), diffuse.is_some() as i32);
        let loc = program.uniform(gpu, "enableSpecular");
        gpu.uniform_1_i32(loc.as_ref(), specular.is_some() as i32);
        diffuse_textured = diffuse.is_some();
    }

    let loc = program.uniform(gpu, "uDiffuseColor");
    gpu.uniform_3_f32_slice(loc.as_ref(), &material.diffuse_color(diffuse_textured).to_array());
    let loc = program.uniform(gpu, "uSpecularColor");
    gpu.uniform_3_f32_slice(loc.as_ref(), &material.specular_color().to_array());
    let loc = program.uniform(gpu, "uShininess");
    gpu.uniform_1_f32(loc.as_ref(), material.spec_shininess * SHININESS_SCALE);
}

/// Camera matrices and the light rig; once per variant per frame.
fn upload_common(
    gpu: &mut dyn Gpu,
    program: &mut ShaderProgram,
    frame: &FrameTransforms,
    lights: &LightUniforms,
) {
    let loc = program.uniform(gpu, "modelViewMatrix");
    gpu.uniform_matrix_4(loc.as_ref(), &frame.model_view);
    let loc = program.uniform(gpu, "projectionMatrix");
    gpu.uniform_matrix_4(loc.as_ref(), &frame.projection);
    let loc = program.uniform(gpu, "viewMatrix");
    gpu.uniform_matrix_4(loc.as_ref(), &frame.view);
    let loc = program.uniform(gpu, "normalMatrix");
    gpu.uniform_matrix_3(loc.as_ref(), &frame.normal_matrix);

    let loc = program.uniform(gpu, "directionalLightColor");
    gpu.uniform_3_f32_slice(loc.as_ref(), &lights.colors);
    let loc = program.uniform(gpu, "directionalLightDirection");
    gpu.uniform_3_f32_slice(loc.as_ref(), &lights.directions);

    if program.variant() == ProgramVariant::Textured {
        let loc = program.uniform(gpu, "tDiffuse");
        gpu.uniform_1_i32(loc.as_ref(), DIFFUSE_UNIT as i32);
        let loc = program.uniform(gpu, "tSpecular");
        gpu.uniform_1_i32(loc.as_ref(), SPECULAR_UNIT as i32);
    }
}
