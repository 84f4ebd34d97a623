//! Headless [`Gpu`] backend that hands out handles and records every call.

use super::{
    BufferId, BufferTarget, Capability, CompareFunction, Gpu, ProgramId, ShaderId, ShaderStage,
    TextureId, UniformLocation,
};
use glam::{Mat3, Mat4};
use std::collections::{HashMap, HashSet};

/// One recorded GPU call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateShader(ShaderStage, ShaderId),
    CompileShader { shader: ShaderId, source: String, ok: bool },
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    BindAttribLocation { program: ProgramId, index: u32, name: String },
    LinkProgram { program: ProgramId, ok: bool },
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    Uniform1i { name: String, value: i32 },
    Uniform1f { name: String, value: f32 },
    Uniform3f { name: String, values: Vec<f32> },
    UniformMatrix3 { name: String, value: Mat3 },
    UniformMatrix4 { name: String, value: Mat4 },
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData { target: BufferTarget, buffer: BufferId, len: usize },
    DeleteBuffer(BufferId),
    VertexAttribPointer { index: u32, components: i32 },
    EnableAttrib(u32),
    DisableAttrib(u32),
    CreateTexture { texture: TextureId, width: u32, height: u32 },
    BindTexture { unit: u32, texture: Option<TextureId> },
    DeleteTexture(TextureId),
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    Clear([f32; 4]),
    SetCapability(Capability, bool),
    DepthFunc(CompareFunction),
    DepthMask(bool),
    DrawIndexed { program: Option<ProgramId>, count: i32, byte_offset: i32 },
}

/// Records calls instead of talking to a driver.
///
/// Uniform uploads are recorded by uniform *name* so frames can be inspected
/// without knowing the handed-out locations. Uploads to a `None` location are
/// dropped, exactly like a real driver ignores location `-1`.
#[derive(Debug, Default)]
pub struct RecordingGpu {
    pub calls: Vec<GpuCall>,
    next_name: u32,
    /// Shaders whose source contains any of these markers fail to compile.
    reject_markers: Vec<String>,
    /// Programs fail to link while this is set.
    reject_links: bool,
    /// Uniform names reported as absent (optimised away).
    missing_uniforms: HashSet<String>,
    uniform_names: HashMap<u32, String>,
    live_programs: HashSet<ProgramId>,
    live_buffers: HashSet<BufferId>,
    live_textures: HashSet<TextureId>,
    current_program: Option<ProgramId>,
    depth_bits: i32,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self {
            depth_bits: 24,
            ..Self::default()
        }
    }

    /// Makes every shader whose source contains `marker` fail to compile.
    pub fn reject_shaders_containing(&mut self, marker: impl Into<String>) {
        self.reject_markers.push(marker.into());
    }

    pub fn reject_links(&mut self, reject: bool) {
        self.reject_links = reject;
    }

    /// Reports `name` as absent from every program.
    pub fn hide_uniform(&mut self, name: impl Into<String>) {
        self.missing_uniforms.insert(name.into());
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draw_calls(&self) -> Vec<&GpuCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, GpuCall::DrawIndexed { .. }))
            .collect()
    }

    /// Number of uploads recorded for the uniform `name`.
    pub fn uniform_uploads(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| match c {
                GpuCall::Uniform1i { name: n, .. }
                | GpuCall::Uniform1f { name: n, .. }
                | GpuCall::Uniform3f { name: n, .. }
                | GpuCall::UniformMatrix3 { name: n, .. }
                | GpuCall::UniformMatrix4 { name: n, .. } => n == name,
                _ => false,
            })
            .count()
    }

    pub fn live_programs(&self) -> usize {
        self.live_programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    fn next(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    fn name_of(&self, location: Option<&UniformLocation>) -> Option<String> {
        location.and_then(|l| self.uniform_names.get(&l.0).cloned())
    }
}

impl Gpu for RecordingGpu {
    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        let id = ShaderId::new(self.next())?;
        self.calls.push(GpuCall::CreateShader(stage, id));
        Some(id)
    }

    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> bool {
        let ok = !self.reject_markers.iter().any(|m| source.contains(m.as_str()));
        self.calls.push(GpuCall::CompileShader {
            shader,
            source: source.to_owned(),
            ok,
        });
        ok
    }

    fn shader_info_log(&mut self, shader: ShaderId) -> String {
        format!("0:1: error: shader {} rejected", shader.get())
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.calls.push(GpuCall::DeleteShader(shader));
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId::new(self.next())?;
        self.live_programs.insert(id);
        self.calls.push(GpuCall::CreateProgram(id));
        Some(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(GpuCall::AttachShader(program, shader));
    }

    fn bind_attrib_location(&mut self, program: ProgramId, index: u32, name: &str) {
        self.calls.push(GpuCall::BindAttribLocation {
            program,
            index,
            name: name.to_owned(),
        });
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        let ok = !self.reject_links;
        self.calls.push(GpuCall::LinkProgram { program, ok });
        ok
    }

    fn program_info_log(&mut self, program: ProgramId) -> String {
        format!("link error in program {}", program.get())
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.live_programs.remove(&program);
        self.calls.push(GpuCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if self.missing_uniforms.contains(name) || !self.live_programs.contains(&program) {
            return None;
        }
        let loc = self.next();
        self.uniform_names.insert(loc, name.to_owned());
        Some(UniformLocation(loc))
    }

    fn uniform_1_i32(&mut self, location: Option<&UniformLocation>, value: i32) {
        if let Some(name) = self.name_of(location) {
            self.calls.push(GpuCall::Uniform1i { name, value });
        }
    }

    fn uniform_1_f32(&mut self, location: Option<&UniformLocation>, value: f32) {
        if let Some(name) = self.name_of(location) {
            self.calls.push(GpuCall::Uniform1f { name, value });
        }
    }

    fn uniform_3_f32_slice(&mut self, location: Option<&UniformLocation>, values: &[f32]) {
        if let Some(name) = self.name_of(location) {
            self.calls.push(GpuCall::Uniform3f {
                name,
                values: values.to_vec(),
            });
        }
    }

    fn uniform_matrix_3(&mut self, location: Option<&UniformLocation>, value: &Mat3) {
        if let Some(name) = self.name_of(location) {
            self.calls.push(GpuCall::UniformMatrix3 { name, value: *value });
        }
    }

    fn uniform_matrix_4(&mut self, location: Option<&UniformLocation>, value: &Mat4) {
        if let Some(name) = self.name_of(location) {
            self.calls.push(GpuCall::UniformMatrix4 { name, value: *value });
        }
    }

    fn create_buffer(&mut self) -> Option<BufferId> {
        let id = BufferId::new(self.next())?;
        self.live_buffers.insert(id);
        self.calls.push(GpuCall::CreateBuffer(id));
        Some(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.calls.push(GpuCall::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, buffer: BufferId, data: &[u8]) {
        self.calls.push(GpuCall::BufferData {
            target,
            buffer,
            len: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.live_buffers.remove(&buffer);
        self.calls.push(GpuCall::DeleteBuffer(buffer));
    }

    fn vertex_attrib_pointer(&mut self, index: u32, components: i32) {
        self.calls
            .push(GpuCall::VertexAttribPointer { index, components });
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(GpuCall::EnableAttrib(index));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(GpuCall::DisableAttrib(index));
    }

    fn create_texture_rgba8(
        &mut self,
        width: u32,
        height: u32,
        _pixels: &[u8],
    ) -> Option<TextureId> {
        let texture = TextureId::new(self.next())?;
        self.live_textures.insert(texture);
        self.calls.push(GpuCall::CreateTexture {
            texture,
            width,
            height,
        });
        Some(texture)
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        self.calls.push(GpuCall::BindTexture { unit, texture });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.live_textures.remove(&texture);
        self.calls.push(GpuCall::DeleteTexture(texture));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.calls.push(GpuCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(GpuCall::Clear(color));
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.calls.push(GpuCall::SetCapability(capability, enabled));
    }

    fn depth_func(&mut self, func: CompareFunction) {
        self.calls.push(GpuCall::DepthFunc(func));
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.calls.push(GpuCall::DepthMask(enabled));
    }

    fn depth_bits(&mut self) -> i32 {
        self.depth_bits
    }

    fn draw_indexed_u16(&mut self, count: i32, byte_offset: i32) {
        self.calls.push(GpuCall::DrawIndexed {
            program: self.current_program,
            count,
            byte_offset,
        });
    }
}
