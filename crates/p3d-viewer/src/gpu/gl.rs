//! [`Gpu`] implementation for a current `glow` GL / GL ES context.

use super::{
    BufferId, BufferTarget, Capability, CompareFunction, Gpu, ProgramId, ShaderId, ShaderStage,
    TextureId, UniformLocation,
};
use glam::{Mat3, Mat4};
use glow::HasContext;

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn target_enum(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::CullFace => glow::CULL_FACE,
        Capability::ScissorTest => glow::SCISSOR_TEST,
    }
}

fn compare_enum(func: CompareFunction) -> u32 {
    match func {
        CompareFunction::Less => glow::LESS,
        CompareFunction::LessEqual => glow::LEQUAL,
        CompareFunction::Always => glow::ALWAYS,
    }
}

#[inline]
fn shader(id: ShaderId) -> glow::NativeShader {
    glow::NativeShader(id.0)
}

#[inline]
fn program(id: ProgramId) -> glow::NativeProgram {
    glow::NativeProgram(id.0)
}

#[inline]
fn buffer(id: BufferId) -> glow::NativeBuffer {
    glow::NativeBuffer(id.0)
}

#[inline]
fn texture(id: TextureId) -> glow::NativeTexture {
    glow::NativeTexture(id.0)
}

#[inline]
fn location(loc: Option<&UniformLocation>) -> Option<glow::NativeUniformLocation> {
    loc.map(|l| glow::NativeUniformLocation(l.0))
}

// SAFETY (all blocks below): the viewer only calls into the GPU from the
// thread that owns the context, and every handle passed in was produced by
// this same context.
impl Gpu for glow::Context {
    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        match unsafe { HasContext::create_shader(self, stage_enum(stage)) } {
            Ok(s) => Some(ShaderId(s.0)),
            Err(e) => {
                log::error!("glCreateShader failed: {}", e);
                None
            }
        }
    }

    fn compile_shader(&mut self, id: ShaderId, source: &str) -> bool {
        unsafe {
            self.shader_source(shader(id), source);
            HasContext::compile_shader(self, shader(id));
            self.get_shader_compile_status(shader(id))
        }
    }

    fn shader_info_log(&mut self, id: ShaderId) -> String {
        unsafe { self.get_shader_info_log(shader(id)) }
    }

    fn delete_shader(&mut self, id: ShaderId) {
        unsafe { HasContext::delete_shader(self, shader(id)) }
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        match unsafe { HasContext::create_program(self) } {
            Ok(p) => Some(ProgramId(p.0)),
            Err(e) => {
                log::error!("glCreateProgram failed: {}", e);
                None
            }
        }
    }

    fn attach_shader(&mut self, prog: ProgramId, id: ShaderId) {
        unsafe { HasContext::attach_shader(self, program(prog), shader(id)) }
    }

    fn bind_attrib_location(&mut self, prog: ProgramId, index: u32, name: &str) {
        unsafe { HasContext::bind_attrib_location(self, program(prog), index, name) }
    }

    fn link_program(&mut self, prog: ProgramId) -> bool {
        unsafe {
            HasContext::link_program(self, program(prog));
            self.get_program_link_status(program(prog))
        }
    }

    fn program_info_log(&mut self, prog: ProgramId) -> String {
        unsafe { self.get_program_info_log(program(prog)) }
    }

    fn delete_program(&mut self, prog: ProgramId) {
        unsafe { HasContext::delete_program(self, program(prog)) }
    }

    fn use_program(&mut self, prog: Option<ProgramId>) {
        unsafe { HasContext::use_program(self, prog.map(program)) }
    }

    fn uniform_location(&mut self, prog: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe { self.get_uniform_location(program(prog), name) }.map(|l| UniformLocation(l.0))
    }

    fn uniform_1_i32(&mut self, loc: Option<&UniformLocation>, value: i32) {
        unsafe { HasContext::uniform_1_i32(self, location(loc).as_ref(), value) }
    }

    fn uniform_1_f32(&mut self, loc: Option<&UniformLocation>, value: f32) {
        unsafe { HasContext::uniform_1_f32(self, location(loc).as_ref(), value) }
    }

    fn uniform_3_f32_slice(&mut self, loc: Option<&UniformLocation>, values: &[f32]) {
        unsafe { HasContext::uniform_3_f32_slice(self, location(loc).as_ref(), values) }
    }

    fn uniform_matrix_3(&mut self, loc: Option<&UniformLocation>, value: &Mat3) {
        unsafe {
            self.uniform_matrix_3_f32_slice(location(loc).as_ref(), false, &value.to_cols_array())
        }
    }

    fn uniform_matrix_4(&mut self, loc: Option<&UniformLocation>, value: &Mat4) {
        unsafe {
            self.uniform_matrix_4_f32_slice(location(loc).as_ref(), false, &value.to_cols_array())
        }
    }

    fn create_buffer(&mut self) -> Option<BufferId> {
        match unsafe { HasContext::create_buffer(self) } {
            Ok(b) => Some(BufferId(b.0)),
            Err(e) => {
                log::error!("glGenBuffers failed: {}", e);
                None
            }
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: Option<BufferId>) {
        unsafe { HasContext::bind_buffer(self, target_enum(target), id.map(buffer)) }
    }

    fn buffer_data(&mut self, target: BufferTarget, id: BufferId, data: &[u8]) {
        unsafe {
            HasContext::bind_buffer(self, target_enum(target), Some(buffer(id)));
            self.buffer_data_u8_slice(target_enum(target), data, glow::STATIC_DRAW);
        }
    }

    fn delete_buffer(&mut self, id: BufferId) {
        unsafe { HasContext::delete_buffer(self, buffer(id)) }
    }

    fn vertex_attrib_pointer(&mut self, index: u32, components: i32) {
        unsafe { self.vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0) }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { HasContext::disable_vertex_attrib_array(self, index) }
    }

    fn create_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) -> Option<TextureId> {
        unsafe {
            let handle = match self.create_texture() {
                Ok(t) => t,
                Err(e) => {
                    log::error!("glGenTextures failed: {}", e);
                    return None;
                }
            };
            HasContext::bind_texture(self, glow::TEXTURE_2D, Some(handle));
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width.min(i32::MAX as u32) as i32,
                height.min(i32::MAX as u32) as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
            HasContext::bind_texture(self, glow::TEXTURE_2D, None);
            Some(TextureId(handle.0))
        }
    }

    fn bind_texture(&mut self, unit: u32, id: Option<TextureId>) {
        unsafe {
            self.active_texture(glow::TEXTURE0 + unit);
            HasContext::bind_texture(self, glow::TEXTURE_2D, id.map(texture));
        }
    }

    fn delete_texture(&mut self, id: TextureId) {
        unsafe { HasContext::delete_texture(self, texture(id)) }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            self.clear_color(color[0], color[1], color[2], color[3]);
            HasContext::clear(
                self,
                glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT,
            );
        }
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        unsafe {
            if enabled {
                self.enable(capability_enum(capability));
            } else {
                self.disable(capability_enum(capability));
            }
        }
    }

    fn depth_func(&mut self, func: CompareFunction) {
        unsafe { HasContext::depth_func(self, compare_enum(func)) }
    }

    fn depth_mask(&mut self, enabled: bool) {
        unsafe { HasContext::depth_mask(self, enabled) }
    }

    fn depth_bits(&mut self) -> i32 {
        unsafe { self.get_parameter_i32(glow::DEPTH_BITS) }
    }

    fn draw_indexed_u16(&mut self, count: i32, byte_offset: i32) {
        unsafe { self.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, byte_offset) }
    }
}
