//! GPU abstraction used by the viewer core.
//!
//! The core speaks a small GL ES 2 subset through the object-safe [`Gpu`]
//! trait. Handles are non-zero integers; "no resource" is always `None`,
//! never a magic zero.

#[cfg(all(feature = "gl", not(target_arch = "wasm32")))]
pub mod gl;
pub mod recording;

use glam::{Mat3, Mat4};
use std::num::NonZeroU32;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wraps a raw GPU name; `0` yields `None`.
            #[inline]
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            #[inline]
            pub fn get(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gpu_handle!(
    /// A compiled shader stage.
    ShaderId
);
gpu_handle!(
    /// A linked shader program.
    ProgramId
);
gpu_handle!(
    /// A vertex or index buffer.
    BufferId
);
gpu_handle!(
    /// A 2D texture.
    TextureId
);

/// Location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    CullFace,
    ScissorTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Less,
    LessEqual,
    Always,
}

/// Fixed attribute slots shared by every program variant.
pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_NORMAL: u32 = 1;
pub const ATTRIB_UV: u32 = 2;

/// The GL ES 2 subset the viewer core drives.
///
/// All calls must happen on the thread that owns the context. Uniform
/// setters taking `None` for the location are no-ops, matching GL's
/// behaviour for location `-1`.
pub trait Gpu {
    // --- Shaders & programs ---
    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId>;
    /// Uploads `source` and compiles it. Returns the compile status.
    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> bool;
    fn shader_info_log(&mut self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> Option<ProgramId>;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn bind_attrib_location(&mut self, program: ProgramId, index: u32, name: &str);
    /// Links the program. Returns the link status.
    fn link_program(&mut self, program: ProgramId) -> bool;
    fn program_info_log(&mut self, program: ProgramId) -> String;
    fn delete_program(&mut self, program: ProgramId);
    fn use_program(&mut self, program: Option<ProgramId>);

    // --- Uniforms ---
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn uniform_1_i32(&mut self, location: Option<&UniformLocation>, value: i32);
    fn uniform_1_f32(&mut self, location: Option<&UniformLocation>, value: f32);
    /// Uploads `values.len() / 3` consecutive `vec3`s.
    fn uniform_3_f32_slice(&mut self, location: Option<&UniformLocation>, values: &[f32]);
    fn uniform_matrix_3(&mut self, location: Option<&UniformLocation>, value: &Mat3);
    fn uniform_matrix_4(&mut self, location: Option<&UniformLocation>, value: &Mat4);

    // --- Buffers & attributes ---
    fn create_buffer(&mut self) -> Option<BufferId>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);
    /// Binds `buffer` to `target` and uploads `data` as static draw data.
    fn buffer_data(&mut self, target: BufferTarget, buffer: BufferId, data: &[u8]);
    fn delete_buffer(&mut self, buffer: BufferId);
    /// Points `index` at tightly packed floats of the bound array buffer.
    fn vertex_attrib_pointer(&mut self, index: u32, components: i32);
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);

    // --- Textures ---
    fn create_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8])
        -> Option<TextureId>;
    /// Activates texture unit `unit` and binds `texture` to its 2D target.
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>);
    fn delete_texture(&mut self, texture: TextureId);

    // --- Fixed-function state ---
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// Clears color, depth and stencil buffers.
    fn clear(&mut self, color: [f32; 4]);
    fn set_capability(&mut self, capability: Capability, enabled: bool);
    fn depth_func(&mut self, func: CompareFunction);
    fn depth_mask(&mut self, enabled: bool);
    fn depth_bits(&mut self) -> i32;

    /// Indexed triangle list draw using 16-bit indices from the bound
    /// element buffer, starting `byte_offset` bytes in.
    fn draw_indexed_u16(&mut self, count: i32, byte_offset: i32);
}
