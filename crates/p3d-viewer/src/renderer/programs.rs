//! Shader program manager: builds the program variants from shader assets
//! plus a `#define` preamble, and caches their uniform locations.

use super::{ProgramVariant, VariantTable};
use crate::error::ShaderError;
use crate::gpu::{
    Gpu, ProgramId, ShaderId, ShaderStage, UniformLocation, ATTRIB_NORMAL, ATTRIB_POSITION,
    ATTRIB_UV,
};
use crate::platform::PlatformAdapter;
use std::collections::HashMap;

/// Attribute names bound to the fixed slots before every link.
const ATTRIBUTES: [(u32, &str); 3] = [
    (ATTRIB_POSITION, "aPosition"),
    (ATTRIB_NORMAL, "aNormal"),
    (ATTRIB_UV, "aUv"),
];

const BASIC_DEFINES: &str = "#define MAX_DIR_LIGHTS 4\n\
                             #define GAMMA_INPUT\n\
                             #define GAMMA_OUTPUT\n\
                             #define PHYSICALLY_BASED_SHADING\n";

const TEXTURE_DEFINES: &str = "#define HAS_UV\n\
                               #define USE_DIFFUSE_TEXTURE\n\
                               #define USE_SPEC_TEX\n";

impl ProgramVariant {
    /// Preprocessor preamble the variant is compiled with.
    pub fn defines(self) -> String {
        match self {
            Self::Basic => BASIC_DEFINES.to_owned(),
            Self::Textured => format!("{BASIC_DEFINES}{TEXTURE_DEFINES}"),
        }
    }
}

/// Compiles one stage. The returned error carries the compiler log tagged
/// with `name`; the failed shader object is already released.
pub fn compile_shader(
    gpu: &mut dyn Gpu,
    stage: ShaderStage,
    source: &str,
    name: &str,
) -> Result<ShaderId, ShaderError> {
    let shader = gpu.create_shader(stage).ok_or(ShaderError::Create("shader"))?;
    if gpu.compile_shader(shader, source) {
        return Ok(shader);
    }
    let log = gpu.shader_info_log(shader);
    gpu.delete_shader(shader);
    Err(ShaderError::Compile {
        name: name.to_owned(),
        log,
    })
}

/// Loads shader source through the platform adapter, prepends `defines`
/// verbatim and compiles it.
pub fn load_shader_from_file(
    gpu: &mut dyn Gpu,
    platform: &mut dyn PlatformAdapter,
    stage: ShaderStage,
    path: &str,
    defines: &str,
) -> Result<ShaderId, ShaderError> {
    let bytes = platform
        .load_asset(path)
        .ok_or_else(|| ShaderError::AssetMissing(path.to_owned()))?;
    let mut source = String::with_capacity(defines.len() + bytes.len());
    source.push_str(defines);
    source.push_str(&String::from_utf8_lossy(&bytes));
    compile_shader(gpu, stage, &source, path)
}

/// Compiles both stages with the same defines, binds the fixed attribute
/// slots and links.
pub fn load_program(
    gpu: &mut dyn Gpu,
    platform: &mut dyn PlatformAdapter,
    vertex_path: &str,
    fragment_path: &str,
    defines: &str,
) -> Result<ProgramId, ShaderError> {
    let vertex = load_shader_from_file(gpu, platform, ShaderStage::Vertex, vertex_path, defines)?;
    let fragment =
        match load_shader_from_file(gpu, platform, ShaderStage::Fragment, fragment_path, defines) {
            Ok(shader) => shader,
            Err(err) => {
                gpu.delete_shader(vertex);
                return Err(err);
            }
        };

    let Some(program) = gpu.create_program() else {
        gpu.delete_shader(vertex);
        gpu.delete_shader(fragment);
        return Err(ShaderError::Create("program"));
    };
    gpu.attach_shader(program, vertex);
    gpu.attach_shader(program, fragment);
    for (index, name) in ATTRIBUTES {
        gpu.bind_attrib_location(program, index, name);
    }
    let linked = gpu.link_program(program);

    // Attached shaders live on until the program is deleted.
    gpu.delete_shader(vertex);
    gpu.delete_shader(fragment);

    if linked {
        Ok(program)
    } else {
        let log = gpu.program_info_log(program);
        gpu.delete_program(program);
        Err(ShaderError::Link {
            name: format!("{vertex_path} + {fragment_path}"),
            log,
        })
    }
}

/// A linked program and the uniform locations looked up so far.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    variant: ProgramVariant,
    uniforms: HashMap<&'static str, Option<UniformLocation>>,
}

impl ShaderProgram {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn variant(&self) -> ProgramVariant {
        self.variant
    }

    /// Location of `name`, or `None` when the compiler dropped it. Misses
    /// are logged on first lookup only.
    pub fn uniform(&mut self, gpu: &mut dyn Gpu, name: &'static str) -> Option<UniformLocation> {
        let (id, variant) = (self.id, self.variant);
        *self.uniforms.entry(name).or_insert_with(|| {
            let location = gpu.uniform_location(id, name);
            if location.is_none() {
                log::warn!("Uniform {} not found in {:?} program", name, variant);
            }
            location
        })
    }
}

/// Owns the program of every variant for the lifetime of a GPU context.
#[derive(Debug, Default)]
pub struct ProgramManager {
    programs: VariantTable<Option<ShaderProgram>>,
}

impl ProgramManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)builds every variant, releasing previously held programs first.
    /// A variant that fails to build is logged and left empty.
    pub fn build(
        &mut self,
        gpu: &mut dyn Gpu,
        platform: &mut dyn PlatformAdapter,
        vertex_path: &str,
        fragment_path: &str,
    ) {
        self.release(gpu);
        for variant in ProgramVariant::ALL {
            let defines = variant.defines();
            self.programs[variant] =
                match load_program(gpu, platform, vertex_path, fragment_path, &defines) {
                    Ok(id) => {
                        log::debug!("Built {:?} program {}", variant, id.get());
                        Some(ShaderProgram {
                            id,
                            variant,
                            uniforms: HashMap::new(),
                        })
                    }
                    Err(err) => {
                        log::error!("{:?} program unavailable: {}", variant, err);
                        None
                    }
                };
        }
    }

    pub fn release(&mut self, gpu: &mut dyn Gpu) {
        for variant in ProgramVariant::ALL {
            if let Some(program) = self.programs[variant].take() {
                gpu.delete_program(program.id);
            }
        }
    }

    pub fn program_id(&self, variant: ProgramVariant) -> Option<ProgramId> {
        self.programs[variant].as_ref().map(ShaderProgram::id)
    }

    pub fn get_mut(&mut self, variant: ProgramVariant) -> Option<&mut ShaderProgram> {
        self.programs[variant].as_mut()
    }
}
