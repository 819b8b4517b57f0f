//! Graphics submission contract.
//!
//! The renderer core never talks to a graphics API directly; it drives an
//! implementation of [`RenderDevice`]. The contract is intentionally narrow:
//! upload vertex buffers with a fixed attribute layout, build shader
//! programs with a declared uniform table, set uniforms by name, bind
//! texture units, submit draws. The wgpu implementation lives in
//! [`crate::gfx::rendering`]; tests use [`testing::RecordingDevice`].

use thiserror::Error;

use crate::math::{Mat4, Vec3, Vec4};

/// Fatal device-side failures.
///
/// A program that cannot be built makes rendering meaningless, so these
/// propagate out of scene construction instead of degrading.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("shader program `{label}` failed to build: {message}")]
    ProgramBuild { label: String, message: String },
}

/// Handle to an uploaded vertex buffer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Handle to a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to a cube-map texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeMapHandle(pub u32);

/// Texture unit carrying the 2D sampler of every program that has one.
pub const TEXTURE_UNIT_2D: u32 = 0;
/// Texture unit carrying the cube sampler of every program that has one.
pub const TEXTURE_UNIT_CUBE: u32 = 1;

/// How submitted vertices assemble into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

/// Vertex attribute layout: slot 0 position, slot 1 texcoord, slot 2 normal.
///
/// Positions are 3-component except for geometry that carries homogeneous
/// coordinates (the ground plane's points at infinity, the backdrop quad).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    Position3TexcoordNormal,
    Position4TexcoordNormal,
    Position4,
}

impl VertexLayout {
    /// Floats per vertex in the position stream.
    pub fn position_components(self) -> usize {
        match self {
            VertexLayout::Position3TexcoordNormal => 3,
            VertexLayout::Position4TexcoordNormal | VertexLayout::Position4 => 4,
        }
    }

    pub fn has_texcoords(self) -> bool {
        !matches!(self, VertexLayout::Position4)
    }
}

/// Flat vertex streams plus the fixed-function state their draws use.
#[derive(Debug, Clone, Copy)]
pub struct GeometryDesc<'a> {
    pub label: &'a str,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub positions: &'a [f32],
    /// Empty when the layout has no texcoord slot.
    pub texcoords: &'a [f32],
    /// Empty when the layout has no normal slot.
    pub normals: &'a [f32],
    pub depth_test: bool,
    pub blend: bool,
}

impl GeometryDesc<'_> {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / self.layout.position_components()
    }
}

/// Scalar shape of one named uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec3,
    Vec4,
    F32,
    U32,
}

impl UniformKind {
    pub fn byte_size(self) -> usize {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec4 => 16,
            UniformKind::Vec3 => 12,
            UniformKind::F32 | UniformKind::U32 => 4,
        }
    }
}

/// One entry of a program's uniform table.
///
/// `offset` is the byte offset inside the program's uniform block and must
/// match the field layout of the shader source.
#[derive(Debug, Clone, Copy)]
pub struct UniformDecl {
    pub name: &'static str,
    pub offset: usize,
    pub kind: UniformKind,
}

/// Sampler dimensionality of a program texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerDim {
    D2,
    Cube,
}

/// A texture unit a program samples from.
#[derive(Debug, Clone, Copy)]
pub struct TextureSlot {
    pub unit: u32,
    pub dim: SamplerDim,
}

/// Everything needed to build one shader program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub layout: VertexLayout,
    pub uniforms: &'a [UniformDecl],
    /// Total uniform block size in bytes (covers padding after the last field).
    pub uniform_bytes: usize,
    pub textures: &'a [TextureSlot],
}

impl ProgramDesc<'_> {
    pub fn find_uniform(&self, name: &str) -> Option<&UniformDecl> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

/// Decoded image as delivered by the external decoder: raw bytes plus
/// dimensions and channel count (3 = RGB, 4 = RGBA).
#[derive(Debug, Clone)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl ImageData {
    /// Expands 3-channel data to RGBA; 4-channel data is returned as is.
    /// Backends without a packed 24-bit format upload through this.
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.channels {
            4 => self.pixels.clone(),
            3 => {
                let mut out = Vec::with_capacity(self.pixels.len() / 3 * 4);
                for rgb in self.pixels.chunks_exact(3) {
                    out.extend_from_slice(rgb);
                    out.push(0xff);
                }
                out
            }
            other => panic!("unsupported channel count {other}"),
        }
    }
}

/// The capability the renderer core requires from a graphics backend.
///
/// Uniform setters address the program explicitly rather than relying on a
/// "currently used" program, so uploads can never land in the wrong block.
/// Setting a name the program does not declare is non-fatal: the backend
/// logs a diagnostic and skips the write, and the draw proceeds with the
/// value the uniform last held.
pub trait RenderDevice {
    fn create_geometry(&mut self, desc: &GeometryDesc) -> GeometryHandle;
    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, DeviceError>;
    fn create_texture_2d(&mut self, image: &ImageData, label: &str) -> TextureHandle;
    fn create_texture_cube(&mut self, faces: &[ImageData; 6], label: &str) -> CubeMapHandle;

    /// Selects the program subsequent draws run with.
    fn use_program(&mut self, program: ProgramHandle);

    fn set_mat4(&mut self, program: ProgramHandle, name: &str, value: Mat4);
    fn set_vec3(&mut self, program: ProgramHandle, name: &str, value: Vec3);
    fn set_vec4(&mut self, program: ProgramHandle, name: &str, value: Vec4);
    fn set_f32(&mut self, program: ProgramHandle, name: &str, value: f32);
    fn set_u32(&mut self, program: ProgramHandle, name: &str, value: u32);

    fn bind_texture_2d(&mut self, unit: u32, texture: TextureHandle);
    fn bind_texture_cube(&mut self, unit: u32, texture: CubeMapHandle);

    /// Submits the geometry with the current program and texture bindings.
    fn draw(&mut self, geometry: GeometryHandle);
}

#[cfg(test)]
pub mod testing {
    //! A backend that records submissions instead of rendering them, used
    //! by the scene and object tests to assert call ordering.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        UseProgram(String),
        SetUniform { program: String, name: String },
        BindTexture2d(u32),
        BindTextureCube(u32),
        Draw { program: String, geometry: String },
    }

    #[derive(Default)]
    pub struct RecordingDevice {
        programs: Vec<String>,
        geometries: Vec<String>,
        textures: u32,
        cube_maps: u32,
        current: Option<ProgramHandle>,
        pub calls: Vec<Call>,
    }

    impl RecordingDevice {
        pub fn new() -> Self {
            Self::default()
        }

        fn program_label(&self, program: ProgramHandle) -> String {
            self.programs[program.0 as usize].clone()
        }

        /// The sequence of draws as `(program, geometry)` labels.
        pub fn draws(&self) -> Vec<(String, String)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Draw { program, geometry } => {
                        Some((program.clone(), geometry.clone()))
                    }
                    _ => None,
                })
                .collect()
        }

        /// Names uploaded to the given program label, in call order.
        pub fn uniforms_set(&self, program_label: &str) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::SetUniform { program, name } if program == program_label => {
                        Some(name.clone())
                    }
                    _ => None,
                })
                .collect()
        }
    }

    impl RenderDevice for RecordingDevice {
        fn create_geometry(&mut self, desc: &GeometryDesc) -> GeometryHandle {
            self.geometries.push(desc.label.to_string());
            GeometryHandle(self.geometries.len() as u32 - 1)
        }

        fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, DeviceError> {
            self.programs.push(desc.label.to_string());
            Ok(ProgramHandle(self.programs.len() as u32 - 1))
        }

        fn create_texture_2d(&mut self, _image: &ImageData, _label: &str) -> TextureHandle {
            self.textures += 1;
            TextureHandle(self.textures - 1)
        }

        fn create_texture_cube(&mut self, _faces: &[ImageData; 6], _label: &str) -> CubeMapHandle {
            self.cube_maps += 1;
            CubeMapHandle(self.cube_maps - 1)
        }

        fn use_program(&mut self, program: ProgramHandle) {
            self.current = Some(program);
            self.calls.push(Call::UseProgram(self.program_label(program)));
        }

        fn set_mat4(&mut self, program: ProgramHandle, name: &str, _value: Mat4) {
            self.calls.push(Call::SetUniform {
                program: self.program_label(program),
                name: name.to_string(),
            });
        }

        fn set_vec3(&mut self, program: ProgramHandle, name: &str, _value: Vec3) {
            self.calls.push(Call::SetUniform {
                program: self.program_label(program),
                name: name.to_string(),
            });
        }

        fn set_vec4(&mut self, program: ProgramHandle, name: &str, _value: Vec4) {
            self.calls.push(Call::SetUniform {
                program: self.program_label(program),
                name: name.to_string(),
            });
        }

        fn set_f32(&mut self, program: ProgramHandle, name: &str, _value: f32) {
            self.calls.push(Call::SetUniform {
                program: self.program_label(program),
                name: name.to_string(),
            });
        }

        fn set_u32(&mut self, program: ProgramHandle, name: &str, _value: u32) {
            self.calls.push(Call::SetUniform {
                program: self.program_label(program),
                name: name.to_string(),
            });
        }

        fn bind_texture_2d(&mut self, unit: u32, _texture: TextureHandle) {
            self.calls.push(Call::BindTexture2d(unit));
        }

        fn bind_texture_cube(&mut self, unit: u32, _texture: CubeMapHandle) {
            self.calls.push(Call::BindTextureCube(unit));
        }

        fn draw(&mut self, geometry: GeometryHandle) {
            let program = self
                .current
                .map(|p| self.program_label(p))
                .unwrap_or_else(|| "<none>".to_string());
            self.calls.push(Call::Draw {
                program,
                geometry: self.geometries[geometry.0 as usize].clone(),
            });
        }
    }
}
