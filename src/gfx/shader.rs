//! Shader variants and their named uniform uploads.
//!
//! A [`Shader`] owns one compiled program and forwards named uploads to the
//! device. The set of variants is closed: each forwards only the uniforms
//! its shading model declares and treats the rest as structural no-ops, so
//! callers can push the full attribute bundle at any shader without caring
//! which kind it is. A name that is declared here but missing from the
//! built program is the device's non-fatal, logged skip.

use crate::gfx::device::{
    DeviceError, ProgramDesc, ProgramHandle, RenderDevice, SamplerDim, TextureSlot, UniformDecl,
    UniformKind, VertexLayout, TEXTURE_UNIT_2D, TEXTURE_UNIT_CUBE,
};
use crate::gfx::light::Light;
use crate::math::{Mat4, Vec3};

/// The closed set of shading models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    /// Per-pixel Phong over an imported mesh, with an optional 50/50
    /// environment-reflection blend.
    Mesh,
    /// Phong over the ground plane, texcoords derived from world XZ.
    InfiniteGround,
    /// Projects casters onto the ground plane and fills them with a
    /// constant translucent dark color.
    Shadow,
    /// Full-screen cube-map backdrop pinned to the far clip boundary.
    Environment,
}

/// A compiled program plus the variant that decides its upload surface.
#[derive(Debug, Clone, Copy)]
pub struct Shader {
    kind: ShaderKind,
    program: ProgramHandle,
}

impl Shader {
    /// Builds the program for `kind`. Failure is fatal for the caller:
    /// there is no rendering without a program.
    pub fn new(device: &mut impl RenderDevice, kind: ShaderKind) -> Result<Self, DeviceError> {
        let desc = match kind {
            ShaderKind::Mesh => MESH_PROGRAM,
            ShaderKind::InfiniteGround => GROUND_PROGRAM,
            ShaderKind::Shadow => SHADOW_PROGRAM,
            ShaderKind::Environment => ENVIRONMENT_PROGRAM,
        };
        let program = device.create_program(&desc)?;
        Ok(Self { kind, program })
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    /// Makes this program current for subsequent draws.
    pub fn run(&self, device: &mut impl RenderDevice) {
        device.use_program(self.program);
    }

    pub fn upload_model(&self, device: &mut impl RenderDevice, m: Mat4) {
        match self.kind {
            ShaderKind::Mesh | ShaderKind::InfiniteGround | ShaderKind::Shadow => {
                device.set_mat4(self.program, "m", m)
            }
            ShaderKind::Environment => {}
        }
    }

    pub fn upload_inverse_model(&self, device: &mut impl RenderDevice, inv_m: Mat4) {
        match self.kind {
            ShaderKind::Mesh | ShaderKind::InfiniteGround => {
                device.set_mat4(self.program, "inv_m", inv_m)
            }
            ShaderKind::Shadow | ShaderKind::Environment => {}
        }
    }

    pub fn upload_model_view_projection(&self, device: &mut impl RenderDevice, mvp: Mat4) {
        match self.kind {
            ShaderKind::Mesh | ShaderKind::InfiniteGround => {
                device.set_mat4(self.program, "mvp", mvp)
            }
            ShaderKind::Shadow | ShaderKind::Environment => {}
        }
    }

    /// The shadow pass positions projected vertices in world space, so it
    /// is the one consumer of a bare view-projection.
    pub fn upload_view_projection(&self, device: &mut impl RenderDevice, vp: Mat4) {
        match self.kind {
            ShaderKind::Shadow => device.set_mat4(self.program, "vp", vp),
            _ => {}
        }
    }

    pub fn upload_eye_position(&self, device: &mut impl RenderDevice, eye: Vec3) {
        match self.kind {
            ShaderKind::Mesh | ShaderKind::InfiniteGround => {
                device.set_vec3(self.program, "eye_position", eye)
            }
            ShaderKind::Shadow | ShaderKind::Environment => {}
        }
    }

    pub fn upload_light(&self, device: &mut impl RenderDevice, light: &Light) {
        match self.kind {
            ShaderKind::Mesh | ShaderKind::InfiniteGround => {
                device.set_vec3(self.program, "la", light.ambient);
                device.set_vec3(self.program, "le", light.emitted);
                device.set_vec4(self.program, "light_position", light.position);
            }
            // The projection only needs to know where the light sits.
            ShaderKind::Shadow => device.set_vec4(self.program, "light_position", light.position),
            ShaderKind::Environment => {}
        }
    }

    pub fn upload_material_attributes(
        &self,
        device: &mut impl RenderDevice,
        ambient: Vec3,
        diffuse: Vec3,
        specular: Vec3,
        shininess: f32,
    ) {
        match self.kind {
            ShaderKind::Mesh | ShaderKind::InfiniteGround => {
                device.set_vec3(self.program, "ka", ambient);
                device.set_vec3(self.program, "kd", diffuse);
                device.set_vec3(self.program, "ks", specular);
                device.set_f32(self.program, "shininess", shininess);
            }
            ShaderKind::Shadow | ShaderKind::Environment => {}
        }
    }

    /// Switches the mesh shader between plain Phong and the reflection blend.
    pub fn upload_environment_enabled(&self, device: &mut impl RenderDevice, enabled: bool) {
        match self.kind {
            ShaderKind::Mesh => {
                device.set_u32(self.program, "use_environment", enabled as u32)
            }
            _ => {}
        }
    }

    pub fn upload_view_dir_matrix(&self, device: &mut impl RenderDevice, view_dir: Mat4) {
        match self.kind {
            ShaderKind::Environment => device.set_mat4(self.program, "view_dir_matrix", view_dir),
            _ => {}
        }
    }
}

// Uniform tables below mirror the block layouts of the WGSL sources field
// for field; offsets follow WGSL uniform alignment (mat4 at 64 bytes, vec3
// in a 16-byte slot with a trailing f32 allowed to pack into it).

const MESH_UNIFORMS: &[UniformDecl] = &[
    UniformDecl { name: "m", offset: 0, kind: UniformKind::Mat4 },
    UniformDecl { name: "inv_m", offset: 64, kind: UniformKind::Mat4 },
    UniformDecl { name: "mvp", offset: 128, kind: UniformKind::Mat4 },
    UniformDecl { name: "eye_position", offset: 192, kind: UniformKind::Vec3 },
    UniformDecl { name: "light_position", offset: 208, kind: UniformKind::Vec4 },
    UniformDecl { name: "la", offset: 224, kind: UniformKind::Vec3 },
    UniformDecl { name: "le", offset: 240, kind: UniformKind::Vec3 },
    UniformDecl { name: "ka", offset: 256, kind: UniformKind::Vec3 },
    UniformDecl { name: "kd", offset: 272, kind: UniformKind::Vec3 },
    UniformDecl { name: "ks", offset: 288, kind: UniformKind::Vec3 },
    UniformDecl { name: "shininess", offset: 300, kind: UniformKind::F32 },
    UniformDecl { name: "use_environment", offset: 304, kind: UniformKind::U32 },
];

const MESH_PROGRAM: ProgramDesc<'static> = ProgramDesc {
    label: "mesh",
    source: include_str!("shaders/mesh.wgsl"),
    layout: VertexLayout::Position3TexcoordNormal,
    uniforms: MESH_UNIFORMS,
    uniform_bytes: 320,
    textures: &[
        TextureSlot { unit: TEXTURE_UNIT_2D, dim: SamplerDim::D2 },
        TextureSlot { unit: TEXTURE_UNIT_CUBE, dim: SamplerDim::Cube },
    ],
};

const GROUND_UNIFORMS: &[UniformDecl] = &[
    UniformDecl { name: "m", offset: 0, kind: UniformKind::Mat4 },
    UniformDecl { name: "inv_m", offset: 64, kind: UniformKind::Mat4 },
    UniformDecl { name: "mvp", offset: 128, kind: UniformKind::Mat4 },
    UniformDecl { name: "eye_position", offset: 192, kind: UniformKind::Vec3 },
    UniformDecl { name: "light_position", offset: 208, kind: UniformKind::Vec4 },
    UniformDecl { name: "la", offset: 224, kind: UniformKind::Vec3 },
    UniformDecl { name: "le", offset: 240, kind: UniformKind::Vec3 },
    UniformDecl { name: "ka", offset: 256, kind: UniformKind::Vec3 },
    UniformDecl { name: "kd", offset: 272, kind: UniformKind::Vec3 },
    UniformDecl { name: "ks", offset: 288, kind: UniformKind::Vec3 },
    UniformDecl { name: "shininess", offset: 300, kind: UniformKind::F32 },
];

const GROUND_PROGRAM: ProgramDesc<'static> = ProgramDesc {
    label: "infinite_ground",
    source: include_str!("shaders/ground.wgsl"),
    layout: VertexLayout::Position4TexcoordNormal,
    uniforms: GROUND_UNIFORMS,
    uniform_bytes: 304,
    textures: &[TextureSlot { unit: TEXTURE_UNIT_2D, dim: SamplerDim::D2 }],
};

const SHADOW_UNIFORMS: &[UniformDecl] = &[
    UniformDecl { name: "m", offset: 0, kind: UniformKind::Mat4 },
    UniformDecl { name: "vp", offset: 64, kind: UniformKind::Mat4 },
    UniformDecl { name: "light_position", offset: 128, kind: UniformKind::Vec4 },
];

const SHADOW_PROGRAM: ProgramDesc<'static> = ProgramDesc {
    label: "shadow",
    source: include_str!("shaders/shadow.wgsl"),
    layout: VertexLayout::Position3TexcoordNormal,
    uniforms: SHADOW_UNIFORMS,
    uniform_bytes: 144,
    textures: &[],
};

const ENVIRONMENT_UNIFORMS: &[UniformDecl] = &[UniformDecl {
    name: "view_dir_matrix",
    offset: 0,
    kind: UniformKind::Mat4,
}];

const ENVIRONMENT_PROGRAM: ProgramDesc<'static> = ProgramDesc {
    label: "environment",
    source: include_str!("shaders/environment.wgsl"),
    layout: VertexLayout::Position4,
    uniforms: ENVIRONMENT_UNIFORMS,
    uniform_bytes: 64,
    textures: &[TextureSlot { unit: TEXTURE_UNIT_CUBE, dim: SamplerDim::Cube }],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::testing::RecordingDevice;
    use crate::math::Vec4;

    #[test]
    fn test_shadow_shader_uploads_only_its_subset() {
        let mut device = RecordingDevice::new();
        let shader = Shader::new(&mut device, ShaderKind::Shadow).unwrap();

        shader.upload_model(&mut device, Mat4::identity());
        shader.upload_inverse_model(&mut device, Mat4::identity());
        shader.upload_model_view_projection(&mut device, Mat4::identity());
        shader.upload_view_projection(&mut device, Mat4::identity());
        shader.upload_eye_position(&mut device, Vec3::default());
        shader.upload_material_attributes(
            &mut device,
            Vec3::splat(0.1),
            Vec3::splat(0.6),
            Vec3::splat(0.3),
            50.0,
        );
        shader.upload_light(
            &mut device,
            &Light::new(Vec3::splat(1.0), Vec3::splat(1.0), Vec4::new(0.0, 100.0, 0.0, 1.0)),
        );

        assert_eq!(device.uniforms_set("shadow"), vec!["m", "vp", "light_position"]);
    }

    #[test]
    fn test_environment_shader_ignores_scene_attributes() {
        let mut device = RecordingDevice::new();
        let shader = Shader::new(&mut device, ShaderKind::Environment).unwrap();

        shader.upload_model(&mut device, Mat4::identity());
        shader.upload_eye_position(&mut device, Vec3::default());
        shader.upload_view_dir_matrix(&mut device, Mat4::identity());

        assert_eq!(device.uniforms_set("environment"), vec!["view_dir_matrix"]);
    }

    #[test]
    fn test_uniform_tables_match_declared_block_sizes() {
        for desc in [MESH_PROGRAM, GROUND_PROGRAM, SHADOW_PROGRAM, ENVIRONMENT_PROGRAM] {
            for uniform in desc.uniforms {
                assert!(
                    uniform.offset + uniform.kind.byte_size() <= desc.uniform_bytes,
                    "{}: `{}` spills past the block",
                    desc.label,
                    uniform.name
                );
            }
        }
    }
}
