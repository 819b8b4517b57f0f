//! Material: a shader plus its textures and Phong coefficients.

use crate::gfx::device::RenderDevice;
use crate::gfx::resources::{CubeMapId, SceneResources, ShaderId, TextureId};
use crate::math::Vec3;

/// Shading inputs shared by every surface that uses the same look.
///
/// The shader and textures are referenced by handle and may be shared by
/// any number of materials; the coefficients are per-material.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub shader: ShaderId,
    pub texture: Option<TextureId>,
    pub environment: Option<CubeMapId>,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Material {
    pub fn new(
        shader: ShaderId,
        ambient: Vec3,
        diffuse: Vec3,
        specular: Vec3,
        shininess: f32,
    ) -> Self {
        Self {
            shader,
            texture: None,
            environment: None,
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_environment(mut self, environment: CubeMapId) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Binds textures and pushes the shading coefficients. The coefficient
    /// upload rides with the texture bind: an untextured material leaves
    /// the program's previous coefficients in place.
    pub fn upload_attributes(&self, device: &mut impl RenderDevice, resources: &SceneResources) {
        let shader = resources.shader(self.shader);
        if let Some(texture) = self.texture {
            resources.texture(texture).bind(device);
            shader.upload_material_attributes(
                device,
                self.ambient,
                self.diffuse,
                self.specular,
                self.shininess,
            );
        }
        if let Some(environment) = self.environment {
            resources.cube_map(environment).bind(device);
            shader.upload_environment_enabled(device, true);
        } else {
            shader.upload_environment_enabled(device, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::testing::RecordingDevice;
    use crate::gfx::shader::{Shader, ShaderKind};

    fn phong(shader: ShaderId) -> Material {
        Material::new(
            shader,
            Vec3::splat(0.1),
            Vec3::splat(0.6),
            Vec3::splat(0.3),
            50.0,
        )
    }

    #[test]
    fn test_coefficients_ride_with_the_texture_bind() {
        let mut device = RecordingDevice::new();
        let mut resources = SceneResources::new();
        let shader = resources.add_shader(Shader::new(&mut device, ShaderKind::Mesh).unwrap());

        // Untextured: no coefficient upload, only the environment toggle.
        phong(shader).upload_attributes(&mut device, &resources);
        assert_eq!(device.uniforms_set("mesh"), vec!["use_environment"]);
    }

    #[test]
    fn test_environment_toggle_tracks_the_cube_map() {
        let mut device = RecordingDevice::new();
        let mut resources = SceneResources::new();
        let shader = resources.add_shader(Shader::new(&mut device, ShaderKind::Mesh).unwrap());
        let faces = std::array::from_fn(|_| std::path::PathBuf::from("/missing.jpg"));
        let cube = resources.add_cube_map(crate::gfx::texture::CubeMap::load(&mut device, &faces));

        phong(shader)
            .with_environment(cube)
            .upload_attributes(&mut device, &resources);
        // The toggle still uploads; the unbound cube map just skips its bind.
        assert_eq!(device.uniforms_set("mesh"), vec!["use_environment"]);
    }
}
