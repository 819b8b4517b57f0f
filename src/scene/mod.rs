//! Scene: owns every resource and drives the per-frame update and draw.
//!
//! Draw order is a fixed three-phase sequence: shadows for every caster,
//! shaded geometry for every object, then the environment backdrop. The
//! phases must not be reordered: the shadows blend onto the ground plane
//! and have to land in the depth/color buffers before the ground itself
//! draws.

pub mod environment;
pub mod object;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::gfx::camera::Camera;
use crate::gfx::device::{DeviceError, RenderDevice};
use crate::gfx::geometry::Geometry;
use crate::gfx::light::Light;
use crate::gfx::material::Material;
use crate::gfx::resources::{Mesh, SceneResources, ShaderId};
use crate::gfx::shader::{Shader, ShaderKind};
use crate::gfx::texture::{CubeMap, Texture};
use crate::import::{self, ImportError};
use crate::input::InputState;
use crate::math::{Vec3, Vec4};

use environment::Environment;
use object::Object;

/// How the camera follows the action each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Rigid offset chase behind the avatar.
    Chase,
    /// Keyboard-driven free look, detached from the avatar.
    Free,
}

/// Errors that abort scene construction.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Asset paths and shared shading coefficients for the standard scene.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub avatar_mesh: PathBuf,
    pub avatar_texture: PathBuf,
    pub scenery_mesh: PathBuf,
    pub scenery_texture: PathBuf,
    pub ground_texture: PathBuf,
    /// Cube faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub environment_faces: [PathBuf; 6],
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl SceneConfig {
    /// Conventional file names resolved against one asset directory.
    pub fn from_asset_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let face = |name: &str| dir.join(name);
        Self {
            avatar_mesh: dir.join("avatar.obj"),
            avatar_texture: dir.join("avatar.png"),
            scenery_mesh: dir.join("tree.obj"),
            scenery_texture: dir.join("tree.png"),
            ground_texture: dir.join("ground.png"),
            environment_faces: [
                face("posx.jpg"),
                face("negx.jpg"),
                face("posy.jpg"),
                face("negy.jpg"),
                face("posz.jpg"),
                face("negz.jpg"),
            ],
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.6),
            specular: Vec3::splat(0.3),
            shininess: 50.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::from_asset_dir("assets")
    }
}

pub struct Scene {
    pub resources: SceneResources,
    objects: Vec<Object>,
    environment: Environment,
    pub camera: Camera,
    pub camera_mode: CameraMode,
    pub light: Light,
    shadow_shader: ShaderId,
}

impl Scene {
    /// Builds the standard scene: a keyboard-driven avatar, one piece of
    /// scenery, the infinite ground, and the cube-map backdrop. Missing
    /// asset files degrade (empty geometry, unbound textures); a shader
    /// that fails to build is fatal.
    pub fn new(device: &mut impl RenderDevice, config: &SceneConfig) -> Result<Self, SceneError> {
        let mut resources = SceneResources::new();

        let mesh_shader = resources.add_shader(Shader::new(device, ShaderKind::Mesh)?);
        let ground_shader =
            resources.add_shader(Shader::new(device, ShaderKind::InfiniteGround)?);
        let shadow_shader = resources.add_shader(Shader::new(device, ShaderKind::Shadow)?);
        let environment_shader =
            resources.add_shader(Shader::new(device, ShaderKind::Environment)?);

        let environment_map =
            resources.add_cube_map(CubeMap::load(device, &config.environment_faces));

        let mut objects = Vec::new();

        let avatar_texture = resources.add_texture(Texture::load(device, &config.avatar_texture));
        let avatar_material = resources.add_material(
            Material::new(
                mesh_shader,
                config.ambient,
                config.diffuse,
                config.specular,
                config.shininess,
            )
            .with_texture(avatar_texture)
            .with_environment(environment_map),
        );
        let avatar_buffers = import::import(&config.avatar_mesh)?;
        let avatar_geometry =
            resources.add_geometry(Geometry::imported(device, &avatar_buffers, "avatar"));
        let avatar_mesh = resources.add_mesh(Mesh {
            geometry: avatar_geometry,
            material: avatar_material,
        });
        objects.push(Object::avatar(
            avatar_mesh,
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::splat(0.05),
            -60.0,
        ));

        let scenery_texture =
            resources.add_texture(Texture::load(device, &config.scenery_texture));
        let scenery_material = resources.add_material(
            Material::new(
                mesh_shader,
                config.ambient,
                config.diffuse,
                config.specular,
                config.shininess,
            )
            .with_texture(scenery_texture),
        );
        let scenery_buffers = import::import(&config.scenery_mesh)?;
        let scenery_geometry =
            resources.add_geometry(Geometry::imported(device, &scenery_buffers, "scenery"));
        let scenery_mesh = resources.add_mesh(Mesh {
            geometry: scenery_geometry,
            material: scenery_material,
        });
        objects.push(Object::scenery(
            scenery_mesh,
            Vec3::new(-0.5, -0.5, -0.1),
            Vec3::splat(0.015),
            -60.0,
        ));

        let environment = Environment::new(device, environment_shader, environment_map);

        // The ground stays last in the object list: the shadow pass walks
        // everything before it, so the ground never casts onto itself.
        let ground_texture = resources.add_texture(Texture::load(device, &config.ground_texture));
        let ground_material = resources.add_material(
            Material::new(
                ground_shader,
                config.ambient,
                config.diffuse,
                config.specular,
                config.shininess,
            )
            .with_texture(ground_texture),
        );
        let ground_geometry = resources.add_geometry(Geometry::infinite_quad(device));
        let ground_mesh = resources.add_mesh(Mesh {
            geometry: ground_geometry,
            material: ground_material,
        });
        objects.push(Object::scenery(
            ground_mesh,
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::splat(1.0),
            0.0,
        ));

        Ok(Self {
            resources,
            objects,
            environment,
            camera: Camera::new(),
            camera_mode: CameraMode::Chase,
            light: Light::new(
                Vec3::splat(1.0),
                Vec3::splat(1.0),
                Vec4::new(0.1, 0.1, 0.1, 0.0),
            ),
            shadow_shader,
        })
    }

    pub fn avatar(&self) -> &Object {
        &self.objects[0]
    }

    /// One frame of simulation: the camera repositions first (in chase
    /// mode it reads the pose the previous frame produced), then every
    /// object applies its movement behavior.
    pub fn advance(&mut self, dt: f32, input: &InputState) {
        match self.camera_mode {
            CameraMode::Chase => {
                if let Some(avatar) = self.objects.first() {
                    self.camera.follow(avatar.position, avatar.orientation);
                }
            }
            CameraMode::Free => self.camera.free_move(dt, input),
        }
        for object in &mut self.objects {
            object.advance(dt, input);
        }
    }

    pub fn toggle_camera_mode(&mut self) {
        self.camera_mode = match self.camera_mode {
            CameraMode::Chase => CameraMode::Free,
            CameraMode::Free => CameraMode::Chase,
        };
    }

    /// One frame of submission in the fixed three-phase order.
    pub fn draw(&self, device: &mut impl RenderDevice) {
        let shadow = self.resources.shader(self.shadow_shader);
        let casters = self.objects.len().saturating_sub(1);
        for object in &self.objects[..casters] {
            object.draw_shadow(device, &self.resources, &self.camera, shadow);
        }
        for object in &self.objects {
            object.draw(device, &self.resources, &self.camera, &self.light);
        }
        self.environment.draw(device, &self.resources, &self.camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::testing::RecordingDevice;
    use crate::input::Key;

    fn test_scene(device: &mut RecordingDevice) -> Scene {
        // Paths that cannot exist: geometry imports empty and textures stay
        // unbound, which is exactly the degraded mode under test.
        let config = SceneConfig::from_asset_dir("/nonexistent-assets");
        Scene::new(device, &config).unwrap()
    }

    #[test]
    fn test_draw_order_is_shadows_then_shaded_then_backdrop() {
        let mut device = RecordingDevice::new();
        let scene = test_scene(&mut device);
        scene.draw(&mut device);

        let draws = device.draws();
        let programs: Vec<&str> = draws.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            programs,
            vec![
                "shadow",
                "shadow",
                "mesh",
                "mesh",
                "infinite_ground",
                "environment",
            ]
        );

        // The shadow pass covers exactly the non-ground objects, in order.
        assert_eq!(draws[0].1, "avatar");
        assert_eq!(draws[1].1, "scenery");
        assert_eq!(draws[5].1, "environment backdrop");
    }

    #[test]
    fn test_advance_moves_only_the_avatar() {
        let mut device = RecordingDevice::new();
        let mut scene = test_scene(&mut device);
        let scenery_before = scene.objects[1].position;

        let mut input = InputState::new();
        input.set(Key::Forward, true);
        scene.advance(0.25, &input);

        assert!(scene.avatar().position.x != 0.0);
        assert_eq!(scene.objects[1].position, scenery_before);
    }

    #[test]
    fn test_chase_camera_reads_pre_move_pose() {
        let mut device = RecordingDevice::new();
        let mut scene = test_scene(&mut device);

        let mut input = InputState::new();
        input.set(Key::Forward, true);
        scene.advance(1.0, &input);

        // The camera used the avatar pose from before this frame's move:
        // position (0,-1,0), yaw -60 degrees.
        let expected_eye = Vec3::new(0.0, -1.0, 0.0)
            + Vec3::new(
                2.0 * (-60.0f32).to_radians().cos(),
                2.0,
                2.0 * (-60.0f32).to_radians().sin(),
            );
        let eye = scene.camera.eye();
        assert!((eye.x - expected_eye.x).abs() < 1e-5);
        assert!((eye.y - expected_eye.y).abs() < 1e-5);
        assert!((eye.z - expected_eye.z).abs() < 1e-5);
    }

    #[test]
    fn test_scene_counts() {
        let mut device = RecordingDevice::new();
        let scene = test_scene(&mut device);
        // Empty imports contribute nothing; the two quads remain.
        assert_eq!(scene.resources.triangle_count(), 4);
    }
}
