//! A positioned, oriented, scaled instance of a mesh.

use crate::gfx::camera::Camera;
use crate::gfx::device::RenderDevice;
use crate::gfx::light::Light;
use crate::gfx::resources::{MeshId, SceneResources};
use crate::gfx::shader::Shader;
use crate::input::{InputState, Key};
use crate::math::{Mat4, Vec3, Vec4};

/// Degrees per second the avatar turns while a turn key is held.
const TURN_RATE: f32 = 50.0;

/// How an object responds to per-frame input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Keyboard-driven: translates along its facing direction and yaws.
    Avatar,
    /// Placed once, never moves.
    Scenery,
}

pub struct Object {
    mesh: MeshId,
    pub position: Vec3,
    pub scaling: Vec3,
    /// Yaw around the world Y axis, in degrees.
    pub orientation: f32,
    behavior: Behavior,
}

impl Object {
    pub fn avatar(mesh: MeshId, position: Vec3, scaling: Vec3, orientation: f32) -> Self {
        Self {
            mesh,
            position,
            scaling,
            orientation,
            behavior: Behavior::Avatar,
        }
    }

    pub fn scenery(mesh: MeshId, position: Vec3, scaling: Vec3, orientation: f32) -> Self {
        Self {
            mesh,
            position,
            scaling,
            orientation,
            behavior: Behavior::Scenery,
        }
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Applies one frame of movement. Held keys compose additively; the
    /// forward direction subtracts along `(cos yaw, 0, sin yaw)`, a sign
    /// convention the chase camera offset depends on.
    pub fn advance(&mut self, dt: f32, input: &InputState) {
        match self.behavior {
            Behavior::Scenery => {}
            Behavior::Avatar => {
                let radians = self.orientation.to_radians();
                if input.held(Key::Forward) {
                    self.position.x -= dt * radians.cos();
                    self.position.z -= dt * radians.sin();
                }
                if input.held(Key::Backward) {
                    self.position.x += dt * radians.cos();
                    self.position.z += dt * radians.sin();
                }
                if input.held(Key::TurnLeft) {
                    self.orientation -= dt * TURN_RATE;
                }
                if input.held(Key::TurnRight) {
                    self.orientation += dt * TURN_RATE;
                }
            }
        }
    }

    /// Model matrix and its analytic inverse, built from the same
    /// position/scale/yaw so the pair stays exact.
    fn transforms(&self) -> (Mat4, Mat4) {
        let radians = self.orientation.to_radians();
        let m = Mat4::scaling(self.scaling)
            * Mat4::rotation_y(radians)
            * Mat4::translation(self.position);
        let inv = Mat4::translation(-self.position)
            * Mat4::rotation_y(-radians)
            * Mat4::scaling(Vec3::new(
                1.0 / self.scaling.x,
                1.0 / self.scaling.y,
                1.0 / self.scaling.z,
            ));
        (m, inv)
    }

    fn upload_transforms(
        &self,
        device: &mut impl RenderDevice,
        shader: &Shader,
        camera: &Camera,
    ) {
        let (m, inv_m) = self.transforms();
        let vp = camera.view_matrix() * camera.projection_matrix();
        shader.upload_model(device, m);
        shader.upload_inverse_model(device, inv_m);
        shader.upload_model_view_projection(device, m * vp);
        shader.upload_view_projection(device, vp);
    }

    pub(crate) fn draw(
        &self,
        device: &mut impl RenderDevice,
        resources: &SceneResources,
        camera: &Camera,
        light: &Light,
    ) {
        let shader = resources.mesh_shader(self.mesh);
        shader.run(device);
        self.upload_transforms(device, shader, camera);
        shader.upload_light(device, light);
        shader.upload_eye_position(device, camera.eye());

        let mesh = resources.mesh(self.mesh);
        resources.material(mesh.material).upload_attributes(device, resources);
        resources.geometry(mesh.geometry).draw(device);
    }

    /// Projects this object's geometry onto the ground plane. The
    /// projection always runs from a fixed overhead point light; the scene
    /// light is left untouched.
    pub(crate) fn draw_shadow(
        &self,
        device: &mut impl RenderDevice,
        resources: &SceneResources,
        camera: &Camera,
        shadow_shader: &Shader,
    ) {
        shadow_shader.run(device);
        self.upload_transforms(device, shadow_shader, camera);

        let overhead = Light::new(
            Vec3::splat(1.0),
            Vec3::splat(1.0),
            Vec4::new(0.0, 100.0, 0.0, 1.0),
        );
        shadow_shader.upload_light(device, &overhead);
        shadow_shader.upload_eye_position(device, camera.eye());

        let mesh = resources.mesh(self.mesh);
        resources.geometry(mesh.geometry).draw(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_object(behavior: Behavior) -> Object {
        let mesh = MeshId(0);
        match behavior {
            Behavior::Avatar => Object::avatar(mesh, Vec3::default(), Vec3::splat(1.0), 0.0),
            Behavior::Scenery => Object::scenery(mesh, Vec3::default(), Vec3::splat(1.0), 0.0),
        }
    }

    #[test]
    fn test_avatar_forward_at_zero_yaw() {
        let mut object = test_object(Behavior::Avatar);
        let mut input = InputState::new();
        input.set(Key::Forward, true);

        object.advance(1.0, &input);
        assert!((object.position.x - -1.0).abs() < 1e-6);
        assert!(object.position.z.abs() < 1e-6);
        assert!(object.position.y.abs() < 1e-6);
    }

    #[test]
    fn test_avatar_turn_rate() {
        let mut object = test_object(Behavior::Avatar);
        let mut input = InputState::new();
        input.set(Key::TurnLeft, true);

        object.advance(1.0, &input);
        assert!((object.orientation - -50.0).abs() < 1e-6);

        input.set(Key::TurnLeft, false);
        input.set(Key::TurnRight, true);
        object.advance(0.5, &input);
        assert!((object.orientation - -25.0).abs() < 1e-5);
    }

    #[test]
    fn test_held_keys_compose() {
        let mut object = test_object(Behavior::Avatar);
        let mut input = InputState::new();
        input.set(Key::Forward, true);
        input.set(Key::Backward, true);
        input.set(Key::TurnLeft, true);

        // Opposing translation keys cancel; the turn still applies.
        object.advance(1.0, &input);
        assert!(object.position.x.abs() < 1e-6);
        assert!((object.orientation - -50.0).abs() < 1e-6);
    }

    #[test]
    fn test_scenery_ignores_input() {
        let mut object = test_object(Behavior::Scenery);
        let mut input = InputState::new();
        input.set(Key::Forward, true);
        input.set(Key::TurnRight, true);

        object.advance(1.0, &input);
        assert_eq!(object.position, Vec3::default());
        assert_eq!(object.orientation, 0.0);
    }
}
