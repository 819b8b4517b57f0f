//! Environment backdrop: a full-screen quad sampling the cube map.

use crate::gfx::camera::Camera;
use crate::gfx::device::{GeometryDesc, GeometryHandle, RenderDevice, Topology, VertexLayout};
use crate::gfx::resources::{CubeMapId, SceneResources, ShaderId};

/// Drawn last every frame; its shader pins depth to the far clip boundary,
/// so it fills whatever the scene geometry left uncovered.
pub struct Environment {
    geometry: GeometryHandle,
    shader: ShaderId,
    cube_map: CubeMapId,
}

impl Environment {
    pub(crate) fn new(
        device: &mut impl RenderDevice,
        shader: ShaderId,
        cube_map: CubeMapId,
    ) -> Self {
        #[rustfmt::skip]
        const POSITIONS: [f32; 16] = [
            -1.0, -1.0, 0.0, 1.0,
             1.0, -1.0, 0.0, 1.0,
            -1.0,  1.0, 0.0, 1.0,
             1.0,  1.0, 0.0, 1.0,
        ];
        let geometry = device.create_geometry(&GeometryDesc {
            label: "environment backdrop",
            layout: VertexLayout::Position4,
            topology: Topology::TriangleStrip,
            positions: &POSITIONS,
            texcoords: &[],
            normals: &[],
            depth_test: true,
            blend: true,
        });
        Self {
            geometry,
            shader,
            cube_map,
        }
    }

    pub(crate) fn draw(
        &self,
        device: &mut impl RenderDevice,
        resources: &SceneResources,
        camera: &Camera,
    ) {
        let shader = resources.shader(self.shader);
        shader.run(device);
        resources.cube_map(self.cube_map).bind(device);
        shader.upload_view_dir_matrix(device, camera.view_dir_matrix());
        device.draw(self.geometry);
    }
}
