//! Drawable geometry variants.
//!
//! Vertex data is uploaded in full at construction; drawing submits the
//! stored handle with whatever program is current. The closed set covers
//! the three shapes the scene composes from: imported triangle soup, a
//! finite textured quad, and the infinite ground quad whose rim vertices
//! sit at infinity (`w = 0`).

use crate::gfx::device::{GeometryDesc, GeometryHandle, RenderDevice, Topology, VertexLayout};
use crate::import::TriangleBuffers;

#[derive(Debug, Clone, Copy)]
pub enum Geometry {
    /// Triangle soup from the mesh importer.
    Imported {
        handle: GeometryHandle,
        triangles: usize,
    },
    /// A 2x2 quad in the XZ plane with tiled texcoords, drawn as a strip.
    TexturedQuad { handle: GeometryHandle },
    /// A fan around the origin whose rim extends to infinity, covering the
    /// whole ground plane in four triangles.
    InfiniteQuad { handle: GeometryHandle },
}

impl Geometry {
    pub fn imported(
        device: &mut impl RenderDevice,
        buffers: &TriangleBuffers,
        label: &str,
    ) -> Self {
        let handle = device.create_geometry(&GeometryDesc {
            label,
            layout: VertexLayout::Position3TexcoordNormal,
            topology: Topology::TriangleList,
            positions: &buffers.positions,
            texcoords: &buffers.texcoords,
            normals: &buffers.normals,
            depth_test: true,
            blend: false,
        });
        Self::Imported {
            handle,
            triangles: buffers.triangle_count(),
        }
    }

    pub fn textured_quad(device: &mut impl RenderDevice) -> Self {
        #[rustfmt::skip]
        const POSITIONS: [f32; 12] = [
            -1.0, 0.0, -1.0,
             1.0, 0.0, -1.0,
            -1.0, 0.0,  1.0,
             1.0, 0.0,  1.0,
        ];
        #[rustfmt::skip]
        const TEXCOORDS: [f32; 8] = [
             0.0,  0.0,
            10.0,  0.0,
             0.0, 10.0,
            10.0, 10.0,
        ];
        #[rustfmt::skip]
        const NORMALS: [f32; 12] = [
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
        ];
        let handle = device.create_geometry(&GeometryDesc {
            label: "textured quad",
            layout: VertexLayout::Position3TexcoordNormal,
            topology: Topology::TriangleStrip,
            positions: &POSITIONS,
            texcoords: &TEXCOORDS,
            normals: &NORMALS,
            depth_test: true,
            blend: true,
        });
        Self::TexturedQuad { handle }
    }

    pub fn infinite_quad(device: &mut impl RenderDevice) -> Self {
        // Center at w=1, rim at w=0: homogeneous points at infinity. The
        // center texcoord is arbitrary since the ground shader retextures
        // from world position anyway.
        #[rustfmt::skip]
        const POSITIONS: [f32; 24] = [
             0.0, 0.0,  0.0, 1.0,
            -1.0, 0.0, -1.0, 0.0,
             1.0, 0.0, -1.0, 0.0,
             1.0, 0.0,  1.0, 0.0,
            -1.0, 0.0,  1.0, 0.0,
            -1.0, 0.0, -1.0, 0.0,
        ];
        #[rustfmt::skip]
        const TEXCOORDS: [f32; 12] = [
             5.0,  5.0,
             0.0,  0.0,
            10.0,  0.0,
            10.0, 10.0,
             0.0, 10.0,
             0.0,  0.0,
        ];
        #[rustfmt::skip]
        const NORMALS: [f32; 18] = [
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 1.0, 0.0,
        ];
        let handle = device.create_geometry(&GeometryDesc {
            label: "infinite quad",
            layout: VertexLayout::Position4TexcoordNormal,
            topology: Topology::TriangleFan,
            positions: &POSITIONS,
            texcoords: &TEXCOORDS,
            normals: &NORMALS,
            depth_test: true,
            blend: true,
        });
        Self::InfiniteQuad { handle }
    }

    pub fn handle(&self) -> GeometryHandle {
        match *self {
            Geometry::Imported { handle, .. }
            | Geometry::TexturedQuad { handle }
            | Geometry::InfiniteQuad { handle } => handle,
        }
    }

    pub fn triangle_count(&self) -> usize {
        match *self {
            Geometry::Imported { triangles, .. } => triangles,
            Geometry::TexturedQuad { .. } => 2,
            Geometry::InfiniteQuad { .. } => 4,
        }
    }

    pub fn draw(&self, device: &mut impl RenderDevice) {
        device.draw(self.handle());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::testing::{Call, RecordingDevice};

    #[test]
    fn test_imported_counts_triangles() {
        let mut device = RecordingDevice::new();
        let buffers = TriangleBuffers {
            positions: vec![0.0; 18],
            texcoords: vec![0.0; 12],
            normals: vec![0.0; 18],
        };
        let geometry = Geometry::imported(&mut device, &buffers, "two triangles");
        assert_eq!(geometry.triangle_count(), 2);
    }

    #[test]
    fn test_quad_variants_draw_their_handles() {
        let mut device = RecordingDevice::new();
        let quad = Geometry::textured_quad(&mut device);
        let ground = Geometry::infinite_quad(&mut device);
        assert_eq!(quad.triangle_count(), 2);
        assert_eq!(ground.triangle_count(), 4);
        assert_ne!(quad.handle(), ground.handle());

        quad.draw(&mut device);
        ground.draw(&mut device);
        assert!(matches!(device.calls[0], Call::Draw { .. }));
        assert_eq!(device.calls.len(), 2);
    }
}
