//! Pipeline state derivation for the wgpu device.
//!
//! Each draw resolves to a pipeline keyed by program, vertex layout,
//! primitive topology and the geometry's depth/blend flags; pipelines are
//! built on first use and cached for the device's lifetime.

use crate::gfx::device::{Topology, VertexLayout};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: u32,
    pub layout: VertexLayout,
    pub topology: wgpu::PrimitiveTopology,
    pub depth_test: bool,
    pub blend: bool,
}

/// Fans have no native topology here; they are drawn as indexed lists.
pub(crate) fn native_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::TriangleList | Topology::TriangleFan => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// Index buffer contents that unroll a fan into a triangle list.
pub(crate) fn fan_indices(vertex_count: usize) -> Vec<u32> {
    let mut indices = Vec::new();
    for i in 1..vertex_count.saturating_sub(1) as u32 {
        indices.extend_from_slice(&[0, i, i + 1]);
    }
    indices
}

const POSITION3: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const POSITION4: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];
const TEXCOORD: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];
const NORMAL: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

/// One buffer per attribute stream, matching the submission contract's
/// slot assignment (0 position, 1 texcoord, 2 normal).
pub(crate) fn vertex_buffer_layouts(layout: VertexLayout) -> Vec<wgpu::VertexBufferLayout<'static>> {
    let position = wgpu::VertexBufferLayout {
        array_stride: (layout.position_components() * 4) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: if layout.position_components() == 3 {
            &POSITION3
        } else {
            &POSITION4
        },
    };
    let mut buffers = vec![position];
    if layout.has_texcoords() {
        buffers.push(wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEXCOORD,
        });
        buffers.push(wgpu::VertexBufferLayout {
            array_stride: 12,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL,
        });
    }
    buffers
}

pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    pipeline_layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    let buffers = vertex_buffer_layouts(key.layout);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: if key.blend {
                    Some(wgpu::BlendState::ALPHA_BLENDING)
                } else {
                    Some(wgpu::BlendState::REPLACE)
                },
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: key.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        // The depth attachment is always present; "depth test off" keeps
        // writing disabled and lets every fragment pass.
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: key.depth_test,
            depth_compare: if key.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_unrolls_around_first_vertex() {
        assert_eq!(fan_indices(6), vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 5]);
        assert_eq!(fan_indices(3), vec![0, 1, 2]);
        assert!(fan_indices(2).is_empty());
    }

    #[test]
    fn test_vertex_streams_per_layout() {
        assert_eq!(
            vertex_buffer_layouts(VertexLayout::Position3TexcoordNormal).len(),
            3
        );
        assert_eq!(vertex_buffer_layouts(VertexLayout::Position4).len(), 1);
    }
}
