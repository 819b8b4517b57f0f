//! GPU texture creation for the wgpu device.

use wgpu::util::DeviceExt;

use crate::gfx::device::ImageData;

use super::pipelines::DEPTH_FORMAT;

/// A texture plus the view the bind groups reference. The texture is kept
/// alongside the view so the pairing stays visible at teardown.
pub(crate) struct GpuTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

pub(crate) fn create_texture_2d(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &ImageData,
    label: &str,
) -> GpuTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        // There is no packed 24-bit format; 3-channel data widens here.
        &image.to_rgba(),
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

/// Uploads six equally-sized faces as one cube texture, layer-major in
/// +X, -X, +Y, -Y, +Z, -Z order.
pub(crate) fn create_texture_cube(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    faces: &[ImageData; 6],
    label: &str,
) -> GpuTexture {
    debug_assert!(
        faces
            .iter()
            .all(|f| f.width == faces[0].width && f.height == faces[0].height),
        "cube faces must share one size"
    );

    let mut pixels = Vec::new();
    for face in faces {
        pixels.extend_from_slice(&face.to_rgba());
    }

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: faces[0].width,
                height: faces[0].height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &pixels,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    GpuTexture {
        _texture: texture,
        view,
    }
}

/// Single white texel, substituted wherever a program samples a unit
/// nothing is bound to, so a missing asset renders untextured.
pub(crate) fn fallback_2d(device: &wgpu::Device, queue: &wgpu::Queue) -> GpuTexture {
    let white = ImageData {
        pixels: vec![0xff; 4],
        width: 1,
        height: 1,
        channels: 4,
    };
    create_texture_2d(device, queue, &white, "fallback texel")
}

pub(crate) fn fallback_cube(device: &wgpu::Device, queue: &wgpu::Queue) -> GpuTexture {
    let white = ImageData {
        pixels: vec![0xff; 4],
        width: 1,
        height: 1,
        channels: 4,
    };
    let faces = [
        white.clone(),
        white.clone(),
        white.clone(),
        white.clone(),
        white.clone(),
        white,
    ];
    create_texture_cube(device, queue, &faces, "fallback cube")
}

pub(crate) fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth buffer"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
