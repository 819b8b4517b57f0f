//! 2D and cube-map textures.
//!
//! Decoding goes through the `image` crate; what the device sees is only
//! the raw pixel contract (bytes + dimensions + channel count). A file that
//! fails to decode leaves the texture unbound: `bind` becomes a no-op and
//! the affected surface renders with the device's fallback texel instead of
//! aborting.

use std::path::Path;

use log::warn;

use crate::gfx::device::{
    CubeMapHandle, ImageData, RenderDevice, TextureHandle, TEXTURE_UNIT_2D, TEXTURE_UNIT_CUBE,
};

fn decode(path: &Path) -> Option<ImageData> {
    let decoded = match image::open(path) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("texture {} not decoded ({err}), leaving unbound", path.display());
            return None;
        }
    };
    let width = decoded.width();
    let height = decoded.height();
    match decoded {
        image::DynamicImage::ImageRgb8(pixels) => Some(ImageData {
            pixels: pixels.into_raw(),
            width,
            height,
            channels: 3,
        }),
        other => Some(ImageData {
            pixels: other.to_rgba8().into_raw(),
            width,
            height,
            channels: 4,
        }),
    }
}

/// A 2D texture bound to the shared 2D sampler unit.
#[derive(Debug, Clone, Copy)]
pub struct Texture {
    handle: Option<TextureHandle>,
}

impl Texture {
    pub fn load(device: &mut impl RenderDevice, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let handle =
            decode(path).map(|image| device.create_texture_2d(&image, &path.display().to_string()));
        Self { handle }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// No-op when the texture never loaded.
    pub fn bind(&self, device: &mut impl RenderDevice) {
        if let Some(handle) = self.handle {
            device.bind_texture_2d(TEXTURE_UNIT_2D, handle);
        }
    }
}

/// A cube map bound to the shared cube sampler unit.
#[derive(Debug, Clone, Copy)]
pub struct CubeMap {
    handle: Option<CubeMapHandle>,
}

impl CubeMap {
    /// Loads six faces in +X, -X, +Y, -Y, +Z, -Z order. All six must
    /// decode; otherwise the map stays unbound.
    pub fn load<P: AsRef<Path>>(device: &mut impl RenderDevice, paths: &[P; 6]) -> Self {
        let mut faces = Vec::with_capacity(6);
        for path in paths {
            match decode(path.as_ref()) {
                Some(face) => faces.push(face),
                None => return Self { handle: None },
            }
        }
        let faces: [ImageData; 6] = faces.try_into().expect("collected exactly six faces");
        Self {
            handle: Some(device.create_texture_cube(&faces, "environment cube")),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn bind(&self, device: &mut impl RenderDevice) {
        if let Some(handle) = self.handle {
            device.bind_texture_cube(TEXTURE_UNIT_CUBE, handle);
        }
    }
}
