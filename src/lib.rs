//! Gorse, a small real-time 3D scene renderer.
//!
//! Loads polygonal meshes and textures, places them in a flat scene, and
//! renders them with per-pixel Phong lighting, planar ground shadows, and a
//! reflective environment cube map under a chase camera. Built on wgpu and
//! winit; the renderer core talks to the GPU only through the submission
//! contract in [`gfx::device`], so it tests without one.

pub mod app;
pub mod gfx;
pub mod import;
pub mod input;
pub mod math;
pub mod scene;

pub use app::{App, WindowConfig};
pub use scene::{Scene, SceneConfig};

/// Creates an application with default window and scene configuration.
pub fn default() -> App {
    App::new(WindowConfig::default(), SceneConfig::default())
}
