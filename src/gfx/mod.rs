//! Graphics: the submission contract, shading resources, and the camera.
//!
//! The modules here split along the ownership boundary the scene relies
//! on: [`device`] defines what a backend must provide, [`rendering`] is
//! the wgpu implementation of it, and everything else is backend-agnostic
//! resource state addressed through [`resources`] handles.

pub mod camera;
pub mod device;
pub mod geometry;
pub mod light;
pub mod material;
pub mod rendering;
pub mod resources;
pub mod shader;
pub mod texture;

pub use camera::Camera;
pub use device::RenderDevice;
pub use light::Light;
pub use rendering::WgpuDevice;
