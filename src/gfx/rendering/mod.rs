//! wgpu backend for the graphics submission contract.

pub mod gpu_textures;
pub mod pipelines;
pub mod wgpu_device;

pub use wgpu_device::WgpuDevice;
