//! wgpu implementation of the graphics submission contract.
//!
//! Named uniforms are emulated over wgpu's block model: every program
//! declares its uniform table (name, offset, kind), setters write into a
//! CPU-side staging block, and each draw copies the block into a slot of a
//! per-program ring buffer bound with a dynamic offset. Rings reset at
//! frame start, so any number of draws per program per frame keep their own
//! values.

use std::collections::HashMap;
use std::num::NonZeroU64;

use log::{debug, warn};
use wgpu::util::DeviceExt;

use crate::gfx::device::{
    CubeMapHandle, DeviceError, GeometryDesc, GeometryHandle, ImageData, ProgramDesc,
    ProgramHandle, RenderDevice, SamplerDim, TextureHandle, Topology, UniformDecl, UniformKind,
    VertexLayout,
};
use crate::math::{Mat4, Vec3, Vec4};

use super::gpu_textures::{
    create_depth_view, create_texture_2d, create_texture_cube, fallback_2d, fallback_cube,
    GpuTexture,
};
use super::pipelines::{build_pipeline, fan_indices, native_topology, PipelineKey};

/// wgpu's required alignment for dynamic uniform offsets.
const UNIFORM_STRIDE_ALIGN: u32 = 256;
/// Ring slots allocated up front per program; rings grow if a frame
/// submits more draws than this.
const INITIAL_RING_SLOTS: u32 = 64;
/// Texture units addressable through the contract.
const TEXTURE_UNITS: usize = 4;

struct GeometryEntry {
    positions: wgpu::Buffer,
    texcoords: Option<wgpu::Buffer>,
    normals: Option<wgpu::Buffer>,
    /// Present for fan geometry, which draws as an indexed list.
    indices: Option<(wgpu::Buffer, u32)>,
    vertex_count: u32,
    layout: VertexLayout,
    topology: wgpu::PrimitiveTopology,
    depth_test: bool,
    blend: bool,
}

struct ProgramEntry {
    label: String,
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniforms: Vec<UniformDecl>,
    uniform_bytes: usize,
    textures: Vec<crate::gfx::device::TextureSlot>,
    /// Current uniform block values; zeroed at creation, so a skipped
    /// upload reads as zero on first use.
    staging: Vec<u8>,
    ring: wgpu::Buffer,
    ring_slots: u32,
    ring_used: u32,
}

impl ProgramEntry {
    fn ring_stride(&self) -> u32 {
        (self.uniform_bytes as u32).div_ceil(UNIFORM_STRIDE_ALIGN) * UNIFORM_STRIDE_ALIGN
    }
}

struct FrameState {
    surface_texture: wgpu::SurfaceTexture,
    encoder: wgpu::CommandEncoder,
    pass: wgpu::RenderPass<'static>,
}

pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,

    geometries: Vec<GeometryEntry>,
    programs: Vec<ProgramEntry>,
    textures_2d: Vec<GpuTexture>,
    cube_maps: Vec<GpuTexture>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    sampler_2d: wgpu::Sampler,
    sampler_cube: wgpu::Sampler,
    fallback_2d: GpuTexture,
    fallback_cube: GpuTexture,

    bound_2d: [Option<TextureHandle>; TEXTURE_UNITS],
    bound_cube: [Option<CubeMapHandle>; TEXTURE_UNITS],
    current_program: Option<ProgramHandle>,
    frame: Option<FrameState>,
}

impl WgpuDevice {
    /// Initializes wgpu against the given window surface.
    ///
    /// # Panics
    /// Panics if no adapter or device is available; there is nothing to
    /// degrade to without a GPU.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> WgpuDevice {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .expect("Failed to create surface!");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request a device!");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let sampler_2d = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("2d sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let sampler_cube = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cube sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let fallback_2d = fallback_2d(&device, &queue);
        let fallback_cube = fallback_cube(&device, &queue);

        WgpuDevice {
            surface,
            device,
            queue,
            config,
            depth_view,
            geometries: Vec::new(),
            programs: Vec::new(),
            textures_2d: Vec::new(),
            cube_maps: Vec::new(),
            pipelines: HashMap::new(),
            sampler_2d,
            sampler_cube,
            fallback_2d,
            fallback_cube,
            bound_2d: [None; TEXTURE_UNITS],
            bound_cube: [None; TEXTURE_UNITS],
            current_program: None,
            frame: None,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    /// Acquires the next surface texture and opens the frame's render pass.
    /// Returns false when no frame can be produced (the caller skips
    /// drawing); a lost or outdated surface reconfigures and retries once.
    pub fn begin_frame(&mut self, clear: [f64; 4]) -> bool {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                match self.surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(err) => {
                        warn!("skipping frame, surface unavailable: {err}");
                        return false;
                    }
                }
            }
            Err(err) => {
                warn!("skipping frame, surface unavailable: {err}");
                return false;
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0],
                            g: clear[1],
                            b: clear[2],
                            a: clear[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        for program in &mut self.programs {
            program.ring_used = 0;
        }

        self.frame = Some(FrameState {
            surface_texture,
            encoder,
            pass,
        });
        true
    }

    /// Closes the frame's pass, submits the command buffer and presents.
    pub fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        let FrameState {
            surface_texture,
            encoder,
            pass,
        } = frame;
        drop(pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    fn create_buffer(&self, label: &str, contents: &[f32]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(contents),
                usage: wgpu::BufferUsages::VERTEX,
            })
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let entry = &self.programs[key.program as usize];
        let pipeline = build_pipeline(
            &self.device,
            &entry.label,
            &entry.module,
            &entry.pipeline_layout,
            self.config.format,
            &key,
        );
        self.pipelines.insert(key, pipeline);
    }

    /// Grows the program's uniform ring when a frame outruns it.
    fn ensure_ring_slot(&mut self, program: usize) {
        let entry = &mut self.programs[program];
        if entry.ring_used < entry.ring_slots {
            return;
        }
        entry.ring_slots *= 2;
        entry.ring = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} uniform ring", entry.label)),
            size: entry.ring_stride() as u64 * entry.ring_slots as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        debug!(
            "uniform ring for `{}` grown to {} slots",
            entry.label, entry.ring_slots
        );
    }

    fn write_uniform(&mut self, program: ProgramHandle, name: &str, kind: UniformKind, bytes: &[u8]) {
        let entry = &mut self.programs[program.0 as usize];
        match entry.uniforms.iter().find(|u| u.name == name) {
            Some(decl) if decl.kind == kind => {
                entry.staging[decl.offset..decl.offset + bytes.len()].copy_from_slice(bytes);
            }
            Some(decl) => debug!(
                "uniform `{name}` in `{}` declared as {:?}, upload skipped",
                entry.label, decl.kind
            ),
            None => debug!("uniform `{name}` cannot be set in `{}`", entry.label),
        }
    }
}

impl RenderDevice for WgpuDevice {
    fn create_geometry(&mut self, desc: &GeometryDesc) -> GeometryHandle {
        let vertex_count = desc.vertex_count() as u32;
        let positions = self.create_buffer(desc.label, desc.positions);
        let texcoords = desc
            .layout
            .has_texcoords()
            .then(|| self.create_buffer(desc.label, desc.texcoords));
        let normals = desc
            .layout
            .has_texcoords()
            .then(|| self.create_buffer(desc.label, desc.normals));

        let indices = if desc.topology == Topology::TriangleFan {
            let indices = fan_indices(vertex_count as usize);
            let buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(desc.label),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            Some((buffer, indices.len() as u32))
        } else {
            None
        };

        self.geometries.push(GeometryEntry {
            positions,
            texcoords,
            normals,
            indices,
            vertex_count,
            layout: desc.layout,
            topology: native_topology(desc.topology),
            depth_test: desc.depth_test,
            blend: desc.blend,
        });
        GeometryHandle(self.geometries.len() as u32 - 1)
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, DeviceError> {
        // Shader build errors are asynchronous in wgpu; an error scope
        // turns them into the one fatal error class of the contract.
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(DeviceError::ProgramBuild {
                label: desc.label.to_string(),
                message: error.to_string(),
            });
        }

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(desc.uniform_bytes as u64),
            },
            count: None,
        }];
        for (i, slot) in desc.textures.iter().enumerate() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + 2 * i as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: match slot.dim {
                        SamplerDim::D2 => wgpu::TextureViewDimension::D2,
                        SamplerDim::Cube => wgpu::TextureViewDimension::Cube,
                    },
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + 2 * i as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(desc.label),
                    entries: &entries,
                });
        let pipeline_layout =
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(desc.label),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

        let stride =
            (desc.uniform_bytes as u32).div_ceil(UNIFORM_STRIDE_ALIGN) * UNIFORM_STRIDE_ALIGN;
        let ring = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} uniform ring", desc.label)),
            size: stride as u64 * INITIAL_RING_SLOTS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.programs.push(ProgramEntry {
            label: desc.label.to_string(),
            module,
            bind_group_layout,
            pipeline_layout,
            uniforms: desc.uniforms.to_vec(),
            uniform_bytes: desc.uniform_bytes,
            textures: desc.textures.to_vec(),
            staging: vec![0u8; desc.uniform_bytes],
            ring,
            ring_slots: INITIAL_RING_SLOTS,
            ring_used: 0,
        });
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn create_texture_2d(&mut self, image: &ImageData, label: &str) -> TextureHandle {
        self.textures_2d
            .push(create_texture_2d(&self.device, &self.queue, image, label));
        TextureHandle(self.textures_2d.len() as u32 - 1)
    }

    fn create_texture_cube(&mut self, faces: &[ImageData; 6], label: &str) -> CubeMapHandle {
        self.cube_maps
            .push(create_texture_cube(&self.device, &self.queue, faces, label));
        CubeMapHandle(self.cube_maps.len() as u32 - 1)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = Some(program);
    }

    fn set_mat4(&mut self, program: ProgramHandle, name: &str, value: Mat4) {
        let data = value.to_array();
        self.write_uniform(program, name, UniformKind::Mat4, bytemuck::cast_slice(&data));
    }

    fn set_vec3(&mut self, program: ProgramHandle, name: &str, value: Vec3) {
        let data = [value.x, value.y, value.z];
        self.write_uniform(program, name, UniformKind::Vec3, bytemuck::cast_slice(&data));
    }

    fn set_vec4(&mut self, program: ProgramHandle, name: &str, value: Vec4) {
        let data = value.to_array();
        self.write_uniform(program, name, UniformKind::Vec4, bytemuck::cast_slice(&data));
    }

    fn set_f32(&mut self, program: ProgramHandle, name: &str, value: f32) {
        self.write_uniform(program, name, UniformKind::F32, bytemuck::bytes_of(&value));
    }

    fn set_u32(&mut self, program: ProgramHandle, name: &str, value: u32) {
        self.write_uniform(program, name, UniformKind::U32, bytemuck::bytes_of(&value));
    }

    fn bind_texture_2d(&mut self, unit: u32, texture: TextureHandle) {
        self.bound_2d[unit as usize] = Some(texture);
    }

    fn bind_texture_cube(&mut self, unit: u32, texture: CubeMapHandle) {
        self.bound_cube[unit as usize] = Some(texture);
    }

    fn draw(&mut self, geometry: GeometryHandle) {
        let Some(program) = self.current_program else {
            warn!("draw submitted with no program in use");
            return;
        };
        if self.frame.is_none() {
            warn!("draw submitted outside a frame");
            return;
        }

        let geometry_index = geometry.0 as usize;
        let program_index = program.0 as usize;

        let key = {
            let geom = &self.geometries[geometry_index];
            PipelineKey {
                program: program.0,
                layout: geom.layout,
                topology: geom.topology,
                depth_test: geom.depth_test,
                blend: geom.blend,
            }
        };
        self.ensure_pipeline(key);
        self.ensure_ring_slot(program_index);

        let dynamic_offset = {
            let entry = &mut self.programs[program_index];
            let offset = entry.ring_used * entry.ring_stride();
            entry.ring_used += 1;
            offset
        };

        let entry = &self.programs[program_index];
        self.queue
            .write_buffer(&entry.ring, dynamic_offset as u64, &entry.staging);

        let mut bind_entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &entry.ring,
                offset: 0,
                size: NonZeroU64::new(entry.uniform_bytes as u64),
            }),
        }];
        for (i, slot) in entry.textures.iter().enumerate() {
            let (view, sampler) = match slot.dim {
                SamplerDim::D2 => (
                    self.bound_2d[slot.unit as usize]
                        .map(|h| &self.textures_2d[h.0 as usize].view)
                        .unwrap_or(&self.fallback_2d.view),
                    &self.sampler_2d,
                ),
                SamplerDim::Cube => (
                    self.bound_cube[slot.unit as usize]
                        .map(|h| &self.cube_maps[h.0 as usize].view)
                        .unwrap_or(&self.fallback_cube.view),
                    &self.sampler_cube,
                ),
            };
            bind_entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
            bind_entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * i as u32,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&entry.label),
            layout: &entry.bind_group_layout,
            entries: &bind_entries,
        });

        let geom = &self.geometries[geometry_index];
        let pipeline = &self.pipelines[&key];
        let frame = self.frame.as_mut().expect("frame checked above");
        let pass = &mut frame.pass;

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[dynamic_offset]);
        pass.set_vertex_buffer(0, geom.positions.slice(..));
        if let Some(texcoords) = &geom.texcoords {
            pass.set_vertex_buffer(1, texcoords.slice(..));
        }
        if let Some(normals) = &geom.normals {
            pass.set_vertex_buffer(2, normals.slice(..));
        }
        match &geom.indices {
            Some((buffer, count)) => {
                pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*count, 0, 0..1);
            }
            None => pass.draw(0..geom.vertex_count, 0..1),
        }
    }
}
