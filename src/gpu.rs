//! wgpu backend for the gallery.
//!
//! One pipeline and one subdivided plane are shared by every tile; each tile
//! owns a uniform buffer and a bind group, and each playlist entry owns one
//! texture that all of its repeats sample. Until an image arrives its tiles
//! sample a 1x1 transparent texture and draw with zero opacity.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use palette::{LinSrgb, Srgb};
use tracing::{debug, error, info, warn};
use wgpu::SurfaceError;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::engine::{SceneFrame, SceneRenderer};
use crate::loader::LoadedImage;

const PLANE_WIDTH_SEGMENTS: u32 = 100;
const PLANE_HEIGHT_SEGMENTS: u32 = 50;

/// Surface-level options that are not part of the gallery behaviour.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub background: [u8; 3],
    pub max_texture_dim: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
            max_texture_dim: 2048,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 3],
    uv: [f32; 2],
}

impl Vertex {
    fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRS: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}

// Matches `TileUniforms` in shaders/tile.wgsl (96 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct TileUniforms {
    mvp: [[f32; 4]; 4],
    plane_size: [f32; 2],
    image_size: [f32; 2],
    time: f32,
    speed: f32,
    border_radius: f32,
    opacity: f32,
}

/// Unit plane centred on the origin, subdivided so the ripple has vertices to move.
fn build_plane(width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            vertices.push(Vertex {
                pos: [u - 0.5, 0.5 - v, 0.0],
                uv: [u, v],
            });
        }
    }

    let row = width_segments + 1;
    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix;
            let b = a + row;
            indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }
    (vertices, indices)
}

struct PlaneMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct TileResources {
    media_index: usize,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// One decoded playlist entry, shared by every tile that repeats it.
struct MediaTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    plane: PlaneMesh,
    blank: wgpu::TextureView,
    media: HashMap<usize, MediaTexture>,
    tiles: Vec<TileResources>,
}

pub struct GpuRenderer {
    window: Arc<Window>,
    background: wgpu::Color,
    state: Option<GpuState>,
}

impl GpuRenderer {
    pub fn new(window: Arc<Window>, options: &RenderOptions) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter found")?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("gallery-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .context("failed to acquire GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let Some(&fallback_format) = caps.formats.first() else {
            bail!("surface reports no supported formats");
        };
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .unwrap_or(fallback_format);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            "gallery surface configured"
        );

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tile-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tile-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/tile.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tile-pipeline-layout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tile-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tile-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let (vertices, indices) = build_plane(PLANE_WIDTH_SEGMENTS, PLANE_HEIGHT_SEGMENTS);
        let plane = PlaneMesh {
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("plane-vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("plane-indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: indices.len() as u32,
        };

        let (_, blank) = upload_texture(&device, &queue, &[0, 0, 0, 0], 1, 1);

        Ok(Self {
            window,
            background: to_wgpu_color(options.background),
            state: Some(GpuState {
                surface,
                device,
                queue,
                config,
                pipeline,
                bind_layout,
                sampler,
                plane,
                blank,
                media: HashMap::new(),
                tiles: Vec::new(),
            }),
        })
    }

    pub fn is_released(&self) -> bool {
        self.state.is_none()
    }
}

impl GpuState {
    fn bind_group(&self, uniforms: &wgpu::Buffer, view: &wgpu::TextureView) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tile-bind-group"),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl SceneRenderer for GpuRenderer {
    fn prepare_tiles(&mut self, media: &[usize]) {
        let Some(gpu) = self.state.as_mut() else {
            return;
        };
        let tiles = media
            .iter()
            .map(|&media_index| {
                let uniforms = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("tile-uniforms"),
                    size: std::mem::size_of::<TileUniforms>() as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let view = gpu
                    .media
                    .get(&media_index)
                    .map_or(&gpu.blank, |texture| &texture.view);
                let bind_group = gpu.bind_group(&uniforms, view);
                TileResources {
                    media_index,
                    uniforms,
                    bind_group,
                }
            })
            .collect();
        gpu.tiles = tiles;
    }

    fn upload_image(&mut self, image: &LoadedImage) {
        let Some(gpu) = self.state.as_mut() else {
            return;
        };
        let expected = image.width as usize * image.height as usize * 4;
        if image.width == 0 || image.height == 0 || image.pixels.len() != expected {
            warn!(
                media = image.media_index,
                width = image.width,
                height = image.height,
                bytes = image.pixels.len(),
                "discarding malformed image"
            );
            return;
        }
        let (texture, view) = upload_texture(
            &gpu.device,
            &gpu.queue,
            &image.pixels,
            image.width,
            image.height,
        );
        let rebound: Vec<wgpu::BindGroup> = gpu
            .tiles
            .iter()
            .filter(|tile| tile.media_index == image.media_index)
            .map(|tile| gpu.bind_group(&tile.uniforms, &view))
            .collect();
        for (tile, bind_group) in gpu
            .tiles
            .iter_mut()
            .filter(|tile| tile.media_index == image.media_index)
            .zip(rebound)
        {
            tile.bind_group = bind_group;
        }
        gpu.media.insert(
            image.media_index,
            MediaTexture {
                _texture: texture,
                view,
            },
        );
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(gpu) = self.state.as_mut() else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }
        gpu.config.width = width;
        gpu.config.height = height;
        gpu.reconfigure();
        debug!(width, height, "gallery surface resized");
    }

    fn render(&mut self, frame: &SceneFrame<'_>) -> Result<()> {
        let Some(gpu) = self.state.as_mut() else {
            return Ok(());
        };

        let target = match gpu.surface.get_current_texture() {
            Ok(target) => target,
            Err(SurfaceError::Outdated) | Err(SurfaceError::Lost) => {
                info!("gallery surface lost; reconfiguring");
                let size = self.window.inner_size();
                gpu.config.width = size.width.max(1);
                gpu.config.height = size.height.max(1);
                gpu.reconfigure();
                return Ok(());
            }
            Err(SurfaceError::Timeout) => {
                warn!("gallery surface acquisition timed out");
                return Ok(());
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("gallery surface out of memory");
                bail!("surface out of memory");
            }
            Err(SurfaceError::Other) => {
                warn!("gallery surface reported an unknown error; reconfiguring");
                gpu.reconfigure();
                return Ok(());
            }
        };

        for (tile, resources) in frame.tiles.iter().zip(&gpu.tiles) {
            let params = tile.shader_params();
            let uniforms = TileUniforms {
                mvp: (frame.view_projection * tile.model_matrix()).to_cols_array_2d(),
                plane_size: params.plane_size,
                image_size: params.image_size,
                time: params.time,
                speed: params.speed,
                border_radius: frame.border_radius,
                opacity: if params.loaded { 1.0 } else { 0.0 },
            };
            gpu.queue
                .write_buffer(&resources.uniforms, 0, bytemuck::bytes_of(&uniforms));
        }

        let view = target
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gallery-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gallery-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&gpu.pipeline);
            pass.set_vertex_buffer(0, gpu.plane.vertex_buffer.slice(..));
            pass.set_index_buffer(gpu.plane.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            for resources in gpu.tiles.iter().take(frame.tiles.len()) {
                pass.set_bind_group(0, &resources.bind_group, &[]);
                pass.draw_indexed(0..gpu.plane.index_count, 0, 0..1);
            }
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        target.present();
        Ok(())
    }

    fn release(&mut self) {
        if let Some(gpu) = self.state.take() {
            let tiles = gpu.tiles.len();
            drop(gpu);
            info!(tiles, "gallery GPU resources released");
        }
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    w: u32,
    h: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width: w,
        height: h,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("tile-image"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        texture.as_image_copy(),
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn to_wgpu_color(rgb: [u8; 3]) -> wgpu::Color {
    let linear: LinSrgb<f32> = Srgb::new(rgb[0], rgb[1], rgb[2]).into_linear();
    wgpu::Color {
        r: f64::from(linear.red),
        g: f64::from(linear.green),
        b: f64::from(linear.blue),
        a: 1.0,
    }
}
