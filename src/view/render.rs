use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::*;

use crate::config::AssetSettings;
use crate::controller::actors::{ActorId, ActorList};
use crate::controller::frame_loop::FramePrograms;
use crate::error::{Error, Result};
use crate::model::{Drawable, Primitive};
use crate::utils::{MeshBuffer, Vertex};
use crate::view::backend::ProgramHandle;
use crate::view::gpu_init::GpuContext;
use crate::view::shader::{ShaderLibrary, PRIMITIVE_SHADER, SKYBOX_SHADER};
use crate::view::skybox::{CubeFaces, SkyboxTexture};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
pub const CLEAR_COLOR: Color = Color::WHITE;

/// Per-object block, laid out as the `Object` struct in primitive.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ModelUniform {
    pub fn from_drawable(drawable: &Drawable) -> Self {
        Self {
            model: drawable.transform.model_matrix().to_cols_array_2d(),
            color: drawable.color,
        }
    }
}

/// What to do when the swapchain refuses to hand out a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRecovery {
    Reconfigure,
    SkipFrame,
    Fatal,
}

impl SurfaceRecovery {
    pub fn for_error(err: &SurfaceError) -> Self {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => SurfaceRecovery::Reconfigure,
            SurfaceError::OutOfMemory => SurfaceRecovery::Fatal,
            _ => SurfaceRecovery::SkipFrame,
        }
    }
}

/// The egui output of one frame, ready for upload.
pub struct OverlayFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

struct ActorGpu {
    primitive: Primitive,
    mesh: MeshBuffer,
    uniform_buffer: Buffer,
    bind_group: BindGroup,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn uniform_layout_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    shader: &'a ShaderModule,
    layouts: &'a [&'a BindGroupLayout],
    cull_mode: Option<Face>,
    depth_write: bool,
    depth_compare: CompareFunction,
}

fn create_pipeline(device: &Device, format: TextureFormat, desc: PipelineDesc) -> RenderPipeline {
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(&format!("{}_layout", desc.label)),
        bind_group_layouts: desc.layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: VertexState {
            module: desc.shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: desc.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: desc.depth_compare,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// Owns every GPU resource; draws the sky, the actors and the overlay.
pub struct Renderer {
    pub gpu: GpuContext,
    pub shaders: ShaderLibrary,
    programs: FramePrograms,
    scene_camera: BindGroup,
    skybox_camera: BindGroup,
    model_layout: BindGroupLayout,
    primitive_pipeline: RenderPipeline,
    skybox_pipeline: RenderPipeline,
    skybox_mesh: MeshBuffer,
    skybox_bind_group: BindGroup,
    _skybox_texture: SkyboxTexture,
    actors: HashMap<ActorId, ActorGpu>,
    depth: (Texture, TextureView),
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub fn new(gpu: GpuContext, assets: &AssetSettings) -> Result<Self> {
        let device = gpu.device.clone();
        let mut shaders = ShaderLibrary::new(assets.shader_dir.clone());

        let scene = shaders.register_program(&device, PRIMITIVE_SHADER);
        let skybox = shaders.register_program(&device, SKYBOX_SHADER);
        let programs = FramePrograms { scene, skybox: Some(skybox) };

        let camera_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[uniform_layout_entry(0, ShaderStages::VERTEX)],
        });
        let camera_bind_group = |label: &str, program: ProgramHandle| -> Result<BindGroup> {
            let buffer = shaders
                .buffer(program)
                .ok_or_else(|| Error::UnknownShader(label.to_string()))?;
            Ok(device.create_bind_group(&BindGroupDescriptor {
                label: Some(label),
                layout: &camera_layout,
                entries: &[BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
            }))
        };
        let scene_camera = camera_bind_group("scene_camera_bind_group", scene)?;
        let skybox_camera = camera_bind_group("skybox_camera_bind_group", skybox)?;

        let model_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("model_bind_group_layout"),
            entries: &[uniform_layout_entry(0, ShaderStages::VERTEX_FRAGMENT)],
        });
        let sky_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("skybox_bind_group_layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let primitive_pipeline = create_pipeline(
            &device,
            gpu.format,
            PipelineDesc {
                label: "primitive_pipeline",
                shader: shaders.module(&device, PRIMITIVE_SHADER)?,
                layouts: &[&camera_layout, &model_layout],
                // Planes are seen from both sides.
                cull_mode: None,
                depth_write: true,
                depth_compare: CompareFunction::Less,
            },
        );
        let skybox_pipeline = create_pipeline(
            &device,
            gpu.format,
            PipelineDesc {
                label: "skybox_pipeline",
                shader: shaders.module(&device, SKYBOX_SHADER)?,
                layouts: &[&camera_layout, &sky_layout],
                cull_mode: Some(Face::Back),
                depth_write: false,
                depth_compare: CompareFunction::LessEqual,
            },
        );

        let faces = CubeFaces::load_or_gradient(assets.skybox_dir.as_deref(), &assets.skybox_prefix);
        let skybox_texture = SkyboxTexture::upload(&device, &gpu.queue, &faces);
        let skybox_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("skybox_bind_group"),
            layout: &sky_layout,
            entries: &[
                BindGroupEntry { binding: 0, resource: BindingResource::TextureView(&skybox_texture.view) },
                BindGroupEntry { binding: 1, resource: BindingResource::Sampler(&skybox_texture.sampler) },
            ],
        });
        let skybox_mesh = Primitive::Skybox.mesh().upload(&device, "skybox");

        let (width, height) = gpu.size();
        let depth = create_depth_texture(&device, width, height);
        let egui_renderer = egui_wgpu::Renderer::new(&device, gpu.format, egui_wgpu::RendererOptions::default());

        tracing::info!(width, height, format = ?gpu.format, "renderer ready");
        Ok(Self {
            gpu,
            shaders,
            programs,
            scene_camera,
            skybox_camera,
            model_layout,
            primitive_pipeline,
            skybox_pipeline,
            skybox_mesh,
            skybox_bind_group,
            _skybox_texture: skybox_texture,
            actors: HashMap::new(),
            depth,
            egui_renderer,
        })
    }

    pub fn programs(&self) -> FramePrograms {
        self.programs
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.gpu.resize(width, height) {
            self.depth = create_depth_texture(&self.gpu.device, width, height);
            tracing::debug!(width, height, "surface resized");
        }
    }

    /// Brings per-actor GPU state in line with this frame's drawables.
    fn sync_actors(&mut self, actors: &ActorList) {
        let mut seen = Vec::new();
        for (id, drawable) in actors.drawables() {
            seen.push(id);
            let stale = self
                .actors
                .get(&id)
                .is_none_or(|gpu| gpu.primitive != drawable.primitive);
            if stale {
                let gpu = self.create_actor_gpu(&drawable);
                self.actors.insert(id, gpu);
            }
            if let Some(gpu) = self.actors.get(&id) {
                let uniform = ModelUniform::from_drawable(&drawable);
                self.gpu.queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
            }
        }
        self.actors.retain(|id, _| seen.contains(id));
    }

    fn create_actor_gpu(&self, drawable: &Drawable) -> ActorGpu {
        let device = &self.gpu.device;
        let label = drawable.primitive.label();
        let mesh = drawable.primitive.mesh().upload(device, label);
        let uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some(&format!("{label} model uniforms")),
            size: std::mem::size_of::<ModelUniform>() as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some(&format!("{label} model bind group")),
            layout: &self.model_layout,
            entries: &[BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() }],
        });
        tracing::debug!(primitive = label, indices = mesh.index_count, "actor mesh uploaded");
        ActorGpu { primitive: drawable.primitive, mesh, uniform_buffer, bind_group }
    }

    fn acquire_frame(&self) -> Result<Option<SurfaceTexture>> {
        match self.gpu.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => match SurfaceRecovery::for_error(&err) {
                SurfaceRecovery::Reconfigure => {
                    tracing::warn!(%err, "surface lost, reconfiguring");
                    self.gpu.reconfigure();
                    Ok(None)
                }
                SurfaceRecovery::SkipFrame => {
                    tracing::debug!(%err, "frame skipped");
                    Ok(None)
                }
                SurfaceRecovery::Fatal => Err(Error::Surface(err)),
            },
        }
    }

    /// Uploads uniforms and draws one frame. A lost surface skips the frame.
    pub fn draw_frame(&mut self, actors: &ActorList, overlay: Option<OverlayFrame>) -> Result<()> {
        self.shaders.flush(&self.gpu.queue);
        self.sync_actors(actors);

        let Some(frame) = self.acquire_frame()? else {
            return Ok(());
        };

        let device = self.gpu.device.clone();
        let queue = self.gpu.queue.clone();
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth.1,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.skybox_pipeline);
            rp.set_bind_group(0, &self.skybox_camera, &[]);
            rp.set_bind_group(1, &self.skybox_bind_group, &[]);
            rp.set_vertex_buffer(0, self.skybox_mesh.vertex_buffer.slice(..));
            rp.set_index_buffer(self.skybox_mesh.index_buffer.slice(..), IndexFormat::Uint32);
            rp.draw_indexed(0..self.skybox_mesh.index_count, 0, 0..1);

            rp.set_pipeline(&self.primitive_pipeline);
            rp.set_bind_group(0, &self.scene_camera, &[]);
            for actor in self.actors.values() {
                if actor.mesh.index_count == 0 {
                    continue;
                }
                rp.set_bind_group(1, &actor.bind_group, &[]);
                rp.set_vertex_buffer(0, actor.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(actor.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..actor.mesh.index_count, 0, 0..1);
            }
        }

        if let Some(overlay) = overlay {
            self.draw_overlay(&device, &queue, &mut encoder, &view, overlay);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn draw_overlay(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        view: &TextureView,
        overlay: OverlayFrame,
    ) {
        let (width, height) = self.gpu.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: overlay.pixels_per_point,
        };

        for (id, image_delta) in &overlay.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, &overlay.primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &overlay.primitives, &screen_descriptor);
        }

        for id in &overlay.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
