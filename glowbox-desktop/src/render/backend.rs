use std::{
    cell::{Cell, RefCell},
    mem::size_of,
    num::NonZeroU64,
    rc::Rc,
    sync::Arc,
};

use bytemuck::Zeroable;
use glowbox_core::{
    messages::FrameSize,
    render::{
        backend::{GeometryHandle, RenderBackend, TextureHandle},
        mesh::Vertex,
    },
};
use log::warn;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, Buffer, BufferAddress,
    BufferBindingType, BufferDescriptor, BufferUsages, Color, CommandEncoderDescriptor,
    CompareFunction, DepthBiasState, DepthStencilState, Device, Extent3d, Face, FilterMode,
    FragmentState, FrontFace, ImageCopyTexture, ImageDataLayout, IndexFormat, LoadOp,
    MultisampleState, Operations, Origin3d, PipelineLayoutDescriptor, PrimitiveState,
    PrimitiveTopology, Queue, RenderPassColorAttachment, RenderPassDepthStencilAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, Sampler, SamplerBindingType,
    SamplerDescriptor, ShaderStages, StencilState, TextureAspect, TextureDescriptor,
    TextureDimension, TextureFormat, TextureSampleType, TextureUsages, TextureView,
    TextureViewDescriptor, TextureViewDimension, VertexState,
};

use cgmath::vec3;

use crate::render::{
    instance::{Instance, VertexData},
    program::{MarkerState, MarkerUniforms, PhongState, PhongUniforms, ProgramKind},
};

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const MAX_TEXTURE_UNITS: usize = 8;
const INITIAL_INSTANCE_CAPACITY: usize = 64;

struct Geometry {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
}

/// One recorded draw, replayed when the frame is submitted.
struct DrawCommand {
    kind: ProgramKind,
    geometry: u32,
    index_count: u32,
    instance: Instance,
    diffuse: Option<TextureHandle>,
    specular: Option<TextureHandle>,
}

/// A wgpu rendering of the scene library's GPU boundary.
///
/// Draw calls are recorded rather than issued immediately. The scene walks
/// its drawables writing uniforms and calling draw; `submit` then uploads
/// the final uniform blocks and replays every recorded command inside a
/// single render pass.
pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,

    geometries: Vec<Option<Geometry>>,
    textures: Vec<TextureView>,
    bound: [Option<TextureHandle>; MAX_TEXTURE_UNITS],
    commands: Vec<DrawCommand>,

    active: Rc<Cell<ProgramKind>>,
    phong: Rc<RefCell<PhongState>>,
    marker: Rc<RefCell<MarkerState>>,

    phong_pipeline: RenderPipeline,
    marker_pipeline: RenderPipeline,
    phong_uniform_buffer: Buffer,
    marker_uniform_buffer: Buffer,
    phong_bind_group: BindGroup,
    marker_bind_group: BindGroup,
    texture_layout: BindGroupLayout,
    sampler: Sampler,
    white_texture: TextureView,
    instance_buffer: Buffer,
    instance_capacity: usize,
    depth_texture: TextureView,
}

impl WgpuBackend {
    pub fn new(
        device: Arc<Device>,
        queue: Arc<Queue>,
        size: FrameSize,
        color_format: TextureFormat,
        active: Rc<Cell<ProgramKind>>,
        phong: Rc<RefCell<PhongState>>,
        marker: Rc<RefCell<MarkerState>>,
    ) -> WgpuBackend {
        let uniform_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("uniform_layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(size_of::<PhongUniforms>() as u64),
                },
                count: None,
            }],
        });

        let marker_uniform_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("marker_uniform_layout"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(size_of::<MarkerUniforms>() as u64),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("material_texture_layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        multisampled: false,
                        view_dimension: TextureViewDimension::D2,
                        sample_type: TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        multisampled: false,
                        view_dimension: TextureViewDimension::D2,
                        sample_type: TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let phong_uniform_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("phong_uniforms"),
            contents: bytemuck::bytes_of(&PhongUniforms::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let marker_uniform_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("marker_uniforms"),
            contents: bytemuck::bytes_of(&MarkerUniforms::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let phong_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("phong_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: phong_uniform_buffer.as_entire_binding(),
            }],
        });

        let marker_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("marker_uniform_bind_group"),
            layout: &marker_uniform_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: marker_uniform_buffer.as_entire_binding(),
            }],
        });

        let phong_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("phong_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let marker_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("marker_pipeline_layout"),
            bind_group_layouts: &[&marker_uniform_layout],
            push_constant_ranges: &[],
        });

        let phong_shader = device.create_shader_module(wgpu::include_wgsl!("phong.wgsl"));
        let marker_shader = device.create_shader_module(wgpu::include_wgsl!("marker.wgsl"));

        let phong_pipeline = create_pipeline(
            &device,
            "phong_pipeline",
            &phong_layout,
            &phong_shader,
            color_format,
        );
        let marker_pipeline = create_pipeline(
            &device,
            "marker_pipeline",
            &marker_layout,
            &marker_shader,
            color_format,
        );

        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Nearest,
            ..Default::default()
        });

        let instance_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("instance_buffer"),
            size: (INITIAL_INSTANCE_CAPACITY * size_of::<Instance>()) as BufferAddress,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let white_texture = upload_texture(&device, &queue, &[255; 4], 1, 1, "white_texture");
        let depth_texture = create_depth_texture(&device, size);

        WgpuBackend {
            device,
            queue,
            geometries: vec![],
            textures: vec![],
            bound: [None; MAX_TEXTURE_UNITS],
            commands: vec![],
            active,
            phong,
            marker,
            phong_pipeline,
            marker_pipeline,
            phong_uniform_buffer,
            marker_uniform_buffer,
            phong_bind_group,
            marker_bind_group,
            texture_layout,
            sampler,
            white_texture,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            depth_texture,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Recreates the size-dependent resources after the surface changes.
    pub fn resize(&mut self, size: FrameSize) {
        self.depth_texture = create_depth_texture(&self.device, size);
    }

    fn texture_view(&self, handle: Option<TextureHandle>) -> &TextureView {
        handle
            .and_then(|h| self.textures.get(h.0 as usize))
            .unwrap_or(&self.white_texture)
    }

    fn ensure_instance_capacity(&mut self, needed: usize) {
        if needed <= self.instance_capacity {
            return;
        }

        let capacity = needed.next_power_of_two();
        self.instance_buffer = self.device.create_buffer(&BufferDescriptor {
            label: Some("instance_buffer"),
            size: (capacity * size_of::<Instance>()) as BufferAddress,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.instance_capacity = capacity;
    }

    /// Uploads this frame's uniform blocks and replays the recorded draw
    /// commands into a single render pass targeting the given view.
    pub fn submit(&mut self, view: &TextureView) {
        {
            let phong = self.phong.borrow();
            self.queue.write_buffer(
                &self.phong_uniform_buffer,
                0,
                bytemuck::bytes_of(&phong.uniforms),
            );

            let marker = self.marker.borrow();
            self.queue.write_buffer(
                &self.marker_uniform_buffer,
                0,
                bytemuck::bytes_of(&marker.uniforms),
            );
        }

        self.ensure_instance_capacity(self.commands.len());
        let instances: Vec<Instance> = self.commands.iter().map(|c| c.instance).collect();
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let material_groups: Vec<Option<BindGroup>> = self
            .commands
            .iter()
            .map(|command| match command.kind {
                ProgramKind::Phong => Some(self.device.create_bind_group(&BindGroupDescriptor {
                    label: Some("material_bind_group"),
                    layout: &self.texture_layout,
                    entries: &[
                        BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(
                                self.texture_view(command.diffuse),
                            ),
                        },
                        BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(
                                self.texture_view(command.specular),
                            ),
                        },
                        BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                })),
                ProgramKind::Marker => None,
            })
            .collect();

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            pass.set_vertex_buffer(0, self.instance_buffer.slice(..));

            let mut current_kind = None;
            for (i, command) in self.commands.iter().enumerate() {
                let geometry = match self.geometries.get(command.geometry as usize) {
                    Some(Some(geometry)) => geometry,
                    _ => {
                        warn!("Draw recorded against released geometry {}", command.geometry);
                        continue;
                    }
                };

                if current_kind != Some(command.kind) {
                    match command.kind {
                        ProgramKind::Phong => {
                            pass.set_pipeline(&self.phong_pipeline);
                            pass.set_bind_group(0, &self.phong_bind_group, &[]);
                        }
                        ProgramKind::Marker => {
                            pass.set_pipeline(&self.marker_pipeline);
                            pass.set_bind_group(0, &self.marker_bind_group, &[]);
                        }
                    }
                    current_kind = Some(command.kind);
                }

                if let Some(material) = &material_groups[i] {
                    pass.set_bind_group(1, material, &[]);
                }

                pass.set_vertex_buffer(1, geometry.vertex_buffer.slice(..));
                pass.set_index_buffer(geometry.index_buffer.slice(..), IndexFormat::Uint32);
                pass.draw_indexed(0..command.index_count, 0, i as u32..i as u32 + 1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        self.commands.clear();
    }
}

impl RenderBackend for WgpuBackend {
    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> GeometryHandle {
        let vertex_buffer = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(indices),
            usage: BufferUsages::INDEX,
        });

        let handle = GeometryHandle(self.geometries.len() as u32);
        self.geometries.push(Some(Geometry {
            vertex_buffer,
            index_buffer,
        }));
        handle
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        match self.geometries.get_mut(geometry.0 as usize) {
            Some(slot) => *slot = None,
            None => warn!("Release of unknown geometry {}", geometry.0),
        }
    }

    fn create_texture(&mut self, rgba: &[u8], width: u32, height: u32) -> TextureHandle {
        let view = upload_texture(&self.device, &self.queue, rgba, width, height, "scene_texture");
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(view);
        handle
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        match self.bound.get_mut(unit as usize) {
            Some(slot) => *slot = Some(texture),
            None => warn!("Texture unit {} is out of range", unit),
        }
    }

    fn draw(&mut self, geometry: GeometryHandle, index_count: u32) {
        let kind = self.active.get();
        let (instance, diffuse, specular) = match kind {
            ProgramKind::Phong => {
                let state = self.phong.borrow();
                let resolve = |unit: Option<u32>| {
                    unit.and_then(|u| self.bound.get(u as usize).copied().flatten())
                };
                (
                    Instance {
                        color: vec3(1.0, 1.0, 1.0),
                        model: state.model,
                    },
                    resolve(state.diffuse_unit),
                    resolve(state.specular_unit),
                )
            }
            ProgramKind::Marker => {
                let state = self.marker.borrow();
                (
                    Instance {
                        color: state.color,
                        model: state.model,
                    },
                    None,
                    None,
                )
            }
        };

        self.commands.push(DrawCommand {
            kind,
            geometry: geometry.0,
            index_count,
            instance,
            diffuse,
            specular,
        });
    }
}

fn create_pipeline(
    device: &Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: TextureFormat,
) -> RenderPipeline {
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Instance::desc(), Vertex::desc()],
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: Some(Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState::default(),
        multiview: None,
    })
}

fn create_depth_texture(device: &Device, size: FrameSize) -> TextureView {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[DEPTH_FORMAT],
    });
    texture.create_view(&TextureViewDescriptor::default())
}

fn upload_texture(
    device: &Device,
    queue: &Queue,
    rgba: &[u8],
    width: u32,
    height: u32,
    label: &str,
) -> TextureView {
    let extent = Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[TextureFormat::Rgba8UnormSrgb],
    });

    queue.write_texture(
        ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        rgba,
        ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        extent,
    );

    texture.create_view(&TextureViewDescriptor::default())
}
