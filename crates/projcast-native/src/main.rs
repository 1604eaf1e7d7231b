//! Desktop demo: a floor, a wall and an orbiting occluder, with the
//! projector casting a procedural color-bar video onto floor and wall.
//!
//! Controls: arrows aim the projector, Q/E roll it, -/= change opacity,
//! H toggles the frustum wireframe.

use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::{event::*, event_loop::EventLoop, window::WindowBuilder};

use projcast_core::{Orientation, ProjectorIntrinsics};
use projcast_gpu::{MeshBuffers, ProjectorTool, SharedSurface, SurfaceMesh, ToolOptions, VideoTexture};

const BASE_WGSL: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> camera: Camera;

struct Model {
    world: mat4x4<f32>,
    color: vec4<f32>,
};
@group(1) @binding(0) var<uniform> model: Model;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    var out: VsOut;
    let world_pos = model.world * vec4<f32>(position, 1.0);
    out.clip = camera.view_proj * world_pos;
    out.normal = normalize((model.world * vec4<f32>(normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let light = normalize(vec3<f32>(0.4, 1.0, 0.3));
    let diffuse = max(dot(in.normal, light), 0.0);
    let shade = 0.25 + 0.75 * diffuse;
    return vec4<f32>(model.color.rgb * shade, 1.0);
}
"#;

const VIDEO_SIZE: u32 = 256;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraRaw {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneModelRaw {
    world: [[f32; 4]; 4],
    color: [f32; 4],
}

/// One base-scene draw: the shared surface plus its lambert uniforms.
struct SceneObject {
    surface: SharedSurface,
    model_buf: wgpu::Buffer,
    model_bg: wgpu::BindGroup,
    color: [f32; 4],
}

impl SceneObject {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        surface: SharedSurface,
        color: [f32; 4],
    ) -> Self {
        let world = surface.borrow().world;
        let model_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene_model"),
            contents: bytemuck::bytes_of(&SceneModelRaw {
                world: world.to_cols_array_2d(),
                color,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_model_bg"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buf.as_entire_binding(),
            }],
        });
        Self {
            surface,
            model_buf,
            model_bg,
            color,
        }
    }

    fn sync(&self, queue: &wgpu::Queue) {
        let world = self.surface.borrow().world;
        queue.write_buffer(
            &self.model_buf,
            0,
            bytemuck::bytes_of(&SceneModelRaw {
                world: world.to_cols_array_2d(),
                color: self.color,
            }),
        );
    }
}

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    base_pipeline: wgpu::RenderPipeline,
    camera_buf: wgpu::Buffer,
    camera_bg: wgpu::BindGroup,
    objects: Vec<SceneObject>,
    occluder: SharedSurface,
    tool: ProjectorTool,
    video_frame: Vec<u8>,
    start: Instant,
    width: u32,
    height: u32,
}

fn create_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("main_depth"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&wgpu::TextureViewDescriptor::default())
}

impl<'w> GpuState<'w> {
    async fn new(window: &'w winit::window::Window) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth(&device, size.width, size.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("base_shader"),
            source: wgpu::ShaderSource::Wgsl(BASE_WGSL.into()),
        });
        let uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let camera_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bgl"),
            entries: &[uniform_entry],
        });
        let scene_model_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_model_bgl"),
            entries: &[uniform_entry],
        });
        let camera_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_uniforms"),
            size: std::mem::size_of::<CameraRaw>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bg"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("base_pl"),
            bind_group_layouts: &[&camera_bgl, &scene_model_bgl],
            push_constant_ranges: &[],
        });
        let base_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("base_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[projcast_gpu::Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        // Scene: a floor, a wall facing the projector, and a small cube
        // orbiting between them that occludes part of the cast image.
        let floor = SurfaceMesh::new(
            Arc::new(MeshBuffers::plane(&device, 12.0, 12.0)),
            Mat4::IDENTITY,
        )
        .shared();
        let wall = SurfaceMesh::new(
            Arc::new(MeshBuffers::cuboid(&device, 0.15, 2.0, 3.0)),
            Mat4::from_translation(Vec3::new(6.0, 2.0, 0.0)),
        )
        .shared();
        let occluder = SurfaceMesh::new(
            Arc::new(MeshBuffers::cuboid(&device, 0.4, 0.4, 0.4)),
            Mat4::from_translation(Vec3::new(2.0, 1.5, 0.0)),
        )
        .shared();

        let objects = vec![
            SceneObject::new(
                &device,
                &scene_model_bgl,
                floor.clone(),
                [0.45, 0.45, 0.48, 1.0],
            ),
            SceneObject::new(
                &device,
                &scene_model_bgl,
                wall.clone(),
                [0.55, 0.52, 0.48, 1.0],
            ),
            SceneObject::new(
                &device,
                &scene_model_bgl,
                occluder.clone(),
                [0.7, 0.3, 0.3, 1.0],
            ),
        ];

        let video = VideoTexture::new(&device, VIDEO_SIZE, VIDEO_SIZE)?;
        let mut tool = ProjectorTool::new(
            &device,
            &queue,
            video,
            ToolOptions {
                position: Vec3::new(-2.0, 2.5, 0.0),
                orientation: Orientation {
                    azimuth_deg: 0.0,
                    elevation_deg: -10.0,
                    roll_deg: 0.0,
                },
                intrinsics: ProjectorIntrinsics::default(),
                color_format: format,
                ..Default::default()
            },
        )?;
        // Floor and wall receive the projection; the occluder only blocks it
        // through its depth proxy.
        tool.add_target_mesh(&device, &floor);
        tool.add_target_mesh(&device, &wall);
        tool.add_target_mesh(&device, &occluder);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_view,
            base_pipeline,
            camera_buf,
            camera_bg,
            objects,
            occluder,
            tool,
            video_frame: vec![0u8; (VIDEO_SIZE * VIDEO_SIZE * 4) as usize],
            start: Instant::now(),
            width: size.width,
            height: size.height,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.width = new_size.width;
        self.height = new_size.height;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth(&self.device, new_size.width, new_size.height);
    }

    fn camera_view_proj(&self) -> Mat4 {
        let aspect = self.width as f32 / self.height as f32;
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, aspect, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(-7.0, 6.0, 9.0), Vec3::new(2.0, 1.0, 0.0), Vec3::Y);
        proj * view
    }

    /// Scrolling vertical color bars, the classic test card.
    fn fill_video_frame(&mut self, t: f32) {
        const BARS: [[u8; 3]; 7] = [
            [235, 235, 235],
            [235, 235, 16],
            [16, 235, 235],
            [16, 235, 16],
            [235, 16, 235],
            [235, 16, 16],
            [16, 16, 235],
        ];
        let scroll = (t * 40.0) as u32;
        for y in 0..VIDEO_SIZE {
            for x in 0..VIDEO_SIZE {
                let bar = (((x + scroll) / (VIDEO_SIZE / 7)) % 7) as usize;
                let i = ((y * VIDEO_SIZE + x) * 4) as usize;
                self.video_frame[i] = BARS[bar][0];
                self.video_frame[i + 1] = BARS[bar][1];
                self.video_frame[i + 2] = BARS[bar][2];
                self.video_frame[i + 3] = 255;
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let queue = &self.queue;
        match code {
            KeyCode::ArrowLeft => {
                let deg = self.tool.orientation().azimuth_deg - 2.0;
                self.tool.set_azimuth_deg(queue, deg);
            }
            KeyCode::ArrowRight => {
                let deg = self.tool.orientation().azimuth_deg + 2.0;
                self.tool.set_azimuth_deg(queue, deg);
            }
            KeyCode::ArrowUp => {
                let deg = self.tool.orientation().elevation_deg + 2.0;
                self.tool.set_elevation_deg(queue, deg);
            }
            KeyCode::ArrowDown => {
                let deg = self.tool.orientation().elevation_deg - 2.0;
                self.tool.set_elevation_deg(queue, deg);
            }
            KeyCode::KeyQ => {
                let deg = self.tool.orientation().roll_deg - 5.0;
                self.tool.set_roll_deg(queue, deg);
            }
            KeyCode::KeyE => {
                let deg = self.tool.orientation().roll_deg + 5.0;
                self.tool.set_roll_deg(queue, deg);
            }
            KeyCode::Minus => {
                let v = self.tool.opacity() - 0.1;
                self.tool.set_opacity(queue, v);
            }
            KeyCode::Equal => {
                let v = self.tool.opacity() + 0.1;
                self.tool.set_opacity(queue, v);
            }
            KeyCode::KeyH => {
                let visible = !self.tool.helper_visible();
                self.tool.set_helper_visible(visible);
            }
            _ => {}
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let t = self.start.elapsed().as_secs_f32();

        // Orbit the occluder through the beam.
        self.occluder.borrow_mut().world = Mat4::from_translation(Vec3::new(
            2.0 + 1.2 * (t * 0.7).cos(),
            1.8 + 0.6 * (t * 0.9).sin(),
            1.5 * (t * 0.7).sin(),
        ));

        self.fill_video_frame(t);
        self.tool.video().upload(&self.queue, &self.video_frame);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let camera_view_proj = self.camera_view_proj();
        self.queue.write_buffer(
            &self.camera_buf,
            0,
            bytemuck::bytes_of(&CameraRaw {
                view_proj: camera_view_proj.to_cols_array_2d(),
            }),
        );
        for obj in &self.objects {
            obj.sync(&self.queue);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });

        // Depth capture happens here, before the main pass.
        self.tool.update(&self.queue, &mut encoder, camera_view_proj);

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
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
            });

            rpass.set_pipeline(&self.base_pipeline);
            rpass.set_bind_group(0, &self.camera_bg, &[]);
            for obj in &self.objects {
                let surface = obj.surface.borrow();
                rpass.set_bind_group(1, &obj.model_bg, &[]);
                rpass.set_vertex_buffer(0, surface.geometry.vertex_buf.slice(..));
                rpass.set_index_buffer(
                    surface.geometry.index_buf.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                rpass.draw_indexed(0..surface.geometry.index_count, 0, 0..1);
            }

            // Overlays after opaque geometry so the depth test sees the scene.
            self.tool.draw_overlays(&mut rpass);
            self.tool.draw_helper(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let event_loop = EventLoop::new().expect("event loop");
    let window = WindowBuilder::new()
        .with_title("projcast (native)")
        .build(&event_loop)
        .expect("window");

    let mut state = pollster::block_on(GpuState::new(&window)).expect("gpu");

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => state.resize(size),
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => elwt.exit(),
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(code),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    },
                ..
            } => state.handle_key(code),
            Event::AboutToWait => match state.render() {
                Ok(_) => state.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(_) => {}
            },
            _ => {}
        })
        .unwrap();
}
