//! Shadow-style depth capture: once per frame the proxy geometries are
//! rendered from the projector's viewpoint into a square depth target the
//! compositor later samples for occlusion.

use glam::Mat4;

use crate::mesh::{MeshBuffers, Vertex};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CaptureRaw {
    view_proj: [[f32; 4]; 4],
}

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct DepthCaptureStage {
    size: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    pipeline: wgpu::RenderPipeline,
    capture_buf: wgpu::Buffer,
    capture_bg: wgpu::BindGroup,
}

impl DepthCaptureStage {
    /// Allocation failure (here: an unsupported size) is fatal; there is no
    /// silent fallback to a smaller target or to skipping occlusion.
    pub fn new(
        device: &wgpu::Device,
        size: u32,
        model_bgl: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<Self> {
        let max = device.limits().max_texture_dimension_2d;
        if size == 0 || size > max {
            anyhow::bail!("depth capture size {size} unsupported (device max {max})");
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_capture_tex"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Nearest: depth values must never be blended across texels.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("depth_capture_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("depth_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::DEPTH_WGSL.into()),
        });
        let capture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("capture_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let capture_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("capture_uniforms"),
            size: std::mem::size_of::<CaptureRaw>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let capture_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("capture_bg"),
            layout: &capture_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: capture_buf.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("depth_pl"),
            bind_group_layouts: &[&capture_bgl, model_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("depth_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_depth"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                // Front-face culling, shadow-map style: back faces never
                // contribute depth.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            cache: None,
            multiview: None,
        });

        log::info!("[depth] capture stage ready ({size}x{size})");
        Ok(Self {
            size,
            texture,
            view,
            sampler,
            pipeline,
            capture_buf,
            capture_bg,
        })
    }

    /// Record this frame's capture pass. Proxy transforms must already be
    /// synced; the compositor consumes the result later in the same frame.
    pub fn capture<'a>(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        projector_view_proj: Mat4,
        proxies: impl Iterator<Item = (&'a MeshBuffers, &'a wgpu::BindGroup)>,
    ) {
        queue.write_buffer(
            &self.capture_buf,
            0,
            bytemuck::bytes_of(&CaptureRaw {
                view_proj: projector_view_proj.to_cols_array_2d(),
            }),
        );
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("depth_capture_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.capture_bg, &[]);
        for (geometry, model_bg) in proxies {
            rpass.set_bind_group(1, model_bg, &[]);
            rpass.set_vertex_buffer(0, geometry.vertex_buf.slice(..));
            rpass.set_index_buffer(geometry.index_buf.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn destroy(&self) {
        self.texture.destroy();
        self.capture_buf.destroy();
    }
}
