//! Debug frustum visualization: a 12-edge wireframe of the projector's
//! beam, refreshed whenever the projector moves.

use glam::Vec3;

pub struct FrustumHelper {
    vb: wgpu::Buffer,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    pub visible: bool,
}

// Edge pairs into the corner array (bit 0 = +x, bit 1 = +y, bit 2 = far).
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

impl FrustumHelper {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        globals_buf: &wgpu::Buffer,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("helper_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::HELPER_WGSL.into()),
        });
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("helper_bgl"),
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
        // Reads the compositor's globals block; only the camera matrix is
        // consumed by the line shader.
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("helper_bg"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });
        let vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("helper_vb"),
            size: (std::mem::size_of::<[f32; 3]>() * EDGES.len() * 2) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("helper_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("helper_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_lines"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: (std::mem::size_of::<f32>() * 3) as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_lines"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        Self {
            vb,
            pipeline,
            bind_group,
            visible: true,
        }
    }

    /// Rebuild the wireframe from the projector's current frustum corners.
    pub fn refresh(&self, queue: &wgpu::Queue, corners: &[Vec3; 8]) {
        let mut lines = [[0.0f32; 3]; EDGES.len() * 2];
        for (i, (a, b)) in EDGES.iter().enumerate() {
            lines[i * 2] = corners[*a].to_array();
            lines[i * 2 + 1] = corners[*b].to_array();
        }
        queue.write_buffer(&self.vb, 0, bytemuck::cast_slice(&lines));
    }

    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        if !self.visible {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vb.slice(..));
        rpass.draw(0..(EDGES.len() as u32 * 2), 0..1);
    }

    pub fn destroy(&self) {
        self.vb.destroy();
    }
}
