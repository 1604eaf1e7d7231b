//! Geometry and target-surface types.
//!
//! Overlay and proxy duplicates share the source surface's `MeshBuffers`
//! through an `Arc`; only world transforms are copied per instance.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;

use projcast_core::SurfaceId;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const STRIDE: wgpu::BufferAddress = std::mem::size_of::<Vertex>() as wgpu::BufferAddress;

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 12,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 24,
            shader_location: 2,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle geometry on the device.
pub struct MeshBuffers {
    pub vertex_buf: wgpu::Buffer,
    pub index_buf: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vb"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_ib"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buf,
            index_buf,
            index_count: indices.len() as u32,
        }
    }

    /// Flat rectangle in the XZ plane facing +Y, centered at the origin.
    pub fn plane(device: &wgpu::Device, width: f32, depth: f32) -> Self {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        let vertices = [
            Vertex {
                position: [-hw, 0.0, -hd],
                normal: [0.0, 1.0, 0.0],
                uv: [0.0, 0.0],
            },
            Vertex {
                position: [hw, 0.0, -hd],
                normal: [0.0, 1.0, 0.0],
                uv: [1.0, 0.0],
            },
            Vertex {
                position: [hw, 0.0, hd],
                normal: [0.0, 1.0, 0.0],
                uv: [1.0, 1.0],
            },
            Vertex {
                position: [-hw, 0.0, hd],
                normal: [0.0, 1.0, 0.0],
                uv: [0.0, 1.0],
            },
        ];
        let indices = [0u32, 2, 1, 0, 3, 2];
        Self::new(device, &vertices, &indices)
    }

    /// Axis-aligned box centered at the origin, one quad per face.
    pub fn cuboid(device: &wgpu::Device, half_x: f32, half_y: f32, half_z: f32) -> Self {
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // (normal, tangent u, tangent v) per face
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let half = [half_x, half_y, half_z];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, tan_u, tan_v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let mut position = [0.0f32; 3];
                for axis in 0..3 {
                    position[axis] =
                        (normal[axis] + su * tan_u[axis] + sv * tan_v[axis]) * half[axis];
                }
                vertices.push(Vertex {
                    position,
                    normal,
                    uv: [su * 0.5 + 0.5, sv * -0.5 + 0.5],
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(device, &vertices, &indices)
    }
}

/// An externally owned target surface: shared geometry plus a world
/// transform the host updates freely between frames.
///
/// The two host-renderer flags are set by the tool on registration and
/// reset on removal; nothing in this crate consumes them.
pub struct SurfaceMesh {
    id: SurfaceId,
    pub geometry: Arc<MeshBuffers>,
    pub world: Mat4,
    pub casts_host_shadow: bool,
    pub receives_host_shadow: bool,
}

/// Single-threaded shared handle, matching the frame-driven execution model.
pub type SharedSurface = Rc<RefCell<SurfaceMesh>>;

impl SurfaceMesh {
    pub fn new(geometry: Arc<MeshBuffers>, world: Mat4) -> Self {
        Self {
            id: SurfaceId::fresh(),
            geometry,
            world,
            casts_host_shadow: false,
            receives_host_shadow: false,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn shared(self) -> SharedSurface {
        Rc::new(RefCell::new(self))
    }
}
