pub mod compositor;
pub mod depth_capture;
pub mod helper;
pub mod mesh;
pub mod tool;
pub mod video;

pub static PROJECT_WGSL: &str = include_str!("../shaders/project.wgsl");
pub static DEPTH_WGSL: &str = include_str!("../shaders/depth.wgsl");
pub static HELPER_WGSL: &str = include_str!("../shaders/helper.wgsl");

pub use mesh::{MeshBuffers, SharedSurface, SurfaceMesh, Vertex};
pub use tool::{ProjectorTool, ToolOptions};
pub use video::VideoTexture;
