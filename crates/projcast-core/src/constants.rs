// Default tuning for the projector tool, shared by core and GPU crates.

// Projector intrinsics
pub const DEFAULT_FOV_DEG: f32 = 30.0; // narrow beam, like a physical projector
pub const DEFAULT_ASPECT: f32 = 1.0;
pub const DEFAULT_NEAR: f32 = 0.5;
pub const DEFAULT_FAR: f32 = 50.0;

// Depth capture
pub const DEFAULT_DEPTH_SIZE: u32 = 1024; // square shadow-style depth target

// Compositing
pub const DEFAULT_INTENSITY: f32 = 1.0;
pub const DEFAULT_OPACITY: f32 = 1.0;
pub const DEFAULT_OCCLUSION_BIAS: f32 = 1e-4; // tolerance against self-occlusion acne
pub const DEFAULT_EDGE_FEATHER: f32 = 0.05; // UV fraction of the border ramp
pub const ALPHA_CUTOFF: f32 = 0.02; // fragments dimmer than this are dropped early
