//! CPU reference for the projective compositing fragment stage.
//!
//! These functions mirror `shaders/project.wgsl` in the GPU crate and pin
//! its contract for the test suite: projector-space projection, frustum
//! footprint cull, depth-bias occlusion test, edge feathering and
//! intensity/opacity blending.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::constants::ALPHA_CUTOFF;
use crate::params::ProjectionParams;

/// A world point as seen by the projector: texture UV and normalized depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectorSample {
    pub uv: Vec2,
    pub depth: f32,
}

/// Project a world-space point into projector UV and depth.
///
/// Returns `None` when the point is behind (or at) the projector, or lands
/// outside the frustum footprint. UV follows texture addressing (v grows
/// downward); depth is wgpu NDC z, already in \[0, 1\].
pub fn project_point(projector_view_proj: Mat4, world_pos: Vec3) -> Option<ProjectorSample> {
    let clip = projector_view_proj * world_pos.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    let uv = Vec2::new(ndc.x * 0.5 + 0.5, ndc.y * -0.5 + 0.5);
    if uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 {
        return None;
    }
    Some(ProjectorSample { uv, depth: ndc.z })
}

/// True when something nearer to the projector already claimed this UV:
/// the fragment is in shadow from the projector's perspective.
pub fn occluded(frag_depth: f32, scene_depth: f32, bias: f32) -> bool {
    frag_depth > scene_depth + bias
}

/// Border ramp: 0 at the frustum edge, 1 once `edge_feather` inside it.
/// A feather of zero (or anything non-positive) disables the ramp.
pub fn edge_factor(uv: Vec2, edge_feather: f32) -> f32 {
    if edge_feather <= 0.0 {
        return 1.0;
    }
    let min_dist = uv.x.min(1.0 - uv.x).min(uv.y.min(1.0 - uv.y));
    smoothstep(0.0, edge_feather, min_dist)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Full per-fragment decision. `candidate` is the color sampled from the
/// source image; `scene_depth_at` reads the captured depth buffer at the
/// projector UV. Returns the blended contribution, or `None` for a discard.
pub fn composite_fragment(
    projector_view_proj: Mat4,
    world_pos: Vec3,
    candidate: Vec4,
    scene_depth_at: impl FnOnce(Vec2) -> f32,
    params: &ProjectionParams,
) -> Option<Vec4> {
    let sample = project_point(projector_view_proj, world_pos)?;
    if occluded(
        sample.depth,
        scene_depth_at(sample.uv),
        params.occlusion_bias,
    ) {
        return None;
    }
    let edge = edge_factor(sample.uv, params.edge_feather);
    let alpha = candidate.w * edge * params.opacity();
    if alpha < ALPHA_CUTOFF {
        return None;
    }
    let gain = params.intensity * edge * params.opacity();
    Some(Vec4::new(
        candidate.x * gain,
        candidate.y * gain,
        candidate.z * gain,
        alpha,
    ))
}
