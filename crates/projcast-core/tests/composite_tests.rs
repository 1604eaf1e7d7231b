// Compositing reference math: occlusion policy, edge feather boundaries,
// frustum culling and the alpha cutoff.

use glam::{Vec2, Vec3, Vec4};
use projcast_core::{
    composite_fragment, edge_factor, occluded, project_point, ProjectionParams, ProjectorCamera,
    ALPHA_CUTOFF,
};

fn projector_view_proj() -> glam::Mat4 {
    // Default projector at the origin looking along +X.
    ProjectorCamera::default().view_proj()
}

const WHITE: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);

#[test]
fn points_behind_the_projector_are_discarded() {
    let vp = projector_view_proj();
    assert!(project_point(vp, Vec3::new(-5.0, 0.0, 0.0)).is_none());
    assert!(project_point(vp, Vec3::ZERO).is_none());
}

#[test]
fn points_outside_the_footprint_are_discarded() {
    let vp = projector_view_proj();
    // 30 degree fov: a point far off-axis at x=10 is outside the beam.
    assert!(project_point(vp, Vec3::new(10.0, 8.0, 0.0)).is_none());
    assert!(project_point(vp, Vec3::new(10.0, 0.0, 9.0)).is_none());
}

#[test]
fn depth_grows_with_distance_from_the_projector() {
    let vp = projector_view_proj();
    let near = project_point(vp, Vec3::new(2.0, 0.0, 0.0)).expect("in beam");
    let far = project_point(vp, Vec3::new(30.0, 0.0, 0.0)).expect("in beam");
    assert!(near.depth < far.depth);
    assert!(near.depth > 0.0 && far.depth < 1.0);
}

#[test]
fn occlusion_respects_the_bias_window() {
    let bias = 1e-4;
    assert!(occluded(0.61, 0.6, bias));
    assert!(!occluded(0.6, 0.6, bias));
    // Just inside the bias window: not occluded.
    assert!(!occluded(0.6 + 0.5e-4, 0.6, bias));
    // Just past it: occluded.
    assert!(occluded(0.6 + 2e-4, 0.6, bias));
}

#[test]
fn edge_factor_boundary_cases() {
    // At the frustum border the factor is exactly 0 when feathering is on.
    assert_eq!(edge_factor(Vec2::new(0.0, 0.5), 0.05), 0.0);
    assert_eq!(edge_factor(Vec2::new(0.5, 1.0), 0.05), 0.0);
    // At or past the feather distance it is exactly 1.
    assert_eq!(edge_factor(Vec2::new(0.05, 0.5), 0.05), 1.0);
    assert_eq!(edge_factor(Vec2::new(0.5, 0.5), 0.05), 1.0);
    // Feather disabled: always 1, even on the border.
    assert_eq!(edge_factor(Vec2::new(0.0, 0.0), 0.0), 1.0);
    // Negative feather behaves like zero.
    assert_eq!(edge_factor(Vec2::new(0.0, 0.5), -0.3), 1.0);
}

#[test]
fn edge_factor_ramps_monotonically() {
    let feather = 0.1;
    let mut prev = -1.0;
    for i in 0..=10 {
        let d = i as f32 * 0.01;
        let f = edge_factor(Vec2::new(d, 0.5), feather);
        assert!(f >= prev, "ramp not monotonic at {d}");
        prev = f;
    }
}

#[test]
fn unoccluded_center_fragment_contributes() {
    let vp = projector_view_proj();
    let params = ProjectionParams::default();
    let out = composite_fragment(vp, Vec3::new(10.0, 0.0, 0.0), WHITE, |_| 1.0, &params)
        .expect("visible fragment must contribute");
    // Center of the beam: no feather attenuation, full intensity/opacity.
    assert!((out.x - 1.0).abs() < 1e-5);
    assert!((out.w - 1.0).abs() < 1e-5);
}

#[test]
fn occluded_fragment_is_discarded() {
    let vp = projector_view_proj();
    let params = ProjectionParams::default();
    let world = Vec3::new(10.0, 0.0, 0.0);
    let frag_depth = project_point(vp, world).expect("in beam").depth;
    // Captured depth says something sits well in front of this fragment.
    let blocked = composite_fragment(vp, world, WHITE, |_| frag_depth - 0.05, &params);
    assert!(blocked.is_none());
    // Captured depth equal to the fragment's own depth: kept (bias window).
    let visible = composite_fragment(vp, world, WHITE, |_| frag_depth, &params);
    assert!(visible.is_some());
}

#[test]
fn opacity_scales_both_color_and_alpha() {
    let vp = projector_view_proj();
    let mut params = ProjectionParams::default();
    params.set_opacity(0.5);
    let out = composite_fragment(vp, Vec3::new(10.0, 0.0, 0.0), WHITE, |_| 1.0, &params)
        .expect("visible");
    assert!((out.x - 0.5).abs() < 1e-5);
    assert!((out.w - 0.5).abs() < 1e-5);
}

#[test]
fn near_transparent_output_hits_the_alpha_cutoff() {
    let vp = projector_view_proj();
    let mut params = ProjectionParams::default();
    params.set_opacity(ALPHA_CUTOFF * 0.5);
    let out = composite_fragment(vp, Vec3::new(10.0, 0.0, 0.0), WHITE, |_| 1.0, &params);
    assert!(out.is_none());
}
