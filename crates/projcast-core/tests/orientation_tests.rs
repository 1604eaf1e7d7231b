// Projector orientation and view-projection behavior.

use glam::{Mat4, Vec3, Vec4};
use projcast_core::{Orientation, ProjectorCamera, ProjectorIntrinsics};

fn make_projector() -> ProjectorCamera {
    ProjectorCamera::new(
        Vec3::ZERO,
        Orientation::default(),
        ProjectorIntrinsics::default(),
    )
}

fn assert_vec3_close(a: Vec3, b: Vec3, tol: f32) {
    assert!(
        (a - b).length() < tol,
        "expected {b:?}, got {a:?} (tol {tol})"
    );
}

#[test]
fn zero_orientation_looks_along_positive_x() {
    let cam = make_projector();
    assert_vec3_close(cam.forward_dir(), Vec3::X, 1e-6);
}

#[test]
fn azimuth_sweeps_toward_positive_z() {
    let mut cam = make_projector();
    cam.set_azimuth_deg(90.0);
    assert_vec3_close(cam.forward_dir(), Vec3::Z, 1e-6);
    cam.set_azimuth_deg(180.0);
    assert_vec3_close(cam.forward_dir(), -Vec3::X, 1e-6);
}

#[test]
fn elevation_tilts_toward_positive_y() {
    let mut cam = make_projector();
    cam.set_elevation_deg(90.0);
    assert_vec3_close(cam.forward_dir(), Vec3::Y, 1e-6);
    cam.set_elevation_deg(-45.0);
    let d = cam.forward_dir();
    assert!(d.y < 0.0 && d.x > 0.0);
}

#[test]
fn world_transform_places_projector_at_its_position() {
    let pos = Vec3::new(3.0, 2.0, -1.0);
    let cam = ProjectorCamera::new(
        pos,
        Orientation::default(),
        ProjectorIntrinsics::default(),
    );
    let origin = cam.world_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert_vec3_close(origin.truncate(), pos, 1e-4);
}

#[test]
fn orientation_setters_take_effect_immediately() {
    let mut cam = make_projector();
    let before = cam.view_proj();
    cam.set_azimuth_deg(35.0);
    let after = cam.view_proj();
    assert_ne!(before.to_cols_array(), after.to_cols_array());
}

#[test]
fn roll_preserves_the_forward_direction() {
    let mut cam = make_projector();
    cam.set_azimuth_deg(20.0);
    cam.set_elevation_deg(-10.0);
    let forward_before = cam.world_matrix().transform_vector3(-Vec3::Z);
    cam.set_roll_deg(63.0);
    let forward_after = cam.world_matrix().transform_vector3(-Vec3::Z);
    assert_vec3_close(forward_after, forward_before, 1e-4);
}

#[test]
fn view_proj_is_projection_times_inverse_world() {
    let mut cam = make_projector();
    cam.set_azimuth_deg(42.0);
    cam.set_roll_deg(-17.0);
    let expected = cam.projection_matrix() * cam.world_matrix().inverse();
    let got = cam.view_proj();
    for (a, b) in got
        .to_cols_array()
        .iter()
        .zip(expected.to_cols_array().iter())
    {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn pole_elevation_stays_finite() {
    // Degenerate by design: forward parallel to world up. Not guarded, but
    // the matrices must not poison downstream math with NaNs at 89.9 deg.
    let mut cam = make_projector();
    cam.set_elevation_deg(89.9);
    assert!(cam.view_proj().is_finite());
}

#[test]
fn frustum_corners_span_near_and_far() {
    let cam = make_projector();
    let corners = cam.frustum_corners();
    let intr = cam.intrinsics();
    // Near plane corners sit `near` along +X, far plane corners at `far`.
    for corner in &corners[..4] {
        assert!((corner.x - intr.near).abs() < 1e-3, "near corner {corner:?}");
    }
    for corner in &corners[4..] {
        assert!((corner.x - intr.far).abs() < 1e-1, "far corner {corner:?}");
    }
}

#[test]
fn center_of_view_projects_to_uv_center() {
    let cam = make_projector();
    let sample = projcast_core::project_point(cam.view_proj(), Vec3::new(10.0, 0.0, 0.0))
        .expect("point ahead of the projector must project");
    assert!((sample.uv.x - 0.5).abs() < 1e-5);
    assert!((sample.uv.y - 0.5).abs() < 1e-5);
    assert!(sample.depth > 0.0 && sample.depth < 1.0);
}

#[test]
fn world_matrix_is_refreshed_lazily_never_stale() {
    // A position change routed through the setter refreshes the transform.
    let mut cam = make_projector();
    cam.set_position(Vec3::new(0.0, 5.0, 0.0));
    let origin = cam.world_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert_vec3_close(origin.truncate(), Vec3::new(0.0, 5.0, 0.0), 1e-4);
    let m: Mat4 = cam.view_matrix() * cam.world_matrix();
    for (i, v) in m.to_cols_array().iter().enumerate() {
        let expected = if i % 5 == 0 { 1.0 } else { 0.0 };
        assert!((v - expected).abs() < 1e-4);
    }
}
