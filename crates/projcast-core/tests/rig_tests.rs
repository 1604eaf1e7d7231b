// Frame orchestration: transform-sync invariant, phase separation, opacity
// clamping, disposal emptiness.

use glam::{Mat4, Vec3};
use projcast_core::{
    Orientation, ProjectionParams, ProjectorCamera, ProjectorIntrinsics, ProjectorRig, SurfaceId,
};

// Payload stands in for an externally owned source surface: just its
// current world transform.
type TestRig = ProjectorRig<Mat4>;

fn make_rig() -> TestRig {
    ProjectorRig::new(
        ProjectorCamera::new(
            Vec3::new(-5.0, 3.0, 0.0),
            Orientation::default(),
            ProjectorIntrinsics::default(),
        ),
        ProjectionParams::default(),
    )
}

fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

#[test]
fn add_and_remove_track_lengths_predictably() {
    let mut rig = make_rig();
    let a = SurfaceId::fresh();
    let b = SurfaceId::fresh();
    assert!(rig.add_target(a, Mat4::IDENTITY, Mat4::IDENTITY));
    assert_eq!(rig.len(), 1);
    assert!(rig.add_target(b, Mat4::IDENTITY, Mat4::IDENTITY));
    assert_eq!(rig.len(), 2);
    assert!(rig.remove_target(a).is_some());
    assert_eq!(rig.len(), 1);
    assert!(rig.remove_target(a).is_none());
    assert_eq!(rig.len(), 1);
}

#[test]
fn duplicate_registration_keeps_one_entry() {
    let mut rig = make_rig();
    let id = SurfaceId::fresh();
    assert!(rig.add_target(id, Mat4::IDENTITY, Mat4::IDENTITY));
    assert!(!rig.add_target(id, Mat4::IDENTITY, Mat4::IDENTITY));
    assert_eq!(rig.len(), 1);
}

#[test]
fn re_adding_after_removal_yields_a_fresh_record() {
    let mut rig = make_rig();
    let id = SurfaceId::fresh();
    rig.add_target(id, translation(1.0, 0.0, 0.0), translation(1.0, 0.0, 0.0));
    rig.remove_target(id);
    rig.add_target(id, translation(9.0, 0.0, 0.0), translation(9.0, 0.0, 0.0));
    assert_eq!(rig.len(), 1);
    let record = rig.target(id).expect("re-registered");
    assert_eq!(record.transforms.overlay_world, translation(9.0, 0.0, 0.0));
    assert_eq!(record.transforms.proxy_world, translation(9.0, 0.0, 0.0));
}

#[test]
fn both_sync_phases_leave_transforms_equal_to_the_source() {
    let mut rig = make_rig();
    let id = SurfaceId::fresh();
    rig.add_target(id, Mat4::IDENTITY, Mat4::IDENTITY);

    // Source surface moved since registration.
    let moved = translation(0.0, 2.5, -4.0);
    if let Some(record) = rig.remove_target(id) {
        rig.add_target(id, record.transforms.overlay_world, moved);
    }

    rig.sync_proxy_transforms(|source| *source);
    rig.sync_overlay_transforms(|source| *source);

    let record = rig.target(id).expect("registered");
    assert_eq!(record.transforms.proxy_world, moved);
    assert_eq!(record.transforms.overlay_world, moved);
}

#[test]
fn proxy_sync_runs_before_overlay_sync() {
    // Between phase (a) and phase (d) the proxy is current while the overlay
    // still holds the previous frame's transform.
    let mut rig = make_rig();
    let id = SurfaceId::fresh();
    rig.add_target(id, Mat4::IDENTITY, translation(7.0, 0.0, 0.0));

    rig.sync_proxy_transforms(|source| *source);
    {
        let record = rig.target(id).expect("registered");
        assert_eq!(record.transforms.proxy_world, translation(7.0, 0.0, 0.0));
        assert_eq!(record.transforms.overlay_world, Mat4::IDENTITY);
    }
    rig.sync_overlay_transforms(|source| *source);
    let record = rig.target(id).expect("registered");
    assert_eq!(record.transforms.overlay_world, translation(7.0, 0.0, 0.0));
}

#[test]
fn publish_packs_the_current_view_projection() {
    let mut rig = make_rig();
    let camera_vp = Mat4::perspective_rh(1.0, 1.6, 0.1, 100.0);
    let before = rig.publish(camera_vp);
    rig.projector.set_azimuth_deg(90.0);
    let after = rig.publish(camera_vp);
    assert_eq!(before.camera_view_proj, camera_vp.to_cols_array_2d());
    assert_ne!(before.projector_view_proj, after.projector_view_proj);
    assert_eq!(
        after.projector_view_proj,
        rig.projector.view_proj().to_cols_array_2d()
    );
}

#[test]
fn opacity_writes_clamp_at_the_write_site() {
    let mut rig = make_rig();
    rig.set_opacity(1.5);
    assert_eq!(rig.params.opacity(), 1.0);
    rig.set_opacity(-0.2);
    assert_eq!(rig.params.opacity(), 0.0);
    rig.set_opacity(0.4);
    assert_eq!(rig.params.opacity(), 0.4);
    // Published globals carry the clamped value.
    assert_eq!(rig.publish(Mat4::IDENTITY).opacity, 0.4);
}

#[test]
fn intensity_and_feather_stay_unvalidated() {
    let mut rig = make_rig();
    rig.params.intensity = -3.0;
    rig.params.edge_feather = -0.5;
    let globals = rig.publish(Mat4::IDENTITY);
    assert_eq!(globals.intensity, -3.0);
    assert_eq!(globals.edge_feather, -0.5);
}

#[test]
fn draining_targets_leaves_the_rig_empty() {
    let mut rig = make_rig();
    for _ in 0..5 {
        rig.add_target(SurfaceId::fresh(), Mat4::IDENTITY, Mat4::IDENTITY);
    }
    assert_eq!(rig.len(), 5);
    let released: Vec<_> = rig.drain_targets().collect();
    assert_eq!(released.len(), 5);
    assert!(rig.is_empty());
}
