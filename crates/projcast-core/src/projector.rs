//! The virtual projector: a perspective viewpoint with azimuth/elevation/roll
//! orientation and a cached world transform.
//!
//! All matrices are right-handed with wgpu clip conventions (NDC z in
//! \[0, 1\]). At zero orientation the projector looks along +X.

use glam::{Mat4, Vec3, Vec4};

use crate::constants::{DEFAULT_ASPECT, DEFAULT_FAR, DEFAULT_FOV_DEG, DEFAULT_NEAR};

/// Perspective intrinsics of the projector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectorIntrinsics {
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectorIntrinsics {
    fn default() -> Self {
        Self {
            fov_deg: DEFAULT_FOV_DEG,
            aspect: DEFAULT_ASPECT,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

/// Orientation angles in degrees. Unconstrained; trigonometric evaluation
/// wraps them implicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub roll_deg: f32,
}

/// Perspective viewpoint the source image is cast from.
///
/// The world transform is cached and only refreshed by `apply_orientation`,
/// which every mutating setter calls; consumers in the same frame always see
/// a current matrix.
#[derive(Clone, Debug)]
pub struct ProjectorCamera {
    position: Vec3,
    orientation: Orientation,
    intrinsics: ProjectorIntrinsics,
    world: Mat4,
}

impl ProjectorCamera {
    pub fn new(position: Vec3, orientation: Orientation, intrinsics: ProjectorIntrinsics) -> Self {
        let mut cam = Self {
            position,
            orientation,
            intrinsics,
            world: Mat4::IDENTITY,
        };
        cam.apply_orientation();
        cam
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn intrinsics(&self) -> ProjectorIntrinsics {
        self.intrinsics
    }

    /// Look direction derived from azimuth/elevation. Zero orientation gives
    /// (1, 0, 0); azimuth sweeps toward +Z, elevation toward +Y.
    pub fn forward_dir(&self) -> Vec3 {
        let az = self.orientation.azimuth_deg.to_radians();
        let el = self.orientation.elevation_deg.to_radians();
        Vec3::new(el.cos() * az.cos(), el.sin(), el.cos() * az.sin())
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.apply_orientation();
    }

    pub fn set_azimuth_deg(&mut self, deg: f32) {
        self.orientation.azimuth_deg = deg;
        self.apply_orientation();
    }

    pub fn set_elevation_deg(&mut self, deg: f32) {
        self.orientation.elevation_deg = deg;
        self.apply_orientation();
    }

    pub fn set_roll_deg(&mut self, deg: f32) {
        self.orientation.roll_deg = deg;
        self.apply_orientation();
    }

    /// Recompute the cached world transform: look-at toward the current
    /// forward direction with fixed +Y world up, then roll about the view
    /// axis. Elevation at the poles degenerates the look-at; tolerated, not
    /// guarded.
    pub fn apply_orientation(&mut self) {
        let dir = self.forward_dir();
        let look = Mat4::look_at_rh(self.position, self.position + dir, Vec3::Y);
        let roll = Mat4::from_rotation_z(self.orientation.roll_deg.to_radians());
        self.world = look.inverse() * roll;
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world.inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.intrinsics.fov_deg.to_radians(),
            self.intrinsics.aspect,
            self.intrinsics.near,
            self.intrinsics.far,
        )
    }

    /// `projection * world⁻¹`, current as of the last orientation change.
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.world.inverse()
    }

    /// World-space frustum corners, NDC cube unprojected through the inverse
    /// view-projection. Index layout: bit 0 = +x, bit 1 = +y, bit 2 = far,
    /// so 0..4 is the near rectangle and 4..8 the far one.
    pub fn frustum_corners(&self) -> [Vec3; 8] {
        let inv = self.view_proj().inverse();
        let mut corners = [Vec3::ZERO; 8];
        let mut i = 0;
        for z in [0.0f32, 1.0] {
            for y in [-1.0f32, 1.0] {
                for x in [-1.0f32, 1.0] {
                    let p = inv * Vec4::new(x, y, z, 1.0);
                    corners[i] = p.truncate() / p.w;
                    i += 1;
                }
            }
        }
        corners
    }
}

impl Default for ProjectorCamera {
    fn default() -> Self {
        Self::new(
            Vec3::ZERO,
            Orientation::default(),
            ProjectorIntrinsics::default(),
        )
    }
}
