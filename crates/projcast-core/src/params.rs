//! Shared compositing parameter state and its GPU-visible layout.

use glam::Mat4;

use crate::constants::{
    DEFAULT_EDGE_FEATHER, DEFAULT_INTENSITY, DEFAULT_OCCLUSION_BIAS, DEFAULT_OPACITY,
};

/// Mutable compositing parameters shared by every overlay draw.
///
/// Opacity is clamped to \[0, 1\] at every write site. Intensity, occlusion
/// bias and edge feather deliberately accept any float the caller supplies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionParams {
    pub intensity: f32,
    opacity: f32,
    pub occlusion_bias: f32,
    pub edge_feather: f32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            intensity: DEFAULT_INTENSITY,
            opacity: DEFAULT_OPACITY,
            occlusion_bias: DEFAULT_OCCLUSION_BIAS,
            edge_feather: DEFAULT_EDGE_FEATHER,
        }
    }
}

impl ProjectionParams {
    pub fn new(intensity: f32, opacity: f32, occlusion_bias: f32, edge_feather: f32) -> Self {
        let mut params = Self {
            intensity,
            opacity: DEFAULT_OPACITY,
            occlusion_bias,
            edge_feather,
        };
        params.set_opacity(opacity);
        params
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, value: f32) {
        self.opacity = value.clamp(0.0, 1.0);
    }
}

/// Raw uniform block for the compositor and frustum helper, written once per
/// frame (and again on explicit control calls).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ProjectionGlobalsRaw {
    pub camera_view_proj: [[f32; 4]; 4],
    pub projector_view_proj: [[f32; 4]; 4],
    pub intensity: f32,
    pub opacity: f32,
    pub occlusion_bias: f32,
    pub edge_feather: f32,
}

impl ProjectionGlobalsRaw {
    pub fn pack(
        camera_view_proj: Mat4,
        projector_view_proj: Mat4,
        params: &ProjectionParams,
    ) -> Self {
        Self {
            camera_view_proj: camera_view_proj.to_cols_array_2d(),
            projector_view_proj: projector_view_proj.to_cols_array_2d(),
            intensity: params.intensity,
            opacity: params.opacity(),
            occlusion_bias: params.occlusion_bias,
            edge_feather: params.edge_feather,
        }
    }
}
