//! The projector tool facade: owns the rig, the depth capture stage, the
//! compositor and the frustum helper, and drives them in fixed frame phases.

use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;

use projcast_core::{
    DisposeError, Orientation, ProjectionParams, ProjectorCamera, ProjectorIntrinsics,
    ProjectorRig, constants,
};

use crate::compositor::{model_bind_group_layout, ModelRaw, ProjectiveCompositor};
use crate::depth_capture::DepthCaptureStage;
use crate::helper::FrustumHelper;
use crate::mesh::{MeshBuffers, SharedSurface};
use crate::video::VideoTexture;

/// Construction-time settings. Everything has a sensible default; hosts
/// usually override only position, orientation and the surface formats.
pub struct ToolOptions {
    pub position: glam::Vec3,
    pub orientation: Orientation,
    pub intrinsics: ProjectorIntrinsics,
    pub depth_size: u32,
    pub intensity: f32,
    pub opacity: f32,
    pub occlusion_bias: f32,
    pub edge_feather: f32,
    pub show_helper: bool,
    /// Format of the host's main color target the overlays draw into.
    pub color_format: wgpu::TextureFormat,
    /// Format of the host's main depth buffer.
    pub depth_format: wgpu::TextureFormat,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            position: glam::Vec3::ZERO,
            orientation: Orientation::default(),
            intrinsics: ProjectorIntrinsics::default(),
            depth_size: constants::DEFAULT_DEPTH_SIZE,
            intensity: constants::DEFAULT_INTENSITY,
            opacity: constants::DEFAULT_OPACITY,
            occlusion_bias: constants::DEFAULT_OCCLUSION_BIAS,
            edge_feather: constants::DEFAULT_EDGE_FEATHER,
            show_helper: true,
            color_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            depth_format: wgpu::TextureFormat::Depth32Float,
        }
    }
}

/// GPU side of one registration: the shared geometry plus the overlay and
/// proxy model uniforms.
pub struct GpuBinding {
    surface: SharedSurface,
    geometry: Arc<MeshBuffers>,
    overlay_buf: wgpu::Buffer,
    overlay_bg: wgpu::BindGroup,
    proxy_buf: wgpu::Buffer,
    proxy_bg: wgpu::BindGroup,
}

pub struct ProjectorTool {
    rig: ProjectorRig<GpuBinding>,
    video: VideoTexture,
    depth_stage: DepthCaptureStage,
    compositor: ProjectiveCompositor,
    helper: FrustumHelper,
    last_camera_view_proj: Mat4,
}

impl ProjectorTool {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        video: VideoTexture,
        options: ToolOptions,
    ) -> anyhow::Result<Self> {
        let projector = ProjectorCamera::new(options.position, options.orientation, options.intrinsics);
        let params = ProjectionParams::new(
            options.intensity,
            options.opacity,
            options.occlusion_bias,
            options.edge_feather,
        );
        let rig = ProjectorRig::new(projector, params);

        let model_bgl = model_bind_group_layout(device);
        let depth_stage = DepthCaptureStage::new(device, options.depth_size, &model_bgl)?;
        let compositor = ProjectiveCompositor::new(
            device,
            options.color_format,
            options.depth_format,
            &video,
            &depth_stage,
            model_bgl,
        );
        let mut helper = FrustumHelper::new(
            device,
            options.color_format,
            options.depth_format,
            compositor.globals_buffer(),
        );
        helper.visible = options.show_helper;
        helper.refresh(queue, &rig.projector.frustum_corners());

        log::info!(
            "[tool] ready: video {:?}, depth capture {}",
            video.size(),
            depth_stage.size()
        );
        Ok(Self {
            rig,
            video,
            depth_stage,
            compositor,
            helper,
            last_camera_view_proj: Mat4::IDENTITY,
        })
    }

    pub fn video(&self) -> &VideoTexture {
        &self.video
    }

    pub fn target_count(&self) -> usize {
        self.rig.len()
    }

    /// Register a surface as a projection target. Re-registering an already
    /// known surface is a no-op.
    pub fn add_target_mesh(&mut self, device: &wgpu::Device, surface: &SharedSurface) {
        let (id, geometry, world) = {
            let s = surface.borrow();
            (s.id(), s.geometry.clone(), s.world)
        };
        if self.rig.contains(id) {
            log::warn!("[tool] target {:?} already registered, ignoring", id);
            return;
        }

        let overlay_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay_model"),
            contents: bytemuck::bytes_of(&ModelRaw::from_world(world)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let overlay_bg = self
            .compositor
            .create_model_bind_group(device, &overlay_buf, "overlay_model_bg");
        let proxy_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("proxy_model"),
            contents: bytemuck::bytes_of(&ModelRaw::from_world(world)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let proxy_bg = self
            .compositor
            .create_model_bind_group(device, &proxy_buf, "proxy_model_bg");

        {
            let mut s = surface.borrow_mut();
            s.casts_host_shadow = true;
            s.receives_host_shadow = true;
        }
        self.rig.add_target(
            id,
            world,
            GpuBinding {
                surface: surface.clone(),
                geometry,
                overlay_buf,
                overlay_bg,
                proxy_buf,
                proxy_bg,
            },
        );
    }

    /// Unregister a surface, releasing its per-target GPU resources and
    /// restoring its host-renderer flags. Unknown surfaces are a no-op.
    pub fn remove_target_mesh(&mut self, surface: &SharedSurface) {
        let id = surface.borrow().id();
        if let Some(record) = self.rig.remove_target(id) {
            release_binding(&record.payload);
            let mut s = surface.borrow_mut();
            s.casts_host_shadow = false;
            s.receives_host_shadow = false;
        }
    }

    /// Per-frame step, called before the host's main render pass. Runs the
    /// fixed phases: proxy sync, depth capture, publish, overlay sync.
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        camera_view_proj: Mat4,
    ) {
        self.rig
            .sync_proxy_transforms(|binding| binding.surface.borrow().world);
        for (_, record) in self.rig.targets() {
            queue.write_buffer(
                &record.payload.proxy_buf,
                0,
                bytemuck::bytes_of(&ModelRaw::from_world(record.transforms.proxy_world)),
            );
        }

        self.depth_stage.capture(
            queue,
            encoder,
            self.rig.projector.view_proj(),
            self.rig
                .targets()
                .map(|(_, r)| (r.payload.geometry.as_ref(), &r.payload.proxy_bg)),
        );

        self.last_camera_view_proj = camera_view_proj;
        self.compositor
            .publish(queue, &self.rig.publish(camera_view_proj));

        self.rig
            .sync_overlay_transforms(|binding| binding.surface.borrow().world);
        for (_, record) in self.rig.targets() {
            queue.write_buffer(
                &record.payload.overlay_buf,
                0,
                bytemuck::bytes_of(&ModelRaw::from_world(record.transforms.overlay_world)),
            );
        }
    }

    /// Draw every overlay. Must be recorded into the host's main pass after
    /// its opaque geometry so the depth test sees the scene.
    pub fn draw_overlays(&self, rpass: &mut wgpu::RenderPass<'_>) {
        if self.rig.is_empty() {
            return;
        }
        self.compositor.bind(rpass);
        for (_, record) in self.rig.targets() {
            rpass.set_bind_group(1, &record.payload.overlay_bg, &[]);
            rpass.set_vertex_buffer(0, record.payload.geometry.vertex_buf.slice(..));
            rpass.set_index_buffer(
                record.payload.geometry.index_buf.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            rpass.draw_indexed(0..record.payload.geometry.index_count, 0, 0..1);
        }
    }

    /// Draw the frustum wireframe, if visible. Same pass as the overlays.
    pub fn draw_helper(&self, rpass: &mut wgpu::RenderPass<'_>) {
        self.helper.draw(rpass);
    }

    pub fn position(&self) -> glam::Vec3 {
        self.rig.projector.position()
    }

    pub fn orientation(&self) -> Orientation {
        self.rig.projector.orientation()
    }

    pub fn set_position(&mut self, queue: &wgpu::Queue, position: glam::Vec3) {
        self.rig.projector.set_position(position);
        self.after_projector_change(queue);
    }

    pub fn set_azimuth_deg(&mut self, queue: &wgpu::Queue, deg: f32) {
        self.rig.projector.set_azimuth_deg(deg);
        self.after_projector_change(queue);
    }

    pub fn set_elevation_deg(&mut self, queue: &wgpu::Queue, deg: f32) {
        self.rig.projector.set_elevation_deg(deg);
        self.after_projector_change(queue);
    }

    pub fn set_roll_deg(&mut self, queue: &wgpu::Queue, deg: f32) {
        self.rig.projector.set_roll_deg(deg);
        self.after_projector_change(queue);
    }

    pub fn opacity(&self) -> f32 {
        self.rig.params.opacity()
    }

    /// Set the blend opacity, clamped to \[0, 1\], and push the updated
    /// uniforms immediately so the change lands without waiting for the next
    /// `update`.
    pub fn set_opacity(&mut self, queue: &wgpu::Queue, value: f32) {
        self.rig.set_opacity(value);
        self.republish(queue);
    }

    pub fn set_intensity(&mut self, queue: &wgpu::Queue, value: f32) {
        self.rig.params.intensity = value;
        self.republish(queue);
    }

    pub fn set_occlusion_bias(&mut self, queue: &wgpu::Queue, value: f32) {
        self.rig.params.occlusion_bias = value;
        self.republish(queue);
    }

    pub fn set_edge_feather(&mut self, queue: &wgpu::Queue, value: f32) {
        self.rig.params.edge_feather = value;
        self.republish(queue);
    }

    pub fn helper_visible(&self) -> bool {
        self.helper.visible
    }

    pub fn set_helper_visible(&mut self, visible: bool) {
        self.helper.visible = visible;
    }

    fn after_projector_change(&mut self, queue: &wgpu::Queue) {
        self.helper
            .refresh(queue, &self.rig.projector.frustum_corners());
        self.republish(queue);
    }

    fn republish(&self, queue: &wgpu::Queue) {
        self.compositor
            .publish(queue, &self.rig.publish(self.last_camera_view_proj));
    }

    /// Release everything the tool owns: per-target buffers, the capture
    /// stage, the compositor, the helper and the video texture. Runs every
    /// step even when some fail; failures come back aggregated.
    pub fn dispose(mut self) -> Result<(), DisposeError> {
        let mut failed = Vec::new();
        let drained: Vec<_> = self.rig.drain_targets().collect();
        for (id, record) in drained {
            release_binding(&record.payload);
            // A host still holding a borrow keeps its flags; record it
            // rather than panicking mid-teardown.
            match record.payload.surface.try_borrow_mut() {
                Ok(mut s) => {
                    s.casts_host_shadow = false;
                    s.receives_host_shadow = false;
                }
                Err(_) => failed.push(format!("restore flags on target {id:?}")),
            }
        }
        self.depth_stage.destroy();
        self.compositor.destroy();
        self.helper.destroy();
        self.video.destroy();
        log::info!("[tool] disposed ({} failed steps)", failed.len());
        match DisposeError::from_steps(failed) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

fn release_binding(binding: &GpuBinding) {
    binding.overlay_buf.destroy();
    binding.proxy_buf.destroy();
}
