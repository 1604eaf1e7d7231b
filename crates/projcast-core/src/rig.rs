//! Frame orchestration state: the projector, the shared compositing
//! parameters, and per-target transform records, stepped in fixed phases.
//!
//! Frame order is `sync_proxy_transforms` → depth capture (GPU side) →
//! `publish` → `sync_overlay_transforms`. Keeping the phases as named
//! methods makes the ordering a property of the call site's structure
//! rather than a convention: the depth buffer the compositor consumes is
//! always the one captured after this frame's proxy sync.

use glam::Mat4;

use crate::params::{ProjectionGlobalsRaw, ProjectionParams};
use crate::projector::ProjectorCamera;
use crate::registry::{RegistrationTable, SurfaceId};

/// Per-target transform copies. Overlay and proxy each carry their own copy
/// of the source surface's world transform, refreshed in different phases.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetTransforms {
    pub overlay_world: Mat4,
    pub proxy_world: Mat4,
}

/// One registration: CPU transform state plus whatever the embedding layer
/// attaches (GPU bindings, test fixtures, ...).
#[derive(Debug)]
pub struct TargetRecord<T> {
    pub transforms: TargetTransforms,
    pub payload: T,
}

/// Projector plus registered targets; the pure core of the projector tool.
#[derive(Debug)]
pub struct ProjectorRig<T> {
    pub projector: ProjectorCamera,
    pub params: ProjectionParams,
    targets: RegistrationTable<TargetRecord<T>>,
}

impl<T> ProjectorRig<T> {
    pub fn new(projector: ProjectorCamera, params: ProjectionParams) -> Self {
        Self {
            projector,
            params,
            targets: RegistrationTable::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.targets.contains(id)
    }

    /// Register a target with its current world transform copied into both
    /// the overlay and proxy slots. Duplicate ids are a no-op.
    pub fn add_target(&mut self, id: SurfaceId, world: Mat4, payload: T) -> bool {
        let added = self.targets.insert(
            id,
            TargetRecord {
                transforms: TargetTransforms {
                    overlay_world: world,
                    proxy_world: world,
                },
                payload,
            },
        );
        if added {
            log::info!("[rig] registered target {:?} ({} total)", id, self.len());
        }
        added
    }

    /// Unregister a target, yielding its record for release. Unknown ids are
    /// a no-op.
    pub fn remove_target(&mut self, id: SurfaceId) -> Option<TargetRecord<T>> {
        let removed = self.targets.remove(id);
        if removed.is_some() {
            log::info!("[rig] removed target {:?} ({} left)", id, self.len());
        }
        removed
    }

    pub fn target(&self, id: SurfaceId) -> Option<&TargetRecord<T>> {
        self.targets.get(id)
    }

    pub fn targets(&self) -> impl Iterator<Item = (SurfaceId, &TargetRecord<T>)> {
        self.targets.iter()
    }

    /// Phase (a): every proxy follows its source surface's world transform.
    pub fn sync_proxy_transforms(&mut self, mut source_world: impl FnMut(&T) -> Mat4) {
        for (_, record) in self.targets.iter_mut() {
            record.transforms.proxy_world = source_world(&record.payload);
        }
    }

    /// Phase (c): pack the shared uniform block from the projector's current
    /// view-projection and parameters.
    pub fn publish(&self, camera_view_proj: Mat4) -> ProjectionGlobalsRaw {
        ProjectionGlobalsRaw::pack(camera_view_proj, self.projector.view_proj(), &self.params)
    }

    /// Phase (d): every overlay follows its source surface's world transform.
    pub fn sync_overlay_transforms(&mut self, mut source_world: impl FnMut(&T) -> Mat4) {
        for (_, record) in self.targets.iter_mut() {
            record.transforms.overlay_world = source_world(&record.payload);
        }
    }

    pub fn set_opacity(&mut self, value: f32) {
        self.params.set_opacity(value);
    }

    /// Empty the registration table, yielding every record for release.
    pub fn drain_targets(&mut self) -> impl Iterator<Item = (SurfaceId, TargetRecord<T>)> + '_ {
        self.targets.drain()
    }
}
