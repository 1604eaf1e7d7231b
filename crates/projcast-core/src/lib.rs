pub mod composite;
pub mod constants;
pub mod error;
pub mod params;
pub mod projector;
pub mod registry;
pub mod rig;

pub use composite::{composite_fragment, edge_factor, occluded, project_point, ProjectorSample};
pub use constants::*;
pub use error::DisposeError;
pub use params::{ProjectionGlobalsRaw, ProjectionParams};
pub use projector::{Orientation, ProjectorCamera, ProjectorIntrinsics};
pub use registry::{RegistrationTable, SurfaceId};
pub use rig::{ProjectorRig, TargetRecord, TargetTransforms};
