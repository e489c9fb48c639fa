//! # Inverse Ballistics
//!
//! Synthetic inverse-problem dataset: launch parameters of a projectile under
//! gravity and linear drag, paired with where it hits the ground.

// Re-export the main types and functions
pub use config::DatasetConfig;
pub use dataset::InverseBallisticsDataset;
pub use error::{BallisticsError, Result};
pub use forward::{forward_process, forward_process_chunked};
pub use impact::{crossing_impacts, impact_from_curve, impacts_from_trajectories};
pub use loader::{IndexedDataset, ShuffledBatches};
pub use map_estimate::{find_map, EstimationError, MapEstimate, MapEstimator};
pub use model::{ForwardModel, InverseBallisticsModel, ParameterVector, PhysicsConstants};
pub use prior::Prior;
pub use render::{prepare_sample_figure, RenderOptions, Renderer, SampleFigure};
pub use storage::{ArtifactKey, ArtifactRole, ArtifactStore, DirectoryStore, MemoryStore};
pub use trajectory::{time_grid, trajectories_from_parameters, TrajectoryBatch};

// Module declarations
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod forward;
pub mod impact;
pub mod kde;
pub mod loader;
pub mod map_estimate;
pub mod mean_shift;
pub mod model;
pub mod prior;
pub mod render;
pub mod storage;
pub mod trajectory;
