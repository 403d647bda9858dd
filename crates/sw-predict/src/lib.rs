pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod error;
pub mod layout;
pub mod output;
pub mod partition;
pub mod registry;
pub mod runner;

pub use config::{ModelBinding, PredictionConfig};
pub use dataset::{Dataset, Subset, SubsetItem, SwipeRecord};
pub use dispatch::{DecodeFailure, DispatchOutcome, ParallelDispatcher, PredictorFactory};
pub use error::{PredictError, Result};
pub use layout::{Curve, KeyboardLayout, LayoutSet};
pub use output::PredictionArtifact;
pub use partition::{partition, Shard, WorkItem};
pub use registry::RunRegistry;
pub use runner::{BindingReport, BindingStatus, RunReport, Runner};
