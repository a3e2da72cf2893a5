// Public modules
pub mod actions;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod output;
pub mod registry;
pub mod runner;
pub mod step;

// Re-export common types for convenience
pub use context::{ArtifactDescriptor, ExecutionContext};
pub use error::{Error, ErrorCode, Result};
pub use registry::StepRegistry;
pub use runner::{PipelineRunner, RunReport};
pub use step::{Step, StepAction, StepBody};
