mod controller;
mod error;
mod relay;
mod types;

pub use error::ExperimentError;
pub use relay::Experiment;
pub use types::{ExperimentPhase, TriggerCause, TriggerSettings};
