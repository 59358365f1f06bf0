use thiserror::Error;

use crate::gpio::PinError;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("relay setup failed: {0}")]
    Setup(#[source] PinError),
    /// The state machine has already moved on; the command is not retried.
    #[error("relay drive failed: {0}")]
    Relay(#[source] PinError),
}
