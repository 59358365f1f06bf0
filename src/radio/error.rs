use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FrequencyError {
    #[error("empty frequency")]
    Empty,
    #[error("invalid channel number: {0}")]
    InvalidChannel(String),
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),
    #[error("{mhz:.4}MHz is outside the transmitter's tuning range")]
    OutOfRange { mhz: f64 },
}
