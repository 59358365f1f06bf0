mod console;
mod log_file;
mod serial;

use thiserror::Error;

pub use console::ConsoleTransport;
pub use log_file::TelemetryLog;
pub use serial::{send_tuning_command, SerialTransport, SUPPORTED_BAUD_RATES};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("serial port {device}: {source}")]
    Serial {
        device: String,
        #[source]
        source: serialport::Error,
    },
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte sink that carries frames to the radio.
pub trait Transport: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
