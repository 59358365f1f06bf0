use std::io::{self, Write};

use super::{Transport, TransportError};

/// Prints frames to stdout instead of keying a transmitter.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl Transport for ConsoleTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut out = io::stdout().lock();
        out.write_all(bytes)?;
        out.flush()?;
        Ok(())
    }
}
