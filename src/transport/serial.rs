use std::{io::Write, path::Path, thread, time::Duration};

use log::info;
use serialport::{DataBits, SerialPort, StopBits};

use super::{Transport, TransportError};
use crate::radio::{RadioVariant, TuningCommand};

/// Telemetry speeds the transmitters are driven at.
pub const SUPPORTED_BAUD_RATES: [u32; 7] = [50, 75, 150, 200, 300, 600, 1200];

// Writes at 50 baud take seconds; the timeout has to cover a whole sentence.
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SerialTransport {
    device: String,
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens `device` for telemetry: 8 data bits, 2 stop bits.
    pub fn open(device: &Path, baud: u32) -> Result<Self, TransportError> {
        let device = device.display().to_string();
        let port = open_port(&device, baud, StopBits::Two)?;
        info!("Radio on {} at {} baud", device, baud);
        Ok(Self { device, port })
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("device", &self.device)
            .finish()
    }
}

/// Writes a tuning command at the transmitter's command speed.
pub fn send_tuning_command(
    device: &Path,
    variant: RadioVariant,
    command: &TuningCommand,
) -> Result<(), TransportError> {
    let device = device.display().to_string();
    let mut port = open_port(&device, variant.tuning_baud(), StopBits::One)?;

    port.write_all(command.as_bytes())?;
    port.flush()?;
    // Give the synthesiser time to latch before the port changes speed
    thread::sleep(Duration::from_millis(100));

    info!("{} tuned to {:.4}MHz with {}", variant, command.mhz(), command);
    Ok(())
}

fn open_port(
    device: &str,
    baud: u32,
    stop_bits: StopBits,
) -> Result<Box<dyn SerialPort>, TransportError> {
    serialport::new(device, baud)
        .data_bits(DataBits::Eight)
        .stop_bits(stop_bits)
        .timeout(WRITE_TIMEOUT)
        .open()
        .map_err(|source| TransportError::Serial {
            device: device.to_string(),
            source,
        })
}
