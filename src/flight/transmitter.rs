use log::{debug, warn};

use crate::telemetry::{encode, EncoderOptions, Frame, SentenceCounter, TelemetrySample};
use crate::transport::{TelemetryLog, Transport, TransportError};

/// Encodes numbered sentences and hands them to the radio transport.
pub struct Transmitter {
    transport: Box<dyn Transport>,
    log: Option<TelemetryLog>,
    counter: SentenceCounter,
    options: EncoderOptions,
}

impl Transmitter {
    pub fn new(
        transport: Box<dyn Transport>,
        log: Option<TelemetryLog>,
        options: EncoderOptions,
    ) -> Self {
        Self {
            transport,
            log,
            counter: SentenceCounter::default(),
            options,
        }
    }

    /// A sentence number is spent even when the send fails.
    pub fn transmit(&mut self, sample: &TelemetrySample) -> Result<Frame, TransportError> {
        let frame = encode(sample, self.counter.next(), self.options);
        self.transport.send(frame.as_bytes())?;
        debug!("Sent {}", frame.as_str().trim_end());

        if let Some(log) = &mut self.log {
            if let Err(e) = log.append(frame.as_bytes()) {
                warn!("Telemetry log write failed: {}", e);
            }
        }
        Ok(frame)
    }
}
