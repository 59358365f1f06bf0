use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum FaultSource {
    #[strum(serialize = "relay")]
    Relay,
    #[strum(serialize = "radio")]
    Transport,
    #[strum(serialize = "sensors")]
    Sensors,
}

/// Fault the operator has to see. Can be sent by any worker; the flight
/// runner logs it. Nothing is retried on the sender's side.
#[derive(Debug, Clone)]
pub struct FlightFault {
    pub source: FaultSource,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct FaultSender {
    tx: mpsc::UnboundedSender<FlightFault>,
}

impl FaultSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FlightFault>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn report(&self, source: FaultSource, reason: impl ToString) {
        let _ = self.tx.send(FlightFault {
            source,
            reason: reason.to_string(),
        });
    }
}
