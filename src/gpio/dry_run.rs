use log::info;

use super::{Level, OutputPin, PinError};

/// Stands in for the relay line on the bench; only logs.
pub struct DryRunPin {
    pin: u32,
}

impl DryRunPin {
    pub fn new(pin: u32) -> Self {
        Self { pin }
    }
}

impl OutputPin for DryRunPin {
    fn configure_output(&mut self) -> Result<(), PinError> {
        info!("[dry-run] gpio {} configured as output", self.pin);
        Ok(())
    }

    fn set_output(&mut self, level: Level) -> Result<(), PinError> {
        info!("[dry-run] gpio {} -> {}", self.pin, level);
        Ok(())
    }
}
