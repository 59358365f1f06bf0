mod dry_run;
mod sysfs;

use serde::Deserialize;
use thiserror::Error;

pub use dry_run::DryRunPin;
pub use sysfs::{SysfsPin, DEFAULT_SYSFS_ROOT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Level {
    #[strum(serialize = "high")]
    High,
    #[strum(serialize = "low")]
    Low,
}

/// Which output level fires the attached actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum RelayPolarity {
    #[strum(serialize = "active-high")]
    ActiveHigh,
    /// Idle high, fires when driven low.
    #[default]
    #[strum(serialize = "active-low")]
    ActiveLow,
}

impl RelayPolarity {
    pub fn active_level(&self) -> Level {
        match self {
            RelayPolarity::ActiveHigh => Level::High,
            RelayPolarity::ActiveLow => Level::Low,
        }
    }

    pub fn idle_level(&self) -> Level {
        match self {
            RelayPolarity::ActiveHigh => Level::Low,
            RelayPolarity::ActiveLow => Level::High,
        }
    }
}

#[derive(Debug, Error)]
pub enum PinError {
    #[error("gpio {pin}: {source}")]
    Io {
        pin: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("gpio {0} used before it was configured as an output")]
    NotConfigured(u32),
}

/// Digital output owned by whoever drives the relay.
pub trait OutputPin: Send {
    fn configure_output(&mut self) -> Result<(), PinError>;
    fn set_output(&mut self, level: Level) -> Result<(), PinError>;
}
