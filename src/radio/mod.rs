mod error;
mod frequency;

use serde::Deserialize;

pub use error::FrequencyError;
pub use frequency::{encode_tuning_command, FrequencySpec, TuningCommand};

/// Transmitter fitted to the board. Each takes a different tuning command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RadioVariant {
    #[strum(serialize = "MTX2")]
    Mtx2,
    #[strum(serialize = "NTX2B")]
    Ntx2b,
}

impl RadioVariant {
    /// Serial speed the transmitter listens on for tuning commands.
    pub fn tuning_baud(&self) -> u32 {
        match self {
            RadioVariant::Mtx2 => 9600,
            RadioVariant::Ntx2b => 4800,
        }
    }
}
