use std::fmt;
use std::str::FromStr;

use super::{FrequencyError, RadioVariant};

/// Channel 0 of the 434MHz band plan.
pub const BASE_MHZ: f64 = 434.05;
pub const CHANNEL_STEP_MHZ: f64 = 0.003125;

/// Operator supplied frequency: a short hex channel code or a decimal MHz value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencySpec {
    Channel(u8),
    Mhz(f64),
}

impl FrequencySpec {
    pub fn parse(input: &str) -> Result<Self, FrequencyError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(FrequencyError::Empty);
        }

        // Anything shorter than three characters is a channel number
        if s.len() < 3 {
            return u8::from_str_radix(s, 16)
                .map(FrequencySpec::Channel)
                .map_err(|_| FrequencyError::InvalidChannel(s.to_string()));
        }

        s.parse::<f64>()
            .ok()
            .filter(|mhz| mhz.is_finite())
            .map(FrequencySpec::Mhz)
            .ok_or_else(|| FrequencyError::InvalidFrequency(s.to_string()))
    }

    pub fn mhz(&self) -> f64 {
        match self {
            FrequencySpec::Channel(channel) => channel_to_mhz(*channel),
            FrequencySpec::Mhz(mhz) => *mhz,
        }
    }
}

impl FromStr for FrequencySpec {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub fn channel_to_mhz(channel: u8) -> f64 {
    channel as f64 * CHANNEL_STEP_MHZ + BASE_MHZ
}

pub fn mhz_to_channel(mhz: f64) -> Result<u8, FrequencyError> {
    let channel = ((mhz - BASE_MHZ) / CHANNEL_STEP_MHZ).round();
    if !(0.0..=255.0).contains(&channel) {
        return Err(FrequencyError::OutOfRange { mhz });
    }
    Ok(channel as u8)
}

/// Raw bytes to write to the transmitter's serial port.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningCommand {
    bytes: Vec<u8>,
    mhz: f64,
}

impl TuningCommand {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frequency the transmitter ends up on.
    pub fn mhz(&self) -> f64 {
        self.mhz
    }
}

impl fmt::Display for TuningCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes.escape_ascii())
    }
}

pub fn encode_tuning_command(
    spec: &FrequencySpec,
    variant: RadioVariant,
) -> Result<TuningCommand, FrequencyError> {
    match variant {
        RadioVariant::Mtx2 => mtx2_command(spec.mhz()),
        RadioVariant::Ntx2b => {
            let channel = match spec {
                FrequencySpec::Channel(channel) => *channel,
                FrequencySpec::Mhz(mhz) => mhz_to_channel(*mhz)?,
            };
            let mut bytes = vec![0x80];
            bytes.extend_from_slice(format!("ch{:02X}\r", channel).as_bytes());
            Ok(TuningCommand {
                bytes,
                mhz: channel_to_mhz(channel),
            })
        }
    }
}

/// The MTX2 synthesiser takes an integer divider and a 19-bit fraction offset
/// by one. The register math runs in single precision like the module's own
/// reference code, so commands match the ones flown before.
fn mtx2_command(mhz: f64) -> Result<TuningCommand, FrequencyError> {
    let comp = ((mhz + 0.0015) / 6.5) as f32;
    if !(1.0..257.0).contains(&comp) {
        return Err(FrequencyError::OutOfRange { mhz });
    }

    let integer = comp as i32;
    let fractional = ((comp - integer as f32) + 1.0) * 524_288.0;
    let command = format!("@PRG_{:02X}{:06X}\r", integer - 1, fractional as u32);

    Ok(TuningCommand {
        bytes: command.into_bytes(),
        mhz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_codes_are_hex_channels() {
        assert_eq!(FrequencySpec::parse("8"), Ok(FrequencySpec::Channel(8)));
        assert_eq!(FrequencySpec::parse("1F"), Ok(FrequencySpec::Channel(0x1F)));
        assert_eq!(
            FrequencySpec::parse("434.075"),
            Ok(FrequencySpec::Mhz(434.075))
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        assert_eq!(FrequencySpec::parse("  "), Err(FrequencyError::Empty));
        assert_eq!(
            FrequencySpec::parse("zz"),
            Err(FrequencyError::InvalidChannel("zz".into()))
        );
        assert_eq!(
            FrequencySpec::parse("abc"),
            Err(FrequencyError::InvalidFrequency("abc".into()))
        );
        assert!(FrequencySpec::parse("inf").is_err());
    }

    #[test]
    fn mtx2_reference_command() {
        let spec = FrequencySpec::parse("434.075").unwrap();
        let command = encode_tuning_command(&spec, RadioVariant::Mtx2).unwrap();
        assert_eq!(command.as_bytes(), b"@PRG_410E3F7C\r");
        assert_eq!(command.mhz(), 434.075);
    }

    #[test]
    fn mtx2_accepts_channel_codes() {
        let spec = FrequencySpec::parse("10").unwrap();
        let command = encode_tuning_command(&spec, RadioVariant::Mtx2).unwrap();
        assert_eq!(command.as_bytes(), b"@PRG_410E475C\r");
    }

    #[test]
    fn mtx2_rejects_unreachable_frequency() {
        let spec = FrequencySpec::Mhz(2.0);
        assert_eq!(
            encode_tuning_command(&spec, RadioVariant::Mtx2),
            Err(FrequencyError::OutOfRange { mhz: 2.0 })
        );
    }

    #[test]
    fn ntx2b_command_from_mhz() {
        let spec = FrequencySpec::parse("434.075").unwrap();
        let command = encode_tuning_command(&spec, RadioVariant::Ntx2b).unwrap();
        assert_eq!(command.as_bytes(), b"\x80ch08\r");
        assert_eq!(command.mhz(), channel_to_mhz(8));
        assert_eq!(command.to_string(), "\\x80ch08\\r");
    }

    #[test]
    fn ntx2b_command_from_channel() {
        let spec = FrequencySpec::parse("1f").unwrap();
        let command = encode_tuning_command(&spec, RadioVariant::Ntx2b).unwrap();
        assert_eq!(command.as_bytes(), b"\x80ch1F\r");
    }

    #[test]
    fn channel_conversions_are_inverse() {
        for channel in [0u8, 8, 64, 191, 255] {
            assert_eq!(mhz_to_channel(channel_to_mhz(channel)), Ok(channel));
        }
        assert!(mhz_to_channel(433.9).is_err());
        assert!(mhz_to_channel(435.0).is_err());
    }
}
