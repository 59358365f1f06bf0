use std::fmt::{self, Write};

use super::crc::Crc16;
use super::sample::TelemetrySample;

/// Bytes at the start of every sentence that are excluded from the checksum.
const FRAME_MARKER: &str = "$$";

/// Per-hardware optional fields. Decided at configuration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    pub include_board_current: bool,
    pub include_environmental: bool,
}

/// Sentence counter. Never reset; the first sentence is number 1.
#[derive(Debug, Default)]
pub struct SentenceCounter {
    last: u64,
}

impl SentenceCounter {
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// One checksummed, newline-terminated telemetry sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    text: String,
    checksum: u16,
}

impl Frame {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn encode(sample: &TelemetrySample, counter: u64, options: EncoderOptions) -> Frame {
    let mut text = String::with_capacity(128);
    // Writing into a String cannot fail.
    let checksum = encode_into(&mut text, sample, counter, options).unwrap_or_default();
    Frame { text, checksum }
}

/// Streams the sentence into `out` and returns the checksum that was appended.
pub fn encode_into<W: Write>(
    out: &mut W,
    sample: &TelemetrySample,
    counter: u64,
    options: EncoderOptions,
) -> Result<u16, fmt::Error> {
    out.write_str(FRAME_MARKER)?;

    let mut body = ChecksumWriter {
        inner: out,
        crc: Crc16::default(),
    };

    let (hh, mm, ss) = time_of_day(sample.time);
    write!(
        body,
        "{},{},{:02}:{:02}:{:02},{:7.5},{:7.5},{:05},{},{},{},{:3.1},{:3.1}",
        sample.payload_id,
        counter,
        hh,
        mm,
        ss,
        finite(sample.latitude),
        finite(sample.longitude),
        sample.altitude as u32,
        (finite(sample.speed) * 13.0 / 7.0) as i64,
        finite(sample.heading) as i64,
        sample.satellites,
        finite(sample.internal_temperature),
        finite(sample.battery_voltage),
    )?;

    if options.include_board_current {
        let milliamps = finite(sample.board_current.unwrap_or(0.0)) * 1000.0;
        write!(body, ",{:.0}", milliamps)?;
    }

    if options.include_environmental {
        write!(
            body,
            ",{:.1},{:.0}",
            finite(sample.external_temperature.unwrap_or(0.0)),
            finite(sample.pressure.unwrap_or(0.0)),
        )?;
    }

    let checksum = body.crc.value();
    writeln!(out, "*{:04X}", checksum)?;
    Ok(checksum)
}

struct ChecksumWriter<'a, W> {
    inner: &'a mut W,
    crc: Crc16,
}

impl<W: Write> Write for ChecksumWriter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.crc.update(s.as_bytes());
        self.inner.write_str(s)
    }
}

/// HHMMSS fixed point to whole (hours, minutes, seconds).
fn time_of_day(hhmmss: f64) -> (u32, u32, u32) {
    let whole = if hhmmss.is_finite() && hhmmss > 0.0 {
        (hhmmss.trunc() as u32).min(999_999)
    } else {
        0
    };
    (whole / 10_000, (whole / 100) % 100, whole % 100)
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
