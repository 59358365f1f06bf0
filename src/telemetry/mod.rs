mod crc;
mod sample;
mod sentence;

pub use sample::{SampleUpdate, SharedSample, TelemetrySample};
pub use sentence::{encode, EncoderOptions, Frame, SentenceCounter};
