use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Latest sensor snapshot. Written by the acquisition side, read by the encoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySample {
    /// Fixed at startup from configuration.
    pub payload_id: String,
    /// UTC time of day as fixed-point HHMMSS (e.g. `123456.0`).
    pub time: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above mean sea level.
    pub altitude: i32,
    pub speed: f64,
    pub heading: f64,
    pub satellites: u32,
    pub internal_temperature: f64,
    pub battery_voltage: f64,
    /// Amps.
    pub board_current: Option<f64>,
    pub external_temperature: Option<f64>,
    pub pressure: Option<f64>,
}

/// A partial reading from one sensor source. Only present fields overwrite the sample.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SampleUpdate {
    pub time: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<i32>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub satellites: Option<u32>,
    pub internal_temperature: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub board_current: Option<f64>,
    pub external_temperature: Option<f64>,
    pub pressure: Option<f64>,
}

impl SampleUpdate {
    pub fn apply_to(&self, sample: &mut TelemetrySample) {
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }

        set(&mut sample.time, self.time);
        set(&mut sample.latitude, self.latitude);
        set(&mut sample.longitude, self.longitude);
        set(&mut sample.altitude, self.altitude);
        set(&mut sample.speed, self.speed);
        set(&mut sample.heading, self.heading);
        set(&mut sample.satellites, self.satellites);
        set(&mut sample.internal_temperature, self.internal_temperature);
        set(&mut sample.battery_voltage, self.battery_voltage);

        if self.board_current.is_some() {
            sample.board_current = self.board_current;
        }
        if self.external_temperature.is_some() {
            sample.external_temperature = self.external_temperature;
        }
        if self.pressure.is_some() {
            sample.pressure = self.pressure;
        }
    }
}

/// Snapshot-replace cell shared between sensor workers and the transmit loop.
///
/// Writers clone, modify and swap the whole record under one lock; readers get
/// an `Arc` to a complete record and never see a half-applied update.
#[derive(Debug, Default)]
pub struct SharedSample {
    latest: Mutex<Arc<TelemetrySample>>,
}

impl SharedSample {
    pub fn new(initial: TelemetrySample) -> Self {
        Self {
            latest: Mutex::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<TelemetrySample> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies `update` and returns the snapshot that replaced the previous one.
    pub fn apply(&self, update: &SampleUpdate) -> Arc<TelemetrySample> {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = TelemetrySample::clone(&latest);
        update.apply_to(&mut next);
        let next = Arc::new(next);
        *latest = next.clone();
        next
    }
}
