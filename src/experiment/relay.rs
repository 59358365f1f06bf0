use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use super::controller::ExperimentController;
use super::error::ExperimentError;
use super::types::{ExperimentPhase, Transition, TriggerCause, TriggerSettings};
use crate::gpio::{OutputPin, RelayPolarity};

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentStatus {
    pub phase: ExperimentPhase,
    pub max_altitude_seen: i32,
    pub cause: Option<TriggerCause>,
    pub energized_utc: Option<DateTime<Utc>>,
    pub released_utc: Option<DateTime<Utc>>,
}

struct Inner {
    controller: ExperimentController,
    pin: Box<dyn OutputPin>,
    polarity: RelayPolarity,
    energized_utc: Option<DateTime<Utc>>,
    released_utc: Option<DateTime<Utc>>,
}

/// The trigger controller bound to its relay output.
///
/// Altitude observations and timer ticks may arrive from different threads.
/// Each call evaluates the transition and drives the pin under one lock, so a
/// transition's relay command is issued at most once.
pub struct Experiment {
    inner: Mutex<Inner>,
}

impl Experiment {
    /// Configures the relay line as an output and parks it at the idle level.
    pub fn new(
        settings: TriggerSettings,
        started: Instant,
        mut pin: Box<dyn OutputPin>,
        polarity: RelayPolarity,
    ) -> Result<Self, ExperimentError> {
        pin.configure_output().map_err(ExperimentError::Setup)?;
        pin.set_output(polarity.idle_level())
            .map_err(ExperimentError::Setup)?;

        info!(
            "Experiment armed: target {}m, free-fall margin {}m, hold {:?}, relay {}",
            settings.target_altitude, settings.free_fall_margin, settings.hold, polarity
        );
        if let Some(delay) = settings.test_delay {
            warn!("TEST MODE: relay fires {:?} after start", delay);
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                controller: ExperimentController::new(settings, started),
                pin,
                polarity,
                energized_utc: None,
                released_utc: None,
            }),
        })
    }

    pub fn observe_altitude(
        &self,
        altitude: i32,
        now: Instant,
    ) -> Result<Option<Transition>, ExperimentError> {
        let mut inner = self.lock();
        let transition = inner.controller.observe_altitude(altitude, now);
        if transition.is_some() {
            info!("Trigger condition met at {}m", altitude);
        }
        inner.apply(transition)
    }

    pub fn tick(&self, now: Instant) -> Result<Option<Transition>, ExperimentError> {
        let mut inner = self.lock();
        let transition = inner.controller.tick(now);
        inner.apply(transition)
    }

    pub fn status(&self) -> ExperimentStatus {
        let inner = self.lock();
        let state = inner.controller.state();
        let cause = match state.phase {
            ExperimentPhase::Armed => None,
            ExperimentPhase::Triggered { cause, .. } | ExperimentPhase::Released { cause, .. } => {
                Some(cause)
            }
        };
        ExperimentStatus {
            phase: state.phase,
            max_altitude_seen: state.max_altitude_seen,
            cause,
            energized_utc: inner.energized_utc,
            released_utc: inner.released_utc,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic elsewhere must not stop the relay from being released
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn apply(
        &mut self,
        transition: Option<Transition>,
    ) -> Result<Option<Transition>, ExperimentError> {
        let Some(transition) = transition else {
            return Ok(None);
        };

        let level = match transition {
            Transition::Energize(cause) => {
                info!("Firing relay: {}", cause);
                self.energized_utc = Some(Utc::now());
                self.polarity.active_level()
            }
            Transition::Release => {
                info!("Hold time elapsed, releasing relay");
                self.released_utc = Some(Utc::now());
                self.polarity.idle_level()
            }
        };

        if let Err(e) = self.pin.set_output(level) {
            error!("Relay output could not be set to {}: {}", level, e);
            return Err(ExperimentError::Relay(e));
        }
        Ok(Some(transition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{Level, PinError};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingPin {
        writes: Arc<Mutex<Vec<Level>>>,
        fail: bool,
    }

    impl OutputPin for RecordingPin {
        fn configure_output(&mut self) -> Result<(), PinError> {
            Ok(())
        }

        fn set_output(&mut self, level: Level) -> Result<(), PinError> {
            self.writes.lock().unwrap().push(level);
            if self.fail {
                return Err(PinError::Io {
                    pin: 17,
                    source: std::io::Error::other("line busy"),
                });
            }
            Ok(())
        }
    }

    fn experiment(pin: RecordingPin, settings: TriggerSettings, start: Instant) -> Experiment {
        Experiment::new(settings, start, Box::new(pin), RelayPolarity::ActiveLow).unwrap()
    }

    #[test]
    fn setup_parks_relay_at_idle_level() {
        let pin = RecordingPin::default();
        let _exp = experiment(pin.clone(), TriggerSettings::new(10_000), Instant::now());
        assert_eq!(*pin.writes.lock().unwrap(), vec![Level::High]);
    }

    #[test]
    fn full_flight_drives_active_then_idle() {
        let pin = RecordingPin::default();
        let start = Instant::now();
        let exp = experiment(pin.clone(), TriggerSettings::new(10_000), start);

        exp.observe_altitude(9_000, start).unwrap();
        exp.observe_altitude(10_001, start + Duration::from_secs(1))
            .unwrap();
        exp.observe_altitude(10_500, start + Duration::from_secs(2))
            .unwrap();
        exp.tick(start + Duration::from_secs(100)).unwrap();
        exp.tick(start + Duration::from_secs(200)).unwrap();
        exp.tick(start + Duration::from_secs(300)).unwrap();

        assert_eq!(
            *pin.writes.lock().unwrap(),
            vec![Level::High, Level::Low, Level::High]
        );
        let status = exp.status();
        assert!(matches!(status.phase, ExperimentPhase::Released { .. }));
        assert_eq!(status.cause, Some(TriggerCause::TargetAltitude));
        assert!(status.energized_utc.is_some());
        assert!(status.released_utc.is_some());
    }

    #[test]
    fn drive_failure_is_reported_once_and_not_retried() {
        let pin = RecordingPin::default();
        let start = Instant::now();
        let exp = experiment(pin.clone(), TriggerSettings::new(1_000), start);

        let failing = RecordingPin {
            writes: pin.writes.clone(),
            fail: true,
        };
        exp.lock().pin = Box::new(failing);

        assert!(matches!(
            exp.observe_altitude(1_000, start),
            Err(ExperimentError::Relay(_))
        ));
        assert!(exp.status().cause.is_some());

        // Later observations must not try to fire again
        assert!(exp.observe_altitude(2_000, start).unwrap().is_none());
        assert_eq!(pin.writes.lock().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_observers_fire_exactly_once() {
        let pin = RecordingPin::default();
        let start = Instant::now();
        let exp = Arc::new(experiment(pin.clone(), TriggerSettings::new(1_000), start));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let exp = exp.clone();
                thread::spawn(move || {
                    for alt in 900..1_100 {
                        exp.observe_altitude(alt, Instant::now()).unwrap();
                        exp.tick(Instant::now()).unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let writes = pin.writes.lock().unwrap();
        assert_eq!(writes.iter().filter(|l| **l == Level::Low).count(), 1);
    }
}
