use std::time::Instant;

use super::types::{ExperimentPhase, ExperimentState, Transition, TriggerCause, TriggerSettings};

/// One-shot trigger state machine: `Armed -> Triggered -> Released`.
///
/// Pure state; the caller owns the relay and performs the returned
/// [`Transition`]s.
#[derive(Debug, Clone)]
pub struct ExperimentController {
    settings: TriggerSettings,
    started: Instant,
    state: ExperimentState,
}

impl ExperimentController {
    pub fn new(settings: TriggerSettings, started: Instant) -> Self {
        Self {
            settings,
            started,
            state: ExperimentState::default(),
        }
    }

    pub fn state(&self) -> &ExperimentState {
        &self.state
    }

    pub fn observe_altitude(&mut self, altitude: i32, now: Instant) -> Option<Transition> {
        self.state.max_altitude_seen = self.state.max_altitude_seen.max(altitude);

        if !self.state.armed() {
            return None;
        }

        if altitude >= self.settings.target_altitude {
            return Some(self.energize(TriggerCause::TargetAltitude, now));
        }

        let drop = self.state.max_altitude_seen as i64 - altitude as i64;
        if drop >= self.settings.free_fall_margin as i64 {
            return Some(self.energize(TriggerCause::FreeFall, now));
        }

        None
    }

    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        match self.state.phase {
            ExperimentPhase::Armed => {
                let delay = self.settings.test_delay?;
                if now.saturating_duration_since(self.started) >= delay {
                    Some(self.energize(TriggerCause::TestTimer, now))
                } else {
                    None
                }
            }
            ExperimentPhase::Triggered {
                cause,
                energized_at,
            } => {
                if now.saturating_duration_since(energized_at) < self.settings.hold {
                    return None;
                }
                self.state.phase = ExperimentPhase::Released {
                    cause,
                    energized_at,
                    released_at: now,
                };
                Some(Transition::Release)
            }
            ExperimentPhase::Released { .. } => None,
        }
    }

    fn energize(&mut self, cause: TriggerCause, now: Instant) -> Transition {
        self.state.phase = ExperimentPhase::Triggered {
            cause,
            energized_at: now,
        };
        Transition::Energize(cause)
    }
}

#[cfg(test)]
mod tests;
