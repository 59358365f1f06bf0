use std::time::{Duration, Instant};

/// Sentinel for "no altitude observed yet".
pub const NO_ALTITUDE: i32 = i32::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TriggerCause {
    #[strum(serialize = "target altitude reached")]
    TargetAltitude,
    #[strum(serialize = "free fall detected")]
    FreeFall,
    #[strum(serialize = "test timer elapsed")]
    TestTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentPhase {
    Armed,
    Triggered {
        cause: TriggerCause,
        energized_at: Instant,
    },
    /// Terminal.
    Released {
        cause: TriggerCause,
        energized_at: Instant,
        released_at: Instant,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentState {
    pub phase: ExperimentPhase,
    pub max_altitude_seen: i32,
}

impl Default for ExperimentState {
    fn default() -> Self {
        Self {
            phase: ExperimentPhase::Armed,
            max_altitude_seen: NO_ALTITUDE,
        }
    }
}

impl ExperimentState {
    pub fn armed(&self) -> bool {
        matches!(self.phase, ExperimentPhase::Armed)
    }

    pub fn relay_energized(&self) -> bool {
        matches!(self.phase, ExperimentPhase::Triggered { .. })
    }

    pub fn relay_energized_at(&self) -> Option<Instant> {
        match self.phase {
            ExperimentPhase::Triggered { energized_at, .. } => Some(energized_at),
            _ => None,
        }
    }
}

/// Relay action the caller must carry out after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Energize(TriggerCause),
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSettings {
    pub target_altitude: i32,
    pub free_fall_margin: i32,
    pub hold: Duration,
    /// `Some(delay)` fires the relay `delay` after start regardless of altitude.
    pub test_delay: Option<Duration>,
}

impl TriggerSettings {
    pub const DEFAULT_FREE_FALL_MARGIN: i32 = 200;
    pub const DEFAULT_HOLD: Duration = Duration::from_secs(180);
    pub const DEFAULT_TEST_DELAY: Duration = Duration::from_secs(15);

    pub fn new(target_altitude: i32) -> Self {
        Self {
            target_altitude,
            free_fall_margin: Self::DEFAULT_FREE_FALL_MARGIN,
            hold: Self::DEFAULT_HOLD,
            test_delay: None,
        }
    }
}
