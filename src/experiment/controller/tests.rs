use std::time::{Duration, Instant};

use super::ExperimentController;
use crate::experiment::types::{
    ExperimentPhase, Transition, TriggerCause, TriggerSettings, NO_ALTITUDE,
};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn controller(target: i32) -> (ExperimentController, Instant) {
    let start = Instant::now();
    (ExperimentController::new(TriggerSettings::new(target), start), start)
}

#[test]
fn starts_armed_with_sentinel_maximum() {
    let (sm, _) = controller(10_000);
    assert!(sm.state().armed());
    assert!(!sm.state().relay_energized());
    assert_eq!(sm.state().relay_energized_at(), None);
    assert_eq!(sm.state().max_altitude_seen, NO_ALTITUDE);
}

#[test]
fn target_altitude_triggers() {
    let (mut sm, start) = controller(10_000);

    assert_eq!(sm.observe_altitude(100, start + secs(1)), None);
    assert_eq!(sm.observe_altitude(300, start + secs(2)), None);
    assert_eq!(
        sm.observe_altitude(10_000, start + secs(3)),
        Some(Transition::Energize(TriggerCause::TargetAltitude))
    );
    assert!(sm.state().relay_energized());
    assert_eq!(sm.state().relay_energized_at(), Some(start + secs(3)));
}

#[test]
fn free_fall_triggers_below_target() {
    let (mut sm, start) = controller(10_000);

    assert_eq!(sm.observe_altitude(100, start), None);
    assert_eq!(sm.observe_altitude(500, start), None);
    assert_eq!(
        sm.observe_altitude(290, start),
        Some(Transition::Energize(TriggerCause::FreeFall))
    );
    assert!(!sm.state().armed());
}

#[test]
fn small_descent_does_not_trigger() {
    let (mut sm, start) = controller(10_000);

    sm.observe_altitude(500, start);
    assert_eq!(sm.observe_altitude(301, start), None);
    assert!(sm.state().armed());
    assert_eq!(sm.state().max_altitude_seen, 500);
}

#[test]
fn first_observation_never_counts_as_free_fall() {
    let (mut sm, start) = controller(10_000);
    assert_eq!(sm.observe_altitude(-400, start), None);
    assert!(sm.state().armed());
}

#[test]
fn timed_release_after_hold() {
    let (mut sm, start) = controller(10_000);
    let t = start + secs(30);
    sm.observe_altitude(12_000, t);

    assert_eq!(sm.tick(t + secs(179)), None);
    assert!(sm.state().relay_energized());

    assert_eq!(sm.tick(t + secs(181)), Some(Transition::Release));
    assert!(!sm.state().relay_energized());
    assert!(matches!(sm.state().phase, ExperimentPhase::Released { .. }));
}

#[test]
fn release_fires_at_exactly_hold() {
    let (mut sm, start) = controller(10_000);
    sm.observe_altitude(10_000, start);
    assert_eq!(sm.tick(start + secs(180)), Some(Transition::Release));
}

#[test]
fn released_is_terminal() {
    let (mut sm, start) = controller(10_000);
    sm.observe_altitude(10_500, start);
    sm.tick(start + secs(200));
    let released = *sm.state();

    for (i, altitude) in [20_000, 0, 10_000, -5_000].into_iter().enumerate() {
        let now = start + secs(300 + i as u64);
        assert_eq!(sm.observe_altitude(altitude, now), None);
        assert_eq!(sm.tick(now), None);
        assert_eq!(sm.state().phase, released.phase);
        assert!(!sm.state().armed());
    }
}

#[test]
fn energized_at_is_set_once() {
    let (mut sm, start) = controller(1_000);
    sm.observe_altitude(1_000, start + secs(5));

    for n in 6..100 {
        assert_eq!(sm.observe_altitude(5_000, start + secs(n)), None);
        assert_eq!(sm.observe_altitude(0, start + secs(n)), None);
        sm.tick(start + secs(n));
        assert_eq!(sm.state().relay_energized_at(), Some(start + secs(5)));
    }
}

#[test]
fn test_mode_fires_on_tick_after_delay() {
    let start = Instant::now();
    let settings = TriggerSettings {
        test_delay: Some(TriggerSettings::DEFAULT_TEST_DELAY),
        ..TriggerSettings::new(10_000)
    };
    let mut sm = ExperimentController::new(settings, start);

    sm.observe_altitude(0, start + secs(1));
    assert_eq!(sm.tick(start + secs(14)), None);
    assert_eq!(
        sm.tick(start + secs(16)),
        Some(Transition::Energize(TriggerCause::TestTimer))
    );
    assert_eq!(sm.state().relay_energized_at(), Some(start + secs(16)));
}

#[test]
fn test_mode_off_by_default() {
    let (mut sm, start) = controller(10_000);
    assert_eq!(sm.tick(start + secs(3600)), None);
    assert!(sm.state().armed());
}

#[test]
fn maximum_keeps_tracking_after_trigger() {
    let (mut sm, start) = controller(1_000);
    sm.observe_altitude(1_200, start);
    sm.observe_altitude(25_000, start);
    assert_eq!(sm.state().max_altitude_seen, 25_000);
}
