//! Alert loop integration tests against the mock adapter.
//!
//! Virtual time comes from the simulation bench clock; the mock's `play`
//! sleeps on it, so cycle timing matches the real motor driver.

use std::time::Duration;

use hapticrange::adapters::sim::{SimBench, SimClock};
use hapticrange::alert::{AlertOutcome, AlertZone, Waveform, ZoneTable};
use hapticrange::app::events::AppEvent;
use hapticrange::app::service::AlertLoop;
use hapticrange::config::{AlertConfig, ConfigError};
use hapticrange::error::{Error, SensorError};
use hapticrange::sensors::ultrasonic::{DistanceReading, EchoEdge};
use hapticrange::shutdown::CancelToken;

use crate::mock_hw::{ActuatorCall, MockHardware, RecordingSink};

const ALERT: Duration = Duration::from_millis(1_500);

fn make_loop(bench: &SimBench, cancel: &CancelToken) -> AlertLoop<SimClock> {
    AlertLoop::new(AlertConfig::default(), bench.clock(), cancel.clone()).unwrap()
}

// ── Classification → feedback ─────────────────────────────────

#[test]
fn danger_distance_plays_continuous_for_alert_duration() {
    let bench = SimBench::new();
    let mut alert_loop = make_loop(&bench, &CancelToken::new());
    let mut hw = MockHardware::with_distances(&[25.0]);
    let mut sink = RecordingSink::new();

    let outcome = alert_loop.cycle(&mut hw, &mut sink).unwrap();

    assert_eq!(outcome.label(), Some("DANGER"));
    assert_eq!(hw.plays(), vec![(Waveform::Continuous, ALERT)]);
}

#[test]
fn caution_distance_plays_200ms_pulses() {
    let bench = SimBench::new();
    let mut alert_loop = make_loop(&bench, &CancelToken::new());
    let mut hw = MockHardware::with_distances(&[150.0]);
    let mut sink = RecordingSink::new();

    alert_loop.cycle(&mut hw, &mut sink).unwrap();

    assert_eq!(hw.plays(), vec![(Waveform::pulsed_ms(200, 200), ALERT)]);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Alert { cycle: 1, label, distance_cm } if label.as_str() == "CAUTION" && *distance_cm == 150.0
    )));
}

#[test]
fn far_distance_and_missing_echo_stay_silent() {
    let bench = SimBench::new();
    let mut alert_loop = make_loop(&bench, &CancelToken::new());
    let mut hw = MockHardware::with_distances(&[500.0]);
    hw.push(Ok(DistanceReading::NoEcho(EchoEdge::Falling)));
    let mut sink = RecordingSink::new();

    let first = alert_loop.cycle(&mut hw, &mut sink).unwrap();
    let second = alert_loop.cycle(&mut hw, &mut sink).unwrap();

    assert_eq!(first, AlertOutcome::Clear { distance_cm: 500.0 });
    assert_eq!(
        second,
        AlertOutcome::NoReading {
            edge: EchoEdge::Falling
        }
    );
    assert!(hw.plays().is_empty());
    assert!(sink.contains(&AppEvent::AllClear {
        cycle: 1,
        distance_cm: 500.0
    }));
    assert!(sink.contains(&AppEvent::NoEcho {
        cycle: 2,
        edge: EchoEdge::Falling
    }));
}

#[test]
fn bounds_belong_to_the_farther_zone() {
    let bench = SimBench::new();
    let mut alert_loop = make_loop(&bench, &CancelToken::new());
    let mut hw = MockHardware::with_distances(&[30.0, 100.0, 200.0, 400.0]);
    let mut sink = RecordingSink::new();

    let labels: Vec<Option<String>> = (0..4)
        .map(|_| {
            alert_loop
                .cycle(&mut hw, &mut sink)
                .unwrap()
                .label()
                .map(str::to_owned)
        })
        .collect();

    assert_eq!(
        labels,
        vec![
            Some("WARNING".to_owned()),
            Some("CAUTION".to_owned()),
            Some("DETECTION".to_owned()),
            None,
        ]
    );
}

#[test]
fn cycle_waits_out_the_rest_of_the_interval() {
    let bench = SimBench::new();
    let mut alert_loop = make_loop(&bench, &CancelToken::new());
    let mut hw = MockHardware::with_distances(&[25.0, 500.0]);
    let mut sink = RecordingSink::new();

    alert_loop.cycle(&mut hw, &mut sink).unwrap();
    assert_eq!(bench.now_us(), 3_000_000);

    // Clear cycles still subtract the configured alert duration.
    alert_loop.cycle(&mut hw, &mut sink).unwrap();
    assert_eq!(bench.now_us(), 4_500_000);
}

#[test]
fn custom_zone_table_is_honoured() {
    let mut zones = ZoneTable::new();
    zones
        .push(AlertZone::new(50.0, "NEAR", Waveform::Continuous))
        .unwrap();
    zones
        .push(AlertZone::new(120.0, "FAR", Waveform::pulsed_ms(50, 50)))
        .unwrap();
    let config = AlertConfig {
        zones,
        ..AlertConfig::default()
    };

    let bench = SimBench::new();
    let mut alert_loop = AlertLoop::new(config, bench.clock(), CancelToken::new()).unwrap();
    let mut hw = MockHardware::with_distances(&[60.0, 130.0]);
    let mut sink = RecordingSink::new();

    assert_eq!(alert_loop.cycle(&mut hw, &mut sink).unwrap().label(), Some("FAR"));
    assert_eq!(alert_loop.cycle(&mut hw, &mut sink).unwrap().label(), None);
    assert_eq!(hw.plays(), vec![(Waveform::pulsed_ms(50, 50), ALERT)]);
}

#[test]
fn unordered_zone_table_is_rejected() {
    let mut zones = ZoneTable::new();
    zones
        .push(AlertZone::new(200.0, "B", Waveform::Continuous))
        .unwrap();
    zones
        .push(AlertZone::new(100.0, "A", Waveform::Continuous))
        .unwrap();
    let config = AlertConfig {
        zones,
        ..AlertConfig::default()
    };

    let bench = SimBench::new();
    let result = AlertLoop::new(config, bench.clock(), CancelToken::new());
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ValidationFailed(_)))
    ));
}

// ── Run loop lifecycle ────────────────────────────────────────

#[test]
fn run_counts_cycles_until_cancelled() {
    let bench = SimBench::new();
    let cancel = CancelToken::new();
    bench.cancel_at(Duration::from_millis(7_000), &cancel);
    let mut alert_loop = make_loop(&bench, &cancel);
    let mut hw = MockHardware::with_distances(&[25.0, 150.0, 500.0]);
    let mut sink = RecordingSink::new();

    assert_eq!(alert_loop.run(&mut hw, &mut sink), Ok(()));

    assert_eq!(alert_loop.state().measurement_count, 3);
    assert_eq!(hw.measurements, 3);
    assert_eq!(
        hw.plays(),
        vec![
            (Waveform::Continuous, ALERT),
            (Waveform::pulsed_ms(200, 200), ALERT),
        ]
    );
    for cycle in 1..=3 {
        assert!(sink.contains(&AppEvent::Measuring { cycle }));
    }
    assert_eq!(
        &sink.events[sink.events.len() - 2..],
        &[AppEvent::Stopped, AppEvent::CleanupComplete]
    );
    assert_eq!(hw.releases(), 1);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::Release));
}

#[test]
fn sensor_failure_is_fatal_but_still_releases() {
    let bench = SimBench::new();
    let mut alert_loop = make_loop(&bench, &CancelToken::new());
    let mut hw = MockHardware::new();
    hw.push(Err(SensorError::EchoReadFailed.into()));
    let mut sink = RecordingSink::new();

    let result = alert_loop.run(&mut hw, &mut sink);

    assert_eq!(result, Err(Error::Sensor(SensorError::EchoReadFailed)));
    assert_eq!(hw.releases(), 1);
    assert!(!sink.contains(&AppEvent::Stopped));
    assert_eq!(sink.events.last(), Some(&AppEvent::CleanupComplete));
}

#[test]
fn cancel_during_alert_cuts_the_waveform_short() {
    let bench = SimBench::new();
    let cancel = CancelToken::new();
    bench.cancel_at(Duration::from_millis(400), &cancel);
    let mut alert_loop = make_loop(&bench, &cancel);
    let mut hw = MockHardware::with_distances(&[25.0]);
    let mut sink = RecordingSink::new();

    assert_eq!(alert_loop.run(&mut hw, &mut sink), Ok(()));

    assert_eq!(alert_loop.state().measurement_count, 1);
    assert!(bench.now_us() < 500_000);
    assert_eq!(hw.releases(), 1);
    assert!(sink.contains(&AppEvent::Stopped));
}
