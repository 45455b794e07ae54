//! End-to-end scenarios on the simulation bench.
//!
//! The real ultrasonic driver, motor driver and hardware adapter run
//! against simulated pins; assertions are made on the recorded output
//! edges, exactly as a logic analyser on the board would see them.

use std::time::Duration;

use hapticrange::adapters::hardware::HardwareAdapter;
use hapticrange::adapters::sim::{Edge, Line, Obstacle, SimBench, SimEcho, SimOutput, SimPort};
use hapticrange::alert::AlertOutcome;
use hapticrange::app::service::AlertLoop;
use hapticrange::config::AlertConfig;
use hapticrange::drivers::haptic::HapticMotor;
use hapticrange::sensors::ultrasonic::{EchoEdge, RangingTiming, UltrasonicSensor};
use hapticrange::shutdown::CancelToken;

use crate::mock_hw::RecordingSink;

type SimHardware = HardwareAdapter<SimOutput, SimEcho, SimPort>;

fn board(bench: &SimBench) -> SimHardware {
    HardwareAdapter::new(
        UltrasonicSensor::new(bench.output(Line::Trigger), bench.echo(), RangingTiming::default()),
        HapticMotor::new(bench.output(Line::Motor)),
        Some(HapticMotor::new(bench.output(Line::MotorAux))),
        bench.port(),
    )
    .unwrap()
}

/// `(rise, fall)` timestamps of every motor pulse.
fn motor_pulses(bench: &SimBench) -> Vec<(u64, u64)> {
    let edges: Vec<Edge> = bench.edges(Line::Motor);
    let mut pulses = Vec::new();
    let mut rise = None;
    for edge in edges {
        match (edge.high, rise) {
            (true, None) => rise = Some(edge.at_us),
            (false, Some(start)) => {
                pulses.push((start, edge.at_us));
                rise = None;
            }
            _ => {}
        }
    }
    pulses
}

fn one_cycle(obstacle: Obstacle) -> (SimBench, AlertOutcome) {
    let bench = SimBench::new();
    bench.script([obstacle]);
    let mut hw = board(&bench);
    let mut alert_loop =
        AlertLoop::new(AlertConfig::default(), bench.clock(), CancelToken::new()).unwrap();
    let outcome = alert_loop.cycle(&mut hw, &mut RecordingSink::new()).unwrap();
    (bench, outcome)
}

#[test]
fn object_at_25cm_holds_motor_for_exactly_alert_duration() {
    let (bench, outcome) = one_cycle(Obstacle::At(25.0));
    assert_eq!(outcome.label(), Some("DANGER"));

    let pulses = motor_pulses(&bench);
    assert_eq!(pulses.len(), 1);
    let (rise, fall) = pulses[0];
    assert_eq!(fall - rise, 1_500_000);
}

#[test]
fn object_at_150cm_pulses_200_on_200_off() {
    let (bench, outcome) = one_cycle(Obstacle::At(150.0));
    assert_eq!(outcome.label(), Some("CAUTION"));

    let pulses = motor_pulses(&bench);
    // Starts at 0, 400, 800, 1200 ms; the check at 1600 ms ends the train.
    assert_eq!(pulses.len(), 4);
    for (i, &(rise, fall)) in pulses.iter().enumerate() {
        assert_eq!(fall - rise, 200_000, "pulse {i} width");
    }
    for pair in pulses.windows(2) {
        assert_eq!(pair[1].0 - pair[0].0, 400_000);
    }
}

#[test]
fn object_at_70cm_pulses_fast() {
    let (bench, outcome) = one_cycle(Obstacle::At(70.0));
    assert_eq!(outcome.label(), Some("WARNING"));
    assert_eq!(motor_pulses(&bench).len(), 8);
}

#[test]
fn object_at_350cm_pulses_slowly_and_overshoots() {
    let (bench, outcome) = one_cycle(Obstacle::At(350.0));
    assert_eq!(outcome.label(), Some("DETECTION"));

    let pulses = motor_pulses(&bench);
    assert_eq!(pulses.len(), 2);
    // Starts at 0 and 900 ms; the second off phase runs to 1800 ms,
    // past the 1.5 s budget, before the final off edge.
    let (first_rise, _) = pulses[0];
    let lows: Vec<u64> = bench
        .edges(Line::Motor)
        .iter()
        .filter(|e| !e.high && e.at_us > first_rise)
        .map(|e| e.at_us - first_rise)
        .collect();
    assert_eq!(&lows[..3], &[400_000, 1_300_000, 1_800_000]);
}

#[test]
fn object_at_500cm_never_touches_the_motor() {
    let (bench, outcome) = one_cycle(Obstacle::At(500.0));
    assert!(matches!(outcome, AlertOutcome::Clear { distance_cm } if (distance_cm - 500.0).abs() < 0.5));
    assert!(motor_pulses(&bench).is_empty());
}

#[test]
fn echo_timeout_is_reported_and_treated_as_clear() {
    let (bench, outcome) = one_cycle(Obstacle::Silent);
    assert_eq!(
        outcome,
        AlertOutcome::NoReading {
            edge: EchoEdge::Rising
        }
    );
    assert!(motor_pulses(&bench).is_empty());

    let (bench, outcome) = one_cycle(Obstacle::Stuck);
    assert_eq!(
        outcome,
        AlertOutcome::NoReading {
            edge: EchoEdge::Falling
        }
    );
    assert!(motor_pulses(&bench).is_empty());
}

#[test]
fn cancel_mid_alert_leaves_everything_low_and_released_once() {
    let bench = SimBench::new();
    bench.script([Obstacle::At(25.0)]);
    let cancel = CancelToken::new();
    bench.cancel_at(Duration::from_millis(100), &cancel);

    let mut hw = board(&bench);
    let mut alert_loop = AlertLoop::new(AlertConfig::default(), bench.clock(), cancel).unwrap();
    let mut sink = RecordingSink::new();

    assert_eq!(alert_loop.run(&mut hw, &mut sink), Ok(()));
    assert!(hw.is_released());
    drop(hw);

    for line in [Line::Trigger, Line::Motor, Line::MotorAux] {
        assert!(!bench.level(line), "{line:?} left high");
    }
    assert_eq!(bench.releases(), 1);

    let pulses = motor_pulses(&bench);
    assert_eq!(pulses.len(), 1);
    let (_, fall) = pulses[0];
    // Observed within one sleep slice of the request.
    assert!(fall <= 100_000 + 50_000 + 5_000, "motor fell at {fall} us");
}

#[test]
fn cancel_mid_pulse_train_leaves_everything_low_and_released_once() {
    // On phase, off phase, idle wait, and inside the second cycle's train.
    for cancel_ms in [250, 430, 700, 1_499, 1_600, 2_000, 3_100, 3_250] {
        let bench = SimBench::new();
        bench.script([Obstacle::At(150.0)]);
        let cancel = CancelToken::new();
        bench.cancel_at(Duration::from_millis(cancel_ms), &cancel);

        let mut hw = board(&bench);
        let mut alert_loop =
            AlertLoop::new(AlertConfig::default(), bench.clock(), cancel).unwrap();
        let mut sink = RecordingSink::new();

        assert_eq!(alert_loop.run(&mut hw, &mut sink), Ok(()), "cancel at {cancel_ms} ms");
        assert!(!hw.motor_on(), "cancel at {cancel_ms} ms");
        assert!(hw.is_released());
        let stopped_us = bench.now_us();
        drop(hw);

        for line in [Line::Trigger, Line::Motor, Line::MotorAux] {
            assert!(!bench.level(line), "{line:?} left high, cancel at {cancel_ms} ms");
        }
        assert_eq!(bench.releases(), 1, "cancel at {cancel_ms} ms");
        assert!(
            stopped_us <= cancel_ms * 1_000 + 50_000,
            "cancel at {cancel_ms} ms observed at {stopped_us} us"
        );
    }
}

#[test]
fn danger_cycles_repeat_until_cancelled() {
    let bench = SimBench::new();
    bench.script([Obstacle::At(25.0)]);
    let cancel = CancelToken::new();
    bench.cancel_at(Duration::from_secs(10), &cancel);

    let mut hw = board(&bench);
    let mut alert_loop = AlertLoop::new(AlertConfig::default(), bench.clock(), cancel).unwrap();
    let mut sink = RecordingSink::new();

    alert_loop.run(&mut hw, &mut sink).unwrap();

    // Each DANGER cycle is ~3 s; the fourth is cut short at 10 s.
    assert_eq!(alert_loop.state().measurement_count, 4);
    assert_eq!(motor_pulses(&bench).len(), 4);
    assert!(!bench.level(Line::Motor));
}
