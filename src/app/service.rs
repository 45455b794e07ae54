//! Alert loop, the hexagonal core.
//!
//! [`AlertLoop`] owns the configuration, the zone policy, the clock and
//! the loop state. All I/O flows through port traits injected at call
//! sites, making the whole loop testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       AlertLoop        │
//! ActuatorPort ◀──│ sample · classify · wait│
//!                 └────────────────────────┘
//! ```
//!
//! One cycle:
//!
//! 1. bump the measurement counter;
//! 2. sample the ranger;
//! 3. classify and, if a zone matched, play its waveform for the
//!    configured alert duration;
//! 4. wait `interval - alert_duration` (see [`plan_idle_wait`]).
//!
//! The wait subtracts the *configured* alert duration, not the time the
//! waveform actually took, so pulse overshoot accumulates as drift. That
//! is accepted.

use core::time::Duration;

use log::{debug, error, info};

use crate::alert::{AlertOutcome, AlertPolicy, Waveform};
use crate::config::AlertConfig;
use crate::error::{Error, Result};
use crate::shutdown::{sleep_cancellable, CancelToken, ReleaseGuard};

use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, SensorPort, TimePort};

/// Idle waits longer than this are shown as a per-second countdown.
pub const COUNTDOWN_THRESHOLD: Duration = Duration::from_secs(3);

// ───────────────────────────────────────────────────────────────
// Loop state
// ───────────────────────────────────────────────────────────────

/// The only state carried across cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopState {
    pub measurement_count: u32,
}

// ───────────────────────────────────────────────────────────────
// Idle wait planning
// ───────────────────────────────────────────────────────────────

/// How the loop waits between the end of an alert and the next sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleWait {
    /// Count down whole seconds; the fractional remainder is dropped.
    Countdown(u32),
    /// One plain sleep.
    Sleep(Duration),
    /// Start the next cycle immediately.
    Immediate,
}

/// `interval - alert`, shaped for display.
pub fn plan_idle_wait(interval: Duration, alert: Duration) -> IdleWait {
    match interval.checked_sub(alert) {
        Some(wait) if wait > COUNTDOWN_THRESHOLD => {
            IdleWait::Countdown(u32::try_from(wait.as_secs()).unwrap_or(u32::MAX))
        }
        Some(wait) if !wait.is_zero() => IdleWait::Sleep(wait),
        _ => IdleWait::Immediate,
    }
}

// ───────────────────────────────────────────────────────────────
// AlertLoop
// ───────────────────────────────────────────────────────────────

pub struct AlertLoop<C: TimePort> {
    config: AlertConfig,
    policy: AlertPolicy,
    clock: C,
    cancel: CancelToken,
    state: LoopState,
}

impl<C: TimePort> AlertLoop<C> {
    /// Validate `config` and build the loop. Nothing runs until
    /// [`run`](Self::run).
    pub fn new(config: AlertConfig, clock: C, cancel: CancelToken) -> Result<Self> {
        config.validate()?;
        let policy = AlertPolicy::new(config.zones.clone())?;
        Ok(Self {
            config,
            policy,
            clock,
            cancel,
            state: LoopState::default(),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── Boot ──────────────────────────────────────────────────

    /// Print the zone table.
    pub fn announce(&self, sink: &mut impl EventSink) {
        for zone in self.policy.zones() {
            sink.emit(&AppEvent::ZoneListed {
                upper_bound_cm: zone.upper_bound_cm,
                label: zone.label.clone(),
                waveform: zone.waveform,
            });
        }
        sink.emit(&AppEvent::ClearAbove(self.policy.clear_threshold_cm()));
    }

    /// Buzz the primary motor once so the wearer knows it works.
    /// Skipped when the configured test duration is zero.
    pub fn self_test(
        &mut self,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let duration = self.config.self_test_duration();
        if duration.is_zero() {
            return Ok(());
        }
        sink.emit(&AppEvent::SelfTestStarted);
        hw.play(
            Waveform::Continuous,
            duration,
            &mut self.clock,
            &self.cancel,
        )?;
        sink.emit(&AppEvent::SelfTestComplete);
        Ok(())
    }

    // ── Main loop ─────────────────────────────────────────────

    /// Sample until cancelled.
    ///
    /// Returns `Ok(())` on cancellation and the first fatal error
    /// otherwise. Either way the outputs are forced low and the GPIO port
    /// is released before this returns.
    pub fn run<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Result<()>
    where
        H: SensorPort + ActuatorPort,
    {
        sink.emit(&AppEvent::Started {
            interval: self.config.measurement_interval(),
        });

        let outcome = {
            let mut hw = ReleaseGuard::new(hw);
            match self.sample_until_stopped(&mut *hw, sink) {
                Error::Cancelled => {
                    sink.emit(&AppEvent::Stopped);
                    Ok(())
                }
                e => {
                    error!("alert loop failed: {}", e);
                    Err(e)
                }
            }
            // Guard drops here: outputs low, GPIO released.
        };

        sink.emit(&AppEvent::CleanupComplete);
        info!(
            "Alert loop exited after {} measurements",
            self.state.measurement_count
        );
        outcome
    }

    /// Cycle until something stops the loop; returns what stopped it.
    fn sample_until_stopped<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Error
    where
        H: SensorPort + ActuatorPort,
    {
        loop {
            if let Err(e) = self.cancel.check() {
                return e;
            }
            if let Err(e) = self.cycle(hw, sink) {
                return e;
            }
        }
    }

    /// Run one full cycle: sample → classify → feedback → idle wait.
    pub fn cycle<H>(&mut self, hw: &mut H, sink: &mut impl EventSink) -> Result<AlertOutcome>
    where
        H: SensorPort + ActuatorPort,
    {
        self.state.measurement_count += 1;
        let cycle = self.state.measurement_count;
        sink.emit(&AppEvent::Measuring { cycle });

        let reading = hw.measure(&mut self.clock)?;
        let outcome = self.policy.assess(reading);

        match &outcome {
            AlertOutcome::Matched { zone, distance_cm } => {
                sink.emit(&AppEvent::Alert {
                    cycle,
                    label: zone.label.clone(),
                    distance_cm: *distance_cm,
                });
                hw.play(
                    zone.waveform,
                    self.config.alert_duration(),
                    &mut self.clock,
                    &self.cancel,
                )?;
            }
            AlertOutcome::Clear { distance_cm } => {
                sink.emit(&AppEvent::AllClear {
                    cycle,
                    distance_cm: *distance_cm,
                });
            }
            AlertOutcome::NoReading { edge } => {
                sink.emit(&AppEvent::NoEcho { cycle, edge: *edge });
            }
        }

        self.idle(sink)?;
        Ok(outcome)
    }

    fn idle(&mut self, sink: &mut impl EventSink) -> Result<()> {
        let plan = plan_idle_wait(
            self.config.measurement_interval(),
            self.config.alert_duration(),
        );
        debug!("idle: {:?}", plan);
        match plan {
            IdleWait::Countdown(seconds) => {
                sink.emit(&AppEvent::CountdownStarted { seconds });
                for remaining in (1..=seconds).rev() {
                    sink.emit(&AppEvent::CountdownTick { remaining });
                    sleep_cancellable(&mut self.clock, &self.cancel, Duration::from_secs(1))?;
                }
                sink.emit(&AppEvent::CountdownDone);
            }
            IdleWait::Sleep(wait) => sleep_cancellable(&mut self.clock, &self.cancel, wait)?,
            IdleWait::Immediate => {}
        }
        Ok(())
    }
}
