//! Vibration motor driver.
//!
//! A coin/ERM motor switched by a single GPIO through a low-side
//! transistor. Plays [`Waveform`]s for a bounded duration:
//!
//! - **Continuous**: one rising and one falling edge, `duration` apart.
//! - **Pulsed**: on for `on`, off for `off`, repeated while less than
//!   `duration` has elapsed. Elapsed time is checked before each pulse, so
//!   the last pulse runs to completion and the total can overshoot by up
//!   to one on/off period.
//!
//! Every exit path, including cancellation, leaves the pin low.

use core::time::Duration;

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::alert::Waveform;
use crate::app::ports::TimePort;
use crate::error::{ActuatorError, Result};
use crate::shutdown::{sleep_cancellable, CancelToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Off,
    On,
}

pub struct HapticMotor<P> {
    pin: P,
    state: MotorState,
}

impl<P: OutputPin> HapticMotor<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            state: MotorState::Off,
        }
    }

    pub fn on(&mut self) -> Result<()> {
        self.pin
            .set_high()
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = MotorState::On;
        Ok(())
    }

    pub fn off(&mut self) -> Result<()> {
        self.pin
            .set_low()
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = MotorState::Off;
        Ok(())
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == MotorState::On
    }

    /// Play `waveform` for `duration`, blocking the caller.
    pub fn drive<C: TimePort>(
        &mut self,
        waveform: Waveform,
        duration: Duration,
        clock: &mut C,
        cancel: &CancelToken,
    ) -> Result<()> {
        let played = match waveform.phases() {
            None => self.hold(duration, clock, cancel),
            Some((on, off)) => self.pulse_train(on, off, duration, clock, cancel),
        };
        // The first failure wins, but the pin goes low regardless.
        let stopped = self.off();
        played.and(stopped)
    }

    fn hold<C: TimePort>(
        &mut self,
        duration: Duration,
        clock: &mut C,
        cancel: &CancelToken,
    ) -> Result<()> {
        self.on()?;
        sleep_cancellable(clock, cancel, duration)
    }

    fn pulse_train<C: TimePort>(
        &mut self,
        on: Duration,
        off: Duration,
        duration: Duration,
        clock: &mut C,
        cancel: &CancelToken,
    ) -> Result<()> {
        let started = clock.uptime_us();
        let budget_us = duration.as_micros() as u64;
        let mut pulses: u32 = 0;

        while clock.uptime_us().saturating_sub(started) < budget_us {
            self.on()?;
            sleep_cancellable(clock, cancel, on)?;
            self.off()?;
            if !off.is_zero() {
                sleep_cancellable(clock, cancel, off)?;
            }
            pulses += 1;
        }

        debug!(
            "haptic: {} pulses in {} ms",
            pulses,
            clock.uptime_us().saturating_sub(started) / 1_000
        );
        Ok(())
    }
}
