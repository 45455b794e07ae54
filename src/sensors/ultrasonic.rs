//! HC-SR04 ultrasonic ranger driver.
//!
//! One measurement is a trigger/echo handshake:
//!
//! 1. Drive TRIG high for `trigger_pulse_us` (10 µs), then low.
//! 2. Spin until ECHO rises; the rise time is `start`.
//! 3. Spin until ECHO falls; the fall time is `stop`.
//! 4. `distance = (stop - start) × speed_of_sound / 2`.
//!
//! Both spins share one absolute deadline, `echo_timeout_us` after the
//! call. Missing either edge yields [`DistanceReading::NoEcho`] rather
//! than a made-up distance. There is no retry; the next attempt is the
//! next scheduled cycle.
//!
//! The driver is generic over `embedded-hal` pins and never allocates.

use core::fmt;

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::TimePort;
use crate::config::AlertConfig;
use crate::error::{Result, SensorError};

/// Which echo transition never arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoEdge {
    /// ECHO never went high: nothing in range, or the sensor is unplugged.
    Rising,
    /// ECHO went high but never came back low within the budget.
    Falling,
}

impl fmt::Display for EchoEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "no echo rising edge"),
            Self::Falling => write!(f, "no echo falling edge"),
        }
    }
}

/// Result of one handshake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceReading {
    Measured { distance_cm: f32 },
    NoEcho(EchoEdge),
}

impl DistanceReading {
    pub fn distance_cm(&self) -> Option<f32> {
        match *self {
            Self::Measured { distance_cm } => Some(distance_cm),
            Self::NoEcho(_) => None,
        }
    }
}

/// Timing constants for one sensor, lifted from [`AlertConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangingTiming {
    pub trigger_pulse_us: u32,
    pub echo_timeout_us: u32,
    pub speed_of_sound_cm_per_s: f32,
}

impl From<&AlertConfig> for RangingTiming {
    fn from(config: &AlertConfig) -> Self {
        Self {
            trigger_pulse_us: config.trigger_pulse_us,
            echo_timeout_us: config.echo_timeout_us,
            speed_of_sound_cm_per_s: config.speed_of_sound_cm_per_s,
        }
    }
}

impl Default for RangingTiming {
    fn default() -> Self {
        Self::from(&AlertConfig::default())
    }
}

pub struct UltrasonicSensor<T, E> {
    trigger: T,
    echo: E,
    timing: RangingTiming,
}

impl<T: OutputPin, E: InputPin> UltrasonicSensor<T, E> {
    pub fn new(trigger: T, echo: E, timing: RangingTiming) -> Self {
        Self {
            trigger,
            echo,
            timing,
        }
    }

    /// Hold the trigger line low (idle level).
    pub fn trigger_low(&mut self) -> Result<()> {
        self.trigger
            .set_low()
            .map_err(|_| SensorError::TriggerWriteFailed.into())
    }

    /// Perform one trigger/echo handshake.
    pub fn measure<C: TimePort>(&mut self, clock: &mut C) -> Result<DistanceReading> {
        let deadline = clock
            .uptime_us()
            .saturating_add(u64::from(self.timing.echo_timeout_us));

        self.trigger
            .set_high()
            .map_err(|_| SensorError::TriggerWriteFailed)?;
        clock.delay_us(self.timing.trigger_pulse_us);
        self.trigger_low()?;

        let Some(start) = self.wait_for_echo(true, clock, deadline)? else {
            return Ok(DistanceReading::NoEcho(EchoEdge::Rising));
        };
        let Some(stop) = self.wait_for_echo(false, clock, deadline)? else {
            return Ok(DistanceReading::NoEcho(EchoEdge::Falling));
        };

        Ok(DistanceReading::Measured {
            distance_cm: self.round_trip_to_cm(stop.saturating_sub(start)),
        })
    }

    /// Spin until ECHO reads `high`, returning the timestamp of the first
    /// matching sample, or `None` once `deadline` has passed.
    fn wait_for_echo<C: TimePort>(
        &mut self,
        high: bool,
        clock: &C,
        deadline: u64,
    ) -> Result<Option<u64>> {
        loop {
            let level = self
                .echo
                .is_high()
                .map_err(|_| SensorError::EchoReadFailed)?;
            let now = clock.uptime_us();
            if level == high {
                return Ok(Some(now));
            }
            if now >= deadline {
                return Ok(None);
            }
        }
    }

    fn round_trip_to_cm(&self, elapsed_us: u64) -> f32 {
        let elapsed_s = elapsed_us as f32 / 1_000_000.0;
        elapsed_s * self.timing.speed_of_sound_cm_per_s / 2.0
    }
}
