//! Hardware adapter: bridges the ranger and motors to domain port traits.
//!
//! Owns the [`UltrasonicSensor`], the primary [`HapticMotor`], the optional
//! auxiliary motor and the platform [`GpioPort`], exposing them through
//! [`SensorPort`] and [`ActuatorPort`]. Generic over `embedded-hal` pins:
//! ESP-IDF `PinDriver`s on the board, [`sim`](super::sim) pins on the host.
//!
//! Ownership of the outputs is scoped: dropping the adapter forces every
//! line low and releases the port, unless that already happened.

use core::time::Duration;

use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::alert::Waveform;
use crate::app::ports::{ActuatorPort, GpioPort, SensorPort, TimePort};
use crate::drivers::haptic::HapticMotor;
use crate::error::{ActuatorError, Result};
use crate::sensors::ultrasonic::{DistanceReading, UltrasonicSensor};
use crate::shutdown::CancelToken;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: GpioPort,
{
    ranger: UltrasonicSensor<O, I>,
    motor: HapticMotor<O>,
    motor_aux: Option<HapticMotor<O>>,
    port: P,
    released: bool,
}

impl<O, I, P> HardwareAdapter<O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: GpioPort,
{
    /// Take ownership of the pins and drive every output low.
    pub fn new(
        ranger: UltrasonicSensor<O, I>,
        motor: HapticMotor<O>,
        motor_aux: Option<HapticMotor<O>>,
        port: P,
    ) -> Result<Self> {
        let mut hw = Self {
            ranger,
            motor,
            motor_aux,
            port,
            released: false,
        };
        hw.all_off()?;
        Ok(hw)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn motor_on(&self) -> bool {
        self.motor.is_on()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<O, I, P> SensorPort for HardwareAdapter<O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: GpioPort,
{
    fn measure<C: TimePort>(&mut self, clock: &mut C) -> Result<DistanceReading> {
        self.ranger.measure(clock)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<O, I, P> ActuatorPort for HardwareAdapter<O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: GpioPort,
{
    fn play<C: TimePort>(
        &mut self,
        waveform: Waveform,
        duration: Duration,
        clock: &mut C,
        cancel: &CancelToken,
    ) -> Result<()> {
        if self.released {
            return Err(ActuatorError::Released.into());
        }
        self.motor.drive(waveform, duration, clock, cancel)
    }

    fn all_off(&mut self) -> Result<()> {
        // Try every line even if an earlier one fails.
        let motor = self.motor.off();
        let aux = self.motor_aux.as_mut().map_or(Ok(()), HapticMotor::off);
        let trigger = self.ranger.trigger_low();
        motor.and(aux).and(trigger)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.all_off() {
            warn!("hardware: forcing outputs low failed: {}", e);
        }
        self.port.release();
        self.released = true;
        info!("hardware: outputs low, GPIO released");
    }
}

impl<O, I, P> Drop for HardwareAdapter<O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: GpioPort,
{
    fn drop(&mut self) {
        self.release();
    }
}
