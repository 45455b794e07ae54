//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AlertLoop (domain)
//! ```
//!
//! Driven adapters (sensor, motors, clock, event sinks) implement these
//! traits. The [`AlertLoop`](super::service::AlertLoop) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Pin-level access below the adapters goes through the `embedded-hal`
//! digital traits, so the same drivers run on ESP-IDF `PinDriver`s and on
//! the host simulation bench.

use core::time::Duration;

use crate::alert::Waveform;
use crate::error::Result;
use crate::sensors::ultrasonic::DistanceReading;
use crate::shutdown::CancelToken;

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: system timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic clock plus the two ways the firmware waits.
pub trait TimePort {
    /// Microseconds since boot (monotonic).
    fn uptime_us(&self) -> u64;

    /// Busy-wait for `us` microseconds. Used for the trigger pulse,
    /// where a scheduler sleep would be far too coarse.
    fn delay_us(&mut self, us: u32);

    /// Block the calling thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per cycle.
pub trait SensorPort {
    /// Run one trigger/echo handshake.
    ///
    /// A missing echo is a normal reading ([`DistanceReading::NoEcho`]);
    /// only GPIO failures are errors.
    fn measure<C: TimePort>(&mut self, clock: &mut C) -> Result<DistanceReading>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to play haptic feedback.
pub trait ActuatorPort {
    /// Play `waveform` on the primary motor for `duration`.
    ///
    /// Blocks the caller. Returns [`Error::Cancelled`](crate::Error::Cancelled)
    /// if `cancel` fires mid-waveform; the motor is low on every return.
    fn play<C: TimePort>(
        &mut self,
        waveform: Waveform,
        duration: Duration,
        clock: &mut C,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// Drive every output (trigger, both motors) low.
    fn all_off(&mut self) -> Result<()>;

    /// Force all outputs low and hand the pins back to the platform.
    /// Idempotent: only the first call reaches the [`GpioPort`].
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// GPIO port (platform session)
// ───────────────────────────────────────────────────────────────

/// The platform side of pin ownership. Configuration happens when the
/// pins are built; this port only covers giving them back.
pub trait GpioPort {
    /// Return every owned pin to its reset state.
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → console)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
