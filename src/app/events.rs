//! Outbound application events.
//!
//! The [`AlertLoop`](super::service::AlertLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port. The console adapter turns
//! them into human-readable status lines; the format is not a protocol.

use core::time::Duration;

use crate::alert::{Waveform, ZoneLabel};
use crate::sensors::ultrasonic::EchoEdge;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// One row of the zone table, printed at boot.
    ZoneListed {
        upper_bound_cm: f32,
        label: ZoneLabel,
        waveform: Waveform,
    },
    /// Last row of the boot banner: readings at or past this are clear.
    ClearAbove(f32),

    /// Boot motor test started / finished.
    SelfTestStarted,
    SelfTestComplete,

    /// The loop is about to start sampling.
    Started { interval: Duration },

    /// A new cycle began (1-based index).
    Measuring { cycle: u32 },
    /// The reading fell inside a zone; the motor plays its waveform.
    Alert {
        cycle: u32,
        label: ZoneLabel,
        distance_cm: f32,
    },
    /// Nothing inside the largest bound.
    AllClear { cycle: u32, distance_cm: f32 },
    /// The sensor never produced the given echo edge.
    NoEcho { cycle: u32, edge: EchoEdge },

    /// Countdown to the next measurement (whole seconds).
    CountdownStarted { seconds: u32 },
    CountdownTick { remaining: u32 },
    CountdownDone,

    /// Cancellation observed; the loop is exiting.
    Stopped,
    /// Outputs forced low and GPIO released.
    CleanupComplete,
}
