//! Alert policy: distance → zone → haptic waveform.
//!
//! The zone table is an ordered list of upper bounds. A reading falls into
//! the first zone whose bound is strictly greater than the distance, so a
//! reading exactly on a bound belongs to the next (farther) zone. Anything
//! at or beyond the largest bound is "all clear".
//!
//! | Bound  | Label     | Waveform             |
//! |--------|-----------|----------------------|
//! | 30 cm  | DANGER    | continuous           |
//! | 100 cm | WARNING   | 100 ms on / 100 ms off |
//! | 200 cm | CAUTION   | 200 ms on / 200 ms off |
//! | 400 cm | DETECTION | 400 ms on / 500 ms off |
//!
//! The policy is pure: no I/O, no interior state.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::sensors::ultrasonic::{DistanceReading, EchoEdge};

/// Maximum number of zones (stack-allocated table).
pub const MAX_ZONES: usize = 8;

/// Zone label, fixed capacity so the table never touches the heap.
pub type ZoneLabel = heapless::String<24>;

/// Ordered zone table.
pub type ZoneTable = heapless::Vec<AlertZone, MAX_ZONES>;

/// Feedback waveform played on the motor output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    /// Motor held on for the whole alert duration.
    Continuous,
    /// Motor cycled on/off until the alert duration has elapsed.
    Pulsed { on_ms: u32, off_ms: u32 },
}

impl Waveform {
    pub const fn pulsed_ms(on_ms: u32, off_ms: u32) -> Self {
        Self::Pulsed { on_ms, off_ms }
    }

    /// Short name for console output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Pulsed { .. } => "pulses",
        }
    }

    /// On/off phase lengths, `None` for a continuous waveform.
    pub fn phases(&self) -> Option<(Duration, Duration)> {
        match *self {
            Self::Continuous => None,
            Self::Pulsed { on_ms, off_ms } => Some((
                Duration::from_millis(u64::from(on_ms)),
                Duration::from_millis(u64::from(off_ms)),
            )),
        }
    }
}

/// One distance bracket of the zone table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertZone {
    /// Exclusive upper bound in centimetres.
    pub upper_bound_cm: f32,
    pub label: ZoneLabel,
    pub waveform: Waveform,
}

impl AlertZone {
    /// Build a zone. Labels longer than the label capacity are truncated.
    pub fn new(upper_bound_cm: f32, label: &str, waveform: Waveform) -> Self {
        let mut text = ZoneLabel::new();
        for c in label.chars() {
            if text.push(c).is_err() {
                break;
            }
        }
        Self {
            upper_bound_cm,
            label: text,
            waveform,
        }
    }
}

/// Check the table invariants: non-empty, finite positive bounds in
/// strictly ascending order, and no pulsed zone with a zero on-time.
pub fn validate_zones(zones: &[AlertZone]) -> Result<(), ConfigError> {
    if zones.is_empty() {
        return Err(ConfigError::ValidationFailed("zone table is empty"));
    }
    let mut previous = 0.0_f32;
    for zone in zones {
        if !zone.upper_bound_cm.is_finite() || zone.upper_bound_cm <= previous {
            return Err(ConfigError::ValidationFailed(
                "zone bounds must be positive and strictly increasing",
            ));
        }
        if matches!(zone.waveform, Waveform::Pulsed { on_ms: 0, .. }) {
            return Err(ConfigError::ValidationFailed("pulsed zone needs a non-zero on time"));
        }
        previous = zone.upper_bound_cm;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
//  Outcome
// ═══════════════════════════════════════════════════════════════

/// Result of classifying one sampling cycle. Used for reporting and to
/// decide whether the motor runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutcome {
    /// The distance fell inside `zone`; the zone waveform is played.
    Matched { zone: AlertZone, distance_cm: f32 },
    /// Nothing inside the largest bound; the motor stays off.
    Clear { distance_cm: f32 },
    /// The sensor never produced an echo edge; handled like `Clear`.
    NoReading { edge: EchoEdge },
}

impl AlertOutcome {
    /// Waveform to play, if any.
    pub fn waveform(&self) -> Option<Waveform> {
        match self {
            Self::Matched { zone, .. } => Some(zone.waveform),
            Self::Clear { .. } | Self::NoReading { .. } => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Matched { zone, .. } => Some(zone.label.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for AlertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched { zone, distance_cm } => {
                write!(f, "{} at {:.1}cm", zone.label, distance_cm)
            }
            Self::Clear { distance_cm } => write!(f, "all clear at {:.1}cm", distance_cm),
            Self::NoReading { edge } => write!(f, "no reading ({})", edge),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Policy
// ═══════════════════════════════════════════════════════════════

/// Maps distances onto the configured zone table.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    zones: ZoneTable,
}

impl AlertPolicy {
    pub fn new(zones: ZoneTable) -> Result<Self, ConfigError> {
        validate_zones(&zones)?;
        Ok(Self { zones })
    }

    pub fn zones(&self) -> &[AlertZone] {
        &self.zones
    }

    /// Largest bound; readings at or past it are clear.
    pub fn clear_threshold_cm(&self) -> f32 {
        self.zones.last().map_or(0.0, |z| z.upper_bound_cm)
    }

    /// First zone whose bound is strictly greater than `distance_cm`.
    pub fn classify(&self, distance_cm: f32) -> AlertOutcome {
        match self.zones.iter().find(|z| distance_cm < z.upper_bound_cm) {
            Some(zone) => AlertOutcome::Matched {
                zone: zone.clone(),
                distance_cm,
            },
            None => AlertOutcome::Clear { distance_cm },
        }
    }

    /// Classify a raw sampler reading. A missing echo never raises an
    /// alert: the cycle reports `NoReading` and the motor stays off.
    pub fn assess(&self, reading: DistanceReading) -> AlertOutcome {
        match reading {
            DistanceReading::Measured { distance_cm } => self.classify(distance_cm),
            DistanceReading::NoEcho(edge) => AlertOutcome::NoReading { edge },
        }
    }
}
