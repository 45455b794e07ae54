//! System configuration parameters
//!
//! All tunable parameters for the proximity alert loop. Values are fixed
//! at build time; there is no config file or runtime reload. The struct is
//! serde-friendly so it can be dumped to the console at boot.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alert::{self, AlertZone, Waveform, ZoneTable};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    // --- Timing ---
    /// Time between the start of consecutive measurements (milliseconds)
    pub measurement_interval_ms: u32,
    /// How long the motor plays an alert waveform (milliseconds)
    pub alert_duration_ms: u32,
    /// Boot-time motor self-test length (milliseconds, 0 = skip)
    pub self_test_duration_ms: u32,

    // --- Ultrasonic sensor ---
    /// Width of the trigger pulse (microseconds)
    pub trigger_pulse_us: u32,
    /// Budget for both echo edges, measured from the trigger (microseconds)
    pub echo_timeout_us: u32,
    /// Speed of sound used for the round-trip conversion (cm/s)
    pub speed_of_sound_cm_per_s: f32,

    // --- Zones ---
    /// Alert zones ordered by strictly ascending upper bound.
    pub zones: ZoneTable,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            // Timing
            measurement_interval_ms: 3_000,
            alert_duration_ms: 1_500,
            self_test_duration_ms: 500,

            // HC-SR04 datasheet values
            trigger_pulse_us: 10,
            echo_timeout_us: 100_000,
            speed_of_sound_cm_per_s: 34_300.0,

            zones: default_zones(),
        }
    }
}

/// The four stock zones: 30 / 100 / 200 / 400 cm.
pub fn default_zones() -> ZoneTable {
    let stock = [
        AlertZone::new(30.0, "DANGER", Waveform::Continuous),
        AlertZone::new(100.0, "WARNING", Waveform::pulsed_ms(100, 100)),
        AlertZone::new(200.0, "CAUTION", Waveform::pulsed_ms(200, 200)),
        AlertZone::new(400.0, "DETECTION", Waveform::pulsed_ms(400, 500)),
    ];
    // An oversize table comes back empty, which `validate` rejects.
    ZoneTable::from_slice(&stock).unwrap_or_default()
}

impl AlertConfig {
    pub fn measurement_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.measurement_interval_ms))
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.alert_duration_ms))
    }

    pub fn self_test_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.self_test_duration_ms))
    }

    /// Reject values that would make the loop meaningless or unsafe.
    /// Nothing is clamped: a bad table is a build-time bug.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measurement_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("measurement_interval_ms must be > 0"));
        }
        if self.alert_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed("alert_duration_ms must be > 0"));
        }
        if self.trigger_pulse_us == 0 {
            return Err(ConfigError::ValidationFailed("trigger_pulse_us must be > 0"));
        }
        if self.echo_timeout_us == 0 {
            return Err(ConfigError::ValidationFailed("echo_timeout_us must be > 0"));
        }
        if !(self.speed_of_sound_cm_per_s.is_finite() && self.speed_of_sound_cm_per_s > 0.0) {
            return Err(ConfigError::ValidationFailed("speed_of_sound_cm_per_s must be positive"));
        }
        alert::validate_zones(&self.zones)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
