//! GPIO pin assignments for the haptic proximity board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic ranger
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a measurement.
pub const TRIGGER_GPIO: i32 = 4;
/// Digital input: HIGH for the duration of the echo round trip.
/// Routed through a 5 V → 3.3 V divider.
pub const ECHO_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Vibration motors (NPN low-side switch, flyback diode)
// ---------------------------------------------------------------------------

/// Primary motor, the only channel the alert loop drives.
pub const MOTOR_GPIO: i32 = 27;
/// Secondary motor. Held low; kept for bench diagnostics.
pub const MOTOR_AUX_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// BOOT button (active-low, internal pull-up). Stops the alert loop.
pub const STOP_BUTTON_GPIO: i32 = 0;

/// Every output the firmware owns, forced low and reset on release.
pub const OUTPUT_GPIOS: [i32; 3] = [TRIGGER_GPIO, MOTOR_GPIO, MOTOR_AUX_GPIO];
