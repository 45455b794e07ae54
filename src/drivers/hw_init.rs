//! One-shot hardware peripheral initialization.
//!
//! Builds the `PinDriver`s for the ranger, the motors and the stop button
//! from the numbers in [`pins`](crate::pins), and provides the
//! [`GpioPort`] that parks the outputs on release. Called once from
//! `main()` before the alert loop starts.
//!
//! Release never calls `gpio_reset_pin`: that re-enables the internal
//! pull-up, which would bias the motor transistors on. Outputs are driven
//! low and pulled down instead; the `PinDriver`s detach the pins when
//! they are dropped.

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
#[cfg(target_os = "espidf")]
use log::{info, warn};

#[cfg(target_os = "espidf")]
use crate::app::ports::GpioPort;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    /// `PinDriver` construction failed for the given GPIO.
    GpioConfigFailed(i32),
    /// Pull-up configuration failed for the given GPIO.
    PullConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(pin) => write!(f, "GPIO{} config failed", pin),
            Self::PullConfigFailed(pin) => write!(f, "GPIO{} pull-up config failed", pin),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── ESP-IDF pins ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub type EspOutput = PinDriver<'static, AnyOutputPin, Output>;
#[cfg(target_os = "espidf")]
pub type EspInput = PinDriver<'static, AnyIOPin, Input>;

/// Every pin the firmware uses, configured and idle.
#[cfg(target_os = "espidf")]
pub struct BoardPins {
    pub trigger: EspOutput,
    pub echo: EspInput,
    pub motor: EspOutput,
    pub motor_aux: EspOutput,
    pub stop_button: EspInput,
}

#[cfg(target_os = "espidf")]
fn output(gpio: i32) -> Result<EspOutput, HwInitError> {
    // SAFETY: each GPIO number in `pins` is claimed exactly once, here,
    // before the alert loop starts; no other driver touches these pins.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    let mut driver = PinDriver::output(pin).map_err(|_| HwInitError::GpioConfigFailed(gpio))?;
    driver
        .set_low()
        .map_err(|_| HwInitError::GpioConfigFailed(gpio))?;
    Ok(driver)
}

#[cfg(target_os = "espidf")]
fn input(gpio: i32, pull: Pull) -> Result<EspInput, HwInitError> {
    // SAFETY: see `output`. IO-capable so the pull can be configured.
    let pin = unsafe { AnyIOPin::new(gpio) };
    let mut driver = PinDriver::input(pin).map_err(|_| HwInitError::GpioConfigFailed(gpio))?;
    driver
        .set_pull(pull)
        .map_err(|_| HwInitError::PullConfigFailed(gpio))?;
    Ok(driver)
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<BoardPins, HwInitError> {
    let board = BoardPins {
        trigger: output(pins::TRIGGER_GPIO)?,
        // The HC-SR04 drives ECHO push-pull; no pull needed.
        echo: input(pins::ECHO_GPIO, Pull::Floating)?,
        motor: output(pins::MOTOR_GPIO)?,
        motor_aux: output(pins::MOTOR_AUX_GPIO)?,
        stop_button: input(pins::STOP_BUTTON_GPIO, Pull::Up)?,
    };
    info!(
        "hw_init: TRIG=GPIO{} ECHO=GPIO{} MOTOR=GPIO{} AUX=GPIO{} STOP=GPIO{}",
        pins::TRIGGER_GPIO,
        pins::ECHO_GPIO,
        pins::MOTOR_GPIO,
        pins::MOTOR_AUX_GPIO,
        pins::STOP_BUTTON_GPIO,
    );
    Ok(board)
}

// ── Release ───────────────────────────────────────────────────

/// One register-level action taken when the outputs are handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    /// Output level 0.
    DriveLow(i32),
    /// Internal pull-down on, pull-up off.
    PullDown(i32),
}

/// Actions applied to every owned output, in order.
pub fn release_sequence() -> impl Iterator<Item = ReleaseStep> {
    pins::OUTPUT_GPIOS
        .iter()
        .flat_map(|&gpio| [ReleaseStep::DriveLow(gpio), ReleaseStep::PullDown(gpio)])
}

/// Parks the firmware's output pins low.
#[cfg(target_os = "espidf")]
pub struct EspGpioPort;

#[cfg(target_os = "espidf")]
impl GpioPort for EspGpioPort {
    fn release(&mut self) {
        use esp_idf_svc::sys::{
            gpio_pull_mode_t_GPIO_PULLDOWN_ONLY, gpio_set_level, gpio_set_pull_mode, ESP_OK,
        };

        for step in release_sequence() {
            // SAFETY: the pins are still owned by this firmware's
            // `PinDriver`s; these calls only touch their level and pulls.
            let (gpio, ret) = match step {
                ReleaseStep::DriveLow(gpio) => (gpio, unsafe { gpio_set_level(gpio, 0) }),
                ReleaseStep::PullDown(gpio) => (gpio, unsafe {
                    gpio_set_pull_mode(gpio, gpio_pull_mode_t_GPIO_PULLDOWN_ONLY)
                }),
            };
            if ret != ESP_OK {
                warn!("hw_init: GPIO{} {:?} returned {}", gpio, step, ret);
            }
        }
        info!("hw_init: outputs parked low");
    }
}
