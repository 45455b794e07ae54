//! Debounced stop button.
//!
//! ## Hardware
//!
//! Active-low momentary switch (the BOOT button) with the internal pull-up
//! enabled. A small watcher thread samples it every [`POLL_MS`] and feeds
//! [`StopButton::tick`]; once a press has been held for [`DEBOUNCE_MS`]
//! the watcher cancels the alert loop. This is the board's equivalent of
//! Ctrl-C on the host.
//!
//! The gesture logic is pure, so it is exercised on the host.

#[cfg(target_os = "espidf")]
use crate::shutdown::CancelToken;

pub const DEBOUNCE_MS: u32 = 50;
pub const POLL_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Released,
    Bouncing { since_ms: u32 },
    Held,
}

pub struct StopButton {
    state: PressState,
}

impl Default for StopButton {
    fn default() -> Self {
        Self::new()
    }
}

impl StopButton {
    pub fn new() -> Self {
        Self {
            state: PressState::Released,
        }
    }

    /// Feed one sample. `pressed` is the raw pin level, already inverted
    /// for active-low wiring. Returns `true` exactly once per
    /// confirmed press.
    pub fn tick(&mut self, pressed: bool, now_ms: u32) -> bool {
        match (self.state, pressed) {
            (_, false) => {
                self.state = PressState::Released;
                false
            }
            (PressState::Released, true) => {
                self.state = PressState::Bouncing { since_ms: now_ms };
                false
            }
            (PressState::Bouncing { since_ms }, true) => {
                if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = PressState::Held;
                    true
                } else {
                    false
                }
            }
            (PressState::Held, true) => false,
        }
    }
}

/// Spawn the watcher thread that turns a stop-button press into a
/// cancellation request.
#[cfg(target_os = "espidf")]
pub fn spawn_stop_watcher(
    mut pin: crate::drivers::hw_init::EspInput,
    cancel: CancelToken,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    use embedded_hal::digital::InputPin;

    std::thread::Builder::new()
        .name("stop-button".into())
        .stack_size(4096)
        .spawn(move || {
            let mut button = StopButton::new();
            let mut now_ms: u32 = 0;
            while !cancel.is_cancelled() {
                // Active-low: a read error counts as "not pressed".
                let pressed = InputPin::is_low(&mut pin).unwrap_or(false);
                if button.tick(pressed, now_ms) {
                    log::info!("Stop button pressed");
                    cancel.cancel();
                }
                std::thread::sleep(std::time::Duration::from_millis(u64::from(POLL_MS)));
                now_ms = now_ms.wrapping_add(POLL_MS);
            }
        })
}
