//! System time adapter.
//!
//! Implements [`TimePort`] for real hardware.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (microsecond
//!   precision, monotonic), ROM busy-wait for short delays, FreeRTOS-backed
//!   `std::thread::sleep` for long waits.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `std::thread::sleep`.

use core::time::Duration;

use crate::app::ports::TimePort;

/// Wall-clock time source for the target platform.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl TimePort for SystemClock {
    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time reads the free-running system timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since this clock was created.
    #[cfg(not(target_os = "espidf"))]
    fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    #[cfg(target_os = "espidf")]
    fn delay_us(&mut self, us: u32) {
        esp_idf_svc::hal::delay::Ets::delay_us(us);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_us(&mut self, us: u32) {
        // thread::sleep would overshoot a 10 µs pulse by orders of magnitude.
        let until = self.start.elapsed() + Duration::from_micros(u64::from(us));
        while self.start.elapsed() < until {
            core::hint::spin_loop();
        }
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
