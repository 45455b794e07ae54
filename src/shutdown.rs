//! Cancellation and guaranteed output release.
//!
//! The signal handler (Ctrl-C on the host, the stop button on the board)
//! only flips a [`CancelToken`]. The control thread observes it at loop
//! and sleep boundaries; every blocking wait is sliced so a stop request
//! is seen within [`SLEEP_SLICE`].
//!
//! [`ReleaseGuard`] ties output release to scope exit, so motors and the
//! trigger line go low however the loop ends: cancellation, a GPIO error,
//! or a panic unwinding through it.

use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;

use crate::app::ports::{ActuatorPort, TimePort};
use crate::error::{Error, Result};

/// Longest uninterrupted sleep.
pub const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared stop flag. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Safe to call from a signal-handler thread.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the flag is set.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Sleep for `duration` in [`SLEEP_SLICE`] steps, checking `cancel`
/// before each step.
pub fn sleep_cancellable<C: TimePort>(
    clock: &mut C,
    cancel: &CancelToken,
    duration: Duration,
) -> Result<()> {
    let mut remaining = duration;
    while !remaining.is_zero() {
        cancel.check()?;
        let step = remaining.min(SLEEP_SLICE);
        clock.sleep(step);
        remaining -= step;
    }
    Ok(())
}

/// Calls [`ActuatorPort::release`] when dropped.
pub struct ReleaseGuard<'a, A: ActuatorPort> {
    hw: &'a mut A,
}

impl<'a, A: ActuatorPort> ReleaseGuard<'a, A> {
    pub fn new(hw: &'a mut A) -> Self {
        Self { hw }
    }
}

impl<A: ActuatorPort> Deref for ReleaseGuard<'_, A> {
    type Target = A;

    fn deref(&self) -> &A {
        &*self.hw
    }
}

impl<A: ActuatorPort> DerefMut for ReleaseGuard<'_, A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut *self.hw
    }
}

impl<A: ActuatorPort> Drop for ReleaseGuard<'_, A> {
    fn drop(&mut self) {
        self.hw.release();
    }
}
