//! Host simulation bench.
//!
//! A deterministic stand-in for the board: virtual time, a scripted
//! obstacle in front of the ranger, and recorded output edges. All handles
//! ([`SimClock`], [`SimOutput`], [`SimEcho`], [`SimPort`]) share one
//! timeline, so the real drivers run unmodified against it.
//!
//! ## Echo model
//!
//! When TRIG falls, the next scripted [`Obstacle`] is armed. ECHO rises
//! [`ECHO_RISE_DELAY_US`] later and stays high for the round-trip time of
//! the obstacle distance. Each ECHO read costs [`POLL_COST_US`] of virtual
//! time, so busy-wait loops make progress.
//!
//! In real-time mode, sleeps also block the host thread; echo spins stay
//! virtual.

use core::cell::RefCell;
use core::convert::Infallible;
use core::time::Duration;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::app::ports::{GpioPort, TimePort};
use crate::shutdown::CancelToken;

/// Time from the trigger falling edge to the echo rising edge.
/// The HC-SR04 sends its 8-cycle 40 kHz burst in between.
pub const ECHO_RISE_DELAY_US: u64 = 450;
/// Virtual cost of one ECHO read.
pub const POLL_COST_US: u64 = 1;
const SPEED_OF_SOUND_CM_PER_S: f64 = 34_300.0;

/// Output lines on the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Trigger,
    Motor,
    MotorAux,
}

impl Line {
    const fn index(self) -> usize {
        match self {
            Self::Trigger => 0,
            Self::Motor => 1,
            Self::MotorAux => 2,
        }
    }
}

/// What the ranger "sees" for one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    /// Reflector at the given distance (cm).
    At(f32),
    /// No echo at all.
    Silent,
    /// ECHO rises and never falls.
    Stuck,
}

/// One write to an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub at_us: u64,
    pub high: bool,
}

struct BenchState {
    now_us: u64,
    realtime: bool,
    script: Vec<Obstacle>,
    cursor: usize,
    repeat: bool,
    current: Obstacle,
    trigger_fell_at: Option<u64>,
    levels: [bool; 3],
    edges: [Vec<Edge>; 3],
    releases: u32,
    cancel_at: Option<(u64, CancelToken)>,
}

impl BenchState {
    fn arm_next_obstacle(&mut self) {
        if self.cursor >= self.script.len() && self.repeat {
            self.cursor = 0;
        }
        if let Some(next) = self.script.get(self.cursor) {
            self.current = *next;
            self.cursor += 1;
        }
    }

    fn echo_level(&self, at_us: u64) -> bool {
        let Some(fell) = self.trigger_fell_at else {
            return false;
        };
        let rise = fell + ECHO_RISE_DELAY_US;
        match self.current {
            Obstacle::Silent => false,
            Obstacle::Stuck => at_us >= rise,
            Obstacle::At(cm) => {
                let width = (f64::from(cm) * 2.0 / SPEED_OF_SOUND_CM_PER_S * 1e6).round() as u64;
                at_us >= rise && at_us < rise + width
            }
        }
    }

    fn advance(&mut self, us: u64) -> Option<CancelToken> {
        self.now_us += us;
        match &self.cancel_at {
            Some((at, token)) if self.now_us >= *at => {
                let token = token.clone();
                self.cancel_at = None;
                Some(token)
            }
            _ => None,
        }
    }
}

/// Shared handle to the simulated board.
#[derive(Clone)]
pub struct SimBench {
    inner: Rc<RefCell<BenchState>>,
}

impl Default for SimBench {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBench {
    /// A bench in virtual time with no obstacle scripted.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BenchState {
                now_us: 0,
                realtime: false,
                script: Vec::new(),
                cursor: 0,
                repeat: false,
                current: Obstacle::Silent,
                trigger_fell_at: None,
                levels: [false; 3],
                edges: [Vec::new(), Vec::new(), Vec::new()],
                releases: 0,
                cancel_at: None,
            })),
        }
    }

    /// Sleeps also block the host thread.
    pub fn realtime(self) -> Self {
        self.inner.borrow_mut().realtime = true;
        self
    }

    /// One obstacle per measurement; the last one persists.
    pub fn script(&self, obstacles: impl IntoIterator<Item = Obstacle>) {
        self.load_script(obstacles, false);
    }

    /// One obstacle per measurement, wrapping around forever.
    pub fn script_repeating(&self, obstacles: impl IntoIterator<Item = Obstacle>) {
        self.load_script(obstacles, true);
    }

    fn load_script(&self, obstacles: impl IntoIterator<Item = Obstacle>, repeat: bool) {
        let mut state = self.inner.borrow_mut();
        state.script = obstacles.into_iter().collect();
        state.cursor = 0;
        state.repeat = repeat;
    }

    /// Set `token` once virtual time reaches `at` (from bench start).
    pub fn cancel_at(&self, at: Duration, token: &CancelToken) {
        self.inner.borrow_mut().cancel_at = Some((at.as_micros() as u64, token.clone()));
    }

    pub fn clock(&self) -> SimClock {
        SimClock { bench: self.clone() }
    }

    pub fn output(&self, line: Line) -> SimOutput {
        SimOutput {
            bench: self.clone(),
            line,
        }
    }

    pub fn echo(&self) -> SimEcho {
        SimEcho { bench: self.clone() }
    }

    pub fn port(&self) -> SimPort {
        SimPort { bench: self.clone() }
    }

    pub fn now_us(&self) -> u64 {
        self.inner.borrow().now_us
    }

    /// Every write recorded on `line`, in order.
    pub fn edges(&self, line: Line) -> Vec<Edge> {
        self.inner.borrow().edges[line.index()].clone()
    }

    /// Current level of `line`.
    pub fn level(&self, line: Line) -> bool {
        self.inner.borrow().levels[line.index()]
    }

    /// How many times the GPIO port was released.
    pub fn releases(&self) -> u32 {
        self.inner.borrow().releases
    }

    fn advance(&self, us: u64) {
        let fired = self.inner.borrow_mut().advance(us);
        if let Some(token) = fired {
            token.cancel();
        }
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct SimClock {
    bench: SimBench,
}

impl TimePort for SimClock {
    fn uptime_us(&self) -> u64 {
        self.bench.now_us()
    }

    fn delay_us(&mut self, us: u32) {
        self.bench.advance(u64::from(us));
    }

    fn sleep(&mut self, duration: Duration) {
        if self.bench.inner.borrow().realtime {
            std::thread::sleep(duration);
        }
        self.bench.advance(duration.as_micros() as u64);
    }
}

// ── Output pins ───────────────────────────────────────────────

pub struct SimOutput {
    bench: SimBench,
    line: Line,
}

impl ErrorType for SimOutput {
    type Error = Infallible;
}

impl SimOutput {
    fn write(&mut self, high: bool) {
        let mut state = self.bench.inner.borrow_mut();
        let idx = self.line.index();
        let was_high = state.levels[idx];
        let at_us = state.now_us;
        state.levels[idx] = high;
        state.edges[idx].push(Edge { at_us, high });
        if self.line == Line::Trigger && was_high && !high {
            state.trigger_fell_at = Some(at_us);
            state.arm_next_obstacle();
        }
    }
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

// ── Echo input ────────────────────────────────────────────────

pub struct SimEcho {
    bench: SimBench,
}

impl ErrorType for SimEcho {
    type Error = Infallible;
}

impl InputPin for SimEcho {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let level = {
            let state = self.bench.inner.borrow();
            state.echo_level(state.now_us)
        };
        self.bench.advance(POLL_COST_US);
        Ok(level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ── GPIO port ─────────────────────────────────────────────────

pub struct SimPort {
    bench: SimBench,
}

impl GpioPort for SimPort {
    fn release(&mut self) {
        self.bench.inner.borrow_mut().releases += 1;
    }
}
