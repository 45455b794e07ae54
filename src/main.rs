//! HapticRange Firmware: main entry point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HardwareAdapter        LogEventSink       SystemClock       │
//! │  (Sensor+Actuator)      (EventSink)        (TimePort)        │
//! │  EspGpioPort / SimPort  stop button / Ctrl-C → CancelToken   │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            AlertLoop (pure logic)                      │  │
//! │  │  sample · classify (AlertPolicy) · play · idle wait    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the board the adapters wrap ESP-IDF `PinDriver`s. On the host the
//! same loop runs against the simulation bench in real time, with a
//! scripted obstacle walking towards and away from the wearer.

use anyhow::{Context, Result};
use log::{debug, info};

use hapticrange::adapters::hardware::HardwareAdapter;
use hapticrange::adapters::log_sink::LogEventSink;
use hapticrange::app::service::AlertLoop;
use hapticrange::config::AlertConfig;
use hapticrange::drivers::haptic::HapticMotor;
use hapticrange::sensors::ultrasonic::{RangingTiming, UltrasonicSensor};
use hapticrange::shutdown::CancelToken;
use hapticrange::Error;

fn main() -> Result<()> {
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HapticRange v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = AlertConfig::default();
    config.validate().map_err(Error::from)?;
    debug!("config: {}", serde_json::to_string(&config)?);

    let cancel = CancelToken::new();
    platform::run(config, cancel)
}

/// Drive the alert loop against the assembled hardware.
///
/// The self-test may be interrupted; the loop then exits on its first
/// cancellation check, still releasing the outputs.
fn run_alert_loop<C, H>(alert_loop: &mut AlertLoop<C>, hw: &mut H) -> Result<()>
where
    C: hapticrange::app::ports::TimePort,
    H: hapticrange::app::ports::SensorPort + hapticrange::app::ports::ActuatorPort,
{
    let mut sink = LogEventSink::new();
    alert_loop.announce(&mut sink);
    match alert_loop.self_test(hw, &mut sink) {
        Ok(()) | Err(Error::Cancelled) => {}
        Err(e) => return Err(e).context("motor self-test failed"),
    }
    alert_loop.run(hw, &mut sink).context("alert loop failed")
}

// ── Board ─────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(target_os = "espidf")]
mod platform {
    use super::*;
    use hapticrange::adapters::time::SystemClock;
    use hapticrange::drivers::{button, hw_init};

    pub fn run(config: AlertConfig, cancel: CancelToken) -> Result<()> {
        let board = hw_init::init_peripherals().map_err(Error::from)?;

        let mut hw = HardwareAdapter::new(
            UltrasonicSensor::new(board.trigger, board.echo, RangingTiming::from(&config)),
            HapticMotor::new(board.motor),
            Some(HapticMotor::new(board.motor_aux)),
            hw_init::EspGpioPort,
        )?;

        let _watcher = button::spawn_stop_watcher(board.stop_button, cancel.clone())
            .context("failed to start stop-button watcher")?;

        let mut alert_loop = AlertLoop::new(config, SystemClock::new(), cancel)?;
        run_alert_loop(&mut alert_loop, &mut hw)
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
fn init_logging() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

#[cfg(not(target_os = "espidf"))]
mod platform {
    use super::*;
    use hapticrange::adapters::sim::{Line, Obstacle, SimBench};

    /// An obstacle approaching through every zone, then walking away.
    const WALK: [Obstacle; 8] = [
        Obstacle::At(520.0),
        Obstacle::At(310.0),
        Obstacle::At(150.0),
        Obstacle::At(70.0),
        Obstacle::At(22.0),
        Obstacle::Silent,
        Obstacle::At(180.0),
        Obstacle::At(450.0),
    ];

    pub fn run(config: AlertConfig, cancel: CancelToken) -> Result<()> {
        {
            let cancel = cancel.clone();
            ctrlc::set_handler(move || cancel.cancel())
                .context("failed to install Ctrl-C handler")?;
        }

        info!("No board attached: running on the simulation bench");
        let bench = SimBench::new().realtime();
        bench.script_repeating(WALK);

        let mut hw = HardwareAdapter::new(
            UltrasonicSensor::new(
                bench.output(Line::Trigger),
                bench.echo(),
                RangingTiming::from(&config),
            ),
            HapticMotor::new(bench.output(Line::Motor)),
            Some(HapticMotor::new(bench.output(Line::MotorAux))),
            bench.port(),
        )?;

        let mut alert_loop = AlertLoop::new(config, bench.clock(), cancel)?;
        run_alert_loop(&mut alert_loop, &mut hw)?;

        let pulses = bench.edges(Line::Motor).iter().filter(|e| e.high).count();
        info!("Motor switched on {} times", pulses);
        Ok(())
    }
}
