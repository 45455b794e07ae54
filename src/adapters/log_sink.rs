//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by turning application events into console
//! status lines through the `log` facade (UART / USB-CDC on the board,
//! stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ZoneListed {
                upper_bound_cm,
                label,
                waveform,
            } => {
                info!("< {:.0}cm: {} ({})", upper_bound_cm, label, waveform.name());
            }
            AppEvent::ClearAbove(cm) => {
                info!(">= {:.0}cm: ALL CLEAR", cm);
            }
            AppEvent::SelfTestStarted => info!("Testing motor..."),
            AppEvent::SelfTestComplete => info!("Motor test complete"),
            AppEvent::Started { interval } => {
                info!(
                    "Starting with {:.1}s intervals (Ctrl-C or STOP to exit)",
                    interval.as_secs_f32()
                );
            }
            AppEvent::Measuring { cycle } => {
                info!("[{:03}] Measuring...", cycle);
            }
            AppEvent::Alert {
                cycle,
                label,
                distance_cm,
            } => {
                info!("[{:03}] {} - Object at {:.1}cm", cycle, label, distance_cm);
            }
            AppEvent::AllClear { cycle, distance_cm } => {
                info!("[{:03}] ALL CLEAR - {:.1}cm", cycle, distance_cm);
            }
            AppEvent::NoEcho { cycle, edge } => {
                warn!("[{:03}] No reading: {}", cycle, edge);
            }
            AppEvent::CountdownStarted { seconds } => {
                info!("Next in {}s", seconds);
            }
            AppEvent::CountdownTick { remaining } => info!("{}...", remaining),
            AppEvent::CountdownDone => info!("NOW!"),
            AppEvent::Stopped => info!("Stopped by user."),
            AppEvent::CleanupComplete => info!("Cleanup complete."),
        }
    }
}
