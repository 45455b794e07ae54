//! HapticRange firmware library.
//!
//! A wearable proximity alert: an HC-SR04 ultrasonic ranger is sampled on
//! a fixed interval and a vibration motor plays a waveform chosen by how
//! close the nearest obstacle is.
//!
//! Exposes every module for integration testing on the host. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; host builds get the [`adapters::sim`] bench instead.

#![deny(unused_must_use)]

pub mod adapters;
pub mod alert;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod sensors;
pub mod shutdown;

pub use error::{Error, Result};
