//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod button;
pub mod haptic;
pub mod hw_init;
