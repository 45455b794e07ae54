//! Sensor drivers.
//!
//! Only one sensor on this board: the HC-SR04 ultrasonic ranger.

pub mod ultrasonic;
