//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements              | Connects to                 |
//! |------------|-------------------------|-----------------------------|
//! | `hardware` | SensorPort, ActuatorPort| Ranger + motor pins         |
//! | `log_sink` | EventSink               | Serial log output           |
//! | `time`     | TimePort                | ESP32 system timer / host   |
//! | `sim`      | TimePort, GpioPort, pins| Virtual-time host bench     |

pub mod hardware;
pub mod log_sink;
#[cfg(not(target_os = "espidf"))]
pub mod sim;
pub mod time;
