//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements        | Connects to                  |
//! |------------------|-------------------|------------------------------|
//! | `hal_pins`       | GpioPort          | embedded-hal `OutputPin`s    |
//! | `hardware`       | GpioPort          | in-memory simulated pins     |
//! | `key_value`      | ConfigPort        | dotenv-style config file     |
//! | `log_sink`       | EventSink         | `log` facade                 |
//! | `sim_camera`     | FrameSource       | synthetic moving target      |
//! |                  | FaceDetector      | brightness threshold         |
//! | `stdin_commands` | (command ingress) | JSON lines on a reader       |
//! | `time`           | MonotonicClock    | `std::time::Instant`         |
//! |                  | DelayNs           | `thread::sleep`              |

pub mod hal_pins;
pub mod hardware;
pub mod key_value;
pub mod log_sink;
pub mod sim_camera;
pub mod stdin_commands;
pub mod time;
