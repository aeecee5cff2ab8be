//! Screen-driven match automation for a card-battle game client.
//!
//! This crate polls the screen for a small set of known visual markers,
//! classifies what it sees into a lifecycle state machine, and issues
//! simulated mouse clicks to keep matches running. Visual detection is
//! noisy by nature, so state transitions are filtered through debounce
//! and stability windows rather than trusted frame by frame.

pub mod actuator;
pub mod errors;
pub mod marker;
pub mod monitor;
pub mod platforms;
pub mod sensor;
pub mod state;
pub mod stats;
#[cfg(test)]
mod tests;

pub use actuator::{Actuator, ClickRetry, Jitter};
pub use errors::BotError;
pub use marker::{AssetCatalog, AssetReport, Marker, MarkerQuery};
pub use monitor::{Monitor, MonitorConfig};
pub use sensor::{Detection, Point, ScreenSensor};
pub use state::{GameMode, GameState, Timers};
pub use stats::{format_duration, RunStats, StatsReport};
