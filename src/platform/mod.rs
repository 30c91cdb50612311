//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Input events

pub mod clock;
pub mod input;

pub use clock::{Clock, ManualClock, SystemClock};
pub use input::InputAction;
