//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware.

pub mod output;
pub mod rfid;

// Re-export commonly used types
pub use output::{MockOutput, MockOutputHandle};
pub use rfid::{MockRfid, MockRfidHandle};
