//! Hardware device abstraction layer for the Portico access pipeline.
//!
//! This crate provides the device contracts the pipeline is written against,
//! a mock for each of them, and the real drivers used on the gate controller.
//!
//! # Device Traits
//!
//! ## RFID Readers
//!
//! The [`RfidDevice`] trait represents contactless card readers. A poll is
//! bounded by a timeout and normalizes garbled reads into "no card":
//!
//! ```no_run
//! use portico_hardware::traits::RfidDevice;
//! use portico_hardware::error::Result;
//! use std::time::Duration;
//!
//! async fn next_uid<R: RfidDevice>(reader: &mut R) -> Result<Option<String>> {
//!     let card = reader.poll_card(Duration::from_secs(1)).await?;
//!     Ok(card.map(|c| c.uid_hex()))
//! }
//! ```
//!
//! ## Digital Outputs
//!
//! The [`DigitalOutput`] trait represents a single output bit. The
//! [`AlarmActuator`](alarm::AlarmActuator) drives one for a bounded time and
//! guarantees it ends low.
//!
//! # Drivers
//!
//! | Device  | Mock                        | Hardware                                   |
//! |---------|-----------------------------|--------------------------------------------|
//! | Reader  | [`mock::MockRfid`]          | `PcscReader` (feature `hardware-pcsc`)     |
//! | Output  | [`mock::MockOutput`]        | [`sysfs::SysfsOutput`]                     |
//!
//! Runtime selection goes through the enums in [`devices`].
//!
//! [`RfidDevice`]: traits::RfidDevice
//! [`DigitalOutput`]: traits::DigitalOutput

pub mod alarm;
pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-pcsc")]
pub mod pcsc_reader;
pub mod sysfs;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use alarm::AlarmActuator;
pub use devices::{AnyOutput, AnyRfidDevice};
pub use error::{HardwareError, Result};
pub use traits::{CardData, DigitalOutput, MAX_UID_LENGTH, MIN_UID_LENGTH, RfidDevice};
pub use types::{Level, ReaderInfo};
