//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn RfidDevice>`
//! is not an option. The enums here pick the driver at runtime while keeping
//! concrete types, which also keeps the futures they return `Send` so a
//! reader loop can be spawned onto the Tokio runtime.
//!
//! # Examples
//!
//! ```
//! use portico_hardware::devices::AnyRfidDevice;
//! use portico_hardware::mock::MockRfid;
//!
//! let (reader, _handle) = MockRfid::new();
//! let any_reader = AnyRfidDevice::Mock(reader);
//! ```

use crate::mock::{MockOutput, MockRfid};
use crate::sysfs::SysfsOutput;
use crate::traits::{CardData, DigitalOutput, RfidDevice};
use crate::types::{Level, ReaderInfo};
use crate::Result;
use std::time::Duration;

#[cfg(feature = "hardware-pcsc")]
use crate::pcsc_reader::PcscReader;

/// Enum wrapper for RFID reader device dispatch.
///
/// # Examples
///
/// ```
/// use portico_hardware::devices::AnyRfidDevice;
/// use portico_hardware::traits::RfidDevice;
/// use portico_hardware::mock::MockRfid;
///
/// #[tokio::main]
/// async fn main() -> portico_hardware::Result<()> {
///     let (reader, _handle) = MockRfid::new();
///     let any_reader = AnyRfidDevice::Mock(reader);
///
///     let info = any_reader.get_reader_info().await?;
///     println!("Reader: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRfidDevice {
    /// Mock RFID reader for development and testing.
    Mock(MockRfid),

    /// PC/SC contactless reader.
    #[cfg(feature = "hardware-pcsc")]
    Pcsc(PcscReader),
}

impl RfidDevice for AnyRfidDevice {
    async fn poll_card(&mut self, timeout: Duration) -> Result<Option<CardData>> {
        match self {
            Self::Mock(device) => device.poll_card(timeout).await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.poll_card(timeout).await,
        }
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        match self {
            Self::Mock(device) => device.get_reader_info().await,
            #[cfg(feature = "hardware-pcsc")]
            Self::Pcsc(device) => device.get_reader_info().await,
        }
    }
}

/// Enum wrapper for digital output dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyOutput {
    /// Mock output for development and testing.
    Mock(MockOutput),

    /// GPIO line through sysfs.
    Sysfs(SysfsOutput),
}

impl DigitalOutput for AnyOutput {
    fn set_level(&mut self, level: Level) -> Result<()> {
        match self {
            Self::Mock(output) => output.set_level(level),
            Self::Sysfs(output) => output.set_level(level),
        }
    }

    fn level(&self) -> Level {
        match self {
            Self::Mock(output) => output.level(),
            Self::Sysfs(output) => output.level(),
        }
    }
}
