//! Hardware device trait definitions.
//!
//! Two contracts connect the access pipeline to physical devices:
//!
//! - [`RfidDevice`]: a contactless card reader polled once per loop
//!   iteration, each poll bounded by a device timeout.
//! - [`DigitalOutput`]: a single output bit, used to drive the alarm.
//!
//! Card reads are normalized here, at the device boundary: a read that
//! cannot produce a valid UID is reported as "no card present" rather than
//! as an error.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{Level, ReaderInfo};
use portico_core::Identification;
use portico_core::constants::IDENTIFICATION_WIDTH;
use std::time::Duration;

/// Shortest UID a contactless card reports (ISO 14443 single size).
pub const MIN_UID_LENGTH: usize = 4;

/// Longest UID a contactless card reports (ISO 14443 triple size).
pub const MAX_UID_LENGTH: usize = 10;

/// UID of a card held in the reader's field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardData {
    uid: Vec<u8>,
}

impl CardData {
    /// Wrap a raw UID.
    ///
    /// # Errors
    ///
    /// [`HardwareError::InvalidData`](crate::HardwareError::InvalidData) if
    /// the UID is shorter than [`MIN_UID_LENGTH`] or longer than
    /// [`MAX_UID_LENGTH`] bytes.
    pub fn new(uid: Vec<u8>) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(crate::HardwareError::invalid_data(format!(
                "uid of {} bytes, expected {MIN_UID_LENGTH}..={MAX_UID_LENGTH}",
                uid.len()
            )));
        }
        Ok(Self { uid })
    }

    pub fn uid(&self) -> &[u8] {
        &self.uid
    }

    /// Upper-case hex, for logs.
    pub fn uid_hex(&self) -> String {
        self.uid.iter().map(|b| format!("{b:02X}")).collect()
    }

    /// Big-endian decimal rendering of the UID.
    ///
    /// Bytes past the eighth are ignored so the value fits in a `u64`.
    ///
    /// ```
    /// use portico_hardware::traits::CardData;
    ///
    /// let card = CardData::new(vec![0x01, 0x02, 0x03, 0x04]).unwrap();
    /// assert_eq!(card.uid_decimal(), "16909060");
    /// ```
    pub fn uid_decimal(&self) -> String {
        self.uid
            .iter()
            .take(8)
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
            .to_string()
    }

    /// Normalize the read into a fixed-width identification.
    ///
    /// The decimal UID is left-padded with zeros to
    /// [`IDENTIFICATION_WIDTH`](portico_core::constants::IDENTIFICATION_WIDTH).
    /// An all-zero UID is what a reader reports for a garbled anticollision
    /// and yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portico_hardware::traits::CardData;
    ///
    /// let card = CardData::new(vec![0x00, 0x00, 0x30, 0x39]).unwrap();
    /// assert_eq!(card.identification().unwrap().as_str(), "00012345");
    /// ```
    pub fn identification(&self) -> Option<Identification> {
        self.identification_with_width(IDENTIFICATION_WIDTH)
    }

    /// Like [`identification`](Self::identification), padded to `width`.
    pub fn identification_with_width(&self, width: usize) -> Option<Identification> {
        if self.uid.iter().all(|b| *b == 0) {
            return None;
        }
        Identification::new(format!("{:0>width$}", self.uid_decimal())).ok()
    }
}

/// RFID reader device abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait uses native `async fn` and is therefore not object-safe. Use
/// generic type parameters, or [`AnyRfidDevice`](crate::devices::AnyRfidDevice)
/// for runtime selection of the driver.
///
/// # Examples
///
/// ```no_run
/// use portico_hardware::traits::RfidDevice;
/// use portico_hardware::error::Result;
/// use std::time::Duration;
///
/// async fn wait_for_badge<R: RfidDevice>(reader: &mut R) -> Result<String> {
///     loop {
///         if let Some(card) = reader.poll_card(Duration::from_secs(1)).await?
///             && let Some(id) = card.identification()
///         {
///             return Ok(id.into_inner());
///         }
///     }
/// }
/// ```
pub trait RfidDevice: Send {
    /// Attempt a single card read, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when no card entered the field within the
    /// timeout, or when the read produced data that is not a valid UID.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device is disconnected
    /// - A communication error occurs during the read
    async fn poll_card(&mut self, timeout: Duration) -> Result<Option<CardData>>;

    /// Get reader information.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs while querying
    /// reader information.
    async fn get_reader_info(&self) -> Result<ReaderInfo>;
}

/// Single-bit digital output.
///
/// Setting a level is a short synchronous write (a GPIO register or a sysfs
/// file), so the trait is blocking. This also lets an RAII guard drive the
/// output from `Drop`.
pub trait DigitalOutput: Send {
    /// Drive the output to `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying line cannot be written.
    fn set_level(&mut self, level: Level) -> Result<()>;

    /// Last level successfully written.
    fn level(&self) -> Level;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3)]
    #[case(11)]
    fn test_card_data_rejects_uid_length(#[case] len: usize) {
        assert!(CardData::new(vec![0x01; len]).is_err());
    }

    #[test]
    fn test_uid_hex() {
        let card = CardData::new(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(card.uid_hex(), "04ABCDEF");
    }

    #[test]
    fn test_identification_is_zero_padded() {
        let card = CardData::new(vec![0x00, 0x00, 0x00, 0x07]).unwrap();
        assert_eq!(card.identification().unwrap().as_str(), "00000007");
    }

    #[test]
    fn test_identification_wider_than_width_is_kept() {
        let card = CardData::new(vec![0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(card.identification().unwrap().as_str(), "4294967295");
    }

    #[test]
    fn test_identification_custom_width() {
        let card = CardData::new(vec![0x00, 0x00, 0x00, 0x07]).unwrap();
        assert_eq!(card.identification_with_width(10).unwrap().as_str(), "0000000007");
        assert_eq!(card.identification_with_width(0).unwrap().as_str(), "7");
    }

    #[test]
    fn test_all_zero_uid_is_no_card() {
        let card = CardData::new(vec![0x00; 4]).unwrap();
        assert!(card.identification().is_none());
    }

    #[test]
    fn test_uid_decimal_uses_first_eight_bytes() {
        let card = CardData::new(vec![0x01; 10]).unwrap();
        assert_eq!(card.uid_decimal(), "72340172838076673");
        assert_eq!(card.uid().len(), 10);
    }
}
