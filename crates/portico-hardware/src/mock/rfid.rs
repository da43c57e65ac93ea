//! Mock RFID reader implementation for testing and development.
//!
//! This module provides a simulated card reader that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{
    HardwareError, Result,
    traits::{CardData, RfidDevice},
    types::ReaderInfo,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Mock RFID reader for testing and development.
///
/// Each [`poll_card`](RfidDevice::poll_card) takes at most one event
/// queued through the paired [`MockRfidHandle`], or returns `Ok(None)` when
/// nothing arrives within the poll timeout.
///
/// # Examples
///
/// ```
/// use portico_hardware::mock::MockRfid;
/// use portico_hardware::traits::RfidDevice;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> portico_hardware::Result<()> {
///     let (mut reader, handle) = MockRfid::new();
///
///     handle.present_card(vec![0x00, 0x00, 0x30, 0x39]).await?;
///
///     let card = reader.poll_card(Duration::from_millis(100)).await?.unwrap();
///     assert_eq!(card.identification().unwrap().as_str(), "00012345");
///
///     // Nothing else queued: the poll times out as "no card".
///     assert!(reader.poll_card(Duration::from_millis(10)).await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRfid {
    /// Channel receiver for reader events
    event_rx: mpsc::Receiver<ReaderEvent>,

    /// Device name
    name: String,
}

impl MockRfid {
    /// Create a new mock RFID reader with the default name.
    ///
    /// Returns a tuple of (MockRfid, MockRfidHandle) where the handle
    /// can be used to simulate card presentations and read failures.
    pub fn new() -> (Self, MockRfidHandle) {
        Self::with_name("Mock RFID Reader".to_string())
    }

    /// Create a new mock RFID reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockRfidHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);

        let reader = Self {
            event_rx,
            name: name.clone(),
        };

        let handle = MockRfidHandle { event_tx, name };

        (reader, handle)
    }
}

impl RfidDevice for MockRfid {
    async fn poll_card(&mut self, timeout: Duration) -> Result<Option<CardData>> {
        let event = match tokio::time::timeout(timeout, self.event_rx.recv()).await {
            Err(_) => return Ok(None),
            Ok(None) => return Err(HardwareError::disconnected(self.name.clone())),
            Ok(Some(event)) => event,
        };

        match event {
            ReaderEvent::Presented(uid) => match CardData::new(uid) {
                Ok(card) => Ok(Some(card)),
                Err(e) => {
                    debug!(reader = %self.name, error = %e, "garbled read treated as no card");
                    Ok(None)
                }
            },
            ReaderEvent::Failure(message) => Err(HardwareError::card_read(message)),
        }
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        Ok(ReaderInfo::new(
            self.name.clone(),
            vec!["ISO14443A".to_string()],
        ))
    }
}

/// Internal event type for mock RFID reader.
#[derive(Debug, Clone)]
enum ReaderEvent {
    Presented(Vec<u8>),
    Failure(String),
}

/// Handle for controlling a mock RFID reader.
///
/// Dropping every handle disconnects the reader: subsequent polls fail with
/// [`HardwareError::Disconnected`].
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    /// Channel sender for reader events
    event_tx: mpsc::Sender<ReaderEvent>,

    /// Device name
    name: String,
}

impl MockRfidHandle {
    /// Present a card with the given raw UID bytes.
    ///
    /// The bytes are not validated here: presenting a UID of invalid length
    /// simulates a garbled read, which the reader reports as no card.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present_card(&self, uid: Vec<u8>) -> Result<()> {
        self.send(ReaderEvent::Presented(uid)).await
    }

    /// Make the next poll fail with a card read error.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn fail_next_read(&self, message: impl Into<String>) -> Result<()> {
        self.send(ReaderEvent::Failure(message.into())).await
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: ReaderEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }
}
