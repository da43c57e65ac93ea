//! Contactless reader driven through the PC/SC smart card service.
//!
//! The reader is polled with `SCardGetStatusChange`. A UID is only read on
//! the transition to "card present", so a card left lying on the reader
//! produces a single read rather than one per poll.
//!
//! PC/SC calls block, so every poll runs on the blocking thread pool.

use crate::{
    HardwareError, Result,
    traits::{CardData, RfidDevice},
    types::ReaderInfo,
};
use pcsc::{Context, Protocols, ReaderState, Scope, ShareMode, State};
use std::ffi::{CStr, CString};
use std::time::Duration;
use tracing::{debug, info};

/// Pseudo-APDU asking the reader for the UID of the card in the field.
const GET_UID_APDU: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Status word of a successful APDU.
const SW_SUCCESS: [u8; 2] = [0x90, 0x00];

/// PC/SC contactless reader.
#[derive(Debug)]
pub struct PcscReader {
    context: Context,
    reader: CString,
    last_state: State,
}

impl PcscReader {
    /// Connect to the first reader known to the PC/SC service.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] if the service is not
    /// running or no reader is attached.
    pub fn open_first() -> Result<Self> {
        let context = establish()?;
        let reader = context
            .list_readers_owned()
            .map_err(|e| HardwareError::initialization_failed(format!("cannot list readers: {e}")))?
            .into_iter()
            .next()
            .ok_or_else(|| HardwareError::initialization_failed("no PC/SC reader attached"))?;

        info!(reader = %reader.to_string_lossy(), "using PC/SC reader");
        Ok(Self::with_context(context, reader))
    }

    /// Connect to the reader with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] if the service is not
    /// running or the name contains a NUL byte.
    pub fn open(name: &str) -> Result<Self> {
        let context = establish()?;
        let reader = CString::new(name)
            .map_err(|_| HardwareError::initialization_failed("reader name contains NUL"))?;
        Ok(Self::with_context(context, reader))
    }

    fn with_context(context: Context, reader: CString) -> Self {
        Self {
            context,
            reader,
            last_state: State::UNAWARE,
        }
    }

    /// Name of the reader as reported by PC/SC.
    pub fn name(&self) -> String {
        self.reader.to_string_lossy().into_owned()
    }
}

fn establish() -> Result<Context> {
    Context::establish(Scope::User).map_err(|e| {
        HardwareError::initialization_failed(format!("cannot reach PC/SC service: {e}"))
    })
}

fn map_pcsc_error(reader: &CStr, error: pcsc::Error) -> HardwareError {
    match error {
        pcsc::Error::UnknownReader
        | pcsc::Error::ReaderUnavailable
        | pcsc::Error::NoReadersAvailable
        | pcsc::Error::NoService
        | pcsc::Error::ServiceStopped => {
            HardwareError::disconnected(reader.to_string_lossy().into_owned())
        }
        other => HardwareError::communication(other.to_string()),
    }
}

/// Wait for a state change and read the UID if a card just arrived.
fn wait_and_read(
    context: &Context,
    reader: &CStr,
    last_state: State,
    timeout: Duration,
) -> Result<(State, Option<Vec<u8>>)> {
    let mut states = [ReaderState::new(reader.to_owned(), last_state)];

    match context.get_status_change(Some(timeout), &mut states) {
        Ok(()) => {}
        Err(pcsc::Error::Timeout) => return Ok((last_state, None)),
        Err(e) => return Err(map_pcsc_error(reader, e)),
    }

    let state = states[0].event_state();
    let arrived = state.contains(State::PRESENT) && !last_state.contains(State::PRESENT);
    if !arrived {
        return Ok((state, None));
    }

    let card = match context.connect(reader, ShareMode::Shared, Protocols::ANY) {
        Ok(card) => card,
        Err(pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard) => return Ok((state, None)),
        Err(e) => return Err(map_pcsc_error(reader, e)),
    };

    let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
    let response = match card.transmit(&GET_UID_APDU, &mut buffer) {
        Ok(response) => response,
        Err(pcsc::Error::RemovedCard) => return Ok((state, None)),
        Err(e) => return Err(HardwareError::card_read(e.to_string())),
    };

    match response.strip_suffix(&SW_SUCCESS) {
        Some(uid) => Ok((state, Some(uid.to_vec()))),
        None => {
            debug!(response = ?response, "UID request rejected by card");
            Ok((state, None))
        }
    }
}

impl RfidDevice for PcscReader {
    async fn poll_card(&mut self, timeout: Duration) -> Result<Option<CardData>> {
        let context = self.context.clone();
        let reader = self.reader.clone();
        let last_state = self.last_state;

        let (state, uid) = tokio::task::spawn_blocking(move || {
            wait_and_read(&context, &reader, last_state, timeout)
        })
        .await
        .map_err(|e| HardwareError::communication(format!("PC/SC poll task failed: {e}")))??;

        self.last_state = state;

        let Some(uid) = uid else {
            return Ok(None);
        };

        match CardData::new(uid) {
            Ok(card) => Ok(Some(card)),
            Err(e) => {
                debug!(error = %e, "garbled read treated as no card");
                Ok(None)
            }
        }
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        Ok(ReaderInfo::new(
            self.name(),
            vec!["ISO14443A".to_string(), "ISO14443B".to_string()],
        ))
    }
}
