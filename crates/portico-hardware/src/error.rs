//! Error types for hardware operations.
//!
//! Hardware errors never cross a channel boundary: the loop that owns a
//! device logs them and keeps polling. The variants exist so that the log
//! line says what actually went wrong.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device went away, or its feeding side was dropped.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// The device could not be opened or configured.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// A single card read failed; the next poll may succeed.
    #[error("Card read error: {message}")]
    CardRead { message: String },

    /// The device answered with something unusable.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Talking to the device or its service failed.
    #[error("Communication error: {message}")]
    Communication { message: String },

    /// An output line could not be driven.
    #[error("Output error: {message}")]
    Output { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardRead {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// True when the device is gone rather than momentarily failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. } | Self::InitializationFailed { .. }
        )
    }
}
