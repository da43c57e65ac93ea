use portico_hardware::HardwareError;
use portico_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the service layer.
///
/// Channel loops never return these: they log and keep going. Only direct
/// callers (the API entry point, administrative operations) see them.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Event store failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Device failure outside a channel loop
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Caller passed an unusable identification or channel
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] portico_core::Error),

    /// Employee names must contain something besides whitespace
    #[error("Employee name cannot be empty")]
    EmptyName,

    /// The serial link never opened; commands cannot be sent
    #[error("Serial link unavailable: {port}")]
    SerialUnavailable { port: String },

    /// The identification cannot be carried by a serial command
    #[error("Identification cannot be sent to the device: {0}")]
    NotWireSafe(portico_core::Identification),

    /// Writing to the serial link failed
    #[error("Serial write failed: {0}")]
    SerialWrite(#[source] std::io::Error),

    /// The worker queue is full and the read was dropped
    #[error("Worker queue full")]
    QueueFull,

    /// The worker pool has shut down
    #[error("Worker pool closed")]
    PoolClosed,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// True when the event store is unreachable rather than rejecting input.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_unavailable())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
