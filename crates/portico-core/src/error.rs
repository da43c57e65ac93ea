use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid identification: {0}")]
    InvalidIdentification(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
