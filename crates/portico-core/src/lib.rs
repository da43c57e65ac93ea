//! Shared vocabulary for the Portico access-event pipeline.
//!
//! Every other crate in the workspace speaks in terms of the types defined
//! here: an [`Identification`] read on some [`Channel`], tagged with an
//! [`Operation`], travelling as a [`ChannelReadEvent`] until the access
//! processor turns it into a persisted event.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
