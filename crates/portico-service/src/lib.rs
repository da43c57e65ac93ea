//! Access-event pipeline for Portico.
//!
//! This crate ties the hardware, protocol and storage crates together:
//!
//! - [`AccessEventProcessor`] - decides, records and escalates one read
//! - [`CardChannel`] - card reader polling loop with [`CardDebouncer`]
//! - [`SerialChannel`] / [`SerialEventHandler`] - microcontroller link
//! - [`WorkerPool`] - bounded fan-out between read loops and the processor
//! - [`EmployeeAdmin`] - administrative employee operations and bulk sync
//! - [`Portico`] - the service context everything above hangs off
//!
//! # Data flow
//!
//! ```text
//! card reader ──> CardChannel ──> CardDebouncer ──┐
//!                                                 ├──> WorkerPool ──> AccessEventProcessor ──> store
//! process_event (api) ────────────────────────────┘                          │
//!                                                                            └──> AlarmActuator
//! serial link ──> SerialEventHandler ──> store
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use portico_core::Channel;
//! use portico_service::{Portico, ServiceConfig, open_card_reader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::load_from_path("portico.toml")?;
//! let portico = Portico::from_config(config).await?;
//!
//! let (reader, _feed) = open_card_reader(&portico.config().card_reader)?;
//! portico.start_card_channel(reader);
//! portico.start_serial_channel();
//!
//! let decision = portico.process_event("12345678", Channel::Api).await?;
//! println!("{}", decision.message);
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod card_channel;
pub mod config;
pub mod debounce;
pub mod error;
pub mod processor;
pub mod serial_channel;
pub mod service;
pub mod worker;

pub use admin::{AdminOutcome, EmployeeAdmin, SyncReport};
pub use card_channel::{CardChannel, PollOutcome};
pub use config::ServiceConfig;
pub use debounce::CardDebouncer;
pub use error::{ServiceError, ServiceResult};
pub use processor::{AccessDecision, AccessEventProcessor, ProcessorConfig};
pub use serial_channel::{LineOutcome, SerialChannel, SerialEventHandler};
pub use service::{Portico, SystemStatus, open_card_reader, open_output};
pub use worker::{WorkerHandle, WorkerPool};
