//! Wire protocol spoken with the access microcontroller over its serial link.
//!
//! The link carries two unrelated byte streams:
//!
//! - **Outbound** ([`DeviceCommand`]): a single opcode byte (`A` enroll,
//!   `B` revoke) immediately followed by the identification. No terminator
//!   and no acknowledgement.
//! - **Inbound** ([`DeviceEvent`]): newline-terminated text lines of the form
//!
//! ```text
//! tiempo=<token>, cedula=<id>, autorizado=<Si|No>, operacion=<Access|Alta|Baja>
//! ```
//!
//! [`SerialLineCodec`] frames both directions for use with
//! `tokio_util::codec::Framed`; [`DeviceEvent::parse`] tokenizes one line
//! into a typed record.
//!
//! # Examples
//!
//! ```
//! use portico_protocol::DeviceEvent;
//!
//! let event = DeviceEvent::parse("tiempo=0001, cedula=12345678, autorizado=Si, operacion=Alta")?;
//! assert!(event.authorized);
//! assert_eq!(event.identification.as_str(), "12345678");
//! # Ok::<(), portico_protocol::ParseError>(())
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod event;

pub use codec::SerialLineCodec;
pub use command::DeviceCommand;
pub use error::ParseError;
pub use event::DeviceEvent;
