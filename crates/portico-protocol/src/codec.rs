//! Tokio codec for the microcontroller serial link.
//!
//! # Overview
//!
//! The `SerialLineCodec` frames both directions of the link:
//! - [`Decoder`]: splits the inbound byte stream into text lines
//! - [`Encoder<DeviceCommand>`]: writes outbound opcode frames
//!
//! Lines are returned raw (terminator stripped) rather than parsed, so that
//! a malformed line never turns into a stream error. The caller tokenizes
//! each line with [`DeviceEvent::parse`](crate::DeviceEvent::parse) and
//! decides what to do with failures.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use portico_protocol::{DeviceEvent, SerialLineCodec};
//! use tokio_util::codec::FramedRead;
//!
//! # async fn example<R: tokio::io::AsyncRead + Unpin>(port: R) -> std::io::Result<()> {
//! let mut lines = FramedRead::new(port, SerialLineCodec::new());
//! while let Some(line) = lines.next().await {
//!     match DeviceEvent::parse(&line?) {
//!         Ok(event) => println!("{event:?}"),
//!         Err(e) => eprintln!("discarded: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Overlong lines
//!
//! A line longer than `max_line_length` is dropped in full: the buffered
//! bytes are discarded and everything up to the next newline is skipped.
//! Decoding then resumes normally.

use crate::command::DeviceCommand;
use bytes::{BufMut, BytesMut};
use portico_core::constants::MAX_SERIAL_LINE_LENGTH;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// Codec for newline-delimited inbound lines and opcode outbound frames.
#[derive(Debug, Clone)]
pub struct SerialLineCodec {
    /// Maximum inbound line length in bytes.
    max_line_length: usize,

    /// Offset up to which the buffer is known to contain no newline.
    next_index: usize,

    /// Skipping the remainder of an overlong line.
    discarding: bool,
}

impl SerialLineCodec {
    /// Create a codec with the default line limit.
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_SERIAL_LINE_LENGTH)
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            next_index: 0,
            discarding: false,
        }
    }

    /// Configured line limit.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn line_from_bytes(bytes: &[u8]) -> String {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        String::from_utf8_lossy(bytes).into_owned()
    }
}

impl Default for SerialLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SerialLineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            match newline {
                Some(pos) => {
                    let frame = src.split_to(pos + 1);
                    self.next_index = 0;

                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }

                    let line = Self::line_from_bytes(&frame[..pos]);
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Ok(Some(line));
                }
                None => {
                    if src.len() > self.max_line_length {
                        if !self.discarding {
                            warn!(
                                buffered = src.len(),
                                max = self.max_line_length,
                                "serial line too long, discarding"
                            );
                        }
                        self.discarding = true;
                        src.clear();
                        self.next_index = 0;
                    } else {
                        self.next_index = src.len();
                    }
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        self.next_index = 0;
        if src.is_empty() || self.discarding {
            src.clear();
            self.discarding = false;
            return Ok(None);
        }

        let frame = src.split_to(src.len());
        let line = Self::line_from_bytes(&frame);
        Ok((!line.trim().is_empty()).then_some(line))
    }
}

impl Encoder<DeviceCommand> for SerialLineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: DeviceCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if !item.is_encodable() {
            let id = item.identification().as_str();
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("identification not representable on the wire: {id:?}"),
            ));
        }
        dst.reserve(item.encoded_len());
        dst.put_u8(item.opcode());
        dst.put_slice(item.identification().as_str().as_bytes());
        Ok(())
    }
}
