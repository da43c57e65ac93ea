use crate::{
    Result,
    constants::IDENTIFICATION_WIDTH,
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identification key of a person or badge.
///
/// This is a bare string key, not a credential. It may or may not match an
/// enrolled employee; the access processor decides that on every read.
///
/// The value is trimmed on construction and must not be empty. Anything
/// else is accepted: a read of an unknown key is still a read, and gets
/// recorded and denied like any other. Limits that only matter on the serial
/// link are checked there, see [`is_wire_safe`](Self::is_wire_safe).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identification(String);

impl Identification {
    /// Create a new identification with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentification` if the value is empty or only
    /// whitespace.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(Error::InvalidIdentification(
                "identification cannot be empty".to_string(),
            ));
        }

        Ok(Identification(value.to_string()))
    }

    /// Build an identification from a numeric reading, left-padded with
    /// zeros to [`IDENTIFICATION_WIDTH`].
    ///
    /// # Examples
    ///
    /// ```
    /// use portico_core::Identification;
    ///
    /// let id = Identification::zero_padded("1234").unwrap();
    /// assert_eq!(id.as_str(), "00001234");
    /// ```
    pub fn zero_padded(value: impl AsRef<str>) -> Result<Self> {
        Self::new(format!(
            "{:0>width$}",
            value.as_ref().trim(),
            width = IDENTIFICATION_WIDTH
        ))
    }

    /// Get the identification as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identification is exactly `len` ASCII digits.
    ///
    /// Only identifications of this shape can be mirrored to the
    /// microcontroller, which stores fixed-width numeric keys.
    #[must_use]
    pub fn is_numeric_of_length(&self, len: usize) -> bool {
        self.0.len() == len && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// True when the identification can be embedded in the serial grammar:
    /// printable ASCII without whitespace or commas.
    #[must_use]
    pub fn is_wire_safe(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_graphic() && b != b',')
    }

    /// Consume the identification, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Identification {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identification::new(s)
    }
}

impl TryFrom<String> for Identification {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Identification::new(value)
    }
}

impl From<Identification> for String {
    fn from(id: Identification) -> String {
        id.0
    }
}

/// Origin of an access read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Contactless card reader.
    Card,
    /// Serial-linked microcontroller.
    Serial,
    /// Programmatic API caller.
    Api,
    /// Barcode scanner.
    Barcode,
    /// Alarm trigger audit record.
    Alarm,
}

impl Channel {
    /// Stored tag of the channel.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Card => "card",
            Channel::Serial => "serial",
            Channel::Api => "api",
            Channel::Barcode => "barcode",
            Channel::Alarm => "alarm",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "rfid" => Ok(Channel::Card),
            "serial" => Ok(Channel::Serial),
            "api" => Ok(Channel::Api),
            "barcode" => Ok(Channel::Barcode),
            "alarm" => Ok(Channel::Alarm),
            _ => Err(Error::UnknownChannel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Operation recorded with an access event.
///
/// `Alta` and `Baja` are enroll and revoke requests reported by the
/// microcontroller; `Modificacion` is recorded by administrative updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Plain access attempt.
    Access,
    /// Enroll request.
    Alta,
    /// Revoke request.
    Baja,
    /// Administrative modification.
    #[serde(rename = "Modificación")]
    Modificacion,
}

impl Operation {
    /// Stored tag of the operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Access => "Access",
            Operation::Alta => "Alta",
            Operation::Baja => "Baja",
            Operation::Modificacion => "Modificación",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Access" => Ok(Operation::Access),
            "Alta" => Ok(Operation::Alta),
            "Baja" => Ok(Operation::Baja),
            "Modificación" | "Modificacion" => Ok(Operation::Modificacion),
            _ => Err(Error::UnknownOperation(s.to_string())),
        }
    }
}

impl TryFrom<String> for Operation {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A read produced by a channel, consumed once by the access processor.
///
/// Never persisted as such; the processor turns it into an access event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReadEvent {
    pub identification: Identification,
    pub channel: Channel,
    pub operation: Option<Operation>,
}

impl ChannelReadEvent {
    /// Create a plain access read.
    pub fn new(identification: Identification, channel: Channel) -> Self {
        Self {
            identification,
            channel,
            operation: None,
        }
    }

    /// Attach an explicit operation to the read.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Operation to record, defaulting to [`Operation::Access`].
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation.unwrap_or(Operation::Access)
    }
}
