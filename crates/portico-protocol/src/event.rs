//! Inbound event lines reported by the microcontroller.

use crate::error::ParseError;
use portico_core::{Identification, Operation};

/// Separator between fields of an inbound line.
pub const FIELD_SEPARATOR: &str = ", ";

/// Separator between key and value inside a field.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Keys of an inbound line, in their fixed order.
pub const FIELD_KEYS: [&str; 4] = ["tiempo", "cedula", "autorizado", "operacion"];

/// One event reported by the microcontroller.
///
/// Produced by [`DeviceEvent::parse`] from a line such as:
///
/// ```text
/// tiempo=0001, cedula=12345678, autorizado=Si, operacion=Alta
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    /// Device-side time token. Opaque, kept for logging only.
    pub token: String,

    /// Identification the device read or was asked to manage.
    pub identification: Identification,

    /// Whether the device considered the identification authorized.
    pub authorized: bool,

    /// Operation the device performed.
    pub operation: Operation,
}

impl DeviceEvent {
    /// Tokenize a single inbound line.
    ///
    /// Trailing `\r`/`\n` are ignored. The line must contain exactly four
    /// `key=value` fields separated by `", "`, with keys in the order
    /// `tiempo`, `cedula`, `autorizado`, `operacion`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first violation found. A
    /// line with any other field count is always rejected with
    /// [`ParseError::FieldCount`].
    ///
    /// # Examples
    ///
    /// ```
    /// use portico_protocol::{DeviceEvent, ParseError};
    ///
    /// let err = DeviceEvent::parse("tiempo=0001, cedula=12345678").unwrap_err();
    /// assert_eq!(err, ParseError::FieldCount { expected: 4, found: 2 });
    /// ```
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_KEYS.len() {
            return Err(ParseError::FieldCount {
                expected: FIELD_KEYS.len(),
                found: fields.len(),
            });
        }

        let mut values = [""; 4];
        for (position, (field, expected)) in fields.iter().zip(FIELD_KEYS).enumerate() {
            let (key, value) = field.split_once(KEY_VALUE_SEPARATOR).ok_or_else(|| {
                ParseError::MalformedField {
                    position,
                    field: field.to_string(),
                }
            })?;

            if key.trim() != expected {
                return Err(ParseError::UnexpectedKey {
                    position,
                    expected,
                    found: key.to_string(),
                });
            }

            values[position] = value.trim();
        }

        let [token, cedula, autorizado, operacion] = values;

        let identification =
            Identification::new(cedula).map_err(|_| ParseError::InvalidValue {
                key: "cedula",
                value: cedula.to_string(),
            })?;

        let authorized = match autorizado {
            "Si" => true,
            "No" => false,
            other => {
                return Err(ParseError::InvalidValue {
                    key: "autorizado",
                    value: other.to_string(),
                });
            }
        };

        // The device only ever reports these three; Modificación is host-side.
        let operation = match operacion {
            "Access" => Operation::Access,
            "Alta" => Operation::Alta,
            "Baja" => Operation::Baja,
            other => {
                return Err(ParseError::InvalidValue {
                    key: "operacion",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            token: token.to_string(),
            identification,
            authorized,
            operation,
        })
    }

    /// Render the event back into its wire line, without terminator.
    pub fn to_line(&self) -> String {
        format!(
            "tiempo={}, cedula={}, autorizado={}, operacion={}",
            self.token,
            self.identification,
            if self.authorized { "Si" } else { "No" },
            self.operation
        )
    }
}

impl std::str::FromStr for DeviceEvent {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceEvent::parse(s)
    }
}
