//! Outbound commands sent to the microcontroller.

use portico_core::Identification;

/// Opcode of the enroll command.
pub const OPCODE_ENROLL: u8 = b'A';

/// Opcode of the revoke command.
pub const OPCODE_REVOKE: u8 = b'B';

/// Command mirrored to the microcontroller's local badge list.
///
/// Encoded as the opcode byte immediately followed by the identification,
/// with no terminator. The device sends no acknowledgement.
///
/// # Examples
///
/// ```
/// use portico_core::Identification;
/// use portico_protocol::DeviceCommand;
///
/// let id = Identification::new("12345678").unwrap();
/// assert_eq!(DeviceCommand::Enroll(id).to_bytes(), b"A12345678");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Add the identification to the device (`Alta`).
    Enroll(Identification),
    /// Remove the identification from the device (`Baja`).
    Revoke(Identification),
}

impl DeviceCommand {
    /// Opcode byte of the command.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Enroll(_) => OPCODE_ENROLL,
            Self::Revoke(_) => OPCODE_REVOKE,
        }
    }

    /// Identification carried by the command.
    pub fn identification(&self) -> &Identification {
        match self {
            Self::Enroll(id) | Self::Revoke(id) => id,
        }
    }

    /// The device stores printable ASCII keys and parses them back out of a
    /// comma-separated line, so anything else cannot be mirrored.
    pub fn is_encodable(&self) -> bool {
        self.identification().is_wire_safe()
    }

    /// Encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        1 + self.identification().as_str().len()
    }

    /// Encode the command into its wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.push(self.opcode());
        bytes.extend_from_slice(self.identification().as_str().as_bytes());
        bytes
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.opcode() as char, self.identification())
    }
}
