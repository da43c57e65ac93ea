//! Default tuning values for the access-event pipeline.
//!
//! Every value here is a default only: the service configuration can
//! override each of them. They live in one place so the CLI, the service
//! and the tests agree on what "default" means.
//!
//! # Usage
//!
//! ```
//! use portico_core::constants::*;
//! use std::time::Duration;
//!
//! let cooldown = Duration::from_secs(DEFAULT_DEBOUNCE_COOLDOWN_SECS);
//! assert_eq!(cooldown.as_secs(), 5);
//! assert_eq!(DEFAULT_ALARM_THRESHOLD, 3);
//! ```

// ============================================================================
// Identification
// ============================================================================

/// Width card reads are zero-padded to.
///
/// Card UIDs are rendered in decimal and left-padded with zeros so that a
/// read always produces the same fixed-width key as the enrolled badge.
///
/// # Examples
///
/// ```
/// use portico_core::constants::IDENTIFICATION_WIDTH;
///
/// assert_eq!(format!("{:0>width$}", "1234", width = IDENTIFICATION_WIDTH), "00001234");
/// ```
pub const IDENTIFICATION_WIDTH: usize = 8;

// ============================================================================
// Debounce
// ============================================================================

/// Cooldown before the same identification is accepted again (seconds).
pub const DEFAULT_DEBOUNCE_COOLDOWN_SECS: u64 = 5;

// ============================================================================
// Alarm escalation
// ============================================================================

/// Number of prior denials in the trailing window that triggers the alarm.
pub const DEFAULT_ALARM_THRESHOLD: u32 = 3;

/// Trailing window for denial counting (minutes).
pub const DEFAULT_ALARM_WINDOW_MINUTES: u32 = 1;

/// How long the alarm output stays high once triggered (seconds).
pub const DEFAULT_ALARM_DURATION_SECS: u64 = 5;

// ============================================================================
// Hardware channels
// ============================================================================

/// Internal timeout of a single card reader poll (milliseconds).
pub const DEFAULT_CARD_POLL_TIMEOUT_MS: u64 = 1000;

/// Serial device the microcontroller is attached to.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyAMA0";

/// Serial baud rate (8N1).
pub const DEFAULT_SERIAL_BAUD: u32 = 9600;

/// Delay between enroll commands during a bulk sync (milliseconds).
pub const DEFAULT_SYNC_PACING_MS: u64 = 1000;

/// Maximum inbound serial line length before the line is discarded.
pub const MAX_SERIAL_LINE_LENGTH: usize = 256;

// ============================================================================
// Workers
// ============================================================================

/// Number of concurrent access-processing workers.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Pending read events buffered before new reads are dropped.
pub const DEFAULT_WORKER_QUEUE_CAPACITY: usize = 64;

// ============================================================================
// Queries
// ============================================================================

/// Number of events returned by "latest events" when no limit is given.
pub const DEFAULT_RECENT_EVENTS_LIMIT: i64 = 50;

// ============================================================================
// Messages
// ============================================================================

/// Message returned for a granted access.
pub const MSG_ACCESS_GRANTED: &str = "Access granted";

/// Message returned for a denied access.
pub const MSG_ACCESS_DENIED: &str = "Access denied: identification not enrolled";
