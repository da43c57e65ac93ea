use chrono::{Local, NaiveDateTime, SubsecRound};
use portico_core::{Channel, Identification, Operation};
use serde::{Deserialize, Serialize};

/// Text format of the `events.timestamp` column.
///
/// Local time at second precision, so lexical order is chronological order
/// and date-range bounds can be compared as strings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persisted access event.
///
/// Rows in the `events` table are immutable once written. `id` reflects
/// insertion order, which across channels is not necessarily the order the
/// reads happened in.
///
/// `identification` is joined to `employees` only logically: a denied read
/// of an unknown badge is stored like any other event, and removing an
/// employee keeps their history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessEvent {
    /// Auto-increment sequence id
    pub id: i64,

    /// Identification that was read
    #[sqlx(try_from = "String")]
    pub identification: Identification,

    /// Local time of the event, second precision
    pub timestamp: NaiveDateTime,

    /// Whether access was granted
    pub authorized: bool,

    /// Channel the read came from
    #[sqlx(try_from = "String")]
    pub channel: Channel,

    /// Operation recorded with the event
    #[sqlx(try_from = "String")]
    pub operation: Operation,
}

impl AccessEvent {
    /// Timestamp rendered in the stored format.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Event to be appended to the log.
///
/// The timestamp is assigned by the store at insertion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessEvent {
    pub identification: Identification,
    pub authorized: bool,
    pub channel: Channel,
    pub operation: Operation,
}

impl NewAccessEvent {
    /// Create a new event.
    ///
    /// # Examples
    ///
    /// ```
    /// use portico_core::{Channel, Identification, Operation};
    /// use portico_storage::models::NewAccessEvent;
    ///
    /// let event = NewAccessEvent::new(
    ///     Identification::new("99999999").unwrap(),
    ///     false,
    ///     Channel::Card,
    ///     Operation::Access,
    /// );
    /// assert!(!event.authorized);
    /// ```
    pub fn new(
        identification: Identification,
        authorized: bool,
        channel: Channel,
        operation: Operation,
    ) -> Self {
        Self {
            identification,
            authorized,
            channel,
            operation,
        }
    }

    /// Audit record of an alarm trigger for `identification`.
    pub fn alarm(identification: Identification) -> Self {
        Self::new(identification, false, Channel::Alarm, Operation::Access)
    }
}

/// Access event joined with the name of the employee it refers to.
///
/// `employee_name` is `None` when the identification is not (or no longer)
/// enrolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventWithEmployee {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: AccessEvent,

    /// Name of the enrolled employee, if any
    pub employee_name: Option<String>,
}

/// Current local time truncated to whole seconds.
pub(crate) fn now_local() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}
