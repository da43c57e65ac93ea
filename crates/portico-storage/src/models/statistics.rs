use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate counts over the whole event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatistics {
    /// Number of events recorded.
    pub total_events: i64,

    /// Events with `authorized = true`.
    pub authorized_events: i64,

    /// Events with `authorized = false`.
    pub denied_events: i64,

    /// Event count per stored channel tag.
    pub events_by_channel: BTreeMap<String, i64>,

    /// Number of enrolled employees.
    pub total_employees: i64,
}
