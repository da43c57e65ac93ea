//! Access decision, persistence and alarm escalation for one read.

use crate::error::ServiceResult;
use portico_core::ChannelReadEvent;
use portico_core::constants::{
    DEFAULT_ALARM_DURATION_SECS, DEFAULT_ALARM_THRESHOLD, DEFAULT_ALARM_WINDOW_MINUTES,
    MSG_ACCESS_DENIED, MSG_ACCESS_GRANTED,
};
use portico_hardware::{AlarmActuator, AnyOutput};
use portico_storage::{
    AccessEventRepository, Database, EmployeeRepository, NewAccessEvent,
    SqliteAccessEventRepository, SqliteEmployeeRepository,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Alarm escalation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Prior denials within the window that make the next denial escalate
    pub alarm_threshold: u32,

    /// Trailing window for counting denials
    pub alarm_window_minutes: u32,

    /// How long the alarm stays on
    pub alarm_duration: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            alarm_threshold: DEFAULT_ALARM_THRESHOLD,
            alarm_window_minutes: DEFAULT_ALARM_WINDOW_MINUTES,
            alarm_duration: Duration::from_secs(DEFAULT_ALARM_DURATION_SECS),
        }
    }
}

impl From<&crate::config::AlarmConfig> for ProcessorConfig {
    fn from(config: &crate::config::AlarmConfig) -> Self {
        Self {
            alarm_threshold: config.threshold,
            alarm_window_minutes: config.window_minutes,
            alarm_duration: config.duration(),
        }
    }
}

/// Outcome of processing one read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub authorized: bool,
    pub employee_name: Option<String>,
    pub message: String,
}

impl AccessDecision {
    fn granted(name: String) -> Self {
        Self {
            authorized: true,
            employee_name: Some(name),
            message: MSG_ACCESS_GRANTED.to_string(),
        }
    }

    fn denied() -> Self {
        Self {
            authorized: false,
            employee_name: None,
            message: MSG_ACCESS_DENIED.to_string(),
        }
    }
}

/// Turns a [`ChannelReadEvent`] into a persisted event and a decision.
///
/// For each read:
///
/// 1. authorized = the identification is an enrolled employee, looked up
///    fresh every time
/// 2. the event is appended to the log
/// 3. after a successfully stored denial, the denials for the same
///    identification in the trailing window are counted; if the ones
///    before this read reach the threshold, an alarm audit event is
///    stored and the alarm is driven for the configured duration
///
/// The alarm runs on the caller's task, so `process` does not return until
/// it has been cleared. Callers on a read loop hand reads to a
/// [`WorkerPool`](crate::worker::WorkerPool) instead of awaiting this.
pub struct AccessEventProcessor {
    employees: SqliteEmployeeRepository,
    events: SqliteAccessEventRepository,
    alarm: Arc<AlarmActuator<AnyOutput>>,
    config: ProcessorConfig,
}

impl AccessEventProcessor {
    pub fn new(
        db: &Database,
        alarm: Arc<AlarmActuator<AnyOutput>>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            employees: SqliteEmployeeRepository::new(db.pool().clone()),
            events: SqliteAccessEventRepository::new(db.pool().clone()),
            alarm,
            config,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn alarm(&self) -> &AlarmActuator<AnyOutput> {
        &self.alarm
    }

    /// Process one read end to end.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the employee lookup or the event write
    /// fails. Nothing is retried, and no alarm is evaluated in that case.
    pub async fn process(&self, read: &ChannelReadEvent) -> ServiceResult<AccessDecision> {
        let employee = self.employees.find(&read.identification).await?;

        let decision = match employee {
            Some(employee) => AccessDecision::granted(employee.name),
            None => AccessDecision::denied(),
        };

        self.events
            .record(&NewAccessEvent::new(
                read.identification.clone(),
                decision.authorized,
                read.channel,
                read.operation(),
            ))
            .await?;

        info!(
            identification = %read.identification,
            channel = %read.channel,
            authorized = decision.authorized,
            "access decision"
        );

        if !decision.authorized {
            self.escalate_if_needed(read).await;
        }

        Ok(decision)
    }

    async fn escalate_if_needed(&self, read: &ChannelReadEvent) {
        let count = match self
            .events
            .count_recent_denials(&read.identification, self.config.alarm_window_minutes)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(identification = %read.identification, error = %e, "denial count failed");
                return;
            }
        };

        // The count includes the denial just written.
        let prior = count.saturating_sub(1);
        if prior < i64::from(self.config.alarm_threshold) {
            return;
        }

        warn!(
            identification = %read.identification,
            prior_denials = prior,
            window_minutes = self.config.alarm_window_minutes,
            "denial threshold reached, raising alarm"
        );

        if let Err(e) = self
            .events
            .record(&NewAccessEvent::alarm(read.identification.clone()))
            .await
        {
            error!(identification = %read.identification, error = %e, "alarm event not recorded");
        }

        if let Err(e) = self.alarm.activate(self.config.alarm_duration).await {
            error!(identification = %read.identification, error = %e, "alarm activation failed");
        }
    }
}
