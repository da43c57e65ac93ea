#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::event::now_local;
use crate::models::{AccessEvent, EventStatistics, EventWithEmployee, NewAccessEvent, TIMESTAMP_FORMAT};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use portico_core::{Channel, Identification};
use sqlx::SqlitePool;

/// Repository trait for the append-only access event log
///
/// There is no update or delete: events are immutable once recorded.
pub trait AccessEventRepository: Send + Sync {
    /// Append an event stamped with the current local time
    async fn record(&self, event: &NewAccessEvent) -> StorageResult<AccessEvent>;

    /// Append an event with an explicit timestamp (truncated to seconds)
    async fn record_at(
        &self,
        event: &NewAccessEvent,
        timestamp: NaiveDateTime,
    ) -> StorageResult<AccessEvent>;

    /// Most recent `limit` events, newest first, with employee names
    async fn latest(&self, limit: i64) -> StorageResult<Vec<EventWithEmployee>>;

    /// Events between two calendar dates, both inclusive, newest first
    async fn find_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StorageResult<Vec<EventWithEmployee>>;

    /// Aggregate counts over the event log and the employee table
    async fn statistics(&self) -> StorageResult<EventStatistics>;

    /// Denials for `identification` at or after `since`
    ///
    /// Alarm audit events are not counted.
    async fn count_denials_since(
        &self,
        identification: &Identification,
        since: NaiveDateTime,
    ) -> StorageResult<i64>;

    /// Denials for `identification` in the trailing `window_minutes`
    async fn count_recent_denials(
        &self,
        identification: &Identification,
        window_minutes: u32,
    ) -> StorageResult<i64> {
        let since = now_local() - Duration::minutes(i64::from(window_minutes));
        self.count_denials_since(identification, since).await
    }
}

/// SQLite implementation of AccessEventRepository
#[derive(Debug, Clone)]
pub struct SqliteAccessEventRepository {
    pool: SqlitePool,
}

impl SqliteAccessEventRepository {
    /// Create a new SQLite access event repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SELECT_WITH_EMPLOYEE: &str = r#"
    SELECT ev.id, ev.identification, ev.timestamp, ev.authorized,
           ev.channel, ev.operation, emp.name AS employee_name
    FROM events ev
    LEFT JOIN employees emp ON emp.identification = ev.identification
"#;

impl AccessEventRepository for SqliteAccessEventRepository {
    async fn record(&self, event: &NewAccessEvent) -> StorageResult<AccessEvent> {
        self.record_at(event, now_local()).await
    }

    async fn record_at(
        &self,
        event: &NewAccessEvent,
        timestamp: NaiveDateTime,
    ) -> StorageResult<AccessEvent> {
        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();

        let stored = sqlx::query_as::<_, AccessEvent>(
            r#"
            INSERT INTO events (identification, timestamp, authorized, channel, operation)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, identification, timestamp, authorized, channel, operation
            "#,
        )
        .bind(event.identification.as_str())
        .bind(&stamp)
        .bind(event.authorized)
        .bind(event.channel.as_str())
        .bind(event.operation.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn latest(&self, limit: i64) -> StorageResult<Vec<EventWithEmployee>> {
        let events = sqlx::query_as::<_, EventWithEmployee>(&format!(
            "{SELECT_WITH_EMPLOYEE} ORDER BY ev.id DESC LIMIT ?"
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn find_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StorageResult<Vec<EventWithEmployee>> {
        let start = format!("{} 00:00:00", from.format("%Y-%m-%d"));
        let end = format!("{} 23:59:59", to.format("%Y-%m-%d"));

        let events = sqlx::query_as::<_, EventWithEmployee>(&format!(
            "{SELECT_WITH_EMPLOYEE} WHERE ev.timestamp BETWEEN ? AND ? \
             ORDER BY ev.timestamp DESC, ev.id DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn statistics(&self) -> StorageResult<EventStatistics> {
        let (total_events, authorized_events, total_employees): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM events),
                    (SELECT COUNT(*) FROM events WHERE authorized = 1),
                    (SELECT COUNT(*) FROM employees)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let by_channel: Vec<(String, i64)> =
            sqlx::query_as("SELECT channel, COUNT(*) FROM events GROUP BY channel")
                .fetch_all(&self.pool)
                .await?;

        Ok(EventStatistics {
            total_events,
            authorized_events,
            denied_events: total_events - authorized_events,
            events_by_channel: by_channel.into_iter().collect(),
            total_employees,
        })
    }

    async fn count_denials_since(
        &self,
        identification: &Identification,
        since: NaiveDateTime,
    ) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM events
            WHERE identification = ?
              AND authorized = 0
              AND channel != ?
              AND timestamp >= ?
            "#,
        )
        .bind(identification.as_str())
        .bind(Channel::Alarm.as_str())
        .bind(since.format(TIMESTAMP_FORMAT).to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
