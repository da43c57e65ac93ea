//! Integration tests for the event store
//!
//! These tests validate migrations, concurrent writers against a file-backed
//! database, and the calendar-date range contract.
//!
//! Run with: cargo test --package portico-storage --test integration_database

use chrono::{Duration, NaiveDate, NaiveDateTime};
use portico_core::{Channel, Identification, Operation};
use portico_storage::{
    AccessEventRepository, Database, DatabaseConfig, Employee, EmployeeRepository,
    NewAccessEvent, SqliteAccessEventRepository, SqliteEmployeeRepository, StorageError,
};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::Barrier;

fn id(value: &str) -> Identification {
    Identification::new(value).unwrap()
}

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('employees', 'events')",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 2);

    db.close().await;
}

#[tokio::test]
async fn test_concurrent_writers_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.db");
    let db = Database::new(DatabaseConfig::new(path.to_string_lossy()).max_connections(5))
        .await
        .unwrap();

    const NUM_CONCURRENT_TASKS: usize = 10;
    const EVENTS_PER_TASK: usize = 20;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let mut handles = vec![];

    for i in 0..NUM_CONCURRENT_TASKS {
        let repo = SqliteAccessEventRepository::new(db.pool().clone());
        let barrier = barrier.clone();

        handles.push(tokio::spawn(async move {
            barrier.wait().await;

            let channel = if i % 2 == 0 { Channel::Card } else { Channel::Serial };
            for _ in 0..EVENTS_PER_TASK {
                repo.record(&NewAccessEvent::new(
                    Identification::new(format!("{i:08}")).unwrap(),
                    false,
                    channel,
                    Operation::Access,
                ))
                .await
                .unwrap();
            }
        }));
    }

    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    let repo = SqliteAccessEventRepository::new(db.pool().clone());
    let stats = repo.statistics().await.unwrap();
    assert_eq!(stats.total_events, (NUM_CONCURRENT_TASKS * EVENTS_PER_TASK) as i64);
    assert_eq!(stats.events_by_channel.get("card"), Some(&100));
    assert_eq!(stats.events_by_channel.get("serial"), Some(&100));

    // Sequence ids are unique and dense.
    let (distinct, max_id): (i64, i64) =
        sqlx::query_as("SELECT COUNT(DISTINCT id), MAX(id) FROM events")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(distinct, max_id);

    db.close().await;
}

#[tokio::test]
async fn test_duplicate_enrollment_under_contention() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("employees.db");
    let db = Database::new(DatabaseConfig::new(path.to_string_lossy()))
        .await
        .unwrap();

    let mut handles = vec![];
    for n in 0..8 {
        let repo = SqliteEmployeeRepository::new(db.pool().clone());
        handles.push(tokio::spawn(async move {
            repo.insert(&Employee::new(id("12345678"), format!("Writer {n}")))
                .await
        }));
    }

    let mut inserted = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(()) => inserted += 1,
            Err(StorageError::DuplicateIdentity { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(inserted, 1);
    let repo = SqliteEmployeeRepository::new(db.pool().clone());
    assert_eq!(repo.count().await.unwrap(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_removing_employee_keeps_history() {
    let db = Database::in_memory().await.unwrap();
    let employees = SqliteEmployeeRepository::new(db.pool().clone());
    let events = SqliteAccessEventRepository::new(db.pool().clone());

    employees.insert(&Employee::new(id("1"), "Ana")).await.unwrap();
    events
        .record(&NewAccessEvent::new(id("1"), true, Channel::Card, Operation::Access))
        .await
        .unwrap();
    employees.remove(&id("1")).await.unwrap();

    let latest = events.latest(10).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert!(latest[0].event.authorized);
    assert_eq!(latest[0].employee_name, None);

    db.close().await;
}

fn timestamp_strategy() -> impl Strategy<Value = NaiveDateTime> {
    // Three consecutive days, any second of each.
    (0i64..3 * 86_400).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::seconds(offset)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_single_day_range_matches_calendar_date(
        stamps in prop::collection::vec(timestamp_strategy(), 1..20)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let db = Database::in_memory().await.unwrap();
            let repo = SqliteAccessEventRepository::new(db.pool().clone());
            let event = NewAccessEvent::new(id("1"), false, Channel::Card, Operation::Access);

            for stamp in &stamps {
                repo.record_at(&event, *stamp).await.unwrap();
            }

            let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
            let found = repo.find_by_date_range(day, day).await.unwrap();
            let expected = stamps.iter().filter(|s| s.date() == day).count();

            assert_eq!(found.len(), expected);
            assert!(found.iter().all(|e| e.event.timestamp.date() == day));

            db.close().await;
        });
    }
}
