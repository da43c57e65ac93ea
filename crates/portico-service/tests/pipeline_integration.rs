//! End-to-end tests for the Portico service context
//!
//! Each test assembles a full service over an in-memory store, a mock alarm
//! output and either a duplex serial link or a degraded one.

use chrono::Local;
use portico_core::{Channel, Identification, Operation};
use portico_hardware::mock::{MockOutput, MockOutputHandle, MockRfid};
use portico_hardware::{AnyOutput, AnyRfidDevice, Level};
use portico_service::{Portico, SerialChannel, ServiceConfig, ServiceError};
use portico_storage::{Database, Employee, EmployeeRepository, SqliteEmployeeRepository};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::time::timeout;

fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.alarm.duration_secs = 0;
    config.card_reader.poll_timeout_ms = 20;
    config.serial.sync_pacing_ms = 0;
    config
}

async fn portico_with_serial(serial: SerialChannel) -> (Portico, MockOutputHandle) {
    let db = Database::in_memory().await.unwrap();
    let (output, handle) = MockOutput::new();
    let portico = Portico::with_components(test_config(), db, AnyOutput::Mock(output), serial);
    (portico, handle)
}

async fn portico_degraded() -> (Portico, MockOutputHandle) {
    portico_with_serial(SerialChannel::degraded("/dev/ttyAMA0")).await
}

async fn portico_duplex() -> (Portico, MockOutputHandle, DuplexStream) {
    let (local, remote) = tokio::io::duplex(1024);
    let (portico, handle) = portico_with_serial(SerialChannel::from_stream("duplex", local)).await;
    (portico, handle, remote)
}

async fn enroll(portico: &Portico, id: &str, name: &str) {
    SqliteEmployeeRepository::new(portico.database().pool().clone())
        .insert(&Employee::new(Identification::new(id).unwrap(), name))
        .await
        .unwrap();
}

/// Poll the event log until it holds `count` events or a second passes.
async fn wait_for_events(portico: &Portico, count: usize) {
    timeout(Duration::from_secs(1), async {
        loop {
            if portico.latest_events(None).await.unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("events not recorded in time");
}

#[tokio::test]
async fn test_api_event_for_enrolled_employee() {
    let (portico, _alarm) = portico_degraded().await;
    enroll(&portico, "12345678", "Ana").await;

    let decision = portico.process_event("12345678", Channel::Api).await.unwrap();
    assert!(decision.authorized);
    assert_eq!(decision.employee_name.as_deref(), Some("Ana"));

    let events = portico.latest_events(None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].employee_name.as_deref(), Some("Ana"));
    assert_eq!(events[0].event.channel, Channel::Api);
}

#[tokio::test]
async fn test_api_event_rejects_blank_identification() {
    let (portico, _alarm) = portico_degraded().await;

    let err = portico.process_event("   ", Channel::Api).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert!(portico.latest_events(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_accepts_any_non_blank_identification() {
    let (portico, _alarm) = portico_degraded().await;
    let long = "9".repeat(65);

    for id in ["ID 42", "José", "a,b", long.as_str()] {
        let decision = portico.process_event(id, Channel::Api).await.unwrap();
        assert!(!decision.authorized, "{id}");
        assert!(decision.employee_name.is_none());
    }

    let events = portico.latest_events(None).await.unwrap();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| !e.event.authorized));
    assert_eq!(events[3].event.identification.as_str(), "ID 42");
    assert_eq!(events[2].event.identification.as_str(), "José");
}

#[tokio::test]
async fn test_fourth_denial_raises_alarm_once() {
    let (portico, alarm) = portico_degraded().await;

    for _ in 0..3 {
        let decision = portico.process_event("99999999", Channel::Api).await.unwrap();
        assert!(!decision.authorized);
    }
    assert_eq!(alarm.activations(), 0);

    portico.process_event("99999999", Channel::Api).await.unwrap();
    assert_eq!(alarm.activations(), 1);
    assert_eq!(alarm.level(), Level::Low);
    assert!(!portico.status().alarm_active);

    let stats = portico.statistics().await.unwrap();
    assert_eq!(stats.denied_events, 5);
    assert_eq!(stats.events_by_channel.get("alarm"), Some(&1));
    assert_eq!(stats.events_by_channel.get("api"), Some(&4));
}

#[tokio::test]
async fn test_card_reads_flow_through_workers() {
    let (portico, _alarm) = portico_degraded().await;
    enroll(&portico, "00012345", "Ana").await;

    let (reader, feed) = MockRfid::new();
    assert!(portico.start_card_channel(AnyRfidDevice::Mock(reader)));

    feed.present_card(vec![0x00, 0x00, 0x30, 0x39]).await.unwrap();
    // Same card again inside the cooldown: suppressed.
    feed.present_card(vec![0x00, 0x00, 0x30, 0x39]).await.unwrap();
    feed.present_card(vec![0x01, 0x02, 0x03, 0x04]).await.unwrap();

    wait_for_events(&portico, 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let events = portico.latest_events(None).await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.event.channel == Channel::Card));

    let granted = events
        .iter()
        .find(|e| e.event.identification.as_str() == "00012345")
        .unwrap();
    assert!(granted.event.authorized);
    assert!(events.iter().any(|e| e.event.identification.as_str() == "16909060"));
}

#[tokio::test]
async fn test_card_channel_starts_once() {
    let (portico, _alarm) = portico_degraded().await;

    let (first, _feed1) = MockRfid::new();
    let (second, _feed2) = MockRfid::new();
    assert!(portico.start_card_channel(AnyRfidDevice::Mock(first)));
    assert!(!portico.start_card_channel(AnyRfidDevice::Mock(second)));
    assert!(portico.status().card_channel_running);
}

#[tokio::test]
async fn test_disabled_card_channel_does_not_start() {
    let db = Database::in_memory().await.unwrap();
    let (output, _alarm) = MockOutput::new();
    let portico = Portico::with_components(
        test_config().card_reader_enabled(false),
        db,
        AnyOutput::Mock(output),
        SerialChannel::degraded("/dev/ttyAMA0"),
    );

    let (reader, _feed) = MockRfid::new();
    assert!(!portico.start_card_channel(AnyRfidDevice::Mock(reader)));
    assert!(!portico.status().card_channel_running);
}

#[tokio::test]
async fn test_degraded_serial_does_not_start() {
    let (portico, _alarm) = portico_degraded().await;

    assert!(!portico.start_serial_channel());
    let status = portico.status();
    assert!(!status.serial_channel_running);
    assert!(!status.serial_connected);

    // The guard stays set: later calls are no-ops as well.
    assert!(!portico.start_serial_channel());
    assert!(!portico.status().serial_channel_running);

    let outcome = portico
        .admin()
        .add_employee(Identification::new("12345678").unwrap(), "Ana")
        .await
        .unwrap();
    assert_eq!(outcome.device_synced, Some(false));
}

#[tokio::test]
async fn test_serial_lines_are_recorded_and_applied() {
    let (portico, _alarm, mut remote) = portico_duplex().await;
    assert!(portico.start_serial_channel());
    assert!(!portico.start_serial_channel());

    remote
        .write_all(b"tiempo=0001, cedula=12345678, autorizado=Si, operacion=Alta\n")
        .await
        .unwrap();
    remote
        .write_all(b"tiempo=0002, cedula=87654321, autorizado=No, operacion=Alta\n")
        .await
        .unwrap();
    remote.write_all(b"tiempo=0003, cedula=12345678\n").await.unwrap();
    remote
        .write_all(b"tiempo=0004, cedula=12345678, autorizado=Si, operacion=Access\n")
        .await
        .unwrap();

    wait_for_events(&portico, 3).await;

    let events = portico.latest_events(None).await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.event.channel == Channel::Serial));
    assert_eq!(events[0].event.operation, Operation::Access);
    assert_eq!(events[0].employee_name.as_deref(), Some("12345678"));

    let employees = portico.admin().list_employees().await.unwrap();
    assert_eq!(employees.len(), 1);
    assert_eq!(employees[0].identification.as_str(), "12345678");
}

#[tokio::test]
async fn test_events_between_today() {
    let (portico, _alarm) = portico_degraded().await;
    portico.process_event("1", Channel::Barcode).await.unwrap();

    let today = Local::now().date_naive();
    let events = portico.events_between(today, today).await.unwrap();
    assert_eq!(events.len(), 1);

    let yesterday = today.pred_opt().unwrap();
    assert!(portico.events_between(yesterday, yesterday).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_latest_events_limit() {
    let (portico, _alarm) = portico_degraded().await;
    for n in 0..5 {
        portico.process_event(&n.to_string(), Channel::Api).await.unwrap();
    }

    let events = portico.latest_events(Some(2)).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.identification.as_str(), "4");
    assert_eq!(portico.latest_events(None).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_status_serializes() {
    let (portico, _alarm, _remote) = portico_duplex().await;
    let json = serde_json::to_value(portico.status()).unwrap();

    assert_eq!(json["serial_connected"], true);
    assert_eq!(json["card_channel_running"], false);
}

#[tokio::test]
async fn test_shutdown_with_running_channels() {
    let (portico, alarm, _remote) = portico_duplex().await;
    let (reader, _feed) = MockRfid::new();
    portico.start_card_channel(AnyRfidDevice::Mock(reader));
    portico.start_serial_channel();

    timeout(Duration::from_secs(2), portico.shutdown())
        .await
        .expect("shutdown hung");
    assert_eq!(alarm.level(), Level::Low);
}
