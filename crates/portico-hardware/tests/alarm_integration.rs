//! Integration tests for the alarm actuator over each output driver.
//!
//! Run with: cargo test --package portico-hardware --test alarm_integration

use portico_hardware::mock::MockOutput;
use portico_hardware::sysfs::SysfsOutput;
use portico_hardware::{AlarmActuator, AnyOutput, DigitalOutput, Level};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_cancelled_activation_drives_low() {
    let (output, handle) = MockOutput::new();
    let alarm = Arc::new(AlarmActuator::new(output));

    let task = {
        let alarm = Arc::clone(&alarm);
        tokio::spawn(async move { alarm.activate(Duration::from_secs(60)).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.level(), Level::High);

    task.abort();
    let _ = task.await;

    assert_eq!(handle.level(), Level::Low);
    assert!(!alarm.is_active());
}

#[tokio::test]
async fn test_timeout_around_activation_drives_low() {
    let (output, handle) = MockOutput::new();
    let alarm = AlarmActuator::new(output);

    let result =
        tokio::time::timeout(Duration::from_millis(20), alarm.activate(Duration::from_secs(60)))
            .await;

    assert!(result.is_err());
    assert_eq!(handle.transitions(), vec![Level::High, Level::Low]);
}

#[tokio::test]
async fn test_overlapping_activations_end_low() {
    let (output, handle) = MockOutput::new();
    let alarm = AlarmActuator::new(output);

    let (first, second) = tokio::join!(
        alarm.activate(Duration::from_millis(20)),
        alarm.activate(Duration::from_millis(40)),
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(handle.level(), Level::Low);
    assert_eq!(handle.transitions().last(), Some(&Level::Low));
}

#[tokio::test]
async fn test_sysfs_alarm_leaves_value_file_low() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("value");

    let output = AnyOutput::Sysfs(SysfsOutput::new(&path).unwrap());
    let alarm = AlarmActuator::new(output);

    alarm.activate(Duration::from_millis(5)).await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "0");
    assert!(!alarm.is_active());
}

#[test]
fn test_any_output_reports_last_level() {
    let (output, _handle) = MockOutput::new();
    let mut output = AnyOutput::Mock(output);
    assert_eq!(output.level(), Level::Low);
    output.set_level(Level::High).unwrap();
    assert!(output.level().is_high());
}
