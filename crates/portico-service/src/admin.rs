//! Administrative employee operations, mirrored to the microcontroller.
//!
//! Adding or removing an employee is a store operation first. Only when the
//! store accepts it is the matching command sent over the serial link, and a
//! failed send never undoes the store change: the outcome message says
//! whether the device was updated.

use crate::error::{ServiceError, ServiceResult};
use crate::serial_channel::SerialChannel;
use portico_core::Identification;
use portico_storage::{Employee, EmployeeRepository, SqliteEmployeeRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SYNCED_SUFFIX: &str = ", synchronized with device";
const SYNC_FAILED_SUFFIX: &str = ", device sync failed";

/// Result of an administrative operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOutcome {
    pub message: String,
    /// `None` when the operation is not mirrored to the device.
    pub device_synced: Option<bool>,
}

impl AdminOutcome {
    fn local(message: &str) -> Self {
        Self {
            message: message.to_string(),
            device_synced: None,
        }
    }

    fn mirrored(message: &str, synced: bool) -> Self {
        let suffix = if synced {
            SYNCED_SUFFIX
        } else {
            SYNC_FAILED_SUFFIX
        };
        Self {
            message: format!("{message}{suffix}"),
            device_synced: Some(synced),
        }
    }
}

/// Counts from a bulk sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub sent: usize,
    pub failed: usize,
    /// Employees whose identification the device cannot store
    pub skipped: usize,
}

/// Employee administration with serial mirroring.
#[derive(Debug, Clone)]
pub struct EmployeeAdmin {
    employees: SqliteEmployeeRepository,
    serial: Arc<SerialChannel>,
    sync_pacing: Duration,
    sync_identification_length: usize,
}

impl EmployeeAdmin {
    pub fn new(
        employees: SqliteEmployeeRepository,
        serial: Arc<SerialChannel>,
        sync_pacing: Duration,
        sync_identification_length: usize,
    ) -> Self {
        Self {
            employees,
            serial,
            sync_pacing,
            sync_identification_length,
        }
    }

    /// Enroll an employee and send `A<id>` to the device.
    ///
    /// # Errors
    ///
    /// [`ServiceError::EmptyName`] for a blank name;
    /// `StorageError::DuplicateIdentity` if already enrolled.
    pub async fn add_employee(
        &self,
        identification: Identification,
        name: &str,
    ) -> ServiceResult<AdminOutcome> {
        let name = non_empty(name)?;
        self.employees
            .insert(&Employee::new(identification.clone(), name))
            .await?;
        info!(identification = %identification, "employee added");

        let synced = mirrored(self.serial.enroll(&identification).await, &identification);
        Ok(AdminOutcome::mirrored("Employee added", synced))
    }

    /// Rename an employee. Nothing is sent to the device.
    ///
    /// # Errors
    ///
    /// [`ServiceError::EmptyName`] for a blank name;
    /// `StorageError::NotFound` if not enrolled.
    pub async fn update_employee(
        &self,
        identification: Identification,
        name: &str,
    ) -> ServiceResult<AdminOutcome> {
        let name = non_empty(name)?;
        self.employees
            .update(&Employee::new(identification.clone(), name))
            .await?;
        info!(identification = %identification, "employee updated");

        Ok(AdminOutcome::local("Employee updated"))
    }

    /// Remove an employee and send `B<id>` to the device.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if not enrolled.
    pub async fn remove_employee(
        &self,
        identification: &Identification,
    ) -> ServiceResult<AdminOutcome> {
        self.employees.remove(identification).await?;
        info!(identification = %identification, "employee removed");

        let synced = mirrored(self.serial.revoke(identification).await, identification);
        Ok(AdminOutcome::mirrored("Employee removed", synced))
    }

    pub async fn list_employees(&self) -> ServiceResult<Vec<Employee>> {
        Ok(self.employees.list().await?)
    }

    /// Send `A<id>` for every employee the device can store, pausing
    /// between sends.
    pub async fn sync_employees(&self) -> ServiceResult<SyncReport> {
        let employees = self.employees.list().await?;
        let mut report = SyncReport::default();

        for employee in employees {
            let id = &employee.identification;
            if !id.is_numeric_of_length(self.sync_identification_length) {
                report.skipped += 1;
                continue;
            }

            if !self.serial.is_connected() {
                report.failed += 1;
                continue;
            }

            match self.serial.enroll(id).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!(identification = %id, error = %e, "sync send failed");
                    report.failed += 1;
                }
            }
            tokio::time::sleep(self.sync_pacing).await;
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "employee sync finished"
        );
        Ok(report)
    }
}

fn mirrored(sent: ServiceResult<()>, identification: &Identification) -> bool {
    match sent {
        Ok(()) => true,
        Err(e) => {
            warn!(identification = %identification, error = %e, "device mirror failed");
            false
        }
    }
}

fn non_empty(name: &str) -> ServiceResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::EmptyName);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_storage::{Database, StorageError};
    use tokio::io::{AsyncReadExt, DuplexStream};

    fn id(value: &str) -> Identification {
        Identification::new(value).unwrap()
    }

    async fn connected() -> (Database, EmployeeAdmin, DuplexStream) {
        let db = Database::in_memory().await.unwrap();
        let (local, remote) = tokio::io::duplex(256);
        let serial = Arc::new(SerialChannel::from_stream("duplex", local));
        let admin = EmployeeAdmin::new(
            SqliteEmployeeRepository::new(db.pool().clone()),
            serial,
            Duration::ZERO,
            8,
        );
        (db, admin, remote)
    }

    async fn degraded() -> (Database, EmployeeAdmin) {
        let db = Database::in_memory().await.unwrap();
        let admin = EmployeeAdmin::new(
            SqliteEmployeeRepository::new(db.pool().clone()),
            Arc::new(SerialChannel::degraded("/dev/ttyAMA0")),
            Duration::ZERO,
            8,
        );
        (db, admin)
    }

    #[tokio::test]
    async fn test_add_sends_enroll() {
        let (_db, admin, mut remote) = connected().await;

        let outcome = admin.add_employee(id("12345678"), " Ana ").await.unwrap();
        assert_eq!(outcome.message, "Employee added, synchronized with device");
        assert_eq!(outcome.device_synced, Some(true));

        let mut buf = [0u8; 9];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"A12345678");

        let employees = admin.list_employees().await.unwrap();
        assert_eq!(employees[0].name, "Ana");
    }

    #[tokio::test]
    async fn test_add_with_degraded_link_still_enrolls() {
        let (_db, admin) = degraded().await;

        let outcome = admin.add_employee(id("12345678"), "Ana").await.unwrap();
        assert_eq!(outcome.message, "Employee added, device sync failed");
        assert_eq!(outcome.device_synced, Some(false));
        assert_eq!(admin.list_employees().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_non_ascii_identification_is_stored_but_not_mirrored() {
        let (_db, admin, _remote) = connected().await;

        let outcome = admin.add_employee(id("José"), "José").await.unwrap();
        assert_eq!(outcome.device_synced, Some(false));

        let employees = admin.list_employees().await.unwrap();
        assert_eq!(employees[0].identification.as_str(), "José");
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected_without_command() {
        let (_db, admin) = degraded().await;
        admin.add_employee(id("1"), "Ana").await.unwrap();

        let err = admin.add_employee(id("1"), "Otra").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Storage(StorageError::DuplicateIdentity { .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (_db, admin) = degraded().await;
        assert!(matches!(
            admin.add_employee(id("1"), "   ").await.unwrap_err(),
            ServiceError::EmptyName
        ));
    }

    #[tokio::test]
    async fn test_update_is_local_only() {
        let (_db, admin) = degraded().await;
        admin.add_employee(id("1"), "Ana").await.unwrap();

        let outcome = admin.update_employee(id("1"), "Ana María").await.unwrap();
        assert_eq!(outcome.message, "Employee updated");
        assert_eq!(outcome.device_synced, None);
        assert_eq!(admin.list_employees().await.unwrap()[0].name, "Ana María");

        assert!(matches!(
            admin.update_employee(id("2"), "Nadie").await.unwrap_err(),
            ServiceError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_sends_revoke() {
        let (_db, admin, mut remote) = connected().await;
        admin.add_employee(id("55787807"), "Luis").await.unwrap();

        let outcome = admin.remove_employee(&id("55787807")).await.unwrap();
        assert_eq!(outcome.message, "Employee removed, synchronized with device");

        let mut buf = [0u8; 18];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"A55787807B55787807");

        assert!(matches!(
            admin.remove_employee(&id("55787807")).await.unwrap_err(),
            ServiceError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_sync_skips_non_numeric() {
        let (db, admin, mut remote) = connected().await;
        let repo = SqliteEmployeeRepository::new(db.pool().clone());
        let enrolled = [
            ("11111111", "Ana"),
            ("EMP-001", "Bea"),
            ("1234", "Carla"),
            ("22222222", "Dora"),
        ];
        for (value, name) in enrolled {
            repo.insert(&Employee::new(id(value), name)).await.unwrap();
        }

        let report = admin.sync_employees().await.unwrap();
        assert_eq!(
            report,
            SyncReport {
                sent: 2,
                failed: 0,
                skipped: 2
            }
        );

        let mut buf = [0u8; 18];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"A11111111A22222222");
    }

    #[tokio::test]
    async fn test_sync_with_degraded_link_counts_failures() {
        let (db, admin) = degraded().await;
        SqliteEmployeeRepository::new(db.pool().clone())
            .insert(&Employee::new(id("11111111"), "Ana"))
            .await
            .unwrap();

        let report = admin.sync_employees().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 0);
    }
}
