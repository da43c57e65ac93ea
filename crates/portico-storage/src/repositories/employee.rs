#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::Employee;
use portico_core::Identification;
use sqlx::SqlitePool;

/// Repository trait for Employee entity operations
pub trait EmployeeRepository: Send + Sync {
    /// Insert a new employee; fails with `DuplicateIdentity` if already enrolled
    async fn insert(&self, employee: &Employee) -> StorageResult<()>;

    /// Find an employee by identification
    async fn find(&self, identification: &Identification) -> StorageResult<Option<Employee>>;

    /// All employees ordered by name
    async fn list(&self) -> StorageResult<Vec<Employee>>;

    /// Rename an existing employee; fails with `NotFound` if not enrolled
    async fn update(&self, employee: &Employee) -> StorageResult<()>;

    /// Remove an employee; fails with `NotFound` if not enrolled
    async fn remove(&self, identification: &Identification) -> StorageResult<()>;

    /// Number of enrolled employees
    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of EmployeeRepository
#[derive(Debug, Clone)]
pub struct SqliteEmployeeRepository {
    pool: SqlitePool,
}

impl SqliteEmployeeRepository {
    /// Create a new SQLite employee repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EmployeeRepository for SqliteEmployeeRepository {
    async fn insert(&self, employee: &Employee) -> StorageResult<()> {
        sqlx::query("INSERT INTO employees (identification, name) VALUES (?, ?)")
            .bind(employee.identification.as_str())
            .bind(&employee.name)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::from_insert(e, employee.identification.as_str()))?;

        Ok(())
    }

    async fn find(&self, identification: &Identification) -> StorageResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT identification, name FROM employees WHERE identification = ?",
        )
        .bind(identification.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn list(&self) -> StorageResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT identification, name FROM employees ORDER BY name, identification",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    async fn update(&self, employee: &Employee) -> StorageResult<()> {
        let result = sqlx::query("UPDATE employees SET name = ? WHERE identification = ?")
            .bind(&employee.name)
            .bind(employee.identification.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::employee_not_found(
                employee.identification.as_str(),
            ));
        }

        Ok(())
    }

    async fn remove(&self, identification: &Identification) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE identification = ?")
            .bind(identification.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::employee_not_found(identification.as_str()));
        }

        Ok(())
    }

    async fn count(&self) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
