use portico_core::Identification;
use serde::{Deserialize, Serialize};

/// Enrolled employee.
///
/// Maps to the `employees` table. The identification is the primary key,
/// so at most one employee exists per identification.
///
/// # Examples
///
/// ```
/// use portico_core::Identification;
/// use portico_storage::models::Employee;
///
/// let employee = Employee::new(Identification::new("12345678").unwrap(), "Ana Pérez");
/// assert_eq!(employee.name, "Ana Pérez");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    /// Identification key (primary key)
    #[sqlx(try_from = "String")]
    pub identification: Identification,

    /// Display name
    pub name: String,
}

impl Employee {
    /// Create a new employee record.
    pub fn new(identification: Identification, name: impl Into<String>) -> Self {
        Self {
            identification,
            name: name.into(),
        }
    }
}
