//! Event store for the Portico access pipeline.
//!
//! SQLite-backed persistence for enrolled employees and the append-only
//! access event log.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`EmployeeRepository`], [`AccessEventRepository`] - Data access traits
//!   with SQLite implementations
//!
//! The pool is opened in WAL mode with `synchronous = NORMAL`: any number of
//! readers run alongside the single writer SQLite allows, and each write is
//! its own transaction. No external locking is needed around the store.
//!
//! # Examples
//!
//! ```no_run
//! use portico_core::{Channel, Identification, Operation};
//! use portico_storage::{Database, DatabaseConfig};
//! use portico_storage::models::NewAccessEvent;
//! use portico_storage::repositories::{AccessEventRepository, SqliteAccessEventRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("portico.db")).await?;
//! let events = SqliteAccessEventRepository::new(db.pool().clone());
//!
//! let id = Identification::new("99999999")?;
//! events
//!     .record(&NewAccessEvent::new(id.clone(), false, Channel::Card, Operation::Access))
//!     .await?;
//!
//! let recent = events.count_recent_denials(&id, 1).await?;
//! println!("{recent} denials in the last minute");
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Callers distinguish [`StorageError::DuplicateIdentity`] and
//! [`StorageError::NotFound`]; every other variant means the store is
//! unavailable.

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AccessEvent, Employee, EventStatistics, EventWithEmployee, NewAccessEvent};
pub use repositories::{
    AccessEventRepository, EmployeeRepository, SqliteAccessEventRepository,
    SqliteEmployeeRepository,
};
