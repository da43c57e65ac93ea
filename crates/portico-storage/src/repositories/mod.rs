pub mod employee;
pub mod event;

pub use employee::{EmployeeRepository, SqliteEmployeeRepository};
pub use event::{AccessEventRepository, SqliteAccessEventRepository};
