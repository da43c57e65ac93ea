pub mod employee;
pub mod event;
pub mod statistics;

pub use employee::Employee;
pub use event::{AccessEvent, EventWithEmployee, NewAccessEvent, TIMESTAMP_FORMAT};
pub use statistics::EventStatistics;
