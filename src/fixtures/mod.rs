//! Read-only test data
//!
//! Tables are built once per process on first access and shared by every
//! scenario. Scenarios needing a modified record derive a local copy
//! (`EventFields::apply_to`, the `with_*` builders) instead of mutating.

pub mod schedule;
pub mod students;

pub use schedule::{EventFields, EventRecord, EventUpdate, ScheduleFixtures, schedule};
pub use students::{InvalidStudent, StudentFixtures, StudentRecord, students};
