//! Scenario catalogs for the two screens

use crate::driver::Driver;
use crate::scenario::Scenario;

pub mod schedule;
pub mod students;

pub fn schedule_suite<D: Driver>() -> Vec<Scenario<D>> {
    schedule::suite()
}

pub fn student_suite<D: Driver>() -> Vec<Scenario<D>> {
    students::suite()
}

/// Every scenario, schedule suite first
pub fn all<D: Driver>() -> Vec<Scenario<D>> {
    let mut scenarios = schedule_suite();
    scenarios.extend(student_suite());
    scenarios
}

/// Scenarios whose id or suite name contains `filter` (case-insensitive)
pub fn filtered<D: Driver>(filter: Option<&str>) -> Vec<Scenario<D>> {
    let scenarios = all();
    match filter {
        None => scenarios,
        Some(filter) => {
            let filter = filter.to_lowercase();
            scenarios
                .into_iter()
                .filter(|s| {
                    s.id.to_lowercase().contains(&filter)
                        || s.suite.to_lowercase().contains(&filter)
                })
                .collect()
        }
    }
}
