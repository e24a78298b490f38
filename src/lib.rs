//! harmony-e2e - page-object workflows, dynamic waits and a data-driven
//! scenario runner for end-to-end testing of the Harmony Hub
//! school-management application.
//!
//! Workflows talk to the page only through the [`driver::Driver`] trait. A
//! Playwright backend is available behind the `playwright` feature, and
//! [`testing::FakeHarmonyHub`] renders the screens in memory so every
//! workflow and scenario runs offline.

pub mod config;
pub mod dates;
pub mod driver;
pub mod error;
pub mod expect;
pub mod fixtures;
pub mod locator;
pub mod pages;
#[cfg(feature = "playwright")]
pub mod playwright;
pub mod scenario;
pub mod scenarios;
pub mod testing;
pub mod wait;

pub use error::{WorkflowError, WorkflowResult};
