//! Offline stand-in for the target application
//!
//! [`FakeHarmonyHub`] renders the Schedule and Student Management screens
//! in memory and implements [`Driver`](crate::driver::Driver), so workflows
//! and scenario catalogs run without a browser. [`FakeFactory`] hands out
//! one independent replica per scenario attempt.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::dates;
use crate::error::WorkflowResult;
use crate::scenario::ContextFactory;

pub mod app;
pub mod dom;

pub use app::FakeHarmonyHub;

/// Creates a fresh [`FakeHarmonyHub`] for every context
#[derive(Debug)]
pub struct FakeFactory {
    today: NaiveDate,
    created: AtomicUsize,
}

impl FakeFactory {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            created: AtomicUsize::new(0),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn contexts_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl Default for FakeFactory {
    fn default() -> Self {
        Self::new(dates::today())
    }
}

#[async_trait]
impl ContextFactory for FakeFactory {
    type Driver = FakeHarmonyHub;

    async fn new_context(&self) -> WorkflowResult<FakeHarmonyHub> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHarmonyHub::new(self.today))
    }
}
