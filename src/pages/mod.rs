//! Page workflow objects
//!
//! One workflow binds the semantic actions of a screen to a single browsing
//! context. A workflow is created per scenario, `navigate()` is called
//! first, and calls are awaited strictly in order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::RunConfig;
use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::expect::Expectation;
use crate::locator::Locator;
use crate::wait::{WaitState, settle, wait_for};

pub mod form;
pub mod schedule;
pub mod students;

pub use schedule::ScheduleWorkflow;
pub use students::StudentWorkflow;

/// Capabilities shared by every screen workflow
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Entity created through this screen's form
    type Record: Send + Sync;

    /// Load the screen and block until it is ready
    async fn navigate(&self) -> WorkflowResult<()>;

    /// Locator for the entity card carrying `label`
    fn entity(&self, label: &str) -> Locator;

    async fn open_creation_form(&self) -> WorkflowResult<()>;

    /// Fill the creation form from `record`, submit, and wait for it to close
    async fn fill_and_submit(&self, record: &Self::Record) -> WorkflowResult<()>;

    /// Assert the entity card carrying `label` is visible
    async fn verify_present(&self, label: &str) -> WorkflowResult<()>;
}

/// Create an entity and confirm its card appears once the list refreshes
pub async fn create_and_verify<W: Workflow + ?Sized>(
    workflow: &W,
    record: &W::Record,
    label: &str,
) -> WorkflowResult<()> {
    workflow.fill_and_submit(record).await?;
    workflow.verify_present(label).await
}

/// A driver plus the run configuration that governs its waits
pub struct Session<D> {
    driver: D,
    config: Arc<RunConfig>,
}

impl<D: Driver> Session<D> {
    pub fn new(driver: D, config: Arc<RunConfig>) -> Self {
        Self { driver, config }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load `path` and wait until `ready` is visible. A ready marker that
    /// never shows up is reported as a navigation failure.
    pub async fn open(&self, path: &str, ready: &Locator) -> WorkflowResult<()> {
        let url = self.config.url(path);
        tracing::info!(%url, "navigating");
        self.driver.goto(&url).await?;
        let timeouts = &self.config.timeouts;
        wait_for(
            &self.driver,
            ready,
            WaitState::Visible,
            timeouts.navigation(),
            timeouts.poll(),
        )
        .await
        .map_err(|err| match err {
            WorkflowError::Timeout { selector, .. } => WorkflowError::Navigation {
                url,
                reason: format!("`{selector}` never became visible"),
            },
            other => other,
        })
    }

    pub async fn wait_visible(&self, locator: &Locator) -> WorkflowResult<()> {
        self.wait(locator, WaitState::Visible).await
    }

    pub async fn wait_hidden(&self, locator: &Locator) -> WorkflowResult<()> {
        self.wait(locator, WaitState::Hidden).await
    }

    async fn wait(&self, locator: &Locator, state: WaitState) -> WorkflowResult<()> {
        let timeouts = &self.config.timeouts;
        wait_for(&self.driver, locator, state, timeouts.action(), timeouts.poll()).await
    }

    pub fn expectation(&self) -> Expectation {
        let timeouts = &self.config.timeouts;
        Expectation::new(timeouts.expect(), timeouts.poll())
    }

    pub async fn expect_visible(&self, locator: &Locator) -> WorkflowResult<()> {
        self.expectation().to_be_visible(&self.driver, locator).await
    }

    pub async fn expect_text(&self, locator: &Locator, expected: &str) -> WorkflowResult<()> {
        self.expectation()
            .to_have_text(&self.driver, locator, expected)
            .await
    }

    pub async fn expect_contains_text(&self, locator: &Locator, needle: &str) -> WorkflowResult<()> {
        self.expectation()
            .to_contain_text(&self.driver, locator, needle)
            .await
    }

    /// Wait for the element and return its trimmed text
    pub async fn read_text(&self, locator: &Locator) -> WorkflowResult<String> {
        self.wait_visible(locator).await?;
        Ok(self
            .driver
            .text_content(locator)
            .await?
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    pub async fn click(&self, locator: &Locator) -> WorkflowResult<()> {
        tracing::debug!(selector = %locator, "click");
        self.driver.click(locator).await
    }

    pub async fn fill(&self, locator: &Locator, value: &str) -> WorkflowResult<()> {
        tracing::debug!(selector = %locator, "fill");
        self.driver.fill(locator, value).await
    }

    pub async fn clear(&self, locator: &Locator) -> WorkflowResult<()> {
        self.driver.clear(locator).await
    }

    pub async fn settle(&self, delay: Duration, reason: &str) {
        settle(delay, reason).await
    }

    /// Settle after a committed form while the entity list refreshes
    pub async fn settle_refresh(&self) {
        settle(self.config.settle.refresh(), "list refresh").await
    }
}
