//! Browser driver seam
//!
//! Workflows talk to a live page only through [`Driver`]. Every call resolves
//! its [`Locator`] afresh; implementations must not cache element handles.
//! Single-element operations (`is_visible`, `text_content`, `click`, `fill`)
//! are strict: a locator matching several elements is an error, as in
//! Playwright.

use async_trait::async_trait;

use crate::error::WorkflowResult;
use crate::locator::Locator;

/// Primitive operations on one browsing context
#[async_trait]
pub trait Driver: Send + Sync {
    /// Load a URL in this context
    async fn goto(&self, url: &str) -> WorkflowResult<()>;

    /// Number of elements currently matching
    async fn count(&self, locator: &Locator) -> WorkflowResult<usize>;

    /// Whether the single matching element is rendered visibly.
    /// No match is reported as not visible.
    async fn is_visible(&self, locator: &Locator) -> WorkflowResult<bool>;

    /// Raw text content of the single matching element
    async fn text_content(&self, locator: &Locator) -> WorkflowResult<Option<String>>;

    async fn click(&self, locator: &Locator) -> WorkflowResult<()>;

    /// Replace the value of an input-like element
    async fn fill(&self, locator: &Locator, value: &str) -> WorkflowResult<()>;

    /// Empty an input-like element
    async fn clear(&self, locator: &Locator) -> WorkflowResult<()> {
        self.fill(locator, "").await
    }
}

#[async_trait]
impl<T: Driver + ?Sized> Driver for &T {
    async fn goto(&self, url: &str) -> WorkflowResult<()> {
        (**self).goto(url).await
    }

    async fn count(&self, locator: &Locator) -> WorkflowResult<usize> {
        (**self).count(locator).await
    }

    async fn is_visible(&self, locator: &Locator) -> WorkflowResult<bool> {
        (**self).is_visible(locator).await
    }

    async fn text_content(&self, locator: &Locator) -> WorkflowResult<Option<String>> {
        (**self).text_content(locator).await
    }

    async fn click(&self, locator: &Locator) -> WorkflowResult<()> {
        (**self).click(locator).await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> WorkflowResult<()> {
        (**self).fill(locator, value).await
    }

    async fn clear(&self, locator: &Locator) -> WorkflowResult<()> {
        (**self).clear(locator).await
    }
}
