//! Playwright backend
//!
//! Each [`PlaywrightDriver`] wraps one page, which Playwright opens in its
//! own browser context. Locators are sent in selector syntax and resolved
//! by the engine on every call. Clicks and fills carry the configured action
//! timeout, navigation carries the navigation timeout.

use std::time::Duration;

use async_trait::async_trait;
use playwright_rs::{
    Browser, ClickOptions, FillOptions, GotoOptions, LaunchOptions, Page, Playwright,
};

use crate::config::{Browser as BrowserKind, RunConfig, Timeouts, Viewport};
use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::Locator;
use crate::scenario::ContextFactory;

fn driver_error(err: playwright_rs::Error) -> WorkflowError {
    WorkflowError::Driver(err.to_string())
}

fn millis(timeout: Duration) -> f64 {
    timeout.as_millis() as f64
}

fn click_options(timeout: Duration) -> ClickOptions {
    ClickOptions {
        timeout: Some(millis(timeout)),
        ..Default::default()
    }
}

fn fill_options(timeout: Duration) -> FillOptions {
    FillOptions {
        timeout: Some(millis(timeout)),
        ..Default::default()
    }
}

fn launch_options(config: &RunConfig) -> LaunchOptions {
    LaunchOptions::default().headless(config.headless)
}

fn page_viewport(viewport: Viewport) -> playwright_rs::Viewport {
    playwright_rs::Viewport {
        width: viewport.width as _,
        height: viewport.height as _,
    }
}

/// One browsing context driven through Playwright
pub struct PlaywrightDriver {
    page: Page,
    action_timeout: Duration,
    navigation_timeout: Duration,
}

impl PlaywrightDriver {
    pub fn new(page: Page, timeouts: &Timeouts) -> Self {
        Self {
            page,
            action_timeout: timeouts.action(),
            navigation_timeout: timeouts.navigation(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn close(self) -> WorkflowResult<()> {
        self.page.close().await.map_err(driver_error)
    }
}

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn goto(&self, url: &str) -> WorkflowResult<()> {
        let options = GotoOptions::new().timeout(self.navigation_timeout);
        self.page
            .goto(url, Some(options))
            .await
            .map(|_| ())
            .map_err(|err| WorkflowError::Navigation {
                url: url.to_string(),
                reason: err.to_string(),
            })
    }

    async fn count(&self, locator: &Locator) -> WorkflowResult<usize> {
        let handle = self.page.locator(&locator.selector()).await;
        handle.count().await.map_err(driver_error)
    }

    async fn is_visible(&self, locator: &Locator) -> WorkflowResult<bool> {
        let handle = self.page.locator(&locator.selector()).await;
        handle.is_visible().await.map_err(driver_error)
    }

    async fn text_content(&self, locator: &Locator) -> WorkflowResult<Option<String>> {
        let handle = self.page.locator(&locator.selector()).await;
        handle.text_content().await.map_err(driver_error)
    }

    async fn click(&self, locator: &Locator) -> WorkflowResult<()> {
        let handle = self.page.locator(&locator.selector()).await;
        handle
            .click(Some(click_options(self.action_timeout)))
            .await
            .map_err(driver_error)
    }

    async fn fill(&self, locator: &Locator, value: &str) -> WorkflowResult<()> {
        let handle = self.page.locator(&locator.selector()).await;
        handle
            .fill(value, Some(fill_options(self.action_timeout)))
            .await
            .map_err(driver_error)
    }
}

/// Launches one browser per run and opens a fresh page per scenario
pub struct PlaywrightFactory {
    // Keeps the driver server alive for as long as the browser is in use
    _playwright: Playwright,
    browser: Browser,
    timeouts: Timeouts,
    viewport: Viewport,
}

impl PlaywrightFactory {
    pub async fn launch(config: &RunConfig) -> WorkflowResult<Self> {
        let playwright = Playwright::launch().await.map_err(driver_error)?;
        tracing::info!(
            browser = %config.browser,
            headless = config.headless,
            width = config.viewport.width,
            height = config.viewport.height,
            "launching browser"
        );
        let options = launch_options(config);
        let browser = match config.browser {
            BrowserKind::Chromium => playwright.chromium().launch_with_options(options).await,
            BrowserKind::Firefox => playwright.firefox().launch_with_options(options).await,
            BrowserKind::Webkit => playwright.webkit().launch_with_options(options).await,
        }
        .map_err(driver_error)?;
        Ok(Self {
            _playwright: playwright,
            browser,
            timeouts: config.timeouts.clone(),
            viewport: config.viewport,
        })
    }

    pub async fn shutdown(self) -> WorkflowResult<()> {
        self.browser.close().await.map_err(driver_error)
    }
}

#[async_trait]
impl ContextFactory for PlaywrightFactory {
    type Driver = PlaywrightDriver;

    async fn new_context(&self) -> WorkflowResult<PlaywrightDriver> {
        let page = self.browser.new_page().await.map_err(driver_error)?;
        page.set_viewport_size(page_viewport(self.viewport))
            .await
            .map_err(driver_error)?;
        Ok(PlaywrightDriver::new(page, &self.timeouts))
    }

    async fn close(&self, driver: PlaywrightDriver) -> WorkflowResult<()> {
        driver.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_options_carry_the_configured_timeout() {
        let timeouts = Timeouts::default();
        assert_eq!(click_options(timeouts.action()).timeout, Some(10_000.0));
        assert_eq!(fill_options(timeouts.action()).timeout, Some(10_000.0));
    }

    #[test]
    fn viewport_follows_config() {
        let viewport = page_viewport(Viewport {
            width: 1280,
            height: 720,
        });
        assert_eq!(viewport.width, 1280);
        assert_eq!(viewport.height, 720);
    }
}
