//! Retrying assertions on rendered state
//!
//! Each assertion polls until it holds or the expect timeout elapses, then
//! fails with the last observed value as the "actual" side.

use std::fmt::Debug;
use std::time::Duration;

use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::{Locator, normalize_whitespace};
use crate::wait::{Probe, Waited, poll_until};

/// Polling budget for one assertion
#[derive(Debug, Clone, Copy)]
pub struct Expectation {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Expectation {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Assert the locator resolves to a visible element
    pub async fn to_be_visible<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
    ) -> WorkflowResult<()> {
        locator.validate()?;
        let outcome = poll_until(self.timeout, self.interval, || async move {
            let count = driver.count(locator).await?;
            if count == 0 {
                return Ok(Probe::Waiting("no matching element".to_string()));
            }
            Ok(if driver.is_visible(locator).await? {
                Probe::Done(())
            } else {
                Probe::Waiting("present but hidden".to_string())
            })
        })
        .await?;
        self.finish(outcome, locator, "visible")
    }

    /// Assert the element's normalised text equals `expected`
    pub async fn to_have_text<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        expected: &str,
    ) -> WorkflowResult<()> {
        locator.validate()?;
        let expected_norm = normalize_whitespace(expected);
        let wanted = expected_norm.as_str();
        let outcome = poll_until(self.timeout, self.interval, || async move {
            let actual = current_text(driver, locator).await?;
            Ok(match actual {
                Some(text) if text == wanted => Probe::Done(()),
                Some(text) => Probe::Waiting(format!("{text:?}")),
                None => Probe::Waiting("no matching element".to_string()),
            })
        })
        .await?;
        self.finish(outcome, locator, &format!("{expected:?}"))
    }

    /// Assert the element's text contains `needle`
    pub async fn to_contain_text<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        needle: &str,
    ) -> WorkflowResult<()> {
        locator.validate()?;
        let outcome = poll_until(self.timeout, self.interval, || async move {
            let actual = current_text(driver, locator).await?;
            Ok(match actual {
                Some(text) if text.contains(needle) => Probe::Done(()),
                Some(text) => Probe::Waiting(format!("{text:?}")),
                None => Probe::Waiting("no matching element".to_string()),
            })
        })
        .await?;
        self.finish(outcome, locator, &format!("text containing {needle:?}"))
    }

    fn finish(
        &self,
        outcome: Waited<()>,
        locator: &Locator,
        expected: &str,
    ) -> WorkflowResult<()> {
        match outcome {
            Waited::Ready(()) => Ok(()),
            Waited::TimedOut { last } => Err(WorkflowError::Assertion {
                what: format!("`{locator}` after {:?}", self.timeout),
                expected: expected.to_string(),
                actual: last,
            }),
        }
    }
}

async fn current_text<D: Driver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> WorkflowResult<Option<String>> {
    if driver.count(locator).await? == 0 {
        return Ok(None);
    }
    Ok(driver
        .text_content(locator)
        .await?
        .map(|text| normalize_whitespace(&text)))
}

/// Immediate equality check with an expected/actual diff
pub fn ensure_eq<T: PartialEq + Debug>(what: &str, expected: T, actual: T) -> WorkflowResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(WorkflowError::assertion(
            what,
            format!("{expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

/// Immediate containment check
pub fn ensure_contains(what: &str, haystack: &str, needle: &str) -> WorkflowResult<()> {
    if haystack.contains(needle) {
        Ok(())
    } else {
        Err(WorkflowError::assertion(
            what,
            format!("text containing {needle:?}"),
            format!("{haystack:?}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_eq_reports_both_sides() {
        assert!(ensure_eq("count", 3, 3).is_ok());
        let err = ensure_eq("count", 4, 3).expect_err("mismatch");
        match err {
            WorkflowError::Assertion {
                what,
                expected,
                actual,
            } => {
                assert_eq!(what, "count");
                assert_eq!(expected, "4");
                assert_eq!(actual, "3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ensure_contains_quotes_values() {
        assert!(ensure_contains("header", "Schedule for Monday", "Monday").is_ok());
        let err = ensure_contains("header", "Schedule for", "Monday").expect_err("missing");
        assert_eq!(
            err.to_string(),
            "assertion failed: header\n  expected: text containing \"Monday\"\n  actual:   \"Schedule for\""
        );
    }
}
