//! Error taxonomy for workflows, waits and the scenario runner.

use std::time::Duration;

use thiserror::Error;

use crate::wait::WaitState;

/// Errors that can abort a workflow step or a scenario
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A locator never reached the expected state within the timeout
    #[error("timed out after {timeout:?} waiting for `{selector}` to be {state}")]
    Timeout {
        selector: String,
        state: WaitState,
        timeout: Duration,
    },

    /// Resolved UI state does not match the expected value
    #[error("assertion failed: {what}\n  expected: {expected}\n  actual:   {actual}")]
    Assertion {
        what: String,
        expected: String,
        actual: String,
    },

    /// A screen could not be loaded or never became ready
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A named control could not be resolved on the current screen
    #[error("no {what} found for `{selector}`")]
    NotFound { what: String, selector: String },

    /// A whole scenario ran past the per-test timeout
    #[error("scenario {id} exceeded its {timeout:?} budget")]
    ScenarioTimeout { id: String, timeout: Duration },

    /// A scenario body panicked instead of returning an error
    #[error("scenario {id} panicked: {message}")]
    ScenarioPanicked { id: String, message: String },

    /// A locator carries a text pattern that does not compile
    #[error("invalid text pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Rendered text did not have the expected shape
    #[error("unexpected data shape: {0}")]
    DataShape(String),

    /// The browser backend reported an error
    #[error("driver error: {0}")]
    Driver(String),

    /// The run configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl WorkflowError {
    /// Build an assertion failure from any displayable pair
    pub fn assertion(
        what: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::Assertion {
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// True for failures caused by a wait running out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ScenarioTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_names_selector_and_state() {
        let err = WorkflowError::Timeout {
            selector: "div[role=\"dialog\"]".to_string(),
            state: WaitState::Hidden,
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(
            err.to_string(),
            "timed out after 1.5s waiting for `div[role=\"dialog\"]` to be hidden"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn assertion_display_shows_both_sides() {
        let err = WorkflowError::assertion("student count", 4, 3);
        assert_eq!(
            err.to_string(),
            "assertion failed: student count\n  expected: 4\n  actual:   3"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WorkflowError = io.into();
        assert_eq!(err.to_string(), "I/O error: missing");
    }
}
