//! Waiting primitives
//!
//! Two kinds of suspension exist. Predicate waits probe the page until a
//! condition holds or a bounded timeout elapses. Settle delays sleep for a
//! fixed time and are reserved for re-renders that expose no observable
//! completion signal; they are a known source of flakiness under slow
//! rendering.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::Locator;

/// Target state of a locator wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Present and rendered visibly
    Visible,
    /// Absent or not rendered visibly
    Hidden,
    /// Present in the DOM
    Attached,
    /// Absent from the DOM
    Detached,
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Attached => "attached",
            Self::Detached => "detached",
        };
        f.write_str(name)
    }
}

/// Result of a single probe
pub enum Probe<T> {
    Done(T),
    /// Not yet; carries a description of what was observed
    Waiting(String),
}

/// Result of a bounded poll
#[derive(Debug, PartialEq, Eq)]
pub enum Waited<T> {
    Ready(T),
    TimedOut { last: String },
}

/// Probe until done or until `timeout` elapses. The probe always runs at
/// least once, so a zero timeout checks the current state exactly once.
/// Driver errors abort the poll immediately.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> WorkflowResult<Waited<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WorkflowResult<Probe<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let last = match probe().await? {
            Probe::Done(value) => return Ok(Waited::Ready(value)),
            Probe::Waiting(observed) => observed,
        };
        let now = Instant::now();
        if now >= deadline {
            return Ok(Waited::TimedOut { last });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// Block until `locator` reaches `state`
pub async fn wait_for<D: Driver + ?Sized>(
    driver: &D,
    locator: &Locator,
    state: WaitState,
    timeout: Duration,
    interval: Duration,
) -> WorkflowResult<()> {
    locator.validate()?;
    tracing::trace!(selector = %locator, %state, ?timeout, "waiting");
    let outcome = poll_until(timeout, interval, || async move {
        let reached = match state {
            WaitState::Visible => driver.is_visible(locator).await?,
            WaitState::Hidden => !driver.is_visible(locator).await?,
            WaitState::Attached => driver.count(locator).await? > 0,
            WaitState::Detached => driver.count(locator).await? == 0,
        };
        Ok(if reached {
            Probe::Done(())
        } else {
            Probe::Waiting(format!("not {state}"))
        })
    })
    .await?;

    match outcome {
        Waited::Ready(()) => Ok(()),
        Waited::TimedOut { .. } => {
            tracing::debug!(selector = %locator, %state, ?timeout, "wait timed out");
            Err(WorkflowError::Timeout {
                selector: locator.selector(),
                state,
                timeout,
            })
        }
    }
}

/// Fixed settle delay
pub async fn settle(delay: Duration, reason: &str) {
    if delay.is_zero() {
        return;
    }
    tracing::trace!(?delay, reason, "settling");
    sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn poll_returns_once_ready() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let outcome = poll_until(Duration::from_secs(1), Duration::from_millis(1), || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(if n >= 2 {
                Probe::Done(n)
            } else {
                Probe::Waiting(format!("attempt {n}"))
            })
        })
        .await
        .expect("poll");
        assert_eq!(outcome, Waited::Ready(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn poll_times_out_with_last_observation() {
        let outcome: Waited<()> =
            poll_until(Duration::from_millis(20), Duration::from_millis(5), || async {
                Ok(Probe::Waiting("still loading".to_string()))
            })
            .await
            .expect("poll");
        assert_eq!(
            outcome,
            Waited::TimedOut {
                last: "still loading".to_string()
            }
        );
    }

    #[tokio::test]
    async fn zero_timeout_probes_exactly_once() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let outcome: Waited<()> = poll_until(Duration::ZERO, Duration::from_millis(5), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Probe::Waiting(String::new()))
        })
        .await
        .expect("poll");
        assert!(matches!(outcome, Waited::TimedOut { .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn probe_errors_abort_immediately() {
        let result: WorkflowResult<Waited<()>> =
            poll_until(Duration::from_secs(5), Duration::from_millis(1), || async {
                Err(WorkflowError::Driver("page closed".to_string()))
            })
            .await;
        assert!(matches!(result, Err(WorkflowError::Driver(_))));
    }

    #[tokio::test]
    async fn invalid_pattern_fails_before_polling() {
        use crate::locator::TextMatch;
        use crate::testing::FakeHarmonyHub;

        let hub = FakeHarmonyHub::new(chrono::NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"));
        let broken = Locator::text(TextMatch::pattern("[z-a]"));
        let started = std::time::Instant::now();
        let err = wait_for(
            &hub,
            &broken,
            WaitState::Visible,
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await
        .expect_err("invalid pattern");
        assert!(matches!(err, WorkflowError::InvalidPattern { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn zero_settle_returns_immediately() {
        let started = std::time::Instant::now();
        settle(Duration::ZERO, "test").await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
