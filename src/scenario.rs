//! Scenario model and parallel runner
//!
//! A scenario is a named async body run against one fresh browsing context.
//! The runner executes a suite with bounded parallelism, enforces the
//! per-test timeout, re-runs failures up to the configured retry count and
//! collects a [`RunSummary`]. Steps inside a scenario are strictly
//! sequential.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::RunConfig;
use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::pages::{ScheduleWorkflow, StudentWorkflow};

/// What a scenario body receives: its own context plus the run settings
pub struct ScenarioContext<D> {
    driver: D,
    config: Arc<RunConfig>,
    today: Option<NaiveDate>,
}

impl<D: Driver> ScenarioContext<D> {
    pub fn new(driver: D, config: Arc<RunConfig>) -> Self {
        Self {
            driver,
            config,
            today: None,
        }
    }

    /// Pin "today" for workflows built from this context
    pub fn with_today(mut self, today: Option<NaiveDate>) -> Self {
        self.today = today;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &Arc<RunConfig> {
        &self.config
    }

    pub fn schedule(&self) -> ScheduleWorkflow<&D> {
        let workflow = ScheduleWorkflow::new(&self.driver, Arc::clone(&self.config));
        match self.today {
            Some(today) => workflow.with_today(today),
            None => workflow,
        }
    }

    pub fn students(&self) -> StudentWorkflow<&D> {
        StudentWorkflow::new(&self.driver, Arc::clone(&self.config))
    }

    fn into_driver(self) -> D {
        self.driver
    }
}

/// Body of a scenario
pub type ScenarioFn<D> =
    for<'a> fn(&'a ScenarioContext<D>) -> BoxFuture<'a, WorkflowResult<()>>;

/// A named, independently runnable test case
pub struct Scenario<D> {
    pub id: &'static str,
    pub title: &'static str,
    pub suite: &'static str,
    pub run: ScenarioFn<D>,
}

impl<D> Clone for Scenario<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Scenario<D> {}

impl<D> fmt::Debug for Scenario<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("suite", &self.suite)
            .finish()
    }
}

/// Source of isolated browsing contexts, one per scenario attempt
#[async_trait]
pub trait ContextFactory: Send + Sync + 'static {
    type Driver: Driver + 'static;

    async fn new_context(&self) -> WorkflowResult<Self::Driver>;

    /// Release a context once its scenario attempt finished
    async fn close(&self, _driver: Self::Driver) -> WorkflowResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Passed,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub id: &'static str,
    pub title: &'static str,
    pub status: Status,
    /// Attempts made, including the first
    pub attempts: u32,
    pub elapsed: Duration,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }

    /// Passed, but only after at least one retry
    pub fn flaky(&self) -> bool {
        self.passed() && self.attempts > 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ScenarioOutcome>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn flaky(&self) -> usize {
        self.outcomes.iter().filter(|o| o.flaky()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, id: &str) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            let mark = match (&outcome.status, outcome.flaky()) {
                (Status::Passed, false) => "ok",
                (Status::Passed, true) => "flaky",
                (Status::Failed(_), _) => "FAILED",
            };
            writeln!(f, "{mark:>6}  {}  {}", outcome.id, outcome.title)?;
            if let Status::Failed(reason) = &outcome.status {
                for line in reason.lines() {
                    writeln!(f, "          {line}")?;
                }
            }
        }
        write!(
            f,
            "\n{} passed, {} failed, {} flaky in {:.1}s",
            self.passed(),
            self.failed(),
            self.flaky(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Runs suites against contexts produced by a [`ContextFactory`]
pub struct Runner<F> {
    factory: Arc<F>,
    config: Arc<RunConfig>,
    today: Option<NaiveDate>,
}

impl<F: ContextFactory> Runner<F> {
    pub fn new(factory: F, config: Arc<RunConfig>) -> Self {
        Self {
            factory: Arc::new(factory),
            config,
            today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Give the factory back, e.g. to shut its browser down
    pub fn into_factory(self) -> Arc<F> {
        self.factory
    }

    /// Run every scenario; outcomes come back in suite order
    pub async fn run(&self, suite: &[Scenario<F::Driver>]) -> RunSummary {
        let started = Instant::now();
        let workers = self.config.workers.max(1);
        let permits = Arc::new(Semaphore::new(workers));
        tracing::info!(scenarios = suite.len(), workers, "starting run");

        let mut tasks = JoinSet::new();
        for (position, scenario) in suite.iter().copied().enumerate() {
            let permits = Arc::clone(&permits);
            let factory = Arc::clone(&self.factory);
            let config = Arc::clone(&self.config);
            let today = self.today;
            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                (position, run_scenario(&*factory, config, today, scenario).await)
            });
        }

        let mut finished = Vec::with_capacity(suite.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => finished.push(done),
                Err(err) => tracing::error!(error = %err, "scenario task aborted"),
            }
        }
        // A task that died outside its body still owes an outcome
        for (position, scenario) in suite.iter().enumerate() {
            if !finished.iter().any(|(done, _)| *done == position) {
                finished.push((position, lost_outcome(scenario)));
            }
        }
        finished.sort_by_key(|(position, _)| *position);

        let summary = RunSummary {
            outcomes: finished.into_iter().map(|(_, outcome)| outcome).collect(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            passed = summary.passed(),
            failed = summary.failed(),
            "run finished"
        );
        summary
    }
}

async fn run_scenario<F: ContextFactory>(
    factory: &F,
    config: Arc<RunConfig>,
    today: Option<NaiveDate>,
    scenario: Scenario<F::Driver>,
) -> ScenarioOutcome {
    let started = Instant::now();
    let max_attempts = config.retries + 1;
    let mut attempts = 0;
    let status = loop {
        attempts += 1;
        tracing::info!(id = scenario.id, attempt = attempts, "scenario started");
        match attempt(factory, Arc::clone(&config), today, scenario).await {
            Ok(()) => break Status::Passed,
            Err(err) if attempts < max_attempts => {
                tracing::warn!(id = scenario.id, error = %err, "scenario failed, retrying");
            }
            Err(err) => {
                tracing::error!(id = scenario.id, error = %err, "scenario failed");
                break Status::Failed(err.to_string());
            }
        }
    };
    ScenarioOutcome {
        id: scenario.id,
        title: scenario.title,
        status,
        attempts,
        elapsed: started.elapsed(),
    }
}

async fn attempt<F: ContextFactory>(
    factory: &F,
    config: Arc<RunConfig>,
    today: Option<NaiveDate>,
    scenario: Scenario<F::Driver>,
) -> WorkflowResult<()> {
    let budget = config.timeouts.test();
    let driver = factory.new_context().await?;
    let context = ScenarioContext::new(driver, config).with_today(today);
    let body = AssertUnwindSafe((scenario.run)(&context)).catch_unwind();
    let result = match tokio::time::timeout(budget, body).await {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(WorkflowError::ScenarioPanicked {
            id: scenario.id.to_string(),
            message: panic_message(payload.as_ref()),
        }),
        Err(_) => Err(WorkflowError::ScenarioTimeout {
            id: scenario.id.to_string(),
            timeout: budget,
        }),
    };
    let closed = factory.close(context.into_driver()).await;
    result.and(closed)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn lost_outcome<D>(scenario: &Scenario<D>) -> ScenarioOutcome {
    ScenarioOutcome {
        id: scenario.id,
        title: scenario.title,
        status: Status::Failed(format!("scenario {} task was cancelled", scenario.id)),
        attempts: 1,
        elapsed: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFactory, FakeHarmonyHub};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    static FLAKY_CALLS: AtomicU32 = AtomicU32::new(0);

    fn passes<D: Driver>(_: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn fails<D: Driver>(_: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
        Box::pin(async { Err(WorkflowError::assertion("answer", 42, 41)) })
    }

    fn passes_second_time<D: Driver>(_: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
        Box::pin(async {
            if FLAKY_CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(WorkflowError::Driver("context crashed".to_string()))
            } else {
                Ok(())
            }
        })
    }

    fn hangs<D: Driver>(_: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        })
    }

    async fn explode() -> WorkflowResult<()> {
        panic!("body panicked")
    }

    fn panics<D: Driver>(_: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
        Box::pin(explode())
    }

    fn scenario(id: &'static str, run: ScenarioFn<FakeHarmonyHub>) -> Scenario<FakeHarmonyHub> {
        Scenario {
            id,
            title: id,
            suite: "runner",
            run,
        }
    }

    fn config(retries: u32, test_ms: u64) -> Arc<RunConfig> {
        let mut config = RunConfig::offline();
        config.retries = retries;
        config.timeouts.test_ms = test_ms;
        Arc::new(config)
    }

    #[tokio::test]
    async fn outcomes_keep_suite_order() {
        let runner = Runner::new(FakeFactory::default(), config(0, 5_000));
        let suite = [
            scenario("a", passes),
            scenario("b", fails),
            scenario("c", passes),
        ];
        let summary = runner.run(&suite).await;
        let ids: Vec<_> = summary.outcomes.iter().map(|o| o.id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());
        assert_eq!(runner.factory().contexts_created(), 3);
    }

    #[tokio::test]
    async fn retries_turn_failures_into_flaky_passes() {
        let runner = Runner::new(FakeFactory::default(), config(2, 5_000));
        let summary = runner.run(&[scenario("flaky", passes_second_time)]).await;
        let outcome = summary.outcome("flaky").expect("outcome");
        assert!(outcome.flaky());
        assert_eq!(outcome.attempts, 2);
        assert!(summary.is_success());
    }

    #[tokio::test]
    async fn failures_exhaust_every_attempt() {
        let runner = Runner::new(FakeFactory::default(), config(2, 5_000));
        let summary = runner.run(&[scenario("broken", fails)]).await;
        let outcome = summary.outcome("broken").expect("outcome");
        assert_eq!(outcome.attempts, 3);
        assert!(matches!(&outcome.status, Status::Failed(reason) if reason.contains("answer")));
    }

    #[tokio::test]
    async fn hung_scenarios_hit_the_test_timeout() {
        let runner = Runner::new(FakeFactory::default(), config(0, 50));
        let summary = runner.run(&[scenario("hang", hangs)]).await;
        let outcome = summary.outcome("hang").expect("outcome");
        assert!(
            matches!(&outcome.status, Status::Failed(reason) if reason.contains("exceeded")),
            "{:?}",
            outcome.status
        );
    }

    #[tokio::test]
    async fn panicking_body_is_a_failure_and_context_is_released() {
        let runner = Runner::new(FakeFactory::default(), config(1, 5_000));
        let summary = runner.run(&[scenario("boom", panics), scenario("fine", passes)]).await;
        assert_eq!(summary.outcomes.len(), 2);
        let outcome = summary.outcome("boom").expect("outcome");
        assert_eq!(
            outcome.status,
            Status::Failed("scenario boom panicked: body panicked".to_string())
        );
        assert_eq!(outcome.attempts, 2);
        assert_eq!(runner.factory().contexts_created(), 3);
        assert!(!summary.is_success());
    }

    #[test]
    fn lost_tasks_still_report() {
        let outcome = lost_outcome(&scenario("gone", passes));
        assert!(!outcome.passed());
        assert_eq!(outcome.id, "gone");
    }

    #[test]
    fn summary_display_lists_failures() {
        let summary = RunSummary {
            outcomes: vec![
                ScenarioOutcome {
                    id: "TC-01",
                    title: "loads",
                    status: Status::Passed,
                    attempts: 1,
                    elapsed: Duration::ZERO,
                },
                ScenarioOutcome {
                    id: "TC-02",
                    title: "adds",
                    status: Status::Failed("boom".to_string()),
                    attempts: 1,
                    elapsed: Duration::ZERO,
                },
            ],
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            summary.to_string(),
            "    ok  TC-01  loads\n\
             FAILED  TC-02  adds\n\
             \x20         boom\n\
             \n\
             1 passed, 1 failed, 0 flaky in 1.5s"
        );
    }
}
