//! Scenario catalogs run end to end against the in-memory application.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::BoxFuture;

use harmony_e2e::config::RunConfig;
use harmony_e2e::WorkflowResult;
use harmony_e2e::scenario::{Runner, Scenario, ScenarioContext, Status};
use harmony_e2e::scenarios;
use harmony_e2e::testing::{FakeFactory, FakeHarmonyHub};

fn runner(today: NaiveDate) -> Runner<FakeFactory> {
    Runner::new(FakeFactory::new(today), Arc::new(RunConfig::offline())).with_today(today)
}

fn assert_all_passed(summary: &harmony_e2e::scenario::RunSummary) {
    for outcome in &summary.outcomes {
        assert_eq!(
            outcome.status,
            Status::Passed,
            "{} {} failed",
            outcome.id,
            outcome.title
        );
        assert_eq!(outcome.attempts, 1, "{} needed a retry", outcome.id);
    }
}

#[tokio::test]
async fn schedule_suite_passes() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
    let runner = runner(today);
    let suite = scenarios::schedule_suite::<FakeHarmonyHub>();
    let summary = runner.run(&suite).await;
    assert_eq!(summary.outcomes.len(), 7);
    assert_all_passed(&summary);
    assert_eq!(runner.factory().contexts_created(), 7);
}

#[tokio::test]
async fn student_suite_passes() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
    let summary = runner(today).run(&scenarios::student_suite::<FakeHarmonyHub>()).await;
    assert_eq!(summary.outcomes.len(), 6);
    assert_all_passed(&summary);
    assert!(summary.is_success());
}

#[tokio::test]
async fn schedule_suite_passes_on_boundary_dates() {
    for (y, m, d) in [(2024, 2, 29), (2026, 12, 31), (2027, 1, 1), (2026, 11, 1)] {
        let today = NaiveDate::from_ymd_opt(y, m, d).expect("date");
        let summary = runner(today)
            .run(&scenarios::schedule_suite::<FakeHarmonyHub>())
            .await;
        assert!(summary.is_success(), "{today}:\n{summary}");
    }
}

#[tokio::test]
async fn single_worker_runs_everything_in_order() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
    let mut config = RunConfig::offline();
    config.workers = 1;
    let runner = Runner::new(FakeFactory::new(today), Arc::new(config)).with_today(today);
    let suite = scenarios::all::<FakeHarmonyHub>();
    let summary = runner.run(&suite).await;
    let ids: Vec<_> = summary.outcomes.iter().map(|o| o.id).collect();
    let expected: Vec<_> = suite.iter().map(|s| s.id).collect();
    assert_eq!(ids, expected);
    assert!(summary.is_success(), "{summary}");
}

async fn crash() -> WorkflowResult<()> {
    panic!("body panicked")
}

fn crashing(_: &ScenarioContext<FakeHarmonyHub>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(crash())
}

#[tokio::test]
async fn panicking_scenario_fails_the_run() {
    let runner = Runner::new(FakeFactory::default(), Arc::new(RunConfig::offline()));
    let suite = [Scenario {
        id: "TC-PANIC",
        title: "body panics",
        suite: "runner",
        run: crashing,
    }];
    let summary = runner.run(&suite).await;
    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());
    assert!(
        matches!(&summary.outcomes[0].status, Status::Failed(reason) if reason.contains("panicked: body panicked")),
        "{summary}"
    );
}
