//! Student Management suite

use futures::future::BoxFuture;

use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::expect::ensure_eq;
use crate::fixtures::{StudentRecord, students};
use crate::pages::create_and_verify;
use crate::scenario::{Scenario, ScenarioContext};

pub const SUITE: &str = "Student Management";

pub fn suite<D: Driver>() -> Vec<Scenario<D>> {
    vec![
        Scenario {
            id: "TC-01",
            title: "Verify page title is displayed correctly",
            suite: SUITE,
            run: page_title,
        },
        Scenario {
            id: "TC-02",
            title: "Verify existing student is present",
            suite: SUITE,
            run: existing_student,
        },
        Scenario {
            id: "TC-03",
            title: "Add a new student successfully",
            suite: SUITE,
            run: add_student_count,
        },
        Scenario {
            id: "TC-04",
            title: "Verify newly added student is visible",
            suite: SUITE,
            run: new_student_visible,
        },
        Scenario {
            id: "TC-05",
            title: "Search narrows the roster to matching students",
            suite: SUITE,
            run: search_roster,
        },
        Scenario {
            id: "TC-06",
            title: "Invalid student data is rejected with a message",
            suite: SUITE,
            run: invalid_students,
        },
    ]
}

fn pick(table: &'static [StudentRecord], index: usize) -> WorkflowResult<&'static StudentRecord> {
    table
        .get(index)
        .ok_or_else(|| WorkflowError::DataShape(format!("no student at index {index}")))
}

fn page_title<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let page = ctx.students();
        page.navigate().await?;
        page.verify_page_title().await?;
        page.verify_subtitle().await
    })
}

fn existing_student<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let student = pick(&students().existing_students, 0)?;
        let page = ctx.students();
        page.navigate().await?;
        page.verify_student_present(&student.name).await
    })
}

fn add_student_count<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let student = pick(&students().new_students, 0)?;
        let page = ctx.students();
        page.navigate().await?;
        let initial = page.student_count().await?;
        page.add_student(student).await?;
        page.session().settle_refresh().await;
        ensure_eq("student count", initial + 1, page.student_count().await?)
    })
}

fn new_student_visible<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let student = pick(&students().new_students, 1)?;
        let page = ctx.students();
        page.navigate().await?;
        create_and_verify(&page, student, &student.name).await
    })
}

fn search_roster<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let student = pick(&students().existing_students, 0)?;
        let page = ctx.students();
        page.navigate().await?;
        page.search(&student.name).await?;
        ensure_eq(
            "visible students",
            vec![student.name.clone()],
            page.all_visible_names().await?,
        )?;
        page.search("no student is called this").await?;
        ensure_eq(
            "visible students",
            Vec::<String>::new(),
            page.all_visible_names().await?,
        )
    })
}

fn invalid_students<D: Driver>(ctx: &ScenarioContext<D>) -> BoxFuture<'_, WorkflowResult<()>> {
    Box::pin(async move {
        let page = ctx.students();
        for invalid in &students().invalid_data {
            page.navigate().await?;
            let before = page.student_count().await?;
            page.add_student_rejected(invalid).await?;
            page.navigate().await?;
            ensure_eq("student count", before, page.student_count().await?)?;
        }
        Ok(())
    })
}
