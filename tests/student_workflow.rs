//! Student workflow against the in-memory application.

use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use harmony_e2e::config::RunConfig;
use harmony_e2e::driver::Driver;
use harmony_e2e::error::WorkflowError;
use harmony_e2e::fixtures::{StudentRecord, students};
use harmony_e2e::locator::{Locator, TextMatch};
use harmony_e2e::pages::{StudentWorkflow, Workflow, create_and_verify};
use harmony_e2e::testing::FakeHarmonyHub;

fn workflow() -> StudentWorkflow<FakeHarmonyHub> {
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
    StudentWorkflow::new(FakeHarmonyHub::new(today), Arc::new(RunConfig::offline()))
}

#[tokio::test]
async fn page_identity() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    assert_eq!(page.page_title().await.expect("title"), "Student Management");
    page.verify_page_title().await.expect("title");
    page.verify_subtitle().await.expect("subtitle");
}

#[tokio::test]
async fn seeded_students_are_present() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    for student in &students().existing_students {
        page.verify_student_present(&student.name).await.expect(&student.name);
    }
}

#[tokio::test]
async fn adding_a_student_bumps_the_count() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    let initial = page.student_count().await.expect("count");
    page.add_student(&students().new_students[0]).await.expect("add");
    assert_eq!(page.student_count().await.expect("count"), initial + 1);
    page.verify_student_present("Alex Thompson").await.expect("present");
}

#[tokio::test]
async fn minimal_student_needs_only_required_fields() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    let student = StudentRecord::new("Lena Park", "lena.park@email.com", "Grade 9");
    create_and_verify(&page, &student, "Lena Park").await.expect("create");
    let fills: Vec<String> = page
        .session()
        .driver()
        .actions()
        .into_iter()
        .filter(|a| a.starts_with("fill "))
        .collect();
    assert_eq!(fills, ["fill field:name", "fill field:email"]);
}

#[tokio::test]
async fn count_reads_zero_from_an_unreadable_badge() {
    let page = workflow();
    page.session().driver().set_badge_override("99999999999 Students");
    page.navigate().await.expect("navigate");
    assert_eq!(page.student_count().await.expect("lenient"), 0);
    assert!(matches!(
        page.student_count_strict().await,
        Err(WorkflowError::DataShape(_))
    ));
}

#[tokio::test]
async fn badge_is_not_confused_with_the_navigation_label() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    let driver = page.session().driver();
    let bare_label = Locator::text(TextMatch::pattern(r"^\S*\s*Students$"));
    assert_eq!(driver.count(&bare_label).await.expect("count"), 2);
    assert_eq!(page.student_count_strict().await.expect("count"), 3);
}

#[tokio::test]
async fn address_lands_in_the_stored_record() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    let student = &students().new_students[0];
    page.add_student(student).await.expect("add");
    assert!(page.session().driver().actions().contains(&"fill field:address".to_string()));
}

#[tokio::test]
async fn visible_names_follow_dom_order() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    page.add_student(&students().new_students[1]).await.expect("add");
    assert_eq!(
        page.all_visible_names().await.expect("names"),
        ["Emma Johnson", "Michael Chen", "Sofia Rodriguez", "Maya Patel"]
    );
}

#[tokio::test]
async fn visible_names_empty_when_search_hides_everyone() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    page.search("zzz").await.expect("search");
    assert!(page.all_visible_names().await.expect("names").is_empty());
    page.search("").await.expect("clear search");
    assert_eq!(page.all_visible_names().await.expect("names").len(), 3);
}

#[tokio::test]
async fn search_matches_partial_names() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    page.search("chen").await.expect("search");
    assert_eq!(page.all_visible_names().await.expect("names"), ["Michael Chen"]);
}

#[tokio::test]
async fn invalid_students_are_refused() {
    for invalid in &students().invalid_data {
        let page = workflow();
        page.navigate().await.expect("navigate");
        page.add_student_rejected(invalid)
            .await
            .expect(&invalid.expected_error);
        assert_eq!(page.session().driver().student_names().len(), 3);
    }
}

#[tokio::test]
async fn adding_invalid_data_normally_times_out_on_the_dialog() {
    let page = workflow();
    page.navigate().await.expect("navigate");
    let invalid = &students().invalid_data[1];
    let err = page.add_student(&invalid.record).await.expect_err("dialog stays");
    assert!(err.is_timeout(), "{err}");
}

#[tokio::test]
async fn entity_locator_is_the_student_card() {
    let page = workflow();
    assert_eq!(page.entity("Emma Johnson"), page.find_student_card("Emma Johnson"));
}
