//! Student Management screen: roster cards, count badge, search, and the
//! add-student dialog.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RunConfig;
use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::fixtures::{InvalidStudent, StudentRecord};
use crate::locator::{ElementQuery, Locator, TextMatch};
use crate::pages::form::{Control, Dialog, FillMode, set_control};
use crate::pages::{Session, Workflow};

pub const PATH: &str = "/students";
pub const TITLE: &str = "Student Management";
pub const SUBTITLE: &str = "Manage your students and their information";

/// "First Last" as rendered in a card heading
const NAME_PATTERN: &str = r"^[A-Z][a-z]+ [A-Z][a-z]+$";
const GRADE_PATTERN: &str = r"Grade \d+";

/// Badge text the count is read from, e.g. "12 Students"
const BADGE_PATTERN: &str = r"\d+ Students";

/// First run of digits anywhere in the badge text, e.g. 7 in
/// "Total: 7 Students". `None` when there is no run or it overflows.
pub fn parse_badge_count(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Workflow over the Student Management screen
pub struct StudentWorkflow<D> {
    session: Session<D>,
    title: Locator,
    subtitle: Locator,
    add_student_button: Locator,
    count_badge: Locator,
    search_input: Locator,
    dialog: Dialog,
}

impl<D: Driver> StudentWorkflow<D> {
    pub fn new(driver: D, config: Arc<RunConfig>) -> Self {
        Self {
            session: Session::new(driver, config),
            title: Locator::tag_with_text("h1", TITLE),
            subtitle: Locator::text(TextMatch::contains(SUBTITLE)),
            add_student_button: Locator::tag_with_text("button", "Add Student"),
            count_badge: Locator::text(TextMatch::pattern(BADGE_PATTERN)),
            search_input: Locator::element(
                ElementQuery::tag("input").placeholder_contains("Search students"),
            ),
            dialog: Dialog::new(),
        }
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub async fn navigate(&self) -> WorkflowResult<()> {
        self.session.open(PATH, &self.title).await
    }

    pub async fn page_title(&self) -> WorkflowResult<String> {
        self.session.read_text(&self.title).await
    }

    pub async fn verify_page_title(&self) -> WorkflowResult<()> {
        self.session.expect_text(&self.title, TITLE).await
    }

    pub async fn verify_subtitle(&self) -> WorkflowResult<()> {
        self.session.expect_visible(&self.subtitle).await
    }

    /// Every roster card: a block holding an Edit action and a grade label
    pub fn student_cards(&self) -> Locator {
        Locator::tag("div")
            .filter_has(&Locator::tag_with_text("button", "Edit"))
            .filter_text(TextMatch::pattern(GRADE_PATTERN))
    }

    pub fn find_student_card(&self, name: &str) -> Locator {
        self.student_cards()
            .filter_text(TextMatch::contains(name))
            .first()
    }

    pub async fn verify_student_present(&self, name: &str) -> WorkflowResult<()> {
        self.session.expect_visible(&self.find_student_card(name)).await
    }

    async fn badge_text(&self) -> WorkflowResult<String> {
        self.session.read_text(&self.count_badge).await
    }

    /// Count shown on the roster badge. A count that cannot be parsed reads as 0.
    pub async fn student_count(&self) -> WorkflowResult<u32> {
        let badge = self.badge_text().await?;
        Ok(parse_badge_count(&badge).unwrap_or_else(|| {
            tracing::warn!(%badge, "student badge count unreadable, reading as 0");
            0
        }))
    }

    /// Like [`Self::student_count`] but a digit-less badge is an error
    pub async fn student_count_strict(&self) -> WorkflowResult<u32> {
        let badge = self.badge_text().await?;
        parse_badge_count(&badge).ok_or_else(|| {
            WorkflowError::DataShape(format!("student badge {badge:?} has no readable count"))
        })
    }

    pub async fn open_student_form(&self) -> WorkflowResult<()> {
        self.session.click(&self.add_student_button).await?;
        self.dialog.wait_open(&self.session).await
    }

    /// Address is a single-line input, not a textarea
    pub fn address_input(&self) -> Locator {
        self.dialog.input("Full address")
    }

    async fn fill_form(&self, student: &StudentRecord) -> WorkflowResult<()> {
        let d = &self.dialog;
        let required = [
            (Control::Text(d.input("Enter full name")), Some(&student.name)),
            (Control::Text(d.input("student@email.com")), Some(&student.email)),
            (Control::Dropdown(d.combobox(0)), Some(&student.grade)),
        ];
        let optional = [
            (Control::Text(d.input("(555) 123-4567")), student.phone.as_ref()),
            (Control::Text(self.address_input()), student.address.as_ref()),
            (Control::Text(d.input("Parent/Guardian name")), student.parent_name.as_ref()),
            (Control::Text(d.input("parent@email.com")), student.parent_email.as_ref()),
        ];
        for (control, value) in required.iter().chain(optional.iter()) {
            if let Some(value) = value {
                set_control(&self.session, control, value, FillMode::Replace).await?;
            }
        }
        self.session.click(&self.dialog.button("Add Student")).await
    }

    /// Enrol a student and wait for the dialog to close
    pub async fn add_student(&self, student: &StudentRecord) -> WorkflowResult<()> {
        tracing::info!(name = %student.name, "adding student");
        self.open_student_form().await?;
        self.fill_form(student).await?;
        self.dialog.wait_closed(&self.session).await
    }

    /// Submit input the form must refuse and wait for its validation message.
    /// The dialog has to stay open.
    pub async fn add_student_rejected(&self, invalid: &InvalidStudent) -> WorkflowResult<()> {
        tracing::info!(expected = %invalid.expected_error, "submitting invalid student");
        self.open_student_form().await?;
        self.fill_form(&invalid.record).await?;
        let message = self
            .dialog
            .within(&Locator::text(TextMatch::contains(&invalid.expected_error)));
        self.session.expect_visible(&message).await?;
        if self.dialog.is_open(&self.session).await? {
            Ok(())
        } else {
            Err(WorkflowError::assertion(
                "student dialog",
                "open after rejected submit",
                "closed",
            ))
        }
    }

    /// Filter the roster; the list is given a settle delay to re-filter
    pub async fn search(&self, term: &str) -> WorkflowResult<()> {
        self.session.fill(&self.search_input, term).await?;
        let delay = self.session.config().settle.search();
        self.session.settle(delay, "roster filter").await;
        Ok(())
    }

    /// Names of the visible cards in DOM order, one per card
    pub async fn all_visible_names(&self) -> WorkflowResult<Vec<String>> {
        let cards = self.student_cards();
        let total = self.session.driver().count(&cards).await?;
        let mut names = Vec::with_capacity(total);
        for i in 0..total {
            let name = cards
                .nth(i)
                .locator(&Locator::text(TextMatch::pattern(NAME_PATTERN)))
                .first();
            if let Some(text) = self.session.driver().text_content(&name).await? {
                names.push(text.trim().to_string());
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl<D: Driver> Workflow for StudentWorkflow<D> {
    type Record = StudentRecord;

    async fn navigate(&self) -> WorkflowResult<()> {
        StudentWorkflow::navigate(self).await
    }

    fn entity(&self, label: &str) -> Locator {
        self.find_student_card(label)
    }

    async fn open_creation_form(&self) -> WorkflowResult<()> {
        self.open_student_form().await
    }

    /// Opens the form itself, like [`StudentWorkflow::add_student`]
    async fn fill_and_submit(&self, record: &StudentRecord) -> WorkflowResult<()> {
        self.add_student(record).await?;
        self.session.settle_refresh().await;
        Ok(())
    }

    async fn verify_present(&self, label: &str) -> WorkflowResult<()> {
        self.verify_student_present(label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHarmonyHub;
    use chrono::NaiveDate;

    fn workflow() -> StudentWorkflow<FakeHarmonyHub> {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
        StudentWorkflow::new(FakeHarmonyHub::new(today), Arc::new(RunConfig::offline()))
    }

    #[test]
    fn badge_count_parsing() {
        assert_eq!(parse_badge_count("12 Students"), Some(12));
        assert_eq!(parse_badge_count("  3 Students "), Some(3));
        assert_eq!(parse_badge_count("Total: 7 Students"), Some(7));
        assert_eq!(parse_badge_count("Students"), None);
        assert_eq!(parse_badge_count(""), None);
        assert_eq!(parse_badge_count("99999999999 Students"), None);
    }

    #[tokio::test]
    async fn address_is_written_to_a_single_line_input() {
        let wf = workflow();
        insta::assert_snapshot!(
            wf.address_input().selector(),
            @r#"div[role="dialog"] >> input[placeholder*="Full address"]"#
        );
        wf.navigate().await.expect("navigate");
        wf.open_student_form().await.expect("open");
        let driver = wf.session().driver();
        assert_eq!(driver.count(&wf.address_input()).await.expect("count"), 1);
        let textarea = wf.dialog().textarea("Full address");
        assert_eq!(driver.count(&textarea).await.expect("count"), 0);
    }

    #[test]
    fn badge_locator_requires_a_count() {
        let wf = workflow();
        insta::assert_snapshot!(
            wf.count_badge.selector(),
            @r#"internal:text=/\d+ Students/"#
        );
        assert!(TextMatch::pattern(BADGE_PATTERN).matches("12 Students"));
        assert!(!TextMatch::pattern(BADGE_PATTERN).matches("Students"));
    }

    #[test]
    fn card_selectors() {
        let wf = workflow();
        insta::assert_snapshot!(
            wf.find_student_card("Emma Johnson").selector(),
            @r#"div >> internal:has="button >> internal:has-text=\"Edit\"i" >> internal:has-text=/Grade \d+/ >> internal:has-text="Emma Johnson"i >> nth=0"#
        );
    }

    #[tokio::test]
    async fn roster_starts_with_seeded_students() {
        let wf = workflow();
        wf.navigate().await.expect("navigate");
        assert_eq!(wf.student_count().await.expect("count"), 3);
        assert_eq!(
            wf.all_visible_names().await.expect("names"),
            ["Emma Johnson", "Michael Chen", "Sofia Rodriguez"]
        );
    }

    #[tokio::test]
    async fn unreadable_badge_count_reads_as_zero_unless_strict() {
        let wf = workflow();
        wf.session().driver().set_badge_override("99999999999 Students");
        wf.navigate().await.expect("navigate");
        assert_eq!(wf.student_count().await.expect("count"), 0);
        let err = wf.student_count_strict().await.expect_err("strict");
        assert!(matches!(err, WorkflowError::DataShape(_)), "{err}");
    }
}
