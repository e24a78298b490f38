//! Class Schedule screen: calendar, day panel, and the event dialog.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::config::RunConfig;
use crate::dates;
use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::expect::ensure_contains;
use crate::fixtures::{EventFields, EventRecord};
use crate::locator::{ElementQuery, Locator, TextMatch};
use crate::pages::form::{Control, Dialog, FillMode, set_control};
use crate::pages::{Session, Workflow};

pub const PATH: &str = "/schedule";
pub const TITLE: &str = "Class Schedule";
pub const SUBTITLE: &str = "Manage your daily schedule and events";
/// Class the calendar puts on leading/trailing cells of neighbouring months
pub const OUTSIDE_DAY_CLASS: &str = "day-outside";

/// Commit labels of the edit dialog, in resolution order
const EDIT_COMMIT_LABELS: [&str; 2] = ["Save", "Update"];

/// Event form fields in fill order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Title,
    Type,
    Subject,
    StartTime,
    EndTime,
    Location,
    Attendees,
    Description,
}

impl EventFields {
    /// Present fields with their rendered values, in fill order
    pub fn entries(&self) -> Vec<(EventField, String)> {
        let attendees = self.attendees.map(|n| n.to_string());
        [
            (EventField::Title, self.title.as_ref()),
            (EventField::Type, self.kind.as_ref()),
            (EventField::Subject, self.subject.as_ref()),
            (EventField::StartTime, self.start_time.as_ref()),
            (EventField::EndTime, self.end_time.as_ref()),
            (EventField::Location, self.location.as_ref()),
            (EventField::Attendees, attendees.as_ref()),
            (EventField::Description, self.description.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v.clone())))
        .collect()
    }
}

/// Workflow over the Class Schedule screen
pub struct ScheduleWorkflow<D> {
    session: Session<D>,
    pinned_today: Option<NaiveDate>,
    title: Locator,
    subtitle: Locator,
    add_event_button: Locator,
    month_year: Locator,
    previous_month_button: Locator,
    next_month_button: Locator,
    header: Locator,
    empty_message: Locator,
    empty_subtext: Locator,
    dialog: Dialog,
    schedule_button: Locator,
}

impl<D: Driver> ScheduleWorkflow<D> {
    pub fn new(driver: D, config: Arc<RunConfig>) -> Self {
        let dialog = Dialog::new();
        Self {
            session: Session::new(driver, config),
            pinned_today: None,
            title: Locator::tag_with_text("h1", TITLE),
            subtitle: Locator::text(TextMatch::contains(SUBTITLE)),
            add_event_button: Locator::tag_with_text("button", "Add Event"),
            month_year: Locator::text(TextMatch::pattern(r"^[A-Z][a-z]+ \d{4}$")),
            previous_month_button: Locator::element(
                ElementQuery::tag("button").attr("hint", "Go to previous month"),
            ),
            next_month_button: Locator::element(
                ElementQuery::tag("button").attr("hint", "Go to next month"),
            ),
            header: Locator::text(TextMatch::pattern("^Schedule for")),
            empty_message: Locator::text(TextMatch::contains("No events scheduled")),
            empty_subtext: Locator::text(TextMatch::contains("Add an event to get started.")),
            schedule_button: dialog.button("Schedule Event"),
            dialog,
        }
    }

    /// Use a fixed date as "today" instead of the machine clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }

    pub fn today(&self) -> NaiveDate {
        self.pinned_today.unwrap_or_else(dates::today)
    }

    pub fn title_locator(&self) -> &Locator {
        &self.title
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

    /// Calendar cell labelled exactly `day`. Cells of the neighbouring
    /// months repeat the same numbers and are excluded.
    pub fn day_cell(&self, day: u32) -> Locator {
        Locator::element(
            ElementQuery::tag("button")
                .role("gridcell")
                .without_class(OUTSIDE_DAY_CLASS),
        )
        .filter_text(TextMatch::pattern(format!("^{day}$")))
    }

    pub fn today_cell(&self) -> Locator {
        self.day_cell(self.today().day())
    }

    /// Select a day; the schedule panel is given a settle delay to re-render
    pub async fn click_day(&self, day: u32) -> WorkflowResult<()> {
        self.session.click(&self.day_cell(day)).await?;
        let delay = self.session.config().settle.day_select();
        self.session.settle(delay, "schedule panel re-render").await;
        Ok(())
    }

    pub async fn click_today(&self) -> WorkflowResult<()> {
        self.click_day(self.today().day()).await
    }

    pub async fn schedule_header_text(&self) -> WorkflowResult<String> {
        self.session.read_text(&self.header).await
    }

    /// The header names today's date (prefix text tolerated)
    pub async fn verify_todays_date(&self) -> WorkflowResult<()> {
        let header = self.schedule_header_text().await?;
        let today = self.today();
        if dates::header_contains_date(&header, today) {
            return Ok(());
        }
        ensure_contains("schedule header", &header, &dates::format_long_date(today))
    }

    /// Calendar caption, e.g. "October 2026"
    pub async fn month_year(&self) -> WorkflowResult<String> {
        self.session.read_text(&self.month_year).await
    }

    pub async fn previous_month(&self) -> WorkflowResult<()> {
        self.session.click(&self.previous_month_button).await
    }

    pub async fn next_month(&self) -> WorkflowResult<()> {
        self.session.click(&self.next_month_button).await
    }

    pub async fn open_event_form(&self) -> WorkflowResult<()> {
        self.session.click(&self.add_event_button).await?;
        self.dialog.wait_open(&self.session).await
    }

    fn control(&self, field: EventField) -> Control {
        match field {
            EventField::Title => Control::Text(self.dialog.input("event title")),
            EventField::Type => Control::Dropdown(self.dialog.combobox(0)),
            EventField::Subject => Control::Dropdown(self.dialog.combobox(1)),
            EventField::StartTime => Control::Dropdown(self.dialog.combobox(2)),
            EventField::EndTime => Control::Dropdown(self.dialog.combobox(3)),
            EventField::Location => Control::Text(self.dialog.input("Room number")),
            EventField::Attendees => Control::Number(self.dialog.number_input()),
            EventField::Description => Control::Text(self.dialog.textarea("Additional details")),
        }
    }

    /// Create an event. Absent optional fields keep the form defaults; the
    /// form is opened first unless it already is.
    pub async fn submit_event(&self, event: &EventRecord) -> WorkflowResult<()> {
        Self::validate(event)?;
        tracing::info!(title = %event.title, "creating event");
        if !self.dialog.is_open(&self.session).await? {
            self.open_event_form().await?;
        }
        let title = self.control(EventField::Title);
        set_control(&self.session, &title, &event.title, FillMode::Replace).await?;
        for (field, value) in event.optional_fields().entries() {
            set_control(&self.session, &self.control(field), &value, FillMode::Replace).await?;
        }
        self.session.click(&self.schedule_button).await?;
        self.dialog.wait_closed(&self.session).await
    }

    /// Card of the event titled exactly `title`; the first one if several
    pub fn find_event_card(&self, title: &str) -> Locator {
        Locator::tag("div")
            .filter_has(&Locator::tag("h4").filter_text(TextMatch::exact(title)))
            .first()
    }

    pub async fn verify_event_present(&self, title: &str) -> WorkflowResult<()> {
        self.session.expect_visible(&self.find_event_card(title)).await
    }

    pub async fn verify_event_card_contains(&self, title: &str, text: &str) -> WorkflowResult<()> {
        self.session
            .expect_contains_text(&self.find_event_card(title), text)
            .await
    }

    /// Open the edit dialog of an event. The edit action is taken to be the
    /// first button of the card.
    pub async fn open_edit_form(&self, title: &str) -> WorkflowResult<()> {
        let edit = self.find_event_card(title).locator(&Locator::tag("button")).first();
        self.session.click(&edit).await?;
        self.dialog.wait_open(&self.session).await
    }

    /// Apply `changes` to an existing event. Text and number fields are
    /// cleared before being refilled.
    pub async fn update_event(&self, title: &str, changes: &EventFields) -> WorkflowResult<()> {
        tracing::info!(%title, "editing event");
        self.open_edit_form(title).await?;
        for (field, value) in changes.entries() {
            let control = self.control(field);
            set_control(&self.session, &control, &value, FillMode::ClearThenFill).await?;
        }
        self.dialog
            .commit_with(&self.session, &EDIT_COMMIT_LABELS)
            .await?;
        self.dialog.wait_closed(&self.session).await
    }

    pub async fn verify_empty_state(&self) -> WorkflowResult<()> {
        self.session.expect_visible(&self.empty_message).await?;
        self.session.expect_visible(&self.empty_subtext).await
    }

    /// Number of event cards whose title is exactly `title`
    pub async fn event_count(&self, title: &str) -> WorkflowResult<usize> {
        let cards = Locator::tag("div")
            .filter_has(&Locator::tag("h4").filter_text(TextMatch::exact(title)));
        self.session.driver().count(&cards).await
    }
}

#[async_trait]
impl<D: Driver> Workflow for ScheduleWorkflow<D> {
    type Record = EventRecord;

    async fn navigate(&self) -> WorkflowResult<()> {
        ScheduleWorkflow::navigate(self).await
    }

    fn entity(&self, label: &str) -> Locator {
        self.find_event_card(label)
    }

    async fn open_creation_form(&self) -> WorkflowResult<()> {
        self.open_event_form().await
    }

    async fn fill_and_submit(&self, record: &EventRecord) -> WorkflowResult<()> {
        self.submit_event(record).await?;
        self.session.settle_refresh().await;
        Ok(())
    }

    async fn verify_present(&self, label: &str) -> WorkflowResult<()> {
        self.verify_event_present(label).await
    }
}

impl<D: Driver> ScheduleWorkflow<D> {
    /// Reject records the form cannot accept before touching the page
    pub fn validate(event: &EventRecord) -> WorkflowResult<()> {
        if event.title.trim().is_empty() {
            return Err(WorkflowError::DataShape("event title is empty".to_string()));
        }
        Ok(())
    }
}
