//! Scripted replica of the Harmony Hub screens
//!
//! Every driver call re-renders the current screen from [`AppState`] into a
//! [`Dom`] and resolves the locator against it, so workflows see fresh DOM
//! on each access exactly as with a live page. Single-element operations
//! are strict and clicks on hidden elements fail.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Datelike, Days, Months, NaiveDate};

use crate::dates;
use crate::driver::Driver;
use crate::error::{WorkflowError, WorkflowResult};
use crate::fixtures::{EventRecord, StudentRecord, schedule, students};
use crate::locator::Locator;
use crate::testing::dom::{Dom, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Schedule,
    Students,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    NewEvent,
    EditEvent(usize),
    NewStudent,
}

#[derive(Debug)]
struct FormState {
    kind: FormKind,
    values: BTreeMap<String, String>,
    open_dropdown: Option<String>,
    error: Option<String>,
}

impl FormState {
    fn new(kind: FormKind, values: BTreeMap<String, String>) -> Self {
        Self {
            kind,
            values,
            open_dropdown: None,
            error: None,
        }
    }

    fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    fn optional(&self, field: &str) -> Option<String> {
        Some(self.value(field).trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
struct StoredEvent {
    date: NaiveDate,
    record: EventRecord,
}

#[derive(Debug)]
struct AppState {
    today: NaiveDate,
    screen: Screen,
    broken_routes: Vec<String>,
    selected: NaiveDate,
    shown_month: NaiveDate,
    events: Vec<StoredEvent>,
    students: Vec<StudentRecord>,
    badge_override: Option<String>,
    search: String,
    form: Option<FormState>,
    actions: Vec<String>,
}

/// In-memory Harmony Hub implementing [`Driver`]; clones share one context
#[derive(Debug, Clone)]
pub struct FakeHarmonyHub {
    state: Arc<Mutex<AppState>>,
}

impl FakeHarmonyHub {
    /// A fresh context whose clock reads `today`, seeded with the enrolled
    /// students
    pub fn new(today: NaiveDate) -> Self {
        let state = AppState {
            today,
            screen: Screen::Blank,
            broken_routes: Vec::new(),
            selected: today,
            shown_month: first_of_month(today),
            events: Vec::new(),
            students: students().existing_students.clone(),
            badge_override: None,
            search: String::new(),
            form: None,
            actions: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Paths ending with `suffix` render a blank page
    pub fn set_broken_route(&self, suffix: &str) {
        self.lock().broken_routes.push(suffix.to_string());
    }

    /// Render the roster badge with this text instead of the count
    pub fn set_badge_override(&self, text: &str) {
        self.lock().badge_override = Some(text.to_string());
    }

    /// Place an event on a day without going through the form
    pub fn seed_event(&self, date: NaiveDate, record: EventRecord) {
        self.lock().events.push(StoredEvent { date, record });
    }

    /// Events stored on `date`, in creation order
    pub fn events_on(&self, date: NaiveDate) -> Vec<EventRecord> {
        self.lock()
            .events
            .iter()
            .filter(|e| e.date == date)
            .map(|e| e.record.clone())
            .collect()
    }

    pub fn student_names(&self) -> Vec<String> {
        self.lock().students.iter().map(|s| s.name.clone()).collect()
    }

    /// Bindings triggered so far, e.g. `click commit` or `fill field:title`
    pub fn actions(&self) -> Vec<String> {
        self.lock().actions.clone()
    }

    fn single(dom: &Dom, locator: &Locator) -> WorkflowResult<usize> {
        match dom.query(locator).as_slice() {
            [index] => Ok(*index),
            [] => Err(WorkflowError::Driver(format!(
                "no element matches `{locator}`"
            ))),
            many => Err(WorkflowError::Driver(format!(
                "strict mode violation: `{locator}` resolved to {} elements",
                many.len()
            ))),
        }
    }
}

#[async_trait]
impl Driver for FakeHarmonyHub {
    async fn goto(&self, url: &str) -> WorkflowResult<()> {
        let mut state = self.lock();
        let path = url.split(['?', '#']).next().unwrap_or(url).trim_end_matches('/');
        let broken = state.broken_routes.iter().any(|r| path.ends_with(r.as_str()));
        state.screen = if broken {
            Screen::Blank
        } else if path.ends_with("/schedule") {
            Screen::Schedule
        } else if path.ends_with("/students") {
            Screen::Students
        } else {
            Screen::Blank
        };
        state.selected = state.today;
        state.shown_month = first_of_month(state.today);
        state.search.clear();
        state.form = None;
        state.actions.push(format!("goto {url}"));
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> WorkflowResult<usize> {
        let state = self.lock();
        Ok(state.render().query(locator).len())
    }

    async fn is_visible(&self, locator: &Locator) -> WorkflowResult<bool> {
        let state = self.lock();
        let dom = state.render();
        if dom.query(locator).is_empty() {
            return Ok(false);
        }
        let index = Self::single(&dom, locator)?;
        Ok(dom.is_visible(index))
    }

    async fn text_content(&self, locator: &Locator) -> WorkflowResult<Option<String>> {
        let state = self.lock();
        let dom = state.render();
        let index = Self::single(&dom, locator)?;
        Ok(Some(dom.text(index)))
    }

    async fn click(&self, locator: &Locator) -> WorkflowResult<()> {
        let mut state = self.lock();
        let binding = {
            let dom = state.render();
            let index = Self::single(&dom, locator)?;
            if !dom.is_visible(index) {
                return Err(WorkflowError::Driver(format!(
                    "element `{locator}` is not visible"
                )));
            }
            dom.binding(index).map(str::to_string)
        };
        match binding {
            Some(binding) => {
                state.actions.push(format!("click {binding}"));
                state.dispatch(&binding)
            }
            None => Ok(()),
        }
    }

    async fn fill(&self, locator: &Locator, value: &str) -> WorkflowResult<()> {
        let mut state = self.lock();
        let binding = {
            let dom = state.render();
            let index = Self::single(&dom, locator)?;
            if !dom.is_visible(index) || !matches!(dom.tag(index), "input" | "textarea") {
                return Err(WorkflowError::Driver(format!(
                    "element `{locator}` is not an editable input"
                )));
            }
            dom.binding(index).map(str::to_string)
        };
        state.actions.push(format!(
            "fill {}",
            binding.as_deref().unwrap_or("<unbound>")
        ));
        match binding.as_deref() {
            Some("search") => state.search = value.to_string(),
            Some(field) => {
                let name = field.strip_prefix("field:").unwrap_or(field);
                if let Some(form) = state.form.as_mut() {
                    form.values.insert(name.to_string(), value.to_string());
                }
            }
            None => {}
        }
        Ok(())
    }
}

impl AppState {
    fn dispatch(&mut self, binding: &str) -> WorkflowResult<()> {
        let (action, arg) = binding.split_once(':').unwrap_or((binding, ""));
        match action {
            "day" => {
                let date = NaiveDate::parse_from_str(arg, "%Y-%m-%d")
                    .map_err(|e| WorkflowError::Driver(format!("bad day binding {arg}: {e}")))?;
                self.selected = date;
                self.shown_month = first_of_month(date);
            }
            "nav" => {
                self.shown_month = match arg {
                    "prev-month" => self.shown_month - Months::new(1),
                    _ => self.shown_month + Months::new(1),
                };
            }
            "open" => {
                let kind = match arg {
                    "event" => FormKind::NewEvent,
                    _ => FormKind::NewStudent,
                };
                let mut values = BTreeMap::new();
                if kind == FormKind::NewEvent {
                    values.insert("type".to_string(), "Class".to_string());
                    values.insert("startTime".to_string(), "09:00".to_string());
                    values.insert("endTime".to_string(), "10:00".to_string());
                }
                self.form = Some(FormState::new(kind, values));
            }
            "edit" => {
                let index: usize = arg
                    .parse()
                    .map_err(|_| WorkflowError::Driver(format!("bad edit binding {arg}")))?;
                let event = self
                    .events
                    .get(index)
                    .ok_or_else(|| WorkflowError::Driver(format!("no event {index}")))?;
                self.form = Some(FormState::new(
                    FormKind::EditEvent(index),
                    event_values(&event.record),
                ));
            }
            "delete" => {
                if let Ok(index) = arg.parse::<usize>() {
                    if index < self.events.len() {
                        self.events.remove(index);
                    }
                }
            }
            "dropdown" => {
                if let Some(form) = self.form.as_mut() {
                    form.open_dropdown = Some(arg.to_string());
                }
            }
            "option" => {
                let (field, value) = arg.split_once(':').unwrap_or((arg, ""));
                if let Some(form) = self.form.as_mut() {
                    form.values.insert(field.to_string(), value.to_string());
                    form.open_dropdown = None;
                }
            }
            "cancel" => self.form = None,
            "commit" => self.commit(),
            _ => {}
        }
        Ok(())
    }

    fn commit(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        form.open_dropdown = None;
        match form.kind {
            FormKind::NewEvent | FormKind::EditEvent(_) => {
                if form.value("title").trim().is_empty() {
                    form.error = Some("Title is required".to_string());
                    return;
                }
                let record = EventRecord {
                    title: form.value("title").trim().to_string(),
                    kind: form.optional("type"),
                    subject: form.optional("subject"),
                    start_time: form.optional("startTime"),
                    end_time: form.optional("endTime"),
                    location: form.optional("location"),
                    attendees: form.optional("attendees").and_then(|n| n.parse().ok()),
                    description: form.optional("description"),
                };
                match form.kind {
                    FormKind::EditEvent(index) => {
                        if let Some(stored) = self.events.get_mut(index) {
                            stored.record = record;
                        }
                    }
                    _ => self.events.push(StoredEvent {
                        date: self.selected,
                        record,
                    }),
                }
            }
            FormKind::NewStudent => {
                let error = if form.value("name").trim().is_empty() {
                    Some("Name is required")
                } else if !is_email(form.value("email")) {
                    Some("Invalid email format")
                } else if form.value("grade").is_empty() {
                    Some("Grade is required")
                } else {
                    None
                };
                if let Some(error) = error {
                    form.error = Some(error.to_string());
                    return;
                }
                let mut student = StudentRecord::new(
                    form.value("name").trim(),
                    form.value("email").trim(),
                    form.value("grade"),
                );
                student.phone = form.optional("phone");
                student.address = form.optional("address");
                student.parent_name = form.optional("parentName");
                student.parent_email = form.optional("parentEmail");
                self.students.push(student);
            }
        }
        self.form = None;
    }

    fn render(&self) -> Dom {
        let main = match self.screen {
            Screen::Blank => Node::new("main"),
            Screen::Schedule => self.render_schedule(),
            Screen::Students => self.render_students(),
        };
        let sidebar = (!matches!(self.screen, Screen::Blank)).then(|| {
            Node::new("nav")
                .attr("aria-label", "Main")
                .child(Node::new("a").attr("href", "/schedule").text("Schedule"))
                .child(Node::new("a").attr("href", "/students").text("Students"))
        });
        let body = Node::new("body")
            .maybe_child(sidebar)
            .child(main)
            .maybe_child(self.form.as_ref().map(|form| self.render_form(form)))
            .maybe_child(self.form.as_ref().and_then(render_listbox));
        Dom::new(body)
    }

    fn render_schedule(&self) -> Node {
        let header = Node::new("header")
            .child(Node::new("h1").text("Class Schedule"))
            .child(Node::new("p").text("Manage your daily schedule and events"))
            .child(Node::new("button").text("Add Event").bind("open:event"));

        let caption = Node::new("nav")
            .child(
                Node::new("button")
                    .attr("hint", "Go to previous month")
                    .bind("nav:prev-month"),
            )
            .child(Node::new("span").text(dates::month_year_label(self.shown_month)))
            .child(
                Node::new("button")
                    .attr("hint", "Go to next month")
                    .bind("nav:next-month"),
            );

        let day_events: Vec<(usize, &StoredEvent)> = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.date == self.selected)
            .collect();
        let mut panel = Node::new("section").child(Node::new("h2").text(format!(
            "Schedule for {}",
            dates::format_long_date(self.selected)
        )));
        if day_events.is_empty() {
            panel = panel
                .child(Node::new("p").text("No events scheduled"))
                .child(Node::new("p").text("Add an event to get started."));
        } else {
            panel = panel.child(
                Node::new("ul").children(
                    day_events
                        .into_iter()
                        .map(|(i, e)| Node::new("li").child(event_card(i, &e.record))),
                ),
            );
        }

        Node::new("main")
            .child(header)
            .child(
                Node::new("section")
                    .child(caption)
                    .child(self.render_calendar()),
            )
            .child(panel)
    }

    fn render_calendar(&self) -> Node {
        let first = self.shown_month;
        let leading = u64::from(first.weekday().num_days_from_sunday());
        let start = first - Days::new(leading);
        let next_month = first + Months::new(1);
        let mut rows = Vec::new();
        let mut day = start;
        while day < next_month {
            let cells = (0..7u64).map(|offset| {
                let date = day + Days::new(offset);
                let mut cell = Node::new("button")
                    .attr("role", "gridcell")
                    .class("day")
                    .text(date.day().to_string())
                    .bind(format!("day:{}", date.format("%Y-%m-%d")));
                if date.month() != first.month() {
                    cell = cell.class("day-outside");
                }
                if date == self.today {
                    cell = cell.class("day-today");
                }
                if date == self.selected {
                    cell = cell.attr("aria-selected", "true");
                }
                Node::new("td").child(cell)
            });
            rows.push(Node::new("tr").children(cells));
            day = day + Days::new(7);
        }
        Node::new("table").attr("role", "grid").children(rows)
    }

    fn render_students(&self) -> Node {
        let header = Node::new("header")
            .child(Node::new("h1").text("Student Management"))
            .child(Node::new("p").text("Manage your students and their information"))
            .child(Node::new("button").text("Add Student").bind("open:student"));

        let badge = self
            .badge_override
            .clone()
            .unwrap_or_else(|| format!("{} Students", self.students.len()));
        let toolbar = Node::new("section")
            .child(
                Node::new("input")
                    .attr("placeholder", "Search students...")
                    .attr("value", self.search.clone())
                    .bind("search"),
            )
            .child(Node::new("span").text(badge));

        let term = self.search.trim().to_lowercase();
        let visible: Vec<&StudentRecord> = self
            .students
            .iter()
            .filter(|s| {
                term.is_empty()
                    || s.name.to_lowercase().contains(&term)
                    || s.email.to_lowercase().contains(&term)
            })
            .collect();
        let roster = if visible.is_empty() {
            Node::new("section").child(Node::new("p").text("No students found"))
        } else {
            Node::new("section").child(
                Node::new("ul").children(
                    visible
                        .into_iter()
                        .map(|s| Node::new("li").child(student_card(s))),
                ),
            )
        };

        Node::new("main").child(header).child(toolbar).child(roster)
    }

    fn render_form(&self, form: &FormState) -> Node {
        let input = |placeholder: &str, field: &str| {
            Node::new("input")
                .attr("placeholder", placeholder)
                .attr("value", form.value(field))
                .bind(format!("field:{field}"))
        };
        let textarea = |placeholder: &str, field: &str| {
            Node::new("textarea")
                .attr("placeholder", placeholder)
                .attr("value", form.value(field))
                .bind(format!("field:{field}"))
        };
        let select = |field: &str, placeholder: &str| {
            let value = form.value(field);
            Node::new("button")
                .attr("role", "combobox")
                .text(if value.is_empty() { placeholder } else { value })
                .bind(format!("dropdown:{field}"))
        };
        let label = |text: &str| Node::new("label").text(text);

        let (title, fields, commit) = match form.kind {
            FormKind::NewEvent | FormKind::EditEvent(_) => {
                let editing = matches!(form.kind, FormKind::EditEvent(_));
                let fields = vec![
                    label("Event Title *"),
                    input("Enter event title", "title"),
                    label("Type"),
                    select("type", "Select type"),
                    label("Subject"),
                    select("subject", "Select subject"),
                    label("Start Time"),
                    select("startTime", "Start"),
                    label("End Time"),
                    select("endTime", "End"),
                    label("Location"),
                    input("Room number or location", "location"),
                    label("Expected Attendees"),
                    input("0", "attendees").attr("type", "number"),
                    label("Description"),
                    textarea("Additional details...", "description"),
                ];
                if editing {
                    ("Edit Event", fields, "Update Event")
                } else {
                    ("Schedule New Event", fields, "Schedule Event")
                }
            }
            FormKind::NewStudent => (
                "Add New Student",
                vec![
                    label("Full Name *"),
                    input("Enter full name", "name"),
                    label("Email *"),
                    input("student@email.com", "email"),
                    label("Grade *"),
                    select("grade", "Select grade"),
                    label("Phone"),
                    input("(555) 123-4567", "phone"),
                    label("Address"),
                    input("Full address", "address"),
                    label("Parent/Guardian Name"),
                    input("Parent/Guardian name", "parentName"),
                    label("Parent Email"),
                    input("parent@email.com", "parentEmail"),
                ],
                "Add Student",
            ),
        };

        Node::new("div")
            .attr("role", "dialog")
            .child(Node::new("h2").text(title))
            .child(Node::new("form").children(fields))
            .maybe_child(
                form.error
                    .as_ref()
                    .map(|e| Node::new("p").class("text-destructive").text(e.clone())),
            )
            .child(Node::new("button").text("Cancel").bind("cancel"))
            .child(Node::new("button").text(commit).bind("commit"))
    }
}

fn render_listbox(form: &FormState) -> Option<Node> {
    let field = form.open_dropdown.as_deref()?;
    let table = schedule();
    let options: &[String] = match field {
        "type" => &table.event_types,
        "subject" => &table.subjects,
        "startTime" | "endTime" => &table.time_slots,
        "grade" => &students().grades,
        _ => &[],
    };
    Some(
        Node::new("div").attr("role", "listbox").children(options.iter().map(|value| {
            Node::new("div")
                .attr("role", "option")
                .text(value.clone())
                .bind(format!("option:{field}:{value}"))
        })),
    )
}

fn event_card(index: usize, event: &EventRecord) -> Node {
    let times = match (&event.start_time, &event.end_time) {
        (Some(start), Some(end)) => Some(format!("{start} - {end}")),
        (Some(start), None) => Some(start.clone()),
        _ => None,
    };
    let p = |text: Option<String>| text.map(|t| Node::new("p").text(t));
    Node::new("div")
        .class("event-card")
        .child(Node::new("h4").text(event.title.clone()))
        .maybe_child(event.kind.clone().map(|k| Node::new("span").text(k)))
        .maybe_child(event.subject.clone().map(|s| Node::new("span").text(s)))
        .maybe_child(p(times))
        .maybe_child(p(event.location.clone()))
        .maybe_child(p(event.attendees.map(|n| format!("{n} attendees"))))
        .maybe_child(p(event.description.clone()))
        .child(Node::new("button").text("Edit").bind(format!("edit:{index}")))
        .child(Node::new("button").text("Delete").bind(format!("delete:{index}")))
}

fn student_card(student: &StudentRecord) -> Node {
    let p = |text: Option<String>| text.map(|t| Node::new("p").text(t));
    Node::new("div")
        .class("student-card")
        .child(Node::new("h3").text(student.name.clone()))
        .child(Node::new("span").text(student.grade.clone()))
        .child(Node::new("p").text(student.email.clone()))
        .maybe_child(p(student.phone.clone()))
        .maybe_child(p(student.address.clone()))
        .maybe_child(p(student.parent_name.as_ref().map(|n| format!("Parent: {n}"))))
        .maybe_child(p(student.enrolled_date.as_ref().map(|d| format!("Enrolled: {d}"))))
        .child(Node::new("button").text("Edit"))
        .child(Node::new("button").text("Delete"))
}

fn event_values(record: &EventRecord) -> BTreeMap<String, String> {
    let pairs = [
        ("title", Some(record.title.clone())),
        ("type", record.kind.clone()),
        ("subject", record.subject.clone()),
        ("startTime", record.start_time.clone()),
        ("endTime", record.end_time.clone()),
        ("location", record.location.clone()),
        ("attendees", record.attendees.map(|n| n.to_string())),
        ("description", record.description.clone()),
    ];
    pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect()
}

fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{ElementQuery, TextMatch};

    fn hub() -> FakeHarmonyHub {
        FakeHarmonyHub::new(NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"))
    }

    fn in_month_cells() -> Locator {
        Locator::element(
            ElementQuery::tag("button")
                .role("gridcell")
                .without_class("day-outside"),
        )
    }

    #[tokio::test]
    async fn calendar_pads_with_neighbouring_months() {
        let hub = hub();
        hub.goto("http://harmony.test/schedule").await.expect("goto");
        let all = Locator::element(ElementQuery::tag("button").role("gridcell"));
        // October 2026 starts on a Thursday and ends on a Saturday
        assert_eq!(hub.count(&all).await.expect("count"), 35);
        assert_eq!(hub.count(&in_month_cells()).await.expect("count"), 31);
        let ones = all.filter_text(TextMatch::pattern("^1$"));
        assert_eq!(hub.count(&ones).await.expect("count"), 1);
        let thirties = all.filter_text(TextMatch::pattern("^30$"));
        assert_eq!(hub.count(&thirties).await.expect("count"), 2);
    }

    #[tokio::test]
    async fn strict_mode_rejects_ambiguous_clicks() {
        let hub = hub();
        hub.goto("http://harmony.test/schedule").await.expect("goto");
        let err = hub
            .click(&Locator::tag("button"))
            .await
            .expect_err("ambiguous");
        assert!(err.to_string().contains("strict mode violation"), "{err}");
    }

    #[tokio::test]
    async fn unknown_route_renders_blank() {
        let hub = hub();
        hub.goto("http://harmony.test/reports").await.expect("goto");
        assert_eq!(hub.count(&Locator::tag("h1")).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn month_navigation_moves_caption() {
        let hub = hub();
        hub.goto("http://harmony.test/schedule").await.expect("goto");
        let caption = Locator::text(TextMatch::pattern(r"^[A-Z][a-z]+ \d{4}$"));
        let next = Locator::element(ElementQuery::tag("button").attr("hint", "Go to next month"));
        hub.click(&next).await.expect("next");
        hub.click(&next).await.expect("next");
        assert_eq!(
            hub.text_content(&caption).await.expect("caption").as_deref(),
            Some("December 2026")
        );
        hub.click(&next).await.expect("next");
        assert_eq!(
            hub.text_content(&caption).await.expect("caption").as_deref(),
            Some("January 2027")
        );
    }

    #[test]
    fn email_validation() {
        assert!(is_email("alex.thompson@email.com"));
        assert!(!is_email("not-an-email"));
        assert!(!is_email("@email.com"));
        assert!(!is_email("a@b."));
    }
}
