//! Schedule fixture table: events to create, edit deltas, and the
//! categorical values offered by the event form.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::dates::format_clock_time;

/// An event as entered through the "Schedule New Event" form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Required; the label cards are located by
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EventRecord {
    /// An event with only the required title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: None,
            subject: None,
            start_time: None,
            end_time: None,
            location: None,
            attendees: None,
            description: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_times(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self.end_time = Some(end.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_attendees(mut self, attendees: u32) -> Self {
        self.attendees = Some(attendees);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The optional part of the record, for form filling
    pub fn optional_fields(&self) -> EventFields {
        EventFields {
            title: None,
            ..EventFields::from(self)
        }
    }
}

/// A partial event; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&EventRecord> for EventFields {
    fn from(record: &EventRecord) -> Self {
        Self {
            title: Some(record.title.clone()),
            kind: record.kind.clone(),
            subject: record.subject.clone(),
            start_time: record.start_time.clone(),
            end_time: record.end_time.clone(),
            location: record.location.clone(),
            attendees: record.attendees,
            description: record.description.clone(),
        }
    }
}

impl EventFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Derive the record that results from applying this delta to `original`
    pub fn apply_to(&self, original: &EventRecord) -> EventRecord {
        EventRecord {
            title: self.title.clone().unwrap_or_else(|| original.title.clone()),
            kind: self.kind.clone().or_else(|| original.kind.clone()),
            subject: self.subject.clone().or_else(|| original.subject.clone()),
            start_time: self.start_time.clone().or_else(|| original.start_time.clone()),
            end_time: self.end_time.clone().or_else(|| original.end_time.clone()),
            location: self.location.clone().or_else(|| original.location.clone()),
            attendees: self.attendees.or(original.attendees),
            description: self
                .description
                .clone()
                .or_else(|| original.description.clone()),
        }
    }
}

/// Edit delta keyed by the title of the event it modifies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub original_title: String,
    pub new_data: EventFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFixtures {
    pub new_events: Vec<EventRecord>,
    pub event_updates: Vec<EventUpdate>,
    pub event_types: Vec<String>,
    pub subjects: Vec<String>,
    pub time_slots: Vec<String>,
}

static SCHEDULE: LazyLock<ScheduleFixtures> = LazyLock::new(ScheduleFixtures::build);

/// The process-wide schedule table
pub fn schedule() -> &'static ScheduleFixtures {
    &SCHEDULE
}

impl ScheduleFixtures {
    fn build() -> Self {
        let new_events = vec![
            EventRecord::new("Advanced Mathematics")
                .with_kind("Class")
                .with_subject("Mathematics")
                .with_times("09:00", "10:00")
                .with_location("Room B-204")
                .with_attendees(32)
                .with_description(
                    "Grade 11 & 12 Advanced Mathematics lecture covering calculus fundamentals.",
                ),
            EventRecord::new("Chemistry Lab Session")
                .with_kind("Event")
                .with_subject("General")
                .with_times("10:00", "12:00")
                .with_location("Science Lab 1")
                .with_attendees(24)
                .with_description("Hands-on chemistry experiments for Grade 10 students."),
            EventRecord::new("Parent-Teacher Conference")
                .with_kind("Meeting")
                .with_subject("General")
                .with_times("14:00", "15:00")
                .with_location("Conference Room A")
                .with_attendees(15)
                .with_description("Quarterly parent-teacher meetings to discuss student progress."),
            EventRecord::new("Faculty Meeting")
                .with_kind("Meeting")
                .with_subject("Administrative")
                .with_times("15:00", "16:00")
                .with_location("Main Conference Room")
                .with_attendees(25)
                .with_description(
                    "Monthly faculty meeting to discuss curriculum updates and policies.",
                ),
        ];

        let event_updates = vec![
            EventUpdate {
                original_title: "Advanced Mathematics".to_string(),
                new_data: EventFields {
                    title: Some("Advanced Mathematics - Review Session".to_string()),
                    location: Some("Room B-205".to_string()),
                    attendees: Some(35),
                    description: Some(
                        "Extended review session covering all topics from this semester."
                            .to_string(),
                    ),
                    ..EventFields::default()
                },
            },
            EventUpdate {
                original_title: "Chemistry Lab Session".to_string(),
                new_data: EventFields {
                    start_time: Some("11:00".to_string()),
                    end_time: Some("12:00".to_string()),
                    location: Some("Science Lab 2".to_string()),
                    description: Some(
                        "Rescheduled chemistry lab with updated experiments.".to_string(),
                    ),
                    ..EventFields::default()
                },
            },
        ];

        let to_strings =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };

        Self {
            new_events,
            event_updates,
            event_types: to_strings(&["Class", "Lab", "Meeting", "Event", "Exam", "Activity"]),
            subjects: to_strings(&[
                "Mathematics",
                "Science",
                "English",
                "History",
                "Physical Education",
                "Art",
                "Music",
                "General",
                "Administrative",
            ]),
            // 08:00 through 17:00 in 30 minute steps
            time_slots: (16..=34)
                .map(|half_hours| format_clock_time(half_hours / 2, (half_hours % 2) * 30))
                .collect(),
        }
    }

    /// Look up a creatable event by title
    pub fn event(&self, title: &str) -> Option<&EventRecord> {
        self.new_events.iter().find(|e| e.title == title)
    }

    /// Look up the edit delta for an event title
    pub fn update_for(&self, original_title: &str) -> Option<&EventUpdate> {
        self.event_updates
            .iter()
            .find(|u| u.original_title == original_title)
    }
}
