//! Student fixture table: students already enrolled, students to add, and
//! rejected inputs with the validation message the form shows for them.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub email: String,
    /// Display label such as "Grade 10"
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_email: Option<String>,
    /// Only known for students seeded by the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_date: Option<String>,
}

impl StudentRecord {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            grade: grade.into(),
            phone: None,
            address: None,
            parent_name: None,
            parent_email: None,
            enrolled_date: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_parent(mut self, name: impl Into<String>, email: Option<&str>) -> Self {
        self.parent_name = Some(name.into());
        self.parent_email = email.map(str::to_string);
        self
    }

    pub fn enrolled(mut self, date: impl Into<String>) -> Self {
        self.enrolled_date = Some(date.into());
        self
    }
}

/// Input the form must refuse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidStudent {
    #[serde(flatten)]
    pub record: StudentRecord,
    pub expected_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFixtures {
    pub existing_students: Vec<StudentRecord>,
    pub new_students: Vec<StudentRecord>,
    pub invalid_data: Vec<InvalidStudent>,
    pub grades: Vec<String>,
}

static STUDENTS: LazyLock<StudentFixtures> = LazyLock::new(StudentFixtures::build);

/// The process-wide student table
pub fn students() -> &'static StudentFixtures {
    &STUDENTS
}

impl StudentFixtures {
    fn build() -> Self {
        let existing_students = vec![
            StudentRecord::new("Emma Johnson", "emma.j@email.com", "Grade 10")
                .with_phone("(555) 123-4567")
                .with_address("123 Oak Street, Springfield")
                .with_parent("Sarah Johnson", None)
                .enrolled("8/15/2024"),
            StudentRecord::new("Michael Chen", "michael.c@email.com", "Grade 11")
                .with_phone("(555) 234-5678")
                .with_address("456 Maple Ave, Springfield")
                .with_parent("Lisa Chen", None)
                .enrolled("8/14/2024"),
            StudentRecord::new("Sofia Rodriguez", "sofia.r@email.com", "Grade 12")
                .with_phone("(555) 345-6789")
                .with_address("789 Pine Road, Springfield")
                .with_parent("Carlos Rodriguez", None)
                .enrolled("8/14/2024"),
        ];

        let new_students = vec![
            StudentRecord::new("Alex Thompson", "alex.thompson@email.com", "Grade 9")
                .with_phone("(555) 111-2222")
                .with_address("100 Elm Street, Springfield")
                .with_parent("Jennifer Thompson", Some("jennifer.t@email.com")),
            StudentRecord::new("Maya Patel", "maya.patel@email.com", "Grade 10")
                .with_phone("(555) 222-3333")
                .with_address("200 Cedar Lane, Springfield")
                .with_parent("Raj Patel", Some("raj.p@email.com")),
            StudentRecord::new("Jordan Williams", "jordan.w@email.com", "Grade 11")
                .with_phone("(555) 333-4444")
                .with_address("300 Birch Avenue, Springfield")
                .with_parent("Michelle Williams", Some("michelle.w@email.com")),
            StudentRecord::new("Zara Ahmed", "zara.ahmed@email.com", "Grade 12")
                .with_phone("(555) 444-5555")
                .with_address("400 Spruce Drive, Springfield")
                .with_parent("Hassan Ahmed", Some("hassan.a@email.com")),
        ];

        let invalid_data = vec![
            InvalidStudent {
                record: StudentRecord::new("", "invalid@email.com", "Grade 10"),
                expected_error: "Name is required".to_string(),
            },
            InvalidStudent {
                record: StudentRecord::new("Test Student", "not-an-email", "Grade 10"),
                expected_error: "Invalid email format".to_string(),
            },
        ];

        Self {
            existing_students,
            new_students,
            invalid_data,
            grades: (9..=12).map(|g| format!("Grade {g}")).collect(),
        }
    }

    /// Look up any known student by name
    pub fn find(&self, name: &str) -> Option<&StudentRecord> {
        self.existing_students
            .iter()
            .chain(&self.new_students)
            .find(|s| s.name == name)
    }
}
