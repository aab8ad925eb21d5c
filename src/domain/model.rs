use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// A named block of lines inside a grade file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub lines: Vec<String>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    /// Renders the topic back into grade file syntax.
    pub fn render(&self) -> String {
        let mut out = format!("{}:\n", self.name);
        for line in &self.lines {
            if line.is_empty() || line.starts_with('\t') {
                out.push_str(line);
                out.push('\n');
            } else {
                out.push(' ');
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Achieved and possible points of one task, kept as exact decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Points {
    pub achieved: Decimal,
    pub total: Decimal,
}

impl Points {
    pub fn new(achieved: Decimal, total: Decimal) -> Self {
        Self { achieved, total }
    }
}

impl Points {
    /// `None` when either sum leaves the range of `Decimal`.
    pub fn checked_add(self, rhs: Points) -> Option<Points> {
        Some(Points {
            achieved: self.achieved.checked_add(rhs.achieved)?,
            total: self.total.checked_add(rhs.total)?,
        })
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.achieved, self.total)
    }
}

/// Roster entry for one nick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub first_name: String,
    pub last_name: String,
    pub mail_address: String,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// nick -> student, read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: BTreeMap<String, Student>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for `nick`.
    pub fn insert(&mut self, nick: impl Into<String>, student: Student) {
        self.students.insert(nick.into(), student);
    }

    pub fn get(&self, nick: &str) -> Option<&Student> {
        self.students.get(nick)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Student)> {
        self.students
            .iter()
            .map(|(nick, student)| (nick.as_str(), student))
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub nick: String,
    pub first_name: String,
    pub last_name: String,
    pub achieved: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A fully composed per-student message, independent of any mail library.
#[derive(Debug, Clone)]
pub struct Digest {
    pub from: Sender,
    pub to_name: String,
    pub to_address: String,
    pub date: DateTime<Utc>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}
