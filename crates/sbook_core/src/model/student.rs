//! Student entity and roster ordering.
//!
//! # Responsibility
//! - Define the enrolled student record persisted under a subject.
//! - Define the ordered roster view used for array-index alignment.
//!
//! # Invariants
//! - `card_number` is the only cross-session join key.
//! - Roster order is ascending numeric card number; non-numeric card numbers
//!   sort after every numeric one, lexicographically among themselves.
//! - Index alignment derived from a `Roster` is valid for one session only.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Accepted values for `Student::standard`.
pub const STANDARDS: &[&str] = &[
    "Mini KG", "Jr KG", "Sr KG", "Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "Grade 6",
    "Grade 7", "Grade 8", "Grade 9", "Grade 10",
];

/// Accepted values for `Student::gender`.
pub const GENDERS: &[&str] = &["Male", "Female", "Other"];

/// One enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Numeric-string card number; also the entity document id.
    #[serde(rename = "identifier", default)]
    pub card_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub standard: String,
    /// Unix epoch milliseconds. Store timestamps are normalized to millis when
    /// the roster is read; absent for records written by older clients.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Student {
    /// Creates a student with only identity and display name set.
    pub fn new(card_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
            name: name.into(),
            phone: String::new(),
            gender: String::new(),
            standard: String::new(),
            created_at: None,
        }
    }

    /// Numeric value of the card number, when it has one.
    pub fn numeric_card(&self) -> Option<u128> {
        self.card_number.trim().parse::<u128>().ok()
    }
}

/// Total order used for roster alignment.
pub fn roster_order(a: &Student, b: &Student) -> Ordering {
    match (a.numeric_card(), b.numeric_card()) {
        (Some(left), Some(right)) => left
            .cmp(&right)
            .then_with(|| a.card_number.cmp(&b.card_number)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.card_number.cmp(&b.card_number),
    }
}

/// Ordered set of students for one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    /// Builds a roster, sorting into alignment order.
    pub fn from_students(mut students: Vec<Student>) -> Self {
        students.sort_by(roster_order);
        Self { students }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Student> {
        self.students.get(index)
    }

    /// Index of `card_number` in the current alignment.
    pub fn position(&self, card_number: &str) -> Option<usize> {
        self.students
            .iter()
            .position(|student| student.card_number == card_number)
    }

    pub fn contains(&self, card_number: &str) -> bool {
        self.position(card_number).is_some()
    }

    /// Card numbers in alignment order.
    pub fn card_numbers(&self) -> impl Iterator<Item = &str> {
        self.students
            .iter()
            .map(|student| student.card_number.as_str())
    }
}
