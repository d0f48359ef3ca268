//! Student enrollment and profile edits.
//!
//! # Responsibility
//! - Validate student drafts before they reach storage.
//! - Reject duplicate card numbers and duplicate names within a subject.
//! - Suggest the next free card number and filter the roster for search.
//!
//! # Invariants
//! - Card numbers are digit-only; phones are exactly ten digits.
//! - Renaming a card number moves the entity document; dated records keep
//!   the old key.

use crate::identity::EffectiveIdentity;
use crate::model::student::{Roster, Student, GENDERS, STANDARDS};
use crate::repo::roster_repo::RosterRepository;
use crate::repo::RepoError;
use crate::store::DocumentStore;
use chrono::Utc;
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

static CARD_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("valid card number regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").expect("valid phone regex"));

/// Unvalidated student form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDraft {
    pub card_number: String,
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub standard: String,
}

#[derive(Debug)]
pub enum EnrollmentError {
    MissingField(&'static str),
    InvalidCardNumber(String),
    InvalidPhone,
    InvalidStandard(String),
    InvalidGender(String),
    DuplicateCardNumber(String),
    DuplicateName(String),
    StudentNotFound(String),
    Repo(RepoError),
}

impl Display for EnrollmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::InvalidCardNumber(value) => {
                write!(f, "card number must contain only digits: `{value}`")
            }
            Self::InvalidPhone => write!(f, "phone number must be exactly 10 digits"),
            Self::InvalidStandard(value) => write!(f, "unknown standard `{value}`"),
            Self::InvalidGender(value) => write!(f, "unknown gender `{value}`"),
            Self::DuplicateCardNumber(value) => {
                write!(f, "card number {value} is already assigned")
            }
            Self::DuplicateName(value) => write!(f, "a student named `{value}` already exists"),
            Self::StudentNotFound(value) => write!(f, "no student with card number {value}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EnrollmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EnrollmentError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Validates and trims a draft.
pub fn validate_draft(draft: &StudentDraft) -> Result<StudentDraft, EnrollmentError> {
    let card_number = required(&draft.card_number, "card number")?;
    let name = required(&draft.name, "name")?;
    let phone = required(&draft.phone, "phone")?;
    let gender = required(&draft.gender, "gender")?;
    let standard = required(&draft.standard, "standard")?;

    if !CARD_NUMBER_RE.is_match(&card_number) {
        return Err(EnrollmentError::InvalidCardNumber(card_number));
    }
    if !PHONE_RE.is_match(&phone) {
        return Err(EnrollmentError::InvalidPhone);
    }
    if !STANDARDS.contains(&standard.as_str()) {
        return Err(EnrollmentError::InvalidStandard(standard));
    }
    if !GENDERS.contains(&gender.as_str()) {
        return Err(EnrollmentError::InvalidGender(gender));
    }

    Ok(StudentDraft {
        card_number,
        name,
        phone,
        gender,
        standard,
    })
}

/// `max(numeric card numbers, 0) + 1`.
pub fn next_card_number(roster: &Roster) -> String {
    let highest = roster
        .students()
        .iter()
        .filter_map(Student::numeric_card)
        .max()
        .unwrap_or(0);
    (highest + 1).to_string()
}

/// Case-insensitive name match or card-number substring match.
///
/// A blank query returns the whole roster.
pub fn search<'a>(roster: &'a Roster, query: &str) -> Vec<&'a Student> {
    let needle = query.trim().to_lowercase();
    roster
        .students()
        .iter()
        .filter(|student| {
            needle.is_empty()
                || student.name.to_lowercase().contains(&needle)
                || student.card_number.contains(&needle)
        })
        .collect()
}

#[derive(Clone)]
pub struct EnrollmentService {
    rosters: RosterRepository,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            rosters: RosterRepository::new(store),
        }
    }

    /// Enrolls a new student and stamps `createdAt`.
    pub async fn enroll(
        &self,
        identity: &EffectiveIdentity,
        draft: &StudentDraft,
    ) -> Result<Student, EnrollmentError> {
        let draft = validate_draft(draft)?;
        let roster = self.rosters.load_roster(identity).await?;
        ensure_unique(&roster, &draft, None)?;

        let student = Student {
            card_number: draft.card_number,
            name: draft.name,
            phone: draft.phone,
            gender: draft.gender,
            standard: draft.standard,
            created_at: Some(Utc::now().timestamp_millis()),
        };
        self.write(identity, &student, "student_enroll").await?;
        Ok(student)
    }

    /// Replaces the profile of `original_card_number`, moving it when the card
    /// number changes.
    pub async fn update(
        &self,
        identity: &EffectiveIdentity,
        original_card_number: &str,
        draft: &StudentDraft,
    ) -> Result<Student, EnrollmentError> {
        let draft = validate_draft(draft)?;
        let roster = self.rosters.load_roster(identity).await?;
        let existing = roster
            .position(original_card_number)
            .and_then(|index| roster.get(index))
            .cloned()
            .ok_or_else(|| EnrollmentError::StudentNotFound(original_card_number.to_string()))?;
        ensure_unique(&roster, &draft, Some(original_card_number))?;

        let student = Student {
            card_number: draft.card_number,
            name: draft.name,
            phone: draft.phone,
            gender: draft.gender,
            standard: draft.standard,
            created_at: existing.created_at,
        };
        if student.card_number != original_card_number {
            self.rosters
                .delete_student(identity, original_card_number)
                .await?;
        }
        self.write(identity, &student, "student_update").await?;
        Ok(student)
    }

    /// Suggested card number for the next enrollment.
    pub async fn suggest_card_number(
        &self,
        identity: &EffectiveIdentity,
    ) -> Result<String, EnrollmentError> {
        let roster = self.rosters.load_roster(identity).await?;
        Ok(next_card_number(&roster))
    }

    async fn write(
        &self,
        identity: &EffectiveIdentity,
        student: &Student,
        event: &str,
    ) -> Result<(), EnrollmentError> {
        if let Err(err) = self.rosters.put_student(identity, student).await {
            error!("event={event} module=enrollment status=error error_code=store_write_failed error={err}");
            return Err(err.into());
        }
        info!("event={event} module=enrollment status=ok");
        Ok(())
    }
}

fn required(value: &str, field: &'static str) -> Result<String, EnrollmentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnrollmentError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn ensure_unique(
    roster: &Roster,
    draft: &StudentDraft,
    ignore_card_number: Option<&str>,
) -> Result<(), EnrollmentError> {
    let name = draft.name.to_lowercase();
    for student in roster.students() {
        if Some(student.card_number.as_str()) == ignore_card_number {
            continue;
        }
        if student.card_number == draft.card_number {
            return Err(EnrollmentError::DuplicateCardNumber(
                draft.card_number.clone(),
            ));
        }
        if student.name.trim().to_lowercase() == name {
            return Err(EnrollmentError::DuplicateName(draft.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{next_card_number, search, validate_draft, EnrollmentError, StudentDraft};
    use crate::model::student::{Roster, Student};

    fn draft() -> StudentDraft {
        StudentDraft {
            card_number: " 12 ".to_string(),
            name: " Amy ".to_string(),
            phone: "9876543210".to_string(),
            gender: "Female".to_string(),
            standard: "Grade 3".to_string(),
        }
    }

    #[test]
    fn validate_trims_accepted_fields() {
        let valid = validate_draft(&draft()).expect("draft should validate");
        assert_eq!(valid.card_number, "12");
        assert_eq!(valid.name, "Amy");
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let mut bad = draft();
        bad.card_number = "12a".to_string();
        assert!(matches!(
            validate_draft(&bad),
            Err(EnrollmentError::InvalidCardNumber(_))
        ));

        let mut bad = draft();
        bad.phone = "12345".to_string();
        assert!(matches!(validate_draft(&bad), Err(EnrollmentError::InvalidPhone)));

        let mut bad = draft();
        bad.standard = "Grade 11".to_string();
        assert!(matches!(
            validate_draft(&bad),
            Err(EnrollmentError::InvalidStandard(_))
        ));

        let mut bad = draft();
        bad.name = "   ".to_string();
        assert!(matches!(
            validate_draft(&bad),
            Err(EnrollmentError::MissingField("name"))
        ));
    }

    #[test]
    fn next_card_number_follows_numeric_maximum() {
        assert_eq!(next_card_number(&Roster::default()), "1");
        let roster = Roster::from_students(vec![
            Student::new("9", "Nine"),
            Student::new("10", "Ten"),
            Student::new("x7", "Odd"),
        ]);
        assert_eq!(next_card_number(&roster), "11");
    }

    #[test]
    fn search_matches_name_or_card_number() {
        let roster = Roster::from_students(vec![
            Student::new("1", "Amy Shah"),
            Student::new("21", "Bob"),
            Student::new("3", "Carl"),
        ]);
        let names = |query: &str| {
            search(&roster, query)
                .into_iter()
                .map(|student| student.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names("SHAH"), vec!["Amy Shah"]);
        assert_eq!(names("1"), vec!["Amy Shah", "Bob"]);
        assert_eq!(names("  ").len(), 3);
    }
}
