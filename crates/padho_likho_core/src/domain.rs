//! crates/padho_likho_core/src/domain.rs
//!
//! Defines the pure, core data structures for the portal.
//! These structs know nothing about HTTP, storage files or the terminal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three kinds of account the marketplace knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Parent,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Parent];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
        }
    }

    /// The dashboard a viewer of this role lands on.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Teacher => "/teacher/dashboard",
            Role::Student => "/student/dashboard",
            Role::Parent => "/parent/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a known role")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// The cached bearer token plus the role claimed when it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub role: Option<Role>,
}

impl Credential {
    pub fn new(token: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// The resolved identity of whoever is using the portal.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub id: String,
    pub role: Role,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// What a successful login or registration hands back.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: String,
    pub user: Viewer,
}

// Sign-up form contents
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
}

/// Fields of the profile screen. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Read-only teacher record supplied by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub hourly_rate: f64,
    pub subjects: Vec<String>,
    pub classes: Vec<String>,
    pub availability: Vec<String>,
}

impl Teacher {
    pub fn offers_subject(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }

    pub fn offers_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Allowed lesson lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LessonDuration {
    #[default]
    OneHour,
    NinetyMinutes,
    TwoHours,
}

impl LessonDuration {
    pub fn minutes(self) -> u32 {
        match self {
            LessonDuration::OneHour => 60,
            LessonDuration::NinetyMinutes => 90,
            LessonDuration::TwoHours => 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lessons last 60, 90 or 120 minutes, not {0}")]
pub struct InvalidDuration(pub u32);

impl TryFrom<u32> for LessonDuration {
    type Error = InvalidDuration;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            60 => Ok(LessonDuration::OneHour),
            90 => Ok(LessonDuration::NinetyMinutes),
            120 => Ok(LessonDuration::TwoHours),
            other => Err(InvalidDuration(other)),
        }
    }
}

impl From<LessonDuration> for u32 {
    fn from(duration: LessonDuration) -> Self {
        duration.minutes()
    }
}

/// Reservation data collected by the booking wizard, not yet persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingDraft {
    pub subject: String,
    pub class: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub duration: LessonDuration,
    pub topic: String,
    pub notes: String,
}

/// Payload handed to the booking collaborator once the viewer confirms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub teacher_id: String,
    pub subject: String,
    pub class: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration_minutes: LessonDuration,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// A reservation the backend has accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub request: BookingRequest,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" parent ".parse::<Role>(), Ok(Role::Parent));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn home_paths_follow_role() {
        assert_eq!(Role::Teacher.home_path(), "/teacher/dashboard");
        assert_eq!(Role::Student.home_path(), "/student/dashboard");
        assert_eq!(Role::Parent.home_path(), "/parent/dashboard");
    }

    #[test]
    fn only_three_lesson_lengths_exist() {
        assert_eq!(LessonDuration::try_from(90), Ok(LessonDuration::NinetyMinutes));
        assert_eq!(LessonDuration::try_from(45), Err(InvalidDuration(45)));
        assert_eq!(LessonDuration::default().minutes(), 60);
    }

    #[test]
    fn bearer_header_uses_token() {
        let credential = Credential::new("abc.def.ghi", Some(Role::Student));
        assert_eq!(credential.bearer(), "Bearer abc.def.ghi");
    }
}
