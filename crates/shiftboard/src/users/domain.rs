use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for user profiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for qualifications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualificationId(pub String);

impl fmt::Display for QualificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered volunteer or manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_staff: bool,
}

fn default_true() -> bool {
    true
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn age_on(&self, day: NaiveDate) -> u32 {
        age_on(self.date_of_birth, day)
    }

    pub fn is_minor_on(&self, day: NaiveDate) -> bool {
        self.age_on(day) < 18
    }
}

/// Full years elapsed between `born` and `day`. Zero when `day` precedes the birth date.
pub fn age_on(born: NaiveDate, day: NaiveDate) -> u32 {
    let mut years = day.year() - born.year();
    if (day.month(), day.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Grouping used to present related qualifications together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationCategory {
    pub id: String,
    pub title: String,
}

/// A qualification which may imply (`includes`) further qualifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    pub id: QualificationId,
    pub title: String,
    pub abbreviation: String,
    pub category: String,
    #[serde(default)]
    pub includes: Vec<QualificationId>,
}

/// Qualification held by a user, optionally until `expires`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationGrant {
    pub user: UserId,
    pub qualification: QualificationId,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

impl QualificationGrant {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires, Some(expires) if expires < now)
    }
}

/// Manually recorded hours that count towards a user's working time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub user: UserId,
    pub hours: f64,
    pub reason: String,
    pub date: NaiveDate,
}
