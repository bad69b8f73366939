use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for event types.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventTypeId(pub String);

/// Identifier wrapper for events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for shifts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftId(pub String);

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of events, e.g. "Ambulance service" or "Training".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub id: EventTypeId,
    pub title: String,
    #[serde(default)]
    pub can_grant_qualification: bool,
}

/// An event volunteers can sign up for through its shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    pub event_type: EventTypeId,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "default_mail_updates")]
    pub mail_updates: bool,
    /// Addresses notified about new participation requests.
    #[serde(default)]
    pub responsibles: Vec<String>,
}

fn default_mail_updates() -> bool {
    true
}

/// A time slot of an event with its own signup method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub event: EventId,
    #[serde(default)]
    pub label: Option<String>,
    pub meeting_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub signup_method_slug: String,
    #[serde(default)]
    pub signup_configuration: serde_json::Value,
}

impl Shift {
    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 3600.0
    }

    /// Whether the two shifts share any instant. Touching end/start times do not overlap.
    pub fn overlaps(&self, other: &Shift) -> bool {
        self.start_time < other.end_time && self.end_time > other.start_time
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }

    pub fn display_label(&self) -> String {
        let window = format!(
            "{} - {}",
            self.start_time.format("%Y-%m-%d %H:%M"),
            self.end_time.format("%H:%M")
        );
        match &self.label {
            Some(label) => format!("{label} ({window})"),
            None => window,
        }
    }
}

/// Earliest start and latest end over an event's shifts.
pub fn event_window(shifts: &[Shift]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = shifts.iter().map(|shift| shift.start_time).min()?;
    let end = shifts.iter().map(|shift| shift.end_time).max()?;
    Some((start, end))
}
