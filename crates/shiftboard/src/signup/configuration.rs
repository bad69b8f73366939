use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::users::domain::QualificationId;
use crate::users::qualifications::QualificationCatalog;

const DEFAULT_MINIMUM_AGE: u32 = 16;

/// Typed view of a shift's signup configuration. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupConfiguration {
    pub minimum_age: Option<u32>,
    pub signup_until: Option<DateTime<Utc>>,
    pub required_qualification_ids: Vec<QualificationId>,
    pub minimum_number_of_participants: Option<u32>,
    pub maximum_number_of_participants: Option<u32>,
}

impl Default for SignupConfiguration {
    fn default() -> Self {
        Self {
            minimum_age: Some(DEFAULT_MINIMUM_AGE),
            signup_until: None,
            required_qualification_ids: Vec::new(),
            minimum_number_of_participants: None,
            maximum_number_of_participants: None,
        }
    }
}

impl SignupConfiguration {
    /// Parse the JSON stored on a shift. `null` means "all defaults".
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }

    /// Last moment a signup or decline is accepted.
    pub fn signup_deadline(&self, shift_end: DateTime<Utc>) -> DateTime<Utc> {
        match self.signup_until {
            Some(until) => until.min(shift_end),
            None => shift_end,
        }
    }
}

/// One published configuration value, e.g. `Minimum age: 16`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupInfoEntry {
    pub label: &'static str,
    pub value: String,
}

/// Labelled, ordered summary of the non-empty configuration values.
pub fn signup_info(
    config: &SignupConfiguration,
    catalog: &QualificationCatalog,
) -> Vec<SignupInfoEntry> {
    let mut entries = Vec::new();
    if let Some(age) = config.minimum_age {
        entries.push(SignupInfoEntry {
            label: "Minimum age",
            value: age.to_string(),
        });
    }
    if let Some(until) = config.signup_until {
        entries.push(SignupInfoEntry {
            label: "Signup until",
            value: until.format("%Y-%m-%d %H:%M").to_string(),
        });
    }
    if !config.required_qualification_ids.is_empty() {
        entries.push(SignupInfoEntry {
            label: "Required qualifications",
            value: catalog
                .titles(&config.required_qualification_ids)
                .join(", "),
        });
    }
    if let Some(min) = config.minimum_number_of_participants {
        entries.push(SignupInfoEntry {
            label: "Minimum number of participants",
            value: min.to_string(),
        });
    }
    if let Some(max) = config.maximum_number_of_participants {
        entries.push(SignupInfoEntry {
            label: "Maximum number of participants",
            value: max.to_string(),
        });
    }
    entries
}
