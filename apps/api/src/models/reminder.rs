use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reminder schedule. The four named frequencies cover the UI presets; any
/// other string (e.g. a cron expression) is carried through as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Weekdays,
    Weekends,
    Custom(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Weekdays => "weekdays",
            Frequency::Weekends => "weekends",
            Frequency::Custom(s) => s,
        }
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        match s.as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "weekdays" => Frequency::Weekdays,
            "weekends" => Frequency::Weekends,
            _ => Frequency::Custom(s),
        }
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

/// A recurring habit/notification definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub title: String,
    /// Wall-clock time, "HH:MM".
    pub time: String,
    pub frequency: Frequency,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub title: String,
    pub time: String,
    pub frequency: Frequency,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub time: Option<String>,
    pub frequency: Option<Frequency>,
    pub description: Option<String>,
    pub active: Option<bool>,
}
