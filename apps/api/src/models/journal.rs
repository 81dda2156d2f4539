use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::MediaSource;
use crate::models::Field;

/// Mood recorded on a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Bad,
    Terrible,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Bad => "bad",
            Mood::Terrible => "terrible",
        }
    }

    /// Parses a stored mood string. Unknown values map to None rather than
    /// failing the whole row.
    pub fn parse(s: &str) -> Option<Mood> {
        match s {
            "great" => Some(Mood::Great),
            "good" => Some(Mood::Good),
            "okay" => Some(Mood::Okay),
            "bad" => Some(Mood::Bad),
            "terrible" => Some(Mood::Terrible),
            _ => None,
        }
    }
}

/// One user-authored reflection. `date` is the logical date the entry
/// pertains to and is user-editable; `created_at`/`updated_at` are audit
/// timestamps stamped by the persistence gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub text: String,
    pub mood: Option<Mood>,
    pub voice_note_url: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry shape handed to the persistence gateway on creation. Attachments
/// have already been uploaded and reduced to refs at this point.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub date: DateTime<Utc>,
    pub text: String,
    pub mood: Option<Mood>,
    pub voice_note_url: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update at the gateway boundary: only supplied fields are merged.
#[derive(Debug, Clone, Default)]
pub struct JournalEntryPatch {
    pub date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub mood: Option<Mood>,
    pub tags: Option<Vec<String>>,
    pub voice_note_url: Field<String>,
    pub image_url: Field<String>,
}

/// Requested change to one attachment slot of an entry.
#[derive(Debug, Clone, Default)]
pub enum AttachmentChange {
    #[default]
    Keep,
    /// Delete the stored object and unset the reference.
    Clear,
    /// Delete the stored object (if any) and upload the new content.
    Replace(MediaSource),
}

/// Store-level draft for a new entry. Text is required; the date defaults to
/// now when unset. Attachment content arrives in any `MediaSource` shape.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub date: Option<DateTime<Utc>>,
    pub text: String,
    pub mood: Option<Mood>,
    pub tags: Vec<String>,
    pub voice_note: Option<MediaSource>,
    pub image: Option<MediaSource>,
}

/// Store-level partial update for an existing entry.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub mood: Option<Mood>,
    pub tags: Option<Vec<String>>,
    pub voice_note: AttachmentChange,
    pub image: AttachmentChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_round_trips_through_storage_string() {
        for mood in [Mood::Great, Mood::Good, Mood::Okay, Mood::Bad, Mood::Terrible] {
            assert_eq!(Mood::parse(mood.as_str()), Some(mood));
        }
    }

    #[test]
    fn test_unknown_mood_string_is_tolerated() {
        assert_eq!(Mood::parse("ecstatic"), None);
    }

    #[test]
    fn test_mood_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mood::Okay).unwrap(), "\"okay\"");
    }
}
