//! Conversational Context Tool Layer — the two read-only lookup capabilities
//! exposed to the coach agent, plus the bounded context summary embedded in
//! its system prompt.
//!
//! Tools are a closed set dispatched by name; each is bound to the session's
//! full collections at call time and never touches remote services.

pub mod chat;
pub mod handlers;
pub mod prompts;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::llm_client::ToolDefinition;
use crate::models::journal::JournalEntry;
use crate::models::reminder::Reminder;

/// Result cap for both lookup tools, keeping tool output concise.
pub const LOOKUP_LIMIT: usize = 5;

/// How many recent entries the context summary covers.
const SUMMARY_ENTRY_LIMIT: usize = 10;
/// Excerpt length for entry text in the context summary.
const EXCERPT_LEN: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryLookupParams {
    /// Keyword matched case-insensitively against entry text and tags.
    pub query: Option<String>,
    /// Calendar date ("YYYY-MM-DD") compared at day granularity.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    All,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderLookupParams {
    #[serde(default)]
    pub status: StatusFilter,
    /// Keyword matched case-insensitively against title and description.
    pub query: Option<String>,
}

/// Entry lookup: date filter first, then keyword, AND-combined. A malformed
/// date on either side excludes rather than raising. Input order (most
/// recent first in store order) is preserved; at most `LOOKUP_LIMIT` results.
pub fn lookup_entries(entries: &[JournalEntry], params: &EntryLookupParams) -> Vec<JournalEntry> {
    let target = match params.date.as_deref() {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            // Unparseable target date matches nothing.
            Err(_) => return Vec::new(),
        },
        None => None,
    };
    let query = params.query.as_deref().map(str::to_lowercase);

    entries
        .iter()
        .filter(|entry| match target {
            Some(d) => entry.date.date_naive() == d,
            None => true,
        })
        .filter(|entry| match &query {
            Some(q) => {
                entry.text.to_lowercase().contains(q)
                    || entry.tags.iter().any(|t| t.to_lowercase().contains(q))
            }
            None => true,
        })
        .take(LOOKUP_LIMIT)
        .cloned()
        .collect()
}

/// Reminder lookup: status filter (default active) then keyword over title
/// and description; at most `LOOKUP_LIMIT` results.
pub fn lookup_reminders(reminders: &[Reminder], params: &ReminderLookupParams) -> Vec<Reminder> {
    let query = params.query.as_deref().map(str::to_lowercase);

    reminders
        .iter()
        .filter(|r| match params.status {
            StatusFilter::All => true,
            StatusFilter::Active => r.active,
            StatusFilter::Inactive => !r.active,
        })
        .filter(|r| match &query {
            Some(q) => {
                r.title.to_lowercase().contains(q)
                    || r.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(q))
            }
            None => true,
        })
        .take(LOOKUP_LIMIT)
        .cloned()
        .collect()
}

/// Entry shape handed to the agent: dates as ISO strings, audit timestamps
/// stripped.
#[derive(Debug, Serialize)]
struct EntryView {
    id: Uuid,
    date: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mood: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_note_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    tags: Vec<String>,
}

impl From<JournalEntry> for EntryView {
    fn from(entry: JournalEntry) -> Self {
        EntryView {
            id: entry.id,
            date: entry.date.to_rfc3339(),
            text: entry.text,
            mood: entry.mood.map(|m| m.as_str()),
            voice_note_url: entry.voice_note_url,
            image_url: entry.image_url,
            tags: entry.tags,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReminderView {
    id: Uuid,
    title: String,
    time: String,
    frequency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    active: bool,
}

impl From<Reminder> for ReminderView {
    fn from(r: Reminder) -> Self {
        ReminderView {
            id: r.id,
            title: r.title,
            time: r.time,
            frequency: r.frequency.as_str().to_string(),
            description: r.description,
            active: r.active,
        }
    }
}

/// The closed set of capabilities the coach agent may invoke.
#[derive(Debug, Clone)]
pub enum CoachTool {
    EntryLookup(EntryLookupParams),
    ReminderLookup(ReminderLookupParams),
}

impl CoachTool {
    pub const ENTRY_LOOKUP: &'static str = "get_journal_entries";
    pub const REMINDER_LOOKUP: &'static str = "get_reminders";

    /// Resolves a named tool invocation into a typed capability. Unknown
    /// names and malformed inputs yield None.
    pub fn parse(name: &str, input: &Value) -> Option<CoachTool> {
        match name {
            Self::ENTRY_LOOKUP => serde_json::from_value(input.clone())
                .ok()
                .map(CoachTool::EntryLookup),
            Self::REMINDER_LOOKUP => serde_json::from_value(input.clone())
                .ok()
                .map(CoachTool::ReminderLookup),
            _ => None,
        }
    }

    /// Tool definitions advertised to the agent.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: Self::ENTRY_LOOKUP.to_string(),
                description: "Fetches journal entries based on optional keywords or date \
                              queries. Use this to find specific information if the general \
                              context is not enough."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Keywords to search for in journal entry text or tags. Case-insensitive."
                        },
                        "date": {
                            "type": "string",
                            "description": "A specific date (YYYY-MM-DD) to find entries for. If query is also present, both must match."
                        }
                    }
                }),
            },
            ToolDefinition {
                name: Self::REMINDER_LOOKUP.to_string(),
                description: "Fetches reminders, optionally filtered by status \
                              (active/inactive) or keywords in title/description."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "status": {
                            "type": "string",
                            "enum": ["active", "inactive", "all"],
                            "description": "Filter reminders by their active status. Defaults to 'active' if not specified."
                        },
                        "query": {
                            "type": "string",
                            "description": "Keywords to search for in reminder title or description. Case-insensitive."
                        }
                    }
                }),
            },
        ]
    }

    /// Runs the capability against the bound collections. Always returns a
    /// JSON array; empty when nothing matches.
    pub fn invoke(&self, entries: &[JournalEntry], reminders: &[Reminder]) -> Value {
        match self {
            CoachTool::EntryLookup(params) => {
                let found: Vec<EntryView> = lookup_entries(entries, params)
                    .into_iter()
                    .map(EntryView::from)
                    .collect();
                json!(found)
            }
            CoachTool::ReminderLookup(params) => {
                let found: Vec<ReminderView> = lookup_reminders(reminders, params)
                    .into_iter()
                    .map(ReminderView::from)
                    .collect();
                json!(found)
            }
        }
    }
}

/// Truncates to a word boundary near `max` characters, appending an
/// ellipsis. Short strings pass through untouched.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    let cut = match head.rfind(' ') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head.as_str(),
    };
    format!("{cut}...")
}

/// Renders the bounded context block for the agent's system prompt: recent
/// entries as one-line excerpts plus the active reminders. Independent of
/// the on-demand tools.
pub fn context_summary(entries: &[JournalEntry], reminders: &[Reminder]) -> String {
    let mut out = String::new();

    out.push_str("Brief summary of recent journal entries (use tools for specifics):\n");
    if entries.is_empty() {
        out.push_str("User has no journal entries yet.\n");
    } else {
        for entry in entries.iter().take(SUMMARY_ENTRY_LIMIT) {
            out.push_str(&format!(
                "- Entry on {}: {}",
                entry.date.format("%Y-%m-%d"),
                excerpt(&entry.text, EXCERPT_LEN)
            ));
            if let Some(mood) = entry.mood {
                out.push_str(&format!(" (Mood: {})", mood.as_str()));
            }
            out.push('\n');
        }
    }

    out.push_str("\nBrief summary of active reminders (use tools for specifics):\n");
    let active: Vec<&Reminder> = reminders.iter().filter(|r| r.active).collect();
    if active.is_empty() {
        out.push_str("User has no active reminders.\n");
    } else {
        for reminder in active {
            out.push_str(&format!(
                "- {} at {} ({})\n",
                reminder.title,
                reminder.time,
                reminder.frequency.as_str()
            ));
        }
    }

    out
}
