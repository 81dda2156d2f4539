//! Entity Persistence Gateway — converts between the in-memory entity shape
//! and the per-user document collections, and issues the CRUD calls. The
//! gateway performs no retries; that policy belongs to the caller.

pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::insight::{AiInsight, NewInsight};
use crate::models::journal::{JournalEntry, JournalEntryPatch, NewJournalEntry};
use crate::models::reminder::{NewReminder, Reminder, ReminderPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    JournalEntries,
    Reminders,
    Insights,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::JournalEntries => "journal entries",
            EntityKind::Reminders => "reminders",
            EntityKind::Insights => "insights",
        })
    }
}

/// Remote I/O failure, named by the entity kind and operation it hit.
#[derive(Debug, Error)]
#[error("{op} failed for {kind}: {source}")]
pub struct GatewayError {
    pub kind: EntityKind,
    pub op: &'static str,
    #[source]
    pub source: anyhow::Error,
}

impl GatewayError {
    pub fn new(kind: EntityKind, op: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            op,
            source: source.into(),
        }
    }
}

/// Starter content written in one batch for a brand-new owner.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub entries: Vec<NewJournalEntry>,
    pub reminders: Vec<NewReminder>,
    pub insights: Vec<NewInsight>,
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn create_entry(
        &self,
        owner: Uuid,
        entry: &NewJournalEntry,
    ) -> Result<Uuid, GatewayError>;

    /// Entries ordered by logical `date` descending.
    async fn list_entries(&self, owner: Uuid) -> Result<Vec<JournalEntry>, GatewayError>;

    async fn update_entry(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &JournalEntryPatch,
    ) -> Result<(), GatewayError>;

    /// Removes the document only; attachment cleanup is the caller's job.
    async fn delete_entry(&self, owner: Uuid, id: Uuid) -> Result<(), GatewayError>;

    async fn create_reminder(
        &self,
        owner: Uuid,
        reminder: &NewReminder,
    ) -> Result<Uuid, GatewayError>;

    /// Reminders ordered by creation time descending.
    async fn list_reminders(&self, owner: Uuid) -> Result<Vec<Reminder>, GatewayError>;

    async fn update_reminder(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &ReminderPatch,
    ) -> Result<(), GatewayError>;

    async fn delete_reminder(&self, owner: Uuid, id: Uuid) -> Result<(), GatewayError>;

    async fn create_insight(&self, owner: Uuid, insight: &NewInsight)
        -> Result<Uuid, GatewayError>;

    /// Insight history ordered by `generated_at` descending.
    async fn list_insights(&self, owner: Uuid) -> Result<Vec<AiInsight>, GatewayError>;

    /// Cheap existence check used to decide whether to seed a new owner.
    async fn has_any_data(&self, owner: Uuid, kind: EntityKind) -> Result<bool, GatewayError>;

    /// Writes the seed batch atomically — all rows or none.
    async fn seed_initial_data(&self, owner: Uuid, seed: &SeedData) -> Result<(), GatewayError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory gateway used by store and handler tests. Supports failure
    //! injection by operation name so write-through behavior can be checked.

    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryGateway {
        pub entries: Mutex<Vec<(Uuid, JournalEntry)>>,
        pub reminders: Mutex<Vec<(Uuid, Reminder)>>,
        pub insights: Mutex<Vec<(Uuid, AiInsight)>>,
        pub fail_ops: Mutex<HashSet<&'static str>>,
        pub seed_calls: AtomicUsize,
    }

    impl InMemoryGateway {
        pub fn fail_on(&self, op: &'static str) {
            self.fail_ops.lock().unwrap().insert(op);
        }

        fn check(&self, kind: EntityKind, op: &'static str) -> Result<(), GatewayError> {
            if self.fail_ops.lock().unwrap().contains(op) {
                return Err(GatewayError::new(
                    kind,
                    op,
                    anyhow::anyhow!("injected {op} failure"),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceGateway for InMemoryGateway {
        async fn create_entry(
            &self,
            owner: Uuid,
            entry: &NewJournalEntry,
        ) -> Result<Uuid, GatewayError> {
            self.check(EntityKind::JournalEntries, "create_entry")?;
            let id = Uuid::new_v4();
            let now = Utc::now();
            self.entries.lock().unwrap().push((
                owner,
                JournalEntry {
                    id,
                    date: entry.date,
                    text: entry.text.clone(),
                    mood: entry.mood,
                    voice_note_url: entry.voice_note_url.clone(),
                    image_url: entry.image_url.clone(),
                    tags: entry.tags.clone(),
                    created_at: now,
                    updated_at: now,
                },
            ));
            Ok(id)
        }

        async fn list_entries(&self, owner: Uuid) -> Result<Vec<JournalEntry>, GatewayError> {
            self.check(EntityKind::JournalEntries, "list_entries")?;
            let mut entries: Vec<JournalEntry> = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(o, _)| *o == owner)
                .map(|(_, e)| e.clone())
                .collect();
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(entries)
        }

        async fn update_entry(
            &self,
            owner: Uuid,
            id: Uuid,
            patch: &JournalEntryPatch,
        ) -> Result<(), GatewayError> {
            self.check(EntityKind::JournalEntries, "update_entry")?;
            let mut entries = self.entries.lock().unwrap();
            let entry = entries
                .iter_mut()
                .find(|(o, e)| *o == owner && e.id == id)
                .map(|(_, e)| e)
                .ok_or_else(|| {
                    GatewayError::new(
                        EntityKind::JournalEntries,
                        "update",
                        anyhow::anyhow!("no document with id {id}"),
                    )
                })?;
            if let Some(date) = patch.date {
                entry.date = date;
            }
            if let Some(text) = &patch.text {
                entry.text = text.clone();
            }
            if let Some(mood) = patch.mood {
                entry.mood = Some(mood);
            }
            if let Some(tags) = &patch.tags {
                entry.tags = tags.clone();
            }
            if patch.voice_note_url.is_change() {
                entry.voice_note_url = patch.voice_note_url.value().cloned();
            }
            if patch.image_url.is_change() {
                entry.image_url = patch.image_url.value().cloned();
            }
            entry.updated_at = Utc::now();
            Ok(())
        }

        async fn delete_entry(&self, owner: Uuid, id: Uuid) -> Result<(), GatewayError> {
            self.check(EntityKind::JournalEntries, "delete_entry")?;
            self.entries
                .lock()
                .unwrap()
                .retain(|(o, e)| !(*o == owner && e.id == id));
            Ok(())
        }

        async fn create_reminder(
            &self,
            owner: Uuid,
            reminder: &NewReminder,
        ) -> Result<Uuid, GatewayError> {
            self.check(EntityKind::Reminders, "create_reminder")?;
            let id = Uuid::new_v4();
            let now = Utc::now();
            self.reminders.lock().unwrap().push((
                owner,
                Reminder {
                    id,
                    title: reminder.title.clone(),
                    time: reminder.time.clone(),
                    frequency: reminder.frequency.clone(),
                    description: reminder.description.clone(),
                    active: reminder.active,
                    created_at: now,
                    updated_at: now,
                },
            ));
            Ok(id)
        }

        async fn list_reminders(&self, owner: Uuid) -> Result<Vec<Reminder>, GatewayError> {
            self.check(EntityKind::Reminders, "list_reminders")?;
            let mut reminders: Vec<Reminder> = self
                .reminders
                .lock()
                .unwrap()
                .iter()
                .filter(|(o, _)| *o == owner)
                .map(|(_, r)| r.clone())
                .collect();
            reminders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(reminders)
        }

        async fn update_reminder(
            &self,
            owner: Uuid,
            id: Uuid,
            patch: &ReminderPatch,
        ) -> Result<(), GatewayError> {
            self.check(EntityKind::Reminders, "update_reminder")?;
            let mut reminders = self.reminders.lock().unwrap();
            let reminder = reminders
                .iter_mut()
                .find(|(o, r)| *o == owner && r.id == id)
                .map(|(_, r)| r)
                .ok_or_else(|| {
                    GatewayError::new(
                        EntityKind::Reminders,
                        "update",
                        anyhow::anyhow!("no document with id {id}"),
                    )
                })?;
            if let Some(title) = &patch.title {
                reminder.title = title.clone();
            }
            if let Some(time) = &patch.time {
                reminder.time = time.clone();
            }
            if let Some(frequency) = &patch.frequency {
                reminder.frequency = frequency.clone();
            }
            if let Some(description) = &patch.description {
                reminder.description = Some(description.clone());
            }
            if let Some(active) = patch.active {
                reminder.active = active;
            }
            reminder.updated_at = Utc::now();
            Ok(())
        }

        async fn delete_reminder(&self, owner: Uuid, id: Uuid) -> Result<(), GatewayError> {
            self.check(EntityKind::Reminders, "delete_reminder")?;
            self.reminders
                .lock()
                .unwrap()
                .retain(|(o, r)| !(*o == owner && r.id == id));
            Ok(())
        }

        async fn create_insight(
            &self,
            owner: Uuid,
            insight: &NewInsight,
        ) -> Result<Uuid, GatewayError> {
            self.check(EntityKind::Insights, "create_insight")?;
            let id = Uuid::new_v4();
            let now = Utc::now();
            self.insights.lock().unwrap().push((
                owner,
                AiInsight {
                    id,
                    generated_at: insight.generated_at,
                    themes: insight.themes.clone(),
                    emotions: insight.emotions.clone(),
                    stressors: insight.stressors.clone(),
                    summary: insight.summary.clone(),
                    recommendations: insight.recommendations.clone(),
                    created_at: now,
                    updated_at: now,
                },
            ));
            Ok(id)
        }

        async fn list_insights(&self, owner: Uuid) -> Result<Vec<AiInsight>, GatewayError> {
            self.check(EntityKind::Insights, "list_insights")?;
            let mut insights: Vec<AiInsight> = self
                .insights
                .lock()
                .unwrap()
                .iter()
                .filter(|(o, _)| *o == owner)
                .map(|(_, i)| i.clone())
                .collect();
            insights.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
            Ok(insights)
        }

        async fn has_any_data(
            &self,
            owner: Uuid,
            kind: EntityKind,
        ) -> Result<bool, GatewayError> {
            self.check(kind, "has_any_data")?;
            Ok(match kind {
                EntityKind::JournalEntries => {
                    self.entries.lock().unwrap().iter().any(|(o, _)| *o == owner)
                }
                EntityKind::Reminders => self
                    .reminders
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|(o, _)| *o == owner),
                EntityKind::Insights => self
                    .insights
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|(o, _)| *o == owner),
            })
        }

        async fn seed_initial_data(
            &self,
            owner: Uuid,
            seed: &SeedData,
        ) -> Result<(), GatewayError> {
            self.check(EntityKind::JournalEntries, "seed_initial_data")?;
            self.seed_calls.fetch_add(1, Ordering::SeqCst);
            for entry in &seed.entries {
                self.create_entry(owner, entry).await?;
            }
            for reminder in &seed.reminders {
                self.create_reminder(owner, reminder).await?;
            }
            for insight in &seed.insights {
                self.create_insight(owner, insight).await?;
            }
            Ok(())
        }
    }
}
