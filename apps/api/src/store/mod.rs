//! Data Synchronization Store — the authoritative in-memory copy of one
//! user's journal entries, reminders, and insight history, kept in lockstep
//! with the remote collections.
//!
//! Discipline: write-through, confirm-then-reflect. Every mutation performs
//! the remote write first and mirrors it into memory only on success, so the
//! in-memory state never diverges from the last known persisted state. There
//! are no optimistic updates and no retries here.

pub mod handlers;
pub mod seed;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::media::{MediaCategory, MediaStore};
use crate::models::journal::{
    AttachmentChange, EntryDraft, EntryPatch, JournalEntry, JournalEntryPatch, NewJournalEntry,
};
use crate::models::insight::{AiInsight, NewInsight};
use crate::models::reminder::{NewReminder, Reminder, ReminderPatch};
use crate::models::Field;
use crate::persistence::{EntityKind, PersistenceGateway};

/// Per-session state container. Constructed at sign-in, torn down at
/// sign-out; never shared across users.
pub struct SessionStore {
    owner: Uuid,
    gateway: Arc<dyn PersistenceGateway>,
    media: Arc<dyn MediaStore>,
    entries: Vec<JournalEntry>,
    reminders: Vec<Reminder>,
    insights: Vec<AiInsight>,
    /// Coarse flag: true while any mutating operation is in flight. Not a
    /// per-entity lock.
    busy: bool,
}

impl SessionStore {
    /// Builds the store for a freshly signed-in owner and runs the bootstrap
    /// sequence (seed-if-new, then load all three collections).
    ///
    /// A bootstrap failure is surfaced in the second tuple element; the store
    /// itself is still returned, empty and usable.
    pub async fn sign_in(
        gateway: Arc<dyn PersistenceGateway>,
        media: Arc<dyn MediaStore>,
        owner: Uuid,
    ) -> (Self, Result<(), AppError>) {
        let mut store = Self {
            owner,
            gateway,
            media,
            entries: Vec::new(),
            reminders: Vec::new(),
            insights: Vec::new(),
            busy: false,
        };

        store.busy = true;
        let outcome = store.bootstrap().await;
        store.busy = false;

        if let Err(e) = &outcome {
            error!("Session bootstrap failed for user {owner}: {e}");
            store.entries.clear();
            store.reminders.clear();
            store.insights.clear();
        }
        (store, outcome)
    }

    async fn bootstrap(&mut self) -> Result<(), AppError> {
        let has_entries = self
            .gateway
            .has_any_data(self.owner, EntityKind::JournalEntries)
            .await?;
        if !has_entries {
            info!("Seeding starter content for new user {}", self.owner);
            self.gateway
                .seed_initial_data(self.owner, &seed::starter_content())
                .await?;
        }

        self.entries = self.gateway.list_entries(self.owner).await?;
        self.reminders = self.gateway.list_reminders(self.owner).await?;
        self.insights = self.gateway.list_insights(self.owner).await?;
        Ok(())
    }

    /// Sign-out: drop all local state immediately. No remote calls.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.reminders.clear();
        self.insights.clear();
        self.busy = false;
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn insights(&self) -> &[AiInsight] {
        &self.insights
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub async fn add_entry(&mut self, draft: EntryDraft) -> Result<JournalEntry, AppError> {
        self.busy = true;
        let result = self.add_entry_inner(draft).await;
        self.busy = false;
        if let Err(e) = &result {
            error!("Failed to add journal entry: {e}");
        }
        result
    }

    async fn add_entry_inner(&mut self, draft: EntryDraft) -> Result<JournalEntry, AppError> {
        if draft.text.trim().is_empty() {
            return Err(AppError::Validation(
                "Journal entry text cannot be empty".to_string(),
            ));
        }

        let voice_note_url = match draft.voice_note {
            Some(source) => Some(
                self.media
                    .upload(self.owner, MediaCategory::VoiceNotes, source, None)
                    .await?,
            ),
            None => None,
        };
        let image_url = match draft.image {
            Some(source) => Some(
                self.media
                    .upload(self.owner, MediaCategory::JournalImages, source, None)
                    .await?,
            ),
            None => None,
        };

        let new = NewJournalEntry {
            date: draft.date.unwrap_or_else(Utc::now),
            text: draft.text,
            mood: draft.mood,
            voice_note_url,
            image_url,
            tags: draft.tags,
        };
        let id = self.gateway.create_entry(self.owner, &new).await?;

        let now = Utc::now();
        let entry = JournalEntry {
            id,
            date: new.date,
            text: new.text,
            mood: new.mood,
            voice_note_url: new.voice_note_url,
            image_url: new.image_url,
            tags: new.tags,
            created_at: now,
            updated_at: now,
        };
        self.entries.push(entry.clone());
        self.sort_entries();
        Ok(entry)
    }

    pub async fn update_entry(
        &mut self,
        id: Uuid,
        patch: EntryPatch,
    ) -> Result<JournalEntry, AppError> {
        self.busy = true;
        let result = self.update_entry_inner(id, patch).await;
        self.busy = false;
        if let Err(e) = &result {
            error!("Failed to update journal entry {id}: {e}");
        }
        result
    }

    async fn update_entry_inner(
        &mut self,
        id: Uuid,
        patch: EntryPatch,
    ) -> Result<JournalEntry, AppError> {
        let current = self
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Journal entry {id} not found")))?;

        // Attachment work is sequenced before the metadata write so a stored
        // document never references an object known to be superseded.
        let voice_note_url = self
            .apply_attachment_change(
                current.voice_note_url.as_deref(),
                patch.voice_note,
                MediaCategory::VoiceNotes,
            )
            .await?;
        let image_url = self
            .apply_attachment_change(
                current.image_url.as_deref(),
                patch.image,
                MediaCategory::JournalImages,
            )
            .await?;

        let gateway_patch = JournalEntryPatch {
            date: patch.date,
            text: patch.text.clone(),
            mood: patch.mood,
            tags: patch.tags.clone(),
            voice_note_url: voice_note_url.clone(),
            image_url: image_url.clone(),
        };
        self.gateway
            .update_entry(self.owner, id, &gateway_patch)
            .await?;

        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Journal entry {id} not found")))?;
        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(text) = patch.text {
            entry.text = text;
        }
        if let Some(mood) = patch.mood {
            entry.mood = Some(mood);
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }
        match voice_note_url {
            Field::Keep => {}
            Field::Clear => entry.voice_note_url = None,
            Field::Set(url) => entry.voice_note_url = Some(url),
        }
        match image_url {
            Field::Keep => {}
            Field::Clear => entry.image_url = None,
            Field::Set(url) => entry.image_url = Some(url),
        }
        entry.updated_at = Utc::now();
        let updated = entry.clone();
        self.sort_entries();
        Ok(updated)
    }

    /// Resolves a requested attachment change into the field value to
    /// persist, performing the storage work. Replacement deletes the old
    /// object before uploading the new one.
    async fn apply_attachment_change(
        &self,
        current: Option<&str>,
        change: AttachmentChange,
        category: MediaCategory,
    ) -> Result<Field<String>, AppError> {
        match change {
            AttachmentChange::Keep => Ok(Field::Keep),
            AttachmentChange::Clear => {
                if let Some(url) = current {
                    self.media.remove(url).await?;
                }
                Ok(Field::Clear)
            }
            AttachmentChange::Replace(source) => {
                if let Some(url) = current {
                    self.media.remove(url).await?;
                }
                let url = self.media.upload(self.owner, category, source, None).await?;
                Ok(Field::Set(url))
            }
        }
    }

    pub async fn delete_entry(&mut self, id: Uuid) -> Result<(), AppError> {
        self.busy = true;
        let result = self.delete_entry_inner(id).await;
        self.busy = false;
        if let Err(e) = &result {
            error!("Failed to delete journal entry {id}: {e}");
        }
        result
    }

    async fn delete_entry_inner(&mut self, id: Uuid) -> Result<(), AppError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Journal entry {id} not found")))?;

        if let Some(url) = &entry.voice_note_url {
            self.media.remove(url).await?;
        }
        if let Some(url) = &entry.image_url {
            self.media.remove(url).await?;
        }
        self.gateway.delete_entry(self.owner, id).await?;
        self.entries.retain(|e| e.id != id);
        Ok(())
    }

    pub async fn add_reminder(&mut self, new: NewReminder) -> Result<Reminder, AppError> {
        self.busy = true;
        let result = self.add_reminder_inner(new).await;
        self.busy = false;
        if let Err(e) = &result {
            error!("Failed to add reminder: {e}");
        }
        result
    }

    async fn add_reminder_inner(&mut self, new: NewReminder) -> Result<Reminder, AppError> {
        if new.title.trim().is_empty() {
            return Err(AppError::Validation(
                "Reminder title cannot be empty".to_string(),
            ));
        }
        let id = self.gateway.create_reminder(self.owner, &new).await?;
        let now = Utc::now();
        let reminder = Reminder {
            id,
            title: new.title,
            time: new.time,
            frequency: new.frequency,
            description: new.description,
            active: new.active,
            created_at: now,
            updated_at: now,
        };
        // Reminders are listed newest-first by creation time.
        self.reminders.insert(0, reminder.clone());
        Ok(reminder)
    }

    pub async fn update_reminder(
        &mut self,
        id: Uuid,
        patch: ReminderPatch,
    ) -> Result<Reminder, AppError> {
        self.busy = true;
        let result = self.update_reminder_inner(id, patch).await;
        self.busy = false;
        if let Err(e) = &result {
            error!("Failed to update reminder {id}: {e}");
        }
        result
    }

    async fn update_reminder_inner(
        &mut self,
        id: Uuid,
        patch: ReminderPatch,
    ) -> Result<Reminder, AppError> {
        if !self.reminders.iter().any(|r| r.id == id) {
            return Err(AppError::NotFound(format!("Reminder {id} not found")));
        }
        self.gateway.update_reminder(self.owner, id, &patch).await?;

        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Reminder {id} not found")))?;
        if let Some(title) = patch.title {
            reminder.title = title;
        }
        if let Some(time) = patch.time {
            reminder.time = time;
        }
        if let Some(frequency) = patch.frequency {
            reminder.frequency = frequency;
        }
        if let Some(description) = patch.description {
            reminder.description = Some(description);
        }
        if let Some(active) = patch.active {
            reminder.active = active;
        }
        reminder.updated_at = Utc::now();
        Ok(reminder.clone())
    }

    pub async fn delete_reminder(&mut self, id: Uuid) -> Result<(), AppError> {
        self.busy = true;
        let result = self.delete_reminder_inner(id).await;
        self.busy = false;
        if let Err(e) = &result {
            error!("Failed to delete reminder {id}: {e}");
        }
        result
    }

    async fn delete_reminder_inner(&mut self, id: Uuid) -> Result<(), AppError> {
        if !self.reminders.iter().any(|r| r.id == id) {
            return Err(AppError::NotFound(format!("Reminder {id} not found")));
        }
        self.gateway.delete_reminder(self.owner, id).await?;
        self.reminders.retain(|r| r.id != id);
        Ok(())
    }

    /// Appends a freshly generated insight to the history. History is
    /// append-only; reports are never updated or deleted.
    pub async fn append_insight(&mut self, new: NewInsight) -> Result<AiInsight, AppError> {
        self.busy = true;
        let result = self.append_insight_inner(new).await;
        self.busy = false;
        if let Err(e) = &result {
            error!("Failed to record insight: {e}");
        }
        result
    }

    async fn append_insight_inner(&mut self, new: NewInsight) -> Result<AiInsight, AppError> {
        let id = self.gateway.create_insight(self.owner, &new).await?;
        let now = Utc::now();
        let insight = AiInsight {
            id,
            generated_at: new.generated_at,
            themes: new.themes,
            emotions: new.emotions,
            stressors: new.stressors,
            summary: new.summary,
            recommendations: new.recommendations,
            created_at: now,
            updated_at: now,
        };
        self.insights.push(insight.clone());
        self.insights
            .sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(insight)
    }

    fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| b.date.cmp(&a.date));
    }
}

/// Registry of live sessions keyed by owner. A missing session means the
/// owner has not signed in; mutating handlers reject that before any remote
/// call is made.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<SessionStore>>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reacts to an owner becoming present: constructs and bootstraps the
    /// session store. The session is registered even when bootstrap fails,
    /// so the user lands on an empty store rather than a crash loop.
    pub async fn sign_in(
        &self,
        gateway: Arc<dyn PersistenceGateway>,
        media: Arc<dyn MediaStore>,
        owner: Uuid,
    ) -> Result<Arc<Mutex<SessionStore>>, AppError> {
        let (store, outcome) = SessionStore::sign_in(gateway, media, owner).await;
        let session = Arc::new(Mutex::new(store));
        self.sessions.write().await.insert(owner, session.clone());
        outcome.map(|()| session)
    }

    pub async fn get(&self, owner: Uuid) -> Result<Arc<Mutex<SessionStore>>, AppError> {
        self.sessions
            .read()
            .await
            .get(&owner)
            .cloned()
            .ok_or(AppError::Unauthorized)
    }

    /// Reacts to an owner becoming absent: clears and drops the session.
    pub async fn sign_out(&self, owner: Uuid) {
        if let Some(session) = self.sessions.write().await.remove(&owner) {
            session.lock().await.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::media::testing::{InMemoryMediaStore, MediaCall};
    use crate::media::MediaSource;
    use crate::models::journal::Mood;
    use crate::models::reminder::Frequency;
    use crate::persistence::testing::InMemoryGateway;

    fn bytes(data: &[u8], mime: &str) -> MediaSource {
        MediaSource::Bytes {
            data: data.to_vec(),
            mime: mime.to_string(),
        }
    }

    fn draft(text: &str) -> EntryDraft {
        EntryDraft {
            text: text.to_string(),
            ..Default::default()
        }
    }

    async fn fresh_store() -> (Arc<InMemoryGateway>, Arc<InMemoryMediaStore>, SessionStore) {
        let gateway = Arc::new(InMemoryGateway::default());
        let media = Arc::new(InMemoryMediaStore::default());
        let (store, outcome) =
            SessionStore::sign_in(gateway.clone(), media.clone(), Uuid::new_v4()).await;
        outcome.unwrap();
        (gateway, media, store)
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_new_owner_once() {
        let gateway = Arc::new(InMemoryGateway::default());
        let media = Arc::new(InMemoryMediaStore::default());
        let owner = Uuid::new_v4();

        let (store, outcome) = SessionStore::sign_in(gateway.clone(), media.clone(), owner).await;
        outcome.unwrap();
        assert!(!store.entries().is_empty());
        assert_eq!(gateway.seed_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        // Second bootstrap for the same owner sees data and skips seeding.
        let (_, outcome) = SessionStore::sign_in(gateway.clone(), media, owner).await;
        outcome.unwrap();
        assert_eq!(gateway.seed_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_failure_leaves_store_empty_and_usable() {
        let gateway = Arc::new(InMemoryGateway::default());
        gateway.fail_on("list_reminders");
        let media = Arc::new(InMemoryMediaStore::default());

        let (store, outcome) = SessionStore::sign_in(gateway, media, Uuid::new_v4()).await;
        assert!(outcome.is_err());
        assert!(store.entries().is_empty());
        assert!(store.reminders().is_empty());
        assert!(store.insights().is_empty());
        assert!(!store.is_busy());
    }

    #[tokio::test]
    async fn test_add_entry_requires_text() {
        let (gateway, _, mut store) = fresh_store().await;
        let before = gateway.entries.lock().unwrap().len();

        let result = store.add_entry(draft("   ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(gateway.entries.lock().unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_memory_untouched() {
        let (gateway, _, mut store) = fresh_store().await;
        let before = store.entries().to_vec();
        gateway.fail_on("create_entry");

        let result = store.add_entry(draft("today was fine")).await;
        assert!(result.is_err());
        let after = store.entries();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.text, b.text);
        }
        assert!(!store.is_busy());
    }

    #[tokio::test]
    async fn test_failed_upload_aborts_before_any_write() {
        let (gateway, media, mut store) = fresh_store().await;
        let persisted = gateway.entries.lock().unwrap().len();
        *media.fail_uploads.lock().unwrap() = true;

        let result = store
            .add_entry(EntryDraft {
                text: "with a doomed note".to_string(),
                voice_note: Some(bytes(b"x", "audio/webm")),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(gateway.entries.lock().unwrap().len(), persisted);
        assert_eq!(store.entries().len(), persisted);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_memory_untouched() {
        let (gateway, _, mut store) = fresh_store().await;
        let id = store.entries()[0].id;
        let original_text = store.entries()[0].text.clone();
        gateway.fail_on("update_entry");

        let result = store
            .update_entry(
                id,
                EntryPatch {
                    text: Some("rewritten".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(store.entries()[0].text, original_text);
        assert!(!store.is_busy());
    }

    #[tokio::test]
    async fn test_entries_stay_sorted_by_date_desc() {
        let (_, _, mut store) = fresh_store().await;
        let old_date = Utc.with_ymd_and_hms(2020, 3, 1, 9, 0, 0).unwrap();

        let mut d = draft("an old day");
        d.date = Some(old_date);
        store.add_entry(d).await.unwrap();

        store.add_entry(draft("fresh thoughts")).await.unwrap();

        let dates: Vec<_> = store.entries().iter().map(|e| e.date).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }

    #[tokio::test]
    async fn test_attachment_replacement_deletes_old_then_uploads_new() {
        let (_, media, mut store) = fresh_store().await;

        let entry = store
            .add_entry(EntryDraft {
                text: "with a voice note".to_string(),
                voice_note: Some(bytes(b"old", "audio/webm")),
                ..Default::default()
            })
            .await
            .unwrap();
        let old_url = entry.voice_note_url.clone().unwrap();
        media.calls.lock().unwrap().clear();

        let updated = store
            .update_entry(
                entry.id,
                EntryPatch {
                    voice_note: AttachmentChange::Replace(bytes(b"new", "audio/webm")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let new_url = updated.voice_note_url.clone().unwrap();
        assert_ne!(new_url, old_url);
        assert_eq!(
            media.calls(),
            vec![MediaCall::Remove(old_url), MediaCall::Upload(new_url)]
        );
    }

    #[tokio::test]
    async fn test_clearing_attachment_deletes_object_and_unsets_ref() {
        let (_, media, mut store) = fresh_store().await;

        let entry = store
            .add_entry(EntryDraft {
                text: "with an image".to_string(),
                image: Some(bytes(b"png", "image/png")),
                ..Default::default()
            })
            .await
            .unwrap();
        let url = entry.image_url.clone().unwrap();

        let updated = store
            .update_entry(
                entry.id,
                EntryPatch {
                    image: AttachmentChange::Clear,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.image_url.is_none());
        assert!(!media.contains(&url));
    }

    #[tokio::test]
    async fn test_untouched_attachments_are_left_alone() {
        let (_, media, mut store) = fresh_store().await;

        let entry = store
            .add_entry(EntryDraft {
                text: "keep my note".to_string(),
                voice_note: Some(bytes(b"v", "audio/webm")),
                ..Default::default()
            })
            .await
            .unwrap();
        media.calls.lock().unwrap().clear();

        let updated = store
            .update_entry(
                entry.id,
                EntryPatch {
                    mood: Some(Mood::Good),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.voice_note_url, entry.voice_note_url);
        assert!(media.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_entry_removes_both_attachments() {
        let (gateway, media, mut store) = fresh_store().await;

        let entry = store
            .add_entry(EntryDraft {
                text: "fully loaded".to_string(),
                voice_note: Some(bytes(b"v", "audio/webm")),
                image: Some(bytes(b"i", "image/png")),
                ..Default::default()
            })
            .await
            .unwrap();
        let voice_url = entry.voice_note_url.clone().unwrap();
        let image_url = entry.image_url.clone().unwrap();

        store.delete_entry(entry.id).await.unwrap();

        assert!(!media.contains(&voice_url));
        assert!(!media.contains(&image_url));
        assert!(store.entries().iter().all(|e| e.id != entry.id));
        assert!(gateway
            .entries
            .lock()
            .unwrap()
            .iter()
            .all(|(_, e)| e.id != entry.id));
    }

    #[tokio::test]
    async fn test_new_reminder_defaults_active_and_lists_first() {
        let (_, _, mut store) = fresh_store().await;

        let reminder = store
            .add_reminder(NewReminder {
                title: "Evening stretch".to_string(),
                time: "21:30".to_string(),
                frequency: Frequency::Daily,
                description: None,
                active: true,
            })
            .await
            .unwrap();

        assert!(reminder.active);
        assert_eq!(store.reminders()[0].id, reminder.id);
    }

    #[tokio::test]
    async fn test_failed_reminder_update_leaves_memory_untouched() {
        let (gateway, _, mut store) = fresh_store().await;
        let id = store.reminders()[0].id;
        let was_active = store.reminders()[0].active;
        gateway.fail_on("update_reminder");

        let result = store
            .update_reminder(
                id,
                ReminderPatch {
                    active: Some(!was_active),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
        assert_eq!(store.reminders()[0].active, was_active);
    }

    #[tokio::test]
    async fn test_insights_ordered_by_generation_time_desc() {
        let (_, _, mut store) = fresh_store().await;
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mk = |offset: i64| NewInsight {
            generated_at: base + Duration::hours(offset),
            themes: vec![],
            emotions: vec![],
            stressors: vec![],
            summary: format!("report {offset}"),
            recommendations: String::new(),
        };

        // Appended out of order: T1, T3, T2.
        store.append_insight(mk(1)).await.unwrap();
        store.append_insight(mk(3)).await.unwrap();
        store.append_insight(mk(2)).await.unwrap();

        let recent: Vec<_> = store
            .insights()
            .iter()
            .filter(|i| i.summary.starts_with("report "))
            .map(|i| i.generated_at)
            .collect();
        assert_eq!(
            recent,
            vec![
                base + Duration::hours(3),
                base + Duration::hours(2),
                base + Duration::hours(1)
            ]
        );
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything_without_remote_calls() {
        let (gateway, media, mut store) = fresh_store().await;
        let persisted = gateway.entries.lock().unwrap().len();
        media.calls.lock().unwrap().clear();

        store.clear();

        assert!(store.entries().is_empty());
        assert!(store.reminders().is_empty());
        assert!(store.insights().is_empty());
        assert!(!store.is_busy());
        // Remote data is untouched.
        assert_eq!(gateway.entries.lock().unwrap().len(), persisted);
        assert!(media.calls().is_empty());
    }

    #[tokio::test]
    async fn test_registry_rejects_unknown_owner() {
        let registry = SessionRegistry::new();
        let result = registry.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
