//! Axum route handlers for sessions, journal entries, and reminders.
//! Handlers validate, delegate to the session store, and map errors.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::media::MediaSource;
use crate::models::journal::{AttachmentChange, EntryDraft, EntryPatch, JournalEntry, Mood};
use crate::models::reminder::{Frequency, NewReminder, Reminder, ReminderPatch};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignInRequest {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct SessionSnapshot {
    pub user_id: Uuid,
    pub entries: usize,
    pub reminders: usize,
    pub insights: usize,
    pub busy: bool,
}

/// POST /api/v1/session
///
/// Reacts to sign-in: constructs and bootstraps the user's session store
/// (seeding starter content for brand-new users).
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state
        .sessions
        .sign_in(state.gateway.clone(), state.media.clone(), req.user_id)
        .await?;
    let store = session.lock().await;
    Ok(Json(SessionSnapshot {
        user_id: store.owner(),
        entries: store.entries().len(),
        reminders: store.reminders().len(),
        insights: store.insights().len(),
        busy: store.is_busy(),
    }))
}

/// DELETE /api/v1/session/:user_id
///
/// Reacts to sign-out: clears and drops the session. Always succeeds.
pub async fn handle_sign_out(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> StatusCode {
    state.sessions.sign_out(user_id).await;
    StatusCode::NO_CONTENT
}

// ────────────────────────────────────────────────────────────────────────────
// Journal entries
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateEntryRequest {
    pub user_id: Uuid,
    pub text: String,
    pub date: Option<DateTime<Utc>>,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub voice_note_data_uri: Option<String>,
    pub image_data_uri: Option<String>,
}

/// GET /api/v1/journal
pub async fn handle_list_entries(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    let session = state.sessions.get(params.user_id).await?;
    let store = session.lock().await;
    Ok(Json(store.entries().to_vec()))
}

/// POST /api/v1/journal
pub async fn handle_create_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<Json<JournalEntry>, AppError> {
    let session = state.sessions.get(req.user_id).await?;
    let mut store = session.lock().await;
    let entry = store
        .add_entry(EntryDraft {
            date: req.date,
            text: req.text,
            mood: req.mood,
            tags: req.tags,
            voice_note: req.voice_note_data_uri.map(MediaSource::DataUri),
            image: req.image_data_uri.map(MediaSource::DataUri),
        })
        .await?;
    Ok(Json(entry))
}

#[derive(Deserialize)]
pub struct UpdateEntryRequest {
    pub user_id: Uuid,
    pub date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub mood: Option<Mood>,
    pub tags: Option<Vec<String>>,
    pub voice_note_data_uri: Option<String>,
    #[serde(default)]
    pub remove_voice_note: bool,
    pub image_data_uri: Option<String>,
    #[serde(default)]
    pub remove_image: bool,
}

fn attachment_change(data_uri: Option<String>, remove: bool) -> AttachmentChange {
    if remove {
        AttachmentChange::Clear
    } else if let Some(uri) = data_uri {
        AttachmentChange::Replace(MediaSource::DataUri(uri))
    } else {
        AttachmentChange::Keep
    }
}

/// PATCH /api/v1/journal/:id
///
/// Merges the supplied fields. Supplying a new attachment payload replaces
/// (and deletes) the old object; setting the remove flag clears it.
pub async fn handle_update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Json<JournalEntry>, AppError> {
    let session = state.sessions.get(req.user_id).await?;
    let mut store = session.lock().await;
    let entry = store
        .update_entry(
            id,
            EntryPatch {
                date: req.date,
                text: req.text,
                mood: req.mood,
                tags: req.tags,
                voice_note: attachment_change(req.voice_note_data_uri, req.remove_voice_note),
                image: attachment_change(req.image_data_uri, req.remove_image),
            },
        )
        .await?;
    Ok(Json(entry))
}

/// DELETE /api/v1/journal/:id
pub async fn handle_delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let session = state.sessions.get(params.user_id).await?;
    let mut store = session.lock().await;
    store.delete_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Reminders
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateReminderRequest {
    pub user_id: Uuid,
    pub title: String,
    pub time: String,
    pub frequency: Frequency,
    pub description: Option<String>,
    /// New reminders default to active.
    pub active: Option<bool>,
}

/// GET /api/v1/reminders
pub async fn handle_list_reminders(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Reminder>>, AppError> {
    let session = state.sessions.get(params.user_id).await?;
    let store = session.lock().await;
    Ok(Json(store.reminders().to_vec()))
}

/// POST /api/v1/reminders
pub async fn handle_create_reminder(
    State(state): State<AppState>,
    Json(req): Json<CreateReminderRequest>,
) -> Result<Json<Reminder>, AppError> {
    let session = state.sessions.get(req.user_id).await?;
    let mut store = session.lock().await;
    let reminder = store
        .add_reminder(NewReminder {
            title: req.title,
            time: req.time,
            frequency: req.frequency,
            description: req.description,
            active: req.active.unwrap_or(true),
        })
        .await?;
    Ok(Json(reminder))
}

#[derive(Deserialize)]
pub struct UpdateReminderRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub time: Option<String>,
    pub frequency: Option<Frequency>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// PATCH /api/v1/reminders/:id
pub async fn handle_update_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReminderRequest>,
) -> Result<Json<Reminder>, AppError> {
    let session = state.sessions.get(req.user_id).await?;
    let mut store = session.lock().await;
    let reminder = store
        .update_reminder(
            id,
            ReminderPatch {
                title: req.title,
                time: req.time,
                frequency: req.frequency,
                description: req.description,
                active: req.active,
            },
        )
        .await?;
    Ok(Json(reminder))
}

/// DELETE /api/v1/reminders/:id
pub async fn handle_delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let session = state.sessions.get(params.user_id).await?;
    let mut store = session.lock().await;
    store.delete_reminder(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
