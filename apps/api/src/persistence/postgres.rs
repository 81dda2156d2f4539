//! PostgreSQL implementation of the persistence gateway. Each table is
//! scoped by `user_id`; ids are generated here so a caller-supplied id can
//! never leak into a write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgQueryResult;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::insight::{AiInsight, NewInsight};
use crate::models::journal::{JournalEntry, JournalEntryPatch, Mood, NewJournalEntry};
use crate::models::reminder::{Frequency, NewReminder, Reminder, ReminderPatch};
use crate::persistence::{EntityKind, GatewayError, PersistenceGateway, SeedData};

pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct JournalEntryRow {
    id: Uuid,
    date: DateTime<Utc>,
    text: String,
    mood: Option<String>,
    voice_note_url: Option<String>,
    image_url: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<JournalEntryRow> for JournalEntry {
    fn from(row: JournalEntryRow) -> Self {
        JournalEntry {
            id: row.id,
            date: row.date,
            text: row.text,
            // An unknown stored mood degrades to "no mood" instead of
            // failing the whole listing.
            mood: row.mood.as_deref().and_then(Mood::parse),
            voice_note_url: row.voice_note_url,
            image_url: row.image_url,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRow {
    id: Uuid,
    title: String,
    time: String,
    frequency: String,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReminderRow> for Reminder {
    fn from(row: ReminderRow) -> Self {
        Reminder {
            id: row.id,
            title: row.title,
            time: row.time,
            frequency: Frequency::from(row.frequency),
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InsightRow {
    id: Uuid,
    generated_at: DateTime<Utc>,
    themes: Vec<String>,
    emotions: Vec<String>,
    stressors: Vec<String>,
    summary: String,
    recommendations: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InsightRow> for AiInsight {
    fn from(row: InsightRow) -> Self {
        AiInsight {
            id: row.id,
            generated_at: row.generated_at,
            themes: row.themes,
            emotions: row.emotions,
            stressors: row.stressors,
            summary: row.summary,
            recommendations: row.recommendations,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn insert_entry<'e>(
    exec: impl PgExecutor<'e>,
    owner: Uuid,
    entry: &NewJournalEntry,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO journal_entries
            (id, user_id, date, text, mood, voice_note_url, image_url, tags, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(entry.date)
    .bind(&entry.text)
    .bind(entry.mood.map(|m| m.as_str()))
    .bind(&entry.voice_note_url)
    .bind(&entry.image_url)
    .bind(&entry.tags)
    .bind(now)
    .execute(exec)
    .await?;
    Ok(id)
}

async fn insert_reminder<'e>(
    exec: impl PgExecutor<'e>,
    owner: Uuid,
    reminder: &NewReminder,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO reminders
            (id, user_id, title, time, frequency, description, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(&reminder.title)
    .bind(&reminder.time)
    .bind(reminder.frequency.as_str())
    .bind(&reminder.description)
    .bind(reminder.active)
    .bind(now)
    .execute(exec)
    .await?;
    Ok(id)
}

async fn insert_insight<'e>(
    exec: impl PgExecutor<'e>,
    owner: Uuid,
    insight: &NewInsight,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO insights
            (id, user_id, generated_at, themes, emotions, stressors, summary, recommendations,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        "#,
    )
    .bind(id)
    .bind(owner)
    .bind(insight.generated_at)
    .bind(&insight.themes)
    .bind(&insight.emotions)
    .bind(&insight.stressors)
    .bind(&insight.summary)
    .bind(&insight.recommendations)
    .bind(now)
    .execute(exec)
    .await?;
    Ok(id)
}

fn require_row(result: PgQueryResult, kind: EntityKind, op: &'static str, id: Uuid) -> Result<(), GatewayError> {
    if result.rows_affected() == 0 {
        return Err(GatewayError::new(
            kind,
            op,
            anyhow::anyhow!("no document with id {id}"),
        ));
    }
    Ok(())
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn create_entry(
        &self,
        owner: Uuid,
        entry: &NewJournalEntry,
    ) -> Result<Uuid, GatewayError> {
        insert_entry(&self.pool, owner, entry)
            .await
            .map_err(|e| GatewayError::new(EntityKind::JournalEntries, "create", e))
    }

    async fn list_entries(&self, owner: Uuid) -> Result<Vec<JournalEntry>, GatewayError> {
        let rows = sqlx::query_as::<_, JournalEntryRow>(
            "SELECT * FROM journal_entries WHERE user_id = $1 ORDER BY date DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::new(EntityKind::JournalEntries, "list", e))?;
        Ok(rows.into_iter().map(JournalEntry::from).collect())
    }

    async fn update_entry(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &JournalEntryPatch,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query(
            r#"
            UPDATE journal_entries SET
                date = COALESCE($3, date),
                text = COALESCE($4, text),
                mood = COALESCE($5, mood),
                tags = COALESCE($6, tags),
                voice_note_url = CASE WHEN $7 THEN $8 ELSE voice_note_url END,
                image_url = CASE WHEN $9 THEN $10 ELSE image_url END,
                updated_at = $11
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(owner)
        .bind(id)
        .bind(patch.date)
        .bind(&patch.text)
        .bind(patch.mood.map(|m| m.as_str()))
        .bind(&patch.tags)
        .bind(patch.voice_note_url.is_change())
        .bind(patch.voice_note_url.value().map(String::as_str))
        .bind(patch.image_url.is_change())
        .bind(patch.image_url.value().map(String::as_str))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::new(EntityKind::JournalEntries, "update", e))?;
        require_row(result, EntityKind::JournalEntries, "update", id)
    }

    async fn delete_entry(&self, owner: Uuid, id: Uuid) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM journal_entries WHERE user_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::new(EntityKind::JournalEntries, "delete", e))?;
        Ok(())
    }

    async fn create_reminder(
        &self,
        owner: Uuid,
        reminder: &NewReminder,
    ) -> Result<Uuid, GatewayError> {
        insert_reminder(&self.pool, owner, reminder)
            .await
            .map_err(|e| GatewayError::new(EntityKind::Reminders, "create", e))
    }

    async fn list_reminders(&self, owner: Uuid) -> Result<Vec<Reminder>, GatewayError> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            "SELECT * FROM reminders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::new(EntityKind::Reminders, "list", e))?;
        Ok(rows.into_iter().map(Reminder::from).collect())
    }

    async fn update_reminder(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: &ReminderPatch,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query(
            r#"
            UPDATE reminders SET
                title = COALESCE($3, title),
                time = COALESCE($4, time),
                frequency = COALESCE($5, frequency),
                description = COALESCE($6, description),
                active = COALESCE($7, active),
                updated_at = $8
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(owner)
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.time)
        .bind(patch.frequency.as_ref().map(Frequency::as_str))
        .bind(&patch.description)
        .bind(patch.active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::new(EntityKind::Reminders, "update", e))?;
        require_row(result, EntityKind::Reminders, "update", id)
    }

    async fn delete_reminder(&self, owner: Uuid, id: Uuid) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM reminders WHERE user_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::new(EntityKind::Reminders, "delete", e))?;
        Ok(())
    }

    async fn create_insight(
        &self,
        owner: Uuid,
        insight: &NewInsight,
    ) -> Result<Uuid, GatewayError> {
        insert_insight(&self.pool, owner, insight)
            .await
            .map_err(|e| GatewayError::new(EntityKind::Insights, "create", e))
    }

    async fn list_insights(&self, owner: Uuid) -> Result<Vec<AiInsight>, GatewayError> {
        let rows = sqlx::query_as::<_, InsightRow>(
            "SELECT * FROM insights WHERE user_id = $1 ORDER BY generated_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::new(EntityKind::Insights, "list", e))?;
        Ok(rows.into_iter().map(AiInsight::from).collect())
    }

    async fn has_any_data(&self, owner: Uuid, kind: EntityKind) -> Result<bool, GatewayError> {
        let query = match kind {
            EntityKind::JournalEntries => {
                "SELECT EXISTS(SELECT 1 FROM journal_entries WHERE user_id = $1)"
            }
            EntityKind::Reminders => "SELECT EXISTS(SELECT 1 FROM reminders WHERE user_id = $1)",
            EntityKind::Insights => "SELECT EXISTS(SELECT 1 FROM insights WHERE user_id = $1)",
        };
        sqlx::query_scalar::<_, bool>(query)
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GatewayError::new(kind, "existence check", e))
    }

    async fn seed_initial_data(&self, owner: Uuid, seed: &SeedData) -> Result<(), GatewayError> {
        let seed_err =
            |e: sqlx::Error| GatewayError::new(EntityKind::JournalEntries, "seed", e);

        let mut tx = self.pool.begin().await.map_err(seed_err)?;
        for entry in &seed.entries {
            insert_entry(&mut *tx, owner, entry).await.map_err(seed_err)?;
        }
        for reminder in &seed.reminders {
            insert_reminder(&mut *tx, owner, reminder)
                .await
                .map_err(seed_err)?;
        }
        for insight in &seed.insights {
            insert_insight(&mut *tx, owner, insight)
                .await
                .map_err(seed_err)?;
        }
        tx.commit().await.map_err(seed_err)
    }
}
