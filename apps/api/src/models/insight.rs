use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable analysis report. Reports are append-only: the core never
/// updates or deletes them, and history is presented newest-first by
/// `generated_at` (the analysis time, not the write time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiInsight {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub themes: Vec<String>,
    pub emotions: Vec<String>,
    pub stressors: Vec<String>,
    pub summary: String,
    pub recommendations: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInsight {
    pub generated_at: DateTime<Utc>,
    pub themes: Vec<String>,
    pub emotions: Vec<String>,
    pub stressors: Vec<String>,
    pub summary: String,
    pub recommendations: String,
}
