//! Insight Request Assembler — turns raw journal entries (attachment refs
//! resolved back to inline data URIs) into the fixed request shape the
//! analysis capability expects, invokes it, and stamps the result with its
//! generation time.

pub mod handlers;
pub mod prompts;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{ContentBlock, ImageSource, LlmClient, MessageParam};
use crate::media::{split_data_uri, MediaStore};
use crate::models::insight::NewInsight;
use crate::models::journal::JournalEntry;

/// One record of the fixed analysis request shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryForAnalysis {
    /// ISO-8601 date string.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_note_data_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data_uri: Option<String>,
}

/// The schema-constrained analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightPayload {
    pub themes: Vec<String>,
    pub emotions: Vec<String>,
    pub stressors: Vec<String>,
    pub summary: String,
    pub recommendations: String,
}

/// Analysis capability boundary. Implemented over the shared LLM client in
/// production; tests substitute their own.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, entries: &[EntryForAnalysis]) -> Result<InsightPayload, AppError>;

    /// Recommends concrete actions from already-identified themes/emotions.
    async fn recommend(&self, themes: &str, emotions: &str) -> Result<String, AppError>;
}

/// Assembled request plus the non-fatal attachment warnings gathered along
/// the way.
#[derive(Debug)]
pub struct AssembledRequest {
    pub entries: Vec<EntryForAnalysis>,
    pub warnings: Vec<String>,
}

/// Resolves each entry's attachment refs to inline data URIs. A failed
/// resolution drops that attachment for that entry only; the entry itself
/// always makes it into the request.
pub async fn assemble_analysis_entries(
    media: &dyn MediaStore,
    entries: &[JournalEntry],
) -> AssembledRequest {
    let mut assembled = Vec::with_capacity(entries.len());
    let mut warnings = Vec::new();

    for entry in entries {
        let date = entry.date.to_rfc3339();
        let voice_note_data_uri = resolve_attachment(
            media,
            entry.voice_note_url.as_deref(),
            "voice note",
            &date,
            &mut warnings,
        )
        .await;
        let image_data_uri = resolve_attachment(
            media,
            entry.image_url.as_deref(),
            "image",
            &date,
            &mut warnings,
        )
        .await;

        assembled.push(EntryForAnalysis {
            date,
            mood: entry.mood.map(|m| m.as_str().to_string()),
            text: entry.text.clone(),
            voice_note_data_uri,
            image_data_uri,
        });
    }

    AssembledRequest {
        entries: assembled,
        warnings,
    }
}

async fn resolve_attachment(
    media: &dyn MediaStore,
    url: Option<&str>,
    what: &str,
    date: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let url = url?;
    // Early revisions stored attachments inline; pass those straight through.
    if url.starts_with("data:") {
        return Some(url.to_string());
    }
    match media.fetch_as_data_uri(url).await {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!("Skipping unresolvable {what} for entry dated {date}: {e}");
            warnings.push(format!(
                "The {what} for the entry dated {date} could not be loaded and was left out of the analysis."
            ));
            None
        }
    }
}

/// Full generation step: assemble, analyze, stamp `generated_at`. The caller
/// appends the result to the session's insight history; nothing is recorded
/// when analysis fails.
pub async fn generate_insight(
    media: &dyn MediaStore,
    analyzer: &dyn Analyzer,
    entries: &[JournalEntry],
) -> Result<(NewInsight, Vec<String>), AppError> {
    if entries.is_empty() {
        return Err(AppError::Validation(
            "No journal entries to analyze".to_string(),
        ));
    }

    let assembled = assemble_analysis_entries(media, entries).await;
    let payload = analyzer.analyze(&assembled.entries).await?;

    Ok((
        NewInsight {
            generated_at: Utc::now(),
            themes: payload.themes,
            emotions: payload.emotions,
            stressors: payload.stressors,
            summary: payload.summary,
            recommendations: payload.recommendations,
        },
        assembled.warnings,
    ))
}

/// Production analyzer over the shared LLM client. Image payloads ride along
/// as native image blocks; voice notes are flagged in the rendered entry
/// (the Messages API takes no audio input).
pub struct LlmAnalyzer {
    llm: LlmClient,
}

impl LlmAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(&self, entries: &[EntryForAnalysis]) -> Result<InsightPayload, AppError> {
        let mut rendered = String::new();
        let mut image_blocks = Vec::new();

        for entry in entries {
            rendered.push_str("Journal Entry:\n");
            rendered.push_str(&format!("Date: {}\n", entry.date));
            rendered.push_str(&format!(
                "Mood: {}\n",
                entry.mood.as_deref().unwrap_or("Not specified")
            ));
            rendered.push_str(&format!("Text:\n{}\n", entry.text));
            if entry.voice_note_data_uri.is_some() {
                rendered.push_str("A voice note is attached to this entry.\n");
            }
            if let Some(uri) = &entry.image_data_uri {
                match split_data_uri(uri) {
                    Ok((mime, payload)) => {
                        rendered.push_str(&format!(
                            "An image is attached to this entry (image {}).\n",
                            image_blocks.len() + 1
                        ));
                        image_blocks.push(ContentBlock::Image {
                            source: ImageSource::base64(mime, payload),
                        });
                    }
                    Err(e) => warn!("Skipping undecodable image payload: {e}"),
                }
            }
            rendered.push_str("--- End of Entry ---\n\n");
        }

        let system = prompts::ANALYZE_SYSTEM.replace("{json_only}", JSON_ONLY_SYSTEM);
        let prompt = prompts::ANALYZE_PROMPT.replace("{entries}", &rendered);
        let mut blocks = vec![ContentBlock::Text { text: prompt }];
        blocks.extend(image_blocks);

        let response = self
            .llm
            .call_messages(&system, &[MessageParam::user(blocks)], None)
            .await
            .map_err(|e| AppError::Llm(format!("Analysis call failed: {e}")))?;

        let text = response
            .text()
            .ok_or_else(|| AppError::Llm("Analysis returned no result".to_string()))?;
        let payload = serde_json::from_str(crate::llm_client::strip_json_fences(text))
            .map_err(|e| AppError::Llm(format!("Analysis returned malformed JSON: {e}")))?;
        Ok(payload)
    }

    async fn recommend(&self, themes: &str, emotions: &str) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Recommended {
            actions: String,
        }

        let system = prompts::RECOMMEND_SYSTEM.replace("{json_only}", JSON_ONLY_SYSTEM);
        let prompt = prompts::RECOMMEND_PROMPT
            .replace("{themes}", themes)
            .replace("{emotions}", emotions);
        let recommended: Recommended = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Recommendation call failed: {e}")))?;
        Ok(recommended.actions)
    }
}
