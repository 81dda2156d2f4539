//! Conversational orchestration: bounded history in, tool loop against the
//! session's collections, final text out.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coach::{context_summary, prompts, CoachTool};
use crate::errors::AppError;
use crate::llm_client::{ContentBlock, LlmClient, MessageParam};
use crate::models::journal::JournalEntry;
use crate::models::reminder::Reminder;

/// How many trailing history messages accompany a new chat turn.
pub const HISTORY_LIMIT: usize = 10;
/// Upper bound on tool-use round trips within one chat turn.
const MAX_TOOL_ROUNDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    fn as_param_role(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Runs one coach turn. The agent sees the bounded context summary up front
/// and may invoke the lookup tools any number of times (up to the round
/// bound) before producing its final response.
pub async fn chat_with_coach(
    llm: &LlmClient,
    history: &[ChatMessage],
    new_message: &str,
    entries: &[JournalEntry],
    reminders: &[Reminder],
) -> Result<String, AppError> {
    let system = prompts::COACH_SYSTEM_TEMPLATE
        .replace("{context_summary}", &context_summary(entries, reminders));

    let mut messages: Vec<MessageParam> = Vec::new();
    let skip = history.len().saturating_sub(HISTORY_LIMIT);
    for message in &history[skip..] {
        messages.push(MessageParam {
            role: message.role.as_param_role(),
            content: vec![ContentBlock::Text {
                text: message.content.clone(),
            }],
        });
    }
    messages.push(MessageParam::user_text(new_message));

    let tools = CoachTool::definitions();

    for round in 0..MAX_TOOL_ROUNDS {
        let response = llm
            .call_messages(&system, &messages, Some(&tools))
            .await
            .map_err(|e| AppError::Llm(format!("Coach chat call failed: {e}")))?;

        if !response.wants_tools() {
            return response
                .text()
                .map(str::to_string)
                .ok_or_else(|| AppError::Llm("Coach returned empty content".to_string()));
        }

        let mut results = Vec::new();
        for block in &response.content {
            if let ContentBlock::ToolUse { id, name, input } = block {
                let output = match CoachTool::parse(name, input) {
                    Some(tool) => {
                        debug!("Coach tool round {round}: invoking {name}");
                        tool.invoke(entries, reminders)
                    }
                    None => {
                        warn!("Coach requested unknown or malformed tool: {name}");
                        serde_json::json!([])
                    }
                };
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: output.to_string(),
                });
            }
        }

        messages.push(MessageParam::assistant(response.content));
        messages.push(MessageParam::user(results));
    }

    Err(AppError::Llm(
        "Coach exceeded the tool-call round limit".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_round_trip() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#).unwrap();
        assert_eq!(message.role, ChatRole::Assistant);
        assert_eq!(
            serde_json::to_value(&message).unwrap()["role"],
            "assistant"
        );
    }
}
