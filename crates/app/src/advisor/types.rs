//! Wire types for the Anthropic Messages API.
//!
//! Only the subset needed for a single forced tool call is modelled: the
//! advisor never streams and never runs a multi-turn tool loop.

use serde::{Deserialize, Serialize};

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Sender: "user" or "assistant".
    pub role: String,
    /// Text or content blocks.
    pub content: MessageContent,
}

impl Message {
    /// A plain-text user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text(String),
    /// Multiple content blocks.
    Blocks(Vec<ContentBlock>),
}

/// One block of message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text content.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },
    /// Tool call made by the model.
    #[serde(rename = "tool_use")]
    ToolUse {
        /// Tool call ID.
        id: String,
        /// Name of the tool.
        name: String,
        /// Tool input, shaped by the tool's input schema.
        input: serde_json::Value,
    },
}

/// A tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool.
    pub name: String,
    /// Shown to the model.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub input_schema: serde_json::Value,
}

/// How the model must use the provided tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides.
    Auto,
    /// Model must call some tool.
    Any,
    /// Model must call the named tool.
    Tool {
        /// Tool name.
        name: String,
    },
}

/// Request body for the Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model ID.
    pub model: String,
    /// Output token cap.
    pub max_tokens: u32,
    /// Conversation so far.
    pub messages: Vec<Message>,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool selection policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Response from the Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique response ID.
    pub id: String,
    /// Model that replied.
    pub model: String,
    /// Why generation stopped.
    pub stop_reason: Option<StopReason>,
    /// Reply blocks.
    pub content: Vec<ContentBlock>,
    /// Token counts.
    pub usage: Usage,
}

impl ChatResponse {
    /// Input of the first call to the named tool, if any.
    #[must_use]
    pub fn tool_input(&self, tool_name: &str) -> Option<&serde_json::Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } if name == tool_name => Some(input),
            _ => None,
        })
    }

    /// Concatenated text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse { .. } => None,
            })
            .collect()
    }
}

/// Stop reason reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Finished normally.
    EndTurn,
    /// Max tokens reached.
    MaxTokens,
    /// Hit a stop sequence.
    StopSequence,
    /// Tool use requested.
    ToolUse,
}

/// Token counts.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    pub input_tokens: u32,
    /// Generated tokens.
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_content_text_serialization() {
        let message = Message::user("Hello");
        let json = serde_json::to_string(&message).expect("serialize");
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);
    }

    #[test]
    fn test_tool_choice_serialization() {
        let choice = ToolChoice::Tool {
            name: "record_adjustments".to_string(),
        };
        let json = serde_json::to_value(&choice).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "tool", "name": "record_adjustments"})
        );
    }

    #[test]
    fn test_chat_request_skips_unset_fields() {
        let request = ChatRequest {
            model: "m".to_string(),
            max_tokens: 10,
            messages: vec![Message::user("hi")],
            system: None,
            tools: None,
            tool_choice: None,
            temperature: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert!(json.get("system").is_none());
        assert!(json.get("tool_choice").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_chat_response_tool_input() {
        let json = r#"{
            "id": "msg_1",
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Balancing now."},
                {"type": "tool_use", "id": "toolu_1", "name": "record_adjustments",
                 "input": {"analysis": "ok", "adjustments": []}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 34}
        }"#;

        let response: ChatResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(response.text(), "Balancing now.");

        let input = response.tool_input("record_adjustments").expect("tool input");
        assert_eq!(input["analysis"], "ok");
        assert!(response.tool_input("other").is_none());
    }
}
