//! Chat message types shared with the chat transport.

use serde::{Deserialize, Serialize};

/// A chat message snapshot as delivered by the transport.
///
/// While a reply streams, the transport replaces the last message with a
/// longer snapshot under the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// Create a message with a single text part.
    pub fn text(id: impl Into<String>, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            parts: vec![MessagePart::text(text)],
        }
    }

    /// Non-empty text of each text part, in order.
    pub fn text_parts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            MessagePart::Text { text } if !text.is_empty() => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    #[default]
    User,
    Assistant,
    System,
}

/// Message part. Only text parts carry markup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text {
        /// Older transports name this field `content`
        #[serde(alias = "content", default)]
        text: String,
    },
    Reasoning {
        #[serde(default)]
        text: String,
    },
    /// Tool calls, files and anything else the widget does not display
    #[serde(other)]
    Unsupported,
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Transport status for the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    /// Request sent, no tokens yet
    Submitted,
    /// Tokens arriving
    Streaming,
    #[default]
    Ready,
    Error,
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
