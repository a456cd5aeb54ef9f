// Keyforge - Bot API Wire Types
//
// The subset of the Telegram Bot API object model the bot reads and writes.
// We define these directly rather than pulling in a bot framework, since
// only a handful of types and methods are needed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Result of `getFile`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// One entry of a `sendMediaGroup` request.
#[derive(Debug, Serialize)]
pub struct InputMediaDocument {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl InputMediaDocument {
    /// A document referencing the multipart field `attach_name`.
    pub fn attached(attach_name: &str, caption: Option<String>) -> Self {
        Self {
            kind: "document",
            media: format!("attach://{}", attach_name),
            caption,
        }
    }
}

impl<T> ApiResponse<T> {
    /// Unwrap the result or turn the envelope into an error description.
    pub fn into_result(self) -> Result<T, String> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err("missing result".to_string()),
            (false, _) => Err(self
                .description
                .unwrap_or_else(|| "unknown error".to_string())),
        }
    }
}

/// Body for methods that only need a chat id and text.
pub fn text_body(chat_id: i64, text: &str) -> Value {
    serde_json::json!({ "chat_id": chat_id, "text": text })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
