// Keyforge - Bot API Client
//
// Talks to the Telegram Bot API over HTTPS with reqwest. The bot token is
// part of every URL, so it is kept in a zeroizing buffer and URLs are
// stripped from transport errors before they can reach a log line.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use zeroize::Zeroizing;

use super::protocol::{text_body, ApiResponse, FileInfo, InputMediaDocument, Message, Update};
use super::transport::{ChatAction, ChatTransport, MessageRef, OutgoingDocument};
use super::GatewayError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Extra time on top of the long-poll timeout before the HTTP request is abandoned.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Bot authentication token. Never printed.
#[derive(Clone)]
pub struct BotToken(Zeroizing<String>);

impl BotToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken([REDACTED])")
    }
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: BotToken,
}

fn http_err(e: reqwest::Error) -> GatewayError {
    GatewayError::Http(e.without_url())
}

impl TelegramClient {
    pub fn new(token: BotToken, api_base: &str) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(http_err)?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token.expose(), method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.token.expose(), file_path)
    }

    async fn decode<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let envelope: ApiResponse<T> = response.json().await.map_err(http_err)?;
        envelope.into_result().map_err(|description| GatewayError::Api {
            method: method.to_string(),
            description,
        })
    }

    /// Call a JSON method.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, GatewayError> {
        let mut request = self.http.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(http_err)?;
        Self::decode(method, response).await
    }

    /// Call a multipart method.
    async fn call_form<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(http_err)?;
        Self::decode(method, response).await
    }

    async fn file_part(path: &Path, fallback_name: &str) -> Result<Part, GatewayError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| fallback_name.to_string());
        Ok(Part::bytes(bytes).file_name(file_name))
    }
}

impl ChatTransport for TelegramClient {
    async fn updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, GatewayError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        self.call(
            "getUpdates",
            &body,
            Some(Duration::from_secs(timeout_secs) + POLL_GRACE),
        )
        .await
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageRef, GatewayError> {
        let message: Message = self.call("sendMessage", &text_body(chat_id, text), None).await?;
        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), GatewayError> {
        let body = serde_json::json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        let _: Value = self.call("editMessageText", &body, None).await?;
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), GatewayError> {
        let body = serde_json::json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
        });
        let _: bool = self.call("deleteMessage", &body, None).await?;
        Ok(())
    }

    async fn send_action(&self, chat_id: i64, action: ChatAction) -> Result<(), GatewayError> {
        let body = serde_json::json!({ "chat_id": chat_id, "action": action.as_str() });
        let _: bool = self.call("sendChatAction", &body, None).await?;
        Ok(())
    }

    async fn send_documents(&self, chat_id: i64, documents: &[OutgoingDocument]) -> Result<(), GatewayError> {
        // Albums need at least two items; a single file goes out as a plain document.
        if let [single] = documents {
            let mut form = Form::new()
                .text("chat_id", chat_id.to_string())
                .part("document", Self::file_part(&single.path, "document").await?);
            if let Some(caption) = &single.caption {
                form = form.text("caption", caption.clone());
            }
            let _: Message = self.call_form("sendDocument", form).await?;
            return Ok(());
        }

        let mut form = Form::new().text("chat_id", chat_id.to_string());
        let mut media = Vec::with_capacity(documents.len());

        for (i, doc) in documents.iter().enumerate() {
            let name = format!("file{}", i);
            form = form.part(name.clone(), Self::file_part(&doc.path, &name).await?);
            media.push(InputMediaDocument::attached(&name, doc.caption.clone()));
        }
        form = form.text("media", serde_json::to_string(&media)?);

        let _: Vec<Message> = self.call_form("sendMediaGroup", form).await?;
        Ok(())
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), GatewayError> {
        let info: FileInfo = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }), None)
            .await?;
        let file_path = info
            .file_path
            .ok_or_else(|| GatewayError::EmptyResult(format!("getFile({})", info.file_id)))?;

        let bytes = self
            .http
            .get(self.file_url(&file_path))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?
            .bytes()
            .await
            .map_err(http_err)?;

        tokio::fs::write(dest, &bytes).await?;
        tracing::debug!(bytes = bytes.len(), dest = %dest.display(), "Downloaded uploaded file");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
