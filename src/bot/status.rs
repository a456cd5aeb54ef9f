// Keyforge - Status Message
//
// A progress message that is edited as the request advances and deleted
// once the files are out. Failures to edit or delete are logged and
// otherwise ignored.

use crate::gateway::{ChatAction, ChatTransport, MessageRef};

pub struct StatusMessage<'a, T> {
    transport: &'a T,
    chat_id: i64,
    message: Option<MessageRef>,
}

impl<'a, T: ChatTransport> StatusMessage<'a, T> {
    pub async fn start(transport: &'a T, chat_id: i64, text: &str) -> Self {
        let message = match transport.send_text(chat_id, text).await {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "Could not send status message");
                None
            }
        };
        if let Err(e) = transport.send_action(chat_id, ChatAction::Typing).await {
            tracing::debug!(chat_id, error = %e, "Chat action failed");
        }
        Self {
            transport,
            chat_id,
            message,
        }
    }

    pub async fn update(&self, text: &str) {
        if let Some(message) = self.message {
            if let Err(e) = self.transport.edit_text(message, text).await {
                tracing::debug!(chat_id = self.chat_id, error = %e, "Status edit failed");
            }
        }
    }

    /// Remove the status message.
    pub async fn finish(self) {
        if let Some(message) = self.message {
            if let Err(e) = self.transport.delete(message).await {
                tracing::debug!(chat_id = self.chat_id, error = %e, "Status delete failed");
            }
        }
    }

    /// Replace the status with an error text, or send it if there is no status.
    pub async fn fail(self, text: &str) {
        if let Some(message) = self.message {
            if self.transport.edit_text(message, text).await.is_ok() {
                return;
            }
        }
        if let Err(e) = self.transport.send_text(self.chat_id, text).await {
            tracing::warn!(chat_id = self.chat_id, error = %e, "Could not report failure");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
