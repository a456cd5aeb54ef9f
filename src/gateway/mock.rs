// Keyforge - Recording transport for tests

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use super::protocol::Update;
use super::transport::{ChatAction, ChatTransport, MessageRef, OutgoingDocument};
use super::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Edit { message_id: i64, text: String },
    Delete { message_id: i64 },
    Action { chat_id: i64, action: ChatAction },
    Documents {
        chat_id: i64,
        file_names: Vec<String>,
        captions: Vec<Option<String>>,
    },
}

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    uploads: Mutex<HashMap<String, Vec<u8>>>,
    updates: Mutex<VecDeque<Vec<Update>>>,
    next_id: AtomicI64,
    pub fail_documents: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `file_id` downloadable with `bytes`.
    pub fn add_upload(&self, file_id: &str, bytes: Vec<u8>) {
        self.uploads.lock().unwrap().insert(file_id.to_string(), bytes);
    }

    pub fn push_updates(&self, batch: Vec<Update>) {
        self.updates.lock().unwrap().push_back(batch);
    }

    pub fn queued_batches(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent as new messages or edits, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } | Sent::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn documents(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| matches!(s, Sent::Documents { .. }))
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

impl ChatTransport for RecordingTransport {
    async fn updates(&self, _offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<Update>, GatewayError> {
        Ok(self.updates.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageRef, GatewayError> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(MessageRef {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), GatewayError> {
        self.record(Sent::Edit {
            message_id: message.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), GatewayError> {
        self.record(Sent::Delete {
            message_id: message.message_id,
        });
        Ok(())
    }

    async fn send_action(&self, chat_id: i64, action: ChatAction) -> Result<(), GatewayError> {
        self.record(Sent::Action { chat_id, action });
        Ok(())
    }

    async fn send_documents(&self, chat_id: i64, documents: &[OutgoingDocument]) -> Result<(), GatewayError> {
        if self.fail_documents.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                method: "sendMediaGroup".to_string(),
                description: "Request Entity Too Large".to_string(),
            });
        }
        for doc in documents {
            assert!(doc.path.is_file(), "document must exist: {}", doc.path.display());
        }
        self.record(Sent::Documents {
            chat_id,
            file_names: documents
                .iter()
                .map(|d| d.path.file_name().unwrap().to_string_lossy().into_owned())
                .collect(),
            captions: documents.iter().map(|d| d.caption.clone()).collect(),
        });
        Ok(())
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), GatewayError> {
        let bytes = self
            .uploads
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| GatewayError::EmptyResult(format!("getFile({})", file_id)))?;
        std::fs::write(dest, bytes)?;
        Ok(())
    }
}
