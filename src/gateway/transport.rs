// Keyforge - Chat Transport
//
// The operations the bot needs from a chat platform. The production
// implementation is the Bot API client; tests use a recording fake.

use std::future::Future;
use std::path::{Path, PathBuf};

use super::protocol::Update;
use super::GatewayError;

/// A message the bot sent, so it can be edited or deleted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Chat action shown while the bot works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadDocument,
}

impl ChatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::UploadDocument => "upload_document",
        }
    }
}

/// A local file to send as a document.
#[derive(Debug, Clone)]
pub struct OutgoingDocument {
    pub path: PathBuf,
    pub caption: Option<String>,
}

impl OutgoingDocument {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

pub trait ChatTransport: Send + Sync {
    /// Long-poll for updates with `update_id >= offset`.
    fn updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> impl Future<Output = Result<Vec<Update>, GatewayError>> + Send;

    fn send_text(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<MessageRef, GatewayError>> + Send;

    fn edit_text(&self, message: MessageRef, text: &str) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn delete(&self, message: MessageRef) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn send_action(&self, chat_id: i64, action: ChatAction) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Send documents as one album.
    fn send_documents(
        &self,
        chat_id: i64,
        documents: &[OutgoingDocument],
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Download an uploaded file to `dest`.
    fn download(&self, file_id: &str, dest: &Path) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
