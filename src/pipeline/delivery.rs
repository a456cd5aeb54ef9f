// Keyforge - Delivery
//
// Writes the requester audit file into a record and sends the record back
// to the chat: keystore and PEM as one album, the info text as the PEM's
// caption.

use crate::gateway::{ChatAction, ChatTransport, OutgoingDocument};
use crate::store::{KeystoreRecord, ProjectPaths, Requester};

use super::PipelineError;

/// Write `user.txt` for `requester` into a live record.
pub fn record_requester(paths: &ProjectPaths, requester: &Requester) -> std::io::Result<()> {
    requester.write_to(&paths.user)?;
    tracing::debug!(user_id = ?requester.user_id, dir = %paths.dir.display(), "Recorded requester");
    Ok(())
}

pub struct Delivery<'a, T> {
    transport: &'a T,
    chat_id: i64,
}

impl<'a, T: ChatTransport> Delivery<'a, T> {
    pub fn new(transport: &'a T, chat_id: i64) -> Self {
        Self { transport, chat_id }
    }

    /// Send the keystore and PEM of `record`.
    pub async fn send_record(&self, record: &KeystoreRecord) -> Result<(), PipelineError> {
        let paths = &record.paths;
        for file in [&paths.keystore, &paths.certificate, &paths.info, &paths.user] {
            if !file.is_file() {
                return Err(PipelineError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("record file missing: {}", file.display()),
                )));
            }
        }

        if let Err(e) = self.transport.send_action(self.chat_id, ChatAction::UploadDocument).await {
            tracing::debug!(error = %e, "Chat action failed");
        }

        let documents = [
            OutgoingDocument::new(&paths.keystore),
            OutgoingDocument::new(&paths.certificate).with_caption(record.info.as_str()),
        ];
        self.transport
            .send_documents(self.chat_id, &documents)
            .await
            .map_err(PipelineError::Delivery)?;

        tracing::info!(package = %record.package, chat_id = self.chat_id, "Delivered keystore record");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
