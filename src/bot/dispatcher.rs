// Keyforge - Update Dispatcher
//
// Routes one incoming message: commands first, then uploaded keystores,
// then text, which is either the answer to a pending reuse prompt or a new
// package request.

use zeroize::Zeroizing;

use crate::gateway::{ChatTransport, Document, Update, User};
use crate::params::{split_text_request, Credentials};
use crate::pipeline::{Delivery, LockedRecord, Pipeline, PipelineError, ReuseOutcome};
use crate::session::{ChoiceOutcome, ReuseChoice, SessionTracker};
use crate::store::{PackageId, Requester};
use crate::toolchain::ToolRunner;

use super::messages;
use super::status::StatusMessage;

/// File name assumed for uploads that arrive without one.
const DEFAULT_UPLOAD_NAME: &str = "keystore.jks";

/// Bot-side state shared by all update handlers.
pub struct Bot<R, T> {
    pipeline: Pipeline<R>,
    transport: T,
    sessions: SessionTracker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    Status,
}

impl Command {
    /// `/start`, `/help` or `/status`, optionally addressed as `/cmd@botname`.
    fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word);
        match name.to_lowercase().as_str() {
            "start" | "help" => Some(Self::Help),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

fn requester_of(user: Option<&User>) -> Requester {
    match user {
        Some(user) => Requester {
            user_id: Some(user.id.to_string()),
            username: user.username.clone(),
            full_name: Some(user.full_name()),
        },
        None => Requester::default(),
    }
}

impl<R: ToolRunner, T: ChatTransport> Bot<R, T> {
    pub fn new(pipeline: Pipeline<R>, transport: T, sessions: SessionTracker) -> Self {
        Self {
            pipeline,
            transport,
            sessions,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let chat_id = message.chat.id;
        let requester = requester_of(message.from.as_ref());

        if let Some(document) = &message.document {
            self.handle_document(chat_id, document, message.caption.as_deref(), &requester)
                .await;
        } else if let Some(text) = &message.text {
            self.handle_text(chat_id, text, &requester).await;
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            tracing::warn!(chat_id, error = %e, "Reply failed");
        }
    }

    async fn handle_text(&self, chat_id: i64, text: &str, requester: &Requester) {
        if text.trim_start().starts_with('/') {
            match Command::parse(text) {
                Some(Command::Status) => self.reply(chat_id, messages::STATUS_OK).await,
                Some(Command::Help) | None => {
                    let resolver = self.pipeline.resolver();
                    let help = messages::help(resolver.default_alias(), resolver.default_password());
                    self.reply(chat_id, &help).await
                }
            }
            return;
        }

        match self.sessions.on_reply(chat_id, text) {
            ChoiceOutcome::Reprompt => self.reply(chat_id, messages::CHOICE_REPROMPT).await,
            ChoiceOutcome::Decided {
                package,
                accompanying,
                choice,
            } => {
                tracing::info!(chat_id, package = %package, ?choice, "Reuse prompt answered");
                self.run_choice(chat_id, &package, &accompanying, choice, requester)
                    .await
            }
            ChoiceOutcome::NotAwaiting => self.handle_request(chat_id, text, requester).await,
        }
    }

    async fn handle_request(&self, chat_id: i64, text: &str, requester: &Requester) {
        let Some(request) = split_text_request(text) else {
            self.reply(chat_id, messages::EMPTY_REQUEST).await;
            return;
        };
        let package = PackageId::sanitize(request.package);
        let accompanying = Zeroizing::new(request.rest.join("\n"));

        tracing::info!(chat_id, package = %package, user_id = ?requester.user_id, "Keystore requested");

        if self.pipeline.has_record(&package) {
            self.sessions
                .await_choice(chat_id, package.clone(), accompanying.as_str().to_owned());
            self.reply(chat_id, &messages::choice_prompt(&package)).await;
            return;
        }

        self.run_choice(chat_id, &package, &accompanying, ReuseChoice::Regenerate, requester)
            .await
    }

    async fn run_choice(
        &self,
        chat_id: i64,
        package: &PackageId,
        accompanying: &str,
        choice: ReuseChoice,
        requester: &Requester,
    ) {
        let creds = self.pipeline.resolver().credentials(Some(accompanying));
        let params = self.pipeline.parameters(creds);

        match choice {
            ReuseChoice::Regenerate => {
                let status = StatusMessage::start(&self.transport, chat_id, messages::GENERATING).await;
                let result = self.pipeline.generate(package, &params, requester).await;
                self.deliver(chat_id, status, result).await;
            }
            ReuseChoice::Reuse => {
                let status = StatusMessage::start(&self.transport, chat_id, messages::REUSING).await;
                let result = match self.pipeline.reuse(package, &params, requester).await {
                    Ok(ReuseOutcome::Reused(record)) => Ok(record),
                    Ok(ReuseOutcome::Regenerated(record)) => {
                        self.reply(chat_id, messages::PREVIOUS_FILES_MISSING).await;
                        Ok(record)
                    }
                    Err(e) => Err(e),
                };
                self.deliver(chat_id, status, result).await;
            }
        }
    }

    async fn handle_document(
        &self,
        chat_id: i64,
        document: &Document,
        caption: Option<&str>,
        requester: &Requester,
    ) {
        let file_name = document.file_name.as_deref().unwrap_or(DEFAULT_UPLOAD_NAME);
        let package = PackageId::from_file_name(file_name);
        let creds = self.pipeline.resolver().credentials(caption);

        tracing::info!(chat_id, package = %package, user_id = ?requester.user_id, "Keystore uploaded");

        let status = StatusMessage::start(&self.transport, chat_id, messages::CONVERTING).await;
        let result = self.convert(document, &package, &creds, requester).await;
        self.deliver(chat_id, status, result).await;
    }

    async fn convert(
        &self,
        document: &Document,
        package: &PackageId,
        creds: &Credentials,
        requester: &Requester,
    ) -> Result<LockedRecord, PipelineError> {
        let download_dir = tempfile::tempdir()?;
        let upload = download_dir.path().join(format!("{}.upload", package));
        self.transport
            .download(&document.file_id, &upload)
            .await
            .map_err(PipelineError::Upload)?;
        self.pipeline.convert(package, creds, &upload, requester).await
    }

    async fn deliver(
        &self,
        chat_id: i64,
        status: StatusMessage<'_, T>,
        result: Result<LockedRecord, PipelineError>,
    ) {
        let outcome = match result {
            Ok(record) => {
                status.update(messages::SENDING).await;
                Delivery::new(&self.transport, chat_id).send_record(&record).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => status.finish().await,
            Err(e) => {
                tracing::error!(chat_id, error = %e, "Request failed");
                status.fail(&e.user_message()).await;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
