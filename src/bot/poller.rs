// Keyforge - Long-polling Loop
//
// Pulls updates from the chat transport and handles each one in its own
// task. Different chats run concurrently; updates of one chat run one after
// another in arrival order. The offset always moves past every received
// update, so a failing handler never causes a redelivery loop. On shutdown,
// in-flight handlers are awaited before returning.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::gateway::ChatTransport;
use crate::toolchain::ToolRunner;

use super::Bot;

/// Pause after a failed `getUpdates` call.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Tail of the handler chain of every chat with work in flight.
///
/// Each handler task owns a sender that is dropped when it finishes; the
/// next task for the same chat waits on the matching receiver first.
#[derive(Default)]
struct ChatChains {
    tails: HashMap<i64, oneshot::Receiver<()>>,
}

impl ChatChains {
    /// Register a new handler for `chat_id`. Returns the receiver of the
    /// handler it must wait for, and the sender it holds while running.
    fn enqueue(&mut self, chat_id: i64) -> (Option<oneshot::Receiver<()>>, oneshot::Sender<()>) {
        let (done, tail) = oneshot::channel();
        (self.tails.insert(chat_id, tail), done)
    }

    /// Forget chats whose last handler has finished.
    fn prune(&mut self) {
        self.tails
            .retain(|_, tail| matches!(tail.try_recv(), Err(oneshot::error::TryRecvError::Empty)));
    }

    fn len(&self) -> usize {
        self.tails.len()
    }
}

pub async fn run<R, T, S>(bot: Arc<Bot<R, T>>, poll_timeout_secs: u64, shutdown: S)
where
    R: ToolRunner + 'static,
    T: ChatTransport + 'static,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut offset: Option<i64> = None;
    let mut tasks = JoinSet::new();
    let mut chains = ChatChains::default();

    tracing::info!(poll_timeout_secs, "Polling for updates");

    loop {
        let polled = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            polled = bot.transport().updates(offset, poll_timeout_secs) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    let bot = bot.clone();
                    match update.message.as_ref().map(|m| m.chat.id) {
                        Some(chat_id) => {
                            let (previous, done) = chains.enqueue(chat_id);
                            tasks.spawn(async move {
                                if let Some(previous) = previous {
                                    // Resolves once the earlier handler drops its sender.
                                    let _ = previous.await;
                                }
                                bot.handle_update(update).await;
                                drop(done);
                            });
                        }
                        None => {
                            tasks.spawn(async move { bot.handle_update(update).await });
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Polling failed, retrying");
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }

        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Update handler panicked");
            }
        }
        chains.prune();
        bot.sessions().evict_expired();
    }

    if !tasks.is_empty() {
        chains.prune();
        tracing::info!(
            in_flight = tasks.len(),
            chats = chains.len(),
            "Waiting for in-flight requests"
        );
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Update handler panicked");
        }
    }
    tracing::info!("Polling stopped");
}

// ─── Tests ───────────────────────────────────────────────────────────────────
