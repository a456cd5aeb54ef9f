// Keyforge - Reuse Prompt Tracker
//
// When a package already has a keystore, the conversation waits for a
// `1` (reuse) or `2` (regenerate) reply. That wait is an explicit entry in a
// map keyed by chat id, evicted on a valid reply or after a timeout.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use zeroize::Zeroizing;

use crate::store::PackageId;

/// Reply to the reuse prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseChoice {
    /// Keep the existing private key, re-issue its certificate.
    Reuse,
    /// Archive the old record and generate fresh key material.
    Regenerate,
}

impl ReuseChoice {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "1" | "reuse" | "старый" => Some(Self::Reuse),
            "2" | "new" | "новый" => Some(Self::Regenerate),
            _ => None,
        }
    }
}

/// Per-conversation state. A conversation without an entry is idle.
enum ConversationState {
    AwaitingChoice {
        package: PackageId,
        /// Alias/password lines that came with the package name.
        accompanying: Zeroizing<String>,
        since: Instant,
    },
}

/// What to do with an incoming text message.
pub enum ChoiceOutcome {
    /// No prompt pending; treat the text as a new request.
    NotAwaiting,
    /// Prompt pending but the reply was not `1`/`2`.
    Reprompt,
    /// Valid reply; the prompt is cleared.
    Decided {
        package: PackageId,
        accompanying: Zeroizing<String>,
        choice: ReuseChoice,
    },
}

impl fmt::Debug for ChoiceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAwaiting => f.write_str("NotAwaiting"),
            Self::Reprompt => f.write_str("Reprompt"),
            Self::Decided { package, choice, .. } => f
                .debug_struct("Decided")
                .field("package", package)
                .field("accompanying", &"[REDACTED]")
                .field("choice", choice)
                .finish(),
        }
    }
}

pub struct SessionTracker {
    states: Mutex<HashMap<i64, ConversationState>>,
    ttl: Duration,
}

impl SessionTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn states(&self) -> std::sync::MutexGuard<'_, HashMap<i64, ConversationState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, state: &ConversationState) -> bool {
        match state {
            ConversationState::AwaitingChoice { since, .. } => since.elapsed() >= self.ttl,
        }
    }

    /// Start waiting for a reuse/regenerate reply in `chat`.
    pub fn await_choice(&self, chat: i64, package: PackageId, accompanying: String) {
        self.states().insert(
            chat,
            ConversationState::AwaitingChoice {
                package,
                accompanying: Zeroizing::new(accompanying),
                since: Instant::now(),
            },
        );
    }

    pub fn is_awaiting(&self, chat: i64) -> bool {
        let mut states = self.states();
        let expired = match states.get(&chat) {
            Some(state) => self.is_expired(state),
            None => return false,
        };
        if expired {
            states.remove(&chat);
        }
        !expired
    }

    /// Feed a text reply into the conversation's state machine.
    pub fn on_reply(&self, chat: i64, text: &str) -> ChoiceOutcome {
        let mut states = self.states();

        let Some(state) = states.get(&chat) else {
            return ChoiceOutcome::NotAwaiting;
        };
        if self.is_expired(state) {
            states.remove(&chat);
            tracing::debug!(chat, "Reuse prompt expired");
            return ChoiceOutcome::NotAwaiting;
        }

        let Some(choice) = ReuseChoice::parse(text) else {
            return ChoiceOutcome::Reprompt;
        };

        match states.remove(&chat) {
            Some(ConversationState::AwaitingChoice {
                package,
                accompanying,
                ..
            }) => ChoiceOutcome::Decided {
                package,
                accompanying,
                choice,
            },
            None => ChoiceOutcome::NotAwaiting,
        }
    }

    /// Drop all timed-out prompts. Returns how many were evicted.
    pub fn evict_expired(&self) -> usize {
        let mut states = self.states();
        let before = states.len();
        states.retain(|_, state| !self.is_expired(state));
        let evicted = before - states.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired reuse prompts");
        }
        evicted
    }

    pub fn pending(&self) -> usize {
        self.states().len()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
