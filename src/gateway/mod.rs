// Keyforge - Gateway Module
//
// Chat platform plumbing: Bot API wire types, the `ChatTransport` seam and
// its reqwest-based implementation.

mod error;
mod protocol;
mod telegram;
mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use error::GatewayError;
pub use protocol::{Document, Message, Update, User};
pub use telegram::{BotToken, TelegramClient, DEFAULT_API_BASE};
pub use transport::{ChatAction, ChatTransport, MessageRef, OutgoingDocument};
