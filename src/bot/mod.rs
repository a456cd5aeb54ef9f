// Keyforge - Bot Module
//
// The chat front-end: per-update dispatch and the long-polling loop.

mod dispatcher;
mod messages;
mod poller;
mod status;

pub use dispatcher::Bot;
pub use poller::run;
