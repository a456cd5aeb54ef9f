// Keyforge - Library root
//
// Keystore generation bot: storage layout and archival, parameter
// resolution, external tool invocation, conversation state, the request
// pipeline and the chat front-end.

pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod params;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod toolchain;

pub use error::{KeyforgeError, Result};
