// Keyforge - Pipeline Module
//
// Request execution: generate, reuse or convert a keystore into a live
// record, then deliver it.

mod delivery;
mod engine;
mod error;

pub use delivery::{record_requester, Delivery};
pub use engine::{fingerprint, LockedRecord, Pipeline, PipelineSettings, ReuseOutcome};
pub use error::PipelineError;
