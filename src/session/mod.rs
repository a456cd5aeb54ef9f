// Keyforge - Session Module
//
// Conversation state for the reuse-or-regenerate prompt, and the
// process-wide per-package lock set that serializes writers.

mod locks;
mod tracker;

pub use locks::{PackageGuard, PackageLocks};
pub use tracker::{ChoiceOutcome, ReuseChoice, SessionTracker};
