// Keyforge - Toolchain Module
//
// Everything that shells out: the process runner seam, keytool commands
// and certificate export. No cryptography happens in-process.

mod error;
mod extract;
mod keytool;
mod runner;

#[cfg(test)]
pub(crate) mod mock;

pub use error::ToolError;
pub use extract::{CertificateExtractor, ExtractorBackend};
pub use keytool::{Keytool, KeytoolSettings};
pub use runner::{run_checked, SystemToolRunner, ToolInvocation, ToolOutput, ToolRunner};
