// Keyforge - Pipeline error types
//
// Each fatal kind maps to a short message for the requester. The full
// error chain (including raw tool stderr) only goes to the log.

use std::path::PathBuf;

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::store::StoreError;
use crate::toolchain::ToolError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Archival failed: {0}")]
    Archival(#[source] StoreError),

    #[error("Keystore generation failed: {0}")]
    Generation(#[source] ToolError),

    #[error("Certificate export failed for {}: {source}", .keystore.display())]
    Extraction {
        keystore: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("Delivery failed: {0}")]
    Delivery(#[source] GatewayError),

    #[error("Upload could not be fetched: {0}")]
    Upload(#[source] GatewayError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Short, user-facing description. Never includes tool output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation(ToolError::NotFound(program))
            | Self::Extraction {
                source: ToolError::NotFound(program),
                ..
            } => format!(
                "❌ System error: {} not found. Install a JDK (OpenJDK) on the server.",
                program
            ),
            Self::Archival(_) => {
                "❌ Could not archive the previous keystore. Nothing was changed, try again later."
                    .to_string()
            }
            Self::Generation(_) => {
                "❌ Keystore generation failed. Check alias/password and try again.".to_string()
            }
            Self::Extraction { .. } => "⚠️ The keystore was saved, but exporting its certificate failed. \
                 Check the alias/password, file type or keystore password."
                .to_string(),
            Self::Delivery(_) => {
                "❌ Files were generated but could not be sent. Send the same request again.".to_string()
            }
            Self::Upload(_) => "❌ Could not download the uploaded file. Try sending it again.".to_string(),
            Self::Storage(_) | Self::Io(_) => "❌ Unexpected error. Try again later.".to_string(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
