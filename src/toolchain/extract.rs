// Keyforge - Certificate Extractor
//
// Exports a certificate-only PEM (no private key) from a keystore, either
// through keytool or through openssl for PKCS12 stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::params::Credentials;

use super::keytool::Keytool;
use super::runner::{run_checked, ToolInvocation, ToolRunner};
use super::ToolError;

const PEM_MARKER: &str = "-----BEGIN CERTIFICATE-----";

/// Which toolkit exports the certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorBackend {
    /// `keytool -exportcert -rfc`; works for JKS and PKCS12.
    #[default]
    Keytool,
    /// `openssl pkcs12 -nokeys -clcerts`; PKCS12 stores only.
    Openssl,
}

pub struct CertificateExtractor<R> {
    runner: Arc<R>,
    backend: ExtractorBackend,
    openssl: String,
    timeout: Duration,
}

impl<R: ToolRunner> CertificateExtractor<R> {
    pub fn new(runner: Arc<R>, backend: ExtractorBackend, openssl: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            backend,
            openssl: openssl.into(),
            timeout,
        }
    }

    pub fn backend(&self) -> ExtractorBackend {
        self.backend
    }

    /// Write the certificate of `creds.alias` to `pem` and verify it.
    pub async fn extract(
        &self,
        keytool: &Keytool<R>,
        keystore: &Path,
        creds: &Credentials,
        pem: &Path,
    ) -> Result<PathBuf, ToolError> {
        let program = match self.backend {
            ExtractorBackend::Keytool => {
                keytool.export_certificate(keystore, creds, pem).await?;
                keytool.program().to_string()
            }
            ExtractorBackend::Openssl => {
                let inv = ToolInvocation::new(&self.openssl, self.timeout)
                    .arg("pkcs12")
                    .opt("-in", keystore.to_string_lossy())
                    .arg("-nokeys")
                    .arg("-clcerts")
                    .opt("-passin", format!("pass:{}", creds.password.as_str()))
                    .opt("-out", pem.to_string_lossy());
                run_checked(self.runner.as_ref(), &inv).await?;
                self.openssl.clone()
            }
        };

        let contents = std::fs::read_to_string(pem).unwrap_or_default();
        if !contents.contains(PEM_MARKER) {
            return Err(ToolError::MissingArtifact {
                program,
                artifact: "PEM certificate".to_string(),
            });
        }

        Ok(pem.to_path_buf())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
