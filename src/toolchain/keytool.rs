// Keyforge - keytool Commands
//
// Builds the JDK `keytool` invocations used by the pipeline: key pair
// generation, self-certificate renewal, subject inspection and PEM export.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::params::{Credentials, KeystoreParameters, Subject};

use super::runner::{run_checked, ToolInvocation, ToolRunner};
use super::ToolError;

/// Key generation settings passed straight to keytool.
#[derive(Debug, Clone)]
pub struct KeytoolSettings {
    pub program: String,
    pub key_algorithm: String,
    pub key_size: u32,
    pub validity_days: u32,
    pub timeout: Duration,
}

impl Default for KeytoolSettings {
    fn default() -> Self {
        Self {
            program: "keytool".to_string(),
            key_algorithm: "RSA".to_string(),
            key_size: 2048,
            validity_days: 36500,
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct Keytool<R> {
    runner: Arc<R>,
    settings: KeytoolSettings,
}

impl<R: ToolRunner> Keytool<R> {
    pub fn new(runner: Arc<R>, settings: KeytoolSettings) -> Self {
        Self { runner, settings }
    }

    pub fn program(&self) -> &str {
        &self.settings.program
    }

    fn invocation(&self, command: &str) -> ToolInvocation {
        ToolInvocation::new(&self.settings.program, self.settings.timeout).arg(command)
    }

    fn with_store(inv: ToolInvocation, keystore: &Path, creds: &Credentials) -> ToolInvocation {
        inv.opt("-alias", &creds.alias)
            .opt("-keystore", keystore.to_string_lossy())
            .opt("-storepass", creds.password.as_str())
    }

    /// Create a new key pair with a self-signed certificate at `keystore`.
    pub async fn generate(&self, params: &KeystoreParameters, keystore: &Path) -> Result<(), ToolError> {
        let creds = &params.credentials;
        let inv = Self::with_store(self.invocation("-genkeypair"), keystore, creds)
            .opt("-keypass", creds.password.as_str())
            .opt("-keyalg", &self.settings.key_algorithm)
            .opt("-keysize", self.settings.key_size.to_string())
            .opt("-validity", self.settings.validity_days.to_string())
            .opt("-dname", params.subject.to_dname());

        run_checked(self.runner.as_ref(), &inv).await?;

        if !keystore.is_file() {
            return Err(ToolError::MissingArtifact {
                program: self.settings.program.clone(),
                artifact: "keystore".to_string(),
            });
        }
        Ok(())
    }

    /// Re-issue the self-signed certificate of an existing entry with a
    /// fresh validity period. The private key is unchanged.
    pub async fn self_certify(&self, keystore: &Path, creds: &Credentials) -> Result<(), ToolError> {
        let inv = Self::with_store(self.invocation("-selfcert"), keystore, creds)
            .opt("-keypass", creds.password.as_str())
            .opt("-validity", self.settings.validity_days.to_string());

        run_checked(self.runner.as_ref(), &inv).await?;
        Ok(())
    }

    /// Read the certificate owner of `creds.alias`.
    ///
    /// `Ok(None)` when keytool prints no parseable `Owner:` line.
    pub async fn read_subject(&self, keystore: &Path, creds: &Credentials) -> Result<Option<Subject>, ToolError> {
        let inv = Self::with_store(self.invocation("-list"), keystore, creds).arg("-v");
        let output = run_checked(self.runner.as_ref(), &inv).await?;

        let owner = output
            .stdout
            .lines()
            .find_map(|line| line.trim().strip_prefix("Owner:"))
            .map(str::trim);

        Ok(owner.and_then(Subject::from_dname))
    }

    /// Export the certificate of `creds.alias` as PEM (`-rfc`).
    pub async fn export_certificate(
        &self,
        keystore: &Path,
        creds: &Credentials,
        pem: &Path,
    ) -> Result<(), ToolError> {
        let inv = Self::with_store(self.invocation("-exportcert"), keystore, creds)
            .arg("-rfc")
            .opt("-file", pem.to_string_lossy());

        run_checked(self.runner.as_ref(), &inv).await?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterResolver;
    use crate::toolchain::mock::{MockBehavior, MockRunner};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn keytool(runner: &Arc<MockRunner>) -> Keytool<MockRunner> {
        Keytool::new(runner.clone(), KeytoolSettings::default())
    }

    fn params() -> KeystoreParameters {
        let resolver = ParameterResolver::default();
        resolver.resolve(resolver.credentials(None), &mut StdRng::seed_from_u64(3))
    }

    #[tokio::test]
    async fn test_generate_passes_expected_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        let ks = dir.path().join("app.jks");
        let params = params();

        keytool(&runner).generate(&params, &ks).await.unwrap();
        assert!(ks.is_file());

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let inv = &calls[0];
        assert_eq!(inv.program, "keytool");
        assert!(inv.has_arg("-genkeypair"));
        assert_eq!(inv.value_of("-alias"), Some("key0"));
        assert_eq!(inv.value_of("-storepass"), Some("1234567890"));
        assert_eq!(inv.value_of("-keypass"), Some("1234567890"));
        assert_eq!(inv.value_of("-keyalg"), Some("RSA"));
        assert_eq!(inv.value_of("-keysize"), Some("2048"));
        assert_eq!(inv.value_of("-validity"), Some("36500"));
        assert_eq!(inv.value_of("-dname"), Some(params.subject.to_dname().as_str()));
    }

    #[tokio::test]
    async fn test_generate_without_output_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::with(MockBehavior::SkipOutput("-genkeypair")));
        let err = keytool(&runner)
            .generate(&params(), &dir.path().join("app.jks"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingArtifact { .. }));
    }

    #[tokio::test]
    async fn test_read_subject_parses_owner_line() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        let ks = dir.path().join("app.jks");
        let params = params();
        let kt = keytool(&runner);

        kt.generate(&params, &ks).await.unwrap();
        let subject = kt.read_subject(&ks, &params.credentials).await.unwrap();
        assert_eq!(subject, Some(params.subject));
    }

    #[tokio::test]
    async fn test_wrong_password_fails() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        let ks = dir.path().join("app.jks");
        let kt = keytool(&runner);
        kt.generate(&params(), &ks).await.unwrap();

        let wrong = ParameterResolver::default().credentials(Some("key0\nnope"));
        let err = kt
            .export_certificate(&ks, &wrong, &dir.path().join("app.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
    }
}
