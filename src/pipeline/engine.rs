// Keyforge - Keystore Pipeline
//
// Runs one request end to end on disk: tool work happens in a staging
// directory next to the live records, the previous record is archived only
// after the new material exists, then the staged files are renamed into
// place. The whole sequence holds the package lock, and the returned record
// keeps holding it until delivery is done.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::params::{Credentials, KeystoreParameters, ParameterResolver, Subject};
use crate::session::{PackageGuard, PackageLocks};
use crate::store::{
    read_credentials, ArchiveManager, KeyInfo, KeystoreRecord, PackageId, ProjectPaths, Requester,
    StorageLayout,
};
use crate::toolchain::{CertificateExtractor, ExtractorBackend, Keytool, KeytoolSettings, ToolRunner};

use super::delivery::record_requester;
use super::PipelineError;

/// Construction parameters for a [`Pipeline`].
#[derive(Clone)]
pub struct PipelineSettings {
    pub generated_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub keytool: KeytoolSettings,
    pub extractor: ExtractorBackend,
    pub openssl_program: String,
    pub default_alias: String,
    pub default_password: Zeroizing<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let resolver = ParameterResolver::default();
        Self {
            generated_dir: PathBuf::from("generated"),
            archive_dir: PathBuf::from("generated_old"),
            keytool: KeytoolSettings::default(),
            extractor: ExtractorBackend::default(),
            openssl_program: "openssl".to_string(),
            default_alias: resolver.default_alias().to_string(),
            default_password: Zeroizing::new(resolver.default_password().to_string()),
        }
    }
}

/// A freshly written record. The package stays locked while this is alive.
pub struct LockedRecord {
    record: KeystoreRecord,
    _guard: PackageGuard,
}

impl LockedRecord {
    pub fn into_record(self) -> KeystoreRecord {
        self.record
    }
}

impl Deref for LockedRecord {
    type Target = KeystoreRecord;

    fn deref(&self) -> &KeystoreRecord {
        &self.record
    }
}

/// Result of a reuse request.
pub enum ReuseOutcome {
    /// Certificate re-issued from the existing private key.
    Reused(LockedRecord),
    /// The previous files were gone; fresh material was generated instead.
    Regenerated(LockedRecord),
}

impl ReuseOutcome {
    pub fn record(&self) -> &LockedRecord {
        match self {
            Self::Reused(r) | Self::Regenerated(r) => r,
        }
    }
}

/// How the staged keystore came to be. Only used for logging.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Generated,
    Reused,
    Converted,
}

pub struct Pipeline<R> {
    layout: StorageLayout,
    archive: ArchiveManager,
    keytool: Keytool<R>,
    extractor: CertificateExtractor<R>,
    resolver: ParameterResolver,
    locks: PackageLocks,
}

impl<R: ToolRunner> Pipeline<R> {
    pub fn new(runner: Arc<R>, settings: PipelineSettings) -> Self {
        let timeout = settings.keytool.timeout;
        Self {
            layout: StorageLayout::new(&settings.generated_dir, &settings.archive_dir),
            archive: ArchiveManager::new(&settings.archive_dir),
            extractor: CertificateExtractor::new(
                runner.clone(),
                settings.extractor,
                settings.openssl_program,
                timeout,
            ),
            keytool: Keytool::new(runner, settings.keytool),
            resolver: ParameterResolver::new(&settings.default_alias, &settings.default_password),
            locks: PackageLocks::new(),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn archive_manager(&self) -> &ArchiveManager {
        &self.archive
    }

    pub fn resolver(&self) -> &ParameterResolver {
        &self.resolver
    }

    /// Whether `package` has a complete live record (keystore and PEM).
    pub fn has_record(&self, package: &PackageId) -> bool {
        self.layout.project(package).has_keystore_pair()
    }

    /// Parameters with a random subject for `credentials`.
    pub fn parameters(&self, credentials: Credentials) -> KeystoreParameters {
        self.resolver.resolve(credentials, &mut rand::rng())
    }

    /// Generate a new key pair for `package`, archiving any previous record.
    pub async fn generate(
        &self,
        package: &PackageId,
        params: &KeystoreParameters,
        requester: &Requester,
    ) -> Result<LockedRecord, PipelineError> {
        let guard = self.locks.acquire(package).await;
        let record = self.generate_locked(package, params, requester).await?;
        Ok(LockedRecord { record, _guard: guard })
    }

    /// Re-issue the certificate of the existing key for `package`.
    ///
    /// Credentials come from the stored info.txt, falling back to the ones
    /// in `fallback`. When the previous keystore or PEM is missing, fresh
    /// material is generated from `fallback` instead.
    pub async fn reuse(
        &self,
        package: &PackageId,
        fallback: &KeystoreParameters,
        requester: &Requester,
    ) -> Result<ReuseOutcome, PipelineError> {
        let guard = self.locks.acquire(package).await;
        let live = self.layout.project(package);

        if !live.has_keystore_pair() {
            tracing::warn!(package = %package, "Previous keystore is gone, generating a new one");
            let record = self.generate_locked(package, fallback, requester).await?;
            return Ok(ReuseOutcome::Regenerated(LockedRecord { record, _guard: guard }));
        }

        let creds = match read_credentials(&live.info) {
            Some((alias, password)) => Credentials { alias, password },
            None => {
                tracing::warn!(package = %package, "No stored credentials in info.txt, using request credentials");
                fallback.credentials.clone()
            }
        };

        let run_id = Uuid::new_v4();
        tracing::info!(package = %package, %run_id, alias = %creds.alias, "Reusing existing key");

        let staging = self.layout.staging()?;
        let staged = ProjectPaths::in_dir(staging.path(), package);
        std::fs::copy(&live.keystore, &staged.keystore)?;

        self.keytool
            .self_certify(&staged.keystore, &creds)
            .await
            .map_err(PipelineError::Generation)?;

        let record = self
            .finish(package, &staged, &creds, None, requester, run_id, Origin::Reused)
            .await?;
        Ok(ReuseOutcome::Reused(LockedRecord { record, _guard: guard }))
    }

    /// Store an uploaded keystore for `package` and export its PEM.
    pub async fn convert(
        &self,
        package: &PackageId,
        creds: &Credentials,
        upload: &Path,
        requester: &Requester,
    ) -> Result<LockedRecord, PipelineError> {
        let guard = self.locks.acquire(package).await;

        let run_id = Uuid::new_v4();
        tracing::info!(package = %package, %run_id, alias = %creds.alias, "Converting uploaded keystore");

        let staging = self.layout.staging()?;
        let staged = ProjectPaths::in_dir(staging.path(), package);
        std::fs::copy(upload, &staged.keystore)?;

        let record = self
            .finish(package, &staged, creds, None, requester, run_id, Origin::Converted)
            .await?;
        Ok(LockedRecord { record, _guard: guard })
    }

    async fn generate_locked(
        &self,
        package: &PackageId,
        params: &KeystoreParameters,
        requester: &Requester,
    ) -> Result<KeystoreRecord, PipelineError> {
        let run_id = Uuid::new_v4();
        tracing::info!(
            package = %package,
            %run_id,
            alias = %params.credentials.alias,
            "Generating keystore"
        );

        let staging = self.layout.staging()?;
        let staged = ProjectPaths::in_dir(staging.path(), package);

        self.keytool
            .generate(params, &staged.keystore)
            .await
            .map_err(PipelineError::Generation)?;

        self.finish(
            package,
            &staged,
            &params.credentials,
            Some(params.subject.clone()),
            requester,
            run_id,
            Origin::Generated,
        )
        .await
    }

    /// Export the PEM from the staged keystore, then archive and promote.
    ///
    /// On export failure the keystore and info.txt are still promoted and
    /// `Extraction` is returned.
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        package: &PackageId,
        staged: &ProjectPaths,
        creds: &Credentials,
        subject: Option<Subject>,
        requester: &Requester,
        run_id: Uuid,
        origin: Origin,
    ) -> Result<KeystoreRecord, PipelineError> {
        let extracted = self
            .extractor
            .extract(&self.keytool, &staged.keystore, creds, &staged.certificate)
            .await;

        let subject = match subject {
            Some(subject) => subject,
            None => self.stored_subject(package, &staged.keystore, creds).await,
        };

        let info = KeyInfo {
            subject,
            alias: creds.alias.clone(),
            password: creds.password.clone(),
        }
        .write_to(&staged.info)?;

        let fingerprint = fingerprint(&staged.keystore)?;
        let live = self.layout.project(package);

        let archived_to = self
            .archive
            .archive(&live.dir, package)
            .map_err(PipelineError::Archival)?;
        self.layout.promote(staged, &live)?;
        record_requester(&live, requester)?;

        if let Err(source) = extracted {
            tracing::error!(
                package = %package,
                %run_id,
                error = %source,
                "Certificate export failed, keystore kept without PEM"
            );
            return Err(PipelineError::Extraction {
                keystore: live.keystore,
                source,
            });
        }

        tracing::info!(
            package = %package,
            %run_id,
            origin = ?origin,
            sha256 = %fingerprint,
            archived = archived_to.is_some(),
            "Keystore record written"
        );

        Ok(KeystoreRecord {
            package: package.clone(),
            paths: live,
            info,
            archived_to,
        })
    }

    /// Subject of an existing keystore, or an empty one if it can't be read.
    async fn stored_subject(&self, package: &PackageId, keystore: &Path, creds: &Credentials) -> Subject {
        match self.keytool.read_subject(keystore, creds).await {
            Ok(Some(subject)) => subject,
            Ok(None) => {
                tracing::warn!(package = %package, "Keystore has no parseable owner");
                Subject::default()
            }
            Err(e) => {
                tracing::warn!(package = %package, error = %e, "Could not read keystore owner");
                Subject::default()
            }
        }
    }
}

/// Hex SHA-256 of a file.
pub fn fingerprint(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::toolchain::mock::{FakeKeystore, MockBehavior, MockRunner};
    use crate::toolchain::ToolError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn pipeline(root: &TempDir, behavior: MockBehavior) -> (Pipeline<MockRunner>, Arc<MockRunner>) {
        let runner = Arc::new(MockRunner::with(behavior));
        let settings = PipelineSettings {
            generated_dir: root.path().join("generated"),
            archive_dir: root.path().join("generated_old"),
            ..PipelineSettings::default()
        };
        (Pipeline::new(runner.clone(), settings), runner)
    }

    fn params(p: &Pipeline<MockRunner>, text: Option<&str>, seed: u64) -> KeystoreParameters {
        let creds = p.resolver().credentials(text);
        p.resolver().resolve(creds, &mut StdRng::seed_from_u64(seed))
    }

    fn requester() -> Requester {
        Requester {
            user_id: Some("42".to_string()),
            username: Some("jane".to_string()),
            full_name: Some("Jane Doe".to_string()),
        }
    }

    fn pem(paths: &ProjectPaths) -> String {
        std::fs::read_to_string(&paths.certificate).unwrap()
    }

    #[tokio::test]
    async fn test_generate_writes_full_record() {
        let root = tempfile::tempdir().unwrap();
        let (p, runner) = pipeline(&root, MockBehavior::Normal);
        let package = PackageId::sanitize("com.example.app");

        let record = p
            .generate(&package, &params(&p, None, 1), &requester())
            .await
            .unwrap();

        let paths = &record.paths;
        assert_eq!(paths.dir, root.path().join("generated/com.example.app"));
        for file in [&paths.keystore, &paths.certificate, &paths.info, &paths.user] {
            assert!(file.is_file(), "missing {}", file.display());
        }
        assert!(record.archived_to.is_none());
        assert!(record.info.contains("Alias: key0"));
        assert!(record.info.contains("Password: 1234567890"));
        assert!(std::fs::read_to_string(&paths.user).unwrap().contains("username: @jane"));
        assert_eq!(runner.commands(), vec!["-genkeypair", "-exportcert"]);

        // Staging directories are cleaned up.
        let leftovers: Vec<_> = std::fs::read_dir(root.path().join("generated"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("com.example.app")]);
    }

    #[tokio::test]
    async fn test_regenerate_archives_previous_records_in_slot_order() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::Normal);
        let package = PackageId::sanitize("P");

        let mut pems = Vec::new();
        for seed in 0..3 {
            let record = p
                .generate(&package, &params(&p, None, seed), &requester())
                .await
                .unwrap();
            pems.push(pem(&record.paths));
        }

        let old = root.path().join("generated_old");
        assert_eq!(p.archive_manager().list(&package).unwrap(), vec![old.join("P"), old.join("P-1")]);
        assert_eq!(std::fs::read_to_string(old.join("P/P.pem")).unwrap(), pems[0]);
        assert_eq!(std::fs::read_to_string(old.join("P-1/P.pem")).unwrap(), pems[1]);
        assert_eq!(pem(&p.layout().project(&package)), pems[2]);
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_live_record_untouched() {
        let root = tempfile::tempdir().unwrap();
        let (ok, _) = pipeline(&root, MockBehavior::Normal);
        let package = PackageId::sanitize("P");
        let first = ok.generate(&package, &params(&ok, None, 1), &requester()).await.unwrap();
        let before = pem(&first.paths);
        drop(first);

        let (failing, _) = pipeline(&root, MockBehavior::Fail("-genkeypair"));
        let err = failing
            .generate(&package, &params(&failing, None, 2), &requester())
            .await
            .err()
            .unwrap();

        assert!(matches!(err, PipelineError::Generation(ToolError::Failed { .. })));
        assert_eq!(pem(&failing.layout().project(&package)), before);
        assert!(failing.archive_manager().list(&package).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_keytool_is_generation_failure() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::MissingTool);
        let package = PackageId::sanitize("app");

        let err = p.generate(&package, &params(&p, None, 1), &requester()).await.err().unwrap();
        assert!(matches!(err, PipelineError::Generation(ToolError::NotFound(_))));
        assert!(!p.layout().project(&package).dir.exists());
    }

    #[tokio::test]
    async fn test_archival_failure_aborts_and_keeps_live_record() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::Normal);
        let package = PackageId::sanitize("P");
        let first = p.generate(&package, &params(&p, None, 1), &requester()).await.unwrap();
        let before = pem(&first.paths);
        drop(first);

        // The archive root is occupied by a plain file, so no slot can be created.
        std::fs::write(root.path().join("generated_old"), b"not a directory").unwrap();

        let err = p.generate(&package, &params(&p, None, 2), &requester()).await.err().unwrap();
        assert!(matches!(err, PipelineError::Archival(StoreError::Archival { .. })));
        assert!(err.user_message().contains("Could not archive"));
        assert_eq!(pem(&p.layout().project(&package)), before);

        let entries: Vec<_> = std::fs::read_dir(root.path().join("generated"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("P")]);
    }

    #[tokio::test]
    async fn test_extraction_failure_still_promotes_keystore() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::SkipOutput("-exportcert"));
        let package = PackageId::sanitize("app");

        let err = p.generate(&package, &params(&p, None, 1), &requester()).await.err().unwrap();
        let live = p.layout().project(&package);
        match err {
            PipelineError::Extraction { keystore, .. } => assert_eq!(keystore, live.keystore),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(live.keystore.is_file());
        assert!(live.info.is_file());
        assert!(!live.certificate.exists());
        assert!(!p.has_record(&package));
    }

    #[tokio::test]
    async fn test_reuse_keeps_private_key_and_stored_credentials() {
        let root = tempfile::tempdir().unwrap();
        let (p, runner) = pipeline(&root, MockBehavior::Normal);
        let package = PackageId::sanitize("app");

        let first = p
            .generate(&package, &params(&p, Some("upload\nhunter22"), 1), &requester())
            .await
            .unwrap();
        let original = FakeKeystore::read(&first.paths.keystore).unwrap();
        drop(first);

        // Request credentials are ignored in favor of the stored ones.
        let outcome = p.reuse(&package, &params(&p, None, 2), &requester()).await.unwrap();
        let record = match outcome {
            ReuseOutcome::Reused(r) => r,
            ReuseOutcome::Regenerated(_) => panic!("expected reuse"),
        };

        let renewed = FakeKeystore::read(&record.paths.keystore).unwrap();
        assert_eq!(renewed.key_id, original.key_id);
        assert_eq!(renewed.renewals, 1);
        assert_eq!(renewed.dname, original.dname);
        assert!(record.info.contains("Alias: upload"));
        assert!(record.info.contains("Password: hunter22"));
        assert!(record.archived_to.is_some());
        assert_eq!(
            runner.commands(),
            vec!["-genkeypair", "-exportcert", "-selfcert", "-exportcert", "-list"]
        );
    }

    #[tokio::test]
    async fn test_reuse_without_previous_files_generates() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::Normal);
        let package = PackageId::sanitize("app");

        let outcome = p.reuse(&package, &params(&p, None, 1), &requester()).await.unwrap();
        assert!(matches!(outcome, ReuseOutcome::Regenerated(_)));
        assert!(p.has_record(&package));
    }

    #[tokio::test]
    async fn test_convert_upload() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::Normal);

        // Produce an "uploaded" keystore outside the generated tree.
        let upload_dir = tempfile::tempdir().unwrap();
        let upload = upload_dir.path().join("release.jks");
        FakeKeystore {
            alias: "release".to_string(),
            password: "storepass".to_string(),
            dname: "CN=Jane Doe, OU=Mobile, O=Acme, L=Austin, S=Texas, C=US".to_string(),
            key_id: 77,
            renewals: 0,
        }
        .write(&upload)
        .unwrap();

        let package = PackageId::from_file_name("release.jks");
        let creds = p.resolver().credentials(Some("release\nstorepass"));
        let record = p.convert(&package, &creds, &upload, &requester()).await.unwrap();

        assert!(pem(&record.paths).contains("MOCK00000077R0"));
        assert!(record.info.contains("First name: Jane"));
        assert!(record.info.contains("City: Austin"));
        assert!(upload.is_file(), "upload must not be consumed");
    }

    #[tokio::test]
    async fn test_convert_with_wrong_password_is_extraction_failure() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::Normal);

        let upload_dir = tempfile::tempdir().unwrap();
        let upload = upload_dir.path().join("release.jks");
        FakeKeystore {
            alias: "release".to_string(),
            password: "storepass".to_string(),
            dname: "CN=A B".to_string(),
            key_id: 1,
            renewals: 0,
        }
        .write(&upload)
        .unwrap();

        let package = PackageId::from_file_name("release.jks");
        let creds = p.resolver().credentials(None);
        let err = p.convert(&package, &creds, &upload, &requester()).await.err().unwrap();
        assert!(matches!(err, PipelineError::Extraction { .. }));
        assert!(p.layout().project(&package).keystore.is_file());
    }

    #[tokio::test]
    async fn test_concurrent_requests_for_one_package_are_serialized() {
        let root = tempfile::tempdir().unwrap();
        let (p, _) = pipeline(&root, MockBehavior::Normal);
        let p = Arc::new(p);
        let package = PackageId::sanitize("P");

        let mut handles = Vec::new();
        for seed in 0..4 {
            let p = p.clone();
            let package = package.clone();
            handles.push(tokio::spawn(async move {
                let params = params(&p, None, seed);
                p.generate(&package, &params, &requester()).await.map(|r| r.into_record())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(p.has_record(&package));
        assert_eq!(p.archive_manager().list(&package).unwrap().len(), 3);
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            fingerprint(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
