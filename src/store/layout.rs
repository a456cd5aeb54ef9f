// Keyforge - Storage Layout
//
// Maps a package identifier to its artifact paths and owns the staging
// area where new artifacts are produced before they replace a live record.

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::StoreError;

/// Fallback identifier when sanitization leaves nothing usable.
const FALLBACK_PACKAGE: &str = "keystore";

/// Prefix of staging directories created inside the generated root.
/// Package identifiers can never start with a dot, so these never collide.
const STAGING_PREFIX: &str = ".staging-";

pub const INFO_FILE: &str = "info.txt";
pub const USER_FILE: &str = "user.txt";

// ─── Package Identifier ──────────────────────────────────────────────────────

/// A filesystem-safe package identifier, e.g. `com.example.app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId(String);

impl PackageId {
    /// Sanitize arbitrary user text into an identifier.
    ///
    /// Every run of characters outside `[A-Za-z0-9._-]` collapses into a
    /// single `_`. Leading dots are stripped so the result can never name a
    /// hidden directory or `.`/`..`.
    pub fn sanitize(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        let mut in_run = false;

        for c in raw.trim().chars() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                out.push(c);
                in_run = false;
            } else if !in_run {
                out.push('_');
                in_run = true;
            }
        }

        let trimmed = out.trim_start_matches('.');
        if trimmed.is_empty() {
            Self(FALLBACK_PACKAGE.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Identifier derived from an uploaded file name (`app.jks` -> `app`).
    pub fn from_file_name(file_name: &str) -> Self {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        Self::sanitize(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Paths ───────────────────────────────────────────────────────────────────

/// The artifact set of one package directory.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub dir: PathBuf,
    pub keystore: PathBuf,
    pub certificate: PathBuf,
    pub info: PathBuf,
    pub user: PathBuf,
}

impl ProjectPaths {
    /// Paths for `package` rooted at `dir` (live or staging).
    pub fn in_dir(dir: &Path, package: &PackageId) -> Self {
        Self {
            dir: dir.to_path_buf(),
            keystore: dir.join(format!("{}.jks", package)),
            certificate: dir.join(format!("{}.pem", package)),
            info: dir.join(INFO_FILE),
            user: dir.join(USER_FILE),
        }
    }

    /// True when both the keystore and its certificate are present.
    pub fn has_keystore_pair(&self) -> bool {
        self.keystore.is_file() && self.certificate.is_file()
    }
}

/// Roots of the live and archived trees.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    generated_dir: PathBuf,
    archive_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(generated_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            generated_dir: generated_dir.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Live artifact paths for a package.
    pub fn project(&self, package: &PackageId) -> ProjectPaths {
        ProjectPaths::in_dir(&self.generated_dir.join(package.as_str()), package)
    }

    /// Create a fresh staging directory on the same filesystem as the live
    /// tree so promotion is a plain rename. Removed on drop.
    pub fn staging(&self) -> Result<TempDir, StoreError> {
        std::fs::create_dir_all(&self.generated_dir)?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.generated_dir)?;
        Ok(dir)
    }

    /// Move staged artifacts into the (now absent or empty) live directory.
    ///
    /// Only files that exist in staging are moved; the caller archives any
    /// previous record first.
    pub fn promote(&self, staged: &ProjectPaths, live: &ProjectPaths) -> Result<(), StoreError> {
        let promote_err = |source| StoreError::Promote {
            dir: live.dir.clone(),
            source,
        };

        std::fs::create_dir_all(&live.dir).map_err(promote_err)?;

        let pairs = [
            (&staged.keystore, &live.keystore),
            (&staged.certificate, &live.certificate),
            (&staged.info, &live.info),
            (&staged.user, &live.user),
        ];
        for (from, to) in pairs {
            if from.exists() {
                std::fs::rename(from, to).map_err(promote_err)?;
            }
        }

        tracing::debug!(dir = %live.dir.display(), "Promoted staged artifacts");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
