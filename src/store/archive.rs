// Keyforge - Archive Manager
//
// Moves a package directory that is about to be replaced into the archive
// root. The first archive of `<id>` lands at `<id>`, later ones at the
// smallest free `<id>-N` (N >= 1). Archival is a rename: nothing is ever
// deleted or overwritten.

use std::path::{Path, PathBuf};

use super::{PackageId, StoreError};

pub struct ArchiveManager {
    root: PathBuf,
}

impl ArchiveManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// First unused archive slot for `package`.
    pub fn next_slot(&self, package: &PackageId) -> PathBuf {
        let base = self.root.join(package.as_str());
        if !base.exists() {
            return base;
        }

        let mut idx: u32 = 1;
        loop {
            let candidate = self.root.join(format!("{}-{}", package, idx));
            if !candidate.exists() {
                return candidate;
            }
            idx += 1;
        }
    }

    /// Move `dir` into the next free slot for `package`.
    ///
    /// Returns `None` when `dir` does not exist. On success `dir` is gone
    /// and ready for a fresh write.
    pub fn archive(&self, dir: &Path, package: &PackageId) -> Result<Option<PathBuf>, StoreError> {
        if !dir.exists() {
            return Ok(None);
        }

        let target = self.next_slot(package);
        let archival_err = |source| StoreError::Archival {
            from: dir.to_path_buf(),
            to: target.clone(),
            source,
        };

        std::fs::create_dir_all(&self.root).map_err(archival_err)?;
        std::fs::rename(dir, &target).map_err(archival_err)?;

        tracing::info!(
            package = %package,
            archived_to = %target.display(),
            "Archived previous keystore record"
        );
        Ok(Some(target))
    }

    /// Archive entries of `package` in slot order (`<id>`, `<id>-1`, ...).
    pub fn list(&self, package: &PackageId) -> Result<Vec<PathBuf>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}-", package);
        let mut entries: Vec<(u32, PathBuf)> = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if name == package.as_str() {
                entries.push((0, entry.path()));
            } else if let Some(n) = name.strip_prefix(&prefix).and_then(|s| s.parse::<u32>().ok()) {
                if n >= 1 {
                    entries.push((n, entry.path()));
                }
            }
        }

        entries.sort_by_key(|(n, _)| *n);
        Ok(entries.into_iter().map(|(_, p)| p).collect())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
