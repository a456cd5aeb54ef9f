// Keyforge - Per-package Locks
//
// Two conversations asking for the same package must not race on its
// directory. Each package identifier maps to an async mutex held for the
// whole archive, generate, extract and write sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::store::PackageId;

/// Held while a pipeline owns a package directory.
pub struct PackageGuard {
    package: PackageId,
    _guard: OwnedMutexGuard<()>,
}

impl PackageGuard {
    pub fn package(&self) -> &PackageId {
        &self.package
    }
}

#[derive(Default)]
pub struct PackageLocks {
    locks: Mutex<HashMap<PackageId, Arc<AsyncMutex<()>>>>,
}

impl PackageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `package`.
    pub async fn acquire(&self, package: &PackageId) -> PackageGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on are dropped.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks
                .entry(package.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        if lock.try_lock().is_err() {
            tracing::debug!(package = %package, "Waiting for package lock");
        }

        PackageGuard {
            package: package.clone(),
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of packages currently tracked.
    pub fn tracked(&self) -> usize {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|_, l| Arc::strong_count(l) > 1);
        locks.len()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
