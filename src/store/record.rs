// Keyforge - Keystore Record files
//
// Formats and parses the human-readable `info.txt` and writes the
// `user.txt` audit record that sits next to every generated keystore.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::params::Subject;

use super::{PackageId, ProjectPaths};

/// Key details shown to the user and persisted as `info.txt`.
pub struct KeyInfo {
    pub subject: Subject,
    pub alias: String,
    pub password: Zeroizing<String>,
}

impl KeyInfo {
    /// Render the record text. Empty subject fields print as `-`.
    pub fn render(&self) -> String {
        fn val(v: &str) -> &str {
            if v.is_empty() {
                "-"
            } else {
                v
            }
        }

        let s = &self.subject;
        format!(
            "Key details:\n\
             First name: {}\n\
             Last name: {}\n\
             Organization unit: {}\n\
             Organization: {}\n\
             City: {}\n\
             State: {}\n\
             Country code: {}\n\
             \n\
             Alias: {}\n\
             Password: {}",
            val(&s.first_name),
            val(&s.last_name),
            val(&s.organization_unit),
            val(&s.organization),
            val(&s.city),
            val(&s.state),
            val(&s.country_code),
            self.alias,
            self.password.as_str(),
        )
    }

    /// Write the rendered record to `path`, newline-terminated.
    pub fn write_to(&self, path: &Path) -> std::io::Result<String> {
        let text = self.render();
        std::fs::write(path, format!("{}\n", text))?;
        Ok(text)
    }
}

/// Read the `Alias:` and `Password:` lines back from an `info.txt`.
pub fn read_credentials(info_path: &Path) -> Option<(String, Zeroizing<String>)> {
    let text = Zeroizing::new(std::fs::read_to_string(info_path).ok()?);

    let mut alias = None;
    let mut password = None;
    for line in text.lines() {
        if let Some(v) = line.strip_prefix("Alias:") {
            alias = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("Password:") {
            password = Some(Zeroizing::new(v.trim().to_string()));
        }
    }

    match (alias, password) {
        (Some(a), Some(p)) if !a.is_empty() && !p.is_empty() => Some((a, p)),
        _ => None,
    }
}

// ─── Requester ───────────────────────────────────────────────────────────────

/// Who asked for a keystore, persisted as `user.txt` for audit.
#[derive(Debug, Clone, Default)]
pub struct Requester {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl Requester {
    /// The local OS user, for CLI runs.
    pub fn local() -> Self {
        let name = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok();
        Self {
            user_id: Some("local".to_string()),
            username: name.clone(),
            full_name: name,
        }
    }

    pub fn render(&self, requested_at: DateTime<Utc>) -> String {
        let dash = || "-".to_string();
        let username = self
            .username
            .as_ref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(dash);
        format!(
            "user_id: {}\nusername: {}\nfull_name: {}\nrequested_at: {}\n",
            self.user_id.clone().unwrap_or_else(dash),
            username,
            self.full_name.clone().unwrap_or_else(dash),
            requested_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render(Utc::now()))
    }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A complete live record, ready for delivery.
#[derive(Debug, Clone)]
pub struct KeystoreRecord {
    pub package: PackageId,
    pub paths: ProjectPaths,
    /// Rendered `info.txt`, reused as the certificate caption.
    pub info: String,
    /// Where the superseded record went, if there was one.
    pub archived_to: Option<PathBuf>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
