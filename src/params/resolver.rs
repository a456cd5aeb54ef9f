// Keyforge - Parameter Resolver
//
// Turns the free text accompanying a request into keystore parameters.
// Missing or blank lines fall back to the configured defaults; a request is
// never rejected for malformed credentials.

use std::fmt;

use rand::Rng;
use zeroize::Zeroizing;

use super::identity::random_subject;
use super::Subject;

pub const DEFAULT_ALIAS: &str = "key0";
pub const DEFAULT_PASSWORD: &str = "1234567890";

/// Alias and password (used for both store and key).
#[derive(Clone)]
pub struct Credentials {
    pub alias: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("alias", &self.alias)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Everything needed to generate a keystore.
#[derive(Debug, Clone)]
pub struct KeystoreParameters {
    pub credentials: Credentials,
    pub subject: Subject,
}

/// A plain-text package request: first line is the package name, the rest
/// is the accompanying alias/password text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest<'a> {
    pub package: &'a str,
    pub rest: Vec<&'a str>,
}

/// Non-blank, trimmed lines of `text`.
fn meaningful_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Split a text message into package name and accompanying lines.
/// Returns `None` for blank input.
pub fn split_text_request(text: &str) -> Option<TextRequest<'_>> {
    let mut lines = meaningful_lines(text);
    let package = lines.next()?;
    Some(TextRequest {
        package,
        rest: lines.collect(),
    })
}

#[derive(Clone)]
pub struct ParameterResolver {
    default_alias: String,
    default_password: Zeroizing<String>,
}

impl Default for ParameterResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ALIAS, DEFAULT_PASSWORD)
    }
}

impl ParameterResolver {
    pub fn new(default_alias: &str, default_password: &str) -> Self {
        Self {
            default_alias: default_alias.to_string(),
            default_password: Zeroizing::new(default_password.to_string()),
        }
    }

    pub fn default_alias(&self) -> &str {
        &self.default_alias
    }

    pub fn default_password(&self) -> &str {
        &self.default_password
    }

    /// Line 1 is the alias, line 2 the password; anything missing defaults.
    pub fn credentials_from_lines<'a, I>(&self, lines: I) -> Credentials
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut it = lines.into_iter().map(str::trim).filter(|l| !l.is_empty());
        let alias = it.next();
        let password = it.next();

        if alias.is_none() || password.is_none() {
            tracing::debug!(
                alias_given = alias.is_some(),
                password_given = password.is_some(),
                "Filling missing credentials with defaults"
            );
        }

        Credentials {
            alias: alias.unwrap_or(&self.default_alias).to_string(),
            password: Zeroizing::new(password.unwrap_or(&self.default_password).to_string()),
        }
    }

    /// Credentials from a caption or any accompanying text.
    pub fn credentials(&self, text: Option<&str>) -> Credentials {
        self.credentials_from_lines(text.map(meaningful_lines).into_iter().flatten())
    }

    /// Full parameters with a freshly drawn subject.
    pub fn resolve<R: Rng + ?Sized>(&self, credentials: Credentials, rng: &mut R) -> KeystoreParameters {
        KeystoreParameters {
            credentials,
            subject: random_subject(rng),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
