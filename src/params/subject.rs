// Keyforge - Certificate Subject
//
// The distinguished-name fields of a self-signed keystore entry, with
// conversion to and from the `keytool -dname` / `Owner:` string form.
// Values are escaped with backslashes for `\` and `,`.

use std::collections::HashMap;

/// Subject fields of a keystore certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    pub first_name: String,
    pub last_name: String,
    pub organization_unit: String,
    pub organization: String,
    pub city: String,
    pub state: String,
    pub country_code: String,
}

impl Subject {
    /// Common name: first and last name joined by a space.
    pub fn common_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Render as a keytool distinguished name.
    pub fn to_dname(&self) -> String {
        format!(
            "CN={}, OU={}, O={}, L={}, S={}, C={}",
            escape(&self.common_name()),
            escape(&self.organization_unit),
            escape(&self.organization),
            escape(&self.city),
            escape(&self.state),
            escape(&self.country_code),
        )
    }

    /// Parse an `Owner:` value printed by `keytool -list -v`.
    ///
    /// Returns `None` when no `key=value` component is found.
    pub fn from_dname(owner: &str) -> Option<Self> {
        let parts: HashMap<String, String> = split_dn(owner)
            .into_iter()
            .filter_map(|item| {
                let (k, v) = item.split_once('=')?;
                Some((k.trim().to_ascii_uppercase(), v.trim().to_string()))
            })
            .collect();

        if parts.is_empty() {
            return None;
        }

        let get = |k: &str| parts.get(k).cloned().unwrap_or_default();
        let cn = get("CN");
        let first_name = cn.split_whitespace().next().unwrap_or_default().to_string();
        let last_name = cn.split_whitespace().last().unwrap_or_default().to_string();
        let state = parts
            .get("S")
            .or_else(|| parts.get("ST"))
            .cloned()
            .unwrap_or_default();

        Some(Self {
            first_name,
            last_name,
            organization_unit: get("OU"),
            organization: get("O"),
            city: get("L"),
            state,
            country_code: get("C"),
        })
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace(',', "\\,")
}

/// Split a DN on commas outside quotes, resolving backslash escapes.
/// keytool prints values with special characters quoted.
fn split_dn(dn: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    let mut quoted = false;

    for c in dn.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        } else if c == ',' && !quoted {
            let part = current.trim();
            if !part.is_empty() {
                parts.push(part.to_string());
            }
            current.clear();
        } else {
            current.push(c);
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

// ─── Tests ───────────────────────────────────────────────────────────────────
