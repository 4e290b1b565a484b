//! Session credential: an opaque `key=value; key=value` cookie bag.
//!
//! A [`Credential`] is parsed once per run, validated against the
//! configured required keys and then passed by reference to every request.
//! Its contents never appear in `Debug` or `Display` output.

use std::collections::BTreeMap;
use std::fmt;

/// Why a cookie string cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Nothing but whitespace was supplied.
    #[error("cookie is empty")]
    Empty,

    /// One or more required keys are absent. Lists key names only.
    #[error("cookie is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// A validated session cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    raw: String,
    fields: BTreeMap<String, String>,
}

impl Credential {
    /// Parse `raw` and check that every key in `required` is present.
    ///
    /// Tokens are split on `;`; tokens without `=` are ignored; keys and
    /// values are trimmed; the first `=` separates key from value.
    ///
    /// # Errors
    ///
    /// [`CredentialError::Empty`] for a blank string,
    /// [`CredentialError::MissingFields`] naming every absent key.
    pub fn parse<S: AsRef<str>>(raw: &str, required: &[S]) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }

        let fields: BTreeMap<String, String> = trimmed
            .split(';')
            .filter_map(|token| {
                let (key, value) = token.split_once('=')?;
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect();

        let missing: Vec<String> = required
            .iter()
            .map(|key| -> &str { key.as_ref() })
            .filter(|key| !fields.contains_key(*key))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(CredentialError::MissingFields(missing));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            fields,
        })
    }

    /// The cookie exactly as it should be sent in the `Cookie` header.
    pub fn cookie_header(&self) -> &str {
        &self.raw
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of parsed key/value pairs.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("keys", &self.fields.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED cookie with {} fields]", self.fields.len())
    }
}
