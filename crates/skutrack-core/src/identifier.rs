use serde::Serialize;

/// A marketplace SKU: a non-empty string of ASCII decimal digits.
///
/// Only [`validate`] and [`Identifier::parse`] construct values, so every
/// `Identifier` in the system is already trimmed and numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Trim `raw` and accept it iff the result is non-empty and all digits.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            Some(Self(trimmed.to_owned()))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Clean a raw column of SKU cells into valid identifiers.
///
/// Source order is preserved and duplicates are kept. Entries that are empty
/// or contain anything other than digits after trimming are dropped silently.
pub fn validate<S: AsRef<str>>(raw: &[S]) -> Vec<Identifier> {
    raw.iter()
        .filter_map(|entry| Identifier::parse(entry.as_ref()))
        .collect()
}
