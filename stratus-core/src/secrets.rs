use std::fmt;

/// A secret string, such as a repository password or an API token.
///
/// The value never shows up in `Debug` output, so secrets can travel inside
/// structures that get logged.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(pub String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        SecretValue(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
