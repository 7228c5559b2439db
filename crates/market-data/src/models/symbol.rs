use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A user-facing ticker string, e.g. `"RELIANCE"` or `"NIFTY"`.
///
/// Kept exactly as the caller supplied it (minus surrounding whitespace) so
/// results can be keyed by what was asked for. Matching against instrument
/// tables always goes through
/// [`normalize_symbol`](crate::resolver::normalize_symbol).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(Arc::from(symbol.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_trims_but_keeps_case() {
        let symbol = Symbol::new("  Reliance ");
        assert_eq!(symbol.as_str(), "Reliance");
        assert_eq!(symbol.to_string(), "Reliance");
    }

    #[test]
    fn test_symbol_serializes_as_plain_string() {
        let json = serde_json::to_string(&Symbol::from("NIFTY")).unwrap();
        assert_eq!(json, "\"NIFTY\"");
    }
}
