//! Cache key normalization.

use std::fmt;

use crate::Error;

/// Normalized character identifier: trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Normalize a raw character identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the identifier is empty after trimming.
    pub fn new(character: &str) -> Result<Self, Error> {
        let trimmed = character.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("character cannot be empty".into()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_case_insensitive() {
        let a = CacheKey::new("Frostbite").unwrap();
        let b = CacheKey::new("FROSTBITE").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "frostbite");
    }

    #[test]
    fn test_key_trims_whitespace() {
        let key = CacheKey::new("  Arthas \n").unwrap();
        assert_eq!(key.to_string(), "arthas");
    }

    #[test]
    fn test_key_rejects_empty() {
        assert!(matches!(CacheKey::new("   "), Err(Error::InvalidInput(_))));
        assert!(matches!(CacheKey::new(""), Err(Error::InvalidInput(_))));
    }
}
