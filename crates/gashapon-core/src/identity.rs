//! Identity types for roster characters and content definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a character in the roster
///
/// String-based so content files can reference characters directly
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharId(pub String);

impl CharId {
    /// Create a new character ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CharId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CharId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier for a rarity grade
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeId(pub String);

impl GradeId {
    /// Create a new grade ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GradeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for GradeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_id() {
        let id = CharId::new("mochi");
        assert_eq!(id.as_str(), "mochi");
        assert_eq!(format!("{}", id), "mochi");
    }

    #[test]
    fn test_grade_id_ordering() {
        let a = GradeId::new("common");
        let b = GradeId::new("rare");
        assert_ne!(a, b);
        assert_eq!(GradeId::from("common"), a);
    }
}
