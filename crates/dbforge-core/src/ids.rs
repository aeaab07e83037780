//! Identifier types for managed database clusters.
//!
//! Cluster names are chosen by the caller and are unique per provider
//! account. Cluster ids are assigned by the provider and spliced into
//! request paths, so both are validated on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length the provider accepts for a cluster name.
pub const MAX_CLUSTER_NAME_LEN: usize = 63;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is empty.
    #[error("identifier is empty")]
    Empty,

    /// The identifier exceeds the maximum length.
    #[error("identifier too long: {len} characters (max {max})")]
    TooLong {
        /// Actual length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// The identifier contains a character that is not allowed.
    #[error("invalid character {0:?} in identifier")]
    InvalidChar(char),

    /// A cluster name starts or ends with a hyphen.
    #[error("identifier must not start or end with a hyphen")]
    EdgeHyphen,
}

/// Human-chosen cluster name, the unique key for a cluster within an account.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterName(String);

impl ClusterName {
    /// Parse and validate a cluster name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, longer than 63 characters,
    /// contains anything other than lowercase letters, digits and hyphens,
    /// or starts or ends with a hyphen.
    pub fn new(name: impl Into<String>) -> Result<Self, IdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdError::Empty);
        }
        if name.len() > MAX_CLUSTER_NAME_LEN {
            return Err(IdError::TooLong {
                len: name.len(),
                max: MAX_CLUSTER_NAME_LEN,
            });
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(IdError::InvalidChar(c));
        }
        if name.starts_with('-') || name.ends_with('-') {
            return Err(IdError::EdgeHyphen);
        }
        Ok(Self(name))
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterName({})", self.0)
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClusterName {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClusterName {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ClusterName> for String {
    fn from(name: ClusterName) -> Self {
        name.0
    }
}

impl PartialEq<str> for ClusterName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Provider-assigned cluster identifier.
///
/// The provider currently hands out UUIDs, but the value is treated as
/// opaque. It must be safe to place in a URL path segment.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterId(String);

impl ClusterId {
    /// Parse and validate a cluster id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains whitespace, `/`,
    /// `?` or `#`.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        if let Some(c) = id
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
        {
            return Err(IdError::InvalidChar(c));
        }
        Ok(Self(id))
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterId({})", self.0)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClusterId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClusterId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ClusterId> for String {
    fn from(id: ClusterId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_name_accepts_slugs() {
        let name = ClusterName::new("app-db-01").unwrap();
        assert_eq!(name.as_str(), "app-db-01");
        assert_eq!(name.to_string(), "app-db-01");
        assert!(name == *"app-db-01");
    }

    #[test]
    fn cluster_name_rejects_bad_input() {
        assert_eq!(ClusterName::new(""), Err(IdError::Empty));
        assert_eq!(ClusterName::new("App"), Err(IdError::InvalidChar('A')));
        assert_eq!(ClusterName::new("a b"), Err(IdError::InvalidChar(' ')));
        assert_eq!(ClusterName::new("-db"), Err(IdError::EdgeHyphen));
        assert_eq!(ClusterName::new("db-"), Err(IdError::EdgeHyphen));
        assert!(matches!(
            ClusterName::new("a".repeat(64)),
            Err(IdError::TooLong { len: 64, max: 63 })
        ));
        assert!(ClusterName::new("a".repeat(63)).is_ok());
    }

    #[test]
    fn cluster_id_rejects_path_characters() {
        assert!(ClusterId::new("9cc10173-e9ea-4176-9dbc-a4cee4c4ff30").is_ok());
        assert_eq!(ClusterId::new(""), Err(IdError::Empty));
        assert_eq!(ClusterId::new("a/b"), Err(IdError::InvalidChar('/')));
        assert_eq!(ClusterId::new("a?b"), Err(IdError::InvalidChar('?')));
        assert_eq!(ClusterId::new("a b"), Err(IdError::InvalidChar(' ')));
    }

    #[test]
    fn serde_validates() {
        let name: ClusterName = serde_json::from_str("\"orders\"").unwrap();
        assert_eq!(name.as_str(), "orders");
        assert!(serde_json::from_str::<ClusterName>("\"Orders\"").is_err());

        let id: ClusterId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
    }

    #[test]
    fn debug_format() {
        let id = ClusterId::new("abc").unwrap();
        assert_eq!(format!("{id:?}"), "ClusterId(abc)");
    }
}
