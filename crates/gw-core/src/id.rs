use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one dispatched group-check session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Opaque reference to an actor or contestant.
///
/// The session never interprets the contents; it only compares them and
/// hands them to the [`EntrantDirectory`](crate::directory::EntrantDirectory)
/// for display and modifier lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntrantId(pub String);

impl EntrantId {
    /// Wrap an existing reference string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntrantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for EntrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
