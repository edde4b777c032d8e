use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of an authenticated user, as issued by the user directory.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        SubjectId(s.to_owned())
    }
}

impl From<String> for SubjectId {
    fn from(s: String) -> Self {
        SubjectId(s)
    }
}

/// Identity a token pair is issued for.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Subject {
    pub id: SubjectId,
    pub email: String,
}

impl Subject {
    pub fn new(id: impl Into<SubjectId>, email: impl Into<String>) -> Self {
        Subject {
            id: id.into(),
            email: email.into(),
        }
    }
}

/// Caller-facing view of a user record. Never carries the password hash.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: SubjectId,
    pub email: String,
    pub name: String,
}
