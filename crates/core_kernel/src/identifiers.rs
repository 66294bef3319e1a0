//! Strongly-typed identifiers for domain entities
//!
//! Claims are numbered by the store with a monotonically increasing sequence,
//! lecturers are identified by the identity string the auth collaborator
//! supplies. Newtypes keep the two from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identifier of a claim, assigned by the claim store on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(u64);

impl ClaimId {
    /// Creates from a raw sequence value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the identifier prefix for display
    pub fn prefix() -> &'static str {
        "CLM"
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:06}", Self::prefix(), self.0)
    }
}

impl FromStr for ClaimId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Strip prefix if present
        let raw = s.strip_prefix("CLM-").unwrap_or(s);
        raw.parse::<u64>()
            .map(Self)
            .map_err(|_| CoreError::validation(format!("invalid claim id '{}'", s)))
    }
}

impl From<u64> for ClaimId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identity of a lecturer, as supplied by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LecturerId(String);

impl LecturerId {
    /// Creates a lecturer id, rejecting blank identities
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation("lecturer id must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LecturerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LecturerId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LecturerId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LecturerId> for String {
    fn from(id: LecturerId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_id_display() {
        assert_eq!(ClaimId::new(42).to_string(), "CLM-000042");
    }

    #[test]
    fn test_claim_id_parsing() {
        let parsed: ClaimId = "CLM-000042".parse().unwrap();
        assert_eq!(parsed, ClaimId::new(42));
        let bare: ClaimId = "7".parse().unwrap();
        assert_eq!(bare.value(), 7);
    }

    #[test]
    fn test_lecturer_id_is_trimmed() {
        let id = LecturerId::new("  L1 ").unwrap();
        assert_eq!(id.as_str(), "L1");
        assert!(LecturerId::new("   ").is_err());
    }
}
