//! Logical identifiers for template entries.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{TemplateError, TemplateResult};

/// Longest logical id CloudFormation accepts.
pub const MAX_LOGICAL_ID_LEN: usize = 255;

fn logical_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static pattern compiles"))
}

/// Check a logical id without constructing one.
pub fn is_valid_logical_id(id: &str) -> bool {
    id.len() <= MAX_LOGICAL_ID_LEN && logical_id_pattern().is_match(id)
}

/// A validated, alphanumeric logical id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalId(String);

impl LogicalId {
    /// Validate and wrap a logical id.
    pub fn new(id: impl Into<String>) -> TemplateResult<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(TemplateError::InvalidLogicalId {
                id,
                message: "must not be empty".to_string(),
            });
        }

        if id.len() > MAX_LOGICAL_ID_LEN {
            return Err(TemplateError::InvalidLogicalId {
                id,
                message: format!("longer than {} characters", MAX_LOGICAL_ID_LEN),
            });
        }

        if !logical_id_pattern().is_match(&id) {
            return Err(TemplateError::InvalidLogicalId {
                id,
                message: "only ASCII letters and digits are allowed".to_string(),
            });
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LogicalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_alphanumeric() {
        let id = LogicalId::new("ClairTargetGroup2").unwrap();
        assert_eq!(id.as_str(), "ClairTargetGroup2");
        assert_eq!(id.to_string(), "ClairTargetGroup2");
    }

    #[test]
    fn test_rejects_punctuation_and_empty() {
        assert!(matches!(
            LogicalId::new("clair-db"),
            Err(TemplateError::InvalidLogicalId { .. })
        ));
        assert!(matches!(
            LogicalId::new(""),
            Err(TemplateError::InvalidLogicalId { .. })
        ));
        assert!(!is_valid_logical_id("Bad Id"));
    }

    #[test]
    fn test_rejects_overlong() {
        let id = "A".repeat(MAX_LOGICAL_ID_LEN + 1);
        assert!(LogicalId::new(id).is_err());
        assert!(is_valid_logical_id(&"A".repeat(MAX_LOGICAL_ID_LEN)));
    }
}
