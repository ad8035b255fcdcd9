//! Strongly-typed identifiers for parkbot

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one booking run, used to correlate log lines
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell runs apart in a log
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_uniqueness() {
        let r1 = RunId::new();
        let r2 = RunId::new();
        assert_ne!(r1, r2);
    }

    #[test]
    fn run_id_short_form() {
        let id = RunId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(id.to_string().replace('-', "").starts_with(&short));
    }

    #[test]
    fn run_id_serialize_deserialize() {
        let id = RunId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
