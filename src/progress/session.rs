//! Session-completion input

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CEFR proficiency tier. Only compared for equality by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    pub fn all() -> &'static [CefrLevel] {
        &[Self::A1, Self::A2, Self::B1, Self::B2, Self::C1, Self::C2]
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown CEFR level: {} (expected A1..C2)", s))
    }
}

/// A finished learning session: the only external trigger for streak,
/// mission and seasonal-event progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub level: CefrLevel,
    /// Activity identifier, e.g. "conversation" or "vocabulary"
    pub activity: String,
    /// Learning goal identifier, e.g. "travel" or "work"
    pub goal: String,
}

impl Session {
    pub fn new(level: CefrLevel, activity: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            level,
            activity: activity.into(),
            goal: goal.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!("b2".parse::<CefrLevel>(), Ok(CefrLevel::B2));
        assert_eq!(" C1 ".parse::<CefrLevel>(), Ok(CefrLevel::C1));
        assert!("D1".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn test_level_serializes_uppercase() {
        let json = serde_json::to_string(&CefrLevel::A2).unwrap();
        assert_eq!(json, "\"A2\"");
    }
}
