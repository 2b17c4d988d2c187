//! # Field Paths
//!
//! Dot-separated addresses into a [`Document`](crate::Document).
//!
//! `"hero.buttons.0.label"` parses into
//! `[Key("hero"), Key("buttons"), Index(0), Key("label")]`. A segment made
//! only of ASCII digits is an array index, everything else is an object key.
//! Index segments keep their text, so `"01"` still addresses the object key
//! `"01"` when it lands on an object.

use crate::mutations::MutationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index { index: usize, raw: String },
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse::<usize>() {
                return Segment::Index {
                    index,
                    raw: raw.to_string(),
                };
            }
        }
        Segment::Key(raw.to_string())
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index { .. })
    }

    /// Object key form of this segment, exactly as written in the path
    pub fn as_key(&self) -> &str {
        match self {
            Segment::Key(key) => key,
            Segment::Index { raw, .. } => raw,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Parsed dot path. The first segment is always the section key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, MutationError> {
        if raw.is_empty() {
            return Err(MutationError::InvalidPath {
                path: raw.to_string(),
                reason: "path is empty".to_string(),
            });
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(MutationError::InvalidPath {
                    path: raw.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            segments.push(Segment::parse(part));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Top-level document key this path writes under
    pub fn section_key(&self) -> String {
        self.segments[0].as_key().to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for FieldPath {
    type Error = MutationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_segments() {
        let path = FieldPath::parse("hero.buttons.0.label").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("hero".to_string()),
                Segment::Key("buttons".to_string()),
                Segment::Index {
                    index: 0,
                    raw: "0".to_string(),
                },
                Segment::Key("label".to_string()),
            ]
        );
        assert_eq!(path.section_key(), "hero");
    }

    #[test]
    fn test_leading_zero_index_keeps_its_text() {
        let path = FieldPath::parse("hero.01").unwrap();
        let segment = &path.segments()[1];
        assert!(segment.is_index());
        assert_eq!(segment.as_key(), "01");
        assert_eq!(segment.to_string(), "01");
    }

    #[test]
    fn test_signed_and_alpha_numeric_are_keys() {
        let path = FieldPath::parse("a.-1.2b").unwrap();
        assert_eq!(path.segments()[1], Segment::Key("-1".to_string()));
        assert_eq!(path.segments()[2], Segment::Key("2b".to_string()));
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("hero..title").is_err());
        assert!(FieldPath::parse("hero.").is_err());
    }

    #[test]
    fn test_serde_uses_raw_string() {
        let path: FieldPath = serde_json::from_str("\"pricing.tiers.1\"").unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"pricing.tiers.1\"");
        assert!(serde_json::from_str::<FieldPath>("\"\"").is_err());
    }
}
