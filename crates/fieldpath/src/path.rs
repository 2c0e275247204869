//! Field path parsing.

use crate::error::{Error, Result};
use std::fmt;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key.
    Field(String),
    /// Zero-based array index.
    Index(usize),
}

impl Segment {
    /// Parse a dotted path such as `spec.forProvider.routes[0].channelId`.
    pub fn parse(path: &str) -> Result<Vec<Segment>> {
        let invalid = |reason: &str| Error::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            let (field, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };

            if field.is_empty() && (segments.is_empty() || rest.is_empty()) {
                return Err(invalid("empty field name"));
            }
            if !field.is_empty() {
                segments.push(Segment::Field(field.to_string()));
            }

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unterminated '['"))?;
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| invalid("array index must be a non-negative integer"))?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid("unexpected characters after ']'"));
                }
            }
        }
        Ok(segments)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, "{name}"),
            Segment::Index(idx) => write!(f, "[{idx}]"),
        }
    }
}
