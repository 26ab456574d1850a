//! Dot-notation paths into nested documents.

use std::fmt;

/// One step of a parsed [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Navigate into an object property by name.
    Key(String),
    /// Expand into every element of a JSON array.
    ArrayItem,
}

/// A parsed dot-notation path to a sensitive field.
///
/// Array fields use the `[]` suffix before the dot separator, e.g.
/// `"orders[].cardNumber"` → `[Key("orders"), ArrayItem, Key("cardNumber")]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a dot-notation path. Paths are programmer-authored static
    /// configuration, so parsing is infallible by construction.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        for part in path.split('.') {
            if let Some(key) = part.strip_suffix("[]") {
                segments.push(Segment::Key(key.to_owned()));
                segments.push(Segment::ArrayItem);
            } else {
                segments.push(Segment::Key(part.to_owned()));
            }
        }
        Self {
            raw: path.to_owned(),
            segments,
        }
    }

    /// The original dot-notation spelling.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments, in navigation order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
