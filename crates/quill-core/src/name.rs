use std::fmt;

use serde::{Deserialize, Serialize};

/// A simple (undotted) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name(String);

impl Name {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A dotted name such as `java.util.Map` or `p.q`.
///
/// Segment-oriented: callers that need prefix/suffix splits (static imports,
/// nested-type probing) work on [`QualifiedName::segments`] rather than on raw
/// string manipulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName(Vec<Name>);

impl QualifiedName {
    #[must_use]
    pub fn from_dotted(text: &str) -> Self {
        Self(
            text.split('.')
                .filter(|seg| !seg.is_empty())
                .map(Name::from)
                .collect(),
        )
    }

    #[must_use]
    pub fn from_segments(segments: Vec<Name>) -> Self {
        Self(segments)
    }

    #[must_use]
    pub fn to_dotted(&self) -> String {
        let mut out = String::new();
        for (idx, seg) in self.0.iter().enumerate() {
            if idx > 0 {
                out.push('.');
            }
            out.push_str(seg.as_str());
        }
        out
    }

    #[must_use]
    pub fn segments(&self) -> &[Name] {
        &self.0
    }

    #[must_use]
    pub fn last(&self) -> Option<&Name> {
        self.0.last()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, name: Name) {
        self.0.push(name);
    }

    /// Whether this name consists of a single segment.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.0.len() == 1
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

/// A dotted package name. The empty segment list is the unnamed package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageName(Vec<Name>);

impl PackageName {
    #[must_use]
    pub fn from_dotted(text: &str) -> Self {
        Self(
            text.split('.')
                .filter(|seg| !seg.is_empty())
                .map(Name::from)
                .collect(),
        )
    }

    #[must_use]
    pub fn unnamed() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn to_dotted(&self) -> String {
        let mut out = String::new();
        for (idx, seg) in self.0.iter().enumerate() {
            if idx > 0 {
                out.push('.');
            }
            out.push_str(seg.as_str());
        }
        out
    }

    #[must_use]
    pub fn segments(&self) -> &[Name] {
        &self.0
    }

    #[must_use]
    pub fn is_unnamed(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, name: Name) {
        self.0.push(name);
    }

    /// Whether `self` is a strict prefix of `other`.
    #[must_use]
    pub fn is_prefix_of(&self, other: &PackageName) -> bool {
        other.0.len() > self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

/// A fully-qualified binary type name (`java.util.Map$Entry` style for nested
/// types), as handed out by global indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The simple (rightmost) name, after both `.` and `$` separators.
    #[must_use]
    pub fn simple_name(&self) -> Name {
        let after_dot = self.0.rsplit('.').next().unwrap_or(&self.0);
        let after_dollar = after_dot.rsplit('$').next().unwrap_or(after_dot);
        Name::from(after_dollar)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
