use serde::{Deserialize, Serialize};

/// Compact identifier for a file known to the surrounding database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FileId(u32);

impl FileId {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// A half-open byte range in source text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// The closed set of declaration kinds the stub index models.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum DeclKind {
    Class,
    Method,
    Field,
    Parameter,
    TypeParameter,
    RecordComponent,
    Import,
    Module,
}

/// Stable identity of a declaration: file, kind, and pre-order position in
/// the file's stub tree.
///
/// Two transient node instances for the same logical entity (one stub-backed,
/// one tree-backed, during a stub-to-AST switch) compare equal through this
/// id: same kind + same position + same file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DeclId {
    pub file: FileId,
    pub kind: DeclKind,
    pub index: u32,
}

impl DeclId {
    #[must_use]
    pub const fn new(file: FileId, kind: DeclKind, index: u32) -> Self {
        Self { file, kind, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains_is_half_open() {
        let span = Span::new(2, 5);
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
    }
}
