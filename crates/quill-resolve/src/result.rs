//! Resolution results.
//!
//! Zero candidates is a normal outcome (empty vec, never an error); multiple
//! candidates mean the reference is ambiguous and the caller owns any
//! pick-one policy. Each candidate carries an accessibility flag — a target
//! can resolve and still be inaccessible from the referencing file.

use quill_core::{DeclId, Name, PackageName, QualifiedName, TypeName};

use crate::index::StaticMemberId;

/// A class-like candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassCandidate {
    /// A class declared in the current file.
    Source(DeclId),
    /// An augmented (provider-contributed) inner class of a source class.
    Synthetic { owner: DeclId, name: Name },
    /// A class known only to the global index.
    External(TypeName),
    /// A type parameter of an enclosing declaration.
    TypeParameter { owner: DeclId, name: Name },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldCandidate {
    pub owner: DeclId,
    /// Absent for augmented fields, which have no source identity.
    pub id: Option<DeclId>,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamCandidate {
    pub method: DeclId,
    pub id: Option<DeclId>,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodCandidate {
    pub owner: DeclId,
    /// Absent for augmented methods.
    pub id: Option<DeclId>,
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolveTarget {
    Class(ClassCandidate),
    Package(PackageName),
    /// Not a package itself, but a strict prefix of one that exists.
    PackagePrefix(PackageName),
    Field(FieldCandidate),
    Parameter(ParamCandidate),
    /// One entry per overload; a call site with several applicable
    /// overloads sees several results.
    Method(MethodCandidate),
    StaticMember(StaticMemberId),
    Module(QualifiedName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    pub target: ResolveTarget,
    /// False when the target resolved but visibility rules hide it from the
    /// referencing file.
    pub accessible: bool,
    /// The import declaration this candidate came through, when any.
    pub via_import: Option<DeclId>,
}

impl ResolveResult {
    #[must_use]
    pub fn accessible(target: ResolveTarget) -> Self {
        Self {
            target,
            accessible: true,
            via_import: None,
        }
    }

    #[must_use]
    pub fn inaccessible(target: ResolveTarget) -> Self {
        Self {
            target,
            accessible: false,
            via_import: None,
        }
    }

    #[must_use]
    pub fn with_import(mut self, import: Option<DeclId>) -> Self {
        self.via_import = import;
        self
    }
}
