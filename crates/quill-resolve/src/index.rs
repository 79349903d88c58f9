//! Global lookup surface over the world outside the current file.
//!
//! Implementations cover whatever the surrounding system indexes: the
//! platform library, the project's other source files, archives. Tests
//! inject small fakes.

use quill_core::{Modifier, ModifierMask, Name, PackageName, QualifiedName, TypeName};

use crate::modules::ModuleDef;

/// Identity of an external static member, `owner::name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StaticMemberId(String);

impl StaticMemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.0.split_once("::").map(|(owner, _)| owner)
    }

    #[must_use]
    pub fn member_name(&self) -> Option<Name> {
        self.0.split_once("::").map(|(_, name)| Name::from(name))
    }
}

/// Global type/package/member index.
///
/// Type names handed out are binary (`Outer$Inner`); qualified-name inputs
/// are source-form dotted names. [`resolve_type_with_nesting`] bridges the
/// two.
pub trait GlobalIndex: Send + Sync {
    fn resolve_type(&self, name: &QualifiedName) -> Option<TypeName>;

    fn resolve_type_in_package(&self, package: &PackageName, name: &Name) -> Option<TypeName>;

    /// All top-level types of a package, used by on-demand scope building.
    fn types_in_package(&self, package: &PackageName) -> Vec<TypeName>;

    fn package_exists(&self, package: &PackageName) -> bool;

    /// Whether `prefix` is a strict prefix of some existing package — the
    /// "partial package" probe used before declaring a package name
    /// unresolved.
    fn package_prefix_exists(&self, prefix: &PackageName) -> bool;

    fn resolve_static_member(&self, owner: &TypeName, name: &Name) -> Option<StaticMemberId>;

    /// All static members of a type, for static-on-demand imports.
    fn static_members_of(&self, owner: &TypeName) -> Vec<StaticMemberId>;

    /// Member (nested) types of a type, for qualified-`new` lookups and
    /// type-on-demand imports.
    fn member_types_of(&self, owner: &TypeName) -> Vec<TypeName>;

    /// Declared modifiers of an external type; external indexes that do not
    /// track them report `public`.
    fn type_modifiers(&self, _ty: &TypeName) -> ModifierMask {
        ModifierMask::of(&[Modifier::Public])
    }

    /// Module descriptor lookup for `import module` and module references.
    fn module(&self, _name: &QualifiedName) -> Option<ModuleDef> {
        None
    }
}

/// Resolve a dotted name against the index, probing nested-type encodings.
///
/// Source refers to nested classes as `Outer.Inner`, but indexes use binary
/// names (`Outer$Inner`). When a qualified name fails to resolve as-is, the
/// rightmost segments are progressively treated as nested types, longer
/// package prefixes first.
#[must_use]
pub fn resolve_type_with_nesting(
    index: &dyn GlobalIndex,
    name: &QualifiedName,
) -> Option<TypeName> {
    if let Some(ty) = index.resolve_type(name) {
        return Some(ty);
    }

    let segments = name.segments();
    if segments.len() < 2 {
        return None;
    }

    for split_at in (0..segments.len() - 1).rev() {
        let type_segments = &segments[split_at..];
        if type_segments.len() < 2 {
            continue;
        }

        let mut candidate = String::new();
        for (idx, seg) in segments[..split_at].iter().enumerate() {
            if idx > 0 {
                candidate.push('.');
            }
            candidate.push_str(seg.as_str());
        }
        if split_at > 0 {
            candidate.push('.');
        }
        for (idx, seg) in type_segments.iter().enumerate() {
            if idx > 0 {
                candidate.push('$');
            }
            candidate.push_str(seg.as_str());
        }

        if let Some(ty) = index.resolve_type(&QualifiedName::from_dotted(&candidate)) {
            return Some(ty);
        }
    }

    None
}
