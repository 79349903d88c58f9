//! Resolution-kind classification.
//!
//! The kind is a pure function of a reference's syntactic position (its
//! parent construct) plus whether it is qualified — nothing else. The engine
//! memoizes it per reference; see [`crate::Engine::classify`].

use quill_syntax::{AstRef, RefContext};

/// What a name reference can syntactically mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    /// Only a class makes sense here (annotation names, unqualified `new`).
    ClassName,
    /// Only a package makes sense here (`package` statements).
    PackageName,
    /// Ambiguous until resolved (type positions such as `extends` entries).
    ClassOrPackage,
    /// A dotted name that must denote a class.
    FqClassName,
    /// A dotted name that may denote a class or a package (imports,
    /// qualified type positions).
    FqClassOrPackage,
    /// The class name of `qualifier.new Inner()`: resolved as a member of
    /// the qualifier's type, never by lexical scope walk.
    ClassInQualifiedNew,
}

/// Classify a reference by its syntactic context.
///
/// There is deliberately no default branch: a context this function does not
/// recognize as a code-reference position is a structural inconsistency and
/// panics with the offending reference attached.
#[must_use]
pub fn classify(reference: &AstRef) -> ResolutionKind {
    let qualified = reference.is_qualified();
    match reference.context {
        RefContext::PackageStatement => ResolutionKind::PackageName,
        RefContext::ImportSingle | RefContext::ImportOnDemand => ResolutionKind::FqClassOrPackage,
        RefContext::ImportStatic => ResolutionKind::FqClassName,
        RefContext::QualifiedNew => ResolutionKind::ClassInQualifiedNew,
        RefContext::Annotation | RefContext::NewExpression => {
            if qualified {
                ResolutionKind::FqClassName
            } else {
                ResolutionKind::ClassName
            }
        }
        RefContext::ExtendsList
        | RefContext::ImplementsList
        | RefContext::ThrowsList
        | RefContext::TypeUse
        | RefContext::ExpressionName => {
            if qualified {
                ResolutionKind::FqClassOrPackage
            } else {
                ResolutionKind::ClassOrPackage
            }
        }
        RefContext::ModuleStatement => panic!(
            "reference {:?} ({:?}): module-declaration contexts are not code-reference \
             positions and cannot be classified",
            reference.id, reference.name
        ),
    }
}
