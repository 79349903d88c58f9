//! Reference resolution for the quill declaration model.
//!
//! The engine classifies a reference by its syntactic position into a
//! [`ResolutionKind`], runs the kind-specific algorithm against the file's
//! declarations, its imports, and a [`GlobalIndex`] of the outside world, and
//! returns zero, one, or many candidates tagged with accessibility. Absence
//! and ambiguity are data; structural inconsistency is a loud failure.

mod engine;
mod file_index;
mod index;
mod kind;
mod modules;
mod result;

pub use engine::{Engine, RefScope, ResolveCache};
pub use file_index::{EntryKind, EnumeratedEntry, FileDeclarationIndex, FileIndexConfig};
pub use index::{resolve_type_with_nesting, GlobalIndex, StaticMemberId};
pub use kind::{classify, ResolutionKind};
pub use modules::{ModuleDef, ModuleExport};
pub use result::{
    ClassCandidate, FieldCandidate, MethodCandidate, ParamCandidate, ResolveResult, ResolveTarget,
};
