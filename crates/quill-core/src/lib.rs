//! Core shared types for quill.
//!
//! This crate is intentionally small and close to dependency-free: names and
//! qualified names, compact identifiers, modifier masks, the modification
//! tracking primitives every cache in the workspace keys on, and cooperative
//! cancellation.

mod cancel;
mod ids;
mod modifiers;
mod name;
mod tracking;

pub use cancel::{CancelToken, Cancelled};
pub use ids::{DeclId, DeclKind, FileId, Span};
pub use modifiers::{Modifier, ModifierMask};
pub use name::{Name, PackageName, QualifiedName, TypeName};
pub use tracking::{EpochSource, LocalTracker, ModificationStamp};
