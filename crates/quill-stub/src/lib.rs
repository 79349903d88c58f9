//! Serializable stub tree for quill declarations.
//!
//! A stub is an immutable summary of a declaration's essential queryable
//! facts: enough primitive data (names, modifier masks, type texts, detached
//! initializer texts) to answer every dual-storage query without touching the
//! full syntax tree. The persistence layer serializes exactly these types;
//! any consumer must preserve their semantics byte-for-byte.

mod build;
mod tree;

pub use build::build_stub_tree;
pub use tree::{
    ClassStub, ExportStub, FieldStub, ImportStub, InitializerText, MethodStub, ModuleStub,
    ParameterStub, RecordComponentStub, StubCorruption, StubTree, TypeParameterStub,
    MAX_STORED_INITIALIZER_LEN,
};
