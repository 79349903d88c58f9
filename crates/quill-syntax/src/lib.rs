//! Syntax-level input model for quill.
//!
//! The lexer/parser proper is an external collaborator. This crate defines the
//! two tree shapes it produces and the rest of the workspace consumes:
//!
//! - the **full AST** ([`ast`]): declaration-grade nodes carrying everything a
//!   materialized syntax subtree can answer, and
//! - the **light tree** ([`light`]): a token-position-only arena used by fast
//!   scans that must never force the full declaration model.

pub mod ast;
pub mod light;

pub use ast::{
    AstClass, AstField, AstFile, AstImport, AstMethod, AstModule, AstParameter, AstRecordComponent,
    AstRef, AstTypeParameter, AstTypeRef, ClassKind, ClassShape, ExportDecl, RefContext, RefId,
};
pub use light::{LightKind, LightNode, LightNodeId, LightTree, LightTreeBuilder};
