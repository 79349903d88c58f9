//! Declaration model: dual stub/tree storage, augmentation, member caches.
//!
//! Every declaration handle in this crate answers its read contract from the
//! compact stub when one is available ("green" path) and only otherwise walks
//! the full syntax subtree, materializing it lazily through the file's
//! [`TreeLoader`]. Member lists merge textually-present ("own") members with
//! provider-contributed ("augmented") ones, cached per modification stamp.

mod augment;
mod decl;
mod members;
mod method_stuff;
mod synthetic;


pub use augment::{AugmentProvider, AugmentRegistry, AugmentTarget, MemberKind, SyntheticMember};
pub use decl::{
    BackingKind, ClassDecl, DeclFile, FieldDecl, ImportDecl, MethodDecl, ModuleView, TreeLoader,
};
pub use members::{ClassItem, FieldItem, MemberAnomaly, MethodItem, RecordComponentView};
pub use method_stuff::{MethodBody, ParameterView, ThrowsView, TypeParameterView};
pub use synthetic::{LightClass, LightField, LightMethod, LightParameter, LightStatement};
