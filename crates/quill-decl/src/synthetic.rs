//! Light member wrappers for synthetic (non-source) declarations.
//!
//! Augmented members and generated enum helpers are not backed by a stub or a
//! syntax subtree; they are value objects over synthesized declaration text.
//! Equality and hashing are by (owning declaration identity, generated text),
//! so repeated generation produces value-equal instances without needing
//! reference identity.

use std::hash::{Hash, Hasher};

use quill_core::{DeclId, ModifierMask, Name};

/// A synthesized method, e.g. an enum's `values()` or a provider-contributed
/// accessor.
#[derive(Debug, Clone)]
pub struct LightMethod {
    pub owner: DeclId,
    pub name: Name,
    pub modifiers: ModifierMask,
    pub return_type_text: Option<String>,
    pub parameters: Vec<LightParameter>,
    /// Full synthesized declaration text; the equality key together with the
    /// owner.
    pub text: String,
}

impl PartialEq for LightMethod {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.text == other.text
    }
}

impl Eq for LightMethod {}

impl Hash for LightMethod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.text.hash(state);
    }
}

#[derive(Debug, Clone)]
pub struct LightField {
    pub owner: DeclId,
    pub name: Name,
    pub modifiers: ModifierMask,
    pub type_text: String,
    pub text: String,
}

impl PartialEq for LightField {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.text == other.text
    }
}

impl Eq for LightField {}

impl Hash for LightField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.text.hash(state);
    }
}

#[derive(Debug, Clone)]
pub struct LightClass {
    pub owner: DeclId,
    pub name: Name,
    pub modifiers: ModifierMask,
    pub text: String,
}

impl PartialEq for LightClass {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.text == other.text
    }
}

impl Eq for LightClass {}

impl Hash for LightClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.text.hash(state);
    }
}

/// A synthetic parameter (or type parameter) contributed to a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LightParameter {
    pub owner: DeclId,
    pub name: Name,
    pub type_text: String,
}

/// A synthetic statement appended to a method body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LightStatement {
    pub owner: DeclId,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{DeclKind, FileId};

    fn owner() -> DeclId {
        DeclId::new(FileId::from_raw(0), DeclKind::Class, 0)
    }

    #[test]
    fn light_method_equality_is_owner_plus_text() {
        let a = LightMethod {
            owner: owner(),
            name: Name::from("values"),
            modifiers: ModifierMask::empty(),
            return_type_text: Some("E[]".to_string()),
            parameters: Vec::new(),
            text: "public static E[] values()".to_string(),
        };
        let mut b = a.clone();
        b.modifiers = ModifierMask::of(&[quill_core::Modifier::Public]);
        // Differing non-key fields do not break value equality.
        assert_eq!(a, b);

        let mut c = a.clone();
        c.text = "something else".to_string();
        assert_ne!(a, c);
    }
}
