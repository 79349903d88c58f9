//! Augmentation provider SPI.
//!
//! External plugins contribute synthetic members alongside a declaration's
//! own members. Providers live in an explicit registry and are consulted in
//! registration order; results are concatenated. A provider call is
//! all-or-nothing: the merge layer never partially applies one provider's
//! contribution.
//!
//! Contributions must be a pure function of (declaration identity, member
//! kind, current modification stamp) — the member caches key on exactly that.

use std::sync::Arc;

use quill_core::{ModifierMask, Name};

use crate::decl::{ClassDecl, FieldDecl, MethodDecl};
use crate::synthetic::{LightClass, LightField, LightMethod, LightParameter, LightStatement};

/// The member classes a provider can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
    InnerClass,
    Parameter,
    TypeParameter,
    Throws,
    Annotation,
    Statement,
}

/// The declaration a provider is augmenting.
#[derive(Clone, Copy)]
pub enum AugmentTarget<'a> {
    Class(&'a ClassDecl),
    Method(&'a MethodDecl),
    Field(&'a FieldDecl),
}

/// One contributed synthetic member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticMember {
    Field(LightField),
    Method(LightMethod),
    InnerClass(LightClass),
    Parameter(LightParameter),
    TypeParameter(LightParameter),
    Throws(String),
    Statement(LightStatement),
}

/// External augmentation provider contract.
///
/// All methods have conservative defaults so a provider implements only what
/// it contributes. Provider panics propagate — containment is the plugin
/// host's responsibility, not this layer's.
pub trait AugmentProvider: Send + Sync {
    /// Stable provider name, used in diagnostics.
    fn name(&self) -> &str;

    /// Synthetic members of `kind` for `target`. `hint`, when present, names
    /// the single member the caller is interested in; providers may use it to
    /// skip work but must not return members that would be absent without it.
    fn augments(
        &self,
        target: AugmentTarget<'_>,
        kind: MemberKind,
        hint: Option<&Name>,
    ) -> Vec<SyntheticMember>;

    /// Transform the effective modifier set of a declaration (e.g. forcing
    /// `public static` on top-level snippet fields).
    fn transform_modifiers(
        &self,
        _target: AugmentTarget<'_>,
        modifiers: ModifierMask,
    ) -> ModifierMask {
        modifiers
    }

    /// A replacement inferred type for a variable, bypassing normal type
    /// inference. First provider returning `Some` wins.
    fn inferred_type(&self, _field: &FieldDecl) -> Option<String> {
        None
    }

    /// Whether the field's stated initializer can be trusted for
    /// constant-folding. First provider returning `Some` wins.
    fn trusts_initializer(&self, _field: &FieldDecl) -> Option<bool> {
        None
    }
}

/// Registration-ordered provider list.
#[derive(Default)]
pub struct AugmentRegistry {
    providers: Vec<Arc<dyn AugmentProvider>>,
}

impl AugmentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn AugmentProvider>) {
        self.providers.push(provider);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// All contributions for (target, kind), provider registration order,
    /// each provider's own internal order preserved.
    pub fn collect(
        &self,
        target: AugmentTarget<'_>,
        kind: MemberKind,
        hint: Option<&Name>,
    ) -> Vec<SyntheticMember> {
        let mut out = Vec::new();
        for provider in &self.providers {
            out.extend(provider.augments(target, kind, hint));
        }
        out
    }

    /// Fold the declared modifier mask through all providers, in order.
    pub fn effective_modifiers(
        &self,
        target: AugmentTarget<'_>,
        declared: ModifierMask,
    ) -> ModifierMask {
        self.providers
            .iter()
            .fold(declared, |mask, provider| {
                provider.transform_modifiers(target, mask)
            })
    }

    pub fn inferred_type(&self, field: &FieldDecl) -> Option<String> {
        self.providers
            .iter()
            .find_map(|provider| provider.inferred_type(field))
    }

    pub fn trusts_initializer(&self, field: &FieldDecl) -> Option<bool> {
        self.providers
            .iter()
            .find_map(|provider| provider.trusts_initializer(field))
    }
}

impl std::fmt::Debug for AugmentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AugmentRegistry")
            .field(
                "providers",
                &self
                    .providers
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
