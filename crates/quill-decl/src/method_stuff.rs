//! Method-level cache ("method stuff"): parameters, type parameters, throws,
//! body.
//!
//! Signature pieces are answerable from the green stub; only the body view
//! may force the AST, and only when a body actually exists. Augmented
//! elements supplied on different queries but representing the same logical
//! synthetic element are interned to a canonical instance per modification
//! stamp; the interner is owned by the declaration and cleared eagerly when
//! its stamp advances.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quill_core::{DeclId, ModificationStamp, ModifierMask, Name};

use crate::augment::{AugmentTarget, MemberKind, SyntheticMember};
use crate::decl::MethodDecl;
use crate::synthetic::{LightParameter, LightStatement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterView {
    Declared {
        id: DeclId,
        name: Name,
        type_text: String,
        modifiers: ModifierMask,
    },
    Synthetic(Arc<LightParameter>),
}

impl ParameterView {
    #[must_use]
    pub fn name(&self) -> &Name {
        match self {
            ParameterView::Declared { name, .. } => name,
            ParameterView::Synthetic(light) => &light.name,
        }
    }

    #[must_use]
    pub fn type_text(&self) -> &str {
        match self {
            ParameterView::Declared { type_text, .. } => type_text,
            ParameterView::Synthetic(light) => &light.type_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeParameterView {
    Declared {
        id: DeclId,
        name: Name,
        bound_texts: Vec<String>,
    },
    Synthetic(Arc<LightParameter>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrowsView {
    Declared(String),
    Synthetic(Arc<String>),
}

impl ThrowsView {
    #[must_use]
    pub fn type_text(&self) -> &str {
        match self {
            ThrowsView::Declared(text) => text,
            ThrowsView::Synthetic(text) => text,
        }
    }
}

/// Body view: source text (when present) plus augmented trailing statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    pub text: Option<String>,
    pub synthetic_statements: Vec<Arc<LightStatement>>,
}

#[derive(Debug)]
pub(crate) struct MethodSignatureStuff {
    pub(crate) parameters: Vec<ParameterView>,
    pub(crate) type_parameters: Vec<TypeParameterView>,
    pub(crate) throws: Vec<ThrowsView>,
}

#[derive(Default)]
struct SyntheticInterner {
    stamp: Option<ModificationStamp>,
    parameters: HashMap<LightParameter, Arc<LightParameter>>,
    throws: HashMap<String, Arc<String>>,
    statements: HashMap<LightStatement, Arc<LightStatement>>,
}

impl SyntheticInterner {
    /// Drop every canonical instance the moment the stamp advances; nothing
    /// leaks across edit cycles.
    fn rollover(&mut self, stamp: ModificationStamp) {
        if self.stamp != Some(stamp) {
            self.parameters.clear();
            self.throws.clear();
            self.statements.clear();
            self.stamp = Some(stamp);
        }
    }

    fn parameter(&mut self, parameter: LightParameter) -> Arc<LightParameter> {
        self.parameters
            .entry(parameter.clone())
            .or_insert_with(|| Arc::new(parameter))
            .clone()
    }

    fn throws_entry(&mut self, text: String) -> Arc<String> {
        self.throws
            .entry(text.clone())
            .or_insert_with(|| Arc::new(text))
            .clone()
    }

    fn statement(&mut self, statement: LightStatement) -> Arc<LightStatement> {
        self.statements
            .entry(statement.clone())
            .or_insert_with(|| Arc::new(statement))
            .clone()
    }
}

pub(crate) struct MethodStuffCache {
    signature: Mutex<Option<(ModificationStamp, Arc<MethodSignatureStuff>)>>,
    body: Mutex<Option<(ModificationStamp, MethodBody)>>,
    interner: Mutex<SyntheticInterner>,
}

impl MethodStuffCache {
    pub(crate) fn new() -> Self {
        Self {
            signature: Mutex::new(None),
            body: Mutex::new(None),
            interner: Mutex::new(SyntheticInterner::default()),
        }
    }

    pub(crate) fn signature(&self, owner: &MethodDecl) -> Arc<MethodSignatureStuff> {
        let stamp = owner.stamp();
        {
            let guard = self.signature.lock().unwrap();
            if let Some((cached_stamp, stuff)) = &*guard {
                if *cached_stamp == stamp {
                    return stuff.clone();
                }
            }
        }
        let computed = Arc::new(self.compute_signature(owner, stamp));
        let mut guard = self.signature.lock().unwrap();
        match &*guard {
            Some((cached_stamp, stuff)) if *cached_stamp == stamp => stuff.clone(),
            _ => {
                *guard = Some((stamp, computed.clone()));
                computed
            }
        }
    }

    pub(crate) fn body(&self, owner: &MethodDecl) -> MethodBody {
        let stamp = owner.stamp();
        {
            let guard = self.body.lock().unwrap();
            if let Some((cached_stamp, body)) = &*guard {
                if *cached_stamp == stamp {
                    return body.clone();
                }
            }
        }
        let computed = self.compute_body(owner, stamp);
        let mut guard = self.body.lock().unwrap();
        match &*guard {
            Some((cached_stamp, body)) if *cached_stamp == stamp => body.clone(),
            _ => {
                *guard = Some((stamp, computed.clone()));
                computed
            }
        }
    }

    fn compute_signature(&self, owner: &MethodDecl, stamp: ModificationStamp) -> MethodSignatureStuff {
        let mut parameters: Vec<ParameterView> = Vec::new();
        let mut type_parameters: Vec<TypeParameterView> = Vec::new();
        let mut throws: Vec<ThrowsView> = Vec::new();

        if let Some(stub) = owner.stub_node() {
            for param in &stub.parameters {
                parameters.push(ParameterView::Declared {
                    id: param.id,
                    name: param.name.clone(),
                    type_text: param.type_text.clone(),
                    modifiers: param.modifiers,
                });
            }
            for tp in &stub.type_parameters {
                type_parameters.push(TypeParameterView::Declared {
                    id: tp.id,
                    name: tp.name.clone(),
                    bound_texts: tp.bound_texts.clone(),
                });
            }
            for text in &stub.throws_texts {
                throws.push(ThrowsView::Declared(text.clone()));
            }
        } else {
            let node = owner.ast_node();
            let shape = owner.shape_node();
            for (param, shape_param) in node.parameters.iter().zip(&shape.parameters) {
                parameters.push(ParameterView::Declared {
                    id: shape_param.id,
                    name: param.name.clone(),
                    type_text: param.ty.text.clone(),
                    modifiers: param.modifiers,
                });
            }
            for (tp, shape_tp) in node.type_parameters.iter().zip(&shape.type_parameters) {
                type_parameters.push(TypeParameterView::Declared {
                    id: shape_tp.id,
                    name: tp.name.clone(),
                    bound_texts: tp.bounds.iter().map(|ty| ty.text.clone()).collect(),
                });
            }
            for ty in &node.throws {
                throws.push(ThrowsView::Declared(ty.text.clone()));
            }
        }

        // Provider callbacks run before the interner lock is taken; they may
        // legitimately query this method's other cached views.
        let registry = owner.registry();
        let contributed_params =
            registry.collect(AugmentTarget::Method(owner), MemberKind::Parameter, None);
        let contributed_tps =
            registry.collect(AugmentTarget::Method(owner), MemberKind::TypeParameter, None);
        let contributed_throws =
            registry.collect(AugmentTarget::Method(owner), MemberKind::Throws, None);

        let mut interner = self.interner.lock().unwrap();
        interner.rollover(stamp);

        for member in contributed_params {
            match member {
                SyntheticMember::Parameter(light) => {
                    parameters.push(ParameterView::Synthetic(interner.parameter(light)));
                }
                other => wrong_kind(owner.id(), MemberKind::Parameter, &other),
            }
        }
        for member in contributed_tps {
            match member {
                SyntheticMember::TypeParameter(light) => {
                    type_parameters.push(TypeParameterView::Synthetic(interner.parameter(light)));
                }
                other => wrong_kind(owner.id(), MemberKind::TypeParameter, &other),
            }
        }
        for member in contributed_throws {
            match member {
                SyntheticMember::Throws(text) => {
                    throws.push(ThrowsView::Synthetic(interner.throws_entry(text)));
                }
                other => wrong_kind(owner.id(), MemberKind::Throws, &other),
            }
        }

        MethodSignatureStuff {
            parameters,
            type_parameters,
            throws,
        }
    }

    fn compute_body(&self, owner: &MethodDecl, stamp: ModificationStamp) -> MethodBody {
        // `has_body` is green; the AST is only forced when there is a body to
        // read.
        let text = if owner.has_body() {
            owner.ast_node().body_text.clone()
        } else {
            None
        };

        let registry = owner.registry();
        let contributed =
            registry.collect(AugmentTarget::Method(owner), MemberKind::Statement, None);

        let mut interner = self.interner.lock().unwrap();
        interner.rollover(stamp);

        let mut synthetic_statements = Vec::new();
        for member in contributed {
            match member {
                SyntheticMember::Statement(light) => {
                    synthetic_statements.push(interner.statement(light));
                }
                other => wrong_kind(owner.id(), MemberKind::Statement, &other),
            }
        }

        MethodBody {
            text,
            synthetic_statements,
        }
    }
}

#[cold]
fn wrong_kind(owner: DeclId, kind: MemberKind, member: &SyntheticMember) {
    tracing::warn!(
        ?owner,
        ?kind,
        ?member,
        "augmentation provider returned a member of the wrong kind; ignored"
    );
}
