//! Class-level member cache ("inner stuff").
//!
//! Merged member lists are recomputed lazily on a modification-stamp miss:
//! own members (read through dual storage) first, then augmented members in
//! provider registration order, then — for non-anonymous enums — the
//! generated `values()`/`valueOf(String)` helpers. Name-indexed maps are
//! derived from the already-cached lists under their own stamp entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quill_core::{DeclId, Modifier, ModificationStamp, ModifierMask, Name};

use crate::augment::{AugmentTarget, MemberKind, SyntheticMember};
use crate::decl::{ClassDecl, FieldDecl, MethodDecl};
use crate::synthetic::{LightClass, LightField, LightMethod, LightParameter};

/// A field in a merged member list: textually present or contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldItem {
    Declared(FieldDecl),
    Synthetic(Arc<LightField>),
}

impl FieldItem {
    #[must_use]
    pub fn name(&self) -> Name {
        match self {
            FieldItem::Declared(field) => field.name(),
            FieldItem::Synthetic(light) => light.name.clone(),
        }
    }

    #[must_use]
    pub fn modifiers(&self) -> ModifierMask {
        match self {
            FieldItem::Declared(field) => field.modifiers(),
            FieldItem::Synthetic(light) => light.modifiers,
        }
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, FieldItem::Synthetic(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodItem {
    Declared(MethodDecl),
    Synthetic(Arc<LightMethod>),
}

impl MethodItem {
    #[must_use]
    pub fn name(&self) -> Name {
        match self {
            MethodItem::Declared(method) => method.name(),
            MethodItem::Synthetic(light) => light.name.clone(),
        }
    }

    #[must_use]
    pub fn modifiers(&self) -> ModifierMask {
        match self {
            MethodItem::Declared(method) => method.modifiers(),
            MethodItem::Synthetic(light) => light.modifiers,
        }
    }

    /// Synthetic entries model constructors as methods without a return type.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        match self {
            MethodItem::Declared(method) => method.is_constructor(),
            MethodItem::Synthetic(light) => light.return_type_text.is_none(),
        }
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, MethodItem::Synthetic(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    Declared(ClassDecl),
    Synthetic(Arc<LightClass>),
}

impl ClassItem {
    #[must_use]
    pub fn name(&self) -> Option<Name> {
        match self {
            ClassItem::Declared(class) => class.name(),
            ClassItem::Synthetic(light) => Some(light.name.clone()),
        }
    }

    #[must_use]
    pub fn modifiers(&self) -> ModifierMask {
        match self {
            ClassItem::Declared(class) => class.modifiers(),
            ClassItem::Synthetic(light) => light.modifiers,
        }
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, ClassItem::Synthetic(_))
    }
}

/// An own record component (record components are not augmentable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponentView {
    pub name: Name,
    pub type_text: String,
}

/// A diagnosable oddity recorded while merging members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberAnomaly {
    /// A physically-declared inner class and an augmented one share a name.
    /// The first-seen entry won the by-name map; whether that preference is
    /// intentional is questionable, so it is recorded rather than silent.
    InnerClassNameCollision {
        owner: DeclId,
        name: Name,
        kept_declared: bool,
    },
}

#[derive(Debug)]
pub(crate) struct MemberLists {
    pub(crate) fields: Vec<FieldItem>,
    pub(crate) methods: Vec<MethodItem>,
    pub(crate) constructors: Vec<MethodItem>,
    pub(crate) inner_classes: Vec<ClassItem>,
}

#[derive(Debug)]
pub(crate) struct MemberMaps {
    pub(crate) field_by_name: HashMap<Name, FieldItem>,
    pub(crate) methods_by_name: HashMap<Name, Vec<MethodItem>>,
    pub(crate) inner_class_by_name: HashMap<Name, ClassItem>,
}

pub(crate) struct ClassMemberCache {
    lists: Mutex<Option<(ModificationStamp, Arc<MemberLists>)>>,
    maps: Mutex<Option<(ModificationStamp, Arc<MemberMaps>)>>,
    anomalies: Mutex<Vec<MemberAnomaly>>,
}

impl ClassMemberCache {
    pub(crate) fn new() -> Self {
        Self {
            lists: Mutex::new(None),
            maps: Mutex::new(None),
            anomalies: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn lists(&self, owner: &ClassDecl) -> Arc<MemberLists> {
        let stamp = owner.stamp();
        if let Some(cached) = self.cached_lists(stamp) {
            return cached;
        }
        // Computed outside the lock so providers may query the owner; the
        // entry is populated atomically at the end.
        let computed = Arc::new(compute_lists(owner));
        let mut guard = self.lists.lock().unwrap();
        match &*guard {
            Some((cached_stamp, lists)) if *cached_stamp == stamp => lists.clone(),
            _ => {
                *guard = Some((stamp, computed.clone()));
                computed
            }
        }
    }

    fn cached_lists(&self, stamp: ModificationStamp) -> Option<Arc<MemberLists>> {
        let guard = self.lists.lock().unwrap();
        match &*guard {
            Some((cached_stamp, lists)) if *cached_stamp == stamp => Some(lists.clone()),
            _ => None,
        }
    }

    pub(crate) fn maps(&self, owner: &ClassDecl) -> Arc<MemberMaps> {
        let stamp = owner.stamp();
        {
            let guard = self.maps.lock().unwrap();
            if let Some((cached_stamp, maps)) = &*guard {
                if *cached_stamp == stamp {
                    return maps.clone();
                }
            }
        }
        let lists = self.lists(owner);
        let mut anomalies = Vec::new();
        let computed = Arc::new(compute_maps(owner, &lists, &mut anomalies));
        *self.anomalies.lock().unwrap() = anomalies;
        let mut guard = self.maps.lock().unwrap();
        match &*guard {
            Some((cached_stamp, maps)) if *cached_stamp == stamp => maps.clone(),
            _ => {
                *guard = Some((stamp, computed.clone()));
                computed
            }
        }
    }

    pub(crate) fn anomalies(&self) -> Vec<MemberAnomaly> {
        self.anomalies.lock().unwrap().clone()
    }
}

fn compute_lists(owner: &ClassDecl) -> MemberLists {
    let children = owner.children();
    let registry = owner.registry();

    let mut fields: Vec<FieldItem> = children
        .fields
        .iter()
        .cloned()
        .map(FieldItem::Declared)
        .collect();
    for member in registry.collect(AugmentTarget::Class(owner), MemberKind::Field, None) {
        match member {
            SyntheticMember::Field(light) => fields.push(FieldItem::Synthetic(Arc::new(light))),
            other => unexpected_contribution(owner.id(), MemberKind::Field, &other),
        }
    }

    let mut methods: Vec<MethodItem> = children
        .methods
        .iter()
        .cloned()
        .map(MethodItem::Declared)
        .collect();
    for member in registry.collect(AugmentTarget::Class(owner), MemberKind::Method, None) {
        match member {
            SyntheticMember::Method(light) => methods.push(MethodItem::Synthetic(Arc::new(light))),
            other => unexpected_contribution(owner.id(), MemberKind::Method, &other),
        }
    }

    // Enum helpers are generated on demand, never stored in the stub. They
    // land after all own and augmented methods.
    if owner.is_enum() && !owner.is_anonymous() {
        if let Some(name) = owner.name() {
            methods.push(MethodItem::Synthetic(Arc::new(enum_values_method(
                owner.id(),
                &name,
            ))));
            methods.push(MethodItem::Synthetic(Arc::new(enum_value_of_method(
                owner.id(),
                &name,
            ))));
        }
    }

    let mut inner_classes: Vec<ClassItem> = children
        .classes
        .iter()
        .cloned()
        .map(ClassItem::Declared)
        .collect();
    for member in registry.collect(AugmentTarget::Class(owner), MemberKind::InnerClass, None) {
        match member {
            SyntheticMember::InnerClass(light) => {
                inner_classes.push(ClassItem::Synthetic(Arc::new(light)));
            }
            other => unexpected_contribution(owner.id(), MemberKind::InnerClass, &other),
        }
    }

    let constructors = methods
        .iter()
        .filter(|method| method.is_constructor())
        .cloned()
        .collect();

    MemberLists {
        fields,
        methods,
        constructors,
        inner_classes,
    }
}

fn compute_maps(
    owner: &ClassDecl,
    lists: &MemberLists,
    anomalies: &mut Vec<MemberAnomaly>,
) -> MemberMaps {
    let mut field_by_name = HashMap::new();
    for field in &lists.fields {
        field_by_name.entry(field.name()).or_insert_with(|| field.clone());
    }

    let mut methods_by_name: HashMap<Name, Vec<MethodItem>> = HashMap::new();
    for method in &lists.methods {
        methods_by_name
            .entry(method.name())
            .or_default()
            .push(method.clone());
    }

    let mut inner_class_by_name: HashMap<Name, ClassItem> = HashMap::new();
    for class in &lists.inner_classes {
        let Some(name) = class.name() else { continue };
        match inner_class_by_name.get(&name) {
            None => {
                inner_class_by_name.insert(name, class.clone());
            }
            Some(first) => {
                // First-seen wins. A declared/augmented split is the
                // diagnosable case; the loser is recorded, not dropped
                // silently.
                if first.is_synthetic() != class.is_synthetic() {
                    let kept_declared = !first.is_synthetic();
                    tracing::error!(
                        owner = ?owner.id(),
                        name = %name,
                        kept_declared,
                        "inner class name collision between declared and augmented entries"
                    );
                    anomalies.push(MemberAnomaly::InnerClassNameCollision {
                        owner: owner.id(),
                        name,
                        kept_declared,
                    });
                }
            }
        }
    }

    MemberMaps {
        field_by_name,
        methods_by_name,
        inner_class_by_name,
    }
}

#[cold]
fn unexpected_contribution(owner: DeclId, kind: MemberKind, member: &SyntheticMember) {
    tracing::warn!(
        ?owner,
        ?kind,
        ?member,
        "augmentation provider returned a member of the wrong kind; ignored"
    );
}

fn enum_values_method(owner: DeclId, class_name: &Name) -> LightMethod {
    let text = format!("public static {class_name}[] values()");
    LightMethod {
        owner,
        name: Name::from("values"),
        modifiers: ModifierMask::of(&[Modifier::Public, Modifier::Static]),
        return_type_text: Some(format!("{class_name}[]")),
        parameters: Vec::new(),
        text,
    }
}

fn enum_value_of_method(owner: DeclId, class_name: &Name) -> LightMethod {
    let text = format!("public static {class_name} valueOf(String name)");
    LightMethod {
        owner,
        name: Name::from("valueOf"),
        modifiers: ModifierMask::of(&[Modifier::Public, Modifier::Static]),
        return_type_text: Some(class_name.as_str().to_string()),
        parameters: vec![LightParameter {
            owner,
            name: Name::from("name"),
            type_text: "String".to_string(),
        }],
        text,
    }
}
