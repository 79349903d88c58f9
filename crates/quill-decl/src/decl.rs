//! Dual declaration storage.
//!
//! A declaration handle starts out answering every query from its stub. The
//! first query that genuinely needs the syntax tree performs the stub-to-AST
//! switch: the file's full AST is materialized through the [`TreeLoader`]
//! (idempotent under re-entrancy) and this one node becomes tree-backed.
//! Sibling and child handles stay stub-backed until individually touched; the
//! transition is one-way for the handle's lifetime.
//!
//! A stub that names a child the materialized tree does not have is index
//! corruption: queries panic with the declaration identity attached rather
//! than defaulting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use quill_core::{
    DeclId, EpochSource, FileId, LocalTracker, ModificationStamp, ModifierMask, Name, PackageName,
    QualifiedName, Span,
};
use quill_stub::{build_stub_tree, ClassStub, FieldStub, InitializerText, MethodStub, StubTree};
use quill_syntax::{AstClass, AstField, AstFile, AstMethod, ClassKind, ClassShape, ExportDecl};

use crate::augment::{AugmentRegistry, AugmentTarget};
use crate::members::{
    ClassItem, ClassMemberCache, FieldItem, MemberAnomaly, MethodItem, RecordComponentView,
};
use crate::method_stuff::{
    MethodBody, MethodStuffCache, ParameterView, ThrowsView, TypeParameterView,
};

/// External collaborator that parses a file's text into its full AST.
///
/// Loading is synchronous; callers experience the stub-to-AST switch as
/// latency on the query that triggered it.
pub trait TreeLoader: Send + Sync {
    fn load(&self, file: FileId) -> Arc<AstFile>;
}

/// Which representation currently backs a declaration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingKind {
    StubBacked,
    TreeBacked,
}

pub(crate) struct DeclContext {
    file: FileId,
    /// Present iff this file is stub-backed; queries consult it first.
    stub: Option<Arc<StubTree>>,
    /// Identity skeleton: equal to `stub` for stub-backed files, derived from
    /// the AST otherwise. Used only for [`DeclId`] assignment, never for
    /// query answers.
    shape: Arc<StubTree>,
    ast: OnceLock<Arc<AstFile>>,
    loader: Option<Box<dyn TreeLoader>>,
    epoch: Arc<EpochSource>,
    registry: Arc<AugmentRegistry>,
}

impl DeclContext {
    /// The materialized full AST, loading it on first use.
    fn ast(&self) -> &Arc<AstFile> {
        self.ast.get_or_init(|| {
            let loader = self
                .loader
                .as_ref()
                .unwrap_or_else(|| panic!("file {:?}: no AST and no tree loader", self.file));
            tracing::debug!(file = ?self.file, "stub-to-AST switch");
            loader.load(self.file)
        })
    }
}

#[cold]
fn corrupted(id: DeclId, what: &str) -> ! {
    panic!("stub index corruption at {id:?}: {what}");
}

#[cold]
fn invalidated(id: DeclId) -> ! {
    panic!(
        "access to invalidated declaration {id:?}: \
         a stale handle was used across a structural edit boundary"
    );
}

fn stub_class<'t>(tree: &'t StubTree, path: &[usize]) -> Option<&'t ClassStub> {
    let (&first, rest) = path.split_first()?;
    let mut current = tree.classes.get(first)?;
    for &idx in rest {
        current = current.classes.get(idx)?;
    }
    Some(current)
}

fn ast_class<'t>(file: &'t AstFile, path: &[usize]) -> Option<&'t AstClass> {
    let (&first, rest) = path.split_first()?;
    let mut current = file.classes.get(first)?;
    for &idx in rest {
        current = current.classes.get(idx)?;
    }
    Some(current)
}

/// An import declaration view, answered entirely from the stub level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub id: DeclId,
    pub is_static: bool,
    pub on_demand: bool,
    pub is_module: bool,
    pub path: QualifiedName,
    pub range: Span,
}

/// The module declaration surface resolution consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleView {
    pub id: DeclId,
    pub name: QualifiedName,
    pub requires: Vec<QualifiedName>,
    pub exports: Vec<ExportDecl>,
}

/// One file's declarations, entry point to the dual model.
pub struct DeclFile {
    ctx: Arc<DeclContext>,
    top: OnceLock<Vec<ClassDecl>>,
}

impl DeclFile {
    /// Build a stub-backed file. The stub tree is validated eagerly: handing
    /// this constructor a corrupted tree is a fatal index error.
    #[must_use]
    pub fn from_stub(
        stub: StubTree,
        loader: Box<dyn TreeLoader>,
        epoch: Arc<EpochSource>,
        registry: Arc<AugmentRegistry>,
    ) -> Self {
        if let Err(corruption) = stub.validate() {
            panic!("corrupted stub tree for {:?}: {corruption}", stub.file);
        }
        let stub = Arc::new(stub);
        Self {
            ctx: Arc::new(DeclContext {
                file: stub.file,
                shape: stub.clone(),
                stub: Some(stub),
                ast: OnceLock::new(),
                loader: Some(loader),
                epoch,
                registry,
            }),
            top: OnceLock::new(),
        }
    }

    /// Build a tree-backed file (no stub exists, e.g. a non-indexable
    /// fragment whose AST was parsed directly).
    #[must_use]
    pub fn from_ast(
        ast: Arc<AstFile>,
        epoch: Arc<EpochSource>,
        registry: Arc<AugmentRegistry>,
    ) -> Self {
        let shape = Arc::new(build_stub_tree(&ast));
        let cell = OnceLock::new();
        let _ = cell.set(ast.clone());
        Self {
            ctx: Arc::new(DeclContext {
                file: ast.file,
                stub: None,
                shape,
                ast: cell,
                loader: None,
                epoch,
                registry,
            }),
            top: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn file(&self) -> FileId {
        self.ctx.file
    }

    #[must_use]
    pub fn epoch(&self) -> &Arc<EpochSource> {
        &self.ctx.epoch
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<AugmentRegistry> {
        &self.ctx.registry
    }

    #[must_use]
    pub fn package(&self) -> Option<PackageName> {
        match &self.ctx.stub {
            Some(stub) => stub.package.clone(),
            None => self.ctx.ast().package.clone(),
        }
    }

    #[must_use]
    pub fn module(&self) -> Option<ModuleView> {
        if let Some(stub) = &self.ctx.stub {
            return stub.module.as_ref().map(|module| ModuleView {
                id: module.id,
                name: module.name.clone(),
                requires: module.requires.clone(),
                exports: module
                    .exports
                    .iter()
                    .map(|export| ExportDecl {
                        package: export.package.clone(),
                        to: export.to.clone(),
                    })
                    .collect(),
            });
        }
        let shape = &self.ctx.shape;
        self.ctx.ast().module.as_ref().map(|module| ModuleView {
            id: shape
                .module
                .as_ref()
                .map(|m| m.id)
                .unwrap_or_else(|| panic!("module shape missing for {:?}", self.ctx.file)),
            name: module.name.clone(),
            requires: module.requires.clone(),
            exports: module.exports.clone(),
        })
    }

    /// All import declarations, stub-level data.
    #[must_use]
    pub fn imports(&self) -> Vec<ImportDecl> {
        let stubs = match &self.ctx.stub {
            Some(stub) => &stub.imports,
            None => &self.ctx.shape.imports,
        };
        stubs
            .iter()
            .map(|import| ImportDecl {
                id: import.id,
                is_static: import.is_static,
                on_demand: import.on_demand,
                is_module: import.is_module,
                path: import.path.clone(),
                range: import.range,
            })
            .collect()
    }

    /// Canonical handles for the file's top-level classes.
    pub fn classes(&self) -> &[ClassDecl] {
        self.top.get_or_init(|| {
            let count = match &self.ctx.stub {
                Some(stub) => stub.classes.len(),
                None => self.ctx.ast().classes.len(),
            };
            (0..count)
                .map(|idx| ClassDecl::new(self.ctx.clone(), vec![idx]))
                .collect()
        })
    }

    #[must_use]
    pub fn find_class(&self, name: &Name) -> Option<ClassDecl> {
        self.classes()
            .iter()
            .find(|class| class.name().as_ref() == Some(name))
            .cloned()
    }
}

pub(crate) struct Children {
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) methods: Vec<MethodDecl>,
    pub(crate) classes: Vec<ClassDecl>,
}

struct ClassDeclInner {
    ctx: Arc<DeclContext>,
    path: Vec<usize>,
    id: DeclId,
    valid: AtomicBool,
    local: LocalTracker,
    tree_backed: OnceLock<()>,
    children: OnceLock<Children>,
    members: ClassMemberCache,
}

/// Handle to a class declaration (any [`ClassKind`], any [`ClassShape`]).
#[derive(Clone)]
pub struct ClassDecl {
    inner: Arc<ClassDeclInner>,
}

impl ClassDecl {
    fn new(ctx: Arc<DeclContext>, path: Vec<usize>) -> Self {
        let id = stub_class(&ctx.shape, &path)
            .unwrap_or_else(|| panic!("class path {path:?} missing in shape of {:?}", ctx.file))
            .id;
        Self {
            inner: Arc::new(ClassDeclInner {
                ctx,
                path,
                id,
                valid: AtomicBool::new(true),
                local: LocalTracker::new(),
                tree_backed: OnceLock::new(),
                children: OnceLock::new(),
                members: ClassMemberCache::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> DeclId {
        self.inner.id
    }

    /// The per-declaration structural change counter. The structural-edit
    /// path must bump this when the class's own shape changes.
    #[must_use]
    pub fn local_tracker(&self) -> &LocalTracker {
        &self.inner.local
    }

    #[must_use]
    pub fn stamp(&self) -> ModificationStamp {
        ModificationStamp::capture(&self.inner.ctx.epoch, &self.inner.local)
    }

    /// Mark this handle dead after a structural edit replaced its subtree.
    pub fn invalidate(&self) {
        self.inner.valid.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
    }

    fn ensure_valid(&self) {
        if !self.is_valid() {
            invalidated(self.inner.id);
        }
    }

    #[must_use]
    pub fn backing(&self) -> BackingKind {
        if self.inner.ctx.stub.is_none() || self.inner.tree_backed.get().is_some() {
            BackingKind::TreeBacked
        } else {
            BackingKind::StubBacked
        }
    }

    /// The green stub for this node, if one is available.
    fn stub_node(&self) -> Option<&ClassStub> {
        let stub = self.inner.ctx.stub.as_deref()?;
        match stub_class(stub, &self.inner.path) {
            Some(node) => Some(node),
            None => corrupted(self.inner.id, "class stub missing from its own tree"),
        }
    }

    /// The AST node, performing the stub-to-AST switch if necessary.
    fn ast_node(&self) -> &AstClass {
        let file = self.inner.ctx.ast();
        let _ = self.inner.tree_backed.set(());
        match ast_class(file, &self.inner.path) {
            Some(node) => node,
            None => corrupted(
                self.inner.id,
                "stub names a class the materialized tree does not contain",
            ),
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<Name> {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.name.clone();
        }
        self.ast_node().name.clone()
    }

    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.kind;
        }
        self.ast_node().kind
    }

    #[must_use]
    pub fn shape(&self) -> ClassShape {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.shape;
        }
        self.ast_node().shape
    }

    /// Declared modifiers, straight from source.
    #[must_use]
    pub fn modifiers(&self) -> ModifierMask {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.modifiers;
        }
        self.ast_node().modifiers
    }

    /// Modifiers after augmentation providers have transformed them.
    #[must_use]
    pub fn effective_modifiers(&self) -> ModifierMask {
        let declared = self.modifiers();
        self.inner
            .ctx
            .registry
            .effective_modifiers(AugmentTarget::Class(self), declared)
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.kind() == ClassKind::Enum
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.kind(), ClassKind::Interface | ClassKind::Annotation)
    }

    #[must_use]
    pub fn is_record(&self) -> bool {
        self.kind() == ClassKind::Record
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(
            self.shape(),
            ClassShape::Anonymous | ClassShape::EnumConstantBody
        )
    }

    /// Type texts of `extends` entries, then `implements`, source order.
    #[must_use]
    pub fn super_type_texts(&self) -> Vec<String> {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.super_type_texts.clone();
        }
        self.ast_node()
            .super_types
            .iter()
            .map(|ty| ty.text.clone())
            .collect()
    }

    #[must_use]
    pub fn type_parameter_names(&self) -> Vec<Name> {
        self.type_parameters()
            .into_iter()
            .map(|(_, name)| name)
            .collect()
    }

    /// Type parameters with their stable identities.
    #[must_use]
    pub fn type_parameters(&self) -> Vec<(DeclId, Name)> {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub
                .type_parameters
                .iter()
                .map(|tp| (tp.id, tp.name.clone()))
                .collect();
        }
        let shape = stub_class(&self.inner.ctx.shape, &self.inner.path)
            .unwrap_or_else(|| corrupted(self.inner.id, "class missing from identity skeleton"));
        self.ast_node()
            .type_parameters
            .iter()
            .zip(&shape.type_parameters)
            .map(|(tp, shape_tp)| (shape_tp.id, tp.name.clone()))
            .collect()
    }

    pub(crate) fn registry(&self) -> &AugmentRegistry {
        &self.inner.ctx.registry
    }

    /// Canonical handles for the class's own (textually present) children.
    pub(crate) fn children(&self) -> &Children {
        self.inner.children.get_or_init(|| {
            let (field_count, method_count, class_count) = match self.stub_node() {
                Some(stub) => (stub.fields.len(), stub.methods.len(), stub.classes.len()),
                None => {
                    let node = self.ast_node();
                    (node.fields.len(), node.methods.len(), node.classes.len())
                }
            };
            let fields = (0..field_count)
                .map(|idx| FieldDecl::new(self.inner.ctx.clone(), self.inner.path.clone(), idx))
                .collect();
            let methods = (0..method_count)
                .map(|idx| MethodDecl::new(self.inner.ctx.clone(), self.inner.path.clone(), idx))
                .collect();
            let classes = (0..class_count)
                .map(|idx| {
                    let mut path = self.inner.path.clone();
                    path.push(idx);
                    ClassDecl::new(self.inner.ctx.clone(), path)
                })
                .collect();
            Children {
                fields,
                methods,
                classes,
            }
        })
    }

    /// Own record components (not augmentable).
    #[must_use]
    pub fn record_components(&self) -> Vec<RecordComponentView> {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub
                .record_components
                .iter()
                .map(|component| RecordComponentView {
                    name: component.name.clone(),
                    type_text: component.type_text.clone(),
                })
                .collect();
        }
        self.ast_node()
            .record_components
            .iter()
            .map(|component| RecordComponentView {
                name: component.name.clone(),
                type_text: component.ty.text.clone(),
            })
            .collect()
    }

    // Merged member views, cached per modification stamp.

    #[must_use]
    pub fn fields(&self) -> Vec<FieldItem> {
        self.ensure_valid();
        self.inner.members.lists(self).fields.clone()
    }

    /// All methods, constructors included, own before augmented.
    #[must_use]
    pub fn methods(&self) -> Vec<MethodItem> {
        self.ensure_valid();
        self.inner.members.lists(self).methods.clone()
    }

    #[must_use]
    pub fn constructors(&self) -> Vec<MethodItem> {
        self.ensure_valid();
        self.inner.members.lists(self).constructors.clone()
    }

    #[must_use]
    pub fn inner_classes(&self) -> Vec<ClassItem> {
        self.ensure_valid();
        self.inner.members.lists(self).inner_classes.clone()
    }

    #[must_use]
    pub fn find_field_by_name(&self, name: &Name) -> Option<FieldItem> {
        self.ensure_valid();
        self.inner.members.maps(self).field_by_name.get(name).cloned()
    }

    #[must_use]
    pub fn find_methods_by_name(&self, name: &Name) -> Vec<MethodItem> {
        self.ensure_valid();
        self.inner
            .members
            .maps(self)
            .methods_by_name
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn find_inner_class_by_name(&self, name: &Name) -> Option<ClassItem> {
        self.ensure_valid();
        self.inner
            .members
            .maps(self)
            .inner_class_by_name
            .get(name)
            .cloned()
    }

    /// Diagnosable anomalies recorded during member merging (currently:
    /// physical/augmented inner-class name collisions).
    #[must_use]
    pub fn member_anomalies(&self) -> Vec<MemberAnomaly> {
        self.inner.members.anomalies()
    }
}

impl PartialEq for ClassDecl {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ClassDecl {}

impl std::hash::Hash for ClassDecl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl std::fmt::Debug for ClassDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDecl").field("id", &self.inner.id).finish()
    }
}

struct FieldDeclInner {
    ctx: Arc<DeclContext>,
    class_path: Vec<usize>,
    index: usize,
    id: DeclId,
    valid: AtomicBool,
    tree_backed: OnceLock<()>,
}

#[derive(Clone)]
pub struct FieldDecl {
    inner: Arc<FieldDeclInner>,
}

impl FieldDecl {
    fn new(ctx: Arc<DeclContext>, class_path: Vec<usize>, index: usize) -> Self {
        let id = stub_class(&ctx.shape, &class_path)
            .and_then(|class| class.fields.get(index))
            .unwrap_or_else(|| {
                panic!(
                    "field {index} of class path {class_path:?} missing in shape of {:?}",
                    ctx.file
                )
            })
            .id;
        Self {
            inner: Arc::new(FieldDeclInner {
                ctx,
                class_path,
                index,
                id,
                valid: AtomicBool::new(true),
                tree_backed: OnceLock::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> DeclId {
        self.inner.id
    }

    pub fn invalidate(&self) {
        self.inner.valid.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
    }

    fn ensure_valid(&self) {
        if !self.is_valid() {
            invalidated(self.inner.id);
        }
    }

    #[must_use]
    pub fn backing(&self) -> BackingKind {
        if self.inner.ctx.stub.is_none() || self.inner.tree_backed.get().is_some() {
            BackingKind::TreeBacked
        } else {
            BackingKind::StubBacked
        }
    }

    fn stub_node(&self) -> Option<&FieldStub> {
        let stub = self.inner.ctx.stub.as_deref()?;
        match stub_class(stub, &self.inner.class_path)
            .and_then(|class| class.fields.get(self.inner.index))
        {
            Some(node) => Some(node),
            None => corrupted(self.inner.id, "field stub missing from its own tree"),
        }
    }

    fn ast_node(&self) -> &AstField {
        let file = self.inner.ctx.ast();
        let _ = self.inner.tree_backed.set(());
        match ast_class(file, &self.inner.class_path)
            .and_then(|class| class.fields.get(self.inner.index))
        {
            Some(node) => node,
            None => corrupted(
                self.inner.id,
                "stub names a field the materialized tree does not contain",
            ),
        }
    }

    #[must_use]
    pub fn name(&self) -> Name {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.name.clone();
        }
        self.ast_node().name.clone()
    }

    #[must_use]
    pub fn modifiers(&self) -> ModifierMask {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.modifiers;
        }
        self.ast_node().modifiers
    }

    #[must_use]
    pub fn effective_modifiers(&self) -> ModifierMask {
        let declared = self.modifiers();
        self.inner
            .ctx
            .registry
            .effective_modifiers(AugmentTarget::Field(self), declared)
    }

    #[must_use]
    pub fn type_text(&self) -> String {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.type_text.clone();
        }
        self.ast_node().ty.text.clone()
    }

    /// The declared type unless a provider supplies a replacement inferred
    /// type.
    #[must_use]
    pub fn inferred_type_text(&self) -> String {
        self.inner
            .ctx
            .registry
            .inferred_type(self)
            .unwrap_or_else(|| self.type_text())
    }

    #[must_use]
    pub fn is_enum_constant(&self) -> bool {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.is_enum_constant;
        }
        self.ast_node().is_enum_constant
    }

    /// Detached initializer text. The green stub answers directly for
    /// `Absent`/`Stored`; the `NotStored`/`TooLong` sentinels force the AST.
    #[must_use]
    pub fn initializer_text(&self) -> Option<String> {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            match &stub.initializer {
                InitializerText::Absent => return None,
                InitializerText::Stored(text) => return Some(text.clone()),
                InitializerText::NotStored | InitializerText::TooLong => {}
            }
        }
        self.ast_node().initializer_text.clone()
    }

    /// Whether the stated initializer may be constant-folded. Providers can
    /// veto (or force) trust; the default trusts `final` fields only.
    #[must_use]
    pub fn can_trust_initializer(&self) -> bool {
        if let Some(answer) = self.inner.ctx.registry.trusts_initializer(self) {
            return answer;
        }
        self.modifiers().contains(quill_core::Modifier::Final)
    }
}

impl PartialEq for FieldDecl {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for FieldDecl {}

impl std::hash::Hash for FieldDecl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl std::fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDecl").field("id", &self.inner.id).finish()
    }
}

struct MethodDeclInner {
    ctx: Arc<DeclContext>,
    class_path: Vec<usize>,
    index: usize,
    id: DeclId,
    valid: AtomicBool,
    local: LocalTracker,
    tree_backed: OnceLock<()>,
    stuff: MethodStuffCache,
}

#[derive(Clone)]
pub struct MethodDecl {
    inner: Arc<MethodDeclInner>,
}

impl MethodDecl {
    fn new(ctx: Arc<DeclContext>, class_path: Vec<usize>, index: usize) -> Self {
        let id = stub_class(&ctx.shape, &class_path)
            .and_then(|class| class.methods.get(index))
            .unwrap_or_else(|| {
                panic!(
                    "method {index} of class path {class_path:?} missing in shape of {:?}",
                    ctx.file
                )
            })
            .id;
        Self {
            inner: Arc::new(MethodDeclInner {
                ctx,
                class_path,
                index,
                id,
                valid: AtomicBool::new(true),
                local: LocalTracker::new(),
                tree_backed: OnceLock::new(),
                stuff: MethodStuffCache::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> DeclId {
        self.inner.id
    }

    #[must_use]
    pub fn local_tracker(&self) -> &LocalTracker {
        &self.inner.local
    }

    #[must_use]
    pub fn stamp(&self) -> ModificationStamp {
        ModificationStamp::capture(&self.inner.ctx.epoch, &self.inner.local)
    }

    pub fn invalidate(&self) {
        self.inner.valid.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
    }

    fn ensure_valid(&self) {
        if !self.is_valid() {
            invalidated(self.inner.id);
        }
    }

    #[must_use]
    pub fn backing(&self) -> BackingKind {
        if self.inner.ctx.stub.is_none() || self.inner.tree_backed.get().is_some() {
            BackingKind::TreeBacked
        } else {
            BackingKind::StubBacked
        }
    }

    pub(crate) fn stub_node(&self) -> Option<&MethodStub> {
        let stub = self.inner.ctx.stub.as_deref()?;
        match stub_class(stub, &self.inner.class_path)
            .and_then(|class| class.methods.get(self.inner.index))
        {
            Some(node) => Some(node),
            None => corrupted(self.inner.id, "method stub missing from its own tree"),
        }
    }

    /// The identity skeleton node; carries child [`DeclId`]s even for
    /// tree-backed files.
    pub(crate) fn shape_node(&self) -> &MethodStub {
        stub_class(&self.inner.ctx.shape, &self.inner.class_path)
            .and_then(|class| class.methods.get(self.inner.index))
            .unwrap_or_else(|| {
                corrupted(self.inner.id, "method missing from identity skeleton")
            })
    }

    pub(crate) fn ast_node(&self) -> &AstMethod {
        let file = self.inner.ctx.ast();
        let _ = self.inner.tree_backed.set(());
        match ast_class(file, &self.inner.class_path)
            .and_then(|class| class.methods.get(self.inner.index))
        {
            Some(node) => node,
            None => corrupted(
                self.inner.id,
                "stub names a method the materialized tree does not contain",
            ),
        }
    }

    #[must_use]
    pub fn name(&self) -> Name {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.name.clone();
        }
        self.ast_node().name.clone()
    }

    #[must_use]
    pub fn modifiers(&self) -> ModifierMask {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.modifiers;
        }
        self.ast_node().modifiers
    }

    #[must_use]
    pub fn effective_modifiers(&self) -> ModifierMask {
        let declared = self.modifiers();
        self.inner
            .ctx
            .registry
            .effective_modifiers(AugmentTarget::Method(self), declared)
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.is_constructor;
        }
        self.ast_node().is_constructor
    }

    #[must_use]
    pub fn is_varargs(&self) -> bool {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.is_varargs;
        }
        self.ast_node().is_varargs
    }

    #[must_use]
    pub fn return_type_text(&self) -> Option<String> {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.return_type_text.clone();
        }
        self.ast_node().return_type.as_ref().map(|ty| ty.text.clone())
    }

    /// Whether a body exists, answered from the stub without loading it.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.ensure_valid();
        if let Some(stub) = self.stub_node() {
            return stub.has_body;
        }
        self.ast_node().body_text.is_some()
    }

    pub(crate) fn registry(&self) -> &AugmentRegistry {
        &self.inner.ctx.registry
    }

    // Stuff-cache views.

    #[must_use]
    pub fn parameter_list(&self) -> Vec<ParameterView> {
        self.ensure_valid();
        self.inner.stuff.signature(self).parameters.clone()
    }

    #[must_use]
    pub fn type_parameter_list(&self) -> Vec<TypeParameterView> {
        self.ensure_valid();
        self.inner.stuff.signature(self).type_parameters.clone()
    }

    #[must_use]
    pub fn throws_list(&self) -> Vec<ThrowsView> {
        self.ensure_valid();
        self.inner.stuff.signature(self).throws.clone()
    }

    /// The method body view. Forces the AST only when a body is actually
    /// present in source.
    #[must_use]
    pub fn body(&self) -> MethodBody {
        self.ensure_valid();
        self.inner.stuff.body(self)
    }
}

impl PartialEq for MethodDecl {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for MethodDecl {}

impl std::hash::Hash for MethodDecl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl std::fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDecl").field("id", &self.inner.id).finish()
    }
}
