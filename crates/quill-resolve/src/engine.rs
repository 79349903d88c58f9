//! The reference resolution engine.
//!
//! Classify → resolve → disambiguate/fallback. Results are cached per
//! (reference identity, incomplete-code flag); the two flag values never
//! share an entry because their candidate sets legitimately differ.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quill_core::{
    CancelToken, Cancelled, DeclId, EpochSource, Modifier, Name, PackageName, QualifiedName,
    TypeName,
};
use quill_decl::{ClassDecl, ClassItem, DeclFile, FieldItem, MethodDecl, ParameterView};
use quill_syntax::{AstRef, RefContext, RefId};

use crate::file_index::{EntryKind, FileDeclarationIndex};
use crate::index::{resolve_type_with_nesting, GlobalIndex};
use crate::kind::{classify, ResolutionKind};
use crate::result::{
    ClassCandidate, FieldCandidate, MethodCandidate, ParamCandidate, ResolveResult, ResolveTarget,
};

/// Lexical surroundings of a reference, innermost first.
///
/// Statement-level scopes live in the lightweight resolver; this engine sees
/// the declaration-level context only.
#[derive(Default, Clone)]
pub struct RefScope {
    pub enclosing_classes: Vec<ClassDecl>,
    pub enclosing_method: Option<MethodDecl>,
}

impl RefScope {
    /// A file-level reference (imports, package statement, top-level
    /// annotations).
    #[must_use]
    pub fn file_level() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_class(class: ClassDecl) -> Self {
        Self {
            enclosing_classes: vec![class],
            enclosing_method: None,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.enclosing_method = Some(method);
        self
    }
}

/// Per-file resolve caches: memoized resolution kinds and resolution
/// results, both discarded wholesale when the epoch advances.
pub struct ResolveCache {
    epoch: Arc<EpochSource>,
    kinds: Mutex<(u64, HashMap<RefId, ResolutionKind>)>,
    results: Mutex<(u64, HashMap<(RefId, bool), Vec<ResolveResult>>)>,
}

impl ResolveCache {
    #[must_use]
    pub fn new(epoch: Arc<EpochSource>) -> Self {
        Self {
            epoch,
            kinds: Mutex::new((0, HashMap::new())),
            results: Mutex::new((0, HashMap::new())),
        }
    }

    fn kind(&self, id: RefId) -> Option<ResolutionKind> {
        let mut guard = self.kinds.lock().unwrap();
        let current = self.epoch.current();
        if guard.0 != current {
            guard.1.clear();
            guard.0 = current;
        }
        guard.1.get(&id).copied()
    }

    fn remember_kind(&self, id: RefId, kind: ResolutionKind) {
        let mut guard = self.kinds.lock().unwrap();
        if guard.0 == self.epoch.current() {
            guard.1.insert(id, kind);
        }
    }

    fn result(&self, key: (RefId, bool)) -> Option<Vec<ResolveResult>> {
        let mut guard = self.results.lock().unwrap();
        let current = self.epoch.current();
        if guard.0 != current {
            guard.1.clear();
            guard.0 = current;
        }
        guard.1.get(&key).cloned()
    }

    fn remember_result(&self, key: (RefId, bool), value: Vec<ResolveResult>) {
        let mut guard = self.results.lock().unwrap();
        if guard.0 == self.epoch.current() {
            guard.1.insert(key, value);
        }
    }
}

pub struct Engine<'a> {
    index: &'a dyn GlobalIndex,
    file: &'a DeclFile,
    decls: &'a FileDeclarationIndex,
    cache: &'a ResolveCache,
    cancel: CancelToken,
}

impl<'a> Engine<'a> {
    #[must_use]
    pub fn new(
        index: &'a dyn GlobalIndex,
        file: &'a DeclFile,
        decls: &'a FileDeclarationIndex,
        cache: &'a ResolveCache,
    ) -> Self {
        Self {
            index,
            file,
            decls,
            cache,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Memoized resolution-kind classification.
    #[must_use]
    pub fn classify(&self, reference: &AstRef) -> ResolutionKind {
        if let Some(kind) = self.cache.kind(reference.id) {
            return kind;
        }
        let kind = classify(reference);
        self.cache.remember_kind(reference.id, kind);
        kind
    }

    /// Resolve a reference to zero, one, or many candidates.
    ///
    /// `incomplete_code` widens the search for editors working on broken
    /// sources; its results are cached separately from strict ones.
    pub fn resolve(
        &self,
        reference: &AstRef,
        scope: &RefScope,
        incomplete_code: bool,
    ) -> Result<Vec<ResolveResult>, Cancelled> {
        let key = (reference.id, incomplete_code);
        if let Some(cached) = self.cache.result(key) {
            return Ok(cached);
        }

        let results = self.resolve_uncached(reference, scope, incomplete_code)?;
        self.cache.remember_result(key, results.clone());
        Ok(results)
    }

    fn resolve_uncached(
        &self,
        reference: &AstRef,
        scope: &RefScope,
        incomplete_code: bool,
    ) -> Result<Vec<ResolveResult>, Cancelled> {
        // Module references never reach the classifier.
        if reference.context == RefContext::ModuleStatement {
            let dotted = reference.dotted_name();
            return Ok(match self.index.module(&dotted) {
                Some(_) => vec![ResolveResult::accessible(ResolveTarget::Module(dotted))],
                None => Vec::new(),
            });
        }

        // Expression-position names live in the value namespace first; only
        // when nothing there matches do they fall back to the type/package
        // algorithms.
        if reference.context == RefContext::ExpressionName && !reference.is_qualified() {
            return self.resolve_expression_name(reference, scope, incomplete_code);
        }

        match self.classify(reference) {
            ResolutionKind::FqClassName => Ok(self.resolve_fq_class(&reference.dotted_name())),
            ResolutionKind::PackageName => Ok(self.resolve_package(&reference.dotted_name())),
            ResolutionKind::ClassName => {
                self.resolve_class_name(&reference.name, scope, incomplete_code)
            }
            ResolutionKind::ClassOrPackage => {
                self.resolve_class_or_package(reference, scope, incomplete_code)
            }
            ResolutionKind::FqClassOrPackage => Ok(self.resolve_fq_class_or_package(reference)),
            ResolutionKind::ClassInQualifiedNew => self.resolve_qualified_new(reference, scope),
        }
    }

    /// Direct global lookup by dotted name text; no scope walk.
    fn resolve_fq_class(&self, dotted: &QualifiedName) -> Vec<ResolveResult> {
        if let Some(class) = self.find_source_class_by_dotted(dotted) {
            return vec![ResolveResult::accessible(ResolveTarget::Class(
                ClassCandidate::Source(class.id()),
            ))];
        }
        match resolve_type_with_nesting(self.index, dotted) {
            Some(ty) => {
                let accessible = self.external_accessible(&ty);
                vec![ResolveResult {
                    target: ResolveTarget::Class(ClassCandidate::External(ty)),
                    accessible,
                    via_import: None,
                }]
            }
            None => Vec::new(),
        }
    }

    /// Direct package-registry lookup; falls back to the partial-package
    /// probe before declaring failure.
    fn resolve_package(&self, dotted: &QualifiedName) -> Vec<ResolveResult> {
        let package = PackageName::from_dotted(&dotted.to_dotted());
        if self.index.package_exists(&package) {
            return vec![ResolveResult::accessible(ResolveTarget::Package(package))];
        }
        if self.index.package_prefix_exists(&package) {
            return vec![ResolveResult::accessible(ResolveTarget::PackagePrefix(
                package,
            ))];
        }
        Vec::new()
    }

    /// Unqualified class name: walk enclosing lexical scopes outward, then
    /// the file-level declaration index. First matching tier wins; with
    /// incomplete-code tolerance the fallback chain is variable/field, then
    /// package name — in exactly that order.
    fn resolve_class_name(
        &self,
        name: &Name,
        scope: &RefScope,
        incomplete_code: bool,
    ) -> Result<Vec<ResolveResult>, Cancelled> {
        let found = self.class_name_in_scope(name, scope)?;
        if !found.is_empty() {
            return Ok(found);
        }

        if incomplete_code {
            let variables = self.variable_or_field_in_scope(name, scope);
            if !variables.is_empty() {
                return Ok(variables);
            }
            let package = self.resolve_package(&QualifiedName::from_segments(vec![name.clone()]));
            if !package.is_empty() {
                return Ok(package);
            }
        }

        Ok(Vec::new())
    }

    fn class_name_in_scope(
        &self,
        name: &Name,
        scope: &RefScope,
    ) -> Result<Vec<ResolveResult>, Cancelled> {
        // Method type parameters shadow everything above.
        if let Some(method) = &scope.enclosing_method {
            for tp in method.type_parameter_list() {
                if let quill_decl::TypeParameterView::Declared { name: tp_name, .. } = &tp {
                    if tp_name == name {
                        return Ok(vec![ResolveResult::accessible(ResolveTarget::Class(
                            ClassCandidate::TypeParameter {
                                owner: method.id(),
                                name: name.clone(),
                            },
                        ))]);
                    }
                }
            }
        }

        for class in &scope.enclosing_classes {
            self.cancel.check()?;

            if class.name().as_ref() == Some(name) {
                return Ok(vec![ResolveResult::accessible(ResolveTarget::Class(
                    ClassCandidate::Source(class.id()),
                ))]);
            }

            if class
                .type_parameters()
                .iter()
                .any(|(_, tp_name)| tp_name == name)
            {
                return Ok(vec![ResolveResult::accessible(ResolveTarget::Class(
                    ClassCandidate::TypeParameter {
                        owner: class.id(),
                        name: name.clone(),
                    },
                ))]);
            }

            if let Some(inner) = class.find_inner_class_by_name(name) {
                return Ok(vec![ResolveResult::accessible(ResolveTarget::Class(
                    match inner {
                        ClassItem::Declared(decl) => ClassCandidate::Source(decl.id()),
                        ClassItem::Synthetic(light) => ClassCandidate::Synthetic {
                            owner: class.id(),
                            name: light.name.clone(),
                        },
                    },
                ))]);
            }
        }

        let entries =
            self.decls
                .lookup(self.file, self.index, &self.cancel, name, EntryKind::Type)?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let accessible = self.target_accessible(&entry.target);
                ResolveResult {
                    target: entry.target,
                    accessible,
                    via_import: entry.origin,
                }
            })
            .collect())
    }

    /// Unqualified expression-position name: parameters, then enclosing
    /// class fields and methods, then static imports (single before
    /// on-demand), then the class-or-package algorithms.
    fn resolve_expression_name(
        &self,
        reference: &AstRef,
        scope: &RefScope,
        incomplete_code: bool,
    ) -> Result<Vec<ResolveResult>, Cancelled> {
        let name = &reference.name;

        let variables = self.variable_or_field_in_scope(name, scope);
        if !variables.is_empty() {
            return Ok(variables);
        }

        for class in &scope.enclosing_classes {
            let methods = class.find_methods_by_name(name);
            if !methods.is_empty() {
                return Ok(methods
                    .into_iter()
                    .map(|method| {
                        let id = match &method {
                            quill_decl::MethodItem::Declared(decl) => Some(decl.id()),
                            quill_decl::MethodItem::Synthetic(_) => None,
                        };
                        ResolveResult::accessible(ResolveTarget::Method(MethodCandidate {
                            owner: class.id(),
                            id,
                            name: name.clone(),
                        }))
                    })
                    .collect());
            }
        }

        let statics = self.decls.lookup(
            self.file,
            self.index,
            &self.cancel,
            name,
            EntryKind::StaticMember,
        )?;
        if !statics.is_empty() {
            return Ok(statics
                .into_iter()
                .map(|entry| ResolveResult::accessible(entry.target).with_import(entry.origin))
                .collect());
        }

        self.resolve_class_or_package(reference, scope, incomplete_code)
    }

    fn variable_or_field_in_scope(&self, name: &Name, scope: &RefScope) -> Vec<ResolveResult> {
        if let Some(method) = &scope.enclosing_method {
            for param in method.parameter_list() {
                if param.name() != name {
                    continue;
                }
                let id = match &param {
                    ParameterView::Declared { id, .. } => Some(*id),
                    ParameterView::Synthetic(_) => None,
                };
                return vec![ResolveResult::accessible(ResolveTarget::Parameter(
                    ParamCandidate {
                        method: method.id(),
                        id,
                        name: name.clone(),
                    },
                ))];
            }
        }

        for class in &scope.enclosing_classes {
            if let Some(field) = class.find_field_by_name(name) {
                let id = match &field {
                    FieldItem::Declared(decl) => Some(decl.id()),
                    FieldItem::Synthetic(_) => None,
                };
                return vec![ResolveResult::accessible(ResolveTarget::Field(
                    FieldCandidate {
                        owner: class.id(),
                        id,
                        name: name.clone(),
                    },
                ))];
            }
        }

        Vec::new()
    }

    /// Ambiguous class-or-package: the class algorithm runs first, but a
    /// resolved-yet-inaccessible (or absent) class yields to a package of
    /// the same name — accessibility trumps name-kind preference.
    fn resolve_class_or_package(
        &self,
        reference: &AstRef,
        scope: &RefScope,
        incomplete_code: bool,
    ) -> Result<Vec<ResolveResult>, Cancelled> {
        let classes = self.class_name_in_scope(&reference.name, scope)?;

        let retry_as_package =
            classes.is_empty() || (classes.len() == 1 && !classes[0].accessible);
        if retry_as_package {
            let package = self.resolve_package(&reference.dotted_name());
            if !package.is_empty() {
                return Ok(package);
            }
        }

        if classes.is_empty() && incomplete_code {
            let variables = self.variable_or_field_in_scope(&reference.name, scope);
            if !variables.is_empty() {
                return Ok(variables);
            }
        }

        Ok(classes)
    }

    /// Dotted class-or-package. Inside import statements package-name
    /// resolution runs first (single-type imports shadow same-named types of
    /// sibling files); everywhere else the class wins.
    fn resolve_fq_class_or_package(&self, reference: &AstRef) -> Vec<ResolveResult> {
        let dotted = reference.dotted_name();
        let package_first = matches!(
            reference.context,
            RefContext::ImportSingle | RefContext::ImportOnDemand
        );

        let package = || {
            let package = PackageName::from_dotted(&dotted.to_dotted());
            self.index
                .package_exists(&package)
                .then(|| vec![ResolveResult::accessible(ResolveTarget::Package(package))])
        };

        if package_first {
            if let Some(found) = package() {
                return found;
            }
        }

        let classes = self.resolve_fq_class(&dotted);
        if !classes.is_empty() {
            return classes;
        }

        if !package_first {
            if let Some(found) = package() {
                return found;
            }
        }

        // Neither; a partial package is still worth reporting.
        let prefix = PackageName::from_dotted(&dotted.to_dotted());
        if self.index.package_prefix_exists(&prefix) {
            return vec![ResolveResult::accessible(ResolveTarget::PackagePrefix(
                prefix,
            ))];
        }
        Vec::new()
    }

    /// `qualifier.new Inner()`: strictly a member lookup rooted at the
    /// qualifier's type — a same-named top-level class elsewhere must not
    /// win.
    fn resolve_qualified_new(
        &self,
        reference: &AstRef,
        scope: &RefScope,
    ) -> Result<Vec<ResolveResult>, Cancelled> {
        let Some(type_text) = &reference.qualifier_type_text else {
            return Ok(Vec::new());
        };
        let head = quill_syntax::AstTypeRef::new(type_text.clone()).head();

        // Resolve the qualifier's type: fully-qualified first, then as a
        // simple name in scope.
        let mut owner = self.resolve_fq_class(&head);
        if owner.is_empty() {
            if let Some(simple) = head.last() {
                if head.is_simple() {
                    owner = self.class_name_in_scope(simple, scope)?;
                }
            }
        }
        let Some(owner) = owner.first() else {
            return Ok(Vec::new());
        };

        match &owner.target {
            ResolveTarget::Class(ClassCandidate::Source(id)) => {
                let Some(class) = self.find_source_class(*id) else {
                    return Ok(Vec::new());
                };
                Ok(match class.find_inner_class_by_name(&reference.name) {
                    Some(ClassItem::Declared(decl)) => {
                        vec![ResolveResult::accessible(ResolveTarget::Class(
                            ClassCandidate::Source(decl.id()),
                        ))]
                    }
                    Some(ClassItem::Synthetic(light)) => {
                        vec![ResolveResult::accessible(ResolveTarget::Class(
                            ClassCandidate::Synthetic {
                                owner: class.id(),
                                name: light.name.clone(),
                            },
                        ))]
                    }
                    None => Vec::new(),
                })
            }
            ResolveTarget::Class(ClassCandidate::External(ty)) => {
                for member in self.index.member_types_of(ty) {
                    self.cancel.check()?;
                    if member.simple_name() == reference.name {
                        let accessible = self.external_accessible(&member);
                        return Ok(vec![ResolveResult {
                            target: ResolveTarget::Class(ClassCandidate::External(member)),
                            accessible,
                            via_import: None,
                        }]);
                    }
                }
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Reconstruct the reference's canonical dotted text by resolving the
    /// chain, qualifier first: if the target lives in a different package
    /// than the written text suggests, the output reflects the target.
    pub fn canonical_text(
        &self,
        reference: &AstRef,
        scope: &RefScope,
    ) -> Result<String, Cancelled> {
        let results = self.resolve(reference, scope, false)?;
        if results.len() == 1 {
            match &results[0].target {
                ResolveTarget::Class(ClassCandidate::Source(id)) => {
                    if let Some(fqn) = self.source_class_fqn(*id) {
                        return Ok(fqn);
                    }
                }
                ResolveTarget::Class(ClassCandidate::External(ty)) => {
                    return Ok(ty.as_str().replace('$', "."));
                }
                ResolveTarget::Class(ClassCandidate::Synthetic { owner, name }) => {
                    if let Some(fqn) = self.source_class_fqn(*owner) {
                        return Ok(format!("{fqn}.{name}"));
                    }
                }
                ResolveTarget::Class(ClassCandidate::TypeParameter { name, .. }) => {
                    return Ok(name.to_string());
                }
                ResolveTarget::Package(package) | ResolveTarget::PackagePrefix(package) => {
                    return Ok(package.to_dotted());
                }
                ResolveTarget::StaticMember(member) => {
                    return Ok(member.as_str().replace("::", "."));
                }
                ResolveTarget::Module(module) => return Ok(module.to_dotted()),
                ResolveTarget::Field(_)
                | ResolveTarget::Parameter(_)
                | ResolveTarget::Method(_) => {}
            }
        }

        // Unresolved (or value-namespace) chains reconstruct recursively,
        // qualifier first.
        match &reference.qualifier {
            Some(qualifier) => Ok(format!(
                "{}.{}",
                self.canonical_text(qualifier, scope)?,
                reference.name
            )),
            None => Ok(reference.name.to_string()),
        }
    }

    // Helpers.

    fn our_package(&self) -> PackageName {
        self.file.package().unwrap_or_else(PackageName::unnamed)
    }

    fn target_accessible(&self, target: &ResolveTarget) -> bool {
        match target {
            ResolveTarget::Class(ClassCandidate::External(ty)) => self.external_accessible(ty),
            // Same-file and import-enumerated source targets are visible.
            _ => true,
        }
    }

    fn external_accessible(&self, ty: &TypeName) -> bool {
        let modifiers = self.index.type_modifiers(ty);
        if modifiers.contains(Modifier::Private) {
            return false;
        }
        if modifiers.contains(Modifier::Public) {
            return true;
        }
        external_type_package(ty) == self.our_package()
    }

    fn find_source_class_by_dotted(&self, dotted: &QualifiedName) -> Option<ClassDecl> {
        let package = self.our_package();
        let segments = dotted.segments();
        let package_segments = package.segments();
        if segments.len() <= package_segments.len() {
            return None;
        }
        if &segments[..package_segments.len()] != package_segments {
            return None;
        }

        let mut rest = segments[package_segments.len()..].iter();
        let top_name = rest.next()?;
        let mut current = self.file.find_class(top_name)?;
        for segment in rest {
            match current.find_inner_class_by_name(segment) {
                Some(ClassItem::Declared(decl)) => current = decl,
                _ => return None,
            }
        }
        Some(current)
    }

    fn find_source_class(&self, id: DeclId) -> Option<ClassDecl> {
        fn search(classes: &[ClassDecl], id: DeclId) -> Option<ClassDecl> {
            for class in classes {
                if class.id() == id {
                    return Some(class.clone());
                }
                let nested: Vec<ClassDecl> = class
                    .inner_classes()
                    .into_iter()
                    .filter_map(|item| match item {
                        ClassItem::Declared(decl) => Some(decl),
                        ClassItem::Synthetic(_) => None,
                    })
                    .collect();
                if let Some(found) = search(&nested, id) {
                    return Some(found);
                }
            }
            None
        }
        search(self.file.classes(), id)
    }

    fn source_class_fqn(&self, id: DeclId) -> Option<String> {
        fn search(classes: &[ClassDecl], id: DeclId, prefix: &str) -> Option<String> {
            for class in classes {
                let Some(name) = class.name() else { continue };
                let qualified = if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{prefix}.{name}")
                };
                if class.id() == id {
                    return Some(qualified);
                }
                let nested: Vec<ClassDecl> = class
                    .inner_classes()
                    .into_iter()
                    .filter_map(|item| match item {
                        ClassItem::Declared(decl) => Some(decl),
                        ClassItem::Synthetic(_) => None,
                    })
                    .collect();
                if let Some(found) = search(&nested, id, &qualified) {
                    return Some(found);
                }
            }
            None
        }

        let package = self.our_package();
        let prefix = if package.is_unnamed() {
            String::new()
        } else {
            package.to_dotted()
        };
        search(self.file.classes(), id, &prefix)
    }
}

fn external_type_package(ty: &TypeName) -> PackageName {
    match ty.as_str().rsplit_once('.') {
        Some((package, _)) => PackageName::from_dotted(package),
        None => PackageName::unnamed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use pretty_assertions::assert_eq;
    use quill_core::{FileId, ModifierMask};
    use quill_decl::{AugmentRegistry, DeclFile};
    use quill_syntax::{AstClass, AstFile, AstImport, ClassKind, RefContext, RefId};

    use crate::file_index::{FileDeclarationIndex, FileIndexConfig};
    use crate::index::StaticMemberId;
    use crate::modules::{ModuleDef, ModuleExport};

    #[derive(Default)]
    struct TestIndex {
        types: HashMap<String, TypeName>,
        package_types: HashMap<String, Vec<TypeName>>,
        packages: HashSet<String>,
        statics: HashMap<String, Vec<StaticMemberId>>,
        member_types: HashMap<String, Vec<TypeName>>,
        modifiers: HashMap<String, ModifierMask>,
        modules: HashMap<String, ModuleDef>,
    }

    impl TestIndex {
        fn add_type(&mut self, package: &str, name: &str) -> TypeName {
            let fq = if package.is_empty() {
                name.to_string()
            } else {
                format!("{package}.{name}")
            };
            let ty = TypeName::new(fq.clone());
            self.types.insert(fq, ty.clone());
            self.packages.insert(package.to_string());
            self.package_types
                .entry(package.to_string())
                .or_default()
                .push(ty.clone());
            ty
        }

        fn add_package(&mut self, package: &str) {
            self.packages.insert(package.to_string());
        }

        fn set_modifiers(&mut self, ty: &TypeName, modifiers: ModifierMask) {
            self.modifiers.insert(ty.as_str().to_string(), modifiers);
        }

        fn add_static(&mut self, owner: &str, name: &str) -> StaticMemberId {
            let id = StaticMemberId::new(format!("{owner}::{name}"));
            self.statics
                .entry(owner.to_string())
                .or_default()
                .push(id.clone());
            id
        }

        fn add_member_type(&mut self, owner: &str, name: &str) -> TypeName {
            let ty = TypeName::new(format!("{owner}${name}"));
            self.types.insert(ty.as_str().to_string(), ty.clone());
            self.member_types
                .entry(owner.to_string())
                .or_default()
                .push(ty.clone());
            ty
        }

        fn add_module(&mut self, module: ModuleDef) {
            self.modules.insert(module.name.to_dotted(), module);
        }
    }

    impl GlobalIndex for TestIndex {
        fn resolve_type(&self, name: &QualifiedName) -> Option<TypeName> {
            self.types.get(&name.to_dotted()).cloned()
        }

        fn resolve_type_in_package(&self, package: &PackageName, name: &Name) -> Option<TypeName> {
            self.package_types
                .get(&package.to_dotted())
                .and_then(|types| {
                    types
                        .iter()
                        .find(|ty| ty.simple_name() == *name)
                        .cloned()
                })
        }

        fn types_in_package(&self, package: &PackageName) -> Vec<TypeName> {
            self.package_types
                .get(&package.to_dotted())
                .cloned()
                .unwrap_or_default()
        }

        fn package_exists(&self, package: &PackageName) -> bool {
            self.packages.contains(&package.to_dotted())
        }

        fn package_prefix_exists(&self, prefix: &PackageName) -> bool {
            let dotted = prefix.to_dotted();
            if dotted.is_empty() {
                return false;
            }
            let with_dot = format!("{dotted}.");
            self.packages.iter().any(|p| p.starts_with(&with_dot))
        }

        fn resolve_static_member(&self, owner: &TypeName, name: &Name) -> Option<StaticMemberId> {
            self.statics.get(owner.as_str()).and_then(|members| {
                members
                    .iter()
                    .find(|member| member.member_name().as_ref() == Some(name))
                    .cloned()
            })
        }

        fn static_members_of(&self, owner: &TypeName) -> Vec<StaticMemberId> {
            self.statics.get(owner.as_str()).cloned().unwrap_or_default()
        }

        fn member_types_of(&self, owner: &TypeName) -> Vec<TypeName> {
            self.member_types
                .get(owner.as_str())
                .cloned()
                .unwrap_or_default()
        }

        fn type_modifiers(&self, ty: &TypeName) -> ModifierMask {
            self.modifiers
                .get(ty.as_str())
                .copied()
                .unwrap_or_else(|| ModifierMask::of(&[Modifier::Public]))
        }

        fn module(&self, name: &QualifiedName) -> Option<ModuleDef> {
            self.modules.get(&name.to_dotted()).cloned()
        }
    }

    struct Fixture {
        index: TestIndex,
        file: DeclFile,
        decls: FileDeclarationIndex,
        cache: ResolveCache,
        epoch: Arc<EpochSource>,
    }

    impl Fixture {
        fn new(ast: AstFile, index: TestIndex) -> Self {
            let epoch = EpochSource::new();
            let file = DeclFile::from_ast(
                Arc::new(ast),
                epoch.clone(),
                Arc::new(AugmentRegistry::new()),
            );
            let decls = FileDeclarationIndex::new(epoch.clone(), FileIndexConfig::default());
            let cache = ResolveCache::new(epoch.clone());
            Self {
                index,
                file,
                decls,
                cache,
                epoch,
            }
        }

        fn engine(&self) -> Engine<'_> {
            Engine::new(&self.index, &self.file, &self.decls, &self.cache)
        }
    }

    fn reference(idx: u32, name: &str, context: RefContext) -> AstRef {
        AstRef::new(RefId::new(FileId::from_raw(1), idx), name, context)
    }

    #[test]
    fn explicit_import_shadows_wildcard_package() {
        let mut index = TestIndex::default();
        let from_q = index.add_type("q", "Foo");
        index.add_type("r", "Foo");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.imports
            .push(AstImport::single(QualifiedName::from_dotted("q.Foo")));
        ast.imports
            .push(AstImport::on_demand(QualifiedName::from_dotted("r")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();
        let single_import_id = fixture.file.imports()[0].id;

        let results = engine
            .resolve(
                &reference(0, "Foo", RefContext::TypeUse),
                &RefScope::file_level(),
                false,
            )
            .unwrap();

        assert_eq!(
            results,
            vec![ResolveResult {
                target: ResolveTarget::Class(ClassCandidate::External(from_q)),
                accessible: true,
                via_import: Some(single_import_id),
            }]
        );
    }

    #[test]
    fn same_package_type_beats_star_import() {
        let mut index = TestIndex::default();
        let own = index.add_type("p", "Foo");
        index.add_type("q", "Foo");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.package = Some(PackageName::from_dotted("p"));
        ast.imports
            .push(AstImport::on_demand(QualifiedName::from_dotted("q")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();

        let results = engine
            .resolve(
                &reference(0, "Foo", RefContext::TypeUse),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].target,
            ResolveTarget::Class(ClassCandidate::External(own))
        );
    }

    #[test]
    fn ambiguous_star_imports_return_all_candidates() {
        let mut index = TestIndex::default();
        let foo_a = index.add_type("a", "Foo");
        let foo_b = index.add_type("b", "Foo");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.imports
            .push(AstImport::on_demand(QualifiedName::from_dotted("a")));
        ast.imports
            .push(AstImport::on_demand(QualifiedName::from_dotted("b")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();

        let results = engine
            .resolve(
                &reference(0, "Foo", RefContext::TypeUse),
                &RefScope::file_level(),
                false,
            )
            .unwrap();

        let targets: Vec<_> = results.iter().map(|r| r.target.clone()).collect();
        assert_eq!(
            targets,
            vec![
                ResolveTarget::Class(ClassCandidate::External(foo_a)),
                ResolveTarget::Class(ClassCandidate::External(foo_b)),
            ]
        );
    }

    #[test]
    fn explicit_static_import_shadows_static_wildcard() {
        let mut index = TestIndex::default();
        index.add_type("p", "Util");
        index.add_static("p.Util", "helper");
        index.add_type("q", "Other");
        let explicit = index.add_static("q.Other", "helper");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.imports
            .push(AstImport::static_on_demand(QualifiedName::from_dotted(
                "p.Util",
            )));
        ast.imports
            .push(AstImport::static_single(QualifiedName::from_dotted(
                "q.Other.helper",
            )));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();
        let single_import_id = fixture.file.imports()[1].id;

        let results = engine
            .resolve(
                &reference(0, "helper", RefContext::ExpressionName),
                &RefScope::file_level(),
                false,
            )
            .unwrap();

        assert_eq!(
            results,
            vec![ResolveResult {
                target: ResolveTarget::StaticMember(explicit),
                accessible: true,
                via_import: Some(single_import_id),
            }]
        );
    }

    #[test]
    fn package_names_fall_back_to_partial_package_results() {
        let mut index = TestIndex::default();
        index.add_package("java.util");

        let fixture = Fixture::new(AstFile::new(FileId::from_raw(1)), index);
        let engine = fixture.engine();

        let exact = engine
            .resolve(
                &reference(0, "util", RefContext::PackageStatement)
                    .with_qualifier(reference(1, "java", RefContext::PackageStatement)),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(
            exact[0].target,
            ResolveTarget::Package(PackageName::from_dotted("java.util"))
        );

        let partial = engine
            .resolve(
                &reference(2, "java", RefContext::PackageStatement),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(
            partial[0].target,
            ResolveTarget::PackagePrefix(PackageName::from_dotted("java"))
        );

        let missing = engine
            .resolve(
                &reference(3, "nosuch", RefContext::PackageStatement),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(missing, Vec::new());
    }

    #[test]
    fn inaccessible_class_yields_to_same_named_package() {
        let mut index = TestIndex::default();
        // `s.store` is package-private in a foreign package.
        let hidden = index.add_type("s", "store");
        index.set_modifiers(&hidden, ModifierMask::empty());
        index.add_package("store");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.package = Some(PackageName::from_dotted("p"));
        ast.imports
            .push(AstImport::on_demand(QualifiedName::from_dotted("s")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();

        let results = engine
            .resolve(
                &reference(0, "store", RefContext::ExtendsList),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(
            results,
            vec![ResolveResult::accessible(ResolveTarget::Package(
                PackageName::from_dotted("store")
            ))],
            "accessibility trumps name-kind preference"
        );
    }

    fn fallback_fixture() -> Fixture {
        let mut index = TestIndex::default();
        index.add_package("data");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.package = Some(PackageName::from_dotted("p"));
        let mut class = AstClass::new("C", ClassKind::Class);
        class
            .fields
            .push(quill_syntax::AstField::new("data", quill_syntax::AstTypeRef::new("int")));
        ast.classes.push(class);

        Fixture::new(ast, index)
    }

    #[test]
    fn incomplete_code_fallback_tries_variables_before_packages() {
        let fixture = fallback_fixture();
        let engine = fixture.engine();
        let class = fixture.file.classes()[0].clone();
        let scope = RefScope::in_class(class.clone());

        // `data` is simultaneously a field of the enclosing class and an
        // existing package; the pinned fallback order is class-name →
        // variable/field → package-name.
        let strict = engine
            .resolve(&reference(0, "data", RefContext::NewExpression), &scope, false)
            .unwrap();
        assert_eq!(strict, Vec::new());

        let relaxed = engine
            .resolve(&reference(0, "data", RefContext::NewExpression), &scope, true)
            .unwrap();
        assert_eq!(relaxed.len(), 1);
        match &relaxed[0].target {
            ResolveTarget::Field(field) => {
                assert_eq!(field.owner, class.id());
                assert_eq!(field.name, Name::from("data"));
            }
            other => panic!("expected the field to win the fallback, got {other:?}"),
        }

        // With no matching variable or field anywhere, the package ends the
        // chain.
        let package_only = engine
            .resolve(&reference(1, "data", RefContext::NewExpression), &RefScope::file_level(), true)
            .unwrap();
        assert_eq!(
            package_only[0].target,
            ResolveTarget::Package(PackageName::from_dotted("data"))
        );
    }

    #[test]
    fn strict_and_incomplete_results_never_share_cache_entries() {
        let fixture = fallback_fixture();
        let engine = fixture.engine();
        let scope = RefScope::in_class(fixture.file.classes()[0].clone());
        let r = reference(0, "data", RefContext::NewExpression);

        assert_eq!(engine.resolve(&r, &scope, false).unwrap(), Vec::new());
        assert_eq!(engine.resolve(&r, &scope, true).unwrap().len(), 1);
        // The relaxed hit must not leak into the strict entry.
        assert_eq!(engine.resolve(&r, &scope, false).unwrap(), Vec::new());
    }

    #[test]
    fn qualified_new_searches_the_qualifier_type_not_lexical_scope() {
        let mut index = TestIndex::default();
        // A same-named top-level class elsewhere must not win.
        index.add_type("elsewhere", "Inner");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.package = Some(PackageName::from_dotted("p"));
        let mut outer = AstClass::new("Outer", ClassKind::Class);
        outer.classes.push(AstClass::new("Inner", ClassKind::Class));
        ast.classes.push(outer);
        ast.imports
            .push(AstImport::on_demand(QualifiedName::from_dotted("elsewhere")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();
        let outer = fixture.file.classes()[0].clone();
        let inner_id = match outer.find_inner_class_by_name(&Name::from("Inner")).unwrap() {
            quill_decl::ClassItem::Declared(decl) => decl.id(),
            other => panic!("expected declared inner class, got {other:?}"),
        };

        let mut r = reference(0, "Inner", RefContext::QualifiedNew);
        r.qualifier_type_text = Some("Outer".to_string());

        assert_eq!(engine.classify(&r), ResolutionKind::ClassInQualifiedNew);
        let results = engine.resolve(&r, &RefScope::file_level(), false).unwrap();
        assert_eq!(
            results,
            vec![ResolveResult::accessible(ResolveTarget::Class(
                ClassCandidate::Source(inner_id)
            ))]
        );
    }

    #[test]
    fn external_qualifier_types_search_their_member_types() {
        let mut index = TestIndex::default();
        index.add_type("java.util", "Map");
        let entry = index.add_member_type("java.util.Map", "Entry");

        let fixture = Fixture::new(AstFile::new(FileId::from_raw(1)), index);
        let engine = fixture.engine();

        let mut r = reference(0, "Entry", RefContext::QualifiedNew);
        r.qualifier_type_text = Some("java.util.Map".to_string());

        let results = engine.resolve(&r, &RefScope::file_level(), false).unwrap();
        assert_eq!(
            results[0].target,
            ResolveTarget::Class(ClassCandidate::External(entry))
        );
    }

    #[test]
    fn module_imports_bring_exported_packages_on_demand() {
        let mut index = TestIndex::default();
        let widget = index.add_type("lib.api", "Widget");
        index.add_type("lib.internal", "Secret");
        index.add_module(ModuleDef {
            name: QualifiedName::from_dotted("lib.core"),
            requires: Vec::new(),
            exports: vec![ModuleExport {
                package: PackageName::from_dotted("lib.api"),
                to: Vec::new(),
            }],
        });

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.imports
            .push(AstImport::module(QualifiedName::from_dotted("lib.core")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();

        let results = engine
            .resolve(
                &reference(0, "Widget", RefContext::TypeUse),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(
            results[0].target,
            ResolveTarget::Class(ClassCandidate::External(widget))
        );

        // Non-exported packages stay invisible.
        let hidden = engine
            .resolve(
                &reference(1, "Secret", RefContext::TypeUse),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(hidden, Vec::new());

        // The module reference itself resolves through the module registry.
        let module_ref = engine
            .resolve(
                &reference(2, "core", RefContext::ModuleStatement)
                    .with_qualifier(reference(3, "lib", RefContext::ModuleStatement)),
                &RefScope::file_level(),
                false,
            )
            .unwrap();
        assert_eq!(
            module_ref[0].target,
            ResolveTarget::Module(QualifiedName::from_dotted("lib.core"))
        );
    }

    #[test]
    fn cancelled_on_demand_walks_abort_without_poisoning_caches() {
        let mut index = TestIndex::default();
        let foo = index.add_type("a", "Foo");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.imports
            .push(AstImport::on_demand(QualifiedName::from_dotted("a")));

        let fixture = Fixture::new(ast, index);

        let cancel = CancelToken::new();
        cancel.cancel();
        let cancelled_engine = fixture.engine().with_cancel_token(cancel);
        let r = reference(0, "Foo", RefContext::TypeUse);
        assert_eq!(
            cancelled_engine.resolve(&r, &RefScope::file_level(), false),
            Err(Cancelled)
        );

        // A fresh engine without the cancelled token succeeds: the aborted
        // walk committed nothing.
        let engine = fixture.engine();
        let results = engine.resolve(&r, &RefScope::file_level(), false).unwrap();
        assert_eq!(
            results[0].target,
            ResolveTarget::Class(ClassCandidate::External(foo))
        );
    }

    #[test]
    fn canonical_text_follows_the_resolved_target() {
        let mut index = TestIndex::default();
        index.add_type("java.util", "Map");
        index.types.insert(
            "java.util.Map$Entry".to_string(),
            TypeName::new("java.util.Map$Entry"),
        );
        index.add_type("r", "Foo");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.package = Some(PackageName::from_dotted("p"));
        ast.imports
            .push(AstImport::single(QualifiedName::from_dotted("r.Foo")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();

        // A nested binary name renders dotted.
        let entry_ref = reference(0, "Entry", RefContext::TypeUse).with_qualifier(
            reference(1, "Map", RefContext::ExpressionName).with_qualifier(
                reference(2, "util", RefContext::ExpressionName)
                    .with_qualifier(reference(3, "java", RefContext::ExpressionName)),
            ),
        );
        assert_eq!(
            engine
                .canonical_text(&entry_ref, &RefScope::file_level())
                .unwrap(),
            "java.util.Map.Entry"
        );

        // The canonical text of an imported simple name reflects the
        // target's actual package.
        let foo_ref = reference(4, "Foo", RefContext::ExtendsList);
        assert_eq!(
            engine
                .canonical_text(&foo_ref, &RefScope::file_level())
                .unwrap(),
            "r.Foo"
        );
    }

    #[test]
    fn results_recompute_after_the_epoch_advances() {
        let mut index = TestIndex::default();
        index.add_type("q", "Foo");

        let mut ast = AstFile::new(FileId::from_raw(1));
        ast.imports
            .push(AstImport::single(QualifiedName::from_dotted("q.Foo")));

        let fixture = Fixture::new(ast, index);
        let engine = fixture.engine();
        let r = reference(0, "Foo", RefContext::TypeUse);

        let first = engine.resolve(&r, &RefScope::file_level(), false).unwrap();
        assert_eq!(first.len(), 1);

        fixture.epoch.bump();
        let second = engine.resolve(&r, &RefScope::file_level(), false).unwrap();
        assert_eq!(first, second, "identical inputs give value-equal results");
    }
}
