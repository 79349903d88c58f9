//! Per-file declaration index.
//!
//! Two structures with very different costs, cached separately:
//!
//! - the **enumerated map**: own top-level classes, single type imports, and
//!   single static imports (including implicitly-provided ones), answerable
//!   in O(1) by simple name; cheap to keep warm.
//! - the **on-demand scopes**: everything reachable through wildcards — star
//!   imports, static star imports, module imports, the file's own package,
//!   and the implicitly-imported packages. Building these walks member lists
//!   of each target and checks the cancellation token as it goes; the cache
//!   entry is populated atomically at the end or not at all.
//!
//! Enumerated declarations always shadow on-demand candidates of the same
//! name and kind; the on-demand builder actively skips them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quill_core::{CancelToken, Cancelled, DeclId, EpochSource, Name, PackageName, QualifiedName};
use quill_decl::DeclFile;

use crate::index::{resolve_type_with_nesting, GlobalIndex};
use crate::result::{ClassCandidate, ResolveTarget};

/// What namespace an entry occupies; shadowing is per name *and* kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Type,
    StaticMember,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedEntry {
    pub name: Name,
    pub kind: EntryKind,
    pub target: ResolveTarget,
    /// The import declaration the entry came through; `None` for own
    /// classes and implicitly-provided imports.
    pub origin: Option<DeclId>,
}

/// Language-level implicit surroundings of every file.
#[derive(Debug, Clone)]
pub struct FileIndexConfig {
    /// Packages whose members are always available on demand.
    pub implicit_packages: Vec<PackageName>,
    /// Static imports provided by the language (e.g. a simple-source-file
    /// mechanism), merged into the enumerated map like explicit ones.
    pub implicit_static_imports: Vec<QualifiedName>,
}

impl Default for FileIndexConfig {
    fn default() -> Self {
        Self {
            implicit_packages: vec![PackageName::from_dotted("java.lang")],
            implicit_static_imports: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct EnumeratedMap {
    by_name: HashMap<Name, Vec<EnumeratedEntry>>,
}

impl EnumeratedMap {
    fn push(&mut self, entry: EnumeratedEntry) {
        let bucket = self.by_name.entry(entry.name.clone()).or_default();
        if !bucket
            .iter()
            .any(|existing| existing.kind == entry.kind && existing.target == entry.target)
        {
            bucket.push(entry);
        }
    }

    fn contains(&self, name: &Name, kind: EntryKind) -> bool {
        self.by_name
            .get(name)
            .is_some_and(|bucket| bucket.iter().any(|entry| entry.kind == kind))
    }

    fn matches(&self, name: &Name, kind: EntryKind) -> Vec<EnumeratedEntry> {
        self.by_name
            .get(name)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|entry| entry.kind == kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// On-demand candidates in two precedence tiers: the file's own package
/// shadows wildcard-imported names; within the wildcard tier all matches are
/// reported (ambiguity is the caller's to see).
#[derive(Debug, Default)]
struct OnDemandScopes {
    package_tier: EnumeratedMap,
    import_tier: EnumeratedMap,
}

pub struct FileDeclarationIndex {
    epoch: Arc<EpochSource>,
    config: FileIndexConfig,
    enumerated: Mutex<Option<(u64, Arc<EnumeratedMap>)>>,
    on_demand: Mutex<Option<(u64, Arc<OnDemandScopes>)>>,
}

impl FileDeclarationIndex {
    #[must_use]
    pub fn new(epoch: Arc<EpochSource>, config: FileIndexConfig) -> Self {
        Self {
            epoch,
            config,
            enumerated: Mutex::new(None),
            on_demand: Mutex::new(None),
        }
    }

    /// Look up explicit and on-demand candidates for `name` in `kind`'s
    /// namespace. Enumerated matches win outright; on-demand matches are
    /// consulted only when nothing explicit matched, own package before
    /// wildcard scopes.
    pub fn lookup(
        &self,
        file: &DeclFile,
        index: &dyn GlobalIndex,
        cancel: &CancelToken,
        name: &Name,
        kind: EntryKind,
    ) -> Result<Vec<EnumeratedEntry>, Cancelled> {
        let enumerated = self.enumerated(file, index);
        let explicit = enumerated.matches(name, kind);
        if !explicit.is_empty() {
            return Ok(explicit);
        }

        let on_demand = self.on_demand(file, index, cancel)?;
        let from_package = on_demand.package_tier.matches(name, kind);
        if !from_package.is_empty() {
            return Ok(from_package);
        }
        Ok(on_demand.import_tier.matches(name, kind))
    }

    /// Explicit candidates only (the cheap map).
    pub fn lookup_enumerated(
        &self,
        file: &DeclFile,
        index: &dyn GlobalIndex,
        name: &Name,
        kind: EntryKind,
    ) -> Vec<EnumeratedEntry> {
        self.enumerated(file, index).matches(name, kind)
    }

    fn enumerated(&self, file: &DeclFile, index: &dyn GlobalIndex) -> Arc<EnumeratedMap> {
        let epoch = self.epoch.current();
        {
            let guard = self.enumerated.lock().unwrap();
            if let Some((at, map)) = &*guard {
                if *at == epoch {
                    return map.clone();
                }
            }
        }
        let map = Arc::new(self.build_enumerated(file, index));
        let mut guard = self.enumerated.lock().unwrap();
        match &*guard {
            Some((at, map)) if *at == epoch => map.clone(),
            _ => {
                *guard = Some((epoch, map.clone()));
                map
            }
        }
    }

    fn on_demand(
        &self,
        file: &DeclFile,
        index: &dyn GlobalIndex,
        cancel: &CancelToken,
    ) -> Result<Arc<OnDemandScopes>, Cancelled> {
        let epoch = self.epoch.current();
        {
            let guard = self.on_demand.lock().unwrap();
            if let Some((at, scopes)) = &*guard {
                if *at == epoch {
                    return Ok(scopes.clone());
                }
            }
        }
        let enumerated = self.enumerated(file, index);
        let scopes = Arc::new(self.build_on_demand(file, index, cancel, &enumerated)?);
        let mut guard = self.on_demand.lock().unwrap();
        match &*guard {
            Some((at, scopes)) if *at == epoch => Ok(scopes.clone()),
            _ => {
                *guard = Some((epoch, scopes.clone()));
                Ok(scopes)
            }
        }
    }

    fn build_enumerated(&self, file: &DeclFile, index: &dyn GlobalIndex) -> EnumeratedMap {
        let mut map = EnumeratedMap::default();

        for class in file.classes() {
            let Some(name) = class.name() else { continue };
            map.push(EnumeratedEntry {
                name,
                kind: EntryKind::Type,
                target: ResolveTarget::Class(ClassCandidate::Source(class.id())),
                origin: None,
            });
        }

        for import in file.imports() {
            if import.on_demand || import.is_module {
                continue;
            }
            if import.is_static {
                self.push_static_single(&mut map, index, &import.path, Some(import.id));
            } else {
                let Some(simple) = import.path.last().cloned() else {
                    continue;
                };
                let Some(ty) = resolve_type_with_nesting(index, &import.path) else {
                    continue;
                };
                map.push(EnumeratedEntry {
                    name: simple,
                    kind: EntryKind::Type,
                    target: ResolveTarget::Class(ClassCandidate::External(ty)),
                    origin: Some(import.id),
                });
            }
        }

        for path in &self.config.implicit_static_imports {
            self.push_static_single(&mut map, index, path, None);
        }

        map
    }

    fn push_static_single(
        &self,
        map: &mut EnumeratedMap,
        index: &dyn GlobalIndex,
        path: &QualifiedName,
        origin: Option<DeclId>,
    ) {
        let segments = path.segments();
        let Some((member, owner_segments)) = segments.split_last() else {
            return;
        };
        if owner_segments.is_empty() {
            return;
        }
        let owner = QualifiedName::from_segments(owner_segments.to_vec());
        let Some(owner_ty) = resolve_type_with_nesting(index, &owner) else {
            return;
        };
        let Some(static_member) = index.resolve_static_member(&owner_ty, member) else {
            return;
        };
        map.push(EnumeratedEntry {
            name: member.clone(),
            kind: EntryKind::StaticMember,
            target: ResolveTarget::StaticMember(static_member),
            origin,
        });
    }

    fn build_on_demand(
        &self,
        file: &DeclFile,
        index: &dyn GlobalIndex,
        cancel: &CancelToken,
        enumerated: &EnumeratedMap,
    ) -> Result<OnDemandScopes, Cancelled> {
        tracing::debug!(file = ?file.file(), "building on-demand import scopes");
        let mut scopes = OnDemandScopes::default();
        let own_module = file.module().map(|module| module.name);

        // The file's own package.
        let own_package = file.package().unwrap_or_else(PackageName::unnamed);
        cancel.check()?;
        for ty in index.types_in_package(&own_package) {
            let name = ty.simple_name();
            if enumerated.contains(&name, EntryKind::Type) {
                continue;
            }
            scopes.package_tier.push(EnumeratedEntry {
                name,
                kind: EntryKind::Type,
                target: ResolveTarget::Class(ClassCandidate::External(ty)),
                origin: None,
            });
        }

        for import in file.imports() {
            if !import.on_demand && !import.is_module {
                continue;
            }
            cancel.check()?;

            if import.is_module {
                let Some(module) = index.module(&import.path) else {
                    continue;
                };
                for package in module.exported_packages_for(own_module.as_ref()) {
                    cancel.check()?;
                    for ty in index.types_in_package(&package) {
                        let name = ty.simple_name();
                        if enumerated.contains(&name, EntryKind::Type) {
                            continue;
                        }
                        scopes.import_tier.push(EnumeratedEntry {
                            name,
                            kind: EntryKind::Type,
                            target: ResolveTarget::Class(ClassCandidate::External(ty)),
                            origin: Some(import.id),
                        });
                    }
                }
            } else if import.is_static {
                // Static star imports never shadow explicitly enumerated
                // members of the same name and kind.
                let Some(owner_ty) = resolve_type_with_nesting(index, &import.path) else {
                    continue;
                };
                for static_member in index.static_members_of(&owner_ty) {
                    let Some(name) = static_member.member_name() else {
                        continue;
                    };
                    if enumerated.contains(&name, EntryKind::StaticMember) {
                        continue;
                    }
                    scopes.import_tier.push(EnumeratedEntry {
                        name,
                        kind: EntryKind::StaticMember,
                        target: ResolveTarget::StaticMember(static_member),
                        origin: Some(import.id),
                    });
                }
            } else {
                // `import X.*;` — X is a package or a type whose member
                // types are imported.
                let package = PackageName::from_dotted(&import.path.to_dotted());
                let types = if index.package_exists(&package) {
                    index.types_in_package(&package)
                } else if let Some(owner) = resolve_type_with_nesting(index, &import.path) {
                    index.member_types_of(&owner)
                } else {
                    continue;
                };
                for ty in types {
                    let name = ty.simple_name();
                    if enumerated.contains(&name, EntryKind::Type) {
                        continue;
                    }
                    scopes.import_tier.push(EnumeratedEntry {
                        name,
                        kind: EntryKind::Type,
                        target: ResolveTarget::Class(ClassCandidate::External(ty)),
                        origin: Some(import.id),
                    });
                }
            }
        }

        // Implicitly-imported packages, after everything explicit.
        for package in &self.config.implicit_packages {
            cancel.check()?;
            for ty in index.types_in_package(package) {
                let name = ty.simple_name();
                if enumerated.contains(&name, EntryKind::Type) {
                    continue;
                }
                scopes.import_tier.push(EnumeratedEntry {
                    name,
                    kind: EntryKind::Type,
                    target: ResolveTarget::Class(ClassCandidate::External(ty)),
                    origin: None,
                });
            }
        }

        Ok(scopes)
    }
}
