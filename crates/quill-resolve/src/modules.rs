//! Module export model.
//!
//! Reduced to what name resolution consumes: which packages a module exports,
//! and to whom.

use quill_core::{PackageName, QualifiedName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDef {
    pub name: QualifiedName,
    pub requires: Vec<QualifiedName>,
    pub exports: Vec<ModuleExport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleExport {
    pub package: PackageName,
    /// Empty means exported unconditionally.
    pub to: Vec<QualifiedName>,
}

impl ModuleDef {
    /// Whether `package` is visible to `reader` (a module name, or `None`
    /// for code outside any module, which only sees unqualified exports).
    #[must_use]
    pub fn exports_package_to(&self, package: &PackageName, reader: Option<&QualifiedName>) -> bool {
        if reader == Some(&self.name) {
            return true;
        }
        self.exports.iter().any(|export| {
            &export.package == package
                && (export.to.is_empty()
                    || reader.is_some_and(|module| export.to.iter().any(|to| to == module)))
        })
    }

    /// Packages visible to `reader`, in declaration order.
    pub fn exported_packages_for(&self, reader: Option<&QualifiedName>) -> Vec<PackageName> {
        self.exports
            .iter()
            .filter(|export| {
                export.to.is_empty()
                    || reader.is_some_and(|module| export.to.iter().any(|to| to == module))
            })
            .map(|export| export.package.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> ModuleDef {
        ModuleDef {
            name: QualifiedName::from_dotted("lib.core"),
            requires: Vec::new(),
            exports: vec![
                ModuleExport {
                    package: PackageName::from_dotted("lib.api"),
                    to: Vec::new(),
                },
                ModuleExport {
                    package: PackageName::from_dotted("lib.internal"),
                    to: vec![QualifiedName::from_dotted("lib.tests")],
                },
            ],
        }
    }

    #[test]
    fn unqualified_exports_are_visible_to_everyone() {
        let m = module();
        let pkg = PackageName::from_dotted("lib.api");
        assert!(m.exports_package_to(&pkg, None));
        assert!(m.exports_package_to(&pkg, Some(&QualifiedName::from_dotted("other"))));
    }

    #[test]
    fn qualified_exports_are_visible_only_to_named_readers() {
        let m = module();
        let pkg = PackageName::from_dotted("lib.internal");
        assert!(!m.exports_package_to(&pkg, None));
        assert!(m.exports_package_to(&pkg, Some(&QualifiedName::from_dotted("lib.tests"))));
        assert!(!m.exports_package_to(&pkg, Some(&QualifiedName::from_dotted("other"))));
    }

    #[test]
    fn a_module_sees_all_of_its_own_packages() {
        let m = module();
        assert!(m.exports_package_to(
            &PackageName::from_dotted("lib.internal"),
            Some(&QualifiedName::from_dotted("lib.core"))
        ));
    }
}
