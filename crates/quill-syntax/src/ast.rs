//! Declaration-grade full AST nodes.
//!
//! These are plain data types constructed by the external parser (or directly
//! by tests). They deliberately stop at the declaration level: method bodies
//! and field initializers are carried as text fragments, because everything
//! below declaration granularity is outside the stub index's interest.

use quill_core::{FileId, ModifierMask, Name, PackageName, QualifiedName, Span};
use serde::{Deserialize, Serialize};

/// One parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstFile {
    pub file: FileId,
    pub package: Option<PackageName>,
    pub module: Option<AstModule>,
    pub imports: Vec<AstImport>,
    pub classes: Vec<AstClass>,
}

impl AstFile {
    #[must_use]
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            package: None,
            module: None,
            imports: Vec::new(),
            classes: Vec::new(),
        }
    }
}

/// What flavor of type declaration a class node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// How the declaration occurs in source.
///
/// A closed set of variants instead of a subclass-per-shape hierarchy:
/// `Anonymous` covers `new Foo() { ... }` bodies, `EnumConstantBody` covers
/// the body of an enum constant, and `Implicit` covers compact/implicitly
/// declared top-level classes (simple source files without a class header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassShape {
    Normal,
    Anonymous,
    EnumConstantBody,
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstClass {
    /// Absent for anonymous and implicit classes.
    pub name: Option<Name>,
    pub kind: ClassKind,
    pub shape: ClassShape,
    pub modifiers: ModifierMask,
    /// `extends` entries first, then `implements`, in source order.
    pub super_types: Vec<AstTypeRef>,
    pub type_parameters: Vec<AstTypeParameter>,
    pub fields: Vec<AstField>,
    pub methods: Vec<AstMethod>,
    pub classes: Vec<AstClass>,
    pub record_components: Vec<AstRecordComponent>,
    pub range: Span,
}

impl AstClass {
    pub fn new(name: impl Into<Name>, kind: ClassKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            shape: ClassShape::Normal,
            modifiers: ModifierMask::empty(),
            super_types: Vec::new(),
            type_parameters: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            classes: Vec::new(),
            record_components: Vec::new(),
            range: Span::new(0, 0),
        }
    }

    #[must_use]
    pub fn anonymous(kind: ClassKind) -> Self {
        Self {
            name: None,
            shape: ClassShape::Anonymous,
            ..Self::new("", kind)
        }
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    #[must_use]
    pub fn is_record(&self) -> bool {
        self.kind == ClassKind::Record
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(
            self.shape,
            ClassShape::Anonymous | ClassShape::EnumConstantBody
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstField {
    pub name: Name,
    pub modifiers: ModifierMask,
    pub ty: AstTypeRef,
    /// Raw initializer text, if any. Detached from the expression tree so a
    /// stub can carry it verbatim.
    pub initializer_text: Option<String>,
    pub is_enum_constant: bool,
    pub range: Span,
}

impl AstField {
    pub fn new(name: impl Into<Name>, ty: AstTypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: ModifierMask::empty(),
            ty,
            initializer_text: None,
            is_enum_constant: false,
            range: Span::new(0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstMethod {
    pub name: Name,
    pub modifiers: ModifierMask,
    /// Absent for constructors.
    pub return_type: Option<AstTypeRef>,
    pub parameters: Vec<AstParameter>,
    pub type_parameters: Vec<AstTypeParameter>,
    pub throws: Vec<AstTypeRef>,
    pub is_constructor: bool,
    pub is_varargs: bool,
    pub body_text: Option<String>,
    pub range: Span,
}

impl AstMethod {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            modifiers: ModifierMask::empty(),
            return_type: None,
            parameters: Vec::new(),
            type_parameters: Vec::new(),
            throws: Vec::new(),
            is_constructor: false,
            is_varargs: false,
            body_text: None,
            range: Span::new(0, 0),
        }
    }

    pub fn constructor(name: impl Into<Name>) -> Self {
        Self {
            is_constructor: true,
            ..Self::new(name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstParameter {
    pub name: Name,
    pub ty: AstTypeRef,
    pub modifiers: ModifierMask,
    pub range: Span,
}

impl AstParameter {
    pub fn new(name: impl Into<Name>, ty: AstTypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: ModifierMask::empty(),
            range: Span::new(0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstTypeParameter {
    pub name: Name,
    pub bounds: Vec<AstTypeRef>,
}

impl AstTypeParameter {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstRecordComponent {
    pub name: Name,
    pub ty: AstTypeRef,
}

/// A type usage site, carried as source text (`List<String>`, `int[]`, ...).
///
/// Resolution only ever looks at the erased head name; the full text is kept
/// so stubs can reproduce it byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstTypeRef {
    pub text: String,
}

impl AstTypeRef {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The erased head of the type text: `java.util.List<String>[]` →
    /// `java.util.List`.
    #[must_use]
    pub fn head(&self) -> QualifiedName {
        let head = self
            .text
            .split(['<', '['])
            .next()
            .unwrap_or(&self.text)
            .trim();
        QualifiedName::from_dotted(head)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstImport {
    pub is_static: bool,
    pub on_demand: bool,
    /// `import module M;` — brings a module's exported packages on demand.
    pub is_module: bool,
    pub path: QualifiedName,
    pub range: Span,
}

impl AstImport {
    #[must_use]
    pub fn single(path: QualifiedName) -> Self {
        Self {
            is_static: false,
            on_demand: false,
            is_module: false,
            path,
            range: Span::new(0, 0),
        }
    }

    #[must_use]
    pub fn on_demand(path: QualifiedName) -> Self {
        Self {
            on_demand: true,
            ..Self::single(path)
        }
    }

    #[must_use]
    pub fn static_single(path: QualifiedName) -> Self {
        Self {
            is_static: true,
            ..Self::single(path)
        }
    }

    #[must_use]
    pub fn static_on_demand(path: QualifiedName) -> Self {
        Self {
            is_static: true,
            on_demand: true,
            ..Self::single(path)
        }
    }

    #[must_use]
    pub fn module(path: QualifiedName) -> Self {
        Self {
            is_module: true,
            ..Self::single(path)
        }
    }
}

/// A module declaration (`module-info` contents, reduced to what resolution
/// consumes: the export surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstModule {
    pub name: QualifiedName,
    pub requires: Vec<QualifiedName>,
    pub exports: Vec<ExportDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDecl {
    pub package: PackageName,
    /// Empty means exported to everyone.
    pub to: Vec<QualifiedName>,
}

/// Identity of a reference node, used as a resolve-cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefId {
    pub file: FileId,
    pub index: u32,
}

impl RefId {
    #[must_use]
    pub const fn new(file: FileId, index: u32) -> Self {
        Self { file, index }
    }
}

/// The syntactic position a name reference occupies in its parent construct.
///
/// This is the classifier's only input (besides qualification); it is derived
/// by the parser from the parent node kind and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefContext {
    /// Inside a non-wildcard `import` statement.
    ImportSingle,
    /// The qualifier part of a wildcard `import p.*;`.
    ImportOnDemand,
    /// Inside an `import static` statement.
    ImportStatic,
    /// Inside a `package` statement.
    PackageStatement,
    /// Inside a module declaration or `import module`.
    ModuleStatement,
    /// An entry of an `extends` clause.
    ExtendsList,
    /// An entry of an `implements` clause.
    ImplementsList,
    /// An entry of a method's `throws` clause.
    ThrowsList,
    /// An annotation name.
    Annotation,
    /// The class name of an unqualified `new` expression.
    NewExpression,
    /// The class name of `qualifier.new Inner()`.
    QualifiedNew,
    /// A type usage (variable/parameter/return types, casts, ...).
    TypeUse,
    /// An expression-position name (could be a variable, field, or type
    /// qualifier).
    ExpressionName,
}

/// A (possibly qualified) name reference awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstRef {
    pub id: RefId,
    pub qualifier: Option<Box<AstRef>>,
    pub name: Name,
    pub context: RefContext,
    /// For [`RefContext::QualifiedNew`] only: the declared type text of the
    /// qualifying instance expression, computed by the external expression
    /// type collaborator.
    pub qualifier_type_text: Option<String>,
    pub range: Span,
}

impl AstRef {
    pub fn new(id: RefId, name: impl Into<Name>, context: RefContext) -> Self {
        Self {
            id,
            qualifier: None,
            name: name.into(),
            context,
            qualifier_type_text: None,
            range: Span::new(0, 0),
        }
    }

    #[must_use]
    pub fn with_qualifier(mut self, qualifier: AstRef) -> Self {
        self.qualifier = Some(Box::new(qualifier));
        self
    }

    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }

    /// The full dotted text of the reference chain, qualifier first.
    #[must_use]
    pub fn dotted_name(&self) -> QualifiedName {
        let mut segments = Vec::new();
        collect_segments(self, &mut segments);
        QualifiedName::from_segments(segments)
    }
}

fn collect_segments(reference: &AstRef, out: &mut Vec<Name>) {
    if let Some(qualifier) = &reference.qualifier {
        collect_segments(qualifier, out);
    }
    out.push(reference.name.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_ref_head_strips_generics_and_arrays() {
        assert_eq!(
            AstTypeRef::new("java.util.List<String>").head().to_dotted(),
            "java.util.List"
        );
        assert_eq!(AstTypeRef::new("int[]").head().to_dotted(), "int");
        assert_eq!(AstTypeRef::new("Map.Entry<K, V>").head().to_dotted(), "Map.Entry");
    }

    #[test]
    fn dotted_name_walks_qualifier_chain_in_order() {
        let file = FileId::from_raw(0);
        let java = AstRef::new(RefId::new(file, 0), "java", RefContext::ExpressionName);
        let util = AstRef::new(RefId::new(file, 1), "util", RefContext::ExpressionName)
            .with_qualifier(java);
        let map = AstRef::new(RefId::new(file, 2), "Map", RefContext::TypeUse)
            .with_qualifier(util);
        assert_eq!(map.dotted_name().to_dotted(), "java.util.Map");
    }

    #[test]
    fn anonymous_class_has_no_name() {
        let class = AstClass::anonymous(ClassKind::Class);
        assert_eq!(class.name, None);
        assert!(class.is_anonymous());
    }
}
