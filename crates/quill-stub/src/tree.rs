use quill_core::{DeclId, FileId, ModifierMask, Name, PackageName, QualifiedName, Span};
use quill_syntax::{ClassKind, ClassShape};
use serde::{Deserialize, Serialize};

/// Longest initializer text a stub will store verbatim. Anything longer is
/// recorded as [`InitializerText::TooLong`] and must be read from the AST.
pub const MAX_STORED_INITIALIZER_LEN: usize = 1024;

/// A field's detached initializer, as persisted in a stub.
///
/// The two reserved sentinels are part of the persistence contract: they tell
/// the reader whether an AST walk is required (`NotStored` / `TooLong`) or
/// whether the stub answer is final (`Absent` / `Stored`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitializerText {
    /// The field has no initializer in source.
    Absent,
    /// Initializer text stored verbatim.
    Stored(String),
    /// The field has an initializer, but the indexer chose not to store it.
    NotStored,
    /// The field has an initializer longer than [`MAX_STORED_INITIALIZER_LEN`].
    TooLong,
}

impl InitializerText {
    /// Whether a stub-backed query can answer `initializer_text` without the
    /// AST.
    #[must_use]
    pub fn is_green(&self) -> bool {
        matches!(self, InitializerText::Absent | InitializerText::Stored(_))
    }
}

/// Per-file stub tree. Owns nothing but other stubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubTree {
    pub file: FileId,
    pub package: Option<PackageName>,
    pub module: Option<ModuleStub>,
    pub imports: Vec<ImportStub>,
    pub classes: Vec<ClassStub>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStub {
    pub id: DeclId,
    pub name: Option<Name>,
    pub kind: ClassKind,
    pub shape: ClassShape,
    pub modifiers: ModifierMask,
    /// Type texts of `extends` entries first, then `implements`, source order.
    pub super_type_texts: Vec<String>,
    pub type_parameters: Vec<TypeParameterStub>,
    pub fields: Vec<FieldStub>,
    pub methods: Vec<MethodStub>,
    pub classes: Vec<ClassStub>,
    pub record_components: Vec<RecordComponentStub>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStub {
    pub id: DeclId,
    pub name: Name,
    pub modifiers: ModifierMask,
    pub return_type_text: Option<String>,
    pub parameters: Vec<ParameterStub>,
    pub type_parameters: Vec<TypeParameterStub>,
    pub throws_texts: Vec<String>,
    pub is_constructor: bool,
    pub is_varargs: bool,
    pub has_body: bool,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStub {
    pub id: DeclId,
    pub name: Name,
    pub modifiers: ModifierMask,
    pub type_text: String,
    pub initializer: InitializerText,
    pub is_enum_constant: bool,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterStub {
    pub id: DeclId,
    pub name: Name,
    pub type_text: String,
    pub modifiers: ModifierMask,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameterStub {
    pub id: DeclId,
    pub name: Name,
    pub bound_texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordComponentStub {
    pub id: DeclId,
    pub name: Name,
    pub type_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStub {
    pub id: DeclId,
    pub is_static: bool,
    pub on_demand: bool,
    pub is_module: bool,
    pub path: QualifiedName,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleStub {
    pub id: DeclId,
    pub name: QualifiedName,
    pub requires: Vec<QualifiedName>,
    pub exports: Vec<ExportStub>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStub {
    pub package: PackageName,
    pub to: Vec<QualifiedName>,
}

/// A structural violation inside a deserialized stub tree.
///
/// Corruption is a fatal internal-consistency error: it indicates a broken
/// index, not a recoverable condition. Dual storage panics on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StubCorruption {
    #[error("stub {id:?}: named declaration shape is missing its name")]
    NameMissing { id: DeclId },
    #[error("stub {id:?}: anonymous declaration shape carries a name")]
    UnexpectedName { id: DeclId },
    #[error("stub {id:?}: belongs to file {found:?}, tree is for {expected:?}")]
    ForeignFile {
        id: DeclId,
        expected: FileId,
        found: FileId,
    },
    #[error("stub {id:?}: enum constant declared outside an enum class")]
    EnumConstantOutsideEnum { id: DeclId },
    #[error("stub {id:?}: constructor carries a return type")]
    ConstructorWithReturnType { id: DeclId },
}

impl StubTree {
    /// Validate the tree's structural invariants.
    ///
    /// Callers that hold a tree failing validation must treat it as index
    /// corruption and surface the error loudly.
    pub fn validate(&self) -> Result<(), StubCorruption> {
        if let Some(module) = &self.module {
            check_file(module.id, self.file)?;
        }
        for import in &self.imports {
            check_file(import.id, self.file)?;
        }
        for class in &self.classes {
            validate_class(class, self.file)?;
        }
        Ok(())
    }
}

fn check_file(id: DeclId, expected: FileId) -> Result<(), StubCorruption> {
    if id.file != expected {
        return Err(StubCorruption::ForeignFile {
            id,
            expected,
            found: id.file,
        });
    }
    Ok(())
}

fn validate_class(class: &ClassStub, file: FileId) -> Result<(), StubCorruption> {
    check_file(class.id, file)?;

    let anonymous = matches!(
        class.shape,
        ClassShape::Anonymous | ClassShape::EnumConstantBody
    );
    match (&class.name, anonymous) {
        (None, false) if class.shape == ClassShape::Normal => {
            return Err(StubCorruption::NameMissing { id: class.id })
        }
        (Some(_), true) => return Err(StubCorruption::UnexpectedName { id: class.id }),
        _ => {}
    }

    for field in &class.fields {
        check_file(field.id, file)?;
        if field.is_enum_constant && class.kind != ClassKind::Enum {
            return Err(StubCorruption::EnumConstantOutsideEnum { id: field.id });
        }
    }

    for method in &class.methods {
        check_file(method.id, file)?;
        if method.is_constructor && method.return_type_text.is_some() {
            return Err(StubCorruption::ConstructorWithReturnType { id: method.id });
        }
        for param in &method.parameters {
            check_file(param.id, file)?;
        }
    }

    for nested in &class.classes {
        validate_class(nested, file)?;
    }

    Ok(())
}
