//! Stub building: lowering a full AST into its stub summary.
//!
//! This is the same pass the lightweight indexing parse performs; keeping it
//! as a pure function of the AST is what makes the stub/AST equivalence
//! invariant testable: for a fixed source, `build_stub_tree` is the one place
//! that decides what a stub knows.

use quill_core::{DeclId, DeclKind, FileId, Modifier};
use quill_syntax::{AstClass, AstField, AstFile, AstMethod, AstParameter, AstTypeParameter};

use crate::tree::{
    ClassStub, ExportStub, FieldStub, ImportStub, InitializerText, MethodStub, ModuleStub,
    ParameterStub, RecordComponentStub, StubTree, TypeParameterStub, MAX_STORED_INITIALIZER_LEN,
};

struct IdAlloc {
    file: FileId,
    next: u32,
}

impl IdAlloc {
    fn next(&mut self, kind: DeclKind) -> DeclId {
        let id = DeclId::new(self.file, kind, self.next);
        self.next += 1;
        id
    }
}

/// Build the stub tree for one file.
///
/// Identity assignment is pre-order over the declaration tree, so a stub and
/// the AST node it summarizes always agree on [`DeclId`].
#[must_use]
pub fn build_stub_tree(ast: &AstFile) -> StubTree {
    let mut alloc = IdAlloc {
        file: ast.file,
        next: 0,
    };

    let module = ast.module.as_ref().map(|module| ModuleStub {
        id: alloc.next(DeclKind::Module),
        name: module.name.clone(),
        requires: module.requires.clone(),
        exports: module
            .exports
            .iter()
            .map(|export| ExportStub {
                package: export.package.clone(),
                to: export.to.clone(),
            })
            .collect(),
    });

    let imports = ast
        .imports
        .iter()
        .map(|import| ImportStub {
            id: alloc.next(DeclKind::Import),
            is_static: import.is_static,
            on_demand: import.on_demand,
            is_module: import.is_module,
            path: import.path.clone(),
            range: import.range,
        })
        .collect();

    let classes = ast
        .classes
        .iter()
        .map(|class| build_class(class, &mut alloc))
        .collect();

    StubTree {
        file: ast.file,
        package: ast.package.clone(),
        module,
        imports,
        classes,
    }
}

fn build_class(class: &AstClass, alloc: &mut IdAlloc) -> ClassStub {
    ClassStub {
        id: alloc.next(DeclKind::Class),
        name: class.name.clone(),
        kind: class.kind,
        shape: class.shape,
        modifiers: class.modifiers,
        super_type_texts: class
            .super_types
            .iter()
            .map(|ty| ty.text.clone())
            .collect(),
        type_parameters: class
            .type_parameters
            .iter()
            .map(|tp| build_type_parameter(tp, alloc))
            .collect(),
        fields: class
            .fields
            .iter()
            .map(|field| build_field(field, alloc))
            .collect(),
        methods: class
            .methods
            .iter()
            .map(|method| build_method(method, alloc))
            .collect(),
        classes: class
            .classes
            .iter()
            .map(|nested| build_class(nested, alloc))
            .collect(),
        record_components: class
            .record_components
            .iter()
            .map(|component| RecordComponentStub {
                id: alloc.next(DeclKind::RecordComponent),
                name: component.name.clone(),
                type_text: component.ty.text.clone(),
            })
            .collect(),
        range: class.range,
    }
}

fn build_field(field: &AstField, alloc: &mut IdAlloc) -> FieldStub {
    FieldStub {
        id: alloc.next(DeclKind::Field),
        name: field.name.clone(),
        modifiers: field.modifiers,
        type_text: field.ty.text.clone(),
        initializer: initializer_text(field),
        is_enum_constant: field.is_enum_constant,
        range: field.range,
    }
}

/// Initializer storage policy: only `final` fields are constant-folding
/// candidates, so only their initializers are persisted (up to the length
/// cap). Everything else stays in the AST.
fn initializer_text(field: &AstField) -> InitializerText {
    let Some(text) = &field.initializer_text else {
        return InitializerText::Absent;
    };
    if !field.modifiers.contains(Modifier::Final) {
        return InitializerText::NotStored;
    }
    if text.len() > MAX_STORED_INITIALIZER_LEN {
        return InitializerText::TooLong;
    }
    InitializerText::Stored(text.clone())
}

fn build_method(method: &AstMethod, alloc: &mut IdAlloc) -> MethodStub {
    MethodStub {
        id: alloc.next(DeclKind::Method),
        name: method.name.clone(),
        modifiers: method.modifiers,
        return_type_text: method.return_type.as_ref().map(|ty| ty.text.clone()),
        parameters: method
            .parameters
            .iter()
            .map(|param| build_parameter(param, alloc))
            .collect(),
        type_parameters: method
            .type_parameters
            .iter()
            .map(|tp| build_type_parameter(tp, alloc))
            .collect(),
        throws_texts: method.throws.iter().map(|ty| ty.text.clone()).collect(),
        is_constructor: method.is_constructor,
        is_varargs: method.is_varargs,
        has_body: method.body_text.is_some(),
        range: method.range,
    }
}

fn build_parameter(param: &AstParameter, alloc: &mut IdAlloc) -> ParameterStub {
    ParameterStub {
        id: alloc.next(DeclKind::Parameter),
        name: param.name.clone(),
        type_text: param.ty.text.clone(),
        modifiers: param.modifiers,
        range: param.range,
    }
}

fn build_type_parameter(tp: &AstTypeParameter, alloc: &mut IdAlloc) -> TypeParameterStub {
    TypeParameterStub {
        id: alloc.next(DeclKind::TypeParameter),
        name: tp.name.clone(),
        bound_texts: tp.bounds.iter().map(|ty| ty.text.clone()).collect(),
    }
}
