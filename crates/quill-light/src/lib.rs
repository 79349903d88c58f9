//! Lightweight local-reference resolution.
//!
//! Answers "can this reference be a local variable, parameter, or field?"
//! using only the token-position light tree, so fast indexing passes never
//! build the heavy declaration model. The walk is order-sensitive the way
//! Java bodies are: a declaration is only visible after its own position, and
//! the local search ends the moment a class boundary is crossed — anything
//! found further out can only be a field.

use quill_core::Name;
use quill_syntax::{LightKind, LightNodeId, LightTree};

/// Outcome of a lightweight resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOutcome {
    /// The reference resolves to this local/parameter declaration node.
    Resolved(LightNodeId),
    /// The reference names a field (found only after crossing a class
    /// boundary); it is definitely not a local.
    NonLocal,
    /// Nothing visible matches; the reference may target something outside
    /// this tree entirely.
    Unknown,
}

/// Resolve `reference` against the scopes enclosing it.
///
/// Never forces a full parse: this function only reads node kinds, names,
/// and token positions that the light tree already carries.
#[must_use]
pub fn resolve_local(tree: &LightTree, reference: LightNodeId) -> LocalOutcome {
    let ref_node = tree.node(reference);
    if ref_node.kind != LightKind::Reference {
        return LocalOutcome::Unknown;
    }
    let Some(name) = &ref_node.name else {
        return LocalOutcome::Unknown;
    };
    let ref_start = ref_node.range.start;

    let mut crossed_class_boundary = false;

    for ancestor in tree.ancestors(reference) {
        let node = tree.node(ancestor);
        match node.kind {
            LightKind::ClassDeclaration | LightKind::File => {
                // From here on out, only fields are possible.
                crossed_class_boundary = true;
                if field_with_name(tree, ancestor, name) {
                    return LocalOutcome::NonLocal;
                }
            }
            _ if crossed_class_boundary => {
                // Once outside the innermost class, nothing but enclosing
                // classes matters.
            }
            LightKind::CodeBlock
            | LightKind::ForStatement
            | LightKind::ForeachStatement
            | LightKind::TryStatement => {
                if let Some(found) = local_before(tree, ancestor, name, ref_start) {
                    return LocalOutcome::Resolved(found);
                }
            }
            LightKind::CatchClause
            | LightKind::LambdaExpression
            | LightKind::MethodDeclaration => {
                if let Some(found) = parameter_of(tree, ancestor, name) {
                    return LocalOutcome::Resolved(found);
                }
            }
            _ => {}
        }
    }

    LocalOutcome::Unknown
}

/// Find a local variable named `name` among `scope`'s statements, declared
/// strictly before `ref_start`. Unlike Rust, a local is in scope within its
/// own initializer, so plain position filtering is exactly the rule.
fn local_before(
    tree: &LightTree,
    scope: LightNodeId,
    name: &Name,
    ref_start: u32,
) -> Option<LightNodeId> {
    for &child in tree.node(scope).children() {
        let node = tree.node(child);
        match node.kind {
            LightKind::LocalVariable | LightKind::Parameter => {
                if declares_before(tree, child, name, ref_start) {
                    return Some(child);
                }
            }
            LightKind::DeclarationStatement => {
                for &var in node.children() {
                    if tree.node(var).kind == LightKind::LocalVariable
                        && declares_before(tree, var, name, ref_start)
                    {
                        return Some(var);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn parameter_of(tree: &LightTree, owner: LightNodeId, name: &Name) -> Option<LightNodeId> {
    for &child in tree.node(owner).children() {
        let node = tree.node(child);
        match node.kind {
            LightKind::ParameterList => {
                for &param in node.children() {
                    let param_node = tree.node(param);
                    if param_node.kind == LightKind::Parameter
                        && param_node.name.as_ref() == Some(name)
                    {
                        return Some(param);
                    }
                }
            }
            LightKind::Parameter if node.name.as_ref() == Some(name) => {
                return Some(child);
            }
            _ => {}
        }
    }
    None
}

fn declares_before(tree: &LightTree, decl: LightNodeId, name: &Name, ref_start: u32) -> bool {
    let node = tree.node(decl);
    if node.name.as_ref() != Some(name) {
        return false;
    }
    let decl_start = node.name_range.map(|r| r.start).unwrap_or(node.range.start);
    decl_start < ref_start
}

fn field_with_name(tree: &LightTree, class: LightNodeId, name: &Name) -> bool {
    tree.node(class).children().iter().any(|&child| {
        let node = tree.node(child);
        node.kind == LightKind::FieldDeclaration && node.name.as_ref() == Some(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Span;
    use quill_syntax::LightTreeBuilder;

    /// `class C { int x; void first() { <ref x> } void second(int x) {} }`
    fn class_with_field_and_sibling_param() -> (LightTree, LightNodeId) {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 200));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 200));
        b.set_name(class, "C", Span::new(6, 7));

        let field = b.add_child(class, LightKind::FieldDeclaration, Span::new(10, 16));
        b.set_name(field, "x", Span::new(14, 15));

        let first = b.add_child(class, LightKind::MethodDeclaration, Span::new(20, 80));
        b.set_name(first, "first", Span::new(25, 30));
        let _params = b.add_child(first, LightKind::ParameterList, Span::new(30, 32));
        let block = b.add_child(first, LightKind::CodeBlock, Span::new(35, 80));
        let reference = b.add_child(block, LightKind::Reference, Span::new(40, 41));
        b.set_name(reference, "x", Span::new(40, 41));

        let second = b.add_child(class, LightKind::MethodDeclaration, Span::new(90, 150));
        b.set_name(second, "second", Span::new(95, 101));
        let second_params = b.add_child(second, LightKind::ParameterList, Span::new(101, 110));
        let param = b.add_child(second_params, LightKind::Parameter, Span::new(102, 107));
        b.set_name(param, "x", Span::new(106, 107));

        (b.finish(), reference)
    }

    #[test]
    fn field_after_class_boundary_is_non_local() {
        let (tree, reference) = class_with_field_and_sibling_param();
        // `x` is a field of the enclosing class and a parameter of an
        // unrelated sibling method; the sibling's parameter must never match.
        assert_eq!(resolve_local(&tree, reference), LocalOutcome::NonLocal);
    }

    #[test]
    fn local_declared_before_reference_resolves() {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 100));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 100));
        let method = b.add_child(class, LightKind::MethodDeclaration, Span::new(5, 95));
        let block = b.add_child(method, LightKind::CodeBlock, Span::new(10, 95));

        let stmt = b.add_child(block, LightKind::DeclarationStatement, Span::new(12, 22));
        let var = b.add_child(stmt, LightKind::LocalVariable, Span::new(12, 22));
        b.set_name(var, "total", Span::new(16, 21));

        let reference = b.add_child(block, LightKind::Reference, Span::new(30, 35));
        b.set_name(reference, "total", Span::new(30, 35));

        let tree = b.finish();
        assert_eq!(resolve_local(&tree, reference), LocalOutcome::Resolved(var));
    }

    #[test]
    fn forward_references_within_a_block_do_not_resolve() {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 100));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 100));
        let method = b.add_child(class, LightKind::MethodDeclaration, Span::new(5, 95));
        let block = b.add_child(method, LightKind::CodeBlock, Span::new(10, 95));

        let reference = b.add_child(block, LightKind::Reference, Span::new(12, 17));
        b.set_name(reference, "later", Span::new(12, 17));

        let stmt = b.add_child(block, LightKind::DeclarationStatement, Span::new(20, 30));
        let var = b.add_child(stmt, LightKind::LocalVariable, Span::new(20, 30));
        b.set_name(var, "later", Span::new(24, 29));

        let tree = b.finish();
        assert_eq!(resolve_local(&tree, reference), LocalOutcome::Unknown);
    }

    #[test]
    fn method_parameters_resolve_from_inside_the_body() {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 100));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 100));
        let method = b.add_child(class, LightKind::MethodDeclaration, Span::new(5, 95));
        let params = b.add_child(method, LightKind::ParameterList, Span::new(10, 20));
        let param = b.add_child(params, LightKind::Parameter, Span::new(11, 19));
        b.set_name(param, "input", Span::new(14, 19));
        let block = b.add_child(method, LightKind::CodeBlock, Span::new(22, 95));

        let reference = b.add_child(block, LightKind::Reference, Span::new(30, 35));
        b.set_name(reference, "input", Span::new(30, 35));

        let tree = b.finish();
        assert_eq!(resolve_local(&tree, reference), LocalOutcome::Resolved(param));
    }

    #[test]
    fn catch_parameter_resolves_inside_its_clause() {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 100));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 100));
        let method = b.add_child(class, LightKind::MethodDeclaration, Span::new(5, 95));
        let block = b.add_child(method, LightKind::CodeBlock, Span::new(10, 95));
        let try_stmt = b.add_child(block, LightKind::TryStatement, Span::new(12, 90));
        let catch = b.add_child(try_stmt, LightKind::CatchClause, Span::new(40, 90));
        let param = b.add_child(catch, LightKind::Parameter, Span::new(47, 58));
        b.set_name(param, "e", Span::new(57, 58));
        let catch_block = b.add_child(catch, LightKind::CodeBlock, Span::new(60, 90));

        let reference = b.add_child(catch_block, LightKind::Reference, Span::new(65, 66));
        b.set_name(reference, "e", Span::new(65, 66));

        let tree = b.finish();
        assert_eq!(resolve_local(&tree, reference), LocalOutcome::Resolved(param));
    }

    #[test]
    fn lambda_parameter_shadows_outer_scope() {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 120));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 120));
        let method = b.add_child(class, LightKind::MethodDeclaration, Span::new(5, 115));
        let block = b.add_child(method, LightKind::CodeBlock, Span::new(10, 115));

        let stmt = b.add_child(block, LightKind::DeclarationStatement, Span::new(12, 22));
        let outer = b.add_child(stmt, LightKind::LocalVariable, Span::new(12, 22));
        b.set_name(outer, "v", Span::new(16, 17));

        let lambda = b.add_child(block, LightKind::LambdaExpression, Span::new(30, 110));
        let lambda_param = b.add_child(lambda, LightKind::Parameter, Span::new(31, 32));
        b.set_name(lambda_param, "v", Span::new(31, 32));
        let lambda_body = b.add_child(lambda, LightKind::CodeBlock, Span::new(36, 110));

        let reference = b.add_child(lambda_body, LightKind::Reference, Span::new(40, 41));
        b.set_name(reference, "v", Span::new(40, 41));

        let tree = b.finish();
        assert_eq!(
            resolve_local(&tree, reference),
            LocalOutcome::Resolved(lambda_param)
        );
    }

    #[test]
    fn foreach_variable_resolves_in_loop_body() {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 100));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 100));
        let method = b.add_child(class, LightKind::MethodDeclaration, Span::new(5, 95));
        let block = b.add_child(method, LightKind::CodeBlock, Span::new(10, 95));
        let foreach = b.add_child(block, LightKind::ForeachStatement, Span::new(12, 90));
        let var = b.add_child(foreach, LightKind::LocalVariable, Span::new(17, 27));
        b.set_name(var, "item", Span::new(23, 27));
        let body = b.add_child(foreach, LightKind::CodeBlock, Span::new(30, 90));

        let reference = b.add_child(body, LightKind::Reference, Span::new(40, 44));
        b.set_name(reference, "item", Span::new(40, 44));

        let tree = b.finish();
        assert_eq!(resolve_local(&tree, reference), LocalOutcome::Resolved(var));
    }

    #[test]
    fn unknown_when_nothing_matches_anywhere() {
        let mut b = LightTreeBuilder::new(LightKind::File, Span::new(0, 50));
        let class = b.add_child(b.root(), LightKind::ClassDeclaration, Span::new(0, 50));
        let method = b.add_child(class, LightKind::MethodDeclaration, Span::new(5, 45));
        let block = b.add_child(method, LightKind::CodeBlock, Span::new(10, 45));
        let reference = b.add_child(block, LightKind::Reference, Span::new(20, 25));
        b.set_name(reference, "ghost", Span::new(20, 25));
        let tree = b.finish();

        assert_eq!(resolve_local(&tree, reference), LocalOutcome::Unknown);
    }
}
