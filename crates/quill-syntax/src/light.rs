//! Token-position-only "light" syntax tree.
//!
//! A light tree is what the fast scanning passes see: node kinds, text
//! ranges, declared names, and parent/child structure. No declaration model,
//! no stub index, nothing that could trigger a full parse.

use quill_core::{Name, Span};

/// Index into [`LightTree::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightNodeId(u32);

impl LightNodeId {
    #[must_use]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Node kinds the light tree distinguishes. Everything scope-relevant gets
/// its own kind; the rest collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    File,
    ClassDeclaration,
    MethodDeclaration,
    FieldDeclaration,
    ParameterList,
    Parameter,
    CodeBlock,
    DeclarationStatement,
    LocalVariable,
    ForStatement,
    ForeachStatement,
    TryStatement,
    CatchClause,
    LambdaExpression,
    Reference,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightNode {
    pub kind: LightKind,
    pub range: Span,
    /// Declared name for declaration-ish nodes, referenced name for
    /// [`LightKind::Reference`] nodes.
    pub name: Option<Name>,
    /// Range of the name token itself; used for position ordering.
    pub name_range: Option<Span>,
    parent: Option<LightNodeId>,
    children: Vec<LightNodeId>,
}

impl LightNode {
    #[must_use]
    pub fn parent(&self) -> Option<LightNodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[LightNodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightTree {
    nodes: Vec<LightNode>,
    root: LightNodeId,
}

impl LightTree {
    #[must_use]
    pub fn root(&self) -> LightNodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: LightNodeId) -> &LightNode {
        &self.nodes[id.idx()]
    }

    #[must_use]
    pub fn parent(&self, id: LightNodeId) -> Option<LightNodeId> {
        self.node(id).parent
    }

    /// Iterate ancestors strictly above `id`, innermost first.
    pub fn ancestors(&self, id: LightNodeId) -> impl Iterator<Item = LightNodeId> + '_ {
        std::iter::successors(self.parent(id), |&cur| self.parent(cur))
    }
}

/// Incremental builder used by the external lightweight parse (and tests).
#[derive(Debug)]
pub struct LightTreeBuilder {
    nodes: Vec<LightNode>,
    root: LightNodeId,
}

impl LightTreeBuilder {
    #[must_use]
    pub fn new(root_kind: LightKind, range: Span) -> Self {
        let root = LightNode {
            kind: root_kind,
            range,
            name: None,
            name_range: None,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: LightNodeId(0),
        }
    }

    #[must_use]
    pub fn root(&self) -> LightNodeId {
        self.root
    }

    pub fn add_child(&mut self, parent: LightNodeId, kind: LightKind, range: Span) -> LightNodeId {
        let id = LightNodeId(self.nodes.len() as u32);
        self.nodes.push(LightNode {
            kind,
            range,
            name: None,
            name_range: None,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.idx()].children.push(id);
        id
    }

    pub fn set_name(&mut self, id: LightNodeId, name: impl Into<Name>, name_range: Span) {
        let node = &mut self.nodes[id.idx()];
        node.name = Some(name.into());
        node.name_range = Some(name_range);
    }

    #[must_use]
    pub fn finish(self) -> LightTree {
        LightTree {
            nodes: self.nodes,
            root: self.root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestors_walk_innermost_first() {
        let mut builder = LightTreeBuilder::new(LightKind::File, Span::new(0, 100));
        let class = builder.add_child(builder.root(), LightKind::ClassDeclaration, Span::new(0, 100));
        let method = builder.add_child(class, LightKind::MethodDeclaration, Span::new(10, 90));
        let block = builder.add_child(method, LightKind::CodeBlock, Span::new(20, 90));
        let tree = builder.finish();

        let chain: Vec<_> = tree.ancestors(block).collect();
        assert_eq!(chain, vec![method, class, tree.root()]);
    }

    #[test]
    fn names_are_attached_with_their_ranges() {
        let mut builder = LightTreeBuilder::new(LightKind::File, Span::new(0, 50));
        let var = builder.add_child(builder.root(), LightKind::LocalVariable, Span::new(4, 14));
        builder.set_name(var, "x", Span::new(8, 9));
        let tree = builder.finish();

        let node = tree.node(var);
        assert_eq!(node.name.as_ref().map(Name::as_str), Some("x"));
        assert_eq!(node.name_range, Some(Span::new(8, 9)));
    }
}
