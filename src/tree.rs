//! The decorated syntax tree aggregate: nodes, tables, tags and modes in
//! one place, plus the small builder helpers tests use to assemble trees by
//! hand.
//!
//! This is the `Context`-aggregate the Design Notes call for (spec.md §9):
//! no module-level singletons, every pass takes `&mut Tree` (or `&Tree`)
//! explicitly.

use crate::arena::IndexArena;
use crate::intern::Interner;
use crate::mode::{ModeArena, ModeId, ModeKind};
use crate::node::{Node, NodeId, NodeKind, NodeStatus};
use crate::table::{SymbolTable, TableId};
use crate::tag::{Tag, TagId};

pub struct Tree {
    pub nodes: IndexArena<Node>,
    pub tables: IndexArena<SymbolTable>,
    pub tags: IndexArena<Tag>,
    pub modes: ModeArena,
    pub interner: Interner,
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            nodes: IndexArena::new(),
            tables: IndexArena::new(),
            tags: IndexArena::new(),
            modes: ModeArena::new(),
            interner: Interner::new(),
        }
    }

    // -- node access -------------------------------------------------

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(id)
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn sub(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).sub
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    pub fn lex_level(&self, id: NodeId) -> u32 {
        self.node(id).lex_level
    }

    pub fn moid(&self, id: NodeId) -> Option<ModeId> {
        self.node(id).moid
    }

    pub fn tax(&self, id: NodeId) -> Option<TagId> {
        self.node(id).tax
    }

    pub fn table_of(&self, id: NodeId) -> TableId {
        self.node(id).table
    }

    pub fn non_local(&self, id: NodeId) -> Option<TableId> {
        self.node(id).non_local
    }

    /// Iterates a node's children via its first-child/next-sibling chain.
    pub fn children(&self, parent: NodeId) -> Siblings<'_> {
        Siblings {
            tree: self,
            cur: self.sub(parent),
        }
    }

    /// Iterates a node and its following siblings, starting at `first`.
    pub fn siblings_from(&self, first: NodeId) -> Siblings<'_> {
        Siblings {
            tree: self,
            cur: Some(first),
        }
    }

    pub fn has_scope_error(&self, id: NodeId) -> bool {
        self.node(id).status.contains(NodeStatus::SCOPE_ERROR)
    }

    pub fn set_scope_error(&mut self, id: NodeId) {
        self.node_mut(id).status.insert(NodeStatus::SCOPE_ERROR);
    }

    pub fn set_interruptible(&mut self, id: NodeId) {
        self.node_mut(id).status.insert(NodeStatus::INTERRUPTIBLE);
    }

    pub fn set_non_local(&mut self, id: NodeId, table: Option<TableId>) {
        self.node_mut(id).non_local = table;
    }

    // -- tables / tags -------------------------------------------------

    pub fn table(&self, id: TableId) -> &SymbolTable {
        self.tables.get(id)
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut SymbolTable {
        self.tables.get_mut(id)
    }

    pub fn tag(&self, id: TagId) -> &Tag {
        self.tags.get(id)
    }

    pub fn tag_mut(&mut self, id: TagId) -> &mut Tag {
        self.tags.get_mut(id)
    }

    // -- mode predicates (pass-through for callers that only have `&Tree`) --

    pub fn mode(&self, id: ModeId) -> &ModeKind {
        self.modes.get(id)
    }

    pub fn is_reference(&self, id: ModeId) -> bool {
        self.modes.is_reference(id)
    }

    pub fn is_procedure(&self, id: ModeId) -> bool {
        self.modes.is_procedure(id)
    }

    pub fn is_format(&self, id: ModeId) -> bool {
        self.modes.is_format(id)
    }

    pub fn is_union(&self, id: ModeId) -> bool {
        self.modes.is_union(id)
    }

    pub fn is_ref_flex(&self, id: ModeId) -> bool {
        self.modes.is_ref_flex(id)
    }

    pub fn is_ref_to_ref_or_flex(&self, id: ModeId) -> bool {
        self.modes.is_ref_to_ref_or_flex(id)
    }

    // -- builder helpers (used by tests to assemble trees by hand) --------

    pub fn alloc_table(&mut self, level: u32, previous: Option<TableId>) -> TableId {
        match previous {
            Some(p) => self.tables.alloc(SymbolTable::child(level, p)),
            None => self.tables.alloc(SymbolTable::root(level)),
        }
    }

    pub fn alloc_tag(&mut self, tag: Tag) -> TagId {
        self.tags.alloc(tag)
    }

    pub fn alloc_mode(&mut self, kind: ModeKind) -> ModeId {
        self.modes.alloc(kind)
    }

    pub fn alloc_node(&mut self, kind: NodeKind, table: TableId, lex_level: u32) -> NodeId {
        self.nodes.alloc(Node::new(kind, table, lex_level))
    }

    pub fn set_sub(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).sub = Some(child);
    }

    pub fn set_next(&mut self, node: NodeId, next: NodeId) {
        self.node_mut(node).next = Some(next);
    }

    pub fn set_moid(&mut self, node: NodeId, moid: ModeId) {
        self.node_mut(node).moid = Some(moid);
    }

    pub fn set_tax(&mut self, node: NodeId, tag: TagId) {
        self.node_mut(node).tax = Some(tag);
    }

    /// Wires `children` as `parent`'s first-child/next-sibling chain.
    pub fn set_children(&mut self, parent: NodeId, children: &[NodeId]) {
        if let Some((&first, rest)) = children.split_first() {
            self.set_sub(parent, first);
            let mut prev = first;
            for &child in rest {
                self.set_next(prev, child);
                prev = child;
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a first-child/next-sibling chain.
pub struct Siblings<'t> {
    tree: &'t Tree,
    cur: Option<NodeId>,
}

impl<'t> Iterator for Siblings<'t> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.cur?;
        self.cur = self.tree.next(cur);
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_walks_first_child_next_sibling_chain() {
        let mut tree = Tree::new();
        let table = tree.alloc_table(0, None);
        let parent = tree.alloc_node(NodeKind::SerialClause, table, 0);
        let a = tree.alloc_node(NodeKind::Skip, table, 0);
        let b = tree.alloc_node(NodeKind::Skip, table, 0);
        let c = tree.alloc_node(NodeKind::Skip, table, 0);
        tree.set_children(parent, &[a, b, c]);
        let kids: Vec<NodeId> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn scope_error_is_idempotent_to_query() {
        let mut tree = Tree::new();
        let table = tree.alloc_table(0, None);
        let n = tree.alloc_node(NodeKind::Skip, table, 0);
        assert!(!tree.has_scope_error(n));
        tree.set_scope_error(n);
        assert!(tree.has_scope_error(n));
    }
}
