//! Non-local environ pass (§4.3): record, for every node whose enclosing
//! table chain is an unbroken run of *empty* tables, the outermost table
//! still reachable without crossing a routine/format boundary. The code
//! generator uses this to address anonymous block storage at its true
//! owner's frame instead of an intervening empty block.

use crate::node::{NodeId, NodeKind};
use crate::table::TableId;
use crate::tag::Priority;
use crate::tree::Tree;

pub fn get_non_local_environs(tree: &mut Tree, start: Option<NodeId>, max: u32) {
    let mut cur = start;
    while let Some(p) = cur {
        match tree.kind(p) {
            NodeKind::RoutineText | NodeKind::FormatText => {
                // Entering a routine/format body: outer frames stop being
                // addressable as non-local. The reset level is the body's
                // own lex level (SUB(p)), not the text node's — the
                // parameter pack and header live one level up from the body.
                let sub = tree.sub(p);
                let new_max = sub.map_or(max, |s| tree.lex_level(s));
                get_non_local_environs(tree, sub, new_max);
            }
            _ => {
                get_non_local_environs(tree, tree.sub(p), max);
                tree.set_non_local(p, None);
                let mut q = Some(tree.table_of(p));
                while let Some(qid) = q {
                    if !table_is_empty(tree, qid) {
                        break;
                    }
                    match tree.table(qid).previous {
                        Some(prev) if tree.table(prev).level >= max => {
                            tree.set_non_local(p, Some(prev));
                            q = Some(prev);
                        }
                        _ => break,
                    }
                }
            }
        }
        cur = tree.next(p);
    }
}

fn table_is_empty(tree: &Tree, id: TableId) -> bool {
    let table = tree.table(id);
    if !table.operators.is_empty() || !table.indicants.is_empty() {
        return false;
    }
    match table.identifiers.as_slice() {
        [] => true,
        [only] => matches!(tree.tag(*only).priority, Priority::Loop | Priority::Specifier),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{Storage, Tag};

    #[test]
    fn anonymous_empty_block_resolves_to_outer_table() {
        let mut tree = Tree::new();
        let outer = tree.alloc_table(0, None);
        let anon = tree.alloc_table(1, Some(outer));
        let n = tree.alloc_node(NodeKind::Skip, anon, 1);

        get_non_local_environs(&mut tree, Some(n), 0);
        assert_eq!(tree.non_local(n), Some(outer));
    }

    #[test]
    fn non_empty_table_has_no_non_local() {
        let mut tree = Tree::new();
        let outer = tree.alloc_table(0, None);
        let inner = tree.alloc_table(1, Some(outer));
        let sym = tree.interner.intern("x");
        let tag = tree.alloc_tag(Tag::new(sym, 1, Priority::Normal, Storage::Loc, None));
        tree.table_mut(inner).identifiers.push(tag);
        let n = tree.alloc_node(NodeKind::Skip, inner, 1);

        get_non_local_environs(&mut tree, Some(n), 0);
        assert_eq!(tree.non_local(n), None);
    }

    #[test]
    fn chain_of_two_empty_tables_reaches_the_outermost() {
        let mut tree = Tree::new();
        let outer = tree.alloc_table(0, None);
        let mid = tree.alloc_table(1, Some(outer));
        let inner = tree.alloc_table(2, Some(mid));
        let n = tree.alloc_node(NodeKind::Skip, inner, 2);

        get_non_local_environs(&mut tree, Some(n), 0);
        assert_eq!(tree.non_local(n), Some(outer));
    }

    #[test]
    fn routine_text_resets_max_to_body_level() {
        let mut tree = Tree::new();
        let outer = tree.alloc_table(0, None);
        let routine_table = tree.alloc_table(5, Some(outer));
        let text = tree.alloc_node(NodeKind::RoutineText, outer, 1);
        let body = tree.alloc_node(NodeKind::Skip, routine_table, 5);
        tree.set_sub(text, body);

        get_non_local_environs(&mut tree, Some(text), 0);
        // The body's own table (level 5) is empty and its previous (outer,
        // level 0) is below the reset max (5), so no further climb happens.
        assert_eq!(tree.non_local(body), None);
    }
}
