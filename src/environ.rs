//! Environ pass (§4.2): for every `ROUTINE TEXT`/`FORMAT TEXT`, compute the
//! *youngest environ* — the greatest lexical level of any free identifier,
//! operator or indicant-with-bounds it uses but does not declare.

use crate::node::{NodeId, NodeKind};
use crate::scope_list::{self, ScopeList};
use crate::tree::Tree;

/// Descends the tree, setting `YOUNGEST_ENVIRON` on every routine/format
/// text's tag.
pub fn get_youngest_environs(tree: &mut Tree, start: Option<NodeId>) {
    let mut cur = start;
    while let Some(p) = cur {
        if is_text(tree.kind(p)) {
            let mut list = ScopeList::new();
            gather_scopes_for_youngest(tree, tree.sub(p), &mut list);
            let level = scope_list::find_youngest_outside(&list, tree.lex_level(p)).level;
            if let Some(tag) = tree.tax(p) {
                tree.tag_mut(tag).youngest_environ = level;
            }
        } else {
            get_youngest_environs(tree, tree.sub(p));
        }
        cur = tree.next(p);
    }
}

fn is_text(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::RoutineText | NodeKind::FormatText)
}

/// Walks a subtree collecting the lexical level of every free use.
fn gather_scopes_for_youngest(tree: &mut Tree, start: Option<NodeId>, list: &mut ScopeList) {
    let mut cur = start;
    while let Some(p) = cur {
        let kind = tree.kind(p);
        if is_text(kind) && tree.tax(p).is_some_and(|t| tree.tag(t).youngest_environ == scope_list::PRIMAL_SCOPE) {
            // Compute the nested text's own environ first, thresholded at
            // its own level, then splice its free-use list into ours —
            // inner uses are visible externally. Splicing here instead of
            // re-walking the subtree keeps this linear in nesting depth.
            let mut inner = ScopeList::new();
            gather_scopes_for_youngest(tree, tree.sub(p), &mut inner);
            let tup = scope_list::find_youngest_outside(&inner, tree.lex_level(p));
            if let Some(tag) = tree.tax(p) {
                tree.tag_mut(tag).youngest_environ = tup.level;
            }
            list.extend(inner);
        } else if matches!(kind, NodeKind::Identifier | NodeKind::Operator) {
            if let Some(tag) = tree.tax(p) {
                let tag_level = tree.tag(tag).tag_lex_level;
                if tag_level != scope_list::PRIMAL_SCOPE {
                    scope_list::add(list, p, scope_list::make_tuple(tag_level, false));
                }
            }
        } else if matches!(kind, NodeKind::Declarer) {
            get_declarer_elements(tree, Some(p), list, true);
        } else {
            gather_scopes_for_youngest(tree, tree.sub(p), list);
        }
        cur = tree.next(p);
    }
}

/// Harvests indicants with row bounds and bounds-expressions from a
/// declarer subtree. `no_ref` suppresses the has-rows contribution of
/// whatever a `REF` layer points to; it is cleared the moment a `REF`
/// declarer is entered and never set again for that branch.
fn get_declarer_elements(tree: &mut Tree, start: Option<NodeId>, list: &mut ScopeList, no_ref: bool) {
    let Some(p) = start else { return };
    match tree.kind(p) {
        NodeKind::Bounds => {
            gather_scopes_for_youngest(tree, tree.sub(p), list);
        }
        NodeKind::Indicant => {
            if let Some(moid) = tree.moid(p) {
                if tree.modes.has_rows(moid) && no_ref {
                    if let Some(tag) = tree.tax(p) {
                        let level = tree.tag(tag).tag_lex_level;
                        scope_list::add(list, p, scope_list::make_tuple(level, false));
                    }
                }
            }
        }
        NodeKind::RefSymbol => {
            get_declarer_elements(tree, tree.next(p), list, false);
        }
        NodeKind::ProcSymbol | NodeKind::UnionSymbol => {
            // Opaque: procedure and union declarers contribute nothing.
        }
        _ => {
            get_declarer_elements(tree, tree.sub(p), list, no_ref);
            get_declarer_elements(tree, tree.next(p), list, no_ref);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use crate::tag::{Priority, Storage, Tag};

    fn program_tag(tree: &mut Tree, level: u32, name: &str) -> crate::tag::TagId {
        let sym = tree.interner.intern(name);
        tree.alloc_tag(Tag::new(sym, level, Priority::Normal, Storage::Loc, None))
    }

    #[test]
    fn routine_text_with_no_free_identifiers_has_primal_environ() {
        let mut tree = Tree::new();
        let table = tree.alloc_table(0, None);
        let routine_tag = program_tag(&mut tree, 0, "square");

        let text = tree.alloc_node(NodeKind::RoutineText, table, 1);
        tree.set_tax(text, routine_tag);
        let body = tree.alloc_node(NodeKind::Denotation, table, 1);
        tree.set_sub(text, body);

        get_youngest_environs(&mut tree, Some(text));
        assert_eq!(tree.tag(routine_tag).youngest_environ, scope_list::PRIMAL_SCOPE);
    }

    #[test]
    fn routine_text_capturing_outer_identifier() {
        let mut tree = Tree::new();
        let outer_table = tree.alloc_table(0, None);
        let routine_tag = program_tag(&mut tree, 1, "p");
        let k_tag = program_tag(&mut tree, 0, "k");

        let text = tree.alloc_node(NodeKind::RoutineText, outer_table, 1);
        tree.set_tax(text, routine_tag);
        let ident = tree.alloc_node(NodeKind::Identifier, outer_table, 1);
        tree.set_tax(ident, k_tag);
        tree.set_sub(text, ident);

        get_youngest_environs(&mut tree, Some(text));
        assert_eq!(tree.tag(routine_tag).youngest_environ, 0);
    }

    #[test]
    fn nested_routine_text_splices_inner_free_use_outward() {
        let mut tree = Tree::new();
        let outer_table = tree.alloc_table(0, None);
        let outer_tag = program_tag(&mut tree, 1, "outer");
        let inner_tag = program_tag(&mut tree, 2, "inner");
        let k_tag = program_tag(&mut tree, 0, "k");

        let outer_text = tree.alloc_node(NodeKind::RoutineText, outer_table, 1);
        tree.set_tax(outer_text, outer_tag);

        let inner_text = tree.alloc_node(NodeKind::RoutineText, outer_table, 2);
        tree.set_tax(inner_text, inner_tag);
        let ident = tree.alloc_node(NodeKind::Identifier, outer_table, 2);
        tree.set_tax(ident, k_tag);
        tree.set_sub(inner_text, ident);
        tree.set_sub(outer_text, inner_text);

        get_youngest_environs(&mut tree, Some(outer_text));
        assert_eq!(tree.tag(inner_tag).youngest_environ, 0);
        assert_eq!(tree.tag(outer_tag).youngest_environ, 0);
    }

    #[test]
    fn interner_smoke() {
        let mut i = Interner::new();
        assert_eq!(i.intern("x"), i.intern("x"));
    }
}
