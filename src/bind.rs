//! Tag binder (§4.4): copies a routine/format text's computed youngest
//! environ into the `SCOPE` of the identity/procedure tag it initializes.

use crate::node::{NodeId, NodeKind};
use crate::tree::Tree;

/// Visits every identity/procedure declaration and binds its defining
/// identifier's tag, if the declaration's right-hand side is a routine or
/// format text.
pub fn bind_scope_to_tags(tree: &mut Tree, start: Option<NodeId>) {
    let mut cur = start;
    while let Some(p) = cur {
        match tree.kind(p) {
            NodeKind::IdentityDeclaration | NodeKind::ProcedureDeclaration => {
                bind_scope_to_tag(tree, tree.sub(p));
            }
            _ => bind_scope_to_tags(tree, tree.sub(p)),
        }
        cur = tree.next(p);
    }
}

/// Finds the declaration's defining identifier and, if the node two
/// siblings ahead is a matching routine/format text, binds `SCOPE` from the
/// text's tag. Only the first defining identifier found is bound — once one
/// is located (whether or not it turned out to be text-backed), the walk
/// stops, mirroring the upstream flattening that guarantees a declaration
/// has exactly one defining identifier reachable this way.
fn bind_scope_to_tag(tree: &mut Tree, start: Option<NodeId>) -> bool {
    let mut cur = start;
    while let Some(p) = cur {
        if tree.kind(p) == NodeKind::DefiningIdentifier {
            let wants_format = tree.moid(p).is_some_and(|m| tree.is_format(m));
            if let Some(next_next) = tree.next(p).and_then(|n| tree.next(n)) {
                let matches_text = if wants_format {
                    tree.kind(next_next) == NodeKind::FormatText
                } else {
                    tree.kind(next_next) == NodeKind::RoutineText
                };
                if matches_text {
                    bind_one(tree, p, next_next);
                }
            }
            return true;
        } else if bind_scope_to_tag(tree, tree.sub(p)) {
            return true;
        }
        cur = tree.next(p);
    }
    false
}

fn bind_one(tree: &mut Tree, defining_identifier: NodeId, text: NodeId) {
    if let (Some(id_tag), Some(text_tag)) = (tree.tax(defining_identifier), tree.tax(text)) {
        let environ = tree.tag(text_tag).youngest_environ;
        let tag = tree.tag_mut(id_tag);
        tag.scope = environ;
        tag.scope_assigned = true;
    }
}
