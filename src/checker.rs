//! Top-level orchestration (§4.6): runs the four passes over a parsed tree
//! in the fixed order the later passes depend on.

use crate::bind::bind_scope_to_tags;
use crate::diagnostic::Diagnostics;
use crate::environ::get_youngest_environs;
use crate::non_local::get_non_local_environs;
use crate::node::NodeId;
use crate::scope_list::PRIMAL_SCOPE;
use crate::tree::Tree;
use crate::walker::scope_enclosed_clause;

/// Runs the full scope-checking pipeline over the subtree rooted at `root`,
/// accumulating every finding into `diagnostics`.
///
/// Order matters: routine/format texts must have their youngest environ
/// before non-local environs are computed (the non-local pass treats a
/// routine/format body as a fresh frame), and both must be in place before
/// tag binding; only then can the statement walker trust `SCOPE`/
/// `SCOPE_ASSIGNED` on every `PROC`/`FORMAT` identity it meets.
pub fn scope_checker(tree: &mut Tree, diagnostics: &mut Diagnostics, root: NodeId) {
    get_youngest_environs(tree, Some(root));
    get_non_local_environs(tree, Some(root), PRIMAL_SCOPE);
    bind_scope_to_tags(tree, Some(root));
    scope_enclosed_clause(tree, diagnostics, tree.sub(root));
}
