//! Scope-list primitives (§4.1): the `(level, transient)` tuples collected
//! while evaluating one expression, and the checks run against them.
//!
//! A "null list" in the original is simply an empty, and typically
//! immediately dropped, `ScopeList` here — see the crate-level docs on why
//! an out-parameter was not carried forward as a reference.

use crate::diagnostic::{DiagnosticCode, Diagnostics};
use crate::node::NodeId;
use crate::tree::Tree;

/// The outermost level: older than any user block.
pub const PRIMAL_SCOPE: u32 = 0;

/// Used as +∞ in youngest-outside queries.
pub const MAX_SCOPE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeTuple {
    pub level: u32,
    pub transient: bool,
}

impl ScopeTuple {
    pub fn primal() -> Self {
        ScopeTuple {
            level: PRIMAL_SCOPE,
            transient: false,
        }
    }
}

pub fn make_tuple(level: u32, transient: bool) -> ScopeTuple {
    ScopeTuple { level, transient }
}

#[derive(Debug, Clone, Copy)]
pub struct ScopeEntry {
    pub node: NodeId,
    pub tuple: ScopeTuple,
}

/// An ordered list of `(node, tuple)` records accumulated while evaluating
/// one expression. Plain `Vec` — see the module doc and SPEC_FULL.md §5/§9
/// for why this isn't arena-backed.
pub type ScopeList = Vec<ScopeEntry>;

/// Appends a record. A literal "null list" doesn't exist in this
/// representation; callers that want to discard a contribution just don't
/// call `add` with it, or drop the list once built.
pub fn add(list: &mut ScopeList, node: NodeId, tuple: ScopeTuple) {
    list.push(ScopeEntry { node, tuple });
}

/// Returns the record whose level is maximal among those `<= threshold`; if
/// none qualifies, returns `(PRIMAL_SCOPE, false)`.
pub fn find_youngest_outside(list: &ScopeList, threshold: u32) -> ScopeTuple {
    let mut best = ScopeTuple::primal();
    for entry in list {
        if entry.tuple.level <= threshold && entry.tuple.level > best.level {
            best = entry.tuple;
        }
    }
    best
}

/// `find_youngest_outside(list, +∞)`.
pub fn find_youngest(list: &ScopeList) -> ScopeTuple {
    find_youngest_outside(list, MAX_SCOPE)
}

/// Verifies every entry of `list` against a single `destination_level`.
///
/// When `check_transient` is set, every transient entry is an unconditional
/// `TRANSIENT_NAME` error. Every entry younger than `destination_level` is
/// at best a warning (only for aliasing-capable modes — reference,
/// procedure, format, union) and at worst silently masked with no message
/// (§9 Open Questions: implemented as specified, flagged for review).
///
/// Returns `true` iff nothing was flagged.
pub fn check(
    tree: &mut Tree,
    diagnostics: &mut Diagnostics,
    list: &ScopeList,
    check_transient: bool,
    destination_level: u32,
) -> bool {
    let mut ok = true;

    if check_transient {
        for entry in list {
            if entry.tuple.transient {
                diagnostics.error(
                    DiagnosticCode::TransientName,
                    entry.node,
                    "transient value would be stored in a name that outlives it",
                );
                tree.set_scope_error(entry.node);
                ok = false;
            }
        }
    }

    for entry in list {
        if entry.tuple.level > destination_level && !tree.has_scope_error(entry.node) {
            if let Some(moid) = tree.moid(entry.node) {
                if tree.is_reference(moid)
                    || tree.is_procedure(moid)
                    || tree.is_format(moid)
                    || tree.is_union(moid)
                {
                    let kind = tree.kind(entry.node);
                    diagnostics.warning(
                        DiagnosticCode::ScopeStatic,
                        entry.node,
                        "value's scope is younger than its destination; confirmed at run time",
                        Some(moid),
                        Some(kind),
                    );
                }
            }
            tree.set_scope_error(entry.node);
            ok = false;
        }
    }

    ok
}

/// Folds `check` over every destination in `destinations`, ANDing the
/// results. Every destination is checked regardless of earlier outcomes —
/// each independently records its own diagnostics.
pub fn check_multiple(
    tree: &mut Tree,
    diagnostics: &mut Diagnostics,
    list: &ScopeList,
    check_transient: bool,
    destinations: &ScopeList,
) -> bool {
    let mut ok = true;
    for destination in destinations {
        ok &= check(tree, diagnostics, list, check_transient, destination.tuple.level);
    }
    ok
}
