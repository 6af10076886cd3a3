//! The statement/coercion walker (§4.5): the bulk of the checker. Computes a
//! `ScopeList` for every expression, threading it through coercions,
//! formulas, routine texts and every enclosed-clause shape, checking
//! transience and escape at each destination along the way.
//!
//! This tree elides grammar-keyword leaves that carry no decoration of their
//! own (`ASSIGN_SYMBOL`, `IF`/`THEN`/`DO`/format delimiters, and similar).
//! Where the original reaches past such a keyword with a `NEXT_SUB`/`SUB_NEXT`
//! hop, the corresponding node here holds its content directly as a child —
//! e.g. `Assignation`'s two children are destination and value with no
//! `:=` node between them, and a `Slice`'s second child is the `Bounds` node
//! carrying its subscript units directly. `Bounds` is reused as the generic
//! parenthesized-unit-list shape for both declarer bounds and call
//! arguments, since this tree tracks only scope-relevant structure, not full
//! concrete syntax.

use crate::diagnostic::{DiagnosticCode, Diagnostics};
use crate::node::{NodeId, NodeKind};
use crate::scope_list::{self, ScopeList};
use crate::tag::TagId;
use crate::tree::Tree;

// -- declarations ---------------------------------------------------------

pub fn scope_bounds(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) {
    let mut cur = start;
    while let Some(p) = cur {
        if tree.kind(p) == NodeKind::Unit {
            scope_statement(tree, diagnostics, p);
        } else {
            scope_bounds(tree, diagnostics, tree.sub(p));
        }
        cur = tree.next(p);
    }
}

pub fn scope_declarer(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) {
    let Some(p) = start else { return };
    match tree.kind(p) {
        NodeKind::Bounds => scope_bounds(tree, diagnostics, tree.sub(p)),
        NodeKind::Indicant => {}
        NodeKind::RefSymbol => scope_declarer(tree, diagnostics, tree.next(p)),
        NodeKind::ProcSymbol | NodeKind::UnionSymbol => {}
        _ => {
            scope_declarer(tree, diagnostics, tree.sub(p));
            scope_declarer(tree, diagnostics, tree.next(p));
        }
    }
}

/// Finds a declaration's defining identifier, then evaluates its bound unit
/// and checks it against the declaration's own level. Returns `true` once a
/// defining identifier has been handled, so recursion through nested
/// `SUB`-calls stops the whole walk — mirroring the original's unconditional
/// `return` once the (single, upstream-flattened) identifier is found.
pub fn scope_identity_declaration(
    tree: &mut Tree,
    diagnostics: &mut Diagnostics,
    start: Option<NodeId>,
) -> bool {
    let mut cur = start;
    while let Some(p) = cur {
        if scope_identity_declaration(tree, diagnostics, tree.sub(p)) {
            return true;
        }
        if tree.kind(p) == NodeKind::DefiningIdentifier {
            if let Some(unit) = tree.next(p).and_then(|n| tree.next(n)) {
                if let Some(tag_id) = tree.tax(p) {
                    let is_proc = tree.tag(tag_id).moid.is_some_and(|m| tree.is_procedure(m));
                    if !is_proc {
                        check_identifier_usage(tree, diagnostics, tag_id, Some(unit));
                    }
                }
                let s = scope_statement(tree, diagnostics, unit);
                scope_list::check(tree, diagnostics, &s, true, tree.lex_level(p));
                let tup = scope_list::find_youngest(&s);
                if let Some(tag_id) = tree.tax(p) {
                    if tup.level < tree.lex_level(p) {
                        let tag = tree.tag_mut(tag_id);
                        tag.scope = tup.level;
                        tag.scope_assigned = true;
                    }
                }
                tree.set_interruptible(unit);
            }
            return true;
        }
        cur = tree.next(p);
    }
    false
}

pub fn scope_variable_declaration(
    tree: &mut Tree,
    diagnostics: &mut Diagnostics,
    start: Option<NodeId>,
) -> bool {
    let mut cur = start;
    while let Some(p) = cur {
        if scope_variable_declaration(tree, diagnostics, tree.sub(p)) {
            return true;
        }
        match tree.kind(p) {
            NodeKind::Declarer => scope_declarer(tree, diagnostics, tree.sub(p)),
            NodeKind::DefiningIdentifier => {
                if let Some(unit) = tree.next(p).and_then(|n| tree.next(n)) {
                    if let Some(tag_id) = tree.tax(p) {
                        check_identifier_usage(tree, diagnostics, tag_id, Some(unit));
                    }
                    let s = scope_statement(tree, diagnostics, unit);
                    scope_list::check(tree, diagnostics, &s, true, tree.lex_level(p));
                    tree.set_interruptible(unit);
                    return true;
                }
            }
            _ => {}
        }
        cur = tree.next(p);
    }
    false
}

pub fn scope_procedure_declaration(
    tree: &mut Tree,
    diagnostics: &mut Diagnostics,
    start: Option<NodeId>,
) -> bool {
    let mut cur = start;
    while let Some(p) = cur {
        if scope_procedure_declaration(tree, diagnostics, tree.sub(p)) {
            return true;
        }
        if matches!(tree.kind(p), NodeKind::DefiningIdentifier | NodeKind::DefiningOperator) {
            if let Some(unit) = tree.next(p).and_then(|n| tree.next(n)) {
                let s = scope_statement(tree, diagnostics, unit);
                scope_list::check(tree, diagnostics, &s, false, tree.lex_level(p));
                tree.set_interruptible(unit);
            }
            return true;
        }
        cur = tree.next(p);
    }
    false
}

pub fn scope_declaration_list(tree: &mut Tree, diagnostics: &mut Diagnostics, p: Option<NodeId>) {
    let Some(p) = p else { return };
    match tree.kind(p) {
        NodeKind::IdentityDeclaration => {
            scope_identity_declaration(tree, diagnostics, tree.sub(p));
        }
        NodeKind::VariableDeclaration => {
            scope_variable_declaration(tree, diagnostics, tree.sub(p));
        }
        NodeKind::ModeDeclaration => scope_declarer(tree, diagnostics, tree.sub(p)),
        NodeKind::PriorityDeclaration => {}
        NodeKind::ProcedureDeclaration
        | NodeKind::ProcedureVariableDeclaration
        | NodeKind::BriefOperatorDeclaration
        | NodeKind::OperatorDeclaration => {
            scope_procedure_declaration(tree, diagnostics, tree.sub(p));
        }
        _ => {
            scope_declaration_list(tree, diagnostics, tree.sub(p));
            scope_declaration_list(tree, diagnostics, tree.next(p));
        }
    }
}

pub fn scope_arguments(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) {
    let mut cur = start;
    while let Some(p) = cur {
        if tree.kind(p) == NodeKind::Unit {
            let s = scope_statement(tree, diagnostics, p);
            scope_list::check(tree, diagnostics, &s, true, tree.lex_level(p));
        } else {
            scope_arguments(tree, diagnostics, tree.sub(p));
        }
        cur = tree.next(p);
    }
}

/// Flags every occurrence of `tag` as an identifier within `start` — called
/// on an identity/variable declaration's own initializing unit to catch
/// `x = x + 1`-style self-reference before `x` is bound. Skipped upstream
/// for procedure-moded tags (recursive procedure definitions legitimately
/// refer to themselves).
pub fn check_identifier_usage(
    tree: &mut Tree,
    diagnostics: &mut Diagnostics,
    tag: TagId,
    start: Option<NodeId>,
) {
    let mut cur = start;
    while let Some(p) = cur {
        if tree.kind(p) == NodeKind::Identifier
            && tree.tax(p) == Some(tag)
            && !tree.tag(tag).moid.is_some_and(|m| tree.is_procedure(m))
        {
            diagnostics.warning(
                DiagnosticCode::Uninitialised,
                p,
                "identifier used before its declaration's value is bound",
                None,
                None,
            );
        }
        check_identifier_usage(tree, diagnostics, tag, tree.sub(p));
        cur = tree.next(p);
    }
}

// -- coercions / formulas ---------------------------------------------------

fn is_coercion(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Deproceduring
            | NodeKind::Dereferencing
            | NodeKind::Uniting
            | NodeKind::Rowing
            | NodeKind::Widening
            | NodeKind::Voiding
            | NodeKind::Proceduring
    )
}

pub fn scope_coercion(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    if !is_coercion(tree.kind(p)) {
        return scope_statement(tree, diagnostics, p);
    }
    match tree.kind(p) {
        NodeKind::Voiding | NodeKind::Dereferencing | NodeKind::Deproceduring => {
            if let Some(sub) = tree.sub(p) {
                scope_coercion(tree, diagnostics, sub);
            }
            Vec::new()
        }
        NodeKind::Rowing => {
            let sub = tree.sub(p).expect("ROWING always coerces a sub-expression");
            let z = scope_coercion(tree, diagnostics, sub);
            scope_list::check(tree, diagnostics, &z, true, tree.lex_level(p));
            let mut s = ScopeList::new();
            let transient = tree.moid(sub).is_some_and(|m| tree.is_ref_flex(m));
            scope_list::add(&mut s, p, scope_list::make_tuple(tree.lex_level(p), transient));
            s
        }
        NodeKind::Proceduring => {
            // A PROCEDURING coercion can only wrap a JUMP.
            let jump = tree.sub(p).expect("PROCEDURING always wraps a jump");
            let mut q = tree.sub(jump).expect("a jump always names a label");
            if tree.kind(q) == NodeKind::GotoSymbol {
                q = tree.next(q).expect("GOTO_SYMBOL is followed by a label");
            }
            let mut s = ScopeList::new();
            let level = tree.tax(q).map_or(0, |t| tree.tag(t).tag_lex_level);
            scope_list::add(&mut s, q, scope_list::make_tuple(level, false));
            s
        }
        NodeKind::Uniting => {
            let sub = tree.sub(p).expect("UNITING always coerces a sub-expression");
            let z = scope_coercion(tree, diagnostics, sub);
            if z.is_empty() {
                Vec::new()
            } else {
                scope_list::check(tree, diagnostics, &z, true, tree.lex_level(p));
                let mut s = ScopeList::new();
                scope_list::add(&mut s, p, scope_list::find_youngest(&z));
                s
            }
        }
        // WIDENING, and anything else classed as a coercion: transparent.
        _ => tree.sub(p).map_or_else(Vec::new, |sub| scope_coercion(tree, diagnostics, sub)),
    }
}

fn scope_format_text(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) -> ScopeList {
    let mut s = ScopeList::new();
    let mut cur = start;
    while let Some(p) = cur {
        match tree.kind(p) {
            NodeKind::FormatPattern | NodeKind::DynamicReplicator => {
                if let Some(content) = tree.sub(p) {
                    s.extend(scope_enclosed_clause(tree, diagnostics, Some(content)));
                }
            }
            NodeKind::FormatItemG => {
                if let Some(content) = tree.next(p) {
                    s.extend(scope_enclosed_clause(tree, diagnostics, Some(content)));
                }
            }
            _ => {
                s.extend(scope_format_text(tree, diagnostics, tree.sub(p)));
            }
        }
        cur = tree.next(p);
    }
    s
}

fn scope_operand(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    match tree.kind(p) {
        NodeKind::MonadicFormula => {
            let op = tree.sub(p).expect("a monadic formula always has an operator");
            let operand = tree.next(op).expect("a monadic formula always has an operand");
            scope_operand(tree, diagnostics, operand)
        }
        NodeKind::Formula => scope_formula(tree, diagnostics, p),
        NodeKind::Secondary => {
            if let Some(sub) = tree.sub(p) {
                scope_statement(tree, diagnostics, sub)
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// A formula checks both its operands for transience and escape at its own
/// level but — deliberately, per the original — contributes nothing to the
/// caller's list. A binary formula's result is always a fresh value, never
/// an alias of either operand, so there is nothing further to propagate.
fn scope_formula(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let q = tree.sub(p).expect("a formula always has a left operand");
    let s2 = scope_operand(tree, diagnostics, q);
    scope_list::check(tree, diagnostics, &s2, true, tree.lex_level(p));
    if let Some(op) = tree.next(q) {
        if let Some(right) = tree.next(op) {
            let s3 = scope_operand(tree, diagnostics, right);
            scope_list::check(tree, diagnostics, &s3, true, tree.lex_level(p));
        }
    }
    Vec::new()
}

fn scope_routine_text(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let q = tree.sub(p).expect("a routine text always has a header/body chain");
    let routine = if tree.kind(q) == NodeKind::ParameterPack {
        tree.next(q).expect("a parameter pack is followed by the routine body")
    } else {
        q
    };
    if let Some(body) = tree.next(routine).and_then(|n| tree.next(n)) {
        let x = scope_statement(tree, diagnostics, body);
        scope_list::check(tree, diagnostics, &x, true, tree.lex_level(p));
    }
    let mut s = ScopeList::new();
    if let Some(tag) = tree.tax(p) {
        let environ = tree.tag(tag).youngest_environ;
        scope_list::add(&mut s, p, scope_list::make_tuple(environ, false));
    }
    s
}

// -- the statement dispatcher -----------------------------------------------

pub fn scope_statement(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    if is_coercion(tree.kind(p)) {
        return scope_coercion(tree, diagnostics, p);
    }
    match tree.kind(p) {
        NodeKind::Primary | NodeKind::Secondary | NodeKind::Tertiary | NodeKind::Unit => tree
            .sub(p)
            .map_or_else(Vec::new, |sub| scope_statement(tree, diagnostics, sub)),
        NodeKind::Nihil => {
            let mut s = ScopeList::new();
            scope_list::add(&mut s, p, scope_list::ScopeTuple::primal());
            s
        }
        NodeKind::Identifier => scope_identifier(tree, p),
        NodeKind::EnclosedClause => scope_enclosed_clause(tree, diagnostics, tree.sub(p)),
        NodeKind::Call => scope_call(tree, diagnostics, p),
        NodeKind::Slice => scope_slice(tree, diagnostics, p),
        NodeKind::FormatText => {
            let x = scope_format_text(tree, diagnostics, tree.sub(p));
            let mut s = ScopeList::new();
            scope_list::add(&mut s, p, scope_list::find_youngest(&x));
            s
        }
        NodeKind::Cast => {
            let content = tree.sub(p).and_then(|sub| tree.next(sub));
            let x = scope_enclosed_clause(tree, diagnostics, content);
            scope_list::check(tree, diagnostics, &x, false, tree.lex_level(p));
            let mut s = ScopeList::new();
            scope_list::add(&mut s, p, scope_list::find_youngest(&x));
            s
        }
        NodeKind::Selection => scope_selection(tree, diagnostics, p),
        NodeKind::Generator => scope_generator(tree, diagnostics, p),
        NodeKind::DiagonalFunction | NodeKind::RowFunction | NodeKind::ColumnFunction => {
            scope_indexing_function(tree, diagnostics, p)
        }
        NodeKind::TransposeFunction => {
            let operand = tree.sub(p).expect("a transpose function always has an operand");
            let ns = scope_statement(tree, diagnostics, operand);
            scope_list::check(tree, diagnostics, &ns, false, tree.lex_level(p));
            let mut s = ScopeList::new();
            scope_list::add(&mut s, p, scope_list::find_youngest(&ns));
            s
        }
        NodeKind::Formula => scope_formula(tree, diagnostics, p),
        NodeKind::Assignation => scope_assignation(tree, diagnostics, p),
        NodeKind::RoutineText => scope_routine_text(tree, diagnostics, p),
        NodeKind::IdentityRelation | NodeKind::AndFunction | NodeKind::OrFunction => {
            let left = tree.sub(p).expect("has a left operand");
            let right = tree.sub(p).and_then(|l| tree.next(l)).expect("has a right operand");
            let mut n = scope_statement(tree, diagnostics, left);
            n.extend(scope_statement(tree, diagnostics, right));
            scope_list::check(tree, diagnostics, &n, false, tree.lex_level(p));
            Vec::new()
        }
        NodeKind::Assertion => {
            let content = tree.sub(p).and_then(|sub| tree.next(sub));
            let n = scope_enclosed_clause(tree, diagnostics, content);
            scope_list::check(tree, diagnostics, &n, false, tree.lex_level(p));
            Vec::new()
        }
        // DENOTATION, JUMP, SKIP, MONADIC_FORMULA (reached only via scope_operand
        // in practice) and anything else contribute nothing: the result is
        // always a freshly made value, not an alias of anything scoped.
        _ => Vec::new(),
    }
}

fn scope_identifier(tree: &Tree, p: NodeId) -> ScopeList {
    let mut s = ScopeList::new();
    let Some(moid) = tree.moid(p) else { return s };
    let Some(tag) = tree.tax(p) else { return s };
    if tree.is_reference(moid) {
        let tagr = tree.tag(tag);
        let tuple = if tagr.priority == crate::tag::Priority::Parameter {
            scope_list::make_tuple(tagr.tag_lex_level.saturating_sub(1), false)
        } else if tagr.storage == crate::tag::Storage::Heap {
            scope_list::ScopeTuple::primal()
        } else if tagr.scope_assigned {
            scope_list::make_tuple(tagr.scope, false)
        } else {
            scope_list::make_tuple(tagr.tag_lex_level, false)
        };
        scope_list::add(&mut s, p, tuple);
    } else if tree.is_procedure(moid) && tree.tag(tag).scope_assigned {
        scope_list::add(&mut s, p, scope_list::make_tuple(tree.tag(tag).scope, false));
    } else if tree.is_format(moid) && tree.tag(tag).scope_assigned {
        scope_list::add(&mut s, p, scope_list::make_tuple(tree.tag(tag).scope, false));
    }
    s
}

fn scope_call(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let callee = tree.sub(p).expect("a call always names a callee");
    let x = scope_statement(tree, diagnostics, callee);
    scope_list::check(tree, diagnostics, &x, false, tree.lex_level(p));
    if let Some(args) = tree.next(callee) {
        scope_arguments(tree, diagnostics, tree.sub(args));
    }
    Vec::new()
}

fn scope_slice(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let base = tree.sub(p).expect("a slice always has a base");
    let mut s = ScopeList::new();
    let mut x = ScopeList::new();
    let base_moid = tree.moid(base);

    if base_moid.is_some_and(|m| tree.is_reference(m)) {
        let nested_slice_of_slice = tree.kind(base) == NodeKind::Primary
            && tree.sub(base).is_some_and(|bb| tree.kind(bb) == NodeKind::Slice);
        if nested_slice_of_slice {
            let inner = scope_statement(tree, diagnostics, base);
            s.extend(inner);
        } else {
            x = scope_statement(tree, diagnostics, base);
            scope_list::check(tree, diagnostics, &x, false, tree.lex_level(p));
        }
        if let Some(m) = base_moid {
            if tree.is_ref_flex(m) {
                scope_list::add(&mut s, base, scope_list::make_tuple(tree.lex_level(p), true));
            }
        }
        if let Some(bounds) = tree.next(base) {
            scope_bounds(tree, diagnostics, tree.sub(bounds));
        }
    }

    if tree.moid(p).is_some_and(|m| tree.is_reference(m)) {
        scope_list::add(&mut s, p, scope_list::find_youngest(&x));
    }
    s
}

fn scope_selection(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let selected = tree.sub(p).and_then(|sub| tree.next(sub)).expect("a selection names a field and a value");
    let ns = scope_statement(tree, diagnostics, selected);
    scope_list::check(tree, diagnostics, &ns, false, tree.lex_level(p));
    let mut s = ScopeList::new();
    if tree.moid(selected).is_some_and(|m| tree.is_ref_to_ref_or_flex(m)) {
        scope_list::add(&mut s, p, scope_list::make_tuple(tree.lex_level(p), true));
    }
    scope_list::add(&mut s, p, scope_list::find_youngest(&ns));
    s
}

fn scope_generator(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let keyword = tree.sub(p).expect("a generator always starts with LOC/HEAP");
    let mut s = ScopeList::new();
    if tree.kind(keyword) == NodeKind::LocSymbol {
        if let Some(non_local) = tree.non_local(p) {
            scope_list::add(&mut s, p, scope_list::make_tuple(tree.table(non_local).level, false));
        } else {
            scope_list::add(&mut s, p, scope_list::make_tuple(tree.lex_level(p), false));
        }
    } else {
        scope_list::add(&mut s, p, scope_list::ScopeTuple::primal());
    }
    if let Some(declarer) = tree.next(keyword) {
        scope_declarer(tree, diagnostics, tree.sub(declarer));
    }
    s
}

/// Shared shape for `DIAGONAL`/`ROW`/`COLUMN FUNCTION`: an optional leading
/// index `TERTIARY`, then the matrix/row operand.
fn scope_indexing_function(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let q = tree.sub(p).expect("always has at least the operand");
    let operand = if tree.kind(q) == NodeKind::Tertiary {
        if let Some(sub) = tree.sub(q) {
            let ns = scope_statement(tree, diagnostics, sub);
            scope_list::check(tree, diagnostics, &ns, false, tree.lex_level(q));
        }
        tree.next(q).expect("an index tertiary is followed by the operand")
    } else {
        q
    };
    let ns = scope_statement(tree, diagnostics, operand);
    scope_list::check(tree, diagnostics, &ns, false, tree.lex_level(p));
    let mut s = ScopeList::new();
    scope_list::add(&mut s, p, scope_list::find_youngest(&ns));
    s
}

fn scope_assignation(tree: &mut Tree, diagnostics: &mut Diagnostics, p: NodeId) -> ScopeList {
    let dest = tree.sub(p).expect("an assignation always has a destination");
    let value = tree.next(dest).expect("an assignation always has a value");
    let nd = scope_statement(tree, diagnostics, dest);
    let ns = scope_statement(tree, diagnostics, value);
    scope_list::check_multiple(tree, diagnostics, &ns, true, &nd);
    let tup = scope_list::find_youngest(&nd);
    let mut s = ScopeList::new();
    scope_list::add(&mut s, p, scope_list::make_tuple(tup.level, false));
    s
}

// -- statement lists / serial clauses ---------------------------------------

fn scope_statement_list(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) -> ScopeList {
    let mut s = ScopeList::new();
    let mut cur = start;
    while let Some(p) = cur {
        if tree.kind(p) == NodeKind::Unit {
            tree.set_interruptible(p);
            s.extend(scope_statement(tree, diagnostics, p));
        } else {
            s.extend(scope_statement_list(tree, diagnostics, tree.sub(p)));
        }
        cur = tree.next(p);
    }
    s
}

fn scope_serial_clause(
    tree: &mut Tree,
    diagnostics: &mut Diagnostics,
    start: Option<NodeId>,
    terminator: bool,
) -> ScopeList {
    let Some(p) = start else { return Vec::new() };
    match tree.kind(p) {
        NodeKind::InitialiserSeries => {
            let mut s = scope_serial_clause(tree, diagnostics, tree.sub(p), false);
            s.extend(scope_serial_clause(tree, diagnostics, tree.next(p), terminator));
            s
        }
        NodeKind::DeclarationList => {
            scope_declaration_list(tree, diagnostics, tree.sub(p));
            Vec::new()
        }
        NodeKind::Label | NodeKind::SemiSymbol | NodeKind::ExitSymbol => {
            scope_serial_clause(tree, diagnostics, tree.next(p), terminator)
        }
        NodeKind::SerialClause | NodeKind::EnquiryClause => {
            let local_terminator = match tree.next(p) {
                Some(next) => matches!(
                    tree.kind(next),
                    NodeKind::ExitSymbol | NodeKind::EndSymbol | NodeKind::CloseSymbol
                ),
                None => true,
            };
            let mut s = scope_serial_clause(tree, diagnostics, tree.sub(p), local_terminator);
            s.extend(scope_serial_clause(tree, diagnostics, tree.next(p), terminator));
            s
        }
        NodeKind::LabeledUnit => scope_serial_clause(tree, diagnostics, tree.sub(p), terminator),
        NodeKind::Unit => {
            tree.set_interruptible(p);
            if terminator {
                scope_statement(tree, diagnostics, p)
            } else {
                scope_statement(tree, diagnostics, p);
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn scope_closed_clause(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) -> ScopeList {
    let Some(p) = start else { return Vec::new() };
    match tree.kind(p) {
        NodeKind::SerialClause => scope_serial_clause(tree, diagnostics, Some(p), true),
        NodeKind::OpenSymbol | NodeKind::BeginSymbol => {
            scope_closed_clause(tree, diagnostics, tree.next(p))
        }
        _ => Vec::new(),
    }
}

fn scope_collateral_clause(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) -> ScopeList {
    let Some(p) = start else { return Vec::new() };
    if matches!(
        tree.kind(p),
        NodeKind::BeginSymbol | NodeKind::EndSymbol | NodeKind::OpenSymbol | NodeKind::CloseSymbol
    ) {
        Vec::new()
    } else {
        scope_statement_list(tree, diagnostics, Some(p))
    }
}

/// `p` is the first of a 3-part chain: condition, then-branch, optional tail
/// (`ElsePart`/`ElifPart`/`BriefElifPart`).
fn scope_conditional_clause(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) -> ScopeList {
    let Some(condition) = start else { return Vec::new() };
    scope_serial_clause(tree, diagnostics, Some(condition), true);
    let Some(then_branch) = tree.next(condition) else { return Vec::new() };
    let mut s = scope_serial_clause(tree, diagnostics, Some(then_branch), true);
    if let Some(tail) = tree.next(then_branch) {
        match tree.kind(tail) {
            NodeKind::ElsePart | NodeKind::ChoicePart => {
                s.extend(scope_serial_clause(tree, diagnostics, tree.sub(tail), true));
            }
            NodeKind::ElifPart | NodeKind::BriefElifPart => {
                s.extend(scope_conditional_clause(tree, diagnostics, tree.sub(tail)));
            }
            _ => {}
        }
    }
    s
}

/// `p` is the first of a 3-part chain: selector, branch list, optional tail.
fn scope_case_clause(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) -> ScopeList {
    let Some(selector) = start else { return Vec::new() };
    let n = scope_serial_clause(tree, diagnostics, Some(selector), true);
    scope_list::check(tree, diagnostics, &n, false, tree.lex_level(selector));
    let Some(branches) = tree.next(selector) else { return Vec::new() };
    let mut s = scope_statement_list(tree, diagnostics, Some(branches));
    if let Some(tail) = tree.next(branches) {
        match tree.kind(tail) {
            NodeKind::OutPart | NodeKind::ChoicePart => {
                s.extend(scope_serial_clause(tree, diagnostics, tree.sub(tail), true));
            }
            NodeKind::CaseOusePart
            | NodeKind::BriefOusePart
            | NodeKind::ConformityOusePart
            | NodeKind::BriefConformityOusePart => {
                s.extend(scope_case_clause(tree, diagnostics, tree.sub(tail)));
            }
            _ => {}
        }
    }
    s
}

fn scope_loop_clause(tree: &mut Tree, diagnostics: &mut Diagnostics, start: Option<NodeId>) {
    let Some(p) = start else { return };
    match tree.kind(p) {
        NodeKind::ForPart => scope_loop_clause(tree, diagnostics, tree.next(p)),
        NodeKind::FromPart | NodeKind::ByPart | NodeKind::ToPart => {
            if let Some(unit) = tree.sub(p) {
                scope_statement(tree, diagnostics, unit);
            }
            scope_loop_clause(tree, diagnostics, tree.next(p));
        }
        NodeKind::WhilePart => {
            scope_serial_clause(tree, diagnostics, tree.sub(p), true);
            scope_loop_clause(tree, diagnostics, tree.next(p));
        }
        NodeKind::DoPart | NodeKind::AltDoPart => {
            let body = tree.sub(p);
            let until = match body {
                Some(b) if tree.kind(b) == NodeKind::SerialClause => {
                    scope_serial_clause(tree, diagnostics, Some(b), true);
                    tree.next(b)
                }
                other => other,
            };
            if let Some(u) = until {
                if tree.kind(u) == NodeKind::UntilPart {
                    scope_serial_clause(tree, diagnostics, tree.sub(u), true);
                }
            }
        }
        _ => {}
    }
}

pub fn scope_enclosed_clause(tree: &mut Tree, diagnostics: &mut Diagnostics, p: Option<NodeId>) -> ScopeList {
    let Some(p) = p else { return Vec::new() };
    match tree.kind(p) {
        NodeKind::EnclosedClause => scope_enclosed_clause(tree, diagnostics, tree.sub(p)),
        NodeKind::ClosedClause => scope_closed_clause(tree, diagnostics, tree.sub(p)),
        NodeKind::CollateralClause | NodeKind::ParallelClause => {
            scope_collateral_clause(tree, diagnostics, tree.sub(p))
        }
        NodeKind::ConditionalClause => scope_conditional_clause(tree, diagnostics, tree.sub(p)),
        NodeKind::CaseClause | NodeKind::ConformityClause => scope_case_clause(tree, diagnostics, tree.sub(p)),
        NodeKind::LoopClause => {
            scope_loop_clause(tree, diagnostics, tree.sub(p));
            Vec::new()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Diagnostics;
    use crate::mode::ModeKind;
    use crate::scope_list::PRIMAL_SCOPE;
    use crate::tag::{Priority, Storage, Tag};

    fn int_mode(tree: &mut Tree) -> crate::mode::ModeId {
        let name = tree.interner.intern("INT");
        tree.alloc_mode(ModeKind::Primitive(name))
    }

    #[test]
    fn bare_identifier_of_plain_ref_mode_contributes_its_tag_level() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(1, None);
        let int = int_mode(&mut tree);
        let refm = tree.alloc_mode(ModeKind::Ref(int));
        let sym = tree.interner.intern("x");
        let tag = tree.alloc_tag(Tag::new(sym, 1, Priority::Normal, Storage::Loc, None));
        let ident = tree.alloc_node(NodeKind::Identifier, table, 1);
        tree.set_moid(ident, refm);
        tree.set_tax(ident, tag);

        let s = scope_statement(&mut tree, &mut diagnostics, ident);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].tuple.level, 1);
    }

    #[test]
    fn heap_identifier_contributes_primal_scope() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(2, None);
        let int = int_mode(&mut tree);
        let refm = tree.alloc_mode(ModeKind::Ref(int));
        let sym = tree.interner.intern("h");
        let tag = tree.alloc_tag(Tag::new(sym, 2, Priority::Normal, Storage::Heap, None));
        let ident = tree.alloc_node(NodeKind::Identifier, table, 2);
        tree.set_moid(ident, refm);
        tree.set_tax(ident, tag);

        let s = scope_statement(&mut tree, &mut diagnostics, ident);
        assert_eq!(s[0].tuple.level, PRIMAL_SCOPE);
    }

    #[test]
    fn parameter_identifier_is_one_level_older_than_its_tag() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(3, None);
        let int = int_mode(&mut tree);
        let refm = tree.alloc_mode(ModeKind::Ref(int));
        let sym = tree.interner.intern("n");
        let tag = tree.alloc_tag(Tag::new(sym, 3, Priority::Parameter, Storage::Loc, None));
        let ident = tree.alloc_node(NodeKind::Identifier, table, 3);
        tree.set_moid(ident, refm);
        tree.set_tax(ident, tag);

        let s = scope_statement(&mut tree, &mut diagnostics, ident);
        assert_eq!(s[0].tuple.level, 2);
    }

    #[test]
    fn assignation_flags_transient_value_stored_in_older_name() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(2, None);
        let int = int_mode(&mut tree);
        let refm = tree.alloc_mode(ModeKind::Ref(int));

        let dest_sym = tree.interner.intern("outer_ref");
        let dest_tag = tree.alloc_tag(Tag::new(dest_sym, 0, Priority::Normal, Storage::Loc, None));
        let dest = tree.alloc_node(NodeKind::Identifier, table, 0);
        tree.set_moid(dest, refm);
        tree.set_tax(dest, dest_tag);

        // A value carrying a transient, nested-level tuple: a LOC generator at
        // level 2 would do, reusing the generator path directly.
        let gen_table = tree.alloc_table(2, None);
        let value = tree.alloc_node(NodeKind::Generator, gen_table, 2);
        let loc = tree.alloc_node(NodeKind::LocSymbol, gen_table, 2);
        let declarer = tree.alloc_node(NodeKind::Declarer, gen_table, 2);
        let indicant = tree.alloc_node(NodeKind::Indicant, gen_table, 2);
        tree.set_sub(declarer, indicant);
        tree.set_children(value, &[loc, declarer]);

        let assignation = tree.alloc_node(NodeKind::Assignation, table, 0);
        tree.set_children(assignation, &[dest, value]);

        scope_statement(&mut tree, &mut diagnostics, assignation);
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn routine_text_contributes_its_youngest_environ() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(0, None);
        let sym = tree.interner.intern("f");
        let tag = tree.alloc_tag(Tag::new(sym, 0, Priority::Normal, Storage::Loc, None));
        tree.tag_mut(tag).youngest_environ = 0;

        let body_table = tree.alloc_table(1, Some(table));
        let skip = tree.alloc_node(NodeKind::Skip, body_table, 1);
        let eq = tree.alloc_node(NodeKind::Denotation, body_table, 1);
        let text = tree.alloc_node(NodeKind::RoutineText, table, 1);
        tree.set_tax(text, tag);
        tree.set_children(text, &[skip, eq]);

        let s = scope_statement(&mut tree, &mut diagnostics, text);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].tuple.level, PRIMAL_SCOPE);
    }

    #[test]
    fn rowing_a_ref_flex_result_is_transient() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(1, None);
        let int = int_mode(&mut tree);
        let flex = tree.alloc_mode(ModeKind::Flex(int));
        let refm = tree.alloc_mode(ModeKind::Ref(flex));

        let ident = tree.alloc_node(NodeKind::Identifier, table, 1);
        tree.set_moid(ident, refm);
        let sym = tree.interner.intern("v");
        let tag = tree.alloc_tag(Tag::new(sym, 1, Priority::Normal, Storage::Loc, None));
        tree.set_tax(ident, tag);

        let rowing = tree.alloc_node(NodeKind::Rowing, table, 1);
        tree.set_sub(rowing, ident);

        let s = scope_coercion(&mut tree, &mut diagnostics, rowing);
        assert_eq!(s.len(), 1);
        assert!(s[0].tuple.transient);
    }

    #[test]
    fn formula_never_propagates_to_the_caller() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(0, None);
        let left = tree.alloc_node(NodeKind::Secondary, table, 0);
        let denotation = tree.alloc_node(NodeKind::Denotation, table, 0);
        tree.set_sub(left, denotation);
        let formula = tree.alloc_node(NodeKind::Formula, table, 0);
        tree.set_sub(formula, left);

        let s = scope_statement(&mut tree, &mut diagnostics, formula);
        assert!(s.is_empty());
    }

    #[test]
    fn nested_declaration_list_recurses_through_both_children() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(0, None);
        let wrapper = tree.alloc_node(NodeKind::SerialClause, table, 0);
        let priority = tree.alloc_node(NodeKind::PriorityDeclaration, table, 0);
        let other = tree.alloc_node(NodeKind::PriorityDeclaration, table, 0);
        tree.set_children(wrapper, &[priority, other]);

        // Should not panic walking into both branches of the generic fallback.
        scope_declaration_list(&mut tree, &mut diagnostics, Some(wrapper));
    }

    #[test]
    fn check_identifier_usage_warns_on_self_reference() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(0, None);
        let int = int_mode(&mut tree);
        let sym = tree.interner.intern("x");
        let tag = tree.alloc_tag(Tag::new(sym, 0, Priority::Normal, Storage::Loc, Some(int)));

        let ident = tree.alloc_node(NodeKind::Identifier, table, 0);
        tree.set_tax(ident, tag);

        check_identifier_usage(&mut tree, &mut diagnostics, tag, Some(ident));
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn check_identifier_usage_skips_procedure_moded_tags() {
        let mut tree = Tree::new();
        let mut diagnostics = Diagnostics::new();
        let table = tree.alloc_table(0, None);
        let int = int_mode(&mut tree);
        let proc = tree.alloc_mode(ModeKind::Proc { params: Vec::new(), ret: int });
        let sym = tree.interner.intern("p");
        let tag = tree.alloc_tag(Tag::new(sym, 0, Priority::Normal, Storage::Loc, Some(proc)));

        let ident = tree.alloc_node(NodeKind::Identifier, table, 0);
        tree.set_tax(ident, tag);

        check_identifier_usage(&mut tree, &mut diagnostics, tag, Some(ident));
        assert!(diagnostics.is_empty());
    }
}
