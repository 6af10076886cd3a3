//! # a68-scope
//!
//! Static scope (extent) checker for Algol 68 Genie's decorated syntax tree.
//!
//! Given an already-parsed, already-moded tree, this crate assigns each
//! expression a lexical level, propagates those levels through coercions,
//! formulas, routine/format texts and enclosed clauses, and reports illegal
//! transient assignments and cross-scope escapes.
//!
//! ## Pipeline
//!
//! 1. **Youngest environs** ([`environ`]) — for every routine/format text,
//!    the greatest level of any free identifier, operator or
//!    bounds-carrying indicant it uses.
//! 2. **Non-local environs** ([`non_local`]) — for every node, the
//!    outermost table reachable through an unbroken run of empty tables.
//! 3. **Tag binding** ([`bind`]) — copies a routine/format text's youngest
//!    environ onto the identity/procedure tag it initializes.
//! 4. **Statement walk** ([`walker`]) — the main pass: computes a
//!    [`scope_list::ScopeList`] for every expression and checks it at every
//!    destination, via [`checker::scope_checker`].
//!
//! ## Quick start
//!
//! ```ignore
//! use a68_scope::{checker::scope_checker, diagnostic::Diagnostics, tree::Tree};
//!
//! let mut tree = Tree::new();
//! let mut diagnostics = Diagnostics::new();
//! // ... build or receive a parsed, moded tree, get its root NodeId ...
//! # let root = tree.alloc_node(a68_scope::node::NodeKind::Skip, tree.alloc_table(0, None), 0);
//! scope_checker(&mut tree, &mut diagnostics, root);
//! for diag in diagnostics.entries() {
//!     eprintln!("{:?}: {}", diag.severity, diag.message);
//! }
//! ```

pub mod arena;
pub mod intern;
pub mod span;

pub mod mode;
pub mod tag;
pub mod table;
pub mod node;
pub mod tree;

pub mod diagnostic;
pub mod scope_list;

pub mod environ;
pub mod non_local;
pub mod bind;
pub mod walker;
pub mod checker;

pub use checker::scope_checker;
pub use diagnostic::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use intern::{Interner, Symbol, SymbolEq};
pub use mode::{ModeArena, ModeId, ModeKind};
pub use node::{Node, NodeId, NodeKind, NodeStatus};
pub use scope_list::{ScopeEntry, ScopeList, ScopeTuple};
pub use table::{SymbolTable, TableId};
pub use tag::{Priority, Storage, Tag, TagId};
pub use tree::Tree;
