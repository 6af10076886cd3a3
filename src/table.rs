//! Symbol tables: the `PREVIOUS`-linked chain of declaration scopes the
//! parser built, and the "emptiness" predicate the non-local environ pass
//! (§4.3) relies on.

use crate::arena::Id;
use crate::tag::{Priority, TagId};

pub type TableId = Id<SymbolTable>;

/// A lexical scope's set of declarations.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    pub level: u32,
    pub previous: Option<TableId>,
    pub identifiers: Vec<TagId>,
    pub operators: Vec<TagId>,
    pub indicants: Vec<TagId>,
}

impl SymbolTable {
    pub fn root(level: u32) -> Self {
        SymbolTable {
            level,
            previous: None,
            identifiers: Vec::new(),
            operators: Vec::new(),
            indicants: Vec::new(),
        }
    }

    pub fn child(level: u32, previous: TableId) -> Self {
        SymbolTable {
            level,
            previous: Some(previous),
            identifiers: Vec::new(),
            operators: Vec::new(),
            indicants: Vec::new(),
        }
    }

    /// A table is empty for checker purposes if it declares nothing
    /// meaningful: no identifiers, or a single loop-counter/specifier
    /// identifier and nothing else.
    ///
    /// Takes a priority lookup rather than the tag arena directly so this
    /// method stays free of a dependency on `Tree`.
    pub fn is_empty_for_scope(&self, priority_of: impl Fn(TagId) -> Priority) -> bool {
        if !self.operators.is_empty() || !self.indicants.is_empty() {
            return false;
        }
        match self.identifiers.as_slice() {
            [] => true,
            [only] => matches!(priority_of(*only), Priority::Loop | Priority::Specifier),
            _ => false,
        }
    }
}
