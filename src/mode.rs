//! Modes (Algol 68's term for types) and the structural predicates the
//! scope checker consults.
//!
//! This is not a mode equivalencer: callers that need two modes to compare
//! equal as the *same* mode must allocate them once and share the
//! [`ModeId`], exactly as the upstream mode resolver hands the real checker
//! already-unified mode descriptors.

use crate::arena::{Id, IndexArena};
use crate::intern::Symbol;

pub type ModeId = Id<ModeKind>;

/// The structural shape of a mode, to the extent the scope checker cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeKind {
    /// A primitive mode such as `INT`, `REAL`, `BOOL`, `CHAR`.
    Primitive(Symbol),
    /// `VOID`.
    Void,
    /// `REF m`.
    Ref(ModeId),
    /// `FLEX [] m` (a flexible row).
    Flex(ModeId),
    /// `[] m` (a fixed row).
    Row(ModeId),
    /// `PROC (params) ret`.
    Proc { params: Vec<ModeId>, ret: ModeId },
    /// A format mode (`FORMAT`).
    Format,
    /// `UNION (m1, m2, ...)`.
    Union(Vec<ModeId>),
}

pub struct ModeArena {
    arena: IndexArena<ModeKind>,
}

impl ModeArena {
    pub fn new() -> Self {
        ModeArena {
            arena: IndexArena::new(),
        }
    }

    pub fn alloc(&mut self, kind: ModeKind) -> ModeId {
        self.arena.alloc(kind)
    }

    pub fn get(&self, id: ModeId) -> &ModeKind {
        self.arena.get(id)
    }

    /// `m` denotes a reference (`REF ...`).
    pub fn is_reference(&self, id: ModeId) -> bool {
        matches!(self.get(id), ModeKind::Ref(_))
    }

    /// `m` denotes a procedure (`PROC ...`).
    pub fn is_procedure(&self, id: ModeId) -> bool {
        matches!(self.get(id), ModeKind::Proc { .. })
    }

    /// `m` denotes a format.
    pub fn is_format(&self, id: ModeId) -> bool {
        matches!(self.get(id), ModeKind::Format)
    }

    /// `m` denotes a union.
    pub fn is_union(&self, id: ModeId) -> bool {
        matches!(self.get(id), ModeKind::Union(_))
    }

    /// `m` has rows somewhere in its structure — used by the declarer walk
    /// (§4.2) to decide whether bounds expressions affect array lifetime.
    /// A `REF` suppresses its referent's contribution; callers that need
    /// that suppression apply it themselves (see `environ::get_declarer_elements`),
    /// since whether a `REF` layer should be peeled depends on the caller's
    /// traversal state, not on the mode alone.
    pub fn has_rows(&self, id: ModeId) -> bool {
        match self.get(id) {
            ModeKind::Row(_) | ModeKind::Flex(_) => true,
            ModeKind::Proc { ret, .. } => self.has_rows(*ret),
            ModeKind::Union(members) => members.iter().any(|m| self.has_rows(*m)),
            _ => false,
        }
    }

    /// `m` is `REF FLEX ...` — the mode slicing a flexible row through a
    /// reference yields; such slices are transient (§4.5 SLICE, §8).
    pub fn is_ref_flex(&self, id: ModeId) -> bool {
        match self.get(id) {
            ModeKind::Ref(inner) => matches!(self.get(*inner), ModeKind::Flex(_)),
            _ => false,
        }
    }

    /// `m` is `REF ... REF ... FLEX` — one or more `REF` layers terminating
    /// in a `FLEX` (possibly with another `REF` immediately inside, which the
    /// caller peels further). Used by `SELECTION` (§4.5): selecting a field
    /// through such a chain is transient.
    pub fn is_ref_to_ref_or_flex(&self, id: ModeId) -> bool {
        match self.get(id) {
            ModeKind::Ref(inner) => matches!(self.get(*inner), ModeKind::Flex(_) | ModeKind::Ref(_)),
            _ => false,
        }
    }
}

impl Default for ModeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_mode(arena: &mut ModeArena, interner: &mut crate::intern::Interner) -> ModeId {
        let sym = interner.intern("INT");
        arena.alloc(ModeKind::Primitive(sym))
    }

    #[test]
    fn ref_mode_is_reference() {
        let mut arena = ModeArena::new();
        let mut interner = crate::intern::Interner::new();
        let int = int_mode(&mut arena, &mut interner);
        let r = arena.alloc(ModeKind::Ref(int));
        assert!(arena.is_reference(r));
        assert!(!arena.is_reference(int));
    }

    #[test]
    fn ref_flex_detected() {
        let mut arena = ModeArena::new();
        let mut interner = crate::intern::Interner::new();
        let int = int_mode(&mut arena, &mut interner);
        let flex = arena.alloc(ModeKind::Flex(int));
        let ref_flex = arena.alloc(ModeKind::Ref(flex));
        assert!(arena.is_ref_flex(ref_flex));
        assert!(!arena.is_ref_flex(flex));
    }

    #[test]
    fn ref_to_ref_or_flex_peels_one_layer() {
        let mut arena = ModeArena::new();
        let mut interner = crate::intern::Interner::new();
        let int = int_mode(&mut arena, &mut interner);
        let flex = arena.alloc(ModeKind::Flex(int));
        let ref_flex = arena.alloc(ModeKind::Ref(flex));
        let ref_ref_flex = arena.alloc(ModeKind::Ref(ref_flex));
        assert!(arena.is_ref_to_ref_or_flex(ref_flex));
        assert!(arena.is_ref_to_ref_or_flex(ref_ref_flex));
        assert!(!arena.is_ref_to_ref_or_flex(int));
    }

    #[test]
    fn has_rows_true_for_row_and_flex() {
        let mut arena = ModeArena::new();
        let mut interner = crate::intern::Interner::new();
        let int = int_mode(&mut arena, &mut interner);
        let row = arena.alloc(ModeKind::Row(int));
        assert!(arena.has_rows(row));
        assert!(!arena.has_rows(int));
    }

    #[test]
    fn union_has_rows_if_any_member_does() {
        let mut arena = ModeArena::new();
        let mut interner = crate::intern::Interner::new();
        let int = int_mode(&mut arena, &mut interner);
        let row = arena.alloc(ModeKind::Row(int));
        let union = arena.alloc(ModeKind::Union(vec![int, row]));
        assert!(arena.has_rows(union));
    }

    #[test]
    fn format_and_union_predicates() {
        let mut arena = ModeArena::new();
        let fmt = arena.alloc(ModeKind::Format);
        assert!(arena.is_format(fmt));
        let un = arena.alloc(ModeKind::Union(vec![]));
        assert!(arena.is_union(un));
        assert!(!arena.is_format(un));
    }
}
