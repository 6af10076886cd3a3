//! The syntax tree node shape the checker walks.
//!
//! The parser hands the checker an already-built, already-moded tree using
//! the classic Algol 68 Genie first-child/next-sibling (`SUB`/`NEXT`) shape.
//! Re-expressed here as a tagged sum (`NodeKind`) with exhaustive match
//! dispatch in `walker`, per the Design Notes (spec.md §9): the compiler
//! flags missing cases as the grammar grows, instead of an unchecked integer
//! `ATTRIBUTE` cascade.

use bitflags::bitflags;

use crate::arena::Id;
use crate::mode::ModeId;
use crate::span::Span;
use crate::table::TableId;
use crate::tag::TagId;

pub type NodeId = Id<Node>;

bitflags! {
    /// Per-node status bits. Only the two bits this pass owns are modeled;
    /// other phases' bits live outside this crate's concern.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeStatus: u8 {
        /// Set once a node has produced a scope diagnostic, so later checks
        /// against the same node are suppressed (§4.1, §7).
        const SCOPE_ERROR = 0b0000_0001;
        /// Set on every `UNIT` the monitor may legally interrupt (§3 invariant).
        const INTERRUPTIBLE = 0b0000_0010;
    }
}

/// The syntactic category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    // Generic recursion-only wrappers.
    Unit,
    Primary,
    Secondary,
    Tertiary,

    // Coercions.
    Deproceduring,
    Uniting,
    Rowing,
    Voiding,
    Proceduring,
    Widening,
    Dereferencing,

    // Atoms.
    Identifier,
    Operator,
    Denotation,
    Nihil,
    Skip,
    Jump,
    GotoSymbol,

    // Expressions.
    Call,
    Slice,
    Assignation,
    Formula,
    MonadicFormula,
    Selection,
    DiagonalFunction,
    TransposeFunction,
    RowFunction,
    ColumnFunction,
    Cast,
    IdentityRelation,
    AndFunction,
    OrFunction,
    Assertion,

    // Generators and declarers.
    Generator,
    LocSymbol,
    HeapSymbol,
    Declarer,
    Bounds,
    Indicant,
    ProcSymbol,
    UnionSymbol,
    RefSymbol,

    // Routine/format texts.
    RoutineText,
    ParameterPack,
    FormatText,
    FormatPattern,
    FormatItemG,
    DynamicReplicator,

    // Enclosed clauses.
    EnclosedClause,
    ClosedClause,
    CollateralClause,
    ParallelClause,
    ConditionalClause,
    CaseClause,
    ConformityClause,
    LoopClause,

    // Serial-clause machinery.
    SerialClause,
    EnquiryClause,
    InitialiserSeries,
    DeclarationList,
    Label,
    LabeledUnit,
    ExitSymbol,
    SemiSymbol,
    EndSymbol,
    CloseSymbol,
    OpenSymbol,
    BeginSymbol,

    // Conditional/case/loop parts.
    ChoicePart,
    ElsePart,
    ElifPart,
    BriefElifPart,
    OutPart,
    CaseOusePart,
    BriefOusePart,
    ConformityOusePart,
    BriefConformityOusePart,
    ForPart,
    FromPart,
    ByPart,
    ToPart,
    WhilePart,
    DoPart,
    AltDoPart,
    UntilPart,

    // Declarations.
    IdentityDeclaration,
    VariableDeclaration,
    ModeDeclaration,
    PriorityDeclaration,
    ProcedureDeclaration,
    ProcedureVariableDeclaration,
    BriefOperatorDeclaration,
    OperatorDeclaration,
    DefiningIdentifier,
    DefiningOperator,
}

/// One node of the decorated syntax tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub sub: Option<NodeId>,
    pub next: Option<NodeId>,
    pub table: TableId,
    pub lex_level: u32,
    pub moid: Option<ModeId>,
    pub tax: Option<TagId>,
    pub status: NodeStatus,
    pub non_local: Option<TableId>,
}

impl Node {
    pub fn new(kind: NodeKind, table: TableId, lex_level: u32) -> Self {
        Node {
            kind,
            span: Span::default(),
            sub: None,
            next: None,
            table,
            lex_level,
            moid: None,
            tax: None,
            status: NodeStatus::empty(),
            non_local: None,
        }
    }
}
