//! The diagnostic sink: every finding the checker makes, accumulated rather
//! than propagated, following the same shape as the teacher's
//! `OwnershipChecker`/`EscapeChecker` lint passes — collect everything one
//! pass over the tree finds instead of bailing at the first problem.

use crate::mode::ModeId;
use crate::node::{NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// The message codes the checker core emits (§6). `Precision` is defined
/// for outbound-contract completeness but is never constructed by this
/// crate — it belongs to the driver wrapper that checks
/// `varying_mp_digits` against the hardware ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    TransientName,
    ScopeStatic,
    Uninitialised,
    Precision,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub node: NodeId,
    pub message: String,
    /// The offending mode, for `ScopeStatic` diagnostics (§6 outbound contract).
    pub mode: Option<ModeId>,
    /// The offending node's syntactic category, for `ScopeStatic` diagnostics.
    pub attribute: Option<NodeKind>,
}

/// Accumulates diagnostics and the running error/warning counts.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, code: DiagnosticCode, node: NodeId, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            code,
            node,
            message: message.into(),
            mode: None,
            attribute: None,
        });
        self.error_count += 1;
    }

    pub fn warning(
        &mut self,
        code: DiagnosticCode,
        node: NodeId,
        message: impl Into<String>,
        mode: Option<ModeId>,
        attribute: Option<NodeKind>,
    ) {
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            code,
            node,
            message: message.into(),
            mode,
            attribute,
        });
        self.warning_count += 1;
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
