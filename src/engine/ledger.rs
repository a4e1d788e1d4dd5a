//! Run-wide records: subroutine declarations and the call-site ledger
//! consumed by the cross-unit verifier after all units have compiled.

use std::collections::{HashMap, HashSet};

use crate::symbols::SubroutineKind;

/// A compiled subroutine declaration, keyed in the run table by its
/// qualified `<Class>.<subroutine>` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubroutineDecl {
    pub kind: SubroutineKind,
    pub parameters: u16,
}

/// One compiled call expression, appended for every call site and read
/// back only after the whole run.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// Qualified callee name, `<Class>.<subroutine>`.
    pub callee: String,
    /// True when a receiver was pushed for the call.
    pub called_as_method: bool,
    pub arguments: u16,
    /// Diagnostic label of the calling unit.
    pub file: String,
    /// The calling subroutine, when its name was determined.
    pub caller: Option<String>,
    /// Source line of the callee name at the call site.
    pub line: usize,
}

/// State that survives across units within one compiler run. Plain
/// instance state: independent engines never share it.
#[derive(Debug, Default)]
pub struct RunLedger {
    /// Declared subroutines; a redeclaration (already reported as an
    /// error) replaces the earlier entry.
    pub declarations: HashMap<String, SubroutineDecl>,
    /// Classes that compiled without any error this run.
    pub clean_classes: HashSet<String>,
    /// Every recorded call site, in compilation order.
    pub calls: Vec<CallSite>,
}
