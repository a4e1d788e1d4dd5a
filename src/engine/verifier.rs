//! Cross-unit call verification: replays the call ledger against the
//! declaration table after every unit has compiled.

use crate::error::{Diagnostic, DiagnosticKind, Severity, SubroutineContext};
use crate::symbols::SubroutineKind;

use super::ledger::{CallSite, RunLedger};

/// Check every recorded call site against the declarations of this run.
/// Calls into classes that did not compile clean are skipped; their
/// declarations cannot be trusted.
pub(crate) fn verify_calls(ledger: &RunLedger) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for call in &ledger.calls {
        let class = call.callee.split('.').next().unwrap_or_default();
        if !ledger.clean_classes.contains(class) {
            continue;
        }

        let declaration = match ledger.declarations.get(&call.callee) {
            Some(declaration) => declaration,
            None => {
                let role = if call.called_as_method {
                    "Method "
                } else {
                    "Function or constructor "
                };
                diagnostics.push(mismatch(
                    call,
                    format!("{}{} doesn't exist", role, call.callee),
                ));
                continue;
            }
        };

        if call.called_as_method && declaration.kind != SubroutineKind::Method {
            let role = if declaration.kind == SubroutineKind::Function {
                "Function "
            } else {
                "Constructor "
            };
            diagnostics.push(mismatch(
                call,
                format!("{}{} called as a method", role, call.callee),
            ));
        } else if !call.called_as_method && declaration.kind == SubroutineKind::Method {
            diagnostics.push(mismatch(
                call,
                format!("Method {} called as a function/constructor", call.callee),
            ));
        }

        if call.arguments != declaration.parameters {
            diagnostics.push(mismatch(
                call,
                format!(
                    "Subroutine {} (declared to accept {} parameter(s)) called with {} parameter(s)",
                    call.callee, declaration.parameters, call.arguments
                ),
            ));
        }
    }

    diagnostics
}

fn mismatch(call: &CallSite, message: String) -> Diagnostic {
    let subroutine = match &call.caller {
        Some(name) => SubroutineContext::Named(name.clone()),
        None => SubroutineContext::Unnamed,
    };
    Diagnostic {
        severity: Severity::Error,
        kind: DiagnosticKind::CrossUnit,
        message,
        line: call.line,
        subroutine,
        file: call.file.clone(),
    }
}
