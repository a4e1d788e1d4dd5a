//! Diagnostic model and error types for all compilation phases.

use std::fmt;
use thiserror::Error;

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The code is legal and produces output; the compiler is pointing
    /// something out.
    Warning,
    /// The unit is invalid and produces no output.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What class of problem a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A missing expected token; the parser synthesized it and went on.
    Structural,
    /// The parser could not resume token-by-token and resynchronized at
    /// the next statement, subroutine or class boundary.
    FatalStructural,
    /// Undefined identifier, kind mismatch, literal out of range,
    /// return-type mismatch, redeclaration.
    Semantic,
    /// A call/declaration mismatch found after all units compiled.
    CrossUnit,
    /// Unreachable code.
    Reachability,
}

/// Where a diagnostic was raised relative to the unit's subroutines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubroutineContext {
    /// Class level: no subroutine clause is printed.
    ClassLevel,
    /// Inside a subroutine whose name could not be determined.
    Unnamed,
    /// Inside a named subroutine.
    Named(String),
}

/// A single compiler diagnostic, renderable in the reporting format
/// consumed by editors and the CLI:
///
/// `In <file> (line <n>): In subroutine <name>: <message>`
///
/// The subroutine clause is omitted for class-level diagnostics; warnings
/// carry a `Warning: ` prefix before the message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub subroutine: SubroutineContext,
    pub file: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In {} (line {}): ", self.file, self.line)?;
        match &self.subroutine {
            SubroutineContext::ClassLevel => {}
            SubroutineContext::Unnamed => write!(f, "In subroutine: ")?,
            SubroutineContext::Named(name) => write!(f, "In subroutine {}: ", name)?,
        }
        if self.severity == Severity::Warning {
            write!(f, "Warning: ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// Symbol table lookup and definition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("'{0}' is not defined in the current scope")]
    Undefined(String),

    #[error("'{0}' is already defined in this scope")]
    Redefined(String),
}

impl SymbolError {
    pub fn name(&self) -> &str {
        match self {
            Self::Undefined(name) | Self::Redefined(name) => name,
        }
    }
}

/// Unwind token for terminal parse errors. The diagnostic has already been
/// recorded when this is raised; the catcher resynchronizes the token
/// stream and resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("parsing of the current element aborted")]
pub struct Abort;

/// Result alias used throughout the compilation engine.
pub type ParseResult<T> = Result<T, Abort>;
