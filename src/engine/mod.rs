//! The compilation engine: a single-pass recursive-descent parser that
//! type-checks, tracks reachability, and emits VM instructions while it
//! parses. One engine instance owns the run-wide declaration table and
//! call ledger; everything else lives for a single unit.

mod declarations;
mod expressions;
mod ledger;
mod statements;
mod verifier;

#[cfg(test)]
mod tests;

pub use self::ledger::{CallSite, RunLedger, SubroutineDecl};

use crate::codegen::{CodeSink, Instruction, Segment};
use crate::error::{
    Abort, Diagnostic, DiagnosticKind, ParseResult, Severity, SubroutineContext, SymbolError,
};
use crate::lexer::{Keyword, TokenKind, Tokenizer};
use crate::symbols::{IdentKind, SymbolTable};

use self::expressions::ExpType;

/// The outcome of compiling one unit. Output reached the sink only when
/// `valid` is true.
#[derive(Debug)]
pub struct UnitReport {
    pub valid: bool,
    /// All diagnostics for the unit, in source encounter order. Warnings
    /// do not affect `valid`.
    pub diagnostics: Vec<Diagnostic>,
}

/// Compiles units one at a time and verifies subroutine calls across all
/// of them at the end of the run.
#[derive(Debug, Default)]
pub struct CompilationEngine {
    ledger: RunLedger,
}

impl CompilationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile one unit. `expected_class_name` is usually the file stem;
    /// `file_label` is the name used in diagnostics. Instructions reach
    /// `sink` only if the unit ends diagnostic-free (warnings aside) —
    /// partial output is discarded, never flushed.
    pub fn compile_unit(
        &mut self,
        source: &str,
        expected_class_name: &str,
        file_label: &str,
        sink: &mut dyn CodeSink,
    ) -> UnitReport {
        let (class_name, code, diagnostics, valid) = {
            let mut unit = UnitCompiler::new(source, file_label, &mut self.ledger);
            let class_name = unit.compile_class(expected_class_name);
            (class_name, unit.code, unit.diagnostics, unit.valid)
        };

        if valid {
            self.ledger.clean_classes.insert(class_name);
            for instruction in code {
                sink.emit(instruction);
            }
        }
        UnitReport { valid, diagnostics }
    }

    /// Replay the call ledger against the declaration table. Pure read:
    /// nothing is re-parsed and the ledger is left intact.
    pub fn verify_calls(&self) -> Vec<Diagnostic> {
        verifier::verify_calls(&self.ledger)
    }

    /// The recorded declaration for a qualified `<Class>.<subroutine>`
    /// name, if any unit in this run declared it.
    pub fn declaration(&self, qualified_name: &str) -> Option<&SubroutineDecl> {
        self.ledger.declarations.get(qualified_name)
    }
}

/// Per-unit workspace: tokenizer, symbol table, buffered code, expression
/// type stack and label counters. Dropped when the unit is done.
pub(crate) struct UnitCompiler<'a> {
    pub(crate) input: Tokenizer<'a>,
    pub(crate) symbols: SymbolTable,
    pub(crate) code: Vec<Instruction>,
    pub(crate) ledger: &'a mut RunLedger,
    pub(crate) file: String,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) valid: bool,
    pub(crate) exp_types: Vec<ExpType>,
    pub(crate) if_counter: u32,
    pub(crate) while_counter: u32,
}

impl<'a> UnitCompiler<'a> {
    fn new(source: &'a str, file_label: &str, ledger: &'a mut RunLedger) -> Self {
        Self {
            input: Tokenizer::new(source),
            // Replaced once the declared class name is known.
            symbols: SymbolTable::new(String::new()),
            code: Vec::new(),
            ledger,
            file: file_label.to_string(),
            diagnostics: Vec::new(),
            valid: true,
            exp_types: Vec::new(),
            if_counter: 0,
            while_counter: 0,
        }
    }

    /// Compile the whole class. Terminal errors that escape every resync
    /// point end the unit here; the diagnostics have been recorded by the
    /// time they unwind.
    fn compile_class(&mut self, expected_class_name: &str) -> String {
        self.input.advance();
        let mut class_name = expected_class_name.to_string();
        let _ = self.compile_class_structure(expected_class_name, &mut class_name);
        class_name
    }

    fn compile_class_structure(
        &mut self,
        expected_class_name: &str,
        class_name: &mut String,
    ) -> ParseResult<()> {
        if self.is_keyword(Keyword::Class) {
            self.input.advance();
        } else {
            self.class_error("Expected 'class'");
        }

        if let Some(name) = self.identifier() {
            if name != expected_class_name {
                self.class_semantic_error("The class name doesn't match the file name".to_string());
            }
            *class_name = name;
            self.input.advance();
        } else {
            self.class_error("Expected a class name");
        }
        self.symbols = SymbolTable::new(class_name.clone());

        if self.is_symbol('{') {
            self.input.advance();
        } else {
            self.class_error("Expected {");
        }

        self.compile_class_variables()?;
        self.compile_subroutines();

        if !self.is_symbol('}') {
            self.class_error("Expected }");
        }
        if self.input.has_more_tokens() {
            self.class_error("Expected end-of-file");
        }
        Ok(())
    }

    // ===== Token predicates =====

    pub(crate) fn is_symbol(&self, symbol: char) -> bool {
        self.input.kind().is_symbol(symbol)
    }

    pub(crate) fn is_keyword(&self, keyword: Keyword) -> bool {
        self.input.kind().is_keyword(keyword)
    }

    /// The current token's identifier name, if it is one.
    pub(crate) fn identifier(&self) -> Option<String> {
        match self.input.kind() {
            TokenKind::Identifier(name) => Some(name.clone()),
            _ => None,
        }
    }

    // ===== Emission =====

    pub(crate) fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    pub(crate) fn emit_push(&mut self, segment: Segment, index: u16) {
        self.emit(Instruction::Push(segment, index));
    }

    pub(crate) fn emit_pop(&mut self, segment: Segment, index: u16) {
        self.emit(Instruction::Pop(segment, index));
    }

    pub(crate) fn emit_call(&mut self, name: impl Into<String>, args: u16) {
        self.emit(Instruction::Call {
            name: name.into(),
            args,
        });
    }

    pub(crate) fn emit_label(&mut self, name: String) {
        self.emit(Instruction::Label(name));
    }

    pub(crate) fn emit_goto(&mut self, name: String) {
        self.emit(Instruction::Goto(name));
    }

    pub(crate) fn emit_if_goto(&mut self, name: String) {
        self.emit(Instruction::IfGoto(name));
    }

    /// Push a variable's value, mapping its kind to the VM segment.
    pub(crate) fn push_variable(&mut self, kind: IdentKind, index: u16) {
        self.emit_push(segment_for(kind), index);
    }

    /// Pop the stack top into a variable.
    pub(crate) fn pop_variable(&mut self, kind: IdentKind, index: u16) {
        self.emit_pop(segment_for(kind), index);
    }

    /// Resolve a name to its kind and slot index in one step.
    pub(crate) fn lookup(&self, name: &str) -> Result<(IdentKind, u16), SymbolError> {
        let kind = self.symbols.kind_of(name)?;
        let index = self.symbols.index_of(name)?;
        Ok((kind, index))
    }

    // ===== Diagnostics =====

    fn subroutine_context(&self) -> SubroutineContext {
        match self.symbols.subroutine_name() {
            Some(name) => SubroutineContext::Named(name.to_string()),
            None => SubroutineContext::Unnamed,
        }
    }

    fn record(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        message: String,
        line: usize,
        subroutine: SubroutineContext,
    ) {
        if severity == Severity::Error {
            self.valid = false;
        }
        self.diagnostics.push(Diagnostic {
            severity,
            kind,
            message,
            line,
            subroutine,
            file: self.file.clone(),
        });
    }

    /// Class-level recoverable error: no subroutine clause in the output.
    pub(crate) fn class_error(&mut self, message: &str) {
        let line = self.input.line();
        self.record(
            Severity::Error,
            DiagnosticKind::Structural,
            message.to_string(),
            line,
            SubroutineContext::ClassLevel,
        );
    }

    /// Class-level semantic error (redeclarations, name mismatches).
    pub(crate) fn class_semantic_error(&mut self, message: String) {
        let line = self.input.line();
        self.record(
            Severity::Error,
            DiagnosticKind::Semantic,
            message,
            line,
            SubroutineContext::ClassLevel,
        );
    }

    /// Missing expected token; a best guess is synthesized and parsing
    /// continues.
    pub(crate) fn structural_error(&mut self, message: &str) {
        let line = self.input.line();
        let context = self.subroutine_context();
        self.record(
            Severity::Error,
            DiagnosticKind::Structural,
            message.to_string(),
            line,
            context,
        );
    }

    pub(crate) fn semantic_error(&mut self, message: String) {
        let line = self.input.line();
        self.semantic_error_at(message, line);
    }

    pub(crate) fn semantic_error_at(&mut self, message: String, line: usize) {
        let context = self.subroutine_context();
        self.record(Severity::Error, DiagnosticKind::Semantic, message, line, context);
    }

    /// Record a terminal error and hand back the unwind token; the caller
    /// returns it and recovery happens at the nearest resync point.
    pub(crate) fn terminal_error(&mut self, message: &str) -> Abort {
        let line = self.input.line();
        let context = self.subroutine_context();
        self.record(
            Severity::Error,
            DiagnosticKind::FatalStructural,
            message.to_string(),
            line,
            context,
        );
        Abort
    }

    pub(crate) fn warn(&mut self, message: &str) {
        let line = self.input.line();
        let context = self.subroutine_context();
        self.record(
            Severity::Warning,
            DiagnosticKind::Reachability,
            message.to_string(),
            line,
            context,
        );
    }
}

fn segment_for(kind: IdentKind) -> Segment {
    match kind {
        IdentKind::Parameter => Segment::Argument,
        IdentKind::Local => Segment::Local,
        IdentKind::Field => Segment::This,
        IdentKind::Static => Segment::Static,
    }
}
