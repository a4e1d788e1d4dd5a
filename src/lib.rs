//! A compiler for the Jack class-based language, targeting the textual
//! stack-machine VM instruction set.
//!
//! Compilation is a single pass: the tokenizer feeds a recursive-descent
//! engine that checks, recovers from errors, and emits VM instructions as
//! it parses. A run compiles units one after another through a shared
//! [`engine::CompilationEngine`], which afterwards verifies subroutine
//! calls across all of them.

pub mod codegen;
pub mod driver;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod symbols;

pub use engine::{CompilationEngine, UnitReport};

use error::Diagnostic;

/// Compile a single class in isolation and render its VM output.
///
/// On any error the diagnostics are returned instead of output. A
/// convenience for tools and tests; multi-file runs should drive a
/// [`CompilationEngine`] (or [`driver::Compiler`]) directly to get
/// cross-unit call verification.
pub fn compile_to_string(source: &str, class_name: &str) -> Result<String, Vec<Diagnostic>> {
    let mut engine = CompilationEngine::new();
    let mut code: Vec<codegen::Instruction> = Vec::new();
    let label = format!("{}.jack", class_name);
    let report = engine.compile_unit(source, class_name, &label, &mut code);
    if report.valid {
        Ok(codegen::render(&code))
    } else {
        Err(report.diagnostics)
    }
}
