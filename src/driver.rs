//! File and directory compilation driver: reads `.jack` sources, writes
//! `.vm` files next to them, and reports diagnostics on stderr.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use colored::Colorize;
use walkdir::WalkDir;

use crate::codegen::{render, Instruction};
use crate::engine::CompilationEngine;
use crate::error::{Diagnostic, Severity};

/// Compiles `.jack` files one by one through a shared engine, so calls
/// across the compiled files are verified at the end of the run.
#[derive(Debug, Default)]
pub struct Compiler {
    engine: CompilationEngine,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile one file into a `.vm` file next to it. On errors no output
    /// file is created and false is returned; warnings alone do not block
    /// output.
    pub fn compile_file(&mut self, path: &Path) -> io::Result<bool> {
        let source = fs::read_to_string(path)?;
        let class_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut code: Vec<Instruction> = Vec::new();
        let report = self
            .engine
            .compile_unit(&source, &class_name, &file_label, &mut code);
        report_diagnostics(&report.diagnostics);

        if !report.valid {
            return Ok(false);
        }

        let out_path = path.with_extension("vm");
        fs::write(&out_path, render(&code))?;
        Ok(true)
    }

    /// Compile every `.jack` file under `directory`, in path order so
    /// runs are reproducible. Returns true if all files compiled clean.
    pub fn compile_directory(&mut self, directory: &Path) -> io::Result<bool> {
        let mut sources: Vec<PathBuf> = WalkDir::new(directory)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "jack"))
            .collect();
        sources.sort();

        let mut success = true;
        for path in &sources {
            success &= self.compile_file(path)?;
        }
        Ok(success)
    }

    /// Cross-check the calls recorded so far against the declarations of
    /// the run. Returns true if no mismatches were found.
    pub fn verify(&self) -> bool {
        let diagnostics = self.engine.verify_calls();
        report_diagnostics(&diagnostics);
        diagnostics.is_empty()
    }
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let line = diagnostic.to_string();
        match diagnostic.severity {
            Severity::Error => eprintln!("{}", line.red()),
            Severity::Warning => eprintln!("{}", line.yellow()),
        }
    }
}
