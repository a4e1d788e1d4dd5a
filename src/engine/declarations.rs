//! Class structure: field/static/local declarations, subroutine headers
//! and bodies, parameter lists.

use crate::codegen::{Instruction, Segment};
use crate::error::ParseResult;
use crate::lexer::{Keyword, TokenKind};
use crate::symbols::{IdentKind, SubroutineKind};

use super::ledger::SubroutineDecl;
use super::UnitCompiler;

impl UnitCompiler<'_> {
    /// Compile the `field`/`static` declarations at the top of the class
    /// body.
    pub(crate) fn compile_class_variables(&mut self) -> ParseResult<()> {
        loop {
            let kind = if self.is_keyword(Keyword::Field) {
                IdentKind::Field
            } else if self.is_keyword(Keyword::Static) {
                IdentKind::Static
            } else {
                return Ok(());
            };
            self.compile_declaration_line(kind)?;
        }
    }

    /// Compile every subroutine in the class. A terminal error inside one
    /// subroutine resynchronizes at the next subroutine keyword (or the
    /// last token) and the rest of the class is still attempted.
    pub(crate) fn compile_subroutines(&mut self) {
        loop {
            let kind = if self.is_keyword(Keyword::Method) {
                SubroutineKind::Method
            } else if self.is_keyword(Keyword::Function) {
                SubroutineKind::Function
            } else if self.is_keyword(Keyword::Constructor) {
                SubroutineKind::Constructor
            } else {
                return;
            };

            if self.compile_subroutine(kind).is_err() {
                while !self.is_keyword(Keyword::Method)
                    && !self.is_keyword(Keyword::Function)
                    && !self.is_keyword(Keyword::Constructor)
                    && self.input.has_more_tokens()
                {
                    self.input.advance();
                }
            }
        }
    }

    fn compile_subroutine(&mut self, kind: SubroutineKind) -> ParseResult<()> {
        // Label numbering is local to each subroutine.
        self.if_counter = 0;
        self.while_counter = 0;
        self.input.advance();

        let return_type = if self.is_keyword(Keyword::Void) {
            "void".to_string()
        } else {
            self.parse_type()?
        };
        let type_line = self.input.line();
        self.input.advance();

        let mut subroutine_name = None;
        let full_name;
        if let Some(name) = self.identifier() {
            full_name = format!("{}.{}", self.symbols.class_name(), name);
            if self.ledger.declarations.contains_key(&full_name) {
                self.class_semantic_error(format!("Subroutine {} redeclared", name));
            }
            subroutine_name = Some(name);
            self.input.advance();
        } else {
            // A forgotten return type trips this as well.
            self.class_error("Expected a type followed by a subroutine name");
            // Placeholder; the unit's code will be discarded anyway.
            full_name = format!("{}.unknownname", self.symbols.class_name());
        }

        match kind {
            SubroutineKind::Method => {
                self.symbols
                    .start_method(subroutine_name.clone(), return_type);
            }
            SubroutineKind::Function => {
                self.symbols
                    .start_function(subroutine_name.clone(), return_type);
            }
            SubroutineKind::Constructor => {
                self.symbols.start_constructor(subroutine_name.clone());
                if return_type != self.symbols.class_name() {
                    self.semantic_error_at(
                        "The return type of a constructor must be of the class type".to_string(),
                        type_line,
                    );
                }
            }
        }

        if self.is_symbol('(') {
            self.input.advance();
        } else {
            self.structural_error("Expected (");
        }

        // Returns with the current token on ')'.
        let parameters = self.compile_parameter_list()?;
        self.input.advance();
        self.compile_subroutine_body(&full_name)?;

        self.symbols.end_subroutine();

        if subroutine_name.is_some() {
            // On a redeclaration (already reported) the last definition
            // wins for verification purposes; calls into erroneous
            // classes are never verified, so this cannot mislead.
            self.ledger
                .declarations
                .insert(full_name, SubroutineDecl { kind, parameters });
        }
        Ok(())
    }

    /// Compile a possibly empty parameter list, not including the
    /// enclosing parentheses, and return the number of parameters.
    fn compile_parameter_list(&mut self) -> ParseResult<u16> {
        let mut parameters = 0;
        if self.is_symbol(')') {
            return Ok(parameters);
        }

        loop {
            parameters += 1;
            let ty = self.parse_type()?;
            self.input.advance();

            if let Some(name) = self.identifier() {
                self.define_or_report(name, ty, IdentKind::Parameter);
                self.input.advance();
            } else {
                self.structural_error("Expected a type followed by a variable name");
            }

            if self.is_symbol(')') {
                return Ok(parameters);
            } else if self.is_symbol(',') {
                self.input.advance();
            } else {
                return Err(self.terminal_error("Expected ) or , in parameters list"));
            }
        }
    }

    fn compile_subroutine_body(&mut self, full_name: &str) -> ParseResult<()> {
        if self.is_symbol('{') {
            self.input.advance();
        } else {
            self.structural_error("Expected {");
        }

        while self.is_keyword(Keyword::Var) {
            self.compile_declaration_line(IdentKind::Local)?;
        }

        let locals = self.symbols.count(IdentKind::Local);
        self.emit(Instruction::Function {
            name: full_name.to_string(),
            locals,
        });

        match self.symbols.subroutine_kind() {
            Some(SubroutineKind::Method) => {
                // Bind the receiver passed in argument 0.
                self.emit_push(Segment::Argument, 0);
                self.emit_pop(Segment::Pointer, 0);
            }
            Some(SubroutineKind::Constructor) => {
                let fields = self.symbols.count(IdentKind::Field);
                self.emit_push(Segment::Constant, fields);
                self.emit_call("Memory.alloc", 1);
                self.emit_pop(Segment::Pointer, 0);
            }
            _ => {}
        }

        if self.compile_statements(true)? {
            // The closing brace is reachable by the program flow.
            self.semantic_error(
                "Program flow may reach end of subroutine without 'return'".to_string(),
            );
        }

        self.input.advance();
        Ok(())
    }

    /// Compile one `field`/`static`/`var` declaration line of the given
    /// kind, including the terminating semicolon.
    fn compile_declaration_line(&mut self, kind: IdentKind) -> ParseResult<()> {
        self.input.advance();
        let ty = self.parse_type()?;

        loop {
            self.input.advance();
            if let Some(name) = self.identifier() {
                self.define_or_report(name, ty.clone(), kind);
                self.input.advance();
            } else {
                // A forgotten type trips this as well.
                self.structural_error("Expected a type followed by comma-separated variable names");
            }

            if self.is_symbol(';') {
                self.input.advance();
                return Ok(());
            } else if !self.is_symbol(',') {
                return Err(self.terminal_error("Expected , or ;"));
            }
        }
    }

    fn define_or_report(&mut self, name: String, ty: String, kind: IdentKind) {
        if self.symbols.define(name.clone(), ty, kind).is_err() {
            self.semantic_error(format!("{} redeclared", name));
        }
    }

    /// The type named by the current token: `int`, `char`, `boolean` or a
    /// class name.
    pub(crate) fn parse_type(&mut self) -> ParseResult<String> {
        match self.input.kind() {
            TokenKind::Keyword(Keyword::Int) => Ok("int".to_string()),
            TokenKind::Keyword(Keyword::Boolean) => Ok("boolean".to_string()),
            TokenKind::Keyword(Keyword::Char) => Ok("char".to_string()),
            TokenKind::Identifier(name) => Ok(name.clone()),
            _ => Err(self.terminal_error("Expected primitive type or class name")),
        }
    }
}
