//! Statement compilation: `do`, `let`, `while`, `if`, `return`, with
//! reachability tracking and per-statement error recovery.

use crate::codegen::{Instruction, Segment};
use crate::error::ParseResult;
use crate::lexer::Keyword;
use crate::symbols::{IdentKind, SubroutineKind};

use super::expressions::ExpType;
use super::UnitCompiler;

impl UnitCompiler<'_> {
    /// Compile a statement sequence until the closing `}` of the block.
    /// Returns whether the point after the sequence is reachable.
    ///
    /// A terminal error inside a `do`/`let`/`return` is caught here and
    /// recovery skips to the end of that statement; `while` and `if`
    /// manage their own recovery and their failures propagate.
    pub(crate) fn compile_statements(&mut self, mut reachable: bool) -> ParseResult<bool> {
        // One warning per maximal unreachable run; if we enter already
        // unreachable the caller has reported it.
        let mut reported_unreachable = !reachable;

        while !self.is_symbol('}') {
            if !reachable && !reported_unreachable {
                self.warn("Unreachable code");
                reported_unreachable = true;
            }

            if self.is_keyword(Keyword::Do) {
                if self.compile_do().is_err() {
                    self.skip_to_end_of_statement();
                }
            } else if self.is_keyword(Keyword::Let) {
                if self.compile_let().is_err() {
                    self.skip_to_end_of_statement();
                }
            } else if self.is_keyword(Keyword::While) {
                reachable = self.compile_while(reachable)?;
            } else if self.is_keyword(Keyword::Return) {
                if self.compile_return().is_err() {
                    self.skip_to_end_of_statement();
                }
                reachable = false;
            } else if self.is_keyword(Keyword::If) {
                reachable = self.compile_if(reachable)?;
            } else if self.is_symbol(';') {
                self.semantic_error("An empty statement is not allowed".to_string());
                self.input.advance();
            } else if self.identifier().is_some() {
                // Probably merely forgot do or let.
                self.structural_error("Expected statement(do, let, while, return or if)");
                self.skip_to_end_of_statement();
            } else {
                return Err(self.terminal_error("Expected statement(do, let, while, return or if)"));
            }
        }

        Ok(reachable)
    }

    /// Skip past the end of the broken statement: past the next `;`, or
    /// stop short of a `}` or end-of-input.
    fn skip_to_end_of_statement(&mut self) {
        while !self.is_symbol(';') && !self.is_symbol('}') && self.input.has_more_tokens() {
            self.input.advance();
        }
        if self.is_symbol(';') {
            self.input.advance();
        }
    }

    /// After a broken `while`/`if` condition: skip to the nearest `;`,
    /// `}` or `{` so a following block can still be checked.
    fn skip_from_parens_to_block_start(&mut self) {
        while !self.is_symbol(';')
            && !self.is_symbol('}')
            && !self.is_symbol('{')
            && self.input.has_more_tokens()
        {
            self.input.advance();
        }
    }

    fn compile_do(&mut self) -> ParseResult<()> {
        self.input.advance();
        self.compile_subroutine_call()?;
        // Pop the junk return value into temp.
        self.emit_pop(Segment::Temp, 0);

        if self.is_symbol(';') {
            self.input.advance();
        } else {
            self.structural_error("Expected ;");
        }
        Ok(())
    }

    fn compile_while(&mut self, reachable: bool) -> ParseResult<bool> {
        let counter = self.while_counter;
        self.while_counter += 1;
        self.input.advance();

        if self.is_symbol('(') {
            self.input.advance();
        } else {
            self.structural_error("Expected (");
        }

        if let Err(abort) = self.compile_while_condition(counter) {
            self.skip_from_parens_to_block_start();
            if !self.is_symbol('{') {
                return Err(abort); // can't fix
            }
        }

        if self.is_symbol('{') {
            self.input.advance();
        } else {
            self.structural_error("Expected {");
        }

        self.emit_if_goto(format!("WHILE_END{}", counter));
        let reachable = self.compile_statements(reachable)?;

        if self.is_symbol('}') {
            self.input.advance();
        } else {
            self.structural_error("Expected }");
        }

        self.emit_goto(format!("WHILE_EXP{}", counter));
        self.emit_label(format!("WHILE_END{}", counter));

        Ok(reachable)
    }

    fn compile_while_condition(&mut self, counter: u32) -> ParseResult<()> {
        self.emit_label(format!("WHILE_EXP{}", counter));
        self.compile_new_expression(ExpType::General)?;
        self.emit(Instruction::Not);
        if self.is_symbol(')') {
            self.input.advance();
        } else {
            self.structural_error("Expected )");
        }
        Ok(())
    }

    /// Returns true if the point after the statement is reachable: the
    /// end of an `if` with no `else` always is, an `if`/`else` pair is
    /// iff either branch can fall out the bottom.
    fn compile_if(&mut self, reachable: bool) -> ParseResult<bool> {
        let counter = self.if_counter;
        self.if_counter += 1;
        self.input.advance();

        if self.is_symbol('(') {
            self.input.advance();
        } else {
            self.structural_error("Expected (");
        }

        if let Err(abort) = self.compile_if_condition() {
            self.skip_from_parens_to_block_start();
            if !self.is_symbol('{') {
                return Err(abort); // can't fix
            }
        }

        if self.is_symbol('{') {
            self.input.advance();
        } else {
            self.structural_error("Expected {");
        }

        self.emit_if_goto(format!("IF_TRUE{}", counter));
        self.emit_goto(format!("IF_FALSE{}", counter));
        self.emit_label(format!("IF_TRUE{}", counter));
        let then_reachable = self.compile_statements(reachable)?;

        if self.is_symbol('}') {
            self.input.advance();
        } else {
            self.structural_error("Expected }");
        }

        if self.is_keyword(Keyword::Else) {
            self.input.advance();
        } else {
            self.emit_label(format!("IF_FALSE{}", counter));
            return Ok(true); // the false branch falls straight through
        }

        if self.is_symbol('{') {
            self.input.advance();
        } else {
            self.structural_error("Expected {");
        }

        self.emit_goto(format!("IF_END{}", counter));
        self.emit_label(format!("IF_FALSE{}", counter));
        let else_reachable = self.compile_statements(reachable)?;

        if self.is_symbol('}') {
            self.input.advance();
        } else {
            self.structural_error("Expected }");
        }

        self.emit_label(format!("IF_END{}", counter));

        Ok(then_reachable || else_reachable)
    }

    fn compile_if_condition(&mut self) -> ParseResult<()> {
        self.compile_new_expression(ExpType::General)?;
        if self.is_symbol(')') {
            self.input.advance();
        } else {
            self.structural_error("Expected )");
        }
        Ok(())
    }

    fn compile_return(&mut self) -> ParseResult<()> {
        self.input.advance();

        if self.symbols.subroutine_kind() == Some(SubroutineKind::Constructor)
            && !self.is_keyword(Keyword::This)
        {
            self.semantic_error("A constructor must return 'this'".to_string());
        }

        if self.is_symbol(';') {
            if self.symbols.return_type() != Some("void") {
                self.semantic_error("A non-void function must return a value".to_string());
            }
            // No return value: push zero.
            self.emit_push(Segment::Constant, 0);
            self.emit(Instruction::Return);
            self.input.advance();
        } else {
            if self.symbols.return_type() == Some("void") {
                self.semantic_error("A void function must not return a value".to_string());
            }
            self.compile_new_expression(ExpType::General)?;
            self.emit(Instruction::Return);
            if self.is_symbol(';') {
                self.input.advance();
            } else {
                self.structural_error("Expected ;");
            }
        }
        Ok(())
    }

    fn compile_let(&mut self) -> ParseResult<()> {
        self.input.advance();

        let name = match self.identifier() {
            Some(name) => name,
            None => {
                return Err(self
                    .terminal_error("Expected field, parameter or local or static variable name"))
            }
        };

        let (kind, index, ty) = match self.lookup(&name) {
            Ok((kind, index)) => {
                let ty = self
                    .symbols
                    .type_of(&name)
                    .map(str::to_string)
                    .unwrap_or_default();
                (kind, index, ty)
            }
            Err(_) => {
                self.semantic_error(format!(
                    "{} is not defined as a field, parameter or local or static variable",
                    name
                ));
                // Default to something; the generated code will be
                // discarded anyway.
                (IdentKind::Static, 0, "int".to_string())
            }
        };
        self.input.advance();

        if self.is_symbol('=') {
            self.input.advance();
            let rhs = self.compile_new_expression(ExpType::General)?;
            self.pop_variable(kind, index);
            self.check_assignment(&ty, rhs);
        } else if self.is_symbol('[') {
            self.input.advance();
            self.compile_new_expression(ExpType::Numeric)?;

            if self.is_symbol(']') {
                self.input.advance();
            } else {
                return Err(self.terminal_error("Expected ]"));
            }

            self.push_variable(kind, index);
            self.emit(Instruction::Add);

            if self.is_symbol('=') {
                self.input.advance();
            } else {
                return Err(self.terminal_error("Expected ="));
            }

            self.compile_new_expression(ExpType::General)?;
            // Stash the value, point `that` at the element, store.
            self.emit_pop(Segment::Temp, 0);
            self.emit_pop(Segment::Pointer, 1);
            self.emit_push(Segment::Temp, 0);
            self.emit_pop(Segment::That, 0);
        } else {
            return Err(self.terminal_error("Expected [ or ="));
        }

        if self.is_symbol(';') {
            self.input.advance();
        } else {
            self.structural_error("Expected ;");
        }
        Ok(())
    }

    /// Check the just-compiled right-hand side against the target's
    /// declared type. Class-typed targets and untyped expressions accept
    /// anything. The tokenizer has read ahead by now, hence the line
    /// fixup.
    fn check_assignment(&mut self, ty: &str, rhs: ExpType) {
        if rhs == ExpType::General {
            return;
        }
        let line = self.input.line().saturating_sub(1);
        match ty {
            "int" => {
                if rhs != ExpType::Int && rhs != ExpType::Numeric {
                    self.semantic_error_at("an int value is expected".to_string(), line);
                }
            }
            "char" => {
                if rhs != ExpType::Char && rhs != ExpType::Numeric {
                    self.semantic_error_at("a char value is expected".to_string(), line);
                }
            }
            "boolean" => {
                if rhs != ExpType::Numeric && rhs != ExpType::Int && rhs != ExpType::Boolean {
                    self.semantic_error_at("a boolean value is expected".to_string(), line);
                }
            }
            _ => {}
        }
    }
}
