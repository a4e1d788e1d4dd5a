//! Expression and term compilation, including the expression type
//! machinery and subroutine calls.

use crate::codegen::{Instruction, Segment};
use crate::error::ParseResult;
use crate::lexer::{Keyword, TokenKind};
use crate::symbols::SubroutineKind;

use super::ledger::CallSite;
use super::UnitCompiler;

/// What is known about the value of an expression under compilation.
///
/// The ordering matters: anything up to `Numeric` can still be narrowed
/// by the next term, anything above it is committed. Declared types sit
/// in the middle; the constants that may only appear where nothing was
/// expected come last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ExpType {
    General,
    Numeric,
    Int,
    Char,
    Boolean,
    StringConst,
    This,
    Null,
}

impl UnitCompiler<'_> {
    /// The type of the innermost expression under compilation.
    fn exp_type(&self) -> ExpType {
        *self.exp_types.last().unwrap_or(&ExpType::General)
    }

    fn set_exp_type(&mut self, ty: ExpType) {
        if let Some(top) = self.exp_types.last_mut() {
            *top = ty;
        }
    }

    /// Compile a full expression nested inside whatever is currently
    /// being compiled. `expected` seeds the type the expression has to
    /// be compatible with; the settled type is returned.
    pub(crate) fn compile_new_expression(&mut self, expected: ExpType) -> ParseResult<ExpType> {
        self.exp_types.push(expected);
        let outcome = self.compile_expression();
        let settled = self.exp_types.pop().unwrap_or(ExpType::General);
        outcome?;
        Ok(settled)
    }

    /// term (op term)* where op is one of `+ - * / & | > < =`.
    fn compile_expression(&mut self) -> ParseResult<()> {
        self.compile_term()?;

        loop {
            let operator = match self.input.kind() {
                TokenKind::Symbol(
                    symbol @ ('+' | '-' | '*' | '/' | '&' | '|' | '>' | '<' | '='),
                ) => *symbol,
                _ => return Ok(()),
            };
            self.input.advance();
            self.compile_term()?;

            match operator {
                '+' => self.emit(Instruction::Add),
                '-' => self.emit(Instruction::Sub),
                '*' => self.emit_call("Math.multiply", 2),
                '/' => self.emit_call("Math.divide", 2),
                '&' => self.emit(Instruction::And),
                '|' => self.emit(Instruction::Or),
                '>' => self.emit(Instruction::Gt),
                '<' => self.emit(Instruction::Lt),
                _ => self.emit(Instruction::Eq),
            }
        }
    }

    fn compile_term(&mut self) -> ParseResult<()> {
        match self.input.kind() {
            TokenKind::IntConst(_) => self.compile_int_const(),
            TokenKind::StringConst(_) => self.compile_string_const(),
            TokenKind::Keyword(_) => self.compile_keyword_const(),
            TokenKind::Identifier(_) => self.compile_identifier_term(),
            _ => {
                if self.is_symbol('-') {
                    self.input.advance();
                    self.compile_term()?;
                    self.emit(Instruction::Neg);
                    Ok(())
                } else if self.is_symbol('~') {
                    self.input.advance();
                    self.compile_term()?;
                    self.emit(Instruction::Not);
                    Ok(())
                } else if self.is_symbol('(') {
                    self.input.advance();
                    self.compile_new_expression(ExpType::General)?;
                    if self.is_symbol(')') {
                        self.input.advance();
                        Ok(())
                    } else {
                        Err(self.terminal_error("Expected )"))
                    }
                } else {
                    Err(self.terminal_error("Expected - or ~ or ( in term"))
                }
            }
        }
    }

    fn compile_int_const(&mut self) -> ParseResult<()> {
        let value = match self.input.kind() {
            TokenKind::IntConst(value) => *value,
            _ => 0,
        };
        if value > 32767 {
            self.semantic_error("Integer constant too big".to_string());
        }

        self.emit_push(Segment::Constant, value as u16);

        if self.exp_type() < ExpType::Numeric {
            self.set_exp_type(ExpType::Numeric);
        } else if self.exp_type() > ExpType::Char {
            self.semantic_error("a numeric value is illegal here".to_string());
        }

        self.input.advance();
        Ok(())
    }

    fn compile_string_const(&mut self) -> ParseResult<()> {
        if self.exp_type() == ExpType::General {
            self.set_exp_type(ExpType::StringConst);
        } else {
            self.semantic_error("A string constant is illegal here".to_string());
        }

        let text = match self.input.kind() {
            TokenKind::StringConst(text) => text.clone(),
            _ => String::new(),
        };
        self.emit_push(Segment::Constant, text.chars().count() as u16);
        self.emit_call("String.new", 1);
        for character in text.chars() {
            self.emit_push(Segment::Constant, character as u16);
            // First argument is the string reference left on the stack.
            self.emit_call("String.appendChar", 2);
        }
        self.input.advance();
        Ok(())
    }

    fn compile_keyword_const(&mut self) -> ParseResult<()> {
        let keyword = match self.input.kind() {
            TokenKind::Keyword(keyword) => *keyword,
            _ => return Err(self.terminal_error("Illegal keyword in term")),
        };

        match keyword {
            Keyword::True => {
                self.emit_push(Segment::Constant, 0);
                self.emit(Instruction::Not);
            }
            Keyword::False | Keyword::Null => {
                self.emit_push(Segment::Constant, 0);
            }
            Keyword::This => {
                if self.symbols.subroutine_kind() == Some(SubroutineKind::Function) {
                    self.semantic_error("'this' can't be referenced in a function".to_string());
                }
                self.emit_push(Segment::Pointer, 0);
            }
            _ => return Err(self.terminal_error("Illegal keyword in term")),
        }

        match keyword {
            Keyword::True | Keyword::False => {
                if self.exp_type() <= ExpType::Numeric {
                    self.set_exp_type(ExpType::Boolean);
                } else {
                    self.semantic_error("A boolean value is illegal here".to_string());
                }
            }
            Keyword::Null => {
                if self.exp_type() == ExpType::General {
                    self.set_exp_type(ExpType::Null);
                } else {
                    self.semantic_error("'null' is illegal here".to_string());
                }
            }
            Keyword::This => {
                if self.exp_type() == ExpType::General {
                    self.set_exp_type(ExpType::This);
                } else {
                    self.semantic_error("'this' is illegal here".to_string());
                }
            }
            _ => {}
        }

        self.input.advance();
        Ok(())
    }

    /// An identifier in term position: an array access, a subroutine
    /// call, or a plain variable.
    fn compile_identifier_term(&mut self) -> ParseResult<()> {
        if self.exp_type() == ExpType::StringConst {
            self.semantic_error("Illegal casting into String constant".to_string());
        }

        let name = match self.identifier() {
            Some(name) => name,
            None => return Err(self.terminal_error("Expected - or ~ or ( in term")),
        };
        let line = self.input.line();
        self.input.advance();

        if self.is_symbol('[') {
            self.input.advance();
            self.compile_new_expression(ExpType::Numeric)?;

            match self.lookup(&name) {
                Ok((kind, index)) => self.push_variable(kind, index),
                Err(_) => self.semantic_error_at(
                    format!(
                        "{} is not defined as a field, parameter or local or static variable",
                        name
                    ),
                    line,
                ),
            }
            self.emit(Instruction::Add);

            // Set `that` to point at the required array element.
            self.emit_pop(Segment::Pointer, 1);
            self.emit_push(Segment::That, 0);

            if self.is_symbol(']') {
                self.input.advance();
                Ok(())
            } else {
                Err(self.terminal_error("Expected ]"))
            }
        } else if self.is_symbol('(') {
            self.compile_internal_call(name, line)
        } else if self.is_symbol('.') {
            self.compile_external_call(name)
        } else {
            self.compile_variable_term(&name, line);
            Ok(())
        }
    }

    /// Push a plain variable and fold its declared type into the
    /// expression type.
    fn compile_variable_term(&mut self, name: &str, line: usize) {
        let (kind, index) = match self.lookup(name) {
            Ok(found) => found,
            Err(_) => {
                self.semantic_error_at(
                    format!(
                        "{} is not defined as a field, parameter or local or static variable",
                        name
                    ),
                    line,
                );
                return;
            }
        };
        self.push_variable(kind, index);

        let ty = match self.symbols.type_of(name) {
            Ok(ty) => ty.to_string(),
            Err(_) => return,
        };
        match ty.as_str() {
            "int" => {
                if self.exp_type() <= ExpType::Numeric {
                    self.set_exp_type(ExpType::Int);
                } else if self.exp_type() > ExpType::Int {
                    self.semantic_error_at("An int value is illegal here".to_string(), line);
                }
            }
            "char" => {
                if self.exp_type() <= ExpType::Numeric {
                    self.set_exp_type(ExpType::Char);
                } else if self.exp_type() > ExpType::Char || self.exp_type() == ExpType::Int {
                    self.semantic_error_at("A char value is illegal here".to_string(), line);
                }
            }
            "boolean" => {
                if self.exp_type() <= ExpType::Numeric {
                    self.set_exp_type(ExpType::Boolean);
                } else if self.exp_type() != ExpType::Boolean {
                    self.semantic_error_at("A boolean value is illegal here".to_string(), line);
                }
            }
            _ => {}
        }
    }

    /// A `do` target or call term: the current token must name a class,
    /// a variable or a subroutine of this class.
    pub(crate) fn compile_subroutine_call(&mut self) -> ParseResult<()> {
        let name = match self.identifier() {
            Some(name) => name,
            None => {
                return Err(self.terminal_error(
                    "Expected class name, subroutine name, field, parameter or local or static variable name",
                ))
            }
        };
        let line = self.input.line();
        self.input.advance();

        if self.is_symbol('.') {
            self.compile_external_call(name)
        } else {
            self.compile_internal_call(name, line)
        }
    }

    /// `receiver.subroutine(...)` where the receiver is either a variable
    /// (a method call on it) or a class name (a function call). The
    /// current token is the `.`.
    fn compile_external_call(&mut self, name: String) -> ParseResult<()> {
        self.input.advance();
        let line = self.input.line();

        // A known variable makes this a method call on it; otherwise the
        // name is taken to be a class.
        let (receiver_type, is_method) = match self.lookup(&name) {
            Ok((kind, index)) => {
                let ty = self
                    .symbols
                    .type_of(&name)
                    .map(str::to_string)
                    .unwrap_or_default();
                self.push_variable(kind, index);
                (ty, true)
            }
            Err(_) => (name, false),
        };

        let full_name = match self.identifier() {
            Some(subroutine) => {
                let full_name = format!("{}.{}", receiver_type, subroutine);
                self.input.advance();
                full_name
            }
            None => return Err(self.terminal_error("Expected subroutine name")),
        };

        let arguments = self.compile_expression_list()?;
        self.emit_call(full_name.clone(), arguments + u16::from(is_method));

        let call = CallSite {
            callee: full_name,
            called_as_method: is_method,
            arguments,
            file: self.file.clone(),
            caller: self.symbols.subroutine_name().map(str::to_string),
            line,
        };
        self.ledger.calls.push(call);
        Ok(())
    }

    /// `subroutine(...)` with no receiver: a method call on the current
    /// object. Only methods may be called this way. `line` is where the
    /// subroutine name appeared.
    fn compile_internal_call(&mut self, name: String, line: usize) -> ParseResult<()> {
        let full_name = format!("{}.{}", self.symbols.class_name(), name);

        // Push `this` of the current object.
        self.emit_push(Segment::Pointer, 0);

        let arguments = self.compile_expression_list()?;
        self.emit_call(full_name.clone(), arguments + 1);

        if self.symbols.subroutine_kind() == Some(SubroutineKind::Function) {
            self.semantic_error_at(
                format!("Subroutine {} called as a method from within a function", full_name),
                line,
            );
        } else {
            let call = CallSite {
                callee: full_name,
                called_as_method: true,
                arguments,
                file: self.file.clone(),
                caller: self.symbols.subroutine_name().map(str::to_string),
                line,
            };
            self.ledger.calls.push(call);
        }
        Ok(())
    }

    /// An expression list including the enclosing parentheses. Returns
    /// the number of expressions.
    fn compile_expression_list(&mut self) -> ParseResult<u16> {
        if self.is_symbol('(') {
            self.input.advance();
        } else {
            return Err(self.terminal_error("Expected ("));
        }

        let mut expressions = 0;
        if self.is_symbol(')') {
            self.input.advance();
            return Ok(expressions);
        }

        loop {
            self.compile_new_expression(ExpType::General)?;
            expressions += 1;
            if self.is_symbol(',') {
                self.input.advance();
            } else if self.is_symbol(')') {
                self.input.advance();
                return Ok(expressions);
            } else {
                return Err(self.terminal_error("Expected , or ) in expression list"));
            }
        }
    }
}
