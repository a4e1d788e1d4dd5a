//! Lazy tokenizer for one Jack compilation unit.

use crate::lexer::token::{Keyword, Token, TokenKind};

/// Turns source text into a stream of classified tokens with line numbers.
///
/// The stream keeps one token of lookahead, mirroring how the parser
/// consumes it: `advance()` must be called once before any accessor and
/// after each consumed token. `has_more_tokens()` reports whether the
/// lookahead is still a real token; consuming past the end yields `Eof`
/// tokens forever, so every parser loop terminates.
pub struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    current: Token,
    lookahead: Token,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut tokenizer = Self {
            chars: source.chars().peekable(),
            line: 1,
            current: Token::eof(0),
            lookahead: Token::eof(0),
        };
        tokenizer.lookahead = tokenizer.scan_token();
        tokenizer
    }

    /// Consume the lookahead token, making it the current one.
    pub fn advance(&mut self) {
        let next = self.scan_token();
        self.current = std::mem::replace(&mut self.lookahead, next);
    }

    /// True while the pre-read lookahead is a real token.
    pub fn has_more_tokens(&self) -> bool {
        self.lookahead.kind != TokenKind::Eof
    }

    /// The kind of the current (last advanced-to) token.
    pub fn kind(&self) -> &TokenKind {
        &self.current.kind
    }

    /// The source line the current token appeared on.
    pub fn line(&self) -> usize {
        self.current.line
    }

    // ===== Scanning =====

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn scan_token(&mut self) -> Token {
        loop {
            let Some(c) = self.bump() else {
                return Token::eof(self.line);
            };

            match c {
                ' ' | '\t' | '\r' => continue,
                '\n' => {
                    self.line += 1;
                    continue;
                }
                '/' => match self.peek() {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => {
                        self.bump();
                        self.skip_block_comment();
                    }
                    _ => return Token::new(TokenKind::Symbol('/'), self.line),
                },
                '"' => return self.scan_string(),
                c if c.is_ascii_digit() => return self.scan_number(c),
                c if c.is_ascii_alphabetic() || c == '_' => return self.scan_word(c),
                // Everything else is a one-character symbol; the parser
                // rejects characters outside the language's symbol set.
                c => return Token::new(TokenKind::Symbol(c), self.line),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) {
        // Not nested; an unterminated comment swallows the rest of the unit.
        while let Some(c) = self.bump() {
            match c {
                '\n' => self.line += 1,
                '*' if self.peek() == Some('/') => {
                    self.bump();
                    return;
                }
                _ => {}
            }
        }
    }

    fn scan_string(&mut self) -> Token {
        let line = self.line;
        let mut value = String::new();
        loop {
            match self.peek() {
                // A string must close on the line it opened on; at end of
                // line (or input) it is silently terminated.
                None | Some('\n') => break,
                Some('"') => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }
        Token::new(TokenKind::StringConst(value), line)
    }

    fn scan_number(&mut self, first: char) -> Token {
        let mut value = first.to_digit(10).unwrap_or(0);
        while let Some(c) = self.peek() {
            let Some(digit) = c.to_digit(10) else { break };
            self.bump();
            // Saturate absurd digit runs; anything above 32767 is reported
            // by the engine either way.
            value = value.saturating_mul(10).saturating_add(digit);
        }
        Token::new(TokenKind::IntConst(value), self.line)
    }

    fn scan_word(&mut self, first: char) -> Token {
        let mut word = String::new();
        word.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
                word.push(c);
            } else {
                break;
            }
        }
        let kind = match Keyword::lookup(&word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(word),
        };
        Token::new(kind, self.line)
    }
}
