//! Token definitions for the Jack tokenizer.

/// Reserved words of the Jack language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    /// Look up a reserved word. Keywords are recognized before generic
    /// identifiers.
    pub fn lookup(word: &str) -> Option<Keyword> {
        match word {
            "class" => Some(Keyword::Class),
            "constructor" => Some(Keyword::Constructor),
            "function" => Some(Keyword::Function),
            "method" => Some(Keyword::Method),
            "field" => Some(Keyword::Field),
            "static" => Some(Keyword::Static),
            "var" => Some(Keyword::Var),
            "int" => Some(Keyword::Int),
            "char" => Some(Keyword::Char),
            "boolean" => Some(Keyword::Boolean),
            "void" => Some(Keyword::Void),
            "true" => Some(Keyword::True),
            "false" => Some(Keyword::False),
            "null" => Some(Keyword::Null),
            "this" => Some(Keyword::This),
            "let" => Some(Keyword::Let),
            "do" => Some(Keyword::Do),
            "if" => Some(Keyword::If),
            "else" => Some(Keyword::Else),
            "while" => Some(Keyword::While),
            "return" => Some(Keyword::Return),
            _ => None,
        }
    }
}

/// All token types in Jack. Exactly one variant describes any one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    /// A single-character symbol. Characters outside the language's symbol
    /// set also lex as symbols and are rejected by the parser, which keeps
    /// the tokenizer total.
    Symbol(char),
    Identifier(String),
    /// Unsigned integer literal. Values above 32767 are a semantic error
    /// reported by the compilation engine, not a lex error.
    IntConst(u32),
    /// String literal without the surrounding quotes. Must close on the
    /// line it opened on; at end of line it is silently terminated.
    StringConst(String),
    /// End of input. Consuming past the end keeps yielding this.
    Eof,
}

impl TokenKind {
    pub fn is_symbol(&self, symbol: char) -> bool {
        matches!(self, TokenKind::Symbol(c) if *c == symbol)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == keyword)
    }
}

/// A classified token together with the source line it appeared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize) -> Self {
        Self { kind, line }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenKind::Eof, line)
    }
}
