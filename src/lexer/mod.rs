//! Lexical analysis for Jack source text.

mod token;
mod tokenizer;

pub use self::token::{Keyword, Token, TokenKind};
pub use self::tokenizer::Tokenizer;
