//! Tokenization of C-family source text.
//!
//! - [`token`]: token kinds, tokens and source positions
//! - [`tokenizer`]: the single-pass [`Tokenizer`] iterator

pub mod token;
pub mod tokenizer;

pub use token::{Position, Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
