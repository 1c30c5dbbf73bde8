//! # Chocoflan front end
//!
//! Source text becomes bytecode in a single pass: the [`parser::Parser`]
//! pulls tokens from the [`lexer::Lexer`] one at a time and emits
//! instructions as it recognises each expression. No syntax tree is built.

pub mod lexer;
pub mod parser;
pub mod parser_error;
pub mod token;
pub mod token_dumper;

pub use lexer::Lexer;
pub use parser::Parser;
pub use parser_error::SyntaxError;
pub use token::{Payload, Token, TokenKind};
