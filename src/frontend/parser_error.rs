use crate::frontend::token::Token;
use thiserror::Error;

/// A parsing error with source location.
///
/// `pos` is the byte offset of `token`, the lookahead at the point of failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at pos {pos}, got {token}")]
pub struct SyntaxError {
    pub message: String,
    pub token: Token,
    pub pos: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, token: Token) -> Self {
        let pos = token.pos;
        SyntaxError {
            message: message.into(),
            token,
            pos,
        }
    }
}
