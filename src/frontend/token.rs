use serde::{Deserialize, Serialize};

/// Kind of a lexed token.
///
/// The set is closed: the parser matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Keywords
    Main,
    End,
    Def,

    Ident,
    Number,

    // Operators
    Add,
    Sub,
    Mul,
    Div,

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Looks up a lexeme in the keyword table. Keywords are case-insensitive.
    pub fn keyword(lexeme: &str) -> Option<TokenKind> {
        match lexeme.to_ascii_lowercase().as_str() {
            "main" => Some(TokenKind::Main),
            "end" => Some(TokenKind::End),
            "def" => Some(TokenKind::Def),
            _ => None,
        }
    }

    /// Upper-case name used in diagnostics and token dumps.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Main => "MAIN",
            TokenKind::End => "END",
            TokenKind::Def => "DEF",
            TokenKind::Ident => "IDENT",
            TokenKind::Number => "NUMBER",
            TokenKind::Add => "ADD",
            TokenKind::Sub => "SUB",
            TokenKind::Mul => "MUL",
            TokenKind::Div => "DIV",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "ERROR",
        }
    }

    /// Returns true for the four arithmetic operator tokens.
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Add | TokenKind::Sub | TokenKind::Mul | TokenKind::Div
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value carried alongside a token kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    None,
    /// Original-case text of an identifier or keyword, or the lexeme of an
    /// out-of-range integer literal.
    Text(String),
    Int(i64),
    /// Operator character, or the unrecognised character of an `Error` token.
    Char(char),
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::None => write!(f, "None"),
            Payload::Text(s) => write!(f, "{}", s),
            Payload::Int(n) => write!(f, "{}", n),
            Payload::Char(c) => write!(f, "{}", c),
        }
    }
}

/// A single token produced by the lexer.
///
/// `pos` is the byte offset of the token's first character in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub payload: Payload,
    pub pos: usize,
}

impl Token {
    pub fn new(kind: TokenKind, payload: Payload, pos: usize) -> Self {
        Token { kind, payload, pos }
    }

    pub fn eof(pos: usize) -> Self {
        Token::new(TokenKind::Eof, Payload::None, pos)
    }

    /// Text payload, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if any.
    pub fn int(&self) -> Option<i64> {
        match self.payload {
            Payload::Int(n) => Some(n),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    /// Formats as `[KIND, payload]`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.kind, self.payload)
    }
}
