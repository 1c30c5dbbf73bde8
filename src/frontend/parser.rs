use crate::bytecode::{Op, Program};
use crate::frontend::lexer::Lexer;
use crate::frontend::parser_error::SyntaxError;
use crate::frontend::token::{Payload, Token, TokenKind};
use tracing::debug;

/// Recursive-descent parser and code generator.
///
/// Grammar (EOF required at the end):
///
/// ```text
/// program    := MAIN code_block END EOF
///             | code_block EOF
/// code_block := { expression }
/// expression := NUMBER | IDENT | DEF IDENT | ADD | SUB | MUL | DIV
/// ```
///
/// Tokens are pulled from the lexer one at a time; the parser always holds
/// exactly one lookahead token and never backtracks. Instructions are emitted
/// while parsing.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    code: Vec<Op>,
}

impl<'src> Parser<'src> {
    pub fn new(mut lexer: Lexer<'src>) -> Self {
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            code: Vec::new(),
        }
    }

    /// The lookahead token.
    pub fn current(&self) -> &Token {
        &self.current
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.current.clone())
    }

    /// Consumes the lookahead if it is of `kind`.
    ///
    /// Returns false and leaves the lookahead untouched otherwise.
    pub fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.current.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Like [`Parser::match_kind`], but a mismatch is a syntax error.
    pub fn expect(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.match_kind(kind) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {}", kind)))
        }
    }

    fn emit(&mut self, op: Op) {
        self.code.push(op);
    }

    /// Parses the whole input and returns the compiled program.
    ///
    /// The program ends with a single `Halt`.
    pub fn program(mut self) -> Result<Program, SyntaxError> {
        if self.match_kind(TokenKind::Main) {
            self.code_block()?;
            self.expect(TokenKind::End)?;
        } else {
            self.code_block()?;
        }
        self.expect(TokenKind::Eof)?;
        self.emit(Op::Halt);

        debug!(instructions = self.code.len(), "compiled program");
        Ok(Program::new(self.code))
    }

    fn code_block(&mut self) -> Result<(), SyntaxError> {
        while !matches!(self.current.kind, TokenKind::End | TokenKind::Eof) {
            self.expression()?;
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<(), SyntaxError> {
        match self.current.kind {
            TokenKind::Number => {
                let value = self
                    .current
                    .int()
                    .ok_or_else(|| self.error("Malformed number token"))?;
                self.advance();
                self.emit(Op::Push(value));
            }
            TokenKind::Ident => {
                let name = self.ident_text()?;
                self.advance();
                self.emit(Op::Load(name));
            }
            TokenKind::Def => {
                self.advance();
                if self.current.kind != TokenKind::Ident {
                    return Err(self.error("Identifier after 'def'"));
                }
                let name = self.ident_text()?;
                self.advance();
                self.emit(Op::Store(name));
            }
            TokenKind::Add => self.operator(Op::Add),
            TokenKind::Sub => self.operator(Op::Sub),
            TokenKind::Mul => self.operator(Op::Mul),
            TokenKind::Div => self.operator(Op::Div),
            TokenKind::Error => {
                return Err(match &self.current.payload {
                    Payload::Text(_) => self.error("Integer literal out of range"),
                    _ => self.error("Unexpected character"),
                });
            }
            TokenKind::Main | TokenKind::End | TokenKind::Eof => {
                return Err(self.error("Unexpected token in expression"));
            }
        }
        Ok(())
    }

    fn operator(&mut self, op: Op) {
        self.advance();
        self.emit(op);
    }

    fn ident_text(&self) -> Result<String, SyntaxError> {
        self.current
            .text()
            .map(str::to_string)
            .ok_or_else(|| self.error("Malformed identifier token"))
    }
}
