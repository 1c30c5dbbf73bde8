use crate::frontend::token::{Payload, Token, TokenKind};
use tracing::trace;

/// On-demand tokenizer over a source string.
///
/// Each call to [`Lexer::next_token`] skips leading whitespace and returns
/// exactly one token. Once the input is exhausted the lexer keeps returning
/// `Eof` at the final offset. Unrecognised characters come back as `Error`
/// tokens; the lexer itself never fails.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer { source, pos: 0 }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn current(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while let Some(ch) = self.current() {
            if pred(ch) {
                self.advance();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Returns the next token, advancing past it.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos;

        let token = match self.current() {
            None => Token::eof(start),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.read_identifier(start),
            Some(ch) if ch.is_ascii_digit() => self.read_number(start),
            Some(_) => self.read_operator(start),
        };

        trace!(kind = %token.kind, pos = token.pos, "lexed token");
        token
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, Payload::Text(text.to_string()), start)
    }

    fn read_number(&mut self, start: usize) -> Token {
        let digits = self.take_while(|c| c.is_ascii_digit());
        match digits.parse::<i64>() {
            Ok(value) => Token::new(TokenKind::Number, Payload::Int(value), start),
            // Only overflow can fail here: the run is all ASCII digits.
            Err(_) => Token::new(TokenKind::Error, Payload::Text(digits.to_string()), start),
        }
    }

    fn read_operator(&mut self, start: usize) -> Token {
        let Some(ch) = self.advance() else {
            return Token::eof(start);
        };

        let kind = match ch {
            '+' => TokenKind::Add,
            '-' => TokenKind::Sub,
            '*' => TokenKind::Mul,
            '/' => TokenKind::Div,
            _ => TokenKind::Error,
        };
        Token::new(kind, Payload::Char(ch), start)
    }

    /// Lexes the whole input, including the trailing `Eof` token.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}

/// Yields tokens up to, but not including, the first `Eof`.
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            kinds("10 20 + 5 *"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Add,
                TokenKind::Number,
                TokenKind::Mul,
            ]
        );
    }

    #[test]
    fn test_operators_carry_their_character() {
        let tokens: Vec<Token> = Lexer::new("+ - * /").collect();
        let payloads: Vec<Payload> = tokens.into_iter().map(|t| t.payload).collect();
        assert_eq!(
            payloads,
            vec![
                Payload::Char('+'),
                Payload::Char('-'),
                Payload::Char('*'),
                Payload::Char('/'),
            ]
        );
    }

    #[test]
    fn test_keywords_keep_original_case() {
        let tokens = Lexer::new("MAIN Def end").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Main, Payload::Text("MAIN".into()), 0),
                Token::new(TokenKind::Def, Payload::Text("Def".into()), 5),
                Token::new(TokenKind::End, Payload::Text("end".into()), 9),
                Token::eof(12),
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        let tokens: Vec<Token> = Lexer::new("_tmp x1 Foo_Bar mainly").collect();
        let texts: Vec<&str> = tokens.iter().filter_map(|t| t.text()).collect();
        assert_eq!(texts, vec!["_tmp", "x1", "Foo_Bar", "mainly"]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Ident));
    }

    #[test]
    fn test_number_followed_by_identifier() {
        let tokens: Vec<Token> = Lexer::new("12abc").collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].int(), Some(12));
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].pos, 2);
    }

    #[test]
    fn test_positions_skip_whitespace() {
        let positions: Vec<usize> = Lexer::new("  10\n\tdef   x").map(|t| t.pos).collect();
        assert_eq!(positions, vec![2, 6, 12]);
    }

    #[test]
    fn test_unknown_character_is_error_token() {
        let tokens = Lexer::new("1 ? 2").tokenize();
        assert_eq!(tokens[1], Token::new(TokenKind::Error, Payload::Char('?'), 2));
        assert_eq!(tokens[2].int(), Some(2));
    }

    #[test]
    fn test_non_ascii_is_error_token() {
        let tokens = Lexer::new("é 1").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].payload, Payload::Char('é'));
        // Offsets are in bytes.
        assert_eq!(tokens[1].pos, 3);
    }

    #[test]
    fn test_integer_overflow_is_error_token() {
        let tokens = Lexer::new("99999999999999999999").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].text(), Some("99999999999999999999"));
    }

    #[test]
    fn test_i64_max_literal() {
        let tokens = Lexer::new("9223372036854775807").tokenize();
        assert_eq!(tokens[0].int(), Some(i64::MAX));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("x  ");
        assert_eq!(lexer.next_token().kind, TokenKind::Ident);
        assert_eq!(lexer.next_token(), Token::eof(3));
        assert_eq!(lexer.next_token(), Token::eof(3));
        assert_eq!(lexer.next_token(), Token::eof(3));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Lexer::new("").tokenize(), vec![Token::eof(0)]);
        assert_eq!(Lexer::new(" \t\n ").tokenize(), vec![Token::eof(4)]);
    }
}
