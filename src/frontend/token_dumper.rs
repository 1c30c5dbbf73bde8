use std::fmt::Write;

use crate::frontend::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const RED: &'static str = "\x1b[31m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";
    const BLD: &'static str = "\x1b[1m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn dump(&self, tokens: &[Token]) {
        print!("{}", self.render(tokens));
    }

    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for t in tokens {
            self.render_one(&mut out, t);
        }
        out
    }

    fn render_one(&self, out: &mut String, t: &Token) {
        let colr = if self.color { self.color(t.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        let _ = writeln!(
            out,
            "[{:04}] {}{:<7} {}{}",
            t.pos,
            colr,
            t.kind.name(),
            t.payload,
            reset
        );
    }

    fn color(&self, kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Eof => Self::DIM,
            Error => Self::RED,
            Number => Self::CYN,
            Ident => Self::YEL,
            Add | Sub | Mul | Div => Self::MAG,
            Main | End | Def => Self::BLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_dump() {
        let tokens = Lexer::new("10 def x").tokenize();
        let text = TokenDumper::new().no_color().render(&tokens);
        assert_eq!(
            text,
            "[0000] NUMBER  10\n[0003] DEF     def\n[0007] IDENT   x\n[0008] EOF     None\n"
        );
    }

    #[test]
    fn test_colored_dump_wraps_in_escapes() {
        let tokens = Lexer::new("?").tokenize();
        let text = TokenDumper::new().render(&tokens);
        assert!(text.starts_with("[0000] \x1b[31mERROR"));
        assert!(text.lines().all(|l| l.ends_with("\x1b[0m")));
    }
}
