//! The lexer.
//!
//! Tokenizes by trying a fixed, ordered list of regexes at the current
//! position (longest/most-specific alternatives first, e.g. `==` before
//! `=`), the same approach the teaching compiler this crate grew out of
//! used.

use derive_more::Display;
use regex::Regex;

/// Tokens in the program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("kind: '{kind}', part of input: '{text}'")]
pub struct Token<'src> {
    /// What token class this token belongs to.
    pub kind: TokenKind,
    /// What part of the input this token carries.
    pub text: &'src str,
}

/// Token classes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display, Debug)]
pub enum TokenKind {
    #[display("id")]
    Id,
    #[display("num")]
    Num,

    #[display("int")]
    KwInt,
    #[display("if")]
    KwIf,
    #[display("else")]
    KwElse,
    #[display("while")]
    KwWhile,
    #[display("for")]
    KwFor,
    #[display("return")]
    KwReturn,
    #[display("sizeof")]
    KwSizeof,

    #[display("(")]
    LParen,
    #[display(")")]
    RParen,
    #[display("{{")]
    LBrace,
    #[display("}}")]
    RBrace,
    #[display("[")]
    LBracket,
    #[display("]")]
    RBracket,
    #[display(";")]
    Semi,
    #[display(",")]
    Comma,

    #[display("==")]
    EqEq,
    #[display("!=")]
    Ne,
    #[display("<=")]
    Le,
    #[display(">=")]
    Ge,
    #[display("<")]
    Lt,
    #[display(">")]
    Gt,
    #[display("=")]
    Assign,
    #[display("+")]
    Plus,
    #[display("-")]
    Minus,
    #[display("*")]
    Star,
    #[display("/")]
    Slash,
    #[display("%")]
    Percent,
    #[display("!")]
    Bang,
    #[display("~")]
    Tilde,
}

/// A lexer error: an input byte that no token regex could account for.
pub struct LexError(pub usize, pub char);

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lexer error: unexpected character {:?} at {}", self.1, self.0)
    }
}

impl std::fmt::Debug for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

fn keyword_or_id(text: &str) -> TokenKind {
    match text {
        "int" => TokenKind::KwInt,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "for" => TokenKind::KwFor,
        "return" => TokenKind::KwReturn,
        "sizeof" => TokenKind::KwSizeof,
        _ => TokenKind::Id,
    }
}

pub struct Lexer<'input> {
    input: &'input str,
    pos: usize,
    whitespace: Regex,
    id_or_num: Regex,
    matchers: Vec<(Regex, TokenKind)>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        // Longest-alternative-first so that e.g. `==` is never split into
        // two `=` tokens.
        let matchers = vec![
            (Regex::new(r"\A==").unwrap(), TokenKind::EqEq),
            (Regex::new(r"\A!=").unwrap(), TokenKind::Ne),
            (Regex::new(r"\A<=").unwrap(), TokenKind::Le),
            (Regex::new(r"\A>=").unwrap(), TokenKind::Ge),
            (Regex::new(r"\A<").unwrap(), TokenKind::Lt),
            (Regex::new(r"\A>").unwrap(), TokenKind::Gt),
            (Regex::new(r"\A=").unwrap(), TokenKind::Assign),
            (Regex::new(r"\A\+").unwrap(), TokenKind::Plus),
            (Regex::new(r"\A-").unwrap(), TokenKind::Minus),
            (Regex::new(r"\A\*").unwrap(), TokenKind::Star),
            (Regex::new(r"\A/").unwrap(), TokenKind::Slash),
            (Regex::new(r"\A%").unwrap(), TokenKind::Percent),
            (Regex::new(r"\A!").unwrap(), TokenKind::Bang),
            (Regex::new(r"\A~").unwrap(), TokenKind::Tilde),
            (Regex::new(r"\A\(").unwrap(), TokenKind::LParen),
            (Regex::new(r"\A\)").unwrap(), TokenKind::RParen),
            (Regex::new(r"\A\{").unwrap(), TokenKind::LBrace),
            (Regex::new(r"\A\}").unwrap(), TokenKind::RBrace),
            (Regex::new(r"\A\[").unwrap(), TokenKind::LBracket),
            (Regex::new(r"\A\]").unwrap(), TokenKind::RBracket),
            (Regex::new(r"\A;").unwrap(), TokenKind::Semi),
            (Regex::new(r"\A,").unwrap(), TokenKind::Comma),
        ];

        Lexer {
            input,
            pos: 0,
            whitespace: Regex::new(r"\A(?:[ \t\f\r\n\v]|(?://[^\n]*))*").unwrap(),
            id_or_num: Regex::new(r"\A(?:[A-Za-z_][A-Za-z0-9_]*|[0-9]+)").unwrap(),
            matchers,
        }
    }

    /// Has the lexer reached the end of input?
    pub fn end_of_input(&self) -> bool {
        self.skip_whitespace_preview() == self.input.len()
    }

    fn skip_whitespace_preview(&self) -> usize {
        self.pos
            + self
                .whitespace
                .find(&self.input[self.pos..])
                .map(|m| m.end())
                .unwrap_or(0)
    }

    fn skip_whitespace(&mut self) {
        self.pos = self.skip_whitespace_preview();
    }

    /// Get the next token, if any remain.
    ///
    /// The return type distinguishes between end-of-input (`Ok(None)`) and a
    /// genuine lexer error.
    pub fn next(&mut self) -> Result<Option<Token<'input>>, LexError> {
        self.skip_whitespace();

        if self.pos == self.input.len() {
            return Ok(None);
        }

        let rest = &self.input[self.pos..];

        if let Some(m) = self.id_or_num.find(rest) {
            let text = m.as_str();
            let kind = if text.as_bytes()[0].is_ascii_digit() {
                TokenKind::Num
            } else {
                keyword_or_id(text)
            };
            let start = self.pos;
            self.pos += m.end();
            return Ok(Some(Token {
                kind,
                text: &self.input[start..self.pos],
            }));
        }

        for (re, kind) in &self.matchers {
            if let Some(m) = re.find(rest) {
                let start = self.pos;
                self.pos += m.end();
                return Ok(Some(Token {
                    kind: *kind,
                    text: &self.input[start..self.pos],
                }));
            }
        }

        let bad = rest.chars().next().unwrap();
        Err(LexError(self.pos, bad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next().unwrap() {
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn keywords_and_ids() {
        assert_eq!(
            kinds("int if elsewhere"),
            vec![TokenKind::KwInt, TokenKind::KwIf, TokenKind::Id]
        );
    }

    #[test]
    fn longest_match_for_operators() {
        assert_eq!(
            kinds("a <= b < c"),
            vec![TokenKind::Id, TokenKind::Le, TokenKind::Id, TokenKind::Lt, TokenKind::Id]
        );
    }

    #[test]
    fn minus_is_its_own_token_not_part_of_the_literal() {
        // `a-1` must lex as `a`, `-`, `1`: negative numbers are a unary
        // minus applied to a literal, not a single signed-literal token.
        assert_eq!(
            kinds("a-1"),
            vec![TokenKind::Id, TokenKind::Minus, TokenKind::Num]
        );
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        assert_eq!(
            kinds("a // comment\n  + b"),
            vec![TokenKind::Id, TokenKind::Plus, TokenKind::Id]
        );
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let mut lexer = Lexer::new("a @ b");
        assert!(lexer.next().unwrap().is_some()); // a
        assert!(lexer.next().is_err());
    }
}
