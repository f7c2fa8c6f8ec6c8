//! Lexer for strategy selectors using logos
//!
//! Supports tokens like:
//! - Names: naive, tiled, tensor-systolic, ijk
//! - Counts: 4, 16
//! - Micro tile dimensions: 2x2x4
//! - Punctuation: (, ), ,

use logos::Logos;

/// Token types for the strategy selector language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    #[regex(r"[0-9]+x[0-9]+x[0-9]+", parse_dims)]
    Dims((usize, usize, usize)),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Number(usize),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_\-]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,
}

fn parse_dims(lex: &mut logos::Lexer<Token>) -> Option<(usize, usize, usize)> {
    let mut parts = lex.slice().split('x').map(|p| p.parse::<usize>().ok());
    Some((parts.next()??, parts.next()??, parts.next()??))
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Dims((m, n, k)) => write!(f, "{}x{}x{}", m, n, k),
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "{}", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Lexer wrapper yielding tokens with their byte offset
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    /// `Err(position)` marks an unrecognised character
    type Item = (usize, Result<Token, usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let tok = self.inner.next()?;
        let pos = self.inner.span().start;
        Some((pos, tok.map_err(|_| pos)))
    }
}
