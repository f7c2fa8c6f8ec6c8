//! Parser for strategy selectors
//!
//! Parses selectors like:
//! - `naive(ikj)`
//! - `tiled(4)` or `tiled(4, 2)`
//! - `wavefront`
//! - `blocked(8)`
//! - `tensor(2, 2x2x4)`
//! - a preset name such as `tensor-systolic`

use crate::error::{ScheduleError, ScheduleResult};
use crate::hardware::MicroShape;
use crate::lexer::{Lexer, Token};
use crate::strategy::Strategy;

/// Argument of a selector call
#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Number(usize),
    Name(String),
    Dims((usize, usize, usize)),
}

impl Arg {
    fn describe(&self) -> &'static str {
        match self {
            Arg::Number(_) => "a number",
            Arg::Name(_) => "a name",
            Arg::Dims(_) => "MxNxK dimensions",
        }
    }
}

/// Parser for a single strategy selector
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    current: Option<(usize, Token)>,
    source_len: usize,
    error: Option<usize>,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source),
            current: None,
            source_len: source.len(),
            error: None,
        };
        parser.advance();
        parser
    }

    /// Advance to the next token, remembering the first lexing error
    fn advance(&mut self) -> Option<(usize, Token)> {
        let prev = self.current.take();
        self.current = match self.lexer.next() {
            Some((pos, Ok(tok))) => Some((pos, tok)),
            Some((_, Err(pos))) => {
                self.error.get_or_insert(pos);
                None
            }
            None => None,
        };
        prev
    }

    fn position(&self) -> usize {
        self.current
            .as_ref()
            .map(|(pos, _)| *pos)
            .or(self.error)
            .unwrap_or(self.source_len)
    }

    fn check(&self, expected: &Token) -> bool {
        matches!(&self.current, Some((_, tok)) if tok == expected)
    }

    fn unexpected(&self, wanted: &str) -> ScheduleError {
        if let Some(pos) = self.error {
            return ScheduleError::parse_error(pos, "unrecognised character");
        }
        match &self.current {
            Some((pos, tok)) => {
                ScheduleError::parse_error(*pos, format!("expected {}, got '{}'", wanted, tok))
            }
            None => ScheduleError::parse_error(
                self.source_len,
                format!("expected {}, got end of input", wanted),
            ),
        }
    }

    fn expect(&mut self, expected: Token) -> ScheduleResult<()> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", expected)))
        }
    }

    /// Parse a complete selector
    pub fn parse_strategy(&mut self) -> ScheduleResult<Strategy> {
        let (name_pos, name) = match self.advance() {
            Some((pos, Token::Ident(name))) => (pos, name.to_ascii_lowercase()),
            other => {
                self.current = other;
                return Err(self.unexpected("a strategy name"));
            }
        };

        let args = if self.check(&Token::LParen) {
            self.advance();
            self.parse_args()?
        } else {
            Vec::new()
        };

        if self.current.is_some() || self.error.is_some() {
            return Err(self.unexpected("end of input"));
        }

        build_strategy(name_pos, &name, args)
    }

    /// Parse `arg (, arg)* )` after the opening parenthesis
    fn parse_args(&mut self) -> ScheduleResult<Vec<(usize, Arg)>> {
        let mut args = Vec::new();
        if self.check(&Token::RParen) {
            self.advance();
            return Ok(args);
        }

        loop {
            let pos = self.position();
            let arg = match self.advance() {
                Some((_, Token::Number(n))) => Arg::Number(n),
                Some((_, Token::Ident(s))) => Arg::Name(s),
                Some((_, Token::Dims(d))) => Arg::Dims(d),
                other => {
                    self.current = other;
                    return Err(self.unexpected("an argument"));
                }
            };
            args.push((pos, arg));

            if self.check(&Token::Comma) {
                self.advance();
            } else {
                self.expect(Token::RParen)?;
                return Ok(args);
            }
        }
    }
}

/// Parse a strategy selector string
pub fn parse_strategy(source: &str) -> ScheduleResult<Strategy> {
    Parser::new(source).parse_strategy()
}

fn build_strategy(pos: usize, name: &str, args: Vec<(usize, Arg)>) -> ScheduleResult<Strategy> {
    let arity = |expected: &[usize]| -> ScheduleResult<()> {
        if expected.contains(&args.len()) {
            Ok(())
        } else {
            Err(ScheduleError::parse_error(
                pos,
                format!("'{}' takes {:?} argument(s), got {}", name, expected, args.len()),
            ))
        }
    };

    match name {
        "naive" => {
            arity(&[0, 1])?;
            let order = match args.into_iter().next() {
                None => "ijk".to_string(),
                Some((_, Arg::Name(order))) => order,
                Some((p, other)) => return Err(mismatch(p, "a loop order", &other)),
            };
            Ok(Strategy::Naive { order })
        }
        "tiled" => {
            arity(&[1, 2])?;
            let mut nums = numbers(args)?.into_iter();
            let tile_size = nums.next().unwrap_or_default();
            let tile_k = nums.next().unwrap_or(tile_size);
            Ok(Strategy::Tiled { tile_size, tile_k })
        }
        "wavefront" | "systolic" => {
            arity(&[0])?;
            Ok(Strategy::Wavefront)
        }
        "blocked" => {
            arity(&[1])?;
            let array_size = numbers(args)?.first().copied().unwrap_or_default();
            Ok(Strategy::BlockedSystolic { array_size })
        }
        "tensor" => {
            arity(&[2])?;
            let [(p1, first), (p2, second)] = <[(usize, Arg); 2]>::try_from(args)
                .map_err(|_| ScheduleError::parse_error(pos, "'tensor' takes 2 arguments"))?;
            let array_size = match first {
                Arg::Number(n) => n,
                other => return Err(mismatch(p1, "a number", &other)),
            };
            let micro = match second {
                Arg::Dims((m, n, k)) => MicroShape { m, n, k },
                other => return Err(mismatch(p2, "MxNxK dimensions", &other)),
            };
            Ok(Strategy::TensorSystolic { array_size, micro })
        }
        preset => {
            if !args.is_empty() {
                return Err(ScheduleError::parse_error(
                    pos,
                    format!("'{}' takes no arguments", preset),
                ));
            }
            Strategy::preset(preset).ok_or_else(|| {
                ScheduleError::parse_error(pos, format!("unknown strategy '{}'", preset))
            })
        }
    }
}

fn numbers(args: Vec<(usize, Arg)>) -> ScheduleResult<Vec<usize>> {
    args.into_iter()
        .map(|(p, arg)| match arg {
            Arg::Number(n) => Ok(n),
            other => Err(mismatch(p, "a number", &other)),
        })
        .collect()
}

fn mismatch(pos: usize, wanted: &str, got: &Arg) -> ScheduleError {
    ScheduleError::parse_error(pos, format!("expected {}, got {}", wanted, got.describe()))
}
