use std::{error::Error, fmt};

use lazy_static::lazy_static;
use regex::Regex;

use super::ast::{ASTAlternative, ASTProduction, ASTSymbol, GrammarAST, Qualifier};
use crate::Span;

/// The various different possible parse errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BnfParserErrorKind {
    IllegalName,
    MissingColon,
    IncompleteProduction,
    PrematureEnd,
}

impl fmt::Display for BnfParserErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BnfParserErrorKind::IllegalName => "Illegal name",
            BnfParserErrorKind::MissingColon => "Missing ':'",
            BnfParserErrorKind::IncompleteProduction => "Production ends prematurely",
            BnfParserErrorKind::PrematureEnd => "Grammar contains no productions",
        };
        write!(f, "{}", s)
    }
}

/// Any error from the BNF parser returns an instance of this struct.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BnfParserError {
    pub kind: BnfParserErrorKind,
    pub span: Span,
}

impl Error for BnfParserError {}

impl fmt::Display for BnfParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.span.start())
    }
}

lazy_static! {
    static ref RE_NAME: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").unwrap();
}

/// Parse grammar source text into a `GrammarAST`.
pub fn parse(src: &str) -> Result<GrammarAST, BnfParserError> {
    BnfParser { src }.parse()
}

struct BnfParser<'a> {
    src: &'a str,
}

impl BnfParser<'_> {
    fn parse(&self) -> Result<GrammarAST, BnfParserError> {
        let mut prods = Vec::new();
        let mut i = self.parse_ws(0);
        while i < self.src.len() {
            let (j, prod) = self.parse_production(i)?;
            prods.push(prod);
            i = self.parse_ws(j);
        }
        if prods.is_empty() {
            return Err(BnfParserError {
                kind: BnfParserErrorKind::PrematureEnd,
                span: Span::new(0, 0),
            });
        }
        Ok(GrammarAST { prods })
    }

    fn parse_production(&self, i: usize) -> Result<(usize, ASTProduction), BnfParserError> {
        let (j, head, head_span) = self.parse_name(i)?;
        let mut i = self.parse_ws(j);
        match self.lookahead_is(":", i) {
            Some(j) => i = self.parse_ws(j),
            None => {
                return Err(BnfParserError {
                    kind: BnfParserErrorKind::MissingColon,
                    span: Span::new(i, i),
                })
            }
        }
        let mut alternatives = Vec::new();
        loop {
            let (j, alt) = self.parse_alternative(i)?;
            alternatives.push(alt);
            // parse_alternative only returns at a ';' or '|'.
            if let Some(j) = self.lookahead_is(";", j) {
                i = j;
                break;
            }
            i = self.parse_ws(self.lookahead_is("|", j).unwrap());
        }
        Ok((
            i,
            ASTProduction {
                head,
                head_span,
                alternatives,
            },
        ))
    }

    fn parse_alternative(&self, mut i: usize) -> Result<(usize, ASTAlternative), BnfParserError> {
        let mut symbols = Vec::new();
        loop {
            if i == self.src.len() {
                return Err(BnfParserError {
                    kind: BnfParserErrorKind::IncompleteProduction,
                    span: Span::new(i, i),
                });
            }
            if self.lookahead_is(";", i).is_some() || self.lookahead_is("|", i).is_some() {
                return Ok((i, ASTAlternative { symbols }));
            }
            let (j, name, span) = self.parse_name(i)?;
            i = self.parse_ws(j);
            let mut qualifier = None;
            for (s, q) in [
                ("?", Qualifier::Optional),
                ("*", Qualifier::ZeroOrMore),
                ("+", Qualifier::OneOrMore),
            ] {
                if let Some(j) = self.lookahead_is(s, i) {
                    qualifier = Some(q);
                    i = self.parse_ws(j);
                    break;
                }
            }
            symbols.push(ASTSymbol {
                name,
                span,
                qualifier,
            });
        }
    }

    fn parse_name(&self, i: usize) -> Result<(usize, String, Span), BnfParserError> {
        match RE_NAME.find(&self.src[i..]) {
            Some(m) => {
                assert_eq!(m.start(), 0);
                let j = i + m.end();
                Ok((j, self.src[i..j].to_owned(), Span::new(i, j)))
            }
            None => Err(BnfParserError {
                kind: BnfParserErrorKind::IllegalName,
                span: Span::new(i, i),
            }),
        }
    }

    /// Skip whitespace and `//` comments starting at byte `i`, returning the
    /// byte offset of the next interesting character.
    fn parse_ws(&self, mut i: usize) -> usize {
        while i < self.src.len() {
            let c = self.src[i..].chars().next().unwrap();
            if c.is_whitespace() {
                i += c.len_utf8();
            } else if self.src[i..].starts_with("//") {
                match self.src[i..].find('\n') {
                    Some(j) => i += j + 1,
                    None => i = self.src.len(),
                }
            } else {
                break;
            }
        }
        i
    }

    fn lookahead_is(&self, s: &str, i: usize) -> Option<usize> {
        if self.src[i..].starts_with(s) {
            Some(i + s.len())
        } else {
            None
        }
    }
}
