//! BNF grammar parsing and analysis. The input syntax consists of productions
//! of the form `head : alt₁ | alt₂ | … ;`, where each alternative is a
//! (possibly empty) sequence of identifiers, optionally suffixed with one of
//! the qualifiers `?`, `*`, or `+`. `//` starts a comment which runs to the
//! end of the line.

pub mod ast;
mod firsts;
mod follows;
mod grammar;
pub mod parser;

pub use firsts::BnfFirsts;
pub use follows::BnfFollows;
pub use grammar::{BnfGrammar, BnfGrammarError, Production};
pub use parser::{BnfParserError, BnfParserErrorKind};
