#![forbid(unsafe_code)]

//! A library for building and analysing BNF context-free grammars. It parses a
//! small BNF-like surface syntax, classifies symbols, and computes the FIRST
//! and FOLLOW sets needed by LR-family table generators.
//!
//! A note on the terminology we use, since there's no universal standard:
//!
//!   * A *production* maps a non-terminal (its head) to a possibly empty,
//!     ordered sequence of symbols. A rule `e: t | e ADD t;` contributes two
//!     productions.
//!   * A *symbol* is either a non-terminal or a terminal. Classification is
//!     purely positional: a name used as a head anywhere is a non-terminal,
//!     every other name is a terminal.
//!
//! [`bnf::BnfGrammar`] makes the following guarantees:
//!
//!   * The grammar has a single augmented start symbol whose sole production
//!     `S' → S` is the production at index 0 (wire number 1).
//!   * Non-terminal bases are numbered densely from 1 (the augmented start);
//!     terminal bases are numbered densely from 2 (base 1 is the EOF
//!     terminal, base 0 is never a real symbol).
//!   * Productions are numbered densely in insertion order and duplicate
//!     productions (same head, same body) collapse to one.
//!
//! For most uses, the main entry point is
//! [`bnf::BnfGrammar::new`](bnf/struct.BnfGrammar.html#method.new), which
//! takes the grammar source text as input.

mod idxnewtype;
mod span;
mod symbol;

pub mod bnf;

pub use crate::{
    idxnewtype::PIdx,
    span::Span,
    symbol::{Symbol, SymbolError, SymbolErrorKind, SymbolKind, SymbolTable},
};
