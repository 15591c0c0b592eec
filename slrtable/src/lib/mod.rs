#![forbid(unsafe_code)]

//! SLR(1) parsing table generation. Given a [`BnfGrammar`], this crate builds
//! the LR(0) automaton of item sets ([`StateGraph`]), derives the dense
//! SLR(1) ACTION/GOTO table ([`StateTable`]) using the grammar's FOLLOW sets,
//! and packages the result for serialisation ([`TableOutput`]).
//!
//! Construction is strictly phased and each phase is a pure function of its
//! predecessors, so running the whole pipeline twice over the same grammar
//! produces identical results.

use bnfgrammar::bnf::BnfGrammar;

mod emit;
mod itemset;
mod stategraph;
pub mod statetable;

pub use crate::{
    emit::TableOutput,
    itemset::{closure, Item, Kernel},
    stategraph::{lr0_stategraph, StateGraph},
    statetable::{Action, StateTable, StateTableError, StateTableErrorKind},
};

macro_rules! IdxNewtype {
    ($(#[$attr:meta])* $n: ident, $storage: ty) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $n(pub $storage);

        impl From<$n> for usize {
            fn from(idx: $n) -> Self {
                idx.0 as usize
            }
        }

        impl From<$n> for u32 {
            fn from(idx: $n) -> Self {
                idx.0
            }
        }
    };
}

IdxNewtype!(
    /// A type specifically for automaton state indices. States are numbered
    /// densely in discovery order; state 0 is the initial state.
    StIdx,
    u32
);

/// Build the LR(0) automaton and the SLR(1) state table for `grm` in one go.
pub fn from_bnf(grm: &BnfGrammar) -> Result<(StateGraph, StateTable), StateTableError> {
    let sg = lr0_stategraph(grm);
    let st = StateTable::new(grm, &sg)?;
    Ok((sg, st))
}
