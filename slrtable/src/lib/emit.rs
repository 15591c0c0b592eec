use bnfgrammar::{bnf::BnfGrammar, Symbol};
use serde::Serialize;

use crate::{StateGraph, StateTable};

/// The wire form of a generated parsing table, serialised by the driver as a
/// single JSON object. Field order is the key order of the output, so
/// serialising the same grammar twice is byte-identical.
///
/// `head_symbols` and `alternative_symbol_counts` are indexed by wire
/// production number (slot 0 is unused and zero). The symbol name arrays are
/// indexed by base; slots without user text (the nil bases and EOF) hold
/// empty strings.
#[derive(Debug, Serialize)]
pub struct TableOutput {
    action: Vec<i32>,
    #[serde(rename = "goto")]
    gotos: Vec<u32>,
    state_count: u32,
    initial_state: u32,
    start_production: u16,
    head_symbols: Vec<u16>,
    alternative_symbol_counts: Vec<u16>,
    eof_symbol: u16,
    terminal_symbols: Vec<String>,
    non_terminal_symbols: Vec<String>,
    terminal_symbol_count: u16,
    non_terminal_symbol_count: u16,
}

impl TableOutput {
    pub fn new(grm: &BnfGrammar, sg: &StateGraph, st: &StateTable) -> TableOutput {
        let prods_len = usize::from(grm.prods_len());
        let mut head_symbols = vec![0; prods_len + 1];
        let mut alternative_symbol_counts = vec![0; prods_len + 1];
        for pidx in grm.iter_pidxs() {
            let num = usize::from(grm.prod_num(pidx));
            head_symbols[num] = grm.prod(pidx).lhs().base();
            alternative_symbol_counts[num] = grm.prod(pidx).rhs().len() as u16;
        }

        let terminal_symbols = (0..grm.terminals_len())
            .map(|base| grm.term_name(base).unwrap_or("").to_owned())
            .collect();
        let non_terminal_symbols = (0..grm.nonterminals_len())
            .map(|base| grm.nonterm_name(base).unwrap_or("").to_owned())
            .collect();

        TableOutput {
            action: st.actions().to_vec(),
            gotos: st.gotos().to_vec(),
            state_count: sg.all_states_len(),
            initial_state: u32::from(sg.start_state()),
            start_production: grm.prod_num(grm.start_prod()),
            head_symbols,
            alternative_symbol_counts,
            eof_symbol: Symbol::EOF.base(),
            terminal_symbols,
            non_terminal_symbols,
            terminal_symbol_count: grm.terminals_len(),
            non_terminal_symbol_count: grm.nonterminals_len(),
        }
    }
}
