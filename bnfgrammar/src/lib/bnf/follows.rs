use vob::Vob;

use super::grammar::BnfGrammar;
use crate::Symbol;

/// The FOLLOW sets of every non-terminal in a grammar: which terminals can
/// appear immediately after it in some sentential form, plus whether
/// end-of-input can. For the grammar:
///
/// ```text
/// list: elem list | ;
/// elem: ATOM;
/// ```
///
/// both `list` and `elem` can be followed by end-of-input, and `elem` can
/// additionally be followed by `ATOM`.
///
/// Since EOF is the terminal with base 1, the "can EOF follow this
/// non-terminal" flag is simply bit 1 of the set; [`BnfFollows::is_eof_set`]
/// exposes it.
#[derive(Debug)]
pub struct BnfFollows {
    follows: Vec<Vob>,
}

impl BnfFollows {
    /// Generates and returns the FOLLOW sets for the given grammar.
    pub fn new(grm: &BnfGrammar) -> Self {
        let firsts = grm.firsts();
        let nt_len = usize::from(grm.nonterminals_len());
        let t_len = usize::from(grm.terminals_len());
        let mut follows = vec![Vob::from_elem(false, t_len); nt_len];
        follows[usize::from(grm.start_symbol().base())]
            .set(usize::from(Symbol::EOF.base()), true);

        loop {
            let mut changed = false;
            for pidx in grm.iter_pidxs() {
                let prod = grm.prod(pidx);
                let lhs = usize::from(prod.lhs().base());
                // A production's body must be visited at every occurrence of
                // every non-terminal, since each has a different suffix.
                for (sidx, &sym) in prod.rhs().iter().enumerate() {
                    if !sym.is_nonterminal() {
                        continue;
                    }
                    let sub = usize::from(sym.base());
                    let (beta_firsts, beta_nullable) =
                        firsts.suffix_firsts(&prod.rhs()[sidx + 1..]);
                    if follows[sub].or(&beta_firsts) {
                        changed = true;
                    }
                    // An empty suffix counts as nullable; the head's FOLLOW
                    // set (EOF bit included) flows into the occurrence's.
                    if beta_nullable {
                        for t in 0..t_len {
                            if follows[lhs][t] && follows[sub].set(t, true) {
                                changed = true;
                            }
                        }
                    }
                }
            }
            if !changed {
                return BnfFollows { follows };
            }
        }
    }

    /// Return the FOLLOW `Vob` for the non-terminal `sym`.
    pub fn follows(&self, sym: Symbol) -> &Vob {
        debug_assert!(sym.is_nonterminal());
        &self.follows[usize::from(sym.base())]
    }

    /// Returns true if the terminal `term` is in the FOLLOW set of the
    /// non-terminal `sym`.
    pub fn is_set(&self, sym: Symbol, term: Symbol) -> bool {
        debug_assert!(term.is_terminal());
        self.follows(sym)[usize::from(term.base())]
    }

    /// Returns true if EOF can follow the non-terminal `sym`.
    pub fn is_eof_set(&self, sym: Symbol) -> bool {
        self.follows(sym)[usize::from(Symbol::EOF.base())]
    }
}
