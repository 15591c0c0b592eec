use std::{error::Error, fmt};

use bnfgrammar::{bnf::BnfGrammar, PIdx, Symbol};

use crate::{StateGraph, StIdx};

/// The various different possible state table errors. Conflicts are fatal:
/// there is no precedence machinery to resolve them, so the first one
/// encountered aborts table construction.
#[derive(Debug, Eq, PartialEq)]
pub enum StateTableErrorKind {
    ShiftReduceConflict {
        stidx: StIdx,
        /// The text of the conflicting terminal.
        token: String,
        shift_stidx: StIdx,
        /// A rendering of the production the competing reduce refers to.
        reduce_prod: String,
    },
    ReduceReduceConflict {
        stidx: StIdx,
        token: String,
        prod1: String,
        prod2: String,
    },
    /// No accept action was generated. This indicates a bug in automaton or
    /// table construction, not a problem with the grammar.
    MissingAcceptAction,
}

/// Any error from the SLR table builder returns an instance of this struct.
#[derive(Debug, Eq, PartialEq)]
pub struct StateTableError {
    pub kind: StateTableErrorKind,
}

impl Error for StateTableError {}

impl fmt::Display for StateTableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            StateTableErrorKind::ShiftReduceConflict {
                stidx,
                token,
                shift_stidx,
                reduce_prod,
            } => write!(
                f,
                "Shift/reduce conflict in state {} on \"{}\": Shift({}) / Reduce({})",
                usize::from(*stidx),
                token,
                usize::from(*shift_stidx),
                reduce_prod
            ),
            StateTableErrorKind::ReduceReduceConflict {
                stidx,
                token,
                prod1,
                prod2,
            } => write!(
                f,
                "Reduce/reduce conflict in state {} on \"{}\": Reduce({}) / Reduce({})",
                usize::from(*stidx),
                token,
                prod1,
                prod2
            ),
            StateTableErrorKind::MissingAcceptAction => {
                write!(f, "Internal invariant violated: no accept action generated")
            }
        }
    }
}

/// The action of a state on a terminal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Shift to state X.
    Shift(StIdx),
    /// Reduce production X in the grammar. Reducing the augmented start
    /// production (`PIdx(0)`, wire number 1) on EOF is how a driving parser
    /// recognises acceptance.
    Reduce(PIdx),
    /// No valid action.
    Error,
}

/// A dense SLR(1) parsing table: two flat arrays indexed by
/// `state × axis + base`. An ACTION cell encodes its tri-state in a single
/// signed integer — 0 is empty, a negative value `-s` shifts to state `s`,
/// and a positive value `p` reduces the production with wire number `p`. A
/// GOTO cell is 0 when empty, since the initial state can never be a GOTO
/// target. Construction relies on the arrays being zero-initialised.
pub struct StateTable {
    actions: Vec<i32>,
    gotos: Vec<u32>,
    terminals_len: u16,
    nonterminals_len: u16,
    final_state: StIdx,
}

impl StateTable {
    pub fn new(grm: &BnfGrammar, sg: &StateGraph) -> Result<StateTable, StateTableError> {
        let t_len = usize::from(grm.terminals_len());
        let nt_len = usize::from(grm.nonterminals_len());
        let states_len = sg.all_states_len() as usize;
        // Shift targets are negated into an i32 cell and states are u32s, so
        // make the (huge) overflow case impossible rather than surprising.
        assert!(states_len < i32::MAX as usize);
        let mut actions = vec![0i32; states_len * t_len];
        let mut gotos = vec![0u32; states_len * nt_len];

        let follows = grm.follows();
        let mut final_state = None;

        for stidx in sg.iter_stidxs() {
            // Populate shifts and gotos. Edge maps are hashed, so sort by
            // symbol to keep conflict reporting deterministic.
            let mut edges = sg
                .edges(stidx)
                .iter()
                .map(|(&sym, &target)| (sym, target))
                .collect::<Vec<_>>();
            edges.sort_unstable_by_key(|&(sym, _)| sym);
            for (sym, target) in edges {
                if sym.is_terminal() {
                    let off = actions_offset(t_len, stidx, sym);
                    match StateTable::decode(actions[off]) {
                        Action::Error => {
                            actions[off] = -(u32::from(target) as i32);
                        }
                        Action::Shift(other) => assert_eq!(target, other),
                        Action::Reduce(r_pidx) => {
                            return Err(StateTableError {
                                kind: StateTableErrorKind::ShiftReduceConflict {
                                    stidx,
                                    token: grm.text(sym).unwrap_or("$").to_owned(),
                                    shift_stidx: target,
                                    reduce_prod: grm.pp_prod(r_pidx),
                                },
                            });
                        }
                    }
                } else {
                    let off = usize::from(stidx) * nt_len + usize::from(sym.base());
                    debug_assert_eq!(gotos[off], 0);
                    gotos[off] = u32::from(target);
                }
            }

            // Populate reduces: a reducible production is reduced on exactly
            // the terminals (EOF included) of its head's FOLLOW set.
            for &pidx in sg.reducibles(stidx) {
                let lhs = grm.prod(pidx).lhs();
                for tbase in follows.follows(lhs).iter_set_bits(..) {
                    let off = usize::from(stidx) * t_len + tbase;
                    match StateTable::decode(actions[off]) {
                        Action::Error => {
                            actions[off] = i32::from(grm.prod_num(pidx));
                            if pidx == grm.start_prod() {
                                debug_assert!(final_state.is_none());
                                final_state = Some(stidx);
                            }
                        }
                        Action::Shift(shift_stidx) => {
                            return Err(StateTableError {
                                kind: StateTableErrorKind::ShiftReduceConflict {
                                    stidx,
                                    token: term_text(grm, tbase),
                                    shift_stidx,
                                    reduce_prod: grm.pp_prod(pidx),
                                },
                            });
                        }
                        Action::Reduce(r_pidx) => {
                            if r_pidx == pidx {
                                continue;
                            }
                            return Err(StateTableError {
                                kind: StateTableErrorKind::ReduceReduceConflict {
                                    stidx,
                                    token: term_text(grm, tbase),
                                    prod1: grm.pp_prod(r_pidx),
                                    prod2: grm.pp_prod(pidx),
                                },
                            });
                        }
                    }
                }
            }
        }

        let final_state = match final_state {
            Some(stidx) => stidx,
            None => {
                return Err(StateTableError {
                    kind: StateTableErrorKind::MissingAcceptAction,
                })
            }
        };

        Ok(StateTable {
            actions,
            gotos,
            terminals_len: grm.terminals_len(),
            nonterminals_len: grm.nonterminals_len(),
            final_state,
        })
    }

    fn decode(cell: i32) -> Action {
        if cell == 0 {
            Action::Error
        } else if cell < 0 {
            Action::Shift(StIdx(-cell as u32))
        } else {
            // Wire production numbers are indices shifted up by one.
            Action::Reduce(PIdx((cell - 1) as u16))
        }
    }

    /// Return the action of state `stidx` on the terminal `sym`.
    pub fn action(&self, stidx: StIdx, sym: Symbol) -> Action {
        debug_assert!(sym.is_terminal());
        StateTable::decode(self.actions[actions_offset(usize::from(self.terminals_len), stidx, sym)])
    }

    /// Return the GOTO state of `stidx` on the non-terminal `sym`, or `None`
    /// if there isn't one.
    pub fn goto_state(&self, stidx: StIdx, sym: Symbol) -> Option<StIdx> {
        debug_assert!(sym.is_nonterminal());
        let off = usize::from(stidx) * usize::from(self.nonterminals_len) + usize::from(sym.base());
        match self.gotos[off] {
            0 => None,
            st => Some(StIdx(st)),
        }
    }

    /// The state which reduces the augmented start production on EOF, i.e.
    /// the state in which a driving parser accepts.
    pub fn final_state(&self) -> StIdx {
        self.final_state
    }

    /// The raw ACTION array, laid out `state × terminals_len + terminal_base`.
    pub fn actions(&self) -> &[i32] {
        &self.actions
    }

    /// The raw GOTO array, laid out
    /// `state × nonterminals_len + nonterminal_base`.
    pub fn gotos(&self) -> &[u32] {
        &self.gotos
    }
}

fn actions_offset(t_len: usize, stidx: StIdx, sym: Symbol) -> usize {
    usize::from(stidx) * t_len + usize::from(sym.base())
}

fn term_text(grm: &BnfGrammar, tbase: usize) -> String {
    if tbase == usize::from(Symbol::EOF.base()) {
        "$".to_owned()
    } else {
        grm.term_name(tbase as u16).unwrap_or("?").to_owned()
    }
}
