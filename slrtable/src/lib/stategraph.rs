use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt::Write,
    hash::BuildHasherDefault,
};

use bnfgrammar::{bnf::BnfGrammar, PIdx, Symbol};
use fnv::FnvHasher;

use crate::{
    itemset::{closure, Item, Kernel},
    StIdx,
};

type Edges = HashMap<Symbol, StIdx, BuildHasherDefault<FnvHasher>>;

/// The LR(0) automaton of a grammar: one state per distinct kernel, numbered
/// densely in discovery order with the initial state at 0. Only kernels are
/// stored; closures are recomputed where needed.
#[derive(Debug)]
pub struct StateGraph {
    states: Vec<Kernel>,
    /// For each state in `states`, a map from symbols to successor states.
    edges: Vec<Edges>,
    /// For each state in `states`, the productions reducible in it (i.e. the
    /// productions of the dot-at-end items of its closure), sorted.
    reducibles: Vec<Vec<PIdx>>,
}

/// Build the LR(0) automaton for `grm` with a worklist over kernels: pop a
/// kernel, close it, compute GOTO for every distinct dotted symbol of the
/// closure, canonicalise each result into a kernel, and enqueue the
/// never-seen ones. Successors are generated in ascending symbol order and
/// the worklist is FIFO, so state numbering is fully deterministic.
pub fn lr0_stategraph(grm: &BnfGrammar) -> StateGraph {
    let mut seen =
        HashMap::<Kernel, StIdx, BuildHasherDefault<FnvHasher>>::with_hasher(Default::default());
    let mut todo = VecDeque::new();
    let mut states = Vec::new();
    let mut edges = Vec::new();
    let mut reducibles = Vec::new();

    let initial = Kernel::new(vec![Item::new(grm.start_prod(), 0)]);
    seen.insert(initial.clone(), StIdx(0));
    todo.push_back(initial);
    let mut next_stidx = 1u32;

    while let Some(kernel) = todo.pop_front() {
        let cls = closure(grm, &kernel);

        let mut reds = Vec::new();
        let mut succs = BTreeMap::<Symbol, Vec<Item>>::new();
        for item in &cls {
            let sym = item.dotted_symbol(grm);
            if sym.is_nil() {
                reds.push(item.pidx());
            } else {
                succs
                    .entry(sym)
                    .or_default()
                    .push(Item::new(item.pidx(), item.dot() + 1));
            }
        }
        reds.sort_unstable();

        let mut es = Edges::default();
        for (sym, items) in succs {
            let succ_kernel = Kernel::new(items);
            let target = match seen.get(&succ_kernel) {
                Some(&stidx) => stidx,
                None => {
                    let stidx = StIdx(next_stidx);
                    next_stidx += 1;
                    seen.insert(succ_kernel.clone(), stidx);
                    todo.push_back(succ_kernel);
                    stidx
                }
            };
            es.insert(sym, target);
        }

        states.push(kernel);
        edges.push(es);
        reducibles.push(reds);
    }

    StateGraph {
        states,
        edges,
        reducibles,
    }
}

impl StateGraph {
    /// How many states does this `StateGraph` contain?
    pub fn all_states_len(&self) -> u32 {
        self.states.len() as u32
    }

    /// Return an iterator over all state indices in numeric order.
    pub fn iter_stidxs(&self) -> impl Iterator<Item = StIdx> {
        (0..self.states.len() as u32).map(StIdx)
    }

    /// Return this graph's initial state.
    pub fn start_state(&self) -> StIdx {
        StIdx(0)
    }

    /// Return the kernel of state `stidx`. Panics if `stidx` doesn't exist.
    pub fn kernel(&self, stidx: StIdx) -> &Kernel {
        &self.states[usize::from(stidx)]
    }

    /// Return the state pointed to by `sym` from `stidx`, or `None` if there
    /// is no such edge.
    pub fn edge(&self, stidx: StIdx, sym: Symbol) -> Option<StIdx> {
        self.edges
            .get(usize::from(stidx))
            .and_then(|es| es.get(&sym))
            .copied()
    }

    /// Return the edges of state `stidx`. Panics if `stidx` doesn't exist.
    pub fn edges(&self, stidx: StIdx) -> &HashMap<Symbol, StIdx, BuildHasherDefault<FnvHasher>> {
        &self.edges[usize::from(stidx)]
    }

    /// How many edges does this `StateGraph` contain?
    pub fn all_edges_len(&self) -> usize {
        self.edges.iter().fold(0, |a, x| a + x.len())
    }

    /// Return the (sorted) reducible productions of state `stidx`. Panics if
    /// `stidx` doesn't exist.
    pub fn reducibles(&self, stidx: StIdx) -> &[PIdx] {
        &self.reducibles[usize::from(stidx)]
    }

    /// Return a pretty printed version of the kernels and all edges.
    pub fn pp(&self, grm: &BnfGrammar) -> String {
        fn fmt_sym(grm: &BnfGrammar, sym: Symbol) -> String {
            if sym.is_terminal() {
                format!("'{}'", grm.text(sym).unwrap_or("$"))
            } else {
                grm.text(sym).unwrap_or("?").to_string()
            }
        }

        let mut o = String::new();
        for stidx in self.iter_stidxs() {
            let _ = write!(o, "{}:", usize::from(stidx));
            for item in self.kernel(stidx).items() {
                let prod = grm.prod(item.pidx());
                let _ = write!(o, " [{} ->", grm.text(prod.lhs()).unwrap_or("?"));
                for (sidx, &sym) in prod.rhs().iter().enumerate() {
                    if sidx == usize::from(item.dot()) {
                        o.push_str(" .");
                    }
                    let _ = write!(o, " {}", fmt_sym(grm, sym));
                }
                if item.is_reducible(grm) {
                    o.push_str(" .");
                }
                o.push(']');
            }
            o.push('\n');
            let mut es = self.edges(stidx).iter().collect::<Vec<_>>();
            es.sort_unstable_by_key(|&(&sym, _)| sym);
            for (&sym, &target) in es {
                let _ = writeln!(o, "   {} -> {}", fmt_sym(grm, sym), usize::from(target));
            }
        }
        o
    }
}

#[cfg(test)]
mod test {
    use super::{lr0_stategraph, BnfGrammar, Item, StIdx};

    #[test]
    fn test_nested_call_grammar() {
        // A call whose sole argument may itself be a call. The inner NAME
        // shift must fuse with the outer one, and the empty-argument item
        // makes the open-paren state reducible.
        let grm = BnfGrammar::new(
            "
          call: NAME LPAR arg RPAR;
          arg: call | NUM | ;
          ",
        )
        .unwrap();
        let sg = lr0_stategraph(&grm);
        assert_eq!(sg.all_states_len(), 8);
        assert_eq!(sg.all_edges_len(), 8);

        let s0 = sg.start_state();
        let call_prod = grm.prods_for(grm.symbol("call").unwrap())[0];
        let s_name = sg.edge(s0, grm.symbol("NAME").unwrap()).unwrap();
        let s_lpar = sg.edge(s_name, grm.symbol("LPAR").unwrap()).unwrap();
        assert_eq!(
            sg.edge(s_lpar, grm.symbol("NAME").unwrap()).unwrap(),
            s_name
        );

        let arg_eps = grm.prods_for(grm.symbol("arg").unwrap())[2];
        assert_eq!(sg.reducibles(s_lpar), &[arg_eps]);

        let s_arg = sg.edge(s_lpar, grm.symbol("arg").unwrap()).unwrap();
        assert_eq!(sg.kernel(s_arg).items(), &[Item::new(call_prod, 3)]);
        let s_done = sg.edge(s_arg, grm.symbol("RPAR").unwrap()).unwrap();
        assert_eq!(sg.kernel(s_done).items(), &[Item::new(call_prod, 4)]);
        assert_eq!(sg.reducibles(s_done), &[call_prod]);
    }

    #[test]
    fn test_expr_grammar_has_twelve_states() {
        let grm =
            BnfGrammar::new("e: e ADD t | t; t: t MUL f | f; f: LPAREN e RPAREN | NUMBER;")
                .unwrap();
        let sg = lr0_stategraph(&grm);
        assert_eq!(sg.all_states_len(), 12);

        // State 0 on LPAREN goes to the state whose kernel is
        // { f -> LPAREN . e RPAREN }.
        let f_lparen = grm.prods_for(grm.symbol("f").unwrap())[0];
        let s_lp = sg.edge(sg.start_state(), grm.symbol("LPAREN").unwrap()).unwrap();
        assert_eq!(sg.kernel(s_lp).items(), &[Item::new(f_lparen, 1)]);

        // The state reached on e from state 0 has the two-item kernel
        // { e' -> e . ; e -> e . ADD t }.
        let s_e = sg.edge(sg.start_state(), grm.symbol("e").unwrap()).unwrap();
        let e_add_t = grm.prods_for(grm.symbol("e").unwrap())[0];
        assert_eq!(
            sg.kernel(s_e).items(),
            &[Item::new(grm.start_prod(), 1), Item::new(e_add_t, 1)]
        );
        assert_eq!(sg.reducibles(s_e), &[grm.start_prod()]);
    }

    #[test]
    fn test_kernel_fusion_across_contexts() {
        // NUMBER is shifted from several different states; all of them must
        // reach the single state whose kernel is { f -> NUMBER . }.
        let grm =
            BnfGrammar::new("e: e ADD t | t; t: t MUL f | f; f: LPAREN e RPAREN | NUMBER;")
                .unwrap();
        let sg = lr0_stategraph(&grm);
        let t_num = grm.symbol("NUMBER").unwrap();
        let s0 = sg.start_state();
        let from_s0 = sg.edge(s0, t_num).unwrap();
        let s_lp = sg.edge(s0, grm.symbol("LPAREN").unwrap()).unwrap();
        assert_eq!(sg.edge(s_lp, t_num).unwrap(), from_s0);
        let s_e = sg.edge(s0, grm.symbol("e").unwrap()).unwrap();
        let s_add = sg.edge(s_e, grm.symbol("ADD").unwrap()).unwrap();
        assert_eq!(sg.edge(s_add, t_num).unwrap(), from_s0);
    }

    #[test]
    fn test_nullable_grammar_states() {
        let grm = BnfGrammar::new("s: ;").unwrap();
        let sg = lr0_stategraph(&grm);
        assert_eq!(sg.all_states_len(), 2);
        let s_eps = grm.prods_for(grm.symbol("s").unwrap())[0];
        assert_eq!(sg.reducibles(sg.start_state()), &[s_eps]);
        let s1 = sg.edge(sg.start_state(), grm.symbol("s").unwrap()).unwrap();
        assert_eq!(s1, StIdx(1));
        assert_eq!(sg.kernel(s1).items(), &[Item::new(grm.start_prod(), 1)]);
        assert_eq!(sg.reducibles(s1), &[grm.start_prod()]);
    }

    #[test]
    fn test_deterministic_numbering() {
        let src = "e: e ADD t | t; t: t MUL f | f; f: LPAREN e RPAREN | NUMBER;";
        let grm1 = BnfGrammar::new(src).unwrap();
        let grm2 = BnfGrammar::new(src).unwrap();
        let sg1 = lr0_stategraph(&grm1);
        let sg2 = lr0_stategraph(&grm2);
        assert_eq!(sg1.all_states_len(), sg2.all_states_len());
        for stidx in sg1.iter_stidxs() {
            assert_eq!(sg1.kernel(stidx), sg2.kernel(stidx));
            assert_eq!(sg1.reducibles(stidx), sg2.reducibles(stidx));
        }
    }
}
