use vob::Vob;

use super::grammar::BnfGrammar;
use crate::Symbol;

/// The FIRST sets of every non-terminal in a grammar: which terminals can
/// begin a derivation of it, plus whether it can derive the empty string.
/// For the grammar:
///
/// ```text
/// list: elem list | ;
/// elem: ATOM;
/// ```
///
/// `FIRST(list)` and `FIRST(elem)` both contain exactly `ATOM`, and `list`
/// (but not `elem`) is nullable.
#[derive(Debug)]
pub struct BnfFirsts {
    // One Vob over terminal bases per non-terminal base (slot 0 is the unused
    // nil slot).
    firsts: Vec<Vob>,
    epsilons: Vob,
    terminals_len: usize,
}

impl BnfFirsts {
    /// Generates and returns the FIRST sets for the given grammar.
    pub fn new(grm: &BnfGrammar) -> Self {
        let nt_len = usize::from(grm.nonterminals_len());
        let t_len = usize::from(grm.terminals_len());
        let mut firsts = BnfFirsts {
            firsts: vec![Vob::from_elem(false, t_len); nt_len],
            epsilons: Vob::from_elem(false, nt_len),
            terminals_len: t_len,
        };

        // Loop looking for changes to the FIRST sets until we reach a fixed
        // point. The lattice is finite and every step is monotone, so this
        // terminates; crucially there is no recursion here, so cyclic
        // grammars need no special treatment.
        loop {
            let mut changed = false;
            for pidx in grm.iter_pidxs() {
                let prod = grm.prod(pidx);
                let lhs = usize::from(prod.lhs().base());
                if prod.is_empty() {
                    if firsts.epsilons.set(lhs, true) {
                        changed = true;
                    }
                    continue;
                }
                let mut all_nullable = true;
                for &sym in prod.rhs() {
                    if sym.is_terminal() {
                        if firsts.firsts[lhs].set(usize::from(sym.base()), true) {
                            changed = true;
                        }
                        all_nullable = false;
                        break;
                    }
                    // Union the referenced non-terminal's FIRSTs into the
                    // head's (a no-op when the two are one and the same).
                    let sub = usize::from(sym.base());
                    for t in 0..t_len {
                        if firsts.firsts[sub][t] && firsts.firsts[lhs].set(t, true) {
                            changed = true;
                        }
                    }
                    if !firsts.epsilons[sub] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && firsts.epsilons.set(lhs, true) {
                    changed = true;
                }
            }
            if !changed {
                return firsts;
            }
        }
    }

    /// Return the FIRST `Vob` for the non-terminal `sym`.
    pub fn firsts(&self, sym: Symbol) -> &Vob {
        debug_assert!(sym.is_nonterminal());
        &self.firsts[usize::from(sym.base())]
    }

    /// Returns true if the terminal `term` is in the FIRST set of the
    /// non-terminal `sym`.
    pub fn is_set(&self, sym: Symbol, term: Symbol) -> bool {
        debug_assert!(term.is_terminal());
        self.firsts(sym)[usize::from(term.base())]
    }

    /// Returns true if the non-terminal `sym` can derive the empty string.
    pub fn is_epsilon_set(&self, sym: Symbol) -> bool {
        debug_assert!(sym.is_nonterminal());
        self.epsilons[usize::from(sym.base())]
    }

    /// Compute, on demand, the FIRST set of the symbol suffix `suffix`:
    /// scan left to right, accumulating each symbol's FIRSTs and stopping as
    /// soon as a non-nullable symbol has been consumed. The second component
    /// reports whether the whole suffix is nullable (trivially true for the
    /// empty suffix).
    pub fn suffix_firsts(&self, suffix: &[Symbol]) -> (Vob, bool) {
        let mut v = Vob::from_elem(false, self.terminals_len);
        for &sym in suffix {
            if sym.is_terminal() {
                v.set(usize::from(sym.base()), true);
                return (v, false);
            }
            v.or(self.firsts(sym));
            if !self.is_epsilon_set(sym) {
                return (v, false);
            }
        }
        (v, true)
    }
}

#[cfg(test)]
mod test {
    use super::{BnfFirsts, BnfGrammar};

    /// The FIRST set of `nt` as sorted terminal names, paired with its
    /// nullability.
    fn first_names(grm: &BnfGrammar, firsts: &BnfFirsts, nt: &str) -> (Vec<String>, bool) {
        let sym = grm.symbol(nt).unwrap();
        let set = firsts.firsts(sym);
        let mut names = Vec::new();
        for tbase in 2..grm.terminals_len() {
            if set[usize::from(tbase)] {
                names.push(grm.term_name(tbase).unwrap().to_owned());
            }
        }
        names.sort();
        (names, firsts.is_epsilon_set(sym))
    }

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_first_through_alternatives() {
        let grm = BnfGrammar::new(
            "
          stmt: IF expr THEN stmt | assign;
          assign: IDENT ASSIGN expr;
          expr: IDENT | INT;
          ",
        )
        .unwrap();
        let firsts = grm.firsts();
        assert_eq!(
            first_names(&grm, &firsts, "stmt"),
            (owned(&["IDENT", "IF"]), false)
        );
        assert_eq!(
            first_names(&grm, &firsts, "assign"),
            (owned(&["IDENT"]), false)
        );
        assert_eq!(
            first_names(&grm, &firsts, "expr"),
            (owned(&["IDENT", "INT"]), false)
        );
        // The augmented start inherits the user start's FIRSTs.
        assert_eq!(
            first_names(&grm, &firsts, "stmt'"),
            (owned(&["IDENT", "IF"]), false)
        );
    }

    #[test]
    fn test_first_stops_at_first_symbol() {
        // Nothing after the non-nullable `key` may leak into FIRST(pair).
        let grm = BnfGrammar::new(
            "
          pair: key COLON value;
          key: STRING;
          value: NUMBER;
          ",
        )
        .unwrap();
        let firsts = grm.firsts();
        assert_eq!(
            first_names(&grm, &firsts, "pair"),
            (owned(&["STRING"]), false)
        );
    }

    #[test]
    fn test_first_nullable_chain() {
        let grm = BnfGrammar::new(
            "
          list: elems;
          elems: elem elems | ;
          elem: ATOM;
          ",
        )
        .unwrap();
        let firsts = grm.firsts();
        assert_eq!(first_names(&grm, &firsts, "elems"), (owned(&["ATOM"]), true));
        // Nullability propagates through a body made of one nullable symbol.
        assert_eq!(first_names(&grm, &firsts, "list"), (owned(&["ATOM"]), true));
        assert_eq!(first_names(&grm, &firsts, "elem"), (owned(&["ATOM"]), false));
    }

    #[test]
    fn test_first_skips_nullable_prefix() {
        // Both leading symbols of `decl` are nullable, so the scan reaches
        // IDENT; the terminal then stops it, leaving `decl` non-nullable.
        let grm = BnfGrammar::new(
            "
          decl: quals type IDENT;
          quals: CONST quals | ;
          type: INT_KW | ;
          ",
        )
        .unwrap();
        let firsts = grm.firsts();
        assert_eq!(
            first_names(&grm, &firsts, "decl"),
            (owned(&["CONST", "IDENT", "INT_KW"]), false)
        );
        assert_eq!(first_names(&grm, &firsts, "quals"), (owned(&["CONST"]), true));
        assert_eq!(first_names(&grm, &firsts, "type"), (owned(&["INT_KW"]), true));
    }

    #[test]
    fn test_first_left_recursion() {
        // Left recursion and a mutual-recursion cycle (a_list -> item ->
        // wrapped -> a_list) must converge; COMMA never becomes a FIRST.
        let grm = BnfGrammar::new(
            "
          a_list: a_list COMMA item | item;
          item: wrapped;
          wrapped: LPAR a_list RPAR | NAME;
          ",
        )
        .unwrap();
        let firsts = grm.firsts();
        for nt in ["a_list", "item", "wrapped"] {
            assert_eq!(
                first_names(&grm, &firsts, nt),
                (owned(&["LPAR", "NAME"]), false)
            );
        }
    }

    #[test]
    fn test_first_requires_all_nullable() {
        let grm = BnfGrammar::new(
            "
          sig: opt_pub opt_async FN;
          padding: opt_a opt_b;
          opt_pub: PUB | ;
          opt_async: ASYNC | ;
          opt_a: A | ;
          opt_b: B | ;
          ",
        )
        .unwrap();
        let firsts = grm.firsts();
        // A trailing terminal keeps `sig` non-nullable despite its nullable
        // prefix...
        assert_eq!(
            first_names(&grm, &firsts, "sig"),
            (owned(&["ASYNC", "FN", "PUB"]), false)
        );
        // ...while an all-nullable body makes `padding` nullable.
        assert_eq!(
            first_names(&grm, &firsts, "padding"),
            (owned(&["A", "B"]), true)
        );
    }

    #[test]
    fn test_nullable_grammar() {
        let grm = BnfGrammar::new("s: ;").unwrap();
        let firsts = grm.firsts();
        assert!(firsts.is_epsilon_set(grm.symbol("s").unwrap()));
        assert!(firsts.is_epsilon_set(grm.start_symbol()));
    }

    #[test]
    fn test_nullable_with_terminal() {
        let grm = BnfGrammar::new("s: FOO | ;").unwrap();
        let firsts = grm.firsts();
        assert_eq!(first_names(&grm, &firsts, "s"), (owned(&["FOO"]), true));
    }

    #[test]
    fn test_suffix_firsts() {
        let grm = BnfGrammar::new(
            "
          s: a b TC;
          a: TA | ;
          b: TB | ;
          ",
        )
        .unwrap();
        let firsts = grm.firsts();
        let a = grm.symbol("a").unwrap();
        let b = grm.symbol("b").unwrap();
        let tb = grm.symbol("TB").unwrap();
        let tc = grm.symbol("TC").unwrap();

        let (v, nullable) = firsts.suffix_firsts(&[a, b]);
        assert!(nullable);
        assert!(v[usize::from(grm.symbol("TA").unwrap().base())]);
        assert!(v[usize::from(tb.base())]);
        assert!(!v[usize::from(tc.base())]);

        // A terminal stops accumulation.
        let (v, nullable) = firsts.suffix_firsts(&[a, tc, b]);
        assert!(!nullable);
        assert!(v[usize::from(tc.base())]);
        assert!(!v[usize::from(tb.base())]);

        let (v, nullable) = firsts.suffix_firsts(&[]);
        assert!(nullable);
        assert!(v.iter_set_bits(..).next().is_none());
    }

    #[test]
    fn test_first_monotonicity() {
        // Adding a production must never shrink an existing FIRST set.
        let g1 = BnfGrammar::new("s: a A; a: B;").unwrap();
        let g2 = BnfGrammar::new("s: a A; a: B; a: ;").unwrap();
        let f1 = g1.firsts();
        let f2 = g2.firsts();
        for nt in ["s", "a"] {
            let n1 = g1.symbol(nt).unwrap();
            let n2 = g2.symbol(nt).unwrap();
            for tbase in 2..g1.terminals_len() {
                let name = g1.term_name(tbase).unwrap();
                if f1.is_set(n1, g1.symbol(name).unwrap()) {
                    assert!(f2.is_set(n2, g2.symbol(name).unwrap()));
                }
            }
        }
    }
}
