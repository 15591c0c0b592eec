use std::{collections::HashSet, hash::BuildHasherDefault};

use bnfgrammar::{bnf::BnfGrammar, PIdx, Symbol};
use fnv::FnvHasher;

/// An LR(0) item: a production with a dot position in `[0, rhs_len]`. Items
/// are value-typed; the derived total order (production index, then dot) is
/// the canonical order used when forming kernels.
///
/// ```text
/// e -> e ADD t
///
/// Dot | Dotted symbol | Item
/// ----+---------------+-----------------
/// 0   | e             | e -> . e ADD t
/// 1   | ADD           | e -> e . ADD t
/// 2   | t             | e -> e ADD . t
/// 3   | nil           | e -> e ADD t .
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Item {
    pidx: PIdx,
    dot: u16,
}

impl Item {
    pub fn new(pidx: PIdx, dot: u16) -> Item {
        Item { pidx, dot }
    }

    pub fn pidx(self) -> PIdx {
        self.pidx
    }

    pub fn dot(self) -> u16 {
        self.dot
    }

    /// The symbol immediately after the dot, or the nil symbol if the dot is
    /// past the end of the production's body.
    pub fn dotted_symbol(self, grm: &BnfGrammar) -> Symbol {
        grm.prod(self.pidx)
            .rhs()
            .get(usize::from(self.dot))
            .copied()
            .unwrap_or(Symbol::NIL)
    }

    /// Is this `S' -> . S`?
    pub fn is_initial(self, grm: &BnfGrammar) -> bool {
        self.dot == 0 && grm.prod(self.pidx).lhs().is_start()
    }

    /// Is the dot past the last body symbol, i.e. can this item's production
    /// be reduced in a state containing it?
    pub fn is_reducible(self, grm: &BnfGrammar) -> bool {
        usize::from(self.dot) == grm.prod(self.pidx).rhs().len()
    }

    pub fn is_kernel(self, grm: &BnfGrammar) -> bool {
        self.dot > 0 || self.is_initial(grm)
    }
}

/// The canonical form of a non-empty set of kernel items: sorted and
/// deduplicated. Two kernels built from the same items compare (and hash)
/// equal regardless of insertion order or duplicates, which is what makes
/// equivalent item sets fuse into a single automaton state.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Kernel {
    items: Vec<Item>,
}

impl Kernel {
    pub fn new(mut items: Vec<Item>) -> Kernel {
        assert!(!items.is_empty(), "a kernel item is missing");
        items.sort_unstable();
        items.dedup();
        Kernel { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

/// Compute the LR(0) closure of `kernel`: the smallest item set which, for
/// every item with a non-terminal immediately after the dot, contains the
/// dot-0 item of every production of that non-terminal. The returned order is
/// deterministic (kernel items first, then discovery order).
pub fn closure(grm: &BnfGrammar, kernel: &Kernel) -> Vec<Item> {
    let mut items = kernel.items().to_vec();
    let mut known = items
        .iter()
        .copied()
        .collect::<HashSet<_, BuildHasherDefault<FnvHasher>>>();
    let mut i = 0;
    while i < items.len() {
        let sym = items[i].dotted_symbol(grm);
        i += 1;
        if !sym.is_nonterminal() {
            continue;
        }
        for &ref_pidx in grm.prods_for(sym) {
            let item = Item::new(ref_pidx, 0);
            if known.insert(item) {
                items.push(item);
            }
        }
    }
    items
}

#[cfg(test)]
mod test {
    use super::{closure, BnfGrammar, Item, Kernel};
    use bnfgrammar::{PIdx, Symbol};

    fn expr_grammar() -> BnfGrammar {
        BnfGrammar::new("e: e ADD t | t; t: t MUL f | f; f: LPAREN e RPAREN | NUMBER;").unwrap()
    }

    #[test]
    fn test_item_derived_fields() {
        let grm = expr_grammar();
        let e_add_t = grm.prods_for(grm.symbol("e").unwrap())[0];

        let item = Item::new(e_add_t, 1);
        assert_eq!(item.dotted_symbol(&grm), grm.symbol("ADD").unwrap());
        assert!(!item.is_initial(&grm));
        assert!(!item.is_reducible(&grm));
        assert!(item.is_kernel(&grm));

        let item = Item::new(e_add_t, 3);
        assert_eq!(item.dotted_symbol(&grm), Symbol::NIL);
        assert!(item.is_reducible(&grm));

        let initial = Item::new(grm.start_prod(), 0);
        assert!(initial.is_initial(&grm));
        assert!(initial.is_kernel(&grm));
        assert!(!Item::new(e_add_t, 0).is_kernel(&grm));
    }

    #[test]
    fn test_kernel_fusion() {
        let i1 = Item::new(PIdx(1), 2);
        let i2 = Item::new(PIdx(3), 1);
        let i3 = Item::new(PIdx(1), 1);
        let k1 = Kernel::new(vec![i1, i2, i3]);
        let k2 = Kernel::new(vec![i3, i1, i2, i1]);
        assert_eq!(k1, k2);
        assert_eq!(k1.items(), &[i3, i1, i2]);

        let k3 = Kernel::new(vec![i1, i2]);
        assert_ne!(k1, k3);
    }

    #[test]
    fn test_closure_of_initial_item() {
        let grm = expr_grammar();
        let kernel = Kernel::new(vec![Item::new(grm.start_prod(), 0)]);
        let cls = closure(&grm, &kernel);
        // e' -> . e plus the dot-0 items of every production of e, t and f.
        assert_eq!(cls.len(), 7);
        for pidx in grm.iter_pidxs() {
            assert!(cls.contains(&Item::new(pidx, 0)));
        }
    }

    #[test]
    fn test_closure_stops_at_terminals() {
        let grm = expr_grammar();
        let f_lparen = grm.prods_for(grm.symbol("f").unwrap())[0];
        // f -> LPAREN . e RPAREN pulls in all of e, t and f.
        let cls = closure(&grm, &Kernel::new(vec![Item::new(f_lparen, 1)]));
        assert_eq!(cls.len(), 7);
        // f -> LPAREN e . RPAREN adds nothing.
        let cls = closure(&grm, &Kernel::new(vec![Item::new(f_lparen, 2)]));
        assert_eq!(cls.len(), 1);
    }

    #[test]
    fn test_closure_of_nullable_grammar() {
        let grm = BnfGrammar::new("s: ;").unwrap();
        let kernel = Kernel::new(vec![Item::new(grm.start_prod(), 0)]);
        let cls = closure(&grm, &kernel);
        let s_eps = grm.prods_for(grm.symbol("s").unwrap())[0];
        assert_eq!(cls, vec![Item::new(grm.start_prod(), 0), Item::new(s_eps, 0)]);
        assert!(Item::new(s_eps, 0).is_reducible(&grm));
    }
}
