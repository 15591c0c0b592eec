use std::{error::Error, fmt};

use indexmap::IndexSet;

use super::{
    ast::{GrammarAST, Qualifier},
    firsts::BnfFirsts,
    follows::BnfFollows,
    parser::{self, BnfParserError},
};
use crate::{PIdx, Symbol, SymbolError, SymbolTable};

/// A production: a non-terminal head and a possibly empty, ordered sequence
/// of body symbols. A production is *empty* iff its body has length 0, which
/// is the nullability base case. Two productions with the same head and body
/// are the same production.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Production {
    lhs: Symbol,
    rhs: Vec<Symbol>,
}

impl Production {
    pub fn lhs(&self) -> Symbol {
        self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }
}

/// Any error from grammar construction returns an instance of this enum.
#[derive(Debug)]
pub enum BnfGrammarError {
    Parse(BnfParserError),
    Symbol(SymbolError),
    /// The input tree contains no productions, so there is no start symbol to
    /// augment.
    NoProductions,
}

impl From<BnfParserError> for BnfGrammarError {
    fn from(e: BnfParserError) -> Self {
        BnfGrammarError::Parse(e)
    }
}

impl From<SymbolError> for BnfGrammarError {
    fn from(e: SymbolError) -> Self {
        BnfGrammarError::Symbol(e)
    }
}

impl Error for BnfGrammarError {}

impl fmt::Display for BnfGrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BnfGrammarError::Parse(e) => write!(f, "{}", e),
            BnfGrammarError::Symbol(e) => write!(f, "{}", e),
            BnfGrammarError::NoProductions => write!(f, "Grammar contains no productions"),
        }
    }
}

/// Representation of a BNF grammar after symbol classification, start
/// augmentation and qualifier expansion. See the [top-level
/// documentation](../index.html) for the guarantees this struct makes about
/// symbol and production numbering.
#[derive(Debug)]
pub struct BnfGrammar {
    symtab: SymbolTable,
    prods: IndexSet<Production>,
    /// A mapping from non-terminal bases to the productions they head. The
    /// order of each entry follows production insertion order.
    prods_for: Vec<Vec<PIdx>>,
    start_sym: Symbol,
}

impl BnfGrammar {
    /// Takes BNF grammar source text and returns a `BnfGrammar` (or a
    /// [`BnfGrammarError`] on error).
    ///
    /// As we're compiling the grammar, we add a new start rule (referencing
    /// the head of the user's first production `S` and named `S'`; the
    /// apostrophe guarantees the name is fresh) so that a parser driven by
    /// the eventual table can recognise acceptance as a reduction.
    pub fn new(src: &str) -> Result<Self, BnfGrammarError> {
        let ast = parser::parse(src)?;
        BnfGrammar::from_ast(&ast)
    }

    /// Build a grammar from an already-parsed tree.
    pub fn from_ast(ast: &GrammarAST) -> Result<Self, BnfGrammarError> {
        let mut symtab = SymbolTable::new();
        let mut prods = IndexSet::new();
        let mut prods_for: Vec<Vec<PIdx>> = Vec::new();

        // Augment the start symbol: the head of the first production becomes
        // the user start, and `S' → S` must land at production index 0 (wire
        // number 1).
        let first = match ast.prods.first() {
            Some(p) => p,
            None => return Err(BnfGrammarError::NoProductions),
        };
        let start_sym = symtab.register_start(&format!("{}'", first.head))?;
        let user_start = symtab.register_nonterminal(&first.head)?;
        insert_prod(
            &mut prods,
            &mut prods_for,
            Production {
                lhs: start_sym,
                rhs: vec![user_start],
            },
        );

        // Register every head as a non-terminal before any body is walked, so
        // that heads referenced before their definition aren't mistaken for
        // terminals.
        for p in &ast.prods {
            symtab.register_nonterminal(&p.head)?;
        }

        // Materialise the productions. Anything that isn't a head by now is a
        // terminal.
        let mut sugar_count = 0;
        for p in &ast.prods {
            let lhs = symtab.to_symbol(&p.head).unwrap();
            for alt in &p.alternatives {
                let mut rhs = Vec::with_capacity(alt.symbols.len());
                for astsym in &alt.symbols {
                    let mut sym = match symtab.to_symbol(&astsym.name) {
                        Some(sym) => sym,
                        None => symtab.register_terminal(&astsym.name)?,
                    };
                    if let Some(q) = astsym.qualifier {
                        sym = expand_qualifier(
                            q,
                            sym,
                            &mut symtab,
                            &mut prods,
                            &mut prods_for,
                            &mut sugar_count,
                        )?;
                    }
                    rhs.push(sym);
                }
                insert_prod(&mut prods, &mut prods_for, Production { lhs, rhs });
            }
        }

        Ok(BnfGrammar {
            symtab,
            prods,
            prods_for,
            start_sym,
        })
    }

    /// Return the augmented start symbol.
    pub fn start_symbol(&self) -> Symbol {
        self.start_sym
    }

    /// Return the index of the augmented start production `S' → S`.
    pub fn start_prod(&self) -> PIdx {
        PIdx(0)
    }

    /// How many productions does this grammar have?
    pub fn prods_len(&self) -> PIdx {
        PIdx(self.prods.len() as u16)
    }

    /// Return an iterator which produces (in order from `0..self.prods_len()`)
    /// all this grammar's valid `PIdx`s.
    pub fn iter_pidxs(&self) -> impl Iterator<Item = PIdx> {
        (0..self.prods.len() as u16).map(PIdx)
    }

    /// Get the production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod(&self, pidx: PIdx) -> &Production {
        self.prods.get_index(usize::from(pidx)).unwrap()
    }

    /// The wire number of production `pidx`: its index plus one, since 0 is
    /// reserved for empty ACTION table cells. The augmented start production
    /// therefore has number 1 and real productions have numbers ≥ 2.
    pub fn prod_num(&self, pidx: PIdx) -> u16 {
        debug_assert!(usize::from(pidx) < self.prods.len());
        pidx.0 + 1
    }

    /// Return the productions headed by the non-terminal `sym` (empty for
    /// anything that isn't a registered non-terminal).
    pub fn prods_for(&self, sym: Symbol) -> &[PIdx] {
        if !sym.is_nonterminal() {
            return &[];
        }
        self.prods_for
            .get(usize::from(sym.base()))
            .map_or(&[], |v| v.as_slice())
    }

    /// Return the symbol for `text`, or `None` if it isn't registered.
    pub fn symbol(&self, text: &str) -> Option<Symbol> {
        self.symtab.to_symbol(text)
    }

    /// Return the text of `sym`, or `None` for nil, EOF, and foreign symbols.
    pub fn text(&self, sym: Symbol) -> Option<&str> {
        self.symtab.to_text(sym)
    }

    /// Return the text of the terminal with the given base, if it has one.
    pub fn term_name(&self, base: u16) -> Option<&str> {
        self.symtab.term_name(base)
    }

    /// Return the text of the non-terminal with the given base, if it has one.
    pub fn nonterm_name(&self, base: u16) -> Option<&str> {
        self.symtab.nonterm_name(base)
    }

    /// The width of the terminal axis of a parsing table for this grammar
    /// (including the reserved nil and EOF bases).
    pub fn terminals_len(&self) -> u16 {
        self.symtab.terminals_len()
    }

    /// The width of the non-terminal axis of a parsing table for this grammar
    /// (including the reserved nil base).
    pub fn nonterminals_len(&self) -> u16 {
        self.symtab.nonterminals_len()
    }

    /// Return a `BnfFirsts` struct for this grammar.
    pub fn firsts(&self) -> BnfFirsts {
        BnfFirsts::new(self)
    }

    /// Return a `BnfFollows` struct for this grammar.
    pub fn follows(&self) -> BnfFollows {
        BnfFollows::new(self)
    }

    /// Returns the string representation of a given production `pidx`.
    pub fn pp_prod(&self, pidx: PIdx) -> String {
        let prod = self.prod(pidx);
        let mut sprod = String::new();
        sprod.push_str(self.text(prod.lhs()).unwrap_or("<unknown>"));
        sprod.push(':');
        for &sym in prod.rhs() {
            sprod.push_str(&format!(" \"{}\"", self.text(sym).unwrap_or("<unknown>")));
        }
        sprod
    }
}

fn insert_prod(
    prods: &mut IndexSet<Production>,
    prods_for: &mut Vec<Vec<PIdx>>,
    prod: Production,
) -> PIdx {
    let lhs = prod.lhs();
    let (idx, inserted) = prods.insert_full(prod);
    if idx > usize::from(u16::MAX) {
        panic!("the production index storage type is not big enough for this grammar");
    }
    let pidx = PIdx(idx as u16);
    if inserted {
        let base = usize::from(lhs.base());
        if prods_for.len() <= base {
            prods_for.resize_with(base + 1, Vec::new);
        }
        prods_for[base].push(pidx);
    }
    pidx
}

/// Expand a qualified symbol reference `x?` / `x*` / `x+` into a fresh helper
/// non-terminal (named `$$N`, which cannot clash with user identifiers) and
/// return that non-terminal for use in the hosting alternative.
fn expand_qualifier(
    qualifier: Qualifier,
    sym: Symbol,
    symtab: &mut SymbolTable,
    prods: &mut IndexSet<Production>,
    prods_for: &mut Vec<Vec<PIdx>>,
    sugar_count: &mut usize,
) -> Result<Symbol, SymbolError> {
    let fresh = symtab.register_nonterminal(&format!("$${}", sugar_count))?;
    *sugar_count += 1;
    let (rhs1, rhs2) = match qualifier {
        Qualifier::Optional => (vec![sym], vec![]),
        Qualifier::ZeroOrMore => (vec![sym, fresh], vec![]),
        Qualifier::OneOrMore => (vec![sym, fresh], vec![sym]),
    };
    insert_prod(
        prods,
        prods_for,
        Production {
            lhs: fresh,
            rhs: rhs1,
        },
    );
    insert_prod(
        prods,
        prods_for,
        Production {
            lhs: fresh,
            rhs: rhs2,
        },
    );
    Ok(fresh)
}
