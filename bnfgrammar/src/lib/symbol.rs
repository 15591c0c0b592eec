use std::{collections::HashMap, error::Error, fmt};

const KIND_MASK: u16 = 0x8000;
const START_MASK: u16 = 0x4000;
const BASE_MASK: u16 = 0x3fff;

/// A grammar symbol, packed into 16 bits: bit 15 is the kind (0 =
/// non-terminal, 1 = terminal), bit 14 is the is-start flag, and bits 0-13
/// are the dense per-kind base number. Symbols are keyed in maps and stored
/// in production bodies all over the place, so they must stay cheap to hash
/// and compare.
///
/// Base 0 never denotes a real symbol: the all-zero value is the nil symbol,
/// used as the "no dotted symbol" sentinel. Terminal base 1 is reserved for
/// the EOF marker.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Symbol(u16);

impl Symbol {
    /// The nil symbol.
    pub const NIL: Symbol = Symbol(0);
    /// The EOF marker: a terminal with the reserved base 1. It is registered
    /// in every symbol table but carries no user text.
    pub const EOF: Symbol = Symbol(KIND_MASK | 1);

    fn new(kind: SymbolKind, is_start: bool, base: u16) -> Symbol {
        debug_assert!(base >= 1 && base <= BASE_MASK);
        let kind_mask = match kind {
            SymbolKind::Nonterminal => 0,
            SymbolKind::Terminal => KIND_MASK,
        };
        let start_mask = if is_start { START_MASK } else { 0 };
        Symbol(kind_mask | start_mask | base)
    }

    /// What kind of symbol is this? The nil symbol reports as a non-terminal;
    /// callers which care should check [`Symbol::is_nil`] first.
    pub fn kind(self) -> SymbolKind {
        if self.0 & KIND_MASK == 0 {
            SymbolKind::Nonterminal
        } else {
            SymbolKind::Terminal
        }
    }

    /// The dense per-kind base number of this symbol.
    pub fn base(self) -> u16 {
        self.0 & BASE_MASK
    }

    pub fn is_nil(self) -> bool {
        self.base() == 0
    }

    /// Is this the augmented start symbol?
    pub fn is_start(self) -> bool {
        !self.is_nil() && self.0 & START_MASK != 0
    }

    pub fn is_nonterminal(self) -> bool {
        !self.is_nil() && self.kind() == SymbolKind::Nonterminal
    }

    pub fn is_terminal(self) -> bool {
        !self.is_nil() && self.kind() == SymbolKind::Terminal
    }

    pub fn is_eof(self) -> bool {
        self == Symbol::EOF
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_nil() {
            return write!(f, "Symbol(nil)");
        }
        let prefix = match (self.is_start(), self.kind()) {
            (true, _) => "s",
            (false, SymbolKind::Nonterminal) => "n",
            (false, SymbolKind::Terminal) => "t",
        };
        write!(f, "Symbol({}{})", prefix, self.base())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolKind {
    Nonterminal,
    Terminal,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolKind::Nonterminal => write!(f, "non-terminal"),
            SymbolKind::Terminal => write!(f, "terminal"),
        }
    }
}

/// The various different possible symbol table errors.
#[derive(Debug, Eq, PartialEq)]
pub enum SymbolErrorKind {
    /// The 14-bit base space for the given kind is exhausted.
    SymbolCapacity(SymbolKind),
    /// A text was re-registered with the other kind.
    KindConflict {
        text: String,
        registered: SymbolKind,
        requested: SymbolKind,
    },
    /// A start symbol was registered while a different one already exists.
    DuplicateStart(String),
}

/// Any error from the symbol table returns an instance of this struct.
#[derive(Debug, Eq, PartialEq)]
pub struct SymbolError {
    pub kind: SymbolErrorKind,
}

impl Error for SymbolError {}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            SymbolErrorKind::SymbolCapacity(kind) => {
                write!(f, "the 14-bit {} base space is exhausted", kind)
            }
            SymbolErrorKind::KindConflict {
                text,
                registered,
                requested,
            } => write!(
                f,
                "\"{}\" cannot be registered as a {} symbol: it is already a {} symbol",
                text, requested, registered
            ),
            SymbolErrorKind::DuplicateStart(text) => write!(
                f,
                "cannot register \"{}\" as the start symbol: a start symbol already exists",
                text
            ),
        }
    }
}

/// Interns symbol texts, assigning each a kind and a dense per-kind base
/// number. Text ↔ symbol is bijective within a table and registration is
/// idempotent on text. Re-registering a text with the other kind is a
/// surfaced [`SymbolErrorKind::KindConflict`] rather than a silent
/// reclassification.
#[derive(Debug)]
pub struct SymbolTable {
    syms: HashMap<String, Symbol>,
    // Texts indexed by base. Slot 0 of both is the nil slot; slot 1 of
    // `term_names` is the (unnamed) EOF terminal.
    nonterm_names: Vec<Option<String>>,
    term_names: Vec<Option<String>>,
    start: Option<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            syms: HashMap::new(),
            nonterm_names: vec![None],
            term_names: vec![None, None],
            start: None,
        }
    }

    fn intern(
        &mut self,
        text: &str,
        kind: SymbolKind,
        is_start: bool,
    ) -> Result<Symbol, SymbolError> {
        if let Some(&sym) = self.syms.get(text) {
            if sym.kind() != kind {
                return Err(SymbolError {
                    kind: SymbolErrorKind::KindConflict {
                        text: text.to_owned(),
                        registered: sym.kind(),
                        requested: kind,
                    },
                });
            }
            return Ok(sym);
        }
        let names = match kind {
            SymbolKind::Nonterminal => &mut self.nonterm_names,
            SymbolKind::Terminal => &mut self.term_names,
        };
        if names.len() > usize::from(BASE_MASK) {
            return Err(SymbolError {
                kind: SymbolErrorKind::SymbolCapacity(kind),
            });
        }
        let base = names.len() as u16;
        names.push(Some(text.to_owned()));
        let sym = Symbol::new(kind, is_start, base);
        self.syms.insert(text.to_owned(), sym);
        Ok(sym)
    }

    /// Register `text` as the augmented start symbol. Only the first call can
    /// introduce a start symbol; subsequent calls with the same text return
    /// it unchanged, and calls with a different text fail with
    /// [`SymbolErrorKind::DuplicateStart`]. If `text` is already a plain
    /// non-terminal it is upgraded in place, so the returned symbol always
    /// has its start flag set; if it is a terminal, the call fails with
    /// [`SymbolErrorKind::KindConflict`].
    pub fn register_start(&mut self, text: &str) -> Result<Symbol, SymbolError> {
        match self.start {
            Some(start) if self.to_text(start) == Some(text) => Ok(start),
            Some(_) => Err(SymbolError {
                kind: SymbolErrorKind::DuplicateStart(text.to_owned()),
            }),
            None => {
                let sym = match self.syms.get(text).copied() {
                    Some(sym) if sym.is_terminal() => {
                        return Err(SymbolError {
                            kind: SymbolErrorKind::KindConflict {
                                text: text.to_owned(),
                                registered: SymbolKind::Terminal,
                                requested: SymbolKind::Nonterminal,
                            },
                        });
                    }
                    Some(sym) => {
                        // Upgrade the existing non-terminal: same base, start
                        // flag set. The name tables are keyed by kind and
                        // base, so only the text mapping needs rewriting.
                        let upgraded = Symbol::new(SymbolKind::Nonterminal, true, sym.base());
                        self.syms.insert(text.to_owned(), upgraded);
                        upgraded
                    }
                    None => self.intern(text, SymbolKind::Nonterminal, true)?,
                };
                self.start = Some(sym);
                Ok(sym)
            }
        }
    }

    /// Register `text` as a non-terminal, or return its existing symbol.
    pub fn register_nonterminal(&mut self, text: &str) -> Result<Symbol, SymbolError> {
        self.intern(text, SymbolKind::Nonterminal, false)
    }

    /// Register `text` as a terminal, or return its existing symbol.
    pub fn register_terminal(&mut self, text: &str) -> Result<Symbol, SymbolError> {
        self.intern(text, SymbolKind::Terminal, false)
    }

    /// Return the symbol for `text`, or `None` if it isn't registered.
    pub fn to_symbol(&self, text: &str) -> Option<Symbol> {
        self.syms.get(text).copied()
    }

    /// Return the text of `sym`, or `None` for the nil symbol, EOF, and
    /// symbols this table never issued.
    pub fn to_text(&self, sym: Symbol) -> Option<&str> {
        if sym.is_nil() {
            return None;
        }
        let names = match sym.kind() {
            SymbolKind::Nonterminal => &self.nonterm_names,
            SymbolKind::Terminal => &self.term_names,
        };
        names.get(usize::from(sym.base()))?.as_deref()
    }

    /// Return the text of the terminal with the given base, if it has one.
    pub fn term_name(&self, base: u16) -> Option<&str> {
        self.term_names.get(usize::from(base))?.as_deref()
    }

    /// Return the text of the non-terminal with the given base, if it has one.
    pub fn nonterm_name(&self, base: u16) -> Option<&str> {
        self.nonterm_names.get(usize::from(base))?.as_deref()
    }

    /// The exclusive upper bound of the terminal base range (i.e. the width of
    /// the terminal axis of a parsing table). This includes the nil and EOF
    /// slots, so it is at least 2.
    pub fn terminals_len(&self) -> u16 {
        self.term_names.len() as u16
    }

    /// The exclusive upper bound of the non-terminal base range. This includes
    /// the nil slot, so it is at least 1.
    pub fn nonterminals_len(&self) -> u16 {
        self.nonterm_names.len() as u16
    }

    /// Return the augmented start symbol, if one has been registered.
    pub fn start_symbol(&self) -> Option<Symbol> {
        self.start
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
