//! Symbol declarations: the vocabulary a command's syntax strings are
//! written against.
//!
//! Grounded on `original_source/src/symbol.c`: a symbol is a
//! `(name, lex_type, help?, arg_name?)` tuple that, once declared, compiles
//! into exactly one [`crate::syntax::node::NodeKind`]. The six reserved
//! grammar characters are a process-wide singleton table built once,
//! mirroring `sym_reserv`.

use crate::lexicon::{LexKindId, NumericRange};
use std::sync::OnceLock;

/// One of the six grammar punctuation characters, each materializing into
/// its own pseudo-node kind at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedChar {
    OptHead,
    OptAny,
    OptEnd,
    AltHead,
    AltOr,
    AltEnd,
}

impl ReservedChar {
    pub fn glyph(self) -> &'static str {
        match self {
            ReservedChar::OptHead => "[",
            ReservedChar::OptAny => "*",
            ReservedChar::OptEnd => "]",
            ReservedChar::AltHead => "{",
            ReservedChar::AltOr => "|",
            ReservedChar::AltEnd => "}",
        }
    }

    pub fn from_glyph(g: &str) -> Option<Self> {
        match g {
            "[" => Some(ReservedChar::OptHead),
            "*" => Some(ReservedChar::OptAny),
            "]" => Some(ReservedChar::OptEnd),
            "{" => Some(ReservedChar::AltHead),
            "|" => Some(ReservedChar::AltOr),
            "}" => Some(ReservedChar::AltEnd),
            _ => None,
        }
    }

    fn help(self) -> &'static str {
        match self {
            ReservedChar::OptHead => "OPT start",
            ReservedChar::OptAny => "OPT any",
            ReservedChar::OptEnd => "OPT end",
            ReservedChar::AltHead => "ALT start",
            ReservedChar::AltOr => "ALT or",
            ReservedChar::AltEnd => "ALT end",
        }
    }

    fn all() -> &'static [ReservedChar] {
        use ReservedChar::*;
        &[OptHead, OptAny, OptEnd, AltHead, AltOr, AltEnd]
    }
}

/// What a symbol resolves to when materialized into a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    /// A literal token to match verbatim.
    Keyword,
    /// A typed variable slot, with an optional inclusive numeric range.
    Variable(LexKindId, Option<NumericRange>),
    /// One of the six grammar punctuation characters.
    Reserved(ReservedChar),
}

/// A declared symbol: name, kind, and display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub help: Option<String>,
    pub arg_label: Option<String>,
}

impl Symbol {
    pub fn keyword(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Keyword,
            help: None,
            arg_label: None,
        }
    }

    pub fn variable(name: impl Into<String>, lex_type: LexKindId) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Variable(lex_type, None),
            help: None,
            arg_label: None,
        }
    }

    pub fn with_range(mut self, range: NumericRange) -> Self {
        if let SymbolKind::Variable(lex_type, _) = self.kind {
            self.kind = SymbolKind::Variable(lex_type, Some(range));
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_arg_label(mut self, label: impl Into<String>) -> Self {
        self.arg_label = Some(label.into());
        self
    }

    fn reserved(r: ReservedChar) -> Self {
        Symbol {
            name: r.glyph().to_string(),
            kind: SymbolKind::Reserved(r),
            help: Some(r.help().to_string()),
            arg_label: None,
        }
    }

    /// The argument label a bound value appears under: the explicit
    /// `arg_label` if set, else the symbol's own name for variables, else
    /// `None` for keywords (they never bind a value).
    pub fn effective_arg_label(&self) -> Option<&str> {
        match &self.kind {
            SymbolKind::Keyword | SymbolKind::Reserved(_) => None,
            SymbolKind::Variable(..) => {
                Some(self.arg_label.as_deref().unwrap_or(&self.name))
            }
        }
    }
}

/// The process-wide reserved symbol table, built once.
pub fn reserved_symbols() -> &'static [Symbol] {
    static TABLE: OnceLock<Vec<Symbol>> = OnceLock::new();
    TABLE
        .get_or_init(|| ReservedChar::all().iter().map(|r| Symbol::reserved(*r)).collect())
        .as_slice()
}

pub fn lookup_reserved(glyph: &str) -> Option<&'static Symbol> {
    reserved_symbols().iter().find(|s| s.name == glyph)
}

/// Per-command-tree symbol table: the declared vocabulary a syntax string
/// may reference, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { symbols: Vec::new() }
    }

    pub fn declare(&mut self, symbol: Symbol) {
        if let Some(existing) = self.symbols.iter_mut().find(|s| s.name == symbol.name) {
            *existing = symbol;
        } else {
            self.symbols.push(symbol);
        }
    }

    /// Look up by name, falling back to the reserved table so grammar
    /// punctuation resolves without an explicit declaration.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.name == name)
            .or_else(|| lookup_reserved(name))
    }
}
