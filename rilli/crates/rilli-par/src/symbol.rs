//! Symbol definitions - the parser's output and the evaluator's input.
//!
//! Symbols are immutable. Block values capture their symbol sequence as an
//! `Rc<[Sym]>`, so the same parse output is shared by every copy of a block
//! without cloning.

use std::fmt::Write as _;
use std::rc::Rc;

use num_bigint::BigInt;
use rilli_lex::Operator;
use rilli_util::{SourcePos, Span};

/// A shared, immutable sequence of symbols (an array/block/tuple payload).
pub type SymSeq = Rc<[Sym]>;

/// Source metadata carried by every symbol.
#[derive(Clone, Debug)]
pub struct SymbolMeta {
    /// The token text this symbol came from. For a nested literal this is
    /// the closing delimiter.
    pub text: Rc<str>,
    /// Location of the token.
    pub span: Span,
    /// For a nested literal, the metadata of its opening delimiter.
    pub start: Option<Rc<SymbolMeta>>,
}

impl SymbolMeta {
    /// Create metadata for a plain (non-delimited) token.
    pub fn new(text: impl Into<Rc<str>>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
            start: None,
        }
    }

    /// The error-report position of this symbol.
    pub fn pos(&self) -> SourcePos {
        SourcePos::new(self.span, self.text.as_ref())
    }
}

/// What a symbol is: an identifier, an operator, or a literal.
///
/// Literal kinds mirror the data model: simple payloads are stored
/// directly, compound literals hold the unevaluated symbol sequence
/// between their delimiters.
#[derive(Clone, Debug, PartialEq)]
pub enum SymKind {
    Ident(Rc<str>),
    Operator(Operator),
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(Rc<str>),
    Array(SymSeq),
    Tuple(SymSeq),
    Block(SymSeq),
}

/// A parsed symbol with its source metadata.
///
/// Equality compares the symbol content only; two blocks written at
/// different source positions are still equal.
#[derive(Clone, Debug)]
pub struct Sym {
    pub kind: SymKind,
    pub meta: SymbolMeta,
}

impl PartialEq for Sym {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Sym {
    pub fn new(kind: SymKind, meta: SymbolMeta) -> Self {
        Self { kind, meta }
    }

    /// Renders this symbol back to source text.
    pub fn format(&self) -> String {
        match &self.kind {
            SymKind::Ident(name) => name.to_string(),
            SymKind::Operator(op) => op.text().to_string(),
            SymKind::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            SymKind::Int(n) => n.to_string(),
            SymKind::Float(f) => format_float(*f),
            SymKind::Str(s) => quote_str(s),
            SymKind::Array(syms) => format!("[{}]", format_symbols(syms)),
            SymKind::Tuple(syms) => format!("({})", format_symbols(syms)),
            SymKind::Block(syms) => format!("{{{}}}", format_symbols(syms)),
        }
    }
}

/// Renders a symbol sequence back to source text, space-separated and
/// padded inside so `{ 1 2 }` round-trips through the lexer.
pub fn format_symbols(syms: &[Sym]) -> String {
    let mut out = String::new();
    for sym in syms {
        out.push(' ');
        let _ = write!(out, "{}", sym.format());
    }
    if !out.is_empty() {
        out.push(' ');
    }
    out
}

/// Quotes a string payload, preferring single quotes.
pub fn quote_str(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{s}\"")
    } else {
        format!("'{s}'")
    }
}

/// Shortest round-trip float rendering. Finite floats always carry a `.`
/// or an exponent, so the result re-lexes as a Float and never an Int.
pub fn format_float(f: f64) -> String {
    if f.is_finite() {
        let mut buf = ryu::Buffer::new();
        buf.format(f).to_string()
    } else {
        format!("{f}")
    }
}
