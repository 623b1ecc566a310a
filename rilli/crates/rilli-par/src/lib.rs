//! rilli-par - Parser for Rill token streams.
//!
//! The parser turns the lexer's flat token stream into a stream of
//! [`Sym`]bols. Most tokens translate one-for-one; delimiter tokens are
//! matched recursively into nested `Array`/`Block`/`Tuple` literals whose
//! payload is the enclosed symbol sequence.
//!
//! This is also where literal *text* becomes literal *payload*: integer
//! text is parsed into an arbitrary-precision [`num_bigint::BigInt`],
//! float text into an `f64`, and string quotes are validated and
//! stripped.

pub mod parser;
pub mod symbol;

pub use parser::Parser;
pub use symbol::{format_float, format_symbols, quote_str, Sym, SymKind, SymSeq, SymbolMeta};
