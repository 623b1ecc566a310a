//! rilli-lex - Lexical analyzer for Rill source text.
//!
//! The lexer turns a source string into a stream of [`Token`]s, each
//! carrying its starting position. Rill has a deliberately small lexical
//! grammar:
//!
//! - whitespace separates tokens and means nothing else
//! - `//` comments run to end of line
//! - delimiters `{ }` `[ ]` `( )` open and close nested literals
//! - the closed operator set, matched longest-first (`**` before `*`,
//!   `<=`/`<<` before `<`, `~=` before `~`, `..` is the only dotted token)
//! - the reserved words `not and or if do while` lex as operators
//! - numbers, quoted strings, `true`/`false`, and identifiers
//!
//! Alternatives are tried in that order, so `-1` is the `-` operator
//! followed by the integer `1`. Anything unmatched raises a syntax error
//! carrying the offending character's position.
//!
//! Numeric and string token *text* is passed through verbatim; turning it
//! into values is the parser's job.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{keyword_operator, Delimiter, Operator, PrimitiveKind, Token, TokenKind};
