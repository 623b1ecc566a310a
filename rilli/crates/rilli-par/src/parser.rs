//! The Rill parser.
//!
//! Translates tokens into symbols. The only structure the grammar has is
//! delimiter nesting, handled by a recursive routine that accumulates the
//! enclosed symbols into a compound literal.

use std::num::ParseFloatError;
use std::rc::Rc;
use std::str::FromStr;

use num_bigint::BigInt;
use rilli_lex::{Delimiter, Lexer, PrimitiveKind, Token, TokenKind};
use rilli_util::{ScriptError, ScriptResult};

use crate::symbol::{Sym, SymKind, SymbolMeta};

/// Parser over a lexed token stream.
pub struct Parser {
    /// Token stream from the lexer.
    tokens: Vec<Token>,

    /// Current position in the token stream.
    position: usize,
}

impl Parser {
    /// Create a new parser from tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Lex and parse a source string in one step.
    ///
    /// # Example
    ///
    /// ```
    /// use rilli_par::Parser;
    ///
    /// let syms = Parser::parse_source("1 2 +").unwrap();
    /// assert_eq!(syms.len(), 3);
    /// ```
    pub fn parse_source(source: &str) -> ScriptResult<Vec<Sym>> {
        let tokens = Lexer::tokenize(source)?;
        Parser::new(tokens).parse()
    }

    /// Parse the whole token stream into a symbol sequence.
    pub fn parse(&mut self) -> ScriptResult<Vec<Sym>> {
        let mut symbols = Vec::new();
        while let Some(token) = self.next_token() {
            symbols.push(self.parse_token(token)?);
        }
        Ok(symbols)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Parse one token into a symbol, recursing into delimiter pairs.
    fn parse_token(&mut self, token: Token) -> ScriptResult<Sym> {
        let meta = SymbolMeta::new(token.text(), token.span);
        match token.kind {
            TokenKind::Operator(op) => Ok(Sym::new(SymKind::Operator(op), meta)),
            TokenKind::Identifier(name) => {
                Ok(Sym::new(SymKind::Ident(Rc::from(name.as_str())), meta))
            }
            TokenKind::Primitive { kind, text } => {
                let kind = self.parse_primitive(kind, &text, &meta)?;
                Ok(Sym::new(kind, meta))
            }
            TokenKind::Delimiter(delim) => self.parse_delimited(delim, meta),
        }
    }

    /// Parse a primitive literal's text into its payload.
    fn parse_primitive(
        &self,
        kind: PrimitiveKind,
        text: &str,
        meta: &SymbolMeta,
    ) -> ScriptResult<SymKind> {
        match kind {
            PrimitiveKind::Bool => Ok(SymKind::Bool(text == "true")),
            PrimitiveKind::Integer => BigInt::from_str(text)
                .map(SymKind::Int)
                .map_err(|_| ScriptError::syntax_at("malformed integer literal", meta.pos())),
            PrimitiveKind::Float => text
                .parse::<f64>()
                .map(SymKind::Float)
                .map_err(|_: ParseFloatError| {
                    ScriptError::syntax_at("malformed float literal", meta.pos())
                }),
            PrimitiveKind::String => {
                let bytes = text.as_bytes();
                let quoted = text.len() >= 2
                    && (bytes[0] == b'\'' || bytes[0] == b'"')
                    && bytes[text.len() - 1] == bytes[0];
                if !quoted {
                    return Err(ScriptError::syntax_at("malformed string", meta.pos()));
                }
                Ok(SymKind::Str(Rc::from(&text[1..text.len() - 1])))
            }
        }
    }

    /// Parse the contents of a delimiter pair into a compound literal.
    ///
    /// The resulting symbol's metadata is the closing delimiter's, with
    /// `start` pointing back at the opener.
    fn parse_delimited(&mut self, open: Delimiter, open_meta: SymbolMeta) -> ScriptResult<Sym> {
        let close = match open.closer() {
            Some(close) => close,
            None => {
                return Err(ScriptError::syntax_at(
                    format!("found closing delimiter '{open}' without matching start"),
                    open_meta.pos(),
                ))
            }
        };

        let mut contents = Vec::new();
        while let Some(token) = self.next_token() {
            if token.kind == TokenKind::Delimiter(close) {
                let meta = SymbolMeta {
                    text: Rc::from(token.text()),
                    span: token.span,
                    start: Some(Rc::new(open_meta)),
                };
                let payload: Rc<[Sym]> = Rc::from(contents);
                let kind = match open {
                    Delimiter::ArrayOpen => SymKind::Array(payload),
                    Delimiter::TupleOpen => SymKind::Tuple(payload),
                    _ => SymKind::Block(payload),
                };
                return Ok(Sym::new(kind, meta));
            }
            contents.push(self.parse_token(token)?);
        }

        Err(ScriptError::syntax_at(
            format!("could not find closing delimiter for '{open}'"),
            open_meta.pos(),
        ))
    }
}
