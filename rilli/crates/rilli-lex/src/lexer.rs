//! The Rill lexer.
//!
//! A hand-written scanner that dispatches on the leading character of each
//! token. Operator characters are resolved longest-first by peeking one
//! character ahead, which is all the lookahead the grammar ever needs.

use rilli_util::{ScriptError, ScriptResult, SourcePos, Span};

use crate::cursor::Cursor;
use crate::token::{
    keyword_operator, Delimiter, Operator, PrimitiveKind, Token, TokenKind,
};

/// The lexer for Rill source text.
///
/// # Example
///
/// ```
/// use rilli_lex::{Lexer, TokenKind, Operator};
///
/// let tokens = Lexer::tokenize("1 1 +").unwrap();
/// assert_eq!(tokens.len(), 3);
/// assert_eq!(tokens[2].kind, TokenKind::Operator(Operator::Add));
/// ```
pub struct Lexer<'a> {
    /// Character cursor for traversing the source.
    cursor: Cursor<'a>,

    /// Start byte position of the current token.
    token_start: usize,

    /// Start line of the current token (1-based).
    token_start_line: u32,

    /// Start column of the current token (1-based).
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Lexes an entire source string into a token vector.
    pub fn tokenize(source: &'a str) -> ScriptResult<Vec<Token>> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> ScriptResult<Option<Token>> {
        self.skip_trivia();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(None);
        }

        let token = match self.cursor.current_char() {
            '{' => self.delimiter(Delimiter::BlockOpen),
            '}' => self.delimiter(Delimiter::BlockClose),
            '[' => self.delimiter(Delimiter::ArrayOpen),
            ']' => self.delimiter(Delimiter::ArrayClose),
            '(' => self.delimiter(Delimiter::TupleOpen),
            ')' => self.delimiter(Delimiter::TupleClose),

            '~' => self.one_or_two('=', Operator::NotEqual, Operator::Invert),
            '`' => self.single(Operator::Inspect),
            '!' => self.single(Operator::Eval),
            ',' => self.single(Operator::Drop),
            ';' => self.single(Operator::Break),
            ':' => self.single(Operator::Assign),
            '+' => self.single(Operator::Add),
            '-' => self.single(Operator::Sub),
            '*' => self.one_or_two('*', Operator::Pow, Operator::Mul),
            '/' => self.single(Operator::Div),
            '%' => self.single(Operator::Mod),
            '|' => self.single(Operator::BitOr),
            '&' => self.single(Operator::BitAnd),
            '^' => self.single(Operator::BitXor),
            '=' => self.single(Operator::Equal),
            '$' => self.single(Operator::Index),
            '#' => self.single(Operator::Size),
            '<' => match self.cursor.peek_char() {
                '=' => self.double(Operator::Le),
                '<' => self.double(Operator::Collect),
                _ => self.single(Operator::Lt),
            },
            '>' => match self.cursor.peek_char() {
                '=' => self.double(Operator::Ge),
                '>' => self.double(Operator::RShift),
                _ => self.single(Operator::Gt),
            },

            '\'' | '"' => self.lex_string()?,
            '.' => self.lex_dot()?,
            c if c.is_ascii_digit() => self.lex_number(),
            c if c == '_' || c.is_ascii_alphabetic() => self.lex_identifier(),

            c => {
                return Err(ScriptError::syntax_at(
                    format!("unexpected character '{c}'"),
                    SourcePos::new(self.token_span(), c.to_string()),
                ))
            }
        };

        Ok(Some(token))
    }

    /// Skips whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if c.is_whitespace() {
                self.cursor.advance();
            } else if c == '/' && self.cursor.peek_char() == '/' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
            } else {
                break;
            }
        }
    }

    /// The span from the current token's start to the cursor.
    fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    fn make(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            span: self.token_span(),
        }
    }

    fn delimiter(&mut self, delim: Delimiter) -> Token {
        self.cursor.advance();
        self.make(TokenKind::Delimiter(delim))
    }

    fn single(&mut self, op: Operator) -> Token {
        self.cursor.advance();
        self.make(TokenKind::Operator(op))
    }

    fn double(&mut self, op: Operator) -> Token {
        self.cursor.advance();
        self.cursor.advance();
        self.make(TokenKind::Operator(op))
    }

    /// Consumes one character; if `next` follows, consumes it too and
    /// yields `two`, otherwise yields `one`.
    fn one_or_two(&mut self, next: char, two: Operator, one: Operator) -> Token {
        self.cursor.advance();
        if self.cursor.match_char(next) {
            self.make(TokenKind::Operator(two))
        } else {
            self.make(TokenKind::Operator(one))
        }
    }

    /// Lexes a token starting with `.`: either the `..` operator or a
    /// float written with a leading dot (`.5`).
    fn lex_dot(&mut self) -> ScriptResult<Token> {
        if self.cursor.peek_char() == '.' {
            return Ok(self.double(Operator::Dup));
        }
        if self.cursor.peek_char().is_ascii_digit() {
            self.cursor.advance(); // '.'
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
            return Ok(self.primitive(PrimitiveKind::Float));
        }
        Err(ScriptError::syntax_at(
            "unexpected character '.'".to_string(),
            SourcePos::new(self.token_span(), "."),
        ))
    }

    /// Lexes an integer or float literal.
    ///
    /// Digits followed by a single `.` continue as a float; a double dot
    /// is left for the `..` operator, so `1..2` is `1 .. 2`.
    fn lex_number(&mut self) -> Token {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' && self.cursor.peek_char() != '.' {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
            return self.primitive(PrimitiveKind::Float);
        }

        self.primitive(PrimitiveKind::Integer)
    }

    /// Lexes a quoted string literal. No escape processing; the quotes
    /// stay in the token text and are stripped by the parser.
    fn lex_string(&mut self) -> ScriptResult<Token> {
        let quote = self.cursor.current_char();
        self.cursor.advance();

        loop {
            if self.cursor.is_at_end() || self.cursor.current_char() == '\n' {
                return Err(ScriptError::syntax_at(
                    "unterminated string literal".to_string(),
                    SourcePos::new(self.token_span(), quote.to_string()),
                ));
            }
            let c = self.cursor.current_char();
            self.cursor.advance();
            if c == quote {
                break;
            }
        }

        Ok(self.primitive(PrimitiveKind::String))
    }

    /// Lexes an identifier, boolean literal, or reserved word.
    fn lex_identifier(&mut self) -> Token {
        loop {
            let c = self.cursor.current_char();
            if c == '_' || c.is_ascii_alphanumeric() {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let text = self.cursor.slice_from(self.token_start);
        if text == "true" || text == "false" {
            return self.primitive(PrimitiveKind::Bool);
        }
        if let Some(op) = keyword_operator(text) {
            return self.make(TokenKind::Operator(op));
        }
        self.make(TokenKind::Identifier(text.to_string()))
    }

    fn primitive(&self, kind: PrimitiveKind) -> Token {
        let text = self.cursor.slice_from(self.token_start).to_string();
        self.make(TokenKind::Primitive { kind, text })
    }
}
