//! Script error taxonomy.
//!
//! Every way a *script* can fail is one of the closed set of [`ErrorKind`]s.
//! Errors raised deep inside an operator handler usually have no position;
//! the evaluator attaches the current symbol's position before re-raising,
//! so by the time an error reaches the driver it points at source code.

use std::fmt;

use thiserror::Error;

use crate::span::SourcePos;

/// Result alias for script execution.
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

/// The closed set of script-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Lexer or parser failure (unmatched delimiter, bad literal, dangling `:`)
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Identifier not bound in any chained scope
    #[error("could not resolve identifier '{0}'")]
    Name(String),

    /// No operator overload matches, or a handler rejected its arguments
    #[error("{message}{operands}")]
    Operand {
        message: String,
        /// Formatted offending operands (with leading separator), or empty
        operands: String,
    },

    /// Out-of-range or zero index into a sequence
    #[error("{0}")]
    Index(String),

    /// Assignment target is not bindable, or destructuring count mismatch
    #[error("{0}")]
    Assignment(String),

    /// Everything else: empty-stack pop, division by zero, bad loop condition
    #[error("{0}")]
    Generic(String),
}

/// A script error: an [`ErrorKind`] plus an optional source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    kind: ErrorKind,
    pos: Option<SourcePos>,
}

impl ScriptError {
    /// Create an error from a kind, with no position yet.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, pos: None }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax(message.into()))
    }

    /// Syntax error already carrying its position (lexer/parser use this).
    pub fn syntax_at(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(ErrorKind::Syntax(message.into())).at(pos)
    }

    pub fn name(identifier: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name(identifier.into()))
    }

    pub fn operand(message: impl Into<String>, operands: impl Into<String>) -> Self {
        let operands = operands.into();
        let operands = if operands.is_empty() {
            operands
        } else {
            format!(": {operands}")
        };
        Self::new(ErrorKind::Operand {
            message: message.into(),
            operands,
        })
    }

    pub fn index(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Index(message.into()))
    }

    pub fn assignment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assignment(message.into()))
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic(message.into()))
    }

    /// Attach a position, replacing any existing one.
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Attach a position only if the error does not have one yet.
    ///
    /// This is what the evaluator calls for every error that crosses it, so
    /// the position always refers to the innermost symbol that failed.
    pub fn or_at(mut self, pos: impl FnOnce() -> SourcePos) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos());
        }
        self
    }

    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[inline]
    pub fn pos(&self) -> Option<&SourcePos> {
        self.pos.as_ref()
    }

    #[inline]
    pub fn has_pos(&self) -> bool {
        self.pos.is_some()
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{} ({})", self.kind, pos),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ScriptError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn test_error_display_without_pos() {
        let err = ScriptError::generic("stack is empty");
        assert_eq!(err.to_string(), "stack is empty");
    }

    #[test]
    fn test_error_display_with_pos() {
        let err = ScriptError::syntax("unmatched delimiter")
            .at(SourcePos::new(Span::new(0, 1, 1, 3), "["));
        assert_eq!(
            err.to_string(),
            "syntax error: unmatched delimiter (line 1, column 3: near '[')"
        );
    }

    #[test]
    fn test_or_at_keeps_existing_pos() {
        let first = SourcePos::new(Span::new(0, 1, 1, 1), "a");
        let second = SourcePos::new(Span::new(2, 3, 2, 2), "b");
        let err = ScriptError::name("a").at(first.clone()).or_at(|| second);
        assert_eq!(err.pos(), Some(&first));
    }

    #[test]
    fn test_or_at_fills_missing_pos() {
        let pos = SourcePos::new(Span::new(0, 1, 4, 9), "+");
        let err = ScriptError::operand("invalid operands", "1, 'a'").or_at(|| pos.clone());
        assert_eq!(err.pos(), Some(&pos));
        assert!(err.has_pos());
    }

    #[test]
    fn test_name_error_message() {
        let err = ScriptError::name("factorial");
        assert_eq!(err.to_string(), "could not resolve identifier 'factorial'");
    }

    #[test]
    fn test_operand_error_message() {
        let err = ScriptError::operand("invalid operands", "1, {2*}");
        assert_eq!(err.to_string(), "invalid operands: 1, {2*}");
    }
}
