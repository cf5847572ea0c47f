//! Error handling types and utilities for the Spelt expression engine.
//!
//! Every stage of the engine (lexing, parsing, evaluation, conversion) reports
//! failures through the single [`Error`] type defined here. An error carries an
//! [`ErrorKind`] so embedding hosts can react to the category of failure (a
//! policy engine may deny on [`ErrorKind::OperatorResolution`], a template
//! renderer may print an empty string on [`ErrorKind::Unresolved`]), a
//! human-readable message and an optional source location.
//!
//! Errors are fail-fast: the engine never retries and never returns a partial
//! value once an error has been raised.
//!
//! # Examples
//!
//! ```rust
//! use spelt_syntax::error::{Error, ErrorKind, Result, error};
//!
//! let simple = Error::new("Something went wrong");
//! assert_eq!(simple.kind, ErrorKind::Evaluation);
//!
//! let located = Error::syntax("Expected ')'", 1, 7);
//! assert_eq!(located.to_string(), "Expected ')' at 1:7");
//!
//! fn might_fail() -> Result<i32> {
//!     error("Operation failed")
//! }
//! assert!(might_fail().is_err());
//! ```

use std::fmt;

/// Category of an engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A source fragment could not be split or classified.
    Lexical,
    /// The token stream does not follow the grammar.
    Syntax,
    /// No operator handler accepts the operand types.
    OperatorResolution,
    /// No function overload softly matches the argument types.
    FunctionNotFound,
    /// A value could not be converted to the required type.
    Conversion,
    /// A name or property could not be resolved in strict mode, or a write
    /// targeted a missing container.
    Unresolved,
    /// Integer division or remainder by zero.
    Arithmetic,
    /// Any other evaluation failure raised by host functions.
    Evaluation,
}

impl ErrorKind {
    /// Short label used when rendering diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Lexical => "Lexical error",
            ErrorKind::Syntax => "Syntax error",
            ErrorKind::OperatorResolution => "Operator error",
            ErrorKind::FunctionNotFound => "Function not found",
            ErrorKind::Conversion => "Conversion error",
            ErrorKind::Unresolved => "Unresolved",
            ErrorKind::Arithmetic => "Arithmetic error",
            ErrorKind::Evaluation => "Evaluation error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An error raised while processing an expression.
///
/// # Fields
///
/// - `kind`: failure category
/// - `msg`: human-readable error description
/// - `line`: optional 1-based line number in the expression source
/// - `col`: optional 1-based column number in the expression source
///
/// ```rust
/// use spelt_syntax::{Error, ErrorKind};
///
/// let err = Error::with_span(ErrorKind::Lexical, "Unterminated string", 3, 8);
/// assert_eq!(err.to_string(), "Unterminated string at 3:8");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// Failure category
    pub kind: ErrorKind,

    /// Human-readable error message
    pub msg: String,

    /// Optional line number in source (1-based)
    pub line: Option<usize>,

    /// Optional column number in source (1-based)
    pub col: Option<usize>,
}

impl Error {
    /// Creates an [`ErrorKind::Evaluation`] error without location.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::of(ErrorKind::Evaluation, msg)
    }

    /// Creates an error of the given kind without location.
    pub fn of(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            line: None,
            col: None,
        }
    }

    /// Creates an error of the given kind located at `line:col`.
    pub fn with_span(kind: ErrorKind, msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            msg: msg.into(),
            line: Some(line),
            col: Some(col),
        }
    }

    pub fn lexical(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self::with_span(ErrorKind::Lexical, msg, line, col)
    }

    pub fn syntax(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self::with_span(ErrorKind::Syntax, msg, line, col)
    }

    pub fn operator(msg: impl Into<String>) -> Self {
        Self::of(ErrorKind::OperatorResolution, msg)
    }

    pub fn function_not_found(msg: impl Into<String>) -> Self {
        Self::of(ErrorKind::FunctionNotFound, msg)
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::of(ErrorKind::Conversion, msg)
    }

    pub fn unresolved(msg: impl Into<String>) -> Self {
        Self::of(ErrorKind::Unresolved, msg)
    }

    pub fn arithmetic(msg: impl Into<String>) -> Self {
        Self::of(ErrorKind::Arithmetic, msg)
    }

    /// Returns `true` if this error belongs to `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(l), Some(c)) = (self.line, self.col) {
            write!(f, "{} at {}:{}", self.msg, l, c)
        } else {
            write!(f, "{}", self.msg)
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` type for Spelt operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::new(msg))`.
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}

/// Shorthand for `Err(Error::with_span(kind, msg, line, col))`.
///
/// ```rust
/// use spelt_syntax::error::{ErrorKind, Result, error_at};
///
/// fn parse_at(line: usize, col: usize) -> Result<String> {
///     error_at(ErrorKind::Syntax, line, col, "Unexpected character '#'")
/// }
/// assert_eq!(parse_at(1, 4).unwrap_err().col, Some(4));
/// ```
pub fn error_at<T>(kind: ErrorKind, line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::with_span(kind, msg, line, col))
}
