//! Token definitions for the Spelt expression language.
//!
//! Tokens are produced in two steps. A splitter cuts the source text into
//! [`RawToken`] fragments, then a chain of recognizers classifies each fragment
//! into a [`TokenType`]. Token types come from several enumerations that live
//! side by side:
//!
//! - [`BasicToken`]: the core grammar (literal classes, punctuation, operators)
//! - [`TemplateToken`]: keywords contributed by the templating grammar
//! - [`TokenType::Custom`]: kinds declared at runtime by domain extensions
//!
//! Each enumeration implements [`TokenSet`], listing the literal spellings of
//! its members, so a grammar can be composed without editing a shared table.
//!
//! # Examples
//!
//! ```rust
//! use spelt_syntax::{BasicToken, Span, Token, TokenSet, TokenType};
//!
//! let token = Token::new(BasicToken::Plus, "+", Span::new(2, 3, 1, 3));
//! assert!(token.is(BasicToken::Plus));
//! assert_eq!(BasicToken::AndAnd.spellings(), &["&&", "and", "AND"]);
//! assert_eq!(TokenType::from(BasicToken::LParen).to_string(), "(");
//! ```

use std::fmt;

/// Location of a token in the expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub col: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Self { start, end, line, col }
    }
}

/// An enumeration of token kinds whose members declare literal spellings.
///
/// Implemented by every keyword/operator table. Enum recognizers are generic
/// over this trait.
pub trait TokenSet: Copy + fmt::Debug + Send + Sync + 'static {
    /// All members of the enumeration, in declaration order.
    fn members() -> &'static [Self];

    /// Source spellings matched by this member. Members that classify by
    /// shape (identifiers, numbers) return an empty slice.
    fn spellings(&self) -> &'static [&'static str];

    /// The tagged token type of this member.
    fn token_type(self) -> TokenType;
}

/// Token kinds of the core expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicToken {
    // === Classified by shape ===
    /// Identifier (`user`, `first_name`, `$root`)
    Identifier,
    /// Numeric literal (`42`, `3.14`, `10L`)
    Number,
    /// Quoted string literal (`'abc'`, `"abc"`)
    String,
    /// Unclassified fragment; the lexer default
    Raw,
    /// End of input
    Eof,

    // === Punctuation ===
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Question,
    Semicolon,

    // === Operators ===
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Increment,
    Decrement,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    Bang,
    Assign,

    // === Keywords ===
    True,
    False,
    Null,
    As,
}

const BASIC_TOKENS: &[BasicToken] = &[
    BasicToken::Identifier,
    BasicToken::Number,
    BasicToken::String,
    BasicToken::Raw,
    BasicToken::Eof,
    BasicToken::LParen,
    BasicToken::RParen,
    BasicToken::LBracket,
    BasicToken::RBracket,
    BasicToken::LBrace,
    BasicToken::RBrace,
    BasicToken::Comma,
    BasicToken::Dot,
    BasicToken::Colon,
    BasicToken::Question,
    BasicToken::Semicolon,
    BasicToken::Plus,
    BasicToken::Minus,
    BasicToken::Star,
    BasicToken::Slash,
    BasicToken::Percent,
    BasicToken::Increment,
    BasicToken::Decrement,
    BasicToken::EqEq,
    BasicToken::NotEq,
    BasicToken::Less,
    BasicToken::LessEq,
    BasicToken::Greater,
    BasicToken::GreaterEq,
    BasicToken::AndAnd,
    BasicToken::OrOr,
    BasicToken::Bang,
    BasicToken::Assign,
    BasicToken::True,
    BasicToken::False,
    BasicToken::Null,
    BasicToken::As,
];

impl TokenSet for BasicToken {
    fn members() -> &'static [Self] {
        BASIC_TOKENS
    }

    fn spellings(&self) -> &'static [&'static str] {
        use BasicToken::*;
        match self {
            Identifier | Number | String | Raw | Eof => &[],
            LParen => &["("],
            RParen => &[")"],
            LBracket => &["["],
            RBracket => &["]"],
            LBrace => &["{"],
            RBrace => &["}"],
            Comma => &[","],
            Dot => &["."],
            Colon => &[":"],
            Question => &["?"],
            Semicolon => &[";"],
            Plus => &["+"],
            Minus => &["-"],
            Star => &["*"],
            Slash => &["/", "div"],
            Percent => &["%", "mod"],
            Increment => &["++"],
            Decrement => &["--"],
            EqEq => &["==", "eq"],
            NotEq => &["!=", "ne"],
            Less => &["<", "lt"],
            LessEq => &["<=", "le"],
            Greater => &[">", "gt"],
            GreaterEq => &[">=", "ge"],
            AndAnd => &["&&", "and", "AND"],
            OrOr => &["||", "or", "OR"],
            Bang => &["!", "not", "NOT"],
            Assign => &["="],
            True => &["true"],
            False => &["false"],
            Null => &["null"],
            As => &["as"],
        }
    }

    fn token_type(self) -> TokenType {
        TokenType::Basic(self)
    }
}

/// Keywords of the templating grammar.
///
/// Not part of the core grammar: hosts import them through the template
/// extension, which registers them ahead of the identifier recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateToken {
    For,
    In,
    If,
    Else,
    End,
}

const TEMPLATE_TOKENS: &[TemplateToken] = &[
    TemplateToken::For,
    TemplateToken::In,
    TemplateToken::If,
    TemplateToken::Else,
    TemplateToken::End,
];

impl TokenSet for TemplateToken {
    fn members() -> &'static [Self] {
        TEMPLATE_TOKENS
    }

    fn spellings(&self) -> &'static [&'static str] {
        match self {
            TemplateToken::For => &["for"],
            TemplateToken::In => &["in"],
            TemplateToken::If => &["if"],
            TemplateToken::Else => &["else"],
            TemplateToken::End => &["end"],
        }
    }

    fn token_type(self) -> TokenType {
        TokenType::Template(self)
    }
}

/// Tagged token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Basic(BasicToken),
    Template(TemplateToken),
    /// A kind declared by a domain extension, e.g. `{ grammar: "policy", name: "hasRole" }`.
    Custom {
        grammar: &'static str,
        name: &'static str,
    },
}

impl TokenType {
    pub const EOF: TokenType = TokenType::Basic(BasicToken::Eof);
    pub const IDENTIFIER: TokenType = TokenType::Basic(BasicToken::Identifier);

    /// Spellings of the underlying enumeration member.
    pub fn spellings(&self) -> &'static [&'static str] {
        match self {
            TokenType::Basic(b) => b.spellings(),
            TokenType::Template(t) => t.spellings(),
            TokenType::Custom { .. } => &[],
        }
    }
}

impl From<BasicToken> for TokenType {
    fn from(b: BasicToken) -> Self {
        TokenType::Basic(b)
    }
}

impl From<TemplateToken> for TokenType {
    fn from(t: TemplateToken) -> Self {
        TokenType::Template(t)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Basic(BasicToken::Identifier) => f.write_str("identifier"),
            TokenType::Basic(BasicToken::Number) => f.write_str("number"),
            TokenType::Basic(BasicToken::String) => f.write_str("string"),
            TokenType::Basic(BasicToken::Raw) => f.write_str("raw text"),
            TokenType::Basic(BasicToken::Eof) => f.write_str("end of input"),
            TokenType::Custom { grammar, name } => write!(f, "{}:{}", grammar, name),
            other => match other.spellings().first() {
                Some(s) => f.write_str(s),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

/// A source fragment that has not been classified yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    pub span: Span,
}

impl RawToken {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self { text: text.into(), span }
    }
}

/// A classified token with its raw text and location.
///
/// Tokens are immutable once produced. String literals keep their quotes and
/// escapes in `text`; the parser decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The lexical category
    pub kind: TokenType,

    /// Raw source text of the token
    pub text: String,

    /// Location in the source
    pub span: Span,
}

impl Token {
    pub fn new(kind: impl Into<TokenType>, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            span,
        }
    }

    /// Returns `true` if this token has the given kind.
    pub fn is(&self, kind: impl Into<TokenType>) -> bool {
        self.kind == kind.into()
    }

    /// Returns `true` if this token has any of the given kinds.
    pub fn is_any(&self, kinds: &[TokenType]) -> bool {
        kinds.contains(&self.kind)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is(BasicToken::Eof) {
            f.write_str("end of input")
        } else {
            write!(f, "'{}'", self.text)
        }
    }
}
