//! Classification of raw fragments into token types.
//!
//! Recognizers form a chain ordered by priority: the lower the priority value,
//! the earlier a recognizer is consulted, and the first one returning a token
//! type decides. Grammars contribute their own recognizers (the template
//! keywords, a policy extension's verbs) instead of editing a shared table.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use spelt_syntax::token::{BasicToken, RawToken, TokenSet, TokenType};

use crate::splitter::{is_word_part, is_word_start};

/// Priority used by the core keyword/operator table.
pub const BASIC_PRIORITY: i32 = 200;
/// Priority used by the template keyword table.
pub const TEMPLATE_PRIORITY: i32 = 50;
/// Priority of literal-shape recognizers (strings, numbers).
pub const LITERAL_PRIORITY: i32 = 100;
/// Priority of the catch-all identifier recognizer.
pub const IDENTIFIER_PRIORITY: i32 = 1000;

/// Classifies a raw fragment.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, raw: &RawToken) -> Option<TokenType>;

    /// Lower values are consulted first.
    fn priority(&self) -> i32;

    /// Punctuation spellings this recognizer matches. The splitter cuts them
    /// as single fragments.
    fn symbols(&self) -> Vec<String> {
        Vec::new()
    }
}

fn is_word(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if is_word_start(c)) && chars.all(is_word_part)
}

/// Matches the literal spellings declared on a [`TokenSet`] enumeration.
pub struct EnumRecognizer<T: TokenSet> {
    priority: i32,
    table: HashMap<&'static str, TokenType>,
    _set: PhantomData<T>,
}

impl<T: TokenSet> EnumRecognizer<T> {
    pub fn new(priority: i32) -> Self {
        let mut table = HashMap::new();
        for member in T::members() {
            for spelling in member.spellings() {
                table.entry(*spelling).or_insert_with(|| member.token_type());
            }
        }
        Self {
            priority,
            table,
            _set: PhantomData,
        }
    }
}

impl<T: TokenSet> Recognizer for EnumRecognizer<T> {
    fn recognize(&self, raw: &RawToken) -> Option<TokenType> {
        self.table.get(raw.text.as_str()).copied()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn symbols(&self) -> Vec<String> {
        self.table
            .keys()
            .filter(|s| !is_word(s))
            .map(|s| s.to_string())
            .collect()
    }
}

impl<T: TokenSet> fmt::Debug for EnumRecognizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumRecognizer")
            .field("set", &std::any::type_name::<T>())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Spelling table declared at runtime, producing [`TokenType::Custom`] kinds.
///
/// ```rust
/// use spelt_lexer::{Recognizer, TableRecognizer};
/// use spelt_syntax::{RawToken, Span, TokenType};
///
/// let r = TableRecognizer::new("policy", 150).entry("**", "power");
/// let raw = RawToken::new("**", Span::default());
/// assert_eq!(r.recognize(&raw), Some(TokenType::Custom { grammar: "policy", name: "power" }));
/// assert_eq!(r.symbols(), vec!["**".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct TableRecognizer {
    grammar: &'static str,
    priority: i32,
    table: HashMap<String, TokenType>,
}

impl TableRecognizer {
    pub fn new(grammar: &'static str, priority: i32) -> Self {
        Self {
            grammar,
            priority,
            table: HashMap::new(),
        }
    }

    /// Maps `spelling` to `Custom { grammar, name }`.
    pub fn entry(mut self, spelling: impl Into<String>, name: &'static str) -> Self {
        let kind = TokenType::Custom {
            grammar: self.grammar,
            name,
        };
        self.table.insert(spelling.into(), kind);
        self
    }

    /// Maps `spelling` to an existing token type (an alias spelling).
    pub fn alias(mut self, spelling: impl Into<String>, kind: impl Into<TokenType>) -> Self {
        self.table.insert(spelling.into(), kind.into());
        self
    }
}

impl Recognizer for TableRecognizer {
    fn recognize(&self, raw: &RawToken) -> Option<TokenType> {
        self.table.get(&raw.text).copied()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn symbols(&self) -> Vec<String> {
        self.table.keys().filter(|s| !is_word(s)).cloned().collect()
    }
}

/// Recognizer backed by a closure: a priority plus a matcher.
pub struct FnRecognizer<F> {
    priority: i32,
    matcher: F,
}

impl<F> FnRecognizer<F>
where
    F: Fn(&RawToken) -> Option<TokenType> + Send + Sync,
{
    pub fn new(priority: i32, matcher: F) -> Self {
        Self { priority, matcher }
    }
}

impl<F> Recognizer for FnRecognizer<F>
where
    F: Fn(&RawToken) -> Option<TokenType> + Send + Sync,
{
    fn recognize(&self, raw: &RawToken) -> Option<TokenType> {
        (self.matcher)(raw)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Quoted string literals.
#[derive(Debug, Clone, Copy)]
pub struct StringRecognizer;

impl Recognizer for StringRecognizer {
    fn recognize(&self, raw: &RawToken) -> Option<TokenType> {
        match raw.text.chars().next() {
            Some('\'' | '"') => Some(BasicToken::String.into()),
            _ => None,
        }
    }

    fn priority(&self) -> i32 {
        LITERAL_PRIORITY
    }
}

/// Numeric literals.
#[derive(Debug, Clone, Copy)]
pub struct NumberRecognizer;

impl Recognizer for NumberRecognizer {
    fn recognize(&self, raw: &RawToken) -> Option<TokenType> {
        match raw.text.chars().next() {
            Some(c) if c.is_ascii_digit() => Some(BasicToken::Number.into()),
            _ => None,
        }
    }

    fn priority(&self) -> i32 {
        LITERAL_PRIORITY
    }
}

/// Any identifier-shaped word.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierRecognizer;

impl Recognizer for IdentifierRecognizer {
    fn recognize(&self, raw: &RawToken) -> Option<TokenType> {
        if is_word(&raw.text) {
            Some(TokenType::IDENTIFIER)
        } else {
            None
        }
    }

    fn priority(&self) -> i32 {
        IDENTIFIER_PRIORITY
    }
}

/// Priority-ordered set of recognizers.
///
/// Children are sorted once when the composite is built; ties keep insertion
/// order. Adding a child returns a new composite and leaves `self` untouched,
/// so a composite can be shared between lexers on different threads.
#[derive(Clone)]
pub struct CompositeRecognizer {
    children: Arc<[Arc<dyn Recognizer>]>,
}

impl CompositeRecognizer {
    pub fn new(children: Vec<Arc<dyn Recognizer>>) -> Self {
        let mut children = children;
        children.sort_by_key(|r| r.priority());
        Self {
            children: children.into(),
        }
    }

    /// A new composite with `child` added.
    pub fn with(&self, child: Arc<dyn Recognizer>) -> Self {
        let mut children: Vec<_> = self.children.iter().cloned().collect();
        children.push(child);
        Self::new(children)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child priorities in consultation order.
    pub fn priorities(&self) -> Vec<i32> {
        self.children.iter().map(|r| r.priority()).collect()
    }
}

impl Recognizer for CompositeRecognizer {
    fn recognize(&self, raw: &RawToken) -> Option<TokenType> {
        self.children.iter().find_map(|r| r.recognize(raw))
    }

    fn priority(&self) -> i32 {
        self.children.first().map_or(0, |r| r.priority())
    }

    fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.children.iter().flat_map(|r| r.symbols()).collect();
        out.sort();
        out.dedup();
        out
    }
}

impl Default for CompositeRecognizer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for CompositeRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeRecognizer")
            .field("priorities", &self.priorities())
            .finish()
    }
}

/// Recognizers of the core grammar: literals, the basic token table and
/// identifiers.
pub fn core_recognizers() -> Vec<Arc<dyn Recognizer>> {
    vec![
        Arc::new(StringRecognizer),
        Arc::new(NumberRecognizer),
        Arc::new(EnumRecognizer::<BasicToken>::new(BASIC_PRIORITY)),
        Arc::new(IdentifierRecognizer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelt_syntax::token::{Span, TemplateToken};

    fn raw(text: &str) -> RawToken {
        RawToken::new(text, Span::default())
    }

    #[test]
    fn test_keyword_beats_identifier_by_priority() {
        let chain = CompositeRecognizer::new(vec![
            Arc::new(IdentifierRecognizer),
            Arc::new(EnumRecognizer::<TemplateToken>::new(TEMPLATE_PRIORITY)),
        ]);
        assert_eq!(chain.recognize(&raw("for")), Some(TemplateToken::For.into()));
        assert_eq!(chain.recognize(&raw("fort")), Some(TokenType::IDENTIFIER));
        assert_eq!(chain.priorities(), vec![TEMPLATE_PRIORITY, IDENTIFIER_PRIORITY]);
    }

    #[test]
    fn test_lower_priority_value_is_authoritative() {
        let chain = CompositeRecognizer::new(vec![
            Arc::new(TableRecognizer::new("late", 300).entry("x", "late")),
            Arc::new(TableRecognizer::new("early", 10).entry("x", "early")),
        ]);
        assert_eq!(
            chain.recognize(&raw("x")),
            Some(TokenType::Custom { grammar: "early", name: "early" })
        );
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let chain = CompositeRecognizer::new(vec![
            Arc::new(TableRecognizer::new("first", 10).entry("x", "a")),
            Arc::new(TableRecognizer::new("second", 10).entry("x", "b")),
        ]);
        assert_eq!(
            chain.recognize(&raw("x")),
            Some(TokenType::Custom { grammar: "first", name: "a" })
        );
    }

    #[test]
    fn test_with_returns_new_snapshot() {
        let base = CompositeRecognizer::new(core_recognizers());
        let extended = base.with(Arc::new(EnumRecognizer::<TemplateToken>::new(TEMPLATE_PRIORITY)));
        assert_eq!(base.recognize(&raw("in")), Some(TokenType::IDENTIFIER));
        assert_eq!(extended.recognize(&raw("in")), Some(TemplateToken::In.into()));
        assert_eq!(extended.len(), base.len() + 1);
    }

    #[test]
    fn test_core_table() {
        let chain = CompositeRecognizer::new(core_recognizers());
        assert_eq!(chain.recognize(&raw("and")), Some(BasicToken::AndAnd.into()));
        assert_eq!(chain.recognize(&raw("&&")), Some(BasicToken::AndAnd.into()));
        assert_eq!(chain.recognize(&raw("'a'")), Some(BasicToken::String.into()));
        assert_eq!(chain.recognize(&raw("12")), Some(BasicToken::Number.into()));
        assert_eq!(chain.recognize(&raw("#")), None);
        let symbols = chain.symbols();
        assert!(symbols.contains(&"++".to_string()));
        assert!(!symbols.contains(&"and".to_string()));
    }

    #[test]
    fn test_fn_recognizer() {
        let r = FnRecognizer::new(5, |raw: &RawToken| {
            raw.text.starts_with('@').then_some(TokenType::Custom { grammar: "ann", name: "at" })
        });
        assert!(r.recognize(&raw("@")).is_some());
        assert!(r.recognize(&raw("a")).is_none());
    }
}
