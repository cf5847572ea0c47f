//! Spelt lexer: converts source text into a token cursor.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use spelt_syntax::error::{Error, Result};
use spelt_syntax::token::{BasicToken, RawToken, Span, Token, TokenType};

use crate::cursor::TokenCursor;
use crate::recognizer::{core_recognizers, CompositeRecognizer, Recognizer};
use crate::splitter::{DefaultSplitter, Splitter};

/// Splits source text with a [`Splitter`] and classifies every fragment with a
/// priority-ordered recognizer chain.
///
/// A lexer is an immutable configuration: `tokenize` takes `&self`, and the
/// `with_*` methods return new lexers. Each call to `tokenize` produces an
/// independent cursor.
#[derive(Clone)]
pub struct Lexer {
    splitter: Arc<dyn Splitter>,
    recognizer: CompositeRecognizer,
    symbols: Arc<[String]>,
    default_kind: Option<TokenType>,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    /// Lexer for the core grammar.
    pub fn new() -> Self {
        Self::builder().recognizers(core_recognizers()).build()
    }

    /// Empty configuration: no recognizers, [`DefaultSplitter`], and
    /// [`BasicToken::Raw`] as the default kind.
    pub fn builder() -> LexerBuilder {
        LexerBuilder::default()
    }

    /// A new lexer with one more recognizer in the chain.
    pub fn with_recognizer(&self, recognizer: Arc<dyn Recognizer>) -> Self {
        Self::assemble(
            self.splitter.clone(),
            self.recognizer.with(recognizer),
            self.default_kind,
        )
    }

    pub fn recognizer(&self) -> &CompositeRecognizer {
        &self.recognizer
    }

    fn assemble(
        splitter: Arc<dyn Splitter>,
        recognizer: CompositeRecognizer,
        default_kind: Option<TokenType>,
    ) -> Self {
        let mut symbols = recognizer.symbols();
        symbols.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        Self {
            splitter,
            recognizer,
            symbols: symbols.into(),
            default_kind,
        }
    }

    /// Classifies one fragment, falling back to the default kind.
    pub fn classify(&self, raw: &RawToken) -> Result<TokenType> {
        match self.recognizer.recognize(raw) {
            Some(kind) => Ok(kind),
            None => match self.default_kind {
                Some(kind) => {
                    trace!("fragment {:?} fell back to {}", raw.text, kind);
                    Ok(kind)
                }
                None => Err(Error::lexical(
                    format!("Unrecognized input '{}'", raw.text),
                    raw.span.line,
                    raw.span.col,
                )),
            },
        }
    }

    /// Tokenize the entire input into a cursor whose last token is `Eof`.
    pub fn tokenize(&self, source: &str) -> Result<TokenCursor> {
        let raws = self.splitter.split(source, &self.symbols)?;
        let mut tokens = Vec::with_capacity(raws.len() + 1);
        for raw in raws {
            let kind = self.classify(&raw)?;
            tokens.push(Token {
                kind,
                text: raw.text,
                span: raw.span,
            });
        }
        let (line, col) = end_position(source);
        tokens.push(Token::new(
            BasicToken::Eof,
            "",
            Span::new(source.len(), source.len(), line, col),
        ));
        debug!("tokenized {} tokens from {} bytes", tokens.len(), source.len());
        Ok(TokenCursor::new(tokens))
    }
}

impl fmt::Debug for Lexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("recognizer", &self.recognizer)
            .field("symbols", &self.symbols.len())
            .field("default_kind", &self.default_kind)
            .finish()
    }
}

fn end_position(source: &str) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for c in source.chars() {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Step-by-step lexer configuration.
pub struct LexerBuilder {
    splitter: Arc<dyn Splitter>,
    recognizers: Vec<Arc<dyn Recognizer>>,
    default_kind: Option<TokenType>,
}

impl Default for LexerBuilder {
    fn default() -> Self {
        Self {
            splitter: Arc::new(DefaultSplitter),
            recognizers: Vec::new(),
            default_kind: Some(BasicToken::Raw.into()),
        }
    }
}

impl LexerBuilder {
    pub fn splitter(mut self, splitter: Arc<dyn Splitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    pub fn recognizers(mut self, recognizers: Vec<Arc<dyn Recognizer>>) -> Self {
        self.recognizers.extend(recognizers);
        self
    }

    /// Kind given to fragments no recognizer claims.
    pub fn default_kind(mut self, kind: impl Into<TokenType>) -> Self {
        self.default_kind = Some(kind.into());
        self
    }

    /// Unclaimed fragments become lexical errors.
    pub fn no_default(mut self) -> Self {
        self.default_kind = None;
        self
    }

    pub fn build(self) -> Lexer {
        Lexer::assemble(
            self.splitter,
            CompositeRecognizer::new(self.recognizers),
            self.default_kind,
        )
    }
}
