//! The embedding entry point.

use std::fmt;

use log::{debug, info};
use spelt_lexer::{Lexer, TokenCursor};
use spelt_parser::ParserRegistry;
use spelt_runtime::{Context, Evaluate, Runtime, TypeTag, Value};
use spelt_syntax::ast::Node;
use spelt_syntax::error::Result;

use crate::config::EngineConfig;
use crate::extension::{Extension, Import};
use crate::extensions;

/// Lexer, parser registry and runtime kept in step.
///
/// Engines are cheap to clone and immutable; [`import`](Engine::import)
/// returns a new engine.
#[derive(Clone, Debug)]
pub struct Engine {
    lexer: Lexer,
    registry: ParserRegistry,
    runtime: Runtime,
    strict: bool,
    extensions: Vec<String>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the core extension.
    pub fn new() -> Self {
        Self::bare().import(&extensions::core())
    }

    /// Engine with nothing imported: every fragment lexes as raw text and no
    /// construct has a parser.
    pub fn bare() -> Self {
        Self {
            lexer: Lexer::builder().build(),
            registry: ParserRegistry::empty(),
            runtime: Runtime::empty(),
            strict: false,
            extensions: Vec::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut engine = Self::new().with_strict(config.strict);
        if config.template {
            engine = engine.import(&extensions::template());
        }
        info!("engine ready: {:?}", engine.extensions);
        engine
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Adds `extension` to every layer.
    pub fn import(self, extension: &Extension) -> Self {
        debug!("importing extension '{}'", extension.name());
        let mut extensions = self.extensions;
        extensions.push(extension.name().to_string());
        Self {
            lexer: self.lexer.import(extension),
            registry: self.registry.import(extension),
            runtime: self.runtime.import(extension),
            strict: self.strict,
            extensions,
        }
    }

    /// Names of the imported extensions, in import order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn tokenize(&self, source: &str) -> Result<TokenCursor> {
        self.lexer.tokenize(source)
    }

    pub fn parse(&self, cursor: &mut TokenCursor) -> Result<Node> {
        spelt_parser::parse(cursor, &self.registry)
    }

    pub fn compile(&self, source: &str) -> Result<Expression> {
        let mut cursor = self.tokenize(source)?;
        let node = self.parse(&mut cursor)?;
        Ok(Expression {
            source: source.to_string(),
            node,
        })
    }

    /// Fresh context over this engine's runtime.
    pub fn context(&self) -> Context {
        self.runtime.context().with_strict(self.strict)
    }

    /// Compiles and evaluates `source` in `ctx`.
    pub fn eval(&self, source: &str, ctx: &mut Context) -> Result<Value> {
        self.compile(source)?.evaluate(ctx)
    }
}

/// A parsed expression with its source text. Immutable and shareable across
/// threads; each evaluation brings its own context.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    node: Node,
}

impl Expression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn evaluate(&self, ctx: &mut Context) -> Result<Value> {
        self.node.evaluate(ctx)
    }

    /// Evaluates and converts the result to `tag`.
    pub fn evaluate_as(&self, ctx: &mut Context, tag: TypeTag) -> Result<Value> {
        self.node.evaluate_as(ctx, tag)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
