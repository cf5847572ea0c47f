//! Spelt: a small, embeddable expression language.
//!
//! ```text
//! let engine = spelt::Engine::new();
//! let mut ctx = engine.context();
//! ctx.declare("x", spelt::Value::Int(5));
//! let value = engine.eval("x > 3 ? 'big' : 'small'", &mut ctx)?;
//! ```
//!
//! Grammar and runtime are extended through [`Extension`] bundles, imported
//! into an [`Engine`] or into a single layer with [`Import`].

pub mod config;
pub mod engine;
pub mod extension;
pub mod extensions;

use std::sync::OnceLock;

pub use config::EngineConfig;
pub use engine::{Engine, Expression};
pub use extension::{Extension, Import};

pub use spelt_lexer as lexer;
pub use spelt_parser as parser;
pub use spelt_runtime as runtime;
pub use spelt_syntax as syntax;

pub use spelt_lexer::{Lexer, Recognizer, TableRecognizer, TokenCursor};
pub use spelt_parser::{BinaryOperator, Construct, Parser, ParserRegistry, UnaryOperator};
pub use spelt_runtime::{
    BinaryHandler, Context, Converter, Evaluate, Function, PathKey, Runtime, Signature, TypeTag,
    UnaryHandler, Value,
};
pub use spelt_syntax::ast::{Node, Operation};
pub use spelt_syntax::error::{Error, ErrorKind, Result};
pub use spelt_syntax::token::{BasicToken, TemplateToken, Token, TokenType};

fn default_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::new)
}

/// Tokenizes `source` with the core grammar.
pub fn tokenize(source: &str) -> Result<TokenCursor> {
    default_engine().tokenize(source)
}

/// Parses `source` with the core grammar.
pub fn parse(source: &str) -> Result<Node> {
    default_engine().compile(source).map(|e| e.node().clone())
}

/// Evaluates `source` in a fresh context of the core runtime.
pub fn eval(source: &str) -> Result<Value> {
    let engine = default_engine();
    engine.eval(source, &mut engine.context())
}
