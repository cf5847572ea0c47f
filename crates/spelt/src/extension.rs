//! Extension bundles and the [`Import`] trait.

use std::fmt;
use std::sync::Arc;

use spelt_lexer::{Lexer, Recognizer};
use spelt_parser::{BinaryOperator, Construct, Parser, ParserRegistry, UnaryOperator};
use spelt_runtime::{
    BinaryHandler, Context, Converter, Function, Runtime, Signature, UnaryHandler, Value,
};
use spelt_syntax::error::Result;

/// Named bundle of grammar and runtime additions.
///
/// Every part is optional. An extension does nothing on its own; it is
/// imported into a [`Lexer`], a [`ParserRegistry`], a [`Runtime`], a
/// [`Context`], or all of them at once through [`Engine::import`].
///
/// [`Engine::import`]: crate::Engine::import
#[derive(Clone, Default)]
pub struct Extension {
    name: String,
    recognizers: Vec<Arc<dyn Recognizer>>,
    binary_operators: Vec<BinaryOperator>,
    prefix_operators: Vec<UnaryOperator>,
    postfix_operators: Vec<UnaryOperator>,
    parsers: Vec<(Construct, Arc<dyn Parser>)>,
    binary_handlers: Vec<BinaryHandler>,
    unary_handlers: Vec<UnaryHandler>,
    functions: Vec<Function>,
    converters: Vec<Converter>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recognizer(self, recognizer: impl Recognizer + 'static) -> Self {
        self.shared_recognizer(Arc::new(recognizer))
    }

    pub fn shared_recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    pub fn binary_operator(mut self, operator: BinaryOperator) -> Self {
        self.binary_operators.push(operator);
        self
    }

    pub fn prefix_operator(mut self, operator: UnaryOperator) -> Self {
        self.prefix_operators.push(operator);
        self
    }

    pub fn postfix_operator(mut self, operator: UnaryOperator) -> Self {
        self.postfix_operators.push(operator);
        self
    }

    /// Registers (or replaces) the parser of `construct`.
    pub fn parser(self, construct: Construct, parser: impl Parser + 'static) -> Self {
        self.shared_parser(construct, Arc::new(parser))
    }

    pub fn shared_parser(mut self, construct: Construct, parser: Arc<dyn Parser>) -> Self {
        self.parsers.push((construct, parser));
        self
    }

    pub fn binary_handler(mut self, handler: BinaryHandler) -> Self {
        self.binary_handlers.push(handler);
        self
    }

    pub fn unary_handler(mut self, handler: UnaryHandler) -> Self {
        self.unary_handlers.push(handler);
        self
    }

    /// Adds an overload of `name`.
    pub fn function<F>(self, name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&[Value], &Context) -> Result<Value> + Send + Sync + 'static,
    {
        self.overload(Function::new(name, signature, body))
    }

    pub fn overload(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    pub fn converter(mut self, converter: Converter) -> Self {
        self.converters.push(converter);
        self
    }

    pub fn recognizers(&self) -> &[Arc<dyn Recognizer>] {
        &self.recognizers
    }

    pub fn binary_operators(&self) -> &[BinaryOperator] {
        &self.binary_operators
    }

    pub fn prefix_operators(&self) -> &[UnaryOperator] {
        &self.prefix_operators
    }

    pub fn postfix_operators(&self) -> &[UnaryOperator] {
        &self.postfix_operators
    }

    pub fn parsers(&self) -> &[(Construct, Arc<dyn Parser>)] {
        &self.parsers
    }

    pub fn binary_handlers(&self) -> &[BinaryHandler] {
        &self.binary_handlers
    }

    pub fn unary_handlers(&self) -> &[UnaryHandler] {
        &self.unary_handlers
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("recognizers", &self.recognizers.len())
            .field("binary_operators", &self.binary_operators.len())
            .field("prefix_operators", &self.prefix_operators.len())
            .field("postfix_operators", &self.postfix_operators.len())
            .field("parsers", &self.parsers.len())
            .field("binary_handlers", &self.binary_handlers.len())
            .field("unary_handlers", &self.unary_handlers.len())
            .field("functions", &self.functions)
            .field("converters", &self.converters)
            .finish()
    }
}

/// Something an [`Extension`] can be imported into. Importing never mutates
/// the receiver in place: it returns the extended value.
pub trait Import: Sized {
    fn import(self, extension: &Extension) -> Self;
}

impl Import for Lexer {
    fn import(self, extension: &Extension) -> Self {
        extension
            .recognizers
            .iter()
            .fold(self, |lexer, r| lexer.with_recognizer(r.clone()))
    }
}

impl Import for ParserRegistry {
    fn import(self, extension: &Extension) -> Self {
        let mut registry = self;
        for (construct, parser) in &extension.parsers {
            registry = registry.with_parser(*construct, parser.clone());
        }
        for op in &extension.binary_operators {
            registry = registry.with_binary_operator(op.clone());
        }
        for op in &extension.prefix_operators {
            registry = registry.with_prefix_operator(op.clone());
        }
        for op in &extension.postfix_operators {
            registry = registry.with_postfix_operator(op.clone());
        }
        registry
    }
}

impl Import for Runtime {
    fn import(self, extension: &Extension) -> Self {
        let mut runtime = self;
        for h in &extension.binary_handlers {
            runtime = runtime.with_binary_handler(h.clone());
        }
        for h in &extension.unary_handlers {
            runtime = runtime.with_unary_handler(h.clone());
        }
        for f in &extension.functions {
            runtime = runtime.with_function(f.clone());
        }
        for c in &extension.converters {
            runtime = runtime.with_converter(c.clone());
        }
        runtime
    }
}

/// Extends the registries of one context only; its variables are kept.
impl Import for Context {
    fn import(self, extension: &Extension) -> Self {
        let runtime = self.runtime().import(extension);
        self.with_runtime(&runtime)
    }
}
