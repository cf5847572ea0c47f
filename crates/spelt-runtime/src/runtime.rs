//! Runtime configuration: operators, functions and conversions.

use std::sync::Arc;

use log::debug;
use spelt_syntax::ast::Node;
use spelt_syntax::error::Result;

use crate::context::Context;
use crate::conversion::{ConversionService, Converter};
use crate::evaluator::Evaluate;
use crate::functions::{Function, FunctionRegistry};
use crate::operators::{BinaryHandler, OperatorTable, UnaryHandler};
use crate::value::Value;

/// Shared, immutable registries that contexts evaluate against. Each
/// `with_*` call produces a new runtime; existing contexts keep the
/// registries they were created with.
#[derive(Clone, Debug)]
pub struct Runtime {
    operators: Arc<OperatorTable>,
    functions: Arc<FunctionRegistry>,
    conversion: Arc<ConversionService>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Runtime with the default operators, library and converters.
    pub fn new() -> Self {
        Self::from_parts(
            Arc::new(OperatorTable::new()),
            Arc::new(FunctionRegistry::new()),
            Arc::new(ConversionService::new()),
        )
    }

    /// Runtime with nothing registered.
    pub fn empty() -> Self {
        Self::from_parts(
            Arc::new(OperatorTable::empty()),
            Arc::new(FunctionRegistry::empty()),
            Arc::new(ConversionService::empty()),
        )
    }

    pub fn from_parts(
        operators: Arc<OperatorTable>,
        functions: Arc<FunctionRegistry>,
        conversion: Arc<ConversionService>,
    ) -> Self {
        Self {
            operators,
            functions,
            conversion,
        }
    }

    pub fn operators(&self) -> &Arc<OperatorTable> {
        &self.operators
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    pub fn conversion(&self) -> &Arc<ConversionService> {
        &self.conversion
    }

    pub fn with_binary_handler(&self, handler: BinaryHandler) -> Self {
        let mut operators = (*self.operators).clone();
        operators.register_binary(handler);
        Self {
            operators: Arc::new(operators),
            ..self.clone()
        }
    }

    pub fn with_unary_handler(&self, handler: UnaryHandler) -> Self {
        let mut operators = (*self.operators).clone();
        operators.register_unary(handler);
        Self {
            operators: Arc::new(operators),
            ..self.clone()
        }
    }

    pub fn with_function(&self, function: Function) -> Self {
        let mut functions = (*self.functions).clone();
        functions.register(function);
        Self {
            functions: Arc::new(functions),
            ..self.clone()
        }
    }

    pub fn with_converter(&self, converter: Converter) -> Self {
        Self {
            conversion: Arc::new(self.conversion.with_converter(converter)),
            ..self.clone()
        }
    }

    /// Fresh context over this runtime's registries.
    pub fn context(&self) -> Context {
        Context::new(self)
    }

    /// Evaluates `node` in a fresh context.
    pub fn evaluate(&self, node: &Node) -> Result<Value> {
        let mut ctx = self.context();
        let value = node.evaluate(&mut ctx)?;
        debug!("{} => {}", node, value);
        Ok(value)
    }
}
