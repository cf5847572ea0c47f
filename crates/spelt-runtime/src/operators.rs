//! Operator handlers and their resolution by operand type.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use spelt_syntax::ast::Operation;
use spelt_syntax::error::{Error, Result};

use crate::value::{TypeTag, Value};

pub type BinaryFn = dyn Fn(&Value, &Value) -> Result<Value> + Send + Sync;
pub type UnaryFn = dyn Fn(&Value) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub struct BinaryHandler {
    pub operation: Operation,
    pub left: TypeTag,
    pub right: TypeTag,
    calculator: Arc<BinaryFn>,
}

impl BinaryHandler {
    pub fn new<F>(operation: Operation, left: TypeTag, right: TypeTag, calculator: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            operation,
            left,
            right,
            calculator: Arc::new(calculator),
        }
    }

    pub fn accepts(&self, left: &Value, right: &Value) -> bool {
        self.left.accepts(left.tag()) && self.right.accepts(right.tag())
    }

    pub fn apply(&self, left: &Value, right: &Value) -> Result<Value> {
        (self.calculator)(left, right)
    }
}

impl fmt::Debug for BinaryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.operation, self.right)
    }
}

#[derive(Clone)]
pub struct UnaryHandler {
    pub operation: Operation,
    pub operand: TypeTag,
    calculator: Arc<UnaryFn>,
}

impl UnaryHandler {
    pub fn new<F>(operation: Operation, operand: TypeTag, calculator: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            operation,
            operand,
            calculator: Arc::new(calculator),
        }
    }

    pub fn accepts(&self, operand: &Value) -> bool {
        self.operand.accepts(operand.tag())
    }

    pub fn apply(&self, operand: &Value) -> Result<Value> {
        (self.calculator)(operand)
    }
}

impl fmt::Debug for UnaryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.operand)
    }
}

/// Per-operation handler lists, tried in registration order.
#[derive(Clone, Debug, Default)]
pub struct OperatorTable {
    binary: HashMap<Operation, Vec<BinaryHandler>>,
    unary: HashMap<Operation, Vec<UnaryHandler>>,
}

impl OperatorTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table with the default arithmetic, comparison and logical handlers.
    pub fn new() -> Self {
        let mut table = Self::empty();
        for h in default_binary_handlers() {
            table.register_binary(h);
        }
        for h in default_unary_handlers() {
            table.register_unary(h);
        }
        table
    }

    pub fn register_binary(&mut self, handler: BinaryHandler) {
        self.binary
            .entry(handler.operation.clone())
            .or_default()
            .push(handler);
    }

    pub fn register_unary(&mut self, handler: UnaryHandler) {
        self.unary
            .entry(handler.operation.clone())
            .or_default()
            .push(handler);
    }

    pub fn binary_handlers(&self, operation: &Operation) -> &[BinaryHandler] {
        self.binary.get(operation).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unary_handlers(&self, operation: &Operation) -> &[UnaryHandler] {
        self.unary.get(operation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First handler for `operation` accepting both operands. Null operands
    /// never resolve.
    pub fn resolve_binary(
        &self,
        operation: &Operation,
        left: &Value,
        right: &Value,
    ) -> Result<&BinaryHandler> {
        if left.is_null() || right.is_null() {
            return Err(Error::operator(format!(
                "Operator '{}' cannot be applied to null ({} {} {})",
                operation,
                left.tag(),
                operation,
                right.tag()
            )));
        }
        self.binary_handlers(operation)
            .iter()
            .find(|h| h.accepts(left, right))
            .ok_or_else(|| {
                Error::operator(format!(
                    "No operator '{}' for {} and {}",
                    operation,
                    left.tag(),
                    right.tag()
                ))
            })
    }

    pub fn resolve_unary(&self, operation: &Operation, operand: &Value) -> Result<&UnaryHandler> {
        self.unary_handlers(operation)
            .iter()
            .find(|h| h.accepts(operand))
            .ok_or_else(|| {
                Error::operator(format!("No operator '{}' for {}", operation, operand.tag()))
            })
    }
}

/// Numeric operands after widening to a common representation.
enum Pair {
    Int(i64, i64),
    Long(i64, i64),
    Double(f64, f64),
}

fn widen(a: &Value, b: &Value) -> Result<Pair> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Pair::Int(i64::from(*x), i64::from(*y))),
        (Value::Double(_), _) | (_, Value::Double(_)) => match (a.as_double(), b.as_double()) {
            (Some(x), Some(y)) => Ok(Pair::Double(x, y)),
            _ => Err(Error::operator(format!("Expected numbers, got {} and {}", a.tag(), b.tag()))),
        },
        _ => match (a.as_long(), b.as_long()) {
            (Some(x), Some(y)) => Ok(Pair::Long(x, y)),
            _ => Err(Error::operator(format!("Expected numbers, got {} and {}", a.tag(), b.tag()))),
        },
    }
}

fn arithmetic(operation: &Operation, a: &Value, b: &Value) -> Result<Value> {
    let (x, y, small) = match widen(a, b)? {
        Pair::Double(x, y) => {
            return Ok(Value::Double(match operation {
                Operation::Add => x + y,
                Operation::Subtract => x - y,
                Operation::Multiply => x * y,
                Operation::Divide => x / y,
                _ => x % y,
            }))
        }
        Pair::Int(x, y) => (x, y, true),
        Pair::Long(x, y) => (x, y, false),
    };
    if matches!(operation, Operation::Divide | Operation::Modulo) && y == 0 {
        return Err(Error::arithmetic(format!("Division by zero in {} {} {}", a, operation, b)));
    }
    let result = match operation {
        Operation::Add => x.checked_add(y),
        Operation::Subtract => x.checked_sub(y),
        Operation::Multiply => x.checked_mul(y),
        Operation::Divide => x.checked_div(y),
        _ => x.checked_rem(y),
    }
    .ok_or_else(|| Error::arithmetic(format!("Integer overflow in {} {} {}", a, operation, b)))?;
    Ok(if small { Value::integer(result) } else { Value::Long(result) })
}

/// Equality with numbers compared by value across widths.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y)
                    .all(|((kl, vl), (kr, vr))| kl == kr && values_equal(vl, vr))
        }
        _ if a.is_number() && b.is_number() => match widen(a, b) {
            Ok(Pair::Int(x, y)) | Ok(Pair::Long(x, y)) => x == y,
            Ok(Pair::Double(x, y)) => x == y,
            Err(_) => false,
        },
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Result<Option<Ordering>> {
    Ok(match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Char(x), Value::Char(y)) => Some(x.cmp(y)),
        _ => match widen(a, b)? {
            Pair::Int(x, y) | Pair::Long(x, y) => Some(x.cmp(&y)),
            Pair::Double(x, y) => x.partial_cmp(&y),
        },
    })
}

fn ordering(operation: Operation, left: TypeTag, right: TypeTag) -> BinaryHandler {
    let op = operation.clone();
    BinaryHandler::new(operation, left, right, move |a, b| {
        let found = compare(a, b)?;
        Ok(Value::Bool(match (&op, found) {
            (_, None) => false,
            (Operation::Less, Some(o)) => o == Ordering::Less,
            (Operation::LessEqual, Some(o)) => o != Ordering::Greater,
            (Operation::Greater, Some(o)) => o == Ordering::Greater,
            (_, Some(o)) => o != Ordering::Less,
        }))
    })
}

fn numeric(operation: Operation) -> BinaryHandler {
    let op = operation.clone();
    BinaryHandler::new(operation, TypeTag::Number, TypeTag::Number, move |a, b| {
        arithmetic(&op, a, b)
    })
}

fn logical(operation: Operation) -> BinaryHandler {
    let and = operation == Operation::And;
    BinaryHandler::new(operation, TypeTag::Bool, TypeTag::Bool, move |a, b| {
        match (a.as_bool(), b.as_bool()) {
            (Some(x), Some(y)) => Ok(Value::Bool(if and { x && y } else { x || y })),
            _ => Err(Error::operator("Logical operators expect booleans")),
        }
    })
}

fn concat(a: &Value, b: &Value) -> Result<Value> {
    Ok(Value::Str(format!("{}{}", a, b)))
}

pub fn default_binary_handlers() -> Vec<BinaryHandler> {
    use TypeTag::*;
    let mut handlers = vec![
        numeric(Operation::Add),
        BinaryHandler::new(Operation::Add, Str, Any, concat),
        BinaryHandler::new(Operation::Add, Any, Str, concat),
        BinaryHandler::new(Operation::Add, List, List, |a, b| match (a, b) {
            (Value::List(x), Value::List(y)) => {
                Ok(Value::List(x.iter().chain(y.iter()).cloned().collect()))
            }
            _ => Err(Error::operator("List concatenation expects lists")),
        }),
        numeric(Operation::Subtract),
        numeric(Operation::Multiply),
        numeric(Operation::Divide),
        numeric(Operation::Modulo),
        BinaryHandler::new(Operation::Equal, Any, Any, |a, b| {
            Ok(Value::Bool(values_equal(a, b)))
        }),
        BinaryHandler::new(Operation::NotEqual, Any, Any, |a, b| {
            Ok(Value::Bool(!values_equal(a, b)))
        }),
        logical(Operation::And),
        logical(Operation::Or),
    ];
    for op in [
        Operation::Less,
        Operation::LessEqual,
        Operation::Greater,
        Operation::GreaterEqual,
    ] {
        handlers.push(ordering(op.clone(), Number, Number));
        handlers.push(ordering(op.clone(), Str, Str));
        handlers.push(ordering(op, Char, Char));
    }
    handlers
}

fn step(operand: &Value, delta: i64) -> Result<Value> {
    match operand {
        Value::Double(d) => Ok(Value::Double(d + delta as f64)),
        other => other
            .as_long()
            .and_then(|n| n.checked_add(delta))
            .map(Value::Long)
            .ok_or_else(|| Error::conversion(format!("Cannot step {} '{}'", other.tag(), other))),
    }
}

pub fn default_unary_handlers() -> Vec<UnaryHandler> {
    use TypeTag::*;
    vec![
        UnaryHandler::new(Operation::Not, Bool, |v| match v {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(Error::operator(format!("Cannot negate {}", other.tag()))),
        }),
        UnaryHandler::new(Operation::Negate, Number, |v| match v {
            Value::Int(n) => Ok(Value::integer(-i64::from(*n))),
            Value::Long(n) => n
                .checked_neg()
                .map(Value::Long)
                .ok_or_else(|| Error::arithmetic("Integer overflow in negation")),
            Value::Double(d) => Ok(Value::Double(-d)),
            other => Err(Error::operator(format!("Cannot negate {}", other.tag()))),
        }),
        UnaryHandler::new(Operation::Plus, Number, |v| Ok(v.clone())),
        UnaryHandler::new(Operation::Increment, Number, |v| step(v, 1)),
        UnaryHandler::new(Operation::Decrement, Number, |v| step(v, -1)),
    ]
}
