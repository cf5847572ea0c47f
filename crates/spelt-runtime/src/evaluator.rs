//! Tree-walking evaluation of expression nodes.

use std::collections::BTreeMap;

use log::trace;
use spelt_syntax::ast::{Fix, Literal, Node, Operation, Segment};
use spelt_syntax::error::{Error, Result};

use crate::context::{Context, PathKey};
use crate::value::{TypeTag, Value};

/// Something that produces a value against a context.
pub trait Evaluate {
    fn evaluate(&self, ctx: &mut Context) -> Result<Value>;

    /// Evaluates and converts the result to `tag`.
    fn evaluate_as(&self, ctx: &mut Context, tag: TypeTag) -> Result<Value> {
        let value = self.evaluate(ctx)?;
        ctx.conversion().convert(&value, tag)
    }
}

impl Evaluate for Node {
    fn evaluate(&self, ctx: &mut Context) -> Result<Value> {
        match self {
            Node::Literal(lit) => Ok(literal(lit)),
            Node::Name { .. } | Node::Path(_) => {
                let path = path_keys(self, ctx)?;
                ctx.get_value(&path)
            }
            Node::Unary {
                operation,
                operand,
                fix,
            } => unary(operation, operand, *fix, ctx),
            Node::Binary {
                operation,
                left,
                right,
            } => {
                let l = left.evaluate(ctx)?;
                let r = right.evaluate(ctx)?;
                ctx.operators().resolve_binary(operation, &l, &r)?.apply(&l, &r)
            }
            Node::Ternary {
                condition,
                then,
                otherwise,
            } => match condition.evaluate(ctx)? {
                Value::Bool(true) => then.evaluate(ctx),
                Value::Bool(false) => otherwise.evaluate(ctx),
                other => Err(Error::conversion(format!(
                    "Condition must be bool, got {} '{}'",
                    other.tag(),
                    other
                ))),
            },
            Node::Call { name, arguments } => {
                let mut args = Vec::with_capacity(arguments.len());
                for a in arguments {
                    args.push(a.evaluate(ctx)?);
                }
                ctx.functions().call(name, &args, ctx)
            }
            Node::Arguments(items) => {
                let mut values = Vec::with_capacity(items.len());
                for it in items {
                    values.push(it.evaluate(ctx)?);
                }
                Ok(Value::List(values))
            }
            Node::Parameters(params) => {
                let mut entries = BTreeMap::new();
                for p in params {
                    let value = match &p.default {
                        Some(d) => d.evaluate(ctx)?,
                        None => Value::Null,
                    };
                    entries.insert(p.name.clone(), value);
                }
                Ok(Value::Map(entries))
            }
        }
    }
}

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::integer(*n),
        Literal::Long(n) => Value::Long(*n),
        Literal::Double(d) => Value::Double(*d),
        Literal::Char(c) => Value::Char(*c),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

/// Resolves a `Name` or `Path` node to access keys, evaluating index
/// expressions once.
pub fn path_keys(node: &Node, ctx: &mut Context) -> Result<Vec<PathKey>> {
    match node {
        Node::Name { name, .. } => Ok(name
            .split('.')
            .map(|part| PathKey::Property(part.to_string()))
            .collect()),
        Node::Path(segments) => {
            let mut keys = Vec::with_capacity(segments.len());
            for seg in segments {
                keys.push(match seg {
                    Segment::Property(p) => PathKey::Property(p.clone()),
                    Segment::Index(index) => match index.evaluate(ctx)? {
                        Value::Str(s) => PathKey::Property(s),
                        Value::Char(c) => PathKey::Property(c.to_string()),
                        other => match other.as_long() {
                            Some(n) => PathKey::Index(n),
                            None => {
                                return Err(Error::conversion(format!(
                                    "Index must be an integer or a string, got {}",
                                    other.tag()
                                )))
                            }
                        },
                    },
                });
            }
            Ok(keys)
        }
        other => Err(Error::unresolved(format!("'{}' is not a reference", other))),
    }
}

fn unary(operation: &Operation, operand: &Node, fix: Fix, ctx: &mut Context) -> Result<Value> {
    if !operation.is_step() {
        let value = operand.evaluate(ctx)?;
        return ctx.operators().resolve_unary(operation, &value)?.apply(&value);
    }

    let target = if operand.is_reference() {
        Some(path_keys(operand, ctx)?)
    } else {
        None
    };
    let original = match &target {
        Some(path) => ctx.get_value(path)?,
        None => operand.evaluate(ctx)?,
    };
    if fix == Fix::Postfix && target.is_none() {
        return Ok(original);
    }

    let stepped = match ctx.operators().resolve_unary(operation, &original) {
        Ok(handler) => handler.apply(&original)?,
        Err(_) => {
            return Err(Error::conversion(format!(
                "Cannot apply '{}' to {} '{}'",
                operation,
                original.tag(),
                original
            )))
        }
    };
    let updated = ctx
        .conversion()
        .convert(&stepped, original.tag())
        .map_err(|_| {
            Error::conversion(format!(
                "Result of '{}' ({}) does not fit {}",
                operation,
                stepped,
                original.tag()
            ))
        })?;

    if let Some(path) = &target {
        trace!("{} write-back {} -> {}", operation, original, updated);
        ctx.set_value(path, updated.clone())?;
    }
    Ok(match fix {
        Fix::Prefix => updated,
        Fix::Postfix => original,
    })
}
