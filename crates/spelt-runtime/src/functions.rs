//! Function registry with overload resolution, and the default library.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::trace;
use spelt_syntax::ast::Operation;
use spelt_syntax::error::{Error, Result};

use crate::context::Context;
use crate::operators::values_equal;
use crate::value::{TypeTag, Value};

pub type FunctionFn = dyn Fn(&[Value], &Context) -> Result<Value> + Send + Sync;

/// Declared parameter tags, with an optional tag for trailing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<TypeTag>,
    pub variadic: Option<TypeTag>,
}

impl Signature {
    pub fn new(params: impl Into<Vec<TypeTag>>) -> Self {
        Self {
            params: params.into(),
            variadic: None,
        }
    }

    pub fn variadic(params: impl Into<Vec<TypeTag>>, rest: TypeTag) -> Self {
        Self {
            params: params.into(),
            variadic: Some(rest),
        }
    }

    /// Any number of arguments, all accepted by `tag`.
    pub fn rest(tag: TypeTag) -> Self {
        Self {
            params: Vec::new(),
            variadic: Some(tag),
        }
    }

    /// Declared tag for the argument at `index`.
    pub fn tag_at(&self, index: usize) -> Option<TypeTag> {
        self.params.get(index).copied().or(self.variadic)
    }

    pub fn accepts(&self, args: &[Value]) -> bool {
        let arity_ok = match self.variadic {
            Some(_) => args.len() >= self.params.len(),
            None => args.len() == self.params.len(),
        };
        arity_ok
            && args
                .iter()
                .enumerate()
                .all(|(i, a)| self.tag_at(i).map_or(false, |t| t.accepts(a.tag())))
    }

    /// Sort key: fixed arity first, then the sum of tag ranks.
    pub fn specificity(&self) -> (bool, u32) {
        let rest = self.variadic.map_or(0, TypeTag::rank);
        (
            self.variadic.is_some(),
            self.params.iter().map(|t| t.rank()).sum::<u32>() + rest,
        )
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, t) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        if let Some(rest) = self.variadic {
            if !self.params.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{}...", rest)?;
        }
        write!(f, ")")
    }
}

/// One overload of a named function.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub signature: Signature,
    body: Arc<FunctionFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&[Value], &Context) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            body: Arc::new(body),
        }
    }

    pub fn invoke(&self, args: &[Value], ctx: &Context) -> Result<Value> {
        (self.body)(args, ctx)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}

/// Name to overload list, each list ordered most specific first.
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Vec<Function>>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the default library.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for f in default_functions() {
            registry.register(f);
        }
        registry
    }

    /// Adds an overload. Overloads of equal specificity keep registration
    /// order.
    pub fn register(&mut self, function: Function) {
        let overloads = self.functions.entry(function.name.clone()).or_default();
        overloads.push(function);
        overloads.sort_by_key(|f| f.signature.specificity());
    }

    pub fn overloads(&self, name: &str) -> &[Function] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut v: Vec<String> = self.functions.keys().cloned().collect();
        v.sort();
        v
    }

    /// First overload of `name` that softly accepts `args`.
    pub fn resolve(&self, name: &str, args: &[Value]) -> Result<&Function> {
        let overloads = self.overloads(name);
        if overloads.is_empty() {
            return Err(Error::function_not_found(format!("Unknown function '{}'", name)));
        }
        overloads
            .iter()
            .find(|f| f.signature.accepts(args))
            .ok_or_else(|| {
                let given: Vec<&str> = args.iter().map(|a| a.tag().name()).collect();
                let known: Vec<String> = overloads.iter().map(|f| f.signature.to_string()).collect();
                Error::function_not_found(format!(
                    "No overload of '{}' accepts ({}); candidates: {}",
                    name,
                    given.join(", "),
                    known.join(" ")
                ))
            })
    }

    /// Resolves an overload, converts the arguments to its widened tags and
    /// invokes it.
    pub fn call(&self, name: &str, args: &[Value], ctx: &Context) -> Result<Value> {
        let function = self.resolve(name, args)?;
        trace!("calling {:?} with {} args", function, args.len());
        let mut converted = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            match function.signature.tag_at(i) {
                Some(tag @ (TypeTag::Long | TypeTag::Double)) if arg.tag() != tag => {
                    converted.push(ctx.conversion().convert(arg, tag)?)
                }
                _ => converted.push(arg.clone()),
            }
        }
        function.invoke(&converted, ctx)
    }
}

fn bad_args(name: &str, args: &[Value]) -> Error {
    let given: Vec<&str> = args.iter().map(|a| a.tag().name()).collect();
    Error::function_not_found(format!("'{}' cannot take ({})", name, given.join(", ")))
}

fn string(args: &[Value], at: usize) -> &str {
    args.get(at).and_then(Value::as_str).unwrap_or("")
}

fn int(args: &[Value], at: usize) -> i64 {
    args.get(at).and_then(Value::as_long).unwrap_or(0)
}

fn double(args: &[Value], at: usize) -> f64 {
    args.get(at).and_then(Value::as_double).unwrap_or(0.0)
}

fn pick(name: &'static str, want_min: bool) -> impl Fn(&[Value], &Context) -> Result<Value> {
    move |args, ctx| {
        let mut best: Option<&Value> = None;
        for arg in args {
            best = match best {
                None => Some(arg),
                Some(current) => {
                    let less = ctx
                        .operators()
                        .resolve_binary(&Operation::Less, arg, current)?
                        .apply(arg, current)?;
                    match (less.as_bool(), want_min) {
                        (Some(true), true) | (Some(false), false) => Some(arg),
                        _ => Some(current),
                    }
                }
            };
        }
        best.cloned().ok_or_else(|| bad_args(name, args))
    }
}

fn convert_to(tag: TypeTag) -> impl Fn(&[Value], &Context) -> Result<Value> {
    move |args, ctx| match args.first() {
        Some(v) => ctx.conversion().convert(v, tag),
        None => Err(Error::conversion(format!("Nothing to convert to {}", tag))),
    }
}

fn char_index(s: &str, at: i64) -> usize {
    let count = s.chars().count();
    usize::try_from(at).unwrap_or(0).min(count)
}

/// Numeric, string, list, null-handling, conversion and map functions.
pub fn default_functions() -> Vec<Function> {
    use TypeTag::*;
    let mut fs = Vec::new();

    for (name, want_min) in [("min", true), ("max", false)] {
        fs.push(Function::new(name, Signature::new([Int, Int]), pick(name, want_min)));
        fs.push(Function::new(name, Signature::new([Long, Long]), pick(name, want_min)));
        fs.push(Function::new(name, Signature::new([Double, Double]), pick(name, want_min)));
        fs.push(Function::new(name, Signature::new([Str, Str]), pick(name, want_min)));
        fs.push(Function::new(name, Signature::variadic([Number], Number), pick(name, want_min)));
    }

    fs.push(Function::new("abs", Signature::new([Int]), |a, _| {
        Ok(Value::integer(int(a, 0).abs()))
    }));
    fs.push(Function::new("abs", Signature::new([Long]), |a, _| {
        int(a, 0)
            .checked_abs()
            .map(Value::Long)
            .ok_or_else(|| Error::arithmetic("Integer overflow in abs"))
    }));
    fs.push(Function::new("abs", Signature::new([Double]), |a, _| {
        Ok(Value::Double(double(a, 0).abs()))
    }));

    fs.push(Function::new("pow", Signature::new([Long, Long]), |a, _| {
        let (base, exp) = (int(a, 0), int(a, 1));
        match u32::try_from(exp) {
            Ok(e) => base
                .checked_pow(e)
                .map(Value::integer)
                .ok_or_else(|| Error::arithmetic(format!("Integer overflow in pow({}, {})", base, exp))),
            Err(_) => Ok(Value::Double((base as f64).powf(exp as f64))),
        }
    }));
    fs.push(Function::new("pow", Signature::new([Double, Double]), |a, _| {
        Ok(Value::Double(double(a, 0).powf(double(a, 1))))
    }));
    fs.push(Function::new("sqrt", Signature::new([Double]), |a, _| {
        Ok(Value::Double(double(a, 0).sqrt()))
    }));
    fs.push(Function::new("floor", Signature::new([Double]), |a, _| {
        Ok(Value::Double(double(a, 0).floor()))
    }));
    fs.push(Function::new("ceil", Signature::new([Double]), |a, _| {
        Ok(Value::Double(double(a, 0).ceil()))
    }));
    fs.push(Function::new("round", Signature::new([Double]), |a, _| {
        Ok(Value::Double(double(a, 0).round()))
    }));

    fs.push(Function::new("len", Signature::new([Str]), |a, _| {
        Ok(Value::integer(string(a, 0).chars().count() as i64))
    }));
    fs.push(Function::new("len", Signature::new([List]), |a, _| match &a[0] {
        Value::List(items) => Ok(Value::integer(items.len() as i64)),
        _ => Err(bad_args("len", a)),
    }));
    fs.push(Function::new("len", Signature::new([Map]), |a, _| match &a[0] {
        Value::Map(entries) => Ok(Value::integer(entries.len() as i64)),
        _ => Err(bad_args("len", a)),
    }));
    fs.push(Function::new("upper", Signature::new([Str]), |a, _| {
        Ok(Value::Str(string(a, 0).to_uppercase()))
    }));
    fs.push(Function::new("lower", Signature::new([Str]), |a, _| {
        Ok(Value::Str(string(a, 0).to_lowercase()))
    }));
    fs.push(Function::new("trim", Signature::new([Str]), |a, _| {
        Ok(Value::Str(string(a, 0).trim().to_string()))
    }));
    fs.push(Function::new("concat", Signature::rest(Any), |a, _| {
        Ok(Value::Str(a.iter().map(|v| v.to_string()).collect()))
    }));
    fs.push(Function::new("contains", Signature::new([Str, Str]), |a, _| {
        Ok(Value::Bool(string(a, 0).contains(string(a, 1))))
    }));
    fs.push(Function::new("contains", Signature::new([List, Any]), |a, _| match &a[0] {
        Value::List(items) => Ok(Value::Bool(items.iter().any(|it| values_equal(it, &a[1])))),
        _ => Err(bad_args("contains", a)),
    }));
    fs.push(Function::new("contains", Signature::new([Map, Str]), |a, _| match &a[0] {
        Value::Map(entries) => Ok(Value::Bool(entries.contains_key(string(a, 1)))),
        _ => Err(bad_args("contains", a)),
    }));
    fs.push(Function::new("startsWith", Signature::new([Str, Str]), |a, _| {
        Ok(Value::Bool(string(a, 0).starts_with(string(a, 1))))
    }));
    fs.push(Function::new("endsWith", Signature::new([Str, Str]), |a, _| {
        Ok(Value::Bool(string(a, 0).ends_with(string(a, 1))))
    }));
    fs.push(Function::new("substring", Signature::new([Str, Int]), |a, _| {
        let s = string(a, 0);
        Ok(Value::Str(s.chars().skip(char_index(s, int(a, 1))).collect()))
    }));
    fs.push(Function::new("substring", Signature::new([Str, Int, Int]), |a, _| {
        let s = string(a, 0);
        let start = char_index(s, int(a, 1));
        let end = char_index(s, int(a, 2)).max(start);
        Ok(Value::Str(s.chars().skip(start).take(end - start).collect()))
    }));
    fs.push(Function::new("replace", Signature::new([Str, Str, Str]), |a, _| {
        Ok(Value::Str(string(a, 0).replace(string(a, 1), string(a, 2))))
    }));
    fs.push(Function::new("split", Signature::new([Str, Str]), |a, _| {
        let (s, sep) = (string(a, 0), string(a, 1));
        let parts: Vec<Value> = if sep.is_empty() {
            s.chars().map(|c| Value::Str(c.to_string())).collect()
        } else {
            s.split(sep).map(Value::from).collect()
        };
        Ok(Value::List(parts))
    }));
    fs.push(Function::new("join", Signature::new([List, Str]), |a, _| match &a[0] {
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
            Ok(Value::Str(parts.join(string(a, 1))))
        }
        _ => Err(bad_args("join", a)),
    }));

    fs.push(Function::new("isNull", Signature::new([Any]), |a, _| {
        Ok(Value::Bool(a[0].is_null()))
    }));
    fs.push(Function::new("isEmpty", Signature::new([Any]), |a, _| {
        Ok(Value::Bool(match &a[0] {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            _ => false,
        }))
    }));
    fs.push(Function::new("coalesce", Signature::rest(Any), |a, _| {
        Ok(a.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null))
    }));

    fs.push(Function::new("str", Signature::new([Any]), |a, ctx| match &a[0] {
        v @ (Value::Null | Value::List(_) | Value::Map(_)) => Ok(Value::Str(v.to_string())),
        v => ctx.conversion().convert(v, Str),
    }));
    fs.push(Function::new("int", Signature::new([Any]), convert_to(Int)));
    fs.push(Function::new("long", Signature::new([Any]), convert_to(Long)));
    fs.push(Function::new("double", Signature::new([Any]), convert_to(Double)));
    fs.push(Function::new("bool", Signature::new([Any]), convert_to(Bool)));
    fs.push(Function::new("char", Signature::new([Any]), convert_to(Char)));

    fs.push(Function::new("keys", Signature::new([Map]), |a, _| match &a[0] {
        Value::Map(entries) => Ok(Value::List(entries.keys().map(|k| Value::from(k.as_str())).collect())),
        _ => Err(bad_args("keys", a)),
    }));
    fs.push(Function::new("values", Signature::new([Map]), |a, _| match &a[0] {
        Value::Map(entries) => Ok(Value::List(entries.values().cloned().collect())),
        _ => Err(bad_args("values", a)),
    }));

    fs
}
