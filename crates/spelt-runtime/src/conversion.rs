//! Type conversion between runtime values.

use std::fmt;
use std::sync::Arc;

use log::trace;
use spelt_syntax::error::{Error, Result};

use crate::value::{TypeTag, Value};

pub type ConvertFn = dyn Fn(&Value) -> Result<Value> + Send + Sync;

/// One conversion rule from values accepted by `source` to `target`.
#[derive(Clone)]
pub struct Converter {
    pub source: TypeTag,
    pub target: TypeTag,
    convert: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(source: TypeTag, target: TypeTag, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            source,
            target,
            convert: Arc::new(convert),
        }
    }

    pub fn apply(&self, value: &Value) -> Result<Value> {
        (self.convert)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Converter({} -> {})", self.source, self.target)
    }
}

/// Ordered list of converters. The first converter whose source tag accepts
/// the value and whose target is the requested tag is used.
#[derive(Clone, Debug, Default)]
pub struct ConversionService {
    converters: Arc<Vec<Converter>>,
}

impl ConversionService {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Service preloaded with the default converters.
    pub fn new() -> Self {
        let mut service = Self::empty();
        for c in default_converters() {
            service = service.with_converter(c);
        }
        service
    }

    pub fn with_converter(&self, converter: Converter) -> Self {
        let mut converters = (*self.converters).clone();
        converters.push(converter);
        Self {
            converters: Arc::new(converters),
        }
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Whether `convert(value, target)` would find a rule (identity included).
    pub fn can_convert(&self, from: TypeTag, target: TypeTag) -> bool {
        from == target
            || target == TypeTag::Any
            || (target == TypeTag::Number && target.accepts(from))
            || self
                .converters
                .iter()
                .any(|c| c.target == target && c.source.accepts(from))
    }

    pub fn convert(&self, value: &Value, target: TypeTag) -> Result<Value> {
        let from = value.tag();
        if from == target || target == TypeTag::Any {
            return Ok(value.clone());
        }
        if target == TypeTag::Number && value.is_number() {
            return Ok(value.clone());
        }
        match self
            .converters
            .iter()
            .find(|c| c.target == target && c.source.accepts(from))
        {
            Some(c) => {
                trace!("converting {} to {} with {:?}", from, target, c);
                c.apply(value)
            }
            None => Err(Error::conversion(format!(
                "Cannot convert {} '{}' to {}",
                from, value, target
            ))),
        }
    }
}

fn failed(value: &Value, target: TypeTag) -> Error {
    Error::conversion(format!("Cannot convert {} '{}' to {}", value.tag(), value, target))
}

fn narrow_int(value: &Value) -> Result<Value> {
    let wide = match value {
        Value::Long(n) => *n,
        Value::Double(d) if d.fract() == 0.0 && d.is_finite() => {
            if *d < i64::MIN as f64 || *d > i64::MAX as f64 {
                return Err(failed(value, TypeTag::Int));
            }
            *d as i64
        }
        _ => return Err(failed(value, TypeTag::Int)),
    };
    i32::try_from(wide)
        .map(Value::Int)
        .map_err(|_| failed(value, TypeTag::Int))
}

fn to_long(value: &Value) -> Result<Value> {
    match value {
        Value::Int(n) => Ok(Value::Long(i64::from(*n))),
        Value::Double(d) if d.fract() == 0.0 && *d >= i64::MIN as f64 && *d < i64::MAX as f64 => {
            Ok(Value::Long(*d as i64))
        }
        Value::Char(c) => Ok(Value::Long(i64::from(u32::from(*c)))),
        _ => Err(failed(value, TypeTag::Long)),
    }
}

fn parse_str(value: &Value, target: TypeTag) -> Result<Value> {
    let s = value.as_str().ok_or_else(|| failed(value, target))?.trim();
    let parsed = match target {
        TypeTag::Bool => match s {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        TypeTag::Char => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }
        TypeTag::Int => s.parse::<i32>().ok().map(Value::Int),
        TypeTag::Long => s
            .strip_suffix(['L', 'l'])
            .unwrap_or(s)
            .parse::<i64>()
            .ok()
            .map(Value::Long),
        TypeTag::Double => s.parse::<f64>().ok().map(Value::Double),
        TypeTag::Number => s
            .parse::<i64>()
            .map(Value::integer)
            .or_else(|_| s.parse::<f64>().map(Value::Double))
            .ok(),
        _ => None,
    };
    parsed.ok_or_else(|| failed(value, target))
}

/// Bool/char/number to string and back, integer widening and checked
/// narrowing, char to code point.
pub fn default_converters() -> Vec<Converter> {
    use TypeTag::*;
    vec![
        Converter::new(Bool, Str, |v| Ok(Value::Str(v.to_string()))),
        Converter::new(Char, Str, |v| Ok(Value::Str(v.to_string()))),
        Converter::new(Number, Str, |v| Ok(Value::Str(v.to_string()))),
        Converter::new(Str, Bool, |v| parse_str(v, Bool)),
        Converter::new(Str, Char, |v| parse_str(v, Char)),
        Converter::new(Str, Int, |v| parse_str(v, Int)),
        Converter::new(Str, Long, |v| parse_str(v, Long)),
        Converter::new(Str, Double, |v| parse_str(v, Double)),
        Converter::new(Str, Number, |v| parse_str(v, Number)),
        Converter::new(Number, Long, to_long),
        Converter::new(Number, Double, |v| {
            v.as_double()
                .map(Value::Double)
                .ok_or_else(|| failed(v, Double))
        }),
        Converter::new(Number, Int, narrow_int),
        Converter::new(Char, Int, |v| match v {
            Value::Char(c) => i32::try_from(u32::from(*c))
                .map(Value::Int)
                .map_err(|_| failed(v, Int)),
            _ => Err(failed(v, Int)),
        }),
        Converter::new(Char, Long, to_long),
    ]
}
