//! Runtime values and the type tags used to match them.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    Double(f64),
    Str(String),
    List(Vec<Value>),
    /// String-keyed record with deterministic key order
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Char(_) => TypeTag::Char,
            Value::Int(_) => TypeTag::Int,
            Value::Long(_) => TypeTag::Long,
            Value::Double(_) => TypeTag::Double,
            Value::Str(_) => TypeTag::Str,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Long(_) | Value::Double(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integral numbers widened to `i64`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Any number widened to `f64`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Integer result that is an `Int` when it fits and a `Long` otherwise.
    pub fn integer(n: i64) -> Value {
        match i32::try_from(n) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::Long(n),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Double(d) if d.fract() == 0.0 && d.is_finite() => write!(f, "{:.1}", d),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, it) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", it)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Declared type of an operand, parameter or conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Untyped; accepts everything including null
    Any,
    /// Accepts `Int`, `Long` and `Double`
    Number,
    Null,
    Bool,
    Char,
    Int,
    /// Accepts `Int` and `Long`
    Long,
    /// Accepts every number
    Double,
    Str,
    List,
    Map,
}

impl TypeTag {
    /// Soft match: does a value tagged `actual` fit this declared tag,
    /// possibly after widening?
    pub fn accepts(self, actual: TypeTag) -> bool {
        use TypeTag::*;
        match self {
            Any => true,
            Number => matches!(actual, Int | Long | Double),
            Long => matches!(actual, Int | Long),
            Double => matches!(actual, Int | Long | Double),
            other => other == actual,
        }
    }

    /// Distance used to order overloads; lower is more specific.
    pub fn rank(self) -> u32 {
        match self {
            TypeTag::Any => 4,
            TypeTag::Number => 3,
            TypeTag::Double => 2,
            TypeTag::Long => 1,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Any => "any",
            TypeTag::Number => "number",
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Char => "char",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Double => "double",
            TypeTag::Str => "string",
            TypeTag::List => "list",
            TypeTag::Map => "map",
        }
    }

    /// Parses a tag from its [`name`](TypeTag::name).
    pub fn from_name(name: &str) -> Option<TypeTag> {
        use TypeTag::*;
        [Any, Number, Null, Bool, Char, Int, Long, Double, Str, List, Map]
            .into_iter()
            .find(|t| t.name() == name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
