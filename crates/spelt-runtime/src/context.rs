//! Evaluation context: scoped variables plus handles to the active runtime.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use log::trace;
use spelt_syntax::error::{Error, Result};

use crate::conversion::ConversionService;
use crate::functions::FunctionRegistry;
use crate::operators::OperatorTable;
use crate::runtime::Runtime;
use crate::value::Value;

/// One step of a resolved access path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    Property(String),
    Index(i64),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Property(p) => write!(f, ".{}", p),
            PathKey::Index(i) => write!(f, "[{}]", i),
        }
    }
}

fn describe(path: &[PathKey]) -> String {
    let mut out = String::new();
    for (i, key) in path.iter().enumerate() {
        match key {
            PathKey::Property(p) if i == 0 => out.push_str(p),
            other => out.push_str(&other.to_string()),
        }
    }
    out
}

/// Variables of one evaluation, in a stack of frames. Frame 0 is the global
/// frame and is never popped.
///
/// A context is mutable and belongs to one evaluation (or one request); the
/// runtime registries it points at are shared snapshots.
#[derive(Clone)]
pub struct Context {
    frames: Vec<HashMap<String, Value>>,
    operators: Arc<OperatorTable>,
    functions: Arc<FunctionRegistry>,
    conversion: Arc<ConversionService>,
    strict: bool,
}

impl Context {
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            frames: vec![HashMap::new()],
            operators: runtime.operators().clone(),
            functions: runtime.functions().clone(),
            conversion: runtime.conversion().clone(),
            strict: false,
        }
    }

    /// In strict mode reading an absent name or property is an error
    /// instead of `null`.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Swaps in the registries of `runtime`, keeping the variables.
    pub fn with_runtime(mut self, runtime: &Runtime) -> Self {
        self.operators = runtime.operators().clone();
        self.functions = runtime.functions().clone();
        self.conversion = runtime.conversion().clone();
        self
    }

    /// The registries this context evaluates with.
    pub fn runtime(&self) -> Runtime {
        Runtime::from_parts(
            self.operators.clone(),
            self.functions.clone(),
            self.conversion.clone(),
        )
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn conversion(&self) -> &ConversionService {
        &self.conversion
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Drops the innermost frame. The global frame stays.
    pub fn pop_scope(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
            true
        } else {
            false
        }
    }

    /// Runs `f` inside a fresh frame that is dropped afterwards.
    pub fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_scope();
        let result = f(self);
        self.pop_scope();
        result
    }

    /// Binds `name` in the innermost frame, shadowing outer bindings.
    pub fn declare(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Removes every variable and nested frame.
    pub fn clear(&mut self) {
        self.frames.truncate(1);
        if let Some(global) = self.frames.first_mut() {
            global.clear();
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    fn missing(&self, path: &[PathKey]) -> Result<Value> {
        if self.strict {
            Err(Error::unresolved(format!("Cannot resolve '{}'", describe(path))))
        } else {
            trace!("'{}' is absent, reading null", describe(path));
            Ok(Value::Null)
        }
    }

    /// Reads `path`, innermost frame first. Absent names, properties and
    /// out-of-range indexes read as `null` unless the context is strict.
    pub fn get_value(&self, path: &[PathKey]) -> Result<Value> {
        let root = match path.first() {
            Some(PathKey::Property(name)) => name,
            Some(PathKey::Index(_)) => {
                return Err(Error::unresolved(format!(
                    "Path '{}' must start with a name",
                    describe(path)
                )))
            }
            None => return Err(Error::unresolved("Empty path")),
        };
        let mut current = match self.lookup(root) {
            Some(v) => v,
            None => return self.missing(path),
        };
        for (step, key) in path.iter().enumerate().skip(1) {
            let next = match (current, key) {
                (Value::Map(entries), PathKey::Property(p)) => entries.get(p),
                (Value::Map(entries), PathKey::Index(i)) => entries.get(&i.to_string()),
                (Value::List(items), PathKey::Index(i)) => index(items.len(), *i).map(|at| &items[at]),
                (Value::Str(s), PathKey::Index(i)) => {
                    let count = s.chars().count();
                    return match index(count, *i).and_then(|at| s.chars().nth(at)) {
                        Some(c) if step + 1 == path.len() => Ok(Value::Char(c)),
                        _ => self.missing(path),
                    };
                }
                _ => None,
            };
            current = match next {
                Some(v) => v,
                None => return self.missing(path),
            };
        }
        Ok(current.clone())
    }

    pub fn get_variable(&self, name: &str) -> Result<Value> {
        self.get_value(&[PathKey::Property(name.to_string())])
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Writes `value` at `path`.
    ///
    /// The root name is written in the innermost frame that declares it, or
    /// in the global frame when none does. Nested writes need the containers
    /// on the way to exist.
    pub fn set_value(&mut self, path: &[PathKey], value: Value) -> Result<()> {
        let root = match path.first() {
            Some(PathKey::Property(name)) => name.clone(),
            _ => {
                return Err(Error::unresolved(format!(
                    "Cannot assign to '{}'",
                    describe(path)
                )))
            }
        };
        let at = self
            .frames
            .iter()
            .rposition(|frame| frame.contains_key(&root))
            .unwrap_or(0);
        trace!("writing '{}' in frame {}", describe(path), at);
        let frame = &mut self.frames[at];
        if path.len() == 1 {
            frame.insert(root, value);
            return Ok(());
        }
        let unresolved = || Error::unresolved(format!("Cannot assign to '{}'", describe(path)));
        let mut current = frame.get_mut(&root).ok_or_else(unresolved)?;
        let (last, between) = match path[1..].split_last() {
            Some(parts) => parts,
            None => return Err(unresolved()),
        };
        for key in between {
            current = match (current, key) {
                (Value::Map(entries), PathKey::Property(p)) => entries.get_mut(p),
                (Value::List(items), PathKey::Index(i)) => {
                    let len = items.len();
                    index(len, *i).and_then(move |at| items.get_mut(at))
                }
                _ => None,
            }
            .ok_or_else(unresolved)?;
        }
        match (current, last) {
            (Value::Map(entries), PathKey::Property(p)) => {
                entries.insert(p.clone(), value);
                Ok(())
            }
            (Value::List(items), PathKey::Index(i)) => {
                let at = index(items.len(), *i).ok_or_else(unresolved)?;
                items[at] = value;
                Ok(())
            }
            _ => Err(unresolved()),
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        self.set_value(&[PathKey::Property(name.into())], value)
    }

    /// Flattened snapshot of visible variables; inner frames shadow outer.
    pub fn variables(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        for frame in &self.frames {
            for (k, v) in frame {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }
}

fn index(len: usize, i: i64) -> Option<usize> {
    usize::try_from(i).ok().filter(|at| *at < len)
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("frames", &self.frames.len())
            .field("strict", &self.strict)
            .field("variables", &self.variables())
            .finish()
    }
}
