//! AST (abstract syntax tree) types for Spelt expressions.
//!
//! The tree is a closed sum type built bottom-up by the parser. Nodes own their
//! children, hold no interior mutability and are therefore `Send + Sync`: a
//! parsed expression can be evaluated any number of times, from any thread,
//! against independent contexts.

use std::fmt;

/// Literal values written directly in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    /// Integer literal without suffix. The runtime narrows it to a 32-bit
    /// integer when it fits.
    Int(i64),
    /// Integer literal with an `L` suffix
    Long(i64),
    Double(f64),
    /// Single character; only produced by extensions, the core grammar has
    /// no character literal syntax
    Char(char),
    Str(String),
}

/// Operation performed by a unary or binary node.
///
/// Core operations have dedicated variants; extensions name theirs with
/// [`Operation::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Not,
    Negate,
    Plus,
    Increment,
    Decrement,
    Custom(String),
}

impl Operation {
    pub fn custom(name: impl Into<String>) -> Self {
        Operation::Custom(name.into())
    }

    /// Canonical source symbol.
    pub fn symbol(&self) -> &str {
        match self {
            Operation::Add | Operation::Plus => "+",
            Operation::Subtract | Operation::Negate => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Modulo => "%",
            Operation::Equal => "==",
            Operation::NotEqual => "!=",
            Operation::Less => "<",
            Operation::LessEqual => "<=",
            Operation::Greater => ">",
            Operation::GreaterEqual => ">=",
            Operation::And => "&&",
            Operation::Or => "||",
            Operation::Not => "!",
            Operation::Increment => "++",
            Operation::Decrement => "--",
            Operation::Custom(name) => name,
        }
    }

    /// Increment and decrement are the only operations with a write-back.
    pub fn is_step(&self) -> bool {
        matches!(self, Operation::Increment | Operation::Decrement)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Position of a unary operator relative to its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    Prefix,
    Postfix,
}

/// One step of a property path after the root name.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `.name` (also used for the root name)
    Property(String),
    /// `[expression]`
    Index(Node),
}

/// Declared parameter: `name` or `name: default`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Node>,
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Literal),
    /// Single identifier, optionally aliased (`user as u`)
    Name { name: String, alias: Option<String> },
    /// Root name followed by property and index segments (`a.b[0].c`)
    Path(Vec<Segment>),
    Unary {
        operation: Operation,
        operand: Box<Node>,
        fix: Fix,
    },
    Binary {
        operation: Operation,
        left: Box<Node>,
        right: Box<Node>,
    },
    Ternary {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Call { name: String, arguments: Vec<Node> },
    Arguments(Vec<Node>),
    Parameters(Vec<Parameter>),
}

impl Node {
    pub fn literal(lit: Literal) -> Self {
        Node::Literal(lit)
    }

    pub fn name(name: impl Into<String>) -> Self {
        Node::Name {
            name: name.into(),
            alias: None,
        }
    }

    pub fn unary(operation: Operation, operand: Node, fix: Fix) -> Self {
        Node::Unary {
            operation,
            operand: Box::new(operand),
            fix,
        }
    }

    pub fn binary(operation: Operation, left: Node, right: Node) -> Self {
        Node::Binary {
            operation,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn ternary(condition: Node, then: Node, otherwise: Node) -> Self {
        Node::Ternary {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// `true` for nodes that denote a storage location (`Name` and `Path`).
    pub fn is_reference(&self) -> bool {
        matches!(self, Node::Name { .. } | Node::Path(_))
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, it) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", it)?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Long(n) => write!(f, "{}L", n),
            Literal::Double(d) if d.fract() == 0.0 && d.is_finite() => write!(f, "{:.1}", d),
            Literal::Double(d) => write!(f, "{}", d),
            Literal::Char(c) => write!(f, "char('{}')", c),
            Literal::Str(s) => {
                write!(f, "'")?;
                for c in s.chars() {
                    match c {
                        '\'' => write!(f, "\\'")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "'")
            }
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(d) => write!(f, "{}: {}", self.name, d),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Renders the canonical source form. Binary and ternary nodes are fully
/// parenthesized so the rendered text shows the tree shape.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(lit) => write!(f, "{}", lit),
            Node::Name { name, alias: Some(a) } => write!(f, "{} as {}", name, a),
            Node::Name { name, alias: None } => write!(f, "{}", name),
            Node::Path(segments) => {
                for (i, seg) in segments.iter().enumerate() {
                    match seg {
                        Segment::Property(p) if i == 0 => write!(f, "{}", p)?,
                        Segment::Property(p) => write!(f, ".{}", p)?,
                        Segment::Index(n) => write!(f, "[{}]", n)?,
                    }
                }
                Ok(())
            }
            Node::Unary {
                operation,
                operand,
                fix: Fix::Prefix,
            } => match operand.as_ref() {
                // `- -x` must not print as `--x`
                Node::Unary {
                    fix: Fix::Prefix, ..
                } => write!(f, "{}({})", operation, operand),
                _ => write!(f, "{}{}", operation, operand),
            },
            Node::Unary {
                operation,
                operand,
                fix: Fix::Postfix,
            } => write!(f, "{}{}", operand, operation),
            Node::Binary {
                operation,
                left,
                right,
            } => write!(f, "({} {} {})", left, operation, right),
            Node::Ternary {
                condition,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", condition, then, otherwise),
            Node::Call { name, arguments } => {
                write!(f, "{}(", name)?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            Node::Arguments(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Node::Parameters(params) => {
                write!(f, "(")?;
                write_list(f, params)?;
                write!(f, ")")
            }
        }
    }
}
