//! Parser registry: construct parsers and operator tables.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use spelt_lexer::TokenCursor;
use spelt_syntax::ast::{Node, Operation};
use spelt_syntax::error::{Error, ErrorKind, Result};
use spelt_syntax::token::{BasicToken, TokenType};

use crate::parser::{
    ArgumentsParser, BinaryParser, ExpressionParser, NamesParser, ParametersParser, Parser,
    PathParser, PrimaryParser, TernaryParser, UnaryParser,
};

/// Grammar constructs a registry can hand out parsers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    Expression,
    Ternary,
    Binary,
    Unary,
    Primary,
    Path,
    Arguments,
    Parameters,
    Names,
    /// Constructs contributed by extensions (e.g. annotations)
    Custom(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// Binary operator descriptor: which token spells it, what it computes and
/// how tightly it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperator {
    pub token: TokenType,
    pub operation: Operation,
    pub precedence: u8,
    pub associativity: Associativity,
}

impl BinaryOperator {
    pub fn left(token: impl Into<TokenType>, operation: Operation, precedence: u8) -> Self {
        Self {
            token: token.into(),
            operation,
            precedence,
            associativity: Associativity::Left,
        }
    }

    pub fn right(token: impl Into<TokenType>, operation: Operation, precedence: u8) -> Self {
        Self {
            token: token.into(),
            operation,
            precedence,
            associativity: Associativity::Right,
        }
    }
}

/// Prefix or postfix operator descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperator {
    pub token: TokenType,
    pub operation: Operation,
}

impl UnaryOperator {
    pub fn new(token: impl Into<TokenType>, operation: Operation) -> Self {
        Self {
            token: token.into(),
            operation,
        }
    }
}

/// Maps grammar constructs to parsers and holds the operator tables.
///
/// A registry is an immutable snapshot. Every `with_*` method returns a new
/// registry and leaves the receiver as it was, so one registry can serve any
/// number of concurrent parses.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: Arc<HashMap<Construct, Arc<dyn Parser>>>,
    binary: Arc<Vec<BinaryOperator>>,
    prefix: Arc<Vec<UnaryOperator>>,
    postfix: Arc<Vec<UnaryOperator>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Registry with no parsers and no operators.
    pub fn empty() -> Self {
        Self {
            parsers: Arc::new(HashMap::new()),
            binary: Arc::new(Vec::new()),
            prefix: Arc::new(Vec::new()),
            postfix: Arc::new(Vec::new()),
        }
    }

    /// Registry for the core grammar.
    pub fn new() -> Self {
        use BasicToken::*;

        let mut parsers: HashMap<Construct, Arc<dyn Parser>> = HashMap::new();
        parsers.insert(Construct::Expression, Arc::new(ExpressionParser));
        parsers.insert(Construct::Ternary, Arc::new(TernaryParser));
        parsers.insert(Construct::Binary, Arc::new(BinaryParser));
        parsers.insert(Construct::Unary, Arc::new(UnaryParser));
        parsers.insert(Construct::Primary, Arc::new(PrimaryParser));
        parsers.insert(Construct::Path, Arc::new(PathParser));
        parsers.insert(Construct::Arguments, Arc::new(ArgumentsParser));
        parsers.insert(Construct::Parameters, Arc::new(ParametersParser));
        parsers.insert(Construct::Names, Arc::new(NamesParser));

        let binary = vec![
            BinaryOperator::left(OrOr, Operation::Or, 1),
            BinaryOperator::left(AndAnd, Operation::And, 2),
            BinaryOperator::left(EqEq, Operation::Equal, 3),
            BinaryOperator::left(NotEq, Operation::NotEqual, 3),
            BinaryOperator::left(Less, Operation::Less, 4),
            BinaryOperator::left(LessEq, Operation::LessEqual, 4),
            BinaryOperator::left(Greater, Operation::Greater, 4),
            BinaryOperator::left(GreaterEq, Operation::GreaterEqual, 4),
            BinaryOperator::left(Plus, Operation::Add, 5),
            BinaryOperator::left(Minus, Operation::Subtract, 5),
            BinaryOperator::left(Star, Operation::Multiply, 6),
            BinaryOperator::left(Slash, Operation::Divide, 6),
            BinaryOperator::left(Percent, Operation::Modulo, 6),
        ];
        let prefix = vec![
            UnaryOperator::new(Plus, Operation::Plus),
            UnaryOperator::new(Minus, Operation::Negate),
            UnaryOperator::new(Bang, Operation::Not),
            UnaryOperator::new(Increment, Operation::Increment),
            UnaryOperator::new(Decrement, Operation::Decrement),
        ];
        let postfix = vec![
            UnaryOperator::new(Increment, Operation::Increment),
            UnaryOperator::new(Decrement, Operation::Decrement),
        ];

        Self {
            parsers: Arc::new(parsers),
            binary: Arc::new(binary),
            prefix: Arc::new(prefix),
            postfix: Arc::new(postfix),
        }
    }

    pub fn get_parser(&self, construct: Construct) -> Option<Arc<dyn Parser>> {
        self.parsers.get(&construct).cloned()
    }

    /// Parses `construct` at the cursor position.
    pub fn parse(&self, construct: Construct, cursor: &mut TokenCursor) -> Result<Node> {
        match self.parsers.get(&construct) {
            Some(parser) => parser.parse(cursor, self),
            None => {
                let at = cursor.current();
                Err(Error::with_span(
                    ErrorKind::Syntax,
                    format!("No parser registered for {:?}", construct),
                    at.span.line,
                    at.span.col,
                ))
            }
        }
    }

    /// First registered binary operator spelled by `kind`.
    pub fn binary_operator(&self, kind: TokenType) -> Option<&BinaryOperator> {
        self.binary.iter().find(|op| op.token == kind)
    }

    pub fn prefix_operator(&self, kind: TokenType) -> Option<&UnaryOperator> {
        self.prefix.iter().find(|op| op.token == kind)
    }

    pub fn postfix_operator(&self, kind: TokenType) -> Option<&UnaryOperator> {
        self.postfix.iter().find(|op| op.token == kind)
    }

    pub fn binary_operators(&self) -> &[BinaryOperator] {
        &self.binary
    }

    pub fn prefix_operators(&self) -> &[UnaryOperator] {
        &self.prefix
    }

    pub fn postfix_operators(&self) -> &[UnaryOperator] {
        &self.postfix
    }

    /// Registered constructs with their parsers, in no particular order.
    pub fn parsers(&self) -> Vec<(Construct, Arc<dyn Parser>)> {
        self.parsers.iter().map(|(c, p)| (*c, p.clone())).collect()
    }

    pub fn with_parser(&self, construct: Construct, parser: Arc<dyn Parser>) -> Self {
        let mut parsers = (*self.parsers).clone();
        parsers.insert(construct, parser);
        Self {
            parsers: Arc::new(parsers),
            ..self.clone()
        }
    }

    pub fn with_binary_operator(&self, operator: BinaryOperator) -> Self {
        let mut binary = (*self.binary).clone();
        binary.push(operator);
        Self {
            binary: Arc::new(binary),
            ..self.clone()
        }
    }

    pub fn with_prefix_operator(&self, operator: UnaryOperator) -> Self {
        let mut prefix = (*self.prefix).clone();
        prefix.push(operator);
        Self {
            prefix: Arc::new(prefix),
            ..self.clone()
        }
    }

    pub fn with_postfix_operator(&self, operator: UnaryOperator) -> Self {
        let mut postfix = (*self.postfix).clone();
        postfix.push(operator);
        Self {
            postfix: Arc::new(postfix),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut constructs: Vec<String> = self.parsers.keys().map(|c| format!("{:?}", c)).collect();
        constructs.sort();
        f.debug_struct("ParserRegistry")
            .field("constructs", &constructs)
            .field("binary", &self.binary.len())
            .field("prefix", &self.prefix.len())
            .field("postfix", &self.postfix.len())
            .finish()
    }
}
