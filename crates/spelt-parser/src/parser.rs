//! Default construct parsers of the Spelt grammar.
//!
//! ```text
//! expression := ternary
//! ternary    := binary [ '?' expression ':' expression ]
//! binary(m)  := unary { OP(prec >= m) binary(prec + 1 | prec) }
//! unary      := PREFIX unary | primary [ POSTFIX ]
//! primary    := literal | '(' expression ')' | '[' arguments ']' | path
//! path       := IDENT { '.' IDENT | '[' expression ']' } [ '(' arguments ')' ]
//! ```
//!
//! Parsers never call each other directly across constructs; they go through
//! the registry so an extension can replace any single construct.

use log::trace;
use spelt_lexer::TokenCursor;
use spelt_syntax::ast::{Fix, Literal, Node, Parameter, Segment};
use spelt_syntax::error::{Error, Result};
use spelt_syntax::token::{BasicToken, Token, TokenType};

use crate::registry::{Associativity, Construct, ParserRegistry};

/// Parses one grammar construct starting at the cursor position.
pub trait Parser: Send + Sync {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node>;
}

impl<F> Parser for F
where
    F: Fn(&mut TokenCursor, &ParserRegistry) -> Result<Node> + Send + Sync,
{
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        self(cursor, registry)
    }
}

fn kind(b: BasicToken) -> TokenType {
    b.into()
}

/// Entry point of the expression grammar.
pub struct ExpressionParser;

impl Parser for ExpressionParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        registry.parse(Construct::Ternary, cursor)
    }
}

/// `cond ? then : otherwise`, right associative.
pub struct TernaryParser;

impl Parser for TernaryParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        let condition = registry.parse(Construct::Binary, cursor)?;
        if cursor.accept(BasicToken::Question).is_none() {
            return Ok(condition);
        }
        let then = registry.parse(Construct::Expression, cursor)?;
        cursor.ensure(BasicToken::Colon)?;
        let otherwise = registry.parse(Construct::Expression, cursor)?;
        Ok(Node::ternary(condition, then, otherwise))
    }
}

/// Precedence climbing over the registry's binary operator table.
pub struct BinaryParser;

impl BinaryParser {
    fn climb(cursor: &mut TokenCursor, registry: &ParserRegistry, min: u16) -> Result<Node> {
        let mut left = registry.parse(Construct::Unary, cursor)?;
        loop {
            let op = match registry.binary_operator(cursor.current().kind) {
                Some(op) if u16::from(op.precedence) >= min => op.clone(),
                _ => break,
            };
            cursor.consume();
            let next_min = match op.associativity {
                Associativity::Left => u16::from(op.precedence) + 1,
                Associativity::Right => u16::from(op.precedence),
            };
            let right = Self::climb(cursor, registry, next_min)?;
            left = Node::binary(op.operation, left, right);
        }
        Ok(left)
    }
}

impl Parser for BinaryParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        Self::climb(cursor, registry, 0)
    }
}

/// Prefix operators wrap the following unary; a postfix operator wraps the
/// primary right before it. Whether `++`/`--` write back is decided when the
/// node is evaluated.
pub struct UnaryParser;

impl Parser for UnaryParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        if let Some(op) = registry.prefix_operator(cursor.current().kind).cloned() {
            cursor.consume();
            let operand = registry.parse(Construct::Unary, cursor)?;
            return Ok(Node::unary(op.operation, operand, Fix::Prefix));
        }
        let primary = registry.parse(Construct::Primary, cursor)?;
        match registry.postfix_operator(cursor.current().kind).cloned() {
            Some(op) => {
                cursor.consume();
                Ok(Node::unary(op.operation, primary, Fix::Postfix))
            }
            None => Ok(primary),
        }
    }
}

/// Literals, grouping, list literals and paths.
pub struct PrimaryParser;

impl Parser for PrimaryParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        let kind = cursor.current().kind;
        match kind {
            TokenType::Basic(BasicToken::Number) => {
                let token = cursor.consume();
                Ok(Node::Literal(number_literal(&token)?))
            }
            TokenType::Basic(BasicToken::String) => {
                let token = cursor.consume();
                Ok(Node::Literal(Literal::Str(unescape(&token)?)))
            }
            TokenType::Basic(BasicToken::True) => {
                cursor.consume();
                Ok(Node::Literal(Literal::Bool(true)))
            }
            TokenType::Basic(BasicToken::False) => {
                cursor.consume();
                Ok(Node::Literal(Literal::Bool(false)))
            }
            TokenType::Basic(BasicToken::Null) => {
                cursor.consume();
                Ok(Node::Literal(Literal::Null))
            }
            TokenType::Basic(BasicToken::LParen) => {
                cursor.look_over(BasicToken::LParen, BasicToken::RParen)?;
                cursor.consume();
                let inner = registry.parse(Construct::Expression, cursor)?;
                cursor.ensure(BasicToken::RParen)?;
                Ok(inner)
            }
            TokenType::Basic(BasicToken::LBracket) => {
                cursor.consume();
                if cursor.accept(BasicToken::RBracket).is_some() {
                    return Ok(Node::Arguments(Vec::new()));
                }
                let items = registry.parse(Construct::Arguments, cursor)?;
                cursor.ensure(BasicToken::RBracket)?;
                Ok(items)
            }
            TokenType::Basic(BasicToken::Identifier) => registry.parse(Construct::Path, cursor),
            _ => Err(cursor.unexpected("an expression")),
        }
    }
}

/// `a.b[0].c` paths and `name(args)` / `ns.name(args)` calls.
pub struct PathParser;

impl Parser for PathParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        let root = cursor.ensure(BasicToken::Identifier)?;
        let mut segments = vec![Segment::Property(root.text)];
        loop {
            if cursor.accept(BasicToken::Dot).is_some() {
                segments.push(Segment::Property(property_name(cursor)?));
            } else if cursor.is_current(&[kind(BasicToken::LBracket)]) {
                cursor.consume();
                let index = registry.parse(Construct::Expression, cursor)?;
                cursor.ensure(BasicToken::RBracket)?;
                segments.push(Segment::Index(index));
            } else if cursor.is_current(&[kind(BasicToken::LParen)]) {
                return call(segments, cursor, registry);
            } else {
                break;
            }
        }
        if segments.len() == 1 {
            if let Some(Segment::Property(name)) = segments.pop() {
                return Ok(Node::name(name));
            }
        }
        Ok(Node::Path(segments))
    }
}

/// The word after a `.`: keyword spellings such as `mod` or `end` are plain
/// property names there.
fn property_name(cursor: &mut TokenCursor) -> Result<String> {
    let text = &cursor.current().text;
    let mut chars = text.chars();
    let word = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if word {
        Ok(cursor.consume().text)
    } else {
        Err(cursor.unexpected("a property name"))
    }
}

fn call(segments: Vec<Segment>, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
    let mut parts = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Property(p) => parts.push(p),
            Segment::Index(_) => return Err(cursor.unexpected("a function name before '('")),
        }
    }
    cursor.ensure(BasicToken::LParen)?;
    let arguments = if cursor.accept(BasicToken::RParen).is_some() {
        Vec::new()
    } else {
        let args = match registry.parse(Construct::Arguments, cursor)? {
            Node::Arguments(items) => items,
            other => vec![other],
        };
        cursor.ensure(BasicToken::RParen)?;
        args
    };
    Ok(Node::Call {
        name: parts.join("."),
        arguments,
    })
}

/// Comma-separated expressions, without delimiters.
pub struct ArgumentsParser;

impl Parser for ArgumentsParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        let mut items = vec![registry.parse(Construct::Expression, cursor)?];
        while cursor.accept(BasicToken::Comma).is_some() {
            items.push(registry.parse(Construct::Expression, cursor)?);
        }
        Ok(Node::Arguments(items))
    }
}

/// `(name, name: default, ...)`
pub struct ParametersParser;

impl Parser for ParametersParser {
    fn parse(&self, cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
        cursor.look_over(BasicToken::LParen, BasicToken::RParen)?;
        cursor.consume();
        let mut params = Vec::new();
        if cursor.accept(BasicToken::RParen).is_some() {
            return Ok(Node::Parameters(params));
        }
        loop {
            let name = cursor.ensure(BasicToken::Identifier)?.text;
            if params.iter().any(|p: &Parameter| p.name == name) {
                let at = cursor.look_ahead(-1).map(|t| t.span).unwrap_or_default();
                return Err(Error::syntax(
                    format!("Duplicate parameter '{}'", name),
                    at.line,
                    at.col,
                ));
            }
            let default = if cursor.accept(BasicToken::Colon).is_some() {
                Some(registry.parse(Construct::Expression, cursor)?)
            } else {
                None
            };
            params.push(Parameter { name, default });
            if cursor.accept(BasicToken::Comma).is_none() {
                break;
            }
        }
        cursor.ensure(BasicToken::RParen)?;
        Ok(Node::Parameters(params))
    }
}

/// `a, b.c as d, e`: names with optional aliases, as an argument list of
/// `Name` nodes.
pub struct NamesParser;

impl Parser for NamesParser {
    fn parse(&self, cursor: &mut TokenCursor, _registry: &ParserRegistry) -> Result<Node> {
        let mut names = Vec::new();
        loop {
            let mut name = cursor.ensure(BasicToken::Identifier)?.text;
            while cursor.accept(BasicToken::Dot).is_some() {
                name.push('.');
                name.push_str(&property_name(cursor)?);
            }
            let alias = match cursor.accept(BasicToken::As) {
                Some(_) => Some(cursor.ensure(BasicToken::Identifier)?.text),
                None => None,
            };
            names.push(Node::Name { name, alias });
            if cursor.accept(BasicToken::Comma).is_none() {
                break;
            }
        }
        Ok(Node::Arguments(names))
    }
}

fn number_literal(token: &Token) -> Result<Literal> {
    let text = token.text.as_str();
    let invalid = || {
        Error::syntax(
            format!("Invalid number '{}'", text),
            token.span.line,
            token.span.col,
        )
    };
    let (digits, suffix) = match text.chars().last() {
        Some(c @ ('L' | 'l' | 'D' | 'd')) => (&text[..text.len() - 1], Some(c.to_ascii_uppercase())),
        _ => (text, None),
    };
    let literal = match suffix {
        Some('L') => Literal::Long(digits.parse().map_err(|_| invalid())?),
        Some(_) => Literal::Double(digits.parse().map_err(|_| invalid())?),
        None if digits.contains('.') => Literal::Double(digits.parse().map_err(|_| invalid())?),
        None => Literal::Int(digits.parse().map_err(|_| invalid())?),
    };
    trace!("number literal {} -> {:?}", text, literal);
    Ok(literal)
}

fn unescape(token: &Token) -> Result<String> {
    let text = token.text.as_str();
    let bad = |msg: &str| Error::syntax(msg.to_string(), token.span.line, token.span.col);
    let mut chars = text.chars();
    let quote = chars.next().ok_or_else(|| bad("Empty string token"))?;
    let body: Vec<char> = chars.collect();
    if body.last() != Some(&quote) {
        return Err(bad("Unterminated string"));
    }
    let mut out = String::with_capacity(body.len());
    let mut it = body[..body.len() - 1].iter().copied();
    while let Some(c) = it.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match it.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = it.by_ref().take(4).collect();
                if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(bad("Invalid unicode escape"));
                }
                let ch = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| bad("Invalid unicode escape"))?;
                out.push(ch);
            }
            Some(other) => out.push(other),
            None => return Err(bad("Dangling escape in string")),
        }
    }
    Ok(out)
}
