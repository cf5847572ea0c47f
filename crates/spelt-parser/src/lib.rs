//! Spelt parser: turns a [`TokenCursor`] into an expression tree using a
//! registry of construct parsers and operator tables.

pub mod parser;
pub mod registry;

use log::debug;
use spelt_lexer::TokenCursor;
use spelt_syntax::ast::Node;
use spelt_syntax::error::Result;

pub use parser::{
    ArgumentsParser, BinaryParser, ExpressionParser, NamesParser, ParametersParser, Parser,
    PathParser, PrimaryParser, TernaryParser, UnaryParser,
};
pub use registry::{Associativity, BinaryOperator, Construct, ParserRegistry, UnaryOperator};

/// Parses a complete expression. Trailing tokens are a syntax error.
pub fn parse(cursor: &mut TokenCursor, registry: &ParserRegistry) -> Result<Node> {
    parse_construct(Construct::Expression, cursor, registry)
}

/// Parses `construct` and requires the cursor to be at end of input afterwards.
pub fn parse_construct(
    construct: Construct,
    cursor: &mut TokenCursor,
    registry: &ParserRegistry,
) -> Result<Node> {
    let node = registry.parse(construct, cursor)?;
    if !cursor.is_end() {
        return Err(cursor.unexpected("end of input"));
    }
    debug!("parsed {:?}: {}", construct, node);
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelt_lexer::{EnumRecognizer, Lexer, TableRecognizer, TEMPLATE_PRIORITY};
    use spelt_syntax::ast::{Fix, Literal, Operation, Segment};
    use spelt_syntax::error::ErrorKind;
    use spelt_syntax::token::{TemplateToken, TokenType};
    use std::sync::Arc;

    fn parse_str(input: &str) -> Node {
        let mut cursor = Lexer::new().tokenize(input).expect("Lexing should succeed");
        parse(&mut cursor, &ParserRegistry::new()).expect("Parsing should succeed")
    }

    fn parse_err(input: &str) -> spelt_syntax::Error {
        let mut cursor = Lexer::new().tokenize(input).expect("Lexing should succeed");
        parse(&mut cursor, &ParserRegistry::new()).unwrap_err()
    }

    fn shape(input: &str) -> String {
        parse_str(input).to_string()
    }

    #[test]
    fn test_literal_expressions() {
        assert_eq!(parse_str("42"), Node::Literal(Literal::Int(42)));
        assert_eq!(parse_str("42L"), Node::Literal(Literal::Long(42)));
        assert_eq!(parse_str("2.5"), Node::Literal(Literal::Double(2.5)));
        assert_eq!(parse_str("3d"), Node::Literal(Literal::Double(3.0)));
        assert_eq!(parse_str("'hello'"), Node::Literal(Literal::Str("hello".into())));
        assert_eq!(parse_str("\"a\\tb\""), Node::Literal(Literal::Str("a\tb".into())));
        assert_eq!(parse_str("'\\u0041'"), Node::Literal(Literal::Str("A".into())));
        assert_eq!(parse_str("true"), Node::Literal(Literal::Bool(true)));
        assert_eq!(parse_str("false"), Node::Literal(Literal::Bool(false)));
        assert_eq!(parse_str("null"), Node::Literal(Literal::Null));
    }

    #[test]
    fn test_identifier_expressions() {
        assert_eq!(parse_str("variable"), Node::name("variable"));
        assert_eq!(parse_str("my_var"), Node::name("my_var"));
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(shape("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(shape("2 * 3 + 1"), "((2 * 3) + 1)");
        assert_eq!(shape("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(shape("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(shape("a || b && c"), "(a || (b && c))");
        assert_eq!(shape("a < b == c >= d"), "((a < b) == (c >= d))");
    }

    #[test]
    fn test_keyword_operators_share_operations() {
        assert_eq!(parse_str("a and b"), parse_str("a && b"));
        assert_eq!(parse_str("a or not b"), parse_str("a || !b"));
        assert_eq!(parse_str("x div 2 mod 3"), parse_str("x / 2 % 3"));
        assert_eq!(parse_str("a eq b"), parse_str("a == b"));
    }

    #[test]
    fn test_ternary_is_right_associative() {
        assert_eq!(shape("a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
        assert_eq!(shape("x > 1 ? 'big' : 'small'"), "((x > 1) ? 'big' : 'small')");
    }

    #[test]
    fn test_unary_and_postfix() {
        assert_eq!(
            parse_str("-x"),
            Node::unary(Operation::Negate, Node::name("x"), Fix::Prefix)
        );
        assert_eq!(
            parse_str("x++"),
            Node::unary(Operation::Increment, Node::name("x"), Fix::Postfix)
        );
        assert_eq!(
            parse_str("--x"),
            Node::unary(Operation::Decrement, Node::name("x"), Fix::Prefix)
        );
        assert_eq!(shape("!a && b"), "(!a && b)");
        assert_eq!(shape("-2 * 3"), "(-2 * 3)");
        assert_eq!(shape("x++ + 1"), "(x++ + 1)");
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            parse_str("user.roles[0]"),
            Node::Path(vec![
                Segment::Property("user".into()),
                Segment::Property("roles".into()),
                Segment::Index(Node::Literal(Literal::Int(0))),
            ])
        );
        assert_eq!(shape("a.b[i + 1].c"), "a.b[(i + 1)].c");
    }

    #[test]
    fn test_function_calls() {
        match parse_str("foo()") {
            Node::Call { name, arguments } => {
                assert_eq!(name, "foo");
                assert!(arguments.is_empty());
            }
            other => panic!("Expected Call, got {:?}", other),
        }
        match parse_str("math.max(1, 2 + 3)") {
            Node::Call { name, arguments } => {
                assert_eq!(name, "math.max");
                assert_eq!(arguments.len(), 2);
            }
            other => panic!("Expected Call, got {:?}", other),
        }
        assert_eq!(shape("min(a, b) * 2"), "(min(a, b) * 2)");
    }

    #[test]
    fn test_list_expressions() {
        match parse_str("[1, 2, 3]") {
            Node::Arguments(items) => assert_eq!(items.len(), 3),
            other => panic!("Expected Arguments, got {:?}", other),
        }
        assert_eq!(parse_str("[]"), Node::Arguments(Vec::new()));
    }

    #[test]
    fn test_parameters_construct() {
        let registry = ParserRegistry::new();
        let mut cursor = Lexer::new().tokenize("(a, b: 2 + 1, c)").unwrap();
        let node = parse_construct(Construct::Parameters, &mut cursor, &registry).unwrap();
        match node {
            Node::Parameters(params) => {
                assert_eq!(params.len(), 3);
                assert_eq!(params[0].name, "a");
                assert!(params[0].default.is_none());
                assert_eq!(params[1].default.as_ref().map(|d| d.to_string()), Some("(2 + 1)".into()));
            }
            other => panic!("Expected Parameters, got {:?}", other),
        }

        let mut cursor = Lexer::new().tokenize("(a, a)").unwrap();
        let err = parse_construct(Construct::Parameters, &mut cursor, &registry).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_names_construct() {
        let registry = ParserRegistry::new();
        let mut cursor = Lexer::new().tokenize("user as u, org.team, x").unwrap();
        let node = parse_construct(Construct::Names, &mut cursor, &registry).unwrap();
        assert_eq!(
            node,
            Node::Arguments(vec![
                Node::Name {
                    name: "user".into(),
                    alias: Some("u".into())
                },
                Node::name("org.team"),
                Node::name("x"),
            ])
        );
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_err("(1 + 2");
        assert_eq!(err.kind, ErrorKind::Syntax);

        let err = parse_err("1 +");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.msg.contains("end of input"), "{}", err.msg);

        let err = parse_err("a b");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.col, Some(3));

        let err = parse_err("a ? b");
        assert!(err.msg.contains("':'"), "{}", err.msg);

        assert_eq!(parse_err("99999999999999999999").kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_custom_binary_operator() {
        let power = TokenType::Custom {
            grammar: "math",
            name: "power",
        };
        let lexer =
            Lexer::new().with_recognizer(Arc::new(TableRecognizer::new("math", 150).entry("**", "power")));
        let base = ParserRegistry::new();
        let registry = base.with_binary_operator(BinaryOperator::right(
            power,
            Operation::custom("pow"),
            7,
        ));

        let mut cursor = lexer.tokenize("2 * 3 ** 2 ** 2").unwrap();
        let node = parse(&mut cursor, &registry).unwrap();
        assert_eq!(node.to_string(), "(2 * (3 pow (2 pow 2)))");

        // the base registry does not know the operator
        let mut cursor = lexer.tokenize("3 ** 2").unwrap();
        assert!(parse(&mut cursor, &base).is_err());
    }

    #[test]
    fn test_highest_precedence_left_operator() {
        let power = TokenType::Custom {
            grammar: "math",
            name: "power",
        };
        let lexer =
            Lexer::new().with_recognizer(Arc::new(TableRecognizer::new("math", 150).entry("**", "power")));
        let registry = ParserRegistry::new().with_binary_operator(BinaryOperator::left(
            power,
            Operation::custom("x"),
            u8::MAX,
        ));
        let mut cursor = lexer.tokenize("1 ** 2 ** 3 + 4").unwrap();
        let node = parse(&mut cursor, &registry).unwrap();
        assert_eq!(node.to_string(), "(((1 x 2) x 3) + 4)");
    }

    #[test]
    fn test_keyword_spelled_properties() {
        assert_eq!(shape("order.total + item.mod"), "(order.total + item.mod)");
        assert_eq!(shape("item.mod mod 2"), "(item.mod % 2)");
        assert_eq!(
            parse_str("row.as.null"),
            Node::Path(vec![
                Segment::Property("row".into()),
                Segment::Property("as".into()),
                Segment::Property("null".into()),
            ])
        );

        let lexer = Lexer::new().with_recognizer(Arc::new(EnumRecognizer::<TemplateToken>::new(
            TEMPLATE_PRIORITY,
        )));
        let mut cursor = lexer.tokenize("order.end > order.for").unwrap();
        let node = parse(&mut cursor, &ParserRegistry::new()).unwrap();
        assert_eq!(node.to_string(), "(order.end > order.for)");

        let registry = ParserRegistry::new();
        let mut cursor = Lexer::new().tokenize("row.as as r").unwrap();
        let node = parse_construct(Construct::Names, &mut cursor, &registry).unwrap();
        assert_eq!(
            node,
            Node::Arguments(vec![Node::Name {
                name: "row.as".into(),
                alias: Some("r".into())
            }])
        );

        let err = parse_err("order.(1)");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.msg.contains("property name"), "{}", err.msg);
    }

    #[test]
    fn test_unicode_escapes() {
        assert_eq!(
            parse_str("'\\u0041\\u00e9'"),
            Node::Literal(Literal::Str("A\u{e9}".into()))
        );
        for bad in ["'\\u00'", "'\\u+41'", "'\\u00zz'"] {
            let err = parse_err(bad);
            assert_eq!(err.kind, ErrorKind::Syntax, "{}", bad);
            assert!(err.msg.contains("Invalid unicode escape"), "{}", err.msg);
        }
    }

    #[test]
    fn test_nested_prefix_display_round_trips() {
        let node = parse_str("- -x");
        assert_eq!(
            node,
            Node::unary(
                Operation::Negate,
                Node::unary(Operation::Negate, Node::name("x"), Fix::Prefix),
                Fix::Prefix
            )
        );
        assert_eq!(node.to_string(), "-(-x)");
        assert_eq!(parse_str(&node.to_string()), node);
        assert_eq!(shape("--x"), "--x");
    }

    #[test]
    fn test_replaced_construct_parser() {
        let registry = ParserRegistry::new().with_parser(
            Construct::Primary,
            Arc::new(|cursor: &mut TokenCursor, registry: &ParserRegistry| {
                if cursor.current().text == "answer" {
                    cursor.consume();
                    return Ok(Node::Literal(Literal::Int(42)));
                }
                PrimaryParser.parse(cursor, registry)
            }),
        );
        let mut cursor = Lexer::new().tokenize("answer + 1").unwrap();
        assert_eq!(parse(&mut cursor, &registry).unwrap().to_string(), "(42 + 1)");
    }

    #[test]
    fn test_missing_parser_is_syntax_error() {
        let mut cursor = Lexer::new().tokenize("1").unwrap();
        let err = parse(&mut cursor, &ParserRegistry::empty()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }
}
