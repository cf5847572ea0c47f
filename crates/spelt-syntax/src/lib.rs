pub mod ast;
pub mod error;
pub mod token;

pub use ast::*;
pub use error::*;
pub use token::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::new("boom").to_string(), "boom");
        assert_eq!(Error::syntax("Expected ')'", 2, 5).to_string(), "Expected ')' at 2:5");
        assert!(Error::conversion("x").is(ErrorKind::Conversion));
        assert_eq!(ErrorKind::FunctionNotFound.label(), "Function not found");
    }

    #[test]
    fn test_token_spellings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for member in BasicToken::members() {
            for s in member.spellings() {
                assert!(seen.insert(*s), "duplicate spelling {}", s);
            }
        }
        for member in TemplateToken::members() {
            for s in member.spellings() {
                assert!(seen.insert(*s), "duplicate spelling {}", s);
            }
        }
    }

    #[test]
    fn test_token_type_display() {
        assert_eq!(TokenType::from(BasicToken::OrOr).to_string(), "||");
        assert_eq!(TokenType::from(TemplateToken::For).to_string(), "for");
        assert_eq!(TokenType::EOF.to_string(), "end of input");
        let custom = TokenType::Custom { grammar: "policy", name: "has" };
        assert_eq!(custom.to_string(), "policy:has");
    }

    #[test]
    fn test_node_display_shows_structure() {
        let tree = Node::binary(
            Operation::Add,
            Node::literal(Literal::Int(1)),
            Node::binary(Operation::Multiply, Node::literal(Literal::Int(2)), Node::literal(Literal::Int(3))),
        );
        assert_eq!(tree.to_string(), "(1 + (2 * 3))");

        let path = Node::Path(vec![
            Segment::Property("a".into()),
            Segment::Property("b".into()),
            Segment::Index(Node::literal(Literal::Int(0))),
        ]);
        assert_eq!(path.to_string(), "a.b[0]");

        let inc = Node::unary(Operation::Increment, Node::name("x"), Fix::Postfix);
        assert_eq!(inc.to_string(), "x++");

        let neg = Node::unary(
            Operation::Negate,
            Node::unary(Operation::Negate, Node::name("x"), Fix::Prefix),
            Fix::Prefix,
        );
        assert_eq!(neg.to_string(), "-(-x)");
        let not_neg = Node::unary(
            Operation::Not,
            Node::unary(Operation::Negate, Node::name("x"), Fix::Prefix),
            Fix::Prefix,
        );
        assert_eq!(not_neg.to_string(), "!(-x)");
        assert!(Node::name("x").is_reference());
        assert!(!Node::literal(Literal::Null).is_reference());
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::Double(2.0).to_string(), "2.0");
        assert_eq!(Literal::Long(7).to_string(), "7L");
        assert_eq!(Literal::Str("it's".into()).to_string(), "'it\\'s'");
    }
}
