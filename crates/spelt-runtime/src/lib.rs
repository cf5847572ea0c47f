//! Spelt runtime: evaluates expression trees against a context.
//!
//! A [`Runtime`] bundles the operator table, the function registry and the
//! conversion service. A [`Context`] holds the variables of one evaluation
//! and points at the registries of the runtime it was created from. Nodes
//! evaluate through the [`Evaluate`] trait.

pub mod context;
pub mod conversion;
pub mod evaluator;
pub mod functions;
pub mod operators;
pub mod runtime;
pub mod value;

pub use context::{Context, PathKey};
pub use conversion::{default_converters, ConversionService, Converter};
pub use evaluator::{path_keys, Evaluate};
pub use functions::{default_functions, Function, FunctionRegistry, Signature};
pub use operators::{
    default_binary_handlers, default_unary_handlers, values_equal, BinaryHandler, OperatorTable,
    UnaryHandler,
};
pub use runtime::Runtime;
pub use value::{TypeTag, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use spelt_lexer::Lexer;
    use spelt_parser::{parse, parse_construct, Construct, ParserRegistry};
    use spelt_syntax::ast::{Literal, Node, Operation};
    use spelt_syntax::error::{ErrorKind, Result};
    use std::collections::BTreeMap;

    fn compile(src: &str) -> Node {
        let mut cursor = Lexer::new().tokenize(src).expect("Lexing should succeed");
        parse(&mut cursor, &ParserRegistry::new()).expect("Parsing should succeed")
    }

    fn eval_in(src: &str, ctx: &mut Context) -> Result<Value> {
        compile(src).evaluate(ctx)
    }

    fn expect_value(src: &str, expected: Value) {
        let mut ctx = Runtime::new().context();
        match eval_in(src, &mut ctx) {
            Ok(actual) => assert_eq!(actual, expected, "Expression: {}", src),
            Err(e) => panic!("Evaluation failed: {}\nExpression: {}", e, src),
        }
    }

    fn expect_error(src: &str, kind: ErrorKind) {
        let mut ctx = Runtime::new().context();
        match eval_in(src, &mut ctx) {
            Ok(v) => panic!("Expected {:?} but got {} for: {}", kind, v, src),
            Err(e) => assert_eq!(e.kind, kind, "Expression: {} ({})", src, e),
        }
    }

    fn str(s: &str) -> Value {
        Value::Str(s.to_string())
    }

    fn user() -> Value {
        let mut m = BTreeMap::new();
        m.insert("name".to_string(), str("ada"));
        m.insert("age".to_string(), Value::Int(36));
        m.insert("roles".to_string(), Value::from(vec!["admin", "dev"]));
        Value::Map(m)
    }

    #[test]
    fn test_literal_values() {
        expect_value("42", Value::Int(42));
        expect_value("3000000000", Value::Long(3_000_000_000));
        expect_value("42L", Value::Long(42));
        expect_value("1.5", Value::Double(1.5));
        expect_value("'hello'", str("hello"));
        expect_value("true", Value::Bool(true));
        expect_value("null", Value::Null);
    }

    #[test]
    fn test_arithmetic_operations() {
        expect_value("1 + 2 * 3", Value::Int(7));
        expect_value("(1 + 2) * 3", Value::Int(9));
        expect_value("7 / 2", Value::Int(3));
        expect_value("7 % 4", Value::Int(3));
        expect_value("7.0 / 2", Value::Double(3.5));
        expect_value("1L + 1", Value::Long(2));
        expect_value("2147483647 + 1", Value::Long(2_147_483_648));
        expect_value("-3 * 2", Value::Int(-6));
        expect_value("10 div 4 mod 2", Value::Int(0));
    }

    #[test]
    fn test_integer_division_by_zero() {
        expect_error("1 / 0", ErrorKind::Arithmetic);
        expect_error("1L % 0", ErrorKind::Arithmetic);
        expect_value("1.0 / 0", Value::Double(f64::INFINITY));
    }

    #[test]
    fn test_string_and_list_concatenation() {
        expect_value("'a' + 'b'", str("ab"));
        expect_value("'n=' + 1", str("n=1"));
        expect_value("1 + 'x'", str("1x"));
        expect_value(
            "[1, 2] + [3]",
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        );
    }

    #[test]
    fn test_comparison_operations() {
        expect_value("5 > 3", Value::Bool(true));
        expect_value("5 >= 5", Value::Bool(true));
        expect_value("3 lt 5", Value::Bool(true));
        expect_value("5 == 5L", Value::Bool(true));
        expect_value("5 == 5.0", Value::Bool(true));
        expect_value("5 != 3", Value::Bool(true));
        expect_value("'a' < 'b'", Value::Bool(true));
        expect_value("[1, 2] == [1L, 2.0]", Value::Bool(true));
    }

    #[test]
    fn test_logical_operations() {
        expect_value("true && false", Value::Bool(false));
        expect_value("false or true", Value::Bool(true));
        expect_value("not true", Value::Bool(false));
        expect_value("1 < 2 and 2 < 3", Value::Bool(true));
        expect_error("1 && true", ErrorKind::OperatorResolution);
    }

    #[test]
    fn test_null_operand_is_operator_error() {
        expect_error("null + 1", ErrorKind::OperatorResolution);
        expect_error("missing == 1", ErrorKind::OperatorResolution);
        expect_error("true + false", ErrorKind::OperatorResolution);
    }

    #[test]
    fn test_ternary() {
        expect_value("2 > 1 ? 'big' : 'small'", str("big"));
        expect_value("false ? 1 : true ? 2 : 3", Value::Int(2));
        // only the selected branch runs
        expect_value("true ? 1 : nope()", Value::Int(1));
        expect_error("1 ? 2 : 3", ErrorKind::Conversion);
    }

    #[test]
    fn test_prefix_increment_writes_back() {
        let mut ctx = Runtime::new().context();
        ctx.declare("x", Value::Int(5));
        assert_eq!(eval_in("++x", &mut ctx).unwrap(), Value::Int(6));
        assert_eq!(ctx.get_variable("x").unwrap(), Value::Int(6));
        assert_eq!(eval_in("--x", &mut ctx).unwrap(), Value::Int(5));
        assert_eq!(ctx.get_variable("x").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_postfix_increment_returns_original() {
        let mut ctx = Runtime::new().context();
        ctx.declare("x", Value::Int(5));
        assert_eq!(eval_in("x++", &mut ctx).unwrap(), Value::Int(5));
        assert_eq!(ctx.get_variable("x").unwrap(), Value::Int(6));

        ctx.declare("d", Value::Double(1.5));
        assert_eq!(eval_in("d--", &mut ctx).unwrap(), Value::Double(1.5));
        assert_eq!(ctx.get_variable("d").unwrap(), Value::Double(0.5));

        ctx.declare("l", Value::Long(9));
        assert_eq!(eval_in("++l", &mut ctx).unwrap(), Value::Long(10));
    }

    #[test]
    fn test_increment_on_paths() {
        let mut ctx = Runtime::new().context();
        ctx.declare("user", user());
        ctx.declare("counts", Value::from(vec![1, 2, 3]));
        assert_eq!(eval_in("user.age++", &mut ctx).unwrap(), Value::Int(36));
        assert_eq!(eval_in("user.age", &mut ctx).unwrap(), Value::Int(37));
        assert_eq!(eval_in("++counts[1]", &mut ctx).unwrap(), Value::Int(3));
        assert_eq!(
            ctx.get_variable("counts").unwrap(),
            Value::from(vec![1, 3, 3])
        );
    }

    #[test]
    fn test_postfix_on_non_reference_is_identity() {
        expect_value("5++", Value::Int(5));
        expect_value("++5", Value::Int(6));
    }

    #[test]
    fn test_increment_failures_are_conversion_errors() {
        let mut ctx = Runtime::new().context();
        ctx.declare("s", str("abc"));
        ctx.declare("m", Value::Int(i32::MAX));
        let err = eval_in("s++", &mut ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(ctx.get_variable("s").unwrap(), str("abc"));

        let err = eval_in("++m", &mut ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(ctx.get_variable("m").unwrap(), Value::Int(i32::MAX));

        expect_error("++missing", ErrorKind::Conversion);

        ctx.declare("big", Value::Long(i64::MAX));
        ctx.declare("small", Value::Long(i64::MIN));
        let err = eval_in("big++", &mut ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
        let err = eval_in("--small", &mut ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(ctx.get_variable("big").unwrap(), Value::Long(i64::MAX));
        assert_eq!(eval_in("--big", &mut ctx).unwrap(), Value::Long(i64::MAX - 1));
    }

    #[test]
    fn test_can_convert_matches_convert() {
        let conversion = ConversionService::new();
        let cases = [
            (TypeTag::Int, TypeTag::Int, true),
            (TypeTag::List, TypeTag::Any, true),
            (TypeTag::Bool, TypeTag::Str, true),
            (TypeTag::Str, TypeTag::Bool, true),
            (TypeTag::Int, TypeTag::Long, true),
            (TypeTag::Long, TypeTag::Number, true),
            (TypeTag::Char, TypeTag::Int, true),
            (TypeTag::Bool, TypeTag::Int, false),
            (TypeTag::List, TypeTag::Str, false),
            (TypeTag::Str, TypeTag::Map, false),
        ];
        for (from, target, expected) in cases {
            assert_eq!(conversion.can_convert(from, target), expected, "{:?} -> {:?}", from, target);
        }
        assert!(!ConversionService::empty().can_convert(TypeTag::Bool, TypeTag::Str));
        assert!(ConversionService::empty().can_convert(TypeTag::Bool, TypeTag::Bool));
        assert!(conversion.convert(&Value::Bool(true), TypeTag::Int).is_err());
        assert_eq!(conversion.convert(&Value::Long(7), TypeTag::Number).unwrap(), Value::Long(7));
    }

    #[test]
    fn test_has_variable_and_clear() {
        let mut ctx = Runtime::new().context();
        ctx.declare("x", Value::Int(1));
        ctx.declare("nothing", Value::Null);
        assert!(ctx.has_variable("x"));
        assert!(ctx.has_variable("nothing"));
        assert!(!ctx.has_variable("y"));

        ctx.push_scope();
        ctx.declare("y", Value::Int(2));
        assert!(ctx.has_variable("x"));
        assert!(ctx.has_variable("y"));

        ctx.clear();
        assert!(!ctx.has_variable("x"));
        assert!(!ctx.has_variable("y"));
        assert!(ctx.variables().is_empty());
        // only the global frame is left
        assert!(!ctx.pop_scope());

        ctx.declare("z", Value::Int(3));
        assert_eq!(eval_in("z + 1", &mut ctx).unwrap(), Value::Int(4));
    }

    #[test]
    fn test_name_and_path_lookup() {
        let mut ctx = Runtime::new().context();
        ctx.declare("user", user());
        ctx.declare("word", str("hello"));
        assert_eq!(eval_in("user.name", &mut ctx).unwrap(), str("ada"));
        assert_eq!(eval_in("user['name']", &mut ctx).unwrap(), str("ada"));
        assert_eq!(eval_in("user.roles[1]", &mut ctx).unwrap(), str("dev"));
        assert_eq!(eval_in("word[1]", &mut ctx).unwrap(), Value::Char('e'));
        assert_eq!(eval_in("user.roles[5]", &mut ctx).unwrap(), Value::Null);
        assert_eq!(eval_in("user.nope", &mut ctx).unwrap(), Value::Null);
        assert_eq!(eval_in("absent", &mut ctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_strict_mode() {
        let mut ctx = Runtime::new().context().with_strict(true);
        ctx.declare("user", user());
        assert_eq!(eval_in("user.age", &mut ctx).unwrap(), Value::Int(36));
        assert_eq!(eval_in("absent", &mut ctx).unwrap_err().kind, ErrorKind::Unresolved);
        assert_eq!(eval_in("user.nope", &mut ctx).unwrap_err().kind, ErrorKind::Unresolved);
    }

    #[test]
    fn test_builtin_functions() {
        expect_value("min(3, 5)", Value::Int(3));
        expect_value("max(2, 7L)", Value::Long(7));
        expect_value("min(1.5, 2)", Value::Double(1.5));
        expect_value("max('a', 'b')", str("b"));
        expect_value("max(1, 2, 3.5, 3)", Value::Double(3.5));
        expect_value("abs(-4)", Value::Int(4));
        expect_value("pow(2, 10)", Value::Int(1024));
        expect_value("sqrt(16)", Value::Double(4.0));
        expect_value("round(2.5)", Value::Double(3.0));
        expect_value("len('hello')", Value::Int(5));
        expect_value("len([1, 2, 3])", Value::Int(3));
        expect_value("upper('abc')", str("ABC"));
        expect_value("trim('  x ')", str("x"));
        expect_value("substring('hello', 1, 4)", str("ell"));
        expect_value("substring('hello', 3)", str("lo"));
        expect_value("replace('a-b-c', '-', '+')", str("a+b+c"));
        expect_value("split('a,b', ',')", Value::from(vec!["a", "b"]));
        expect_value("join(['a', 'b'], '-')", str("a-b"));
        expect_value("concat('a', 1, true)", str("a1true"));
        expect_value("contains([1, 2, 3], 2L)", Value::Bool(true));
        expect_value("startsWith('spelt', 'sp')", Value::Bool(true));
        expect_value("coalesce(null, missing, 2)", Value::Int(2));
        expect_value("isNull(missing)", Value::Bool(true));
        expect_value("isEmpty('')", Value::Bool(true));
    }

    #[test]
    fn test_conversion_functions() {
        expect_value("str(true)", str("true"));
        expect_value("bool('false')", Value::Bool(false));
        expect_value("int('42')", Value::Int(42));
        expect_value("long(3)", Value::Long(3));
        expect_value("double('2.5')", Value::Double(2.5));
        expect_value("int(char('A'))", Value::Int(65));
        expect_error("bool('yes')", ErrorKind::Conversion);
        expect_error("int(2.5)", ErrorKind::Conversion);
    }

    #[test]
    fn test_unknown_function() {
        expect_error("foo()", ErrorKind::FunctionNotFound);
        expect_error("len(42)", ErrorKind::FunctionNotFound);
    }

    #[test]
    fn test_map_functions() {
        let mut ctx = Runtime::new().context();
        ctx.declare("user", user());
        assert_eq!(
            eval_in("keys(user)", &mut ctx).unwrap(),
            Value::from(vec!["age", "name", "roles"])
        );
        assert_eq!(eval_in("len(values(user))", &mut ctx).unwrap(), Value::Int(3));
        assert_eq!(eval_in("contains(user, 'age')", &mut ctx).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_arguments_and_parameters() {
        expect_value("[1, 'a']", Value::List(vec![Value::Int(1), str("a")]));

        let mut cursor = Lexer::new().tokenize("(a, b: 1 + 1)").unwrap();
        let node = parse_construct(Construct::Parameters, &mut cursor, &ParserRegistry::new()).unwrap();
        let value = node.evaluate(&mut Runtime::new().context()).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), Value::Null);
        expected.insert("b".to_string(), Value::Int(2));
        assert_eq!(value, Value::Map(expected));
    }

    #[test]
    fn test_conversion_round_trips() {
        let conv = ConversionService::new();
        let s = conv.convert(&Value::Bool(true), TypeTag::Str).unwrap();
        assert_eq!(s, str("true"));
        assert_eq!(conv.convert(&s, TypeTag::Bool).unwrap(), Value::Bool(true));

        let c = conv.convert(&Value::Char('c'), TypeTag::Str).unwrap();
        assert_eq!(c, str("c"));
        assert_eq!(conv.convert(&c, TypeTag::Char).unwrap(), Value::Char('c'));

        assert_eq!(conv.convert(&Value::Long(5), TypeTag::Int).unwrap(), Value::Int(5));
        assert_eq!(conv.convert(&Value::Int(5), TypeTag::Double).unwrap(), Value::Double(5.0));
        assert_eq!(conv.convert(&Value::Double(4.0), TypeTag::Long).unwrap(), Value::Long(4));
        assert!(conv.convert(&Value::Double(2.5), TypeTag::Int).is_err());
        assert!(conv.convert(&Value::Long(i64::MAX), TypeTag::Int).is_err());
        assert!(conv.convert(&str("ab"), TypeTag::Char).is_err());
        assert!(conv.convert(&Value::Null, TypeTag::Str).unwrap_err().is(ErrorKind::Conversion));
    }

    #[test]
    fn test_type_tag_soft_matching() {
        assert!(TypeTag::Any.accepts(TypeTag::Null));
        assert!(TypeTag::Number.accepts(TypeTag::Long));
        assert!(TypeTag::Long.accepts(TypeTag::Int));
        assert!(!TypeTag::Long.accepts(TypeTag::Double));
        assert!(TypeTag::Double.accepts(TypeTag::Int));
        assert!(!TypeTag::Int.accepts(TypeTag::Long));
        assert!(!TypeTag::Str.accepts(TypeTag::Null));
        assert_eq!(TypeTag::from_name("double"), Some(TypeTag::Double));
    }

    #[test]
    fn test_set_value_targets_declaring_frame() {
        let mut ctx = Runtime::new().context();
        ctx.declare("x", Value::Int(0));
        ctx.push_scope();
        ctx.declare("x", Value::Int(1));
        ctx.set_variable("x", Value::Int(2)).unwrap();
        ctx.set_variable("fresh", Value::Int(7)).unwrap();
        assert_eq!(ctx.get_variable("x").unwrap(), Value::Int(2));
        assert!(ctx.pop_scope());

        assert_eq!(ctx.get_variable("x").unwrap(), Value::Int(0));
        assert_eq!(ctx.get_variable("fresh").unwrap(), Value::Int(7));
        assert!(!ctx.pop_scope(), "the global frame stays");
    }

    #[test]
    fn test_nested_writes_need_containers() {
        let mut ctx = Runtime::new().context();
        ctx.declare("user", user());
        let path = [
            PathKey::Property("user".into()),
            PathKey::Property("email".into()),
        ];
        ctx.set_value(&path, str("ada@example.org")).unwrap();
        assert_eq!(ctx.get_value(&path).unwrap(), str("ada@example.org"));

        let deep = [
            PathKey::Property("user".into()),
            PathKey::Property("address".into()),
            PathKey::Property("city".into()),
        ];
        let err = ctx.set_value(&deep, str("x")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unresolved);

        let out_of_range = [
            PathKey::Property("user".into()),
            PathKey::Property("roles".into()),
            PathKey::Index(9),
        ];
        assert!(ctx.set_value(&out_of_range, str("x")).is_err());
    }

    #[test]
    fn test_with_scope_shadows() {
        let mut ctx = Runtime::new().context();
        ctx.declare("x", Value::Int(1));
        let inner = ctx.with_scope(|c| {
            c.declare("x", Value::Int(2));
            eval_in("x * 10", c)
        });
        assert_eq!(inner.unwrap(), Value::Int(20));
        assert_eq!(eval_in("x", &mut ctx).unwrap(), Value::Int(1));
        assert_eq!(ctx.variables().get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_overloads_most_specific_first() {
        let tagged = |label: &'static str| {
            move |_: &[Value], _: &Context| -> Result<Value> { Ok(str(label)) }
        };
        let runtime = Runtime::empty()
            .with_function(Function::new("f", Signature::rest(TypeTag::Any), tagged("rest")))
            .with_function(Function::new("f", Signature::new([TypeTag::Any]), tagged("any")))
            .with_function(Function::new("f", Signature::new([TypeTag::Number]), tagged("number")))
            .with_function(Function::new("f", Signature::new([TypeTag::Long]), tagged("long")))
            .with_function(Function::new("f", Signature::new([TypeTag::Int]), tagged("int")))
            .with_function(Function::new("g", Signature::new([TypeTag::Str]), tagged("first")))
            .with_function(Function::new("g", Signature::new([TypeTag::Str]), tagged("second")));
        let ctx = runtime.context();
        let call = |name: &str, args: &[Value]| ctx.functions().call(name, args, &ctx).unwrap();

        assert_eq!(call("f", &[Value::Int(1)]), str("int"));
        assert_eq!(call("f", &[Value::Long(1)]), str("long"));
        assert_eq!(call("f", &[Value::Double(1.0)]), str("number"));
        assert_eq!(call("f", &[str("s")]), str("any"));
        assert_eq!(call("f", &[Value::Int(1), Value::Int(2)]), str("rest"));
        assert_eq!(call("g", &[str("s")]), str("first"));

        let order: Vec<String> = ctx
            .functions()
            .overloads("f")
            .iter()
            .map(|f| f.signature.to_string())
            .collect();
        assert_eq!(order, vec!["(int)", "(long)", "(number)", "(any)", "(any...)"]);
    }

    #[test]
    fn test_widened_arguments_are_converted() {
        let runtime = Runtime::new().with_function(Function::new(
            "kind",
            Signature::new([TypeTag::Double]),
            |args: &[Value], _: &Context| Ok(str(args[0].tag().name())),
        ));
        let mut ctx = runtime.context();
        assert_eq!(eval_in("kind(1)", &mut ctx).unwrap(), str("double"));
    }

    #[test]
    fn test_custom_operator_handler() {
        let runtime = Runtime::new().with_binary_handler(BinaryHandler::new(
            Operation::custom("pow"),
            TypeTag::Number,
            TypeTag::Number,
            |a, b| match (a.as_double(), b.as_double()) {
                (Some(x), Some(y)) => Ok(Value::Double(x.powf(y))),
                _ => Ok(Value::Null),
            },
        ));
        let node = Node::binary(
            Operation::custom("pow"),
            Node::literal(Literal::Int(2)),
            Node::literal(Literal::Int(3)),
        );
        assert_eq!(runtime.evaluate(&node).unwrap(), Value::Double(8.0));
        let err = Runtime::new().evaluate(&node).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OperatorResolution);
    }

    #[test]
    fn test_evaluate_as() {
        let mut ctx = Runtime::new().context();
        let node = compile("1 + 1");
        assert_eq!(node.evaluate_as(&mut ctx, TypeTag::Str).unwrap(), str("2"));
        assert_eq!(node.evaluate_as(&mut ctx, TypeTag::Double).unwrap(), Value::Double(2.0));
        assert_eq!(
            node.evaluate_as(&mut ctx, TypeTag::Bool).unwrap_err().kind,
            ErrorKind::Conversion
        );
    }

    #[test]
    fn test_shared_node_concurrent_evaluation() {
        let node = compile("a * 2 + 1");
        let runtime = Runtime::new();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let (node, runtime) = (&node, &runtime);
                    s.spawn(move || {
                        let mut ctx = runtime.context();
                        ctx.declare("a", Value::Int(i));
                        node.evaluate(&mut ctx).unwrap()
                    })
                })
                .collect();
            for (i, h) in handles.into_iter().enumerate() {
                assert_eq!(h.join().unwrap(), Value::Int(i as i32 * 2 + 1));
            }
        });
    }
}
