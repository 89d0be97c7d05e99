#[cfg(test)]
/// Parser unit tests.
///
/// These tests focus on correctness of specific syntactic forms, automatic semicolon insertion, and the
/// parser's error recovery behavior (avoiding cascaded errors).
mod tests {
    use super::*;
    use crate::diagnostics::ErrorKind;
    use crate::lexer;

    fn parse_str(source: &str) -> Result<Program, Vec<CompileError>> {
        let tokens = lexer::lex(source)?;
        parse(&tokens)
    }

    fn parse_ok(source: &str) -> Program {
        parse_str(source).unwrap_or_else(|errs| panic!("parse({source:?}) failed: {errs:?}"))
    }

    fn single_expr(source: &str) -> Expr {
        let program = parse_ok(source);
        assert_eq!(program.body.len(), 1, "expected one statement in {source:?}");
        match &program.body[0].node {
            Stmt::Expr(e) => e.node.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_function_and_exports() {
        let program = parse_ok("function add(a, b) { return a + b }\nmodule.exports = { add };");
        assert_eq!(program.body.len(), 2);
        match &program.body[0].node {
            Stmt::Function(f) => {
                assert_eq!(f.name.as_deref(), Some("add"));
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.kind, FunctionKind::Normal);
            }
            other => panic!("Expected function, got {other:?}"),
        }
        match &program.body[1].node {
            Stmt::Expr(Spanned {
                node: Expr::Assign { target, .. },
                ..
            }) => assert!(matches!(target.node, Pattern::Member(_))),
            other => panic!("Expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_top_level_return_is_allowed() {
        let program = parse_ok("const x = 1\nreturn x");
        assert!(matches!(program.body[1].node, Stmt::Return(Some(_))));
    }

    #[test]
    fn test_asi_return_newline() {
        // `return\nx` returns undefined, then evaluates `x`.
        let program = parse_ok("function f() {\n  return\n  42\n}");
        let Stmt::Function(f) = &program.body[0].node else {
            panic!("expected function");
        };
        let FunctionBody::Block(body) = &f.body else {
            panic!("expected block body");
        };
        assert!(matches!(body[0].node, Stmt::Return(None)));
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_asi_postfix_restriction() {
        let program = parse_ok("let a = 1, b = 2\na\n++b");
        assert_eq!(program.body.len(), 3);
        assert!(matches!(
            &program.body[2].node,
            Stmt::Expr(Spanned {
                node: Expr::Update { prefix: true, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_missing_semicolon_on_same_line_is_error() {
        let err = parse_str("let a = 1 let b = 2").unwrap_err();
        assert!(err[0].message.starts_with("Expected ';'"), "got {}", err[0].message);
    }

    #[test]
    fn test_precedence_and_associativity() {
        // 1 + 2 * 3 → Add(1, Mul(2, 3))
        match single_expr("1 + 2 * 3") {
            Expr::Binary(_, BinaryOp::Add, rhs) => assert!(matches!(rhs.node, Expr::Binary(_, BinaryOp::Mul, _))),
            other => panic!("unexpected {other:?}"),
        }
        // 2 ** 3 ** 2 → Pow(2, Pow(3, 2))
        match single_expr("2 ** 3 ** 2") {
            Expr::Binary(_, BinaryOp::Pow, rhs) => assert!(matches!(rhs.node, Expr::Binary(_, BinaryOp::Pow, _))),
            other => panic!("unexpected {other:?}"),
        }
        // a || b && c → Or(a, And(b, c))
        match single_expr("a || b && c") {
            Expr::Logical(_, LogicalOp::Or, rhs) => assert!(matches!(rhs.node, Expr::Logical(_, LogicalOp::And, _))),
            other => panic!("unexpected {other:?}"),
        }
        // a - b - c → Sub(Sub(a, b), c)
        match single_expr("a - b - c") {
            Expr::Binary(lhs, BinaryOp::Sub, _) => assert!(matches!(lhs.node, Expr::Binary(_, BinaryOp::Sub, _))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_arrow_functions() {
        match single_expr("x => x * 2") {
            Expr::Function(f) => {
                assert_eq!(f.kind, FunctionKind::Arrow);
                assert!(matches!(f.body, FunctionBody::Expr(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
        match single_expr("({ a, b = 2 }, ...rest) => { return a }") {
            Expr::Function(f) => {
                assert_eq!(f.params.len(), 1);
                assert!(f.rest.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(single_expr("() => ({})"), Expr::Function(_)));
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        assert!(matches!(single_expr("(a + b) * c"), Expr::Binary(_, BinaryOp::Mul, _)));
    }

    #[test]
    fn test_optional_chain_boundary() {
        match single_expr("a?.b.c()") {
            Expr::OptionalChain(inner) => assert!(matches!(inner.node, Expr::Call { optional: false, .. })),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(single_expr("a.b.c"), Expr::Member { .. }));
    }

    #[test]
    fn test_destructuring_declarations() {
        let program = parse_ok("const { a, b: [c, , d = 1], ...rest } = obj;");
        let Stmt::VarDecl(decl) = &program.body[0].node else {
            panic!("expected declaration");
        };
        let mut names = Vec::new();
        decl.declarations[0].target.node.bound_names(&mut names);
        assert_eq!(names, vec!["a", "c", "d", "rest"]);
    }

    #[test]
    fn test_destructuring_assignment_swap() {
        match single_expr("[a, b] = [b, a]") {
            Expr::Assign { target, .. } => assert!(matches!(target.node, Pattern::Array { .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_str("a + 1 = 2").unwrap_err();
        assert_eq!(err[0].message, "Invalid left-hand side in assignment");
        let err = parse_str("f()++").unwrap_err();
        assert_eq!(err[0].message, "Invalid postfix operation target");
    }

    #[test]
    fn test_for_variants() {
        let program = parse_ok(
            "for (let i = 0; i < 3; i++) {}\nfor (const x of xs) {}\nfor (const k in obj) {}\nfor (x of xs) {}\nfor (;;) break",
        );
        assert!(matches!(program.body[0].node, Stmt::For { .. }));
        assert!(matches!(program.body[1].node, Stmt::ForOf { .. }));
        assert!(matches!(program.body[2].node, Stmt::ForIn { .. }));
        match &program.body[3].node {
            Stmt::ForOf { binding, .. } => assert!(binding.kind.is_none()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(program.body[4].node, Stmt::For { init: None, test: None, .. }));
    }

    #[test]
    fn test_in_operator_inside_for_init_parens() {
        let program = parse_ok("for (let ok = ('a' in obj); ok; ok = false) {}");
        assert!(matches!(program.body[0].node, Stmt::For { .. }));
    }

    #[test]
    fn test_class_with_extends_fields_and_static() {
        let source = r#"
class Counter extends Component {
  count = 0
  static create() { return new Counter() }
  constructor(props) { super(props); this.label = props.label }
  increment() { this.count++ }
}
"#;
        let program = parse_ok(source);
        let Stmt::Class(class) = &program.body[0].node else {
            panic!("expected class");
        };
        assert_eq!(class.name.as_deref(), Some("Counter"));
        assert!(class.superclass.is_some());
        assert!(class.constructor.is_some());
        assert_eq!(class.members.len(), 3);
        assert!(matches!(class.members[1], ClassMember::Method { is_static: true, .. }));
    }

    #[test]
    fn test_switch_try_labels() {
        let source = r#"
outer: for (const x of xs) {
  switch (x) {
    case 1: continue outer
    default: break outer
  }
}
try { risky() } catch ({ message }) { log(message) } finally { done() }
"#;
        let program = parse_ok(source);
        assert!(matches!(program.body[0].node, Stmt::Labeled { .. }));
        match &program.body[1].node {
            Stmt::Try { handler, finalizer, .. } => {
                assert!(handler.as_ref().is_some_and(|h| h.param.is_some()));
                assert!(finalizer.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_template_literal_substitution_spans() {
        let source = "`a${x + 1}b`";
        match single_expr(source) {
            Expr::Template(parts) => {
                assert_eq!(parts.len(), 3);
                let TemplatePart::Expr(e) = &parts[1] else {
                    panic!("expected substitution");
                };
                assert_eq!(&source[e.span.start..e.span.end], "x + 1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_template_substitution_error_points_into_template() {
        let source = "let s = `value: ${a +}`";
        let err = parse_str(source).unwrap_err();
        let substitution = source.find("a +").unwrap();
        assert_eq!(err[0].span.start, substitution + 3);
        assert_eq!(err[0].message, "Expected expression, found end of input");
    }

    #[test]
    fn test_object_literal_forms() {
        match single_expr("({ a, 'b-c': 1, [k]: 2, 3: 4, m() { return 1 }, ...rest })") {
            Expr::Object(props) => {
                assert_eq!(props.len(), 6);
                assert!(matches!(&props[3], ObjectProp::KeyValue(PropKey::Named(n), _) if n == "3"));
                assert!(matches!(props[4], ObjectProp::Method(..)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_keywords_as_property_names() {
        assert!(matches!(single_expr("el.class"), Expr::Member { .. }));
        assert!(matches!(single_expr("({ default: 1, new: 2 })"), Expr::Object(_)));
    }

    #[test]
    fn test_unsupported_constructs_are_labelled() {
        for source in [
            "async function f() {}",
            "function* gen() {}",
            "({ get x() { return 1 } })",
            "import x from 'y'",
            "await fetch()",
            "tag`x`",
        ] {
            let err = parse_str(source).unwrap_err();
            assert_eq!(err[0].kind, ErrorKind::Unsupported, "{source}: {:?}", err[0]);
        }
    }

    #[test]
    fn test_recovery_reports_each_bad_statement_once() {
        let err = parse_str("let = 1\nconst ok = 2\nlet y = ;\n").unwrap_err();
        assert_eq!(err.len(), 2, "{err:?}");
    }

    #[test]
    fn test_excessive_nesting_is_an_error() {
        let source = format!("{}1{}", "[".repeat(MAX_NESTING + 10), "]".repeat(MAX_NESTING + 10));
        let err = std::thread::Builder::new()
            .stack_size(32 * 1024 * 1024)
            .spawn(move || parse_str(&source).unwrap_err())
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(err[0].message, "Code is nested too deeply");
    }

    #[test]
    fn test_long_flat_chains_are_bounded() {
        for source in [
            format!("exports.x = {}1", "1+".repeat(15_000)),
            format!("a{}", " && b".repeat(15_000)),
            format!("o{}", ".p".repeat(15_000)),
            format!("f{}", "()".repeat(15_000)),
            format!("x = {}2", "2 ** ".repeat(15_000)),
            format!("{}C", "new ".repeat(15_000)),
        ] {
            let err = parse_str(&source).unwrap_err();
            assert_eq!(err[0].message, "Code is nested too deeply");
        }
    }

    #[test]
    fn test_ordinary_chains_still_parse() {
        let source = format!("const total = {}1; o.a.b.c.d().e[0]()", "1 + ".repeat(200));
        assert!(parse_str(&source).is_ok());
    }

    #[test]
    fn test_template_substitutions_share_the_nesting_budget() {
        let source = format!("x = {}`${{{}1}}`{}", "(".repeat(200), "1+".repeat(100), ")".repeat(200));
        let err = std::thread::Builder::new()
            .stack_size(32 * 1024 * 1024)
            .spawn(move || parse_str(&source).unwrap_err())
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(err[0].message, "Code is nested too deeply");
    }

    #[test]
    fn test_error_message_snapshot() {
        let source = "let x = (1 + ;";
        let err = parse_str(source).unwrap_err();
        insta::assert_snapshot!(err[0].display_with_location(source), @"SyntaxError: Expected expression, found ';' (line 1, column 14)");
    }
}
