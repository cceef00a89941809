//! Expression precedence and shape tests, compared through `Ast::dump`

use parser::ast::{Accessibility, ParEntryType, StatKind};
use parser::{parse_chunk, AnalysisType, ExprKind, LiteralValue, NodeId, ParseOutput};

/// Parses a single expression statement and returns its expression
fn parse_expr(source: &str) -> (ParseOutput, NodeId) {
    let output = parse_chunk("expr.tjs", source);
    let messages: Vec<_> = output.diagnostics.iter().map(|d| d.message.clone()).collect();
    assert!(messages.is_empty(), "'{}' reported {:?}", source, messages);

    let Some(StatKind::Block { stats, .. }) = output.ast.node(output.root).as_stat() else {
        panic!("root should be a block");
    };
    let expr = match output.ast.node(stats[0]).as_stat() {
        Some(StatKind::Expr { expr: Some(expr) }) => *expr,
        other => panic!("'{}' is not an expression statement: {:?}", source, other),
    };
    (output, expr)
}

fn dump(source: &str) -> String {
    let (output, expr) = parse_expr(source);
    output.ast.dump(expr)
}

#[test]
fn test_precedence() {
    let cases = vec![
        (
            "a + b * c;",
            "Binary Add\n  Identifier a\n  Binary Mul\n    Identifier b\n    Identifier c\n",
        ),
        (
            "a - b - c;",
            "Binary Sub\n  Binary Sub\n    Identifier a\n    Identifier b\n  Identifier c\n",
        ),
        (
            "a || b && c;",
            "Binary Or\n  Identifier a\n  Binary And\n    Identifier b\n    Identifier c\n",
        ),
        (
            "a == b < c;",
            "Binary Eq\n  Identifier a\n  Binary Less\n    Identifier b\n    Identifier c\n",
        ),
        (
            "a | b ^ c & d;",
            "Binary BitOr\n  Identifier a\n  Binary BitXor\n    Identifier b\n    Binary BitAnd\n      Identifier c\n      Identifier d\n",
        ),
        (
            "a << 1 + 2;",
            "Binary Shl\n  Identifier a\n  Binary Add\n    Literal 1\n    Literal 2\n",
        ),
        (
            "a \\ b % c;",
            "Binary Mod\n  Binary IntDiv\n    Identifier a\n    Identifier b\n  Identifier c\n",
        ),
    ];

    for (source, expected) in cases {
        assert_eq!(dump(source), expected, "shape of '{}'", source);
    }
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(
        dump("a = b += 1;"),
        "Assign Assign\n  Identifier a\n  Assign Add\n    Identifier b\n    Literal 1\n"
    );
    assert_eq!(
        dump("a <-> b;"),
        "Assign Swap\n  Identifier a\n  Identifier b\n"
    );
}

#[test]
fn test_conditional_and_post_if() {
    assert_eq!(
        dump("a ? b : c;"),
        "Conditional\n  Identifier a\n  Identifier b\n  Identifier c\n"
    );
    assert_eq!(
        dump("a = 1 if b;"),
        "PostIf\n  Assign Assign\n    Identifier a\n    Literal 1\n  Identifier b\n"
    );
}

#[test]
fn test_comma_and_instanceof() {
    assert_eq!(
        dump("a, b instanceof C;"),
        "Binary Comma\n  Identifier a\n  Binary Instanceof\n    Identifier b\n    Identifier C\n"
    );
}

#[test]
fn test_unary_and_postfix() {
    assert_eq!(
        dump("-a.b++;"),
        "Unary Neg\n  Unary Inc\n    Member .b\n      Identifier a\n"
    );
    assert_eq!(
        dump("!typeof x;"),
        "Unary Not\n  Unary Typeof\n    Identifier x\n"
    );
    assert_eq!(
        dump("#\"A\";"),
        "Unary CharCode\n  Literal \"A\"\n"
    );
    assert_eq!(
        dump("int x;"),
        "Unary ToInt\n  Identifier x\n"
    );
}

#[test]
fn test_calls_and_indexing() {
    assert_eq!(
        dump("obj.f(1)[i];"),
        "Index\n  Call\n    Member .f\n      Identifier obj\n    ParList\n      ParEntry\n        Literal 1\n  Identifier i\n"
    );
    assert_eq!(
        dump("new Foo();"),
        "Unary New\n  Call\n    Identifier Foo\n    ParList\n"
    );
}

#[test]
fn test_call_entry_types() {
    let (output, expr) = parse_expr("f(a, *, ...);");
    let Some(ExprKind::Call {
        args: Some(args), ..
    }) = output.ast.node(expr).as_expr()
    else {
        panic!("expected a call");
    };
    let Some(ExprKind::ParList { entries }) = output.ast.node(*args).as_expr() else {
        panic!("expected an argument list");
    };
    let types: Vec<_> = entries
        .iter()
        .map(|entry| match output.ast.node(*entry).as_expr() {
            Some(ExprKind::ParEntry { entry_type, .. }) => *entry_type,
            other => panic!("expected an entry, got {:?}", other),
        })
        .collect();
    assert_eq!(
        types,
        vec![
            ParEntryType::Normal,
            ParEntryType::UnnamedArgs,
            ParEntryType::CallerArgs
        ]
    );
}

#[test]
fn test_collections() {
    assert_eq!(
        dump("[1, \"two\", 3.5];"),
        "Array\n  ParList\n    ParEntry\n      Literal 1\n    ParEntry\n      Literal \"two\"\n    ParEntry\n      Literal 3.5\n"
    );
    assert_eq!(
        dump("%[\"k\" => v];"),
        "Dict\n  ParList\n    ParEntry\n      Literal \"k\"\n    ParEntry\n      Identifier v\n"
    );
    assert_eq!(dump("<% 0a ff %>;"), "Literal <% 0a ff %>\n");
}

#[test]
fn test_literals() {
    let cases = vec![
        ("0x1F;", LiteralValue::Integer(31)),
        ("1.5;", LiteralValue::Real(1.5)),
        ("true;", LiteralValue::Integer(1)),
        ("false;", LiteralValue::Integer(0)),
        ("void;", LiteralValue::Void),
        ("null;", LiteralValue::Null),
        ("'a\\tb';", LiteralValue::String("a\tb".to_string())),
    ];

    for (source, expected) in cases {
        let (output, expr) = parse_expr(source);
        match output.ast.node(expr).as_expr() {
            Some(ExprKind::Literal { value }) => assert_eq!(value, &expected, "'{}'", source),
            other => panic!("'{}' is not a literal: {:?}", source, other),
        }
        assert_eq!(
            output.ast.analysis_type(expr),
            Some(&AnalysisType::Literal(expected))
        );
    }
}

#[test]
fn test_regex_literal() {
    let output = parse_chunk("expr.tjs", "x = /ab+c/gi;");
    assert!(output.diagnostics.is_empty());
    let regex = output
        .ast
        .iter()
        .find_map(|(_, node)| match node.as_expr() {
            Some(ExprKind::Literal {
                value: LiteralValue::Regex(source),
            }) => Some(source.clone()),
            _ => None,
        })
        .expect("regex literal");
    assert_eq!(regex, "/ab+c/gi");
}

#[test]
fn test_interpolated_string() {
    let (output, expr) = parse_expr("s = @\"v=${a + 1} and &b; end\";");
    let Some(ExprKind::Assign {
        value: Some(value), ..
    }) = output.ast.node(expr).as_expr()
    else {
        panic!("expected assignment");
    };
    assert_eq!(
        output.ast.dump(*value),
        "InterpolatedString\n  Literal \"v=\"\n  Binary Add\n    Identifier a\n    Literal 1\n  Literal \" and \"\n  Identifier b\n  Literal \" end\"\n"
    );
}

#[test]
fn test_function_expression() {
    assert_eq!(
        dump("f = function (x) { return x; };"),
        "Assign Assign\n  Identifier f\n  FunctionExpr\n    Parameter\n    Block\n      Return\n        Identifier x\n"
    );
}

#[test]
fn test_context_and_with_member() {
    assert_eq!(dump("this.x;"), "Member .x\n  Context\n");
    assert_eq!(dump(".y;"), "Member .y\n");
    assert_eq!(dump("a.if;"), "Member .if\n  Identifier a\n");
}

#[test]
fn test_accessibility() {
    let (output, expr) = parse_expr("a.b = c + 1;");
    let Some(ExprKind::Assign {
        target,
        value: Some(value),
        ..
    }) = output.ast.node(expr).as_expr()
    else {
        panic!("expected assignment");
    };
    let info = |id: NodeId| output.ast.node(id).expr.clone().expect("expression info");
    assert_eq!(info(*target).accessibility, Accessibility::LValue);
    assert_eq!(info(*value).accessibility, Accessibility::RValue);
}
