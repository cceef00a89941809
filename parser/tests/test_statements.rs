//! Statement grammar tests for the TJS parser

use parser::ast::StatKind;
use parser::{parse_chunk, NodeId, NodeKind, ParseOutput};

fn top_level(output: &ParseOutput) -> Vec<NodeId> {
    match output.ast.node(output.root).as_stat() {
        Some(StatKind::Block { stats, is_global }) => {
            assert!(*is_global);
            stats.clone()
        }
        other => panic!("root should be a global block, got {:?}", other),
    }
}

fn first_stat(source: &str) -> (ParseOutput, NodeId) {
    let output = parse_chunk("test.tjs", source);
    let stats = top_level(&output);
    assert!(!stats.is_empty(), "no statements parsed from '{}'", source);
    (output, stats[0])
}

#[test]
fn test_well_formed_statements() {
    let inputs = vec![
        "var a = 1, b;",
        "const c = 2;",
        "if (a) b(); else { c(); }",
        "while (i < 10) i++;",
        "do { i--; } while (i > 0);",
        "for (var i = 0; i < 10; i++) sum += i;",
        "for (;;) break;",
        "with (obj) { .x = 1; }",
        "switch (v) { case 1: a(); break; case 2: default: b(); }",
        "try { risky(); } catch (e) { log(e); }",
        "try { risky(); } catch { }",
        "throw new Exception(\"bad\");",
        "function f(a, b = 2, rest*) { return a + b; }",
        "function g(*) { return; }",
        "function { }",
        "property p { getter() { return 1; } setter(v) { x = v; } }",
        "property q { getter { return 1; } }",
        "class A extends B, C { var x = 1; function A() { super.A(); } property y { getter { return x; } } }",
        "x = y if z;",
        "continue;",
        ";",
    ];

    for input in inputs {
        let output = parse_chunk("test.tjs", input);
        let messages: Vec<_> = output.diagnostics.iter().map(|d| d.message.clone()).collect();
        assert!(messages.is_empty(), "'{}' reported {:?}", input, messages);
        assert!(
            output.ast.is_completed(output.root),
            "'{}' should be complete:\n{}",
            input,
            output.ast.dump(output.root)
        );
    }
}

#[test]
fn test_if_else_shape() {
    let (output, id) = first_stat("if (a) b; else c;");
    match output.ast.node(id).as_stat() {
        Some(StatKind::If {
            pred,
            true_stat,
            false_stat,
        }) => {
            assert!(pred.is_some());
            assert!(true_stat.is_some());
            assert!(false_stat.is_some());
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_for_with_var_init() {
    let (output, id) = first_stat("for (var i = 0, j = 1; i < j; i++) {}");
    match output.ast.node(id).as_stat() {
        Some(StatKind::For {
            init: Some(init),
            pred: Some(_),
            step: Some(_),
            body: Some(_),
        }) => match output.ast.node(*init).as_stat() {
            Some(StatKind::Var { entries, is_const }) => {
                assert_eq!(entries.len(), 2);
                assert!(!is_const);
            }
            other => panic!("expected var init, got {:?}", other),
        },
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn test_switch_cases() {
    let (output, id) = first_stat("switch (x) { case 1: case 2: a(); break; default: b(); }");
    let Some(StatKind::Switch { cases, .. }) = output.ast.node(id).as_stat() else {
        panic!("expected switch");
    };
    let shapes: Vec<_> = cases
        .iter()
        .map(|case| match output.ast.node(*case).as_stat() {
            Some(StatKind::Case {
                is_default, stats, ..
            }) => (*is_default, stats.len()),
            other => panic!("expected case, got {:?}", other),
        })
        .collect();
    assert_eq!(shapes, vec![(false, 0), (false, 2), (true, 1)]);
}

#[test]
fn test_try_catch_parameter() {
    let (output, id) = first_stat("try { a(); } catch (err) { b(err); }");
    let Some(StatKind::Try {
        try_block,
        catch_param,
        catch_block,
    }) = output.ast.node(id).as_stat()
    else {
        panic!("expected try");
    };
    assert!(try_block.is_some());
    assert!(catch_block.is_some());
    let param = catch_param.expect("catch parameter");
    assert_eq!(output.ast.dump(param), "Identifier err\n");
}

#[test]
fn test_function_parameters() {
    let (output, id) = first_stat("function f(a, b = 1, c*) {}");
    let Some(StatKind::Function { name, params, body }) = output.ast.node(id).as_stat() else {
        panic!("expected function");
    };
    assert_eq!(output.ast.dump(name.unwrap()), "Identifier f\n");
    assert!(body.is_some());
    let kinds: Vec<_> = params
        .iter()
        .map(|param| match &output.ast.node(*param).kind {
            NodeKind::Expr(parser::ExprKind::FunctionParameter {
                param_type, name, ..
            }) => (*param_type, name.clone()),
            other => panic!("expected parameter, got {:?}", other),
        })
        .collect();
    use parser::ast::ParamType;
    assert_eq!(
        kinds,
        vec![
            (ParamType::Normal, Some("a".to_string())),
            (ParamType::WithInitializer, Some("b".to_string())),
            (ParamType::NamedArgs, Some("c".to_string())),
        ]
    );
}

#[test]
fn test_property_accessors() {
    let (output, id) = first_stat("property size { getter { return w; } setter(v) { w = v; } }");
    let Some(StatKind::Property {
        name,
        getter,
        setter,
    }) = output.ast.node(id).as_stat()
    else {
        panic!("expected property");
    };
    assert!(name.is_some());
    assert!(matches!(
        output.ast.node(getter.unwrap()).as_stat(),
        Some(StatKind::PropertyGetter { body: Some(_) })
    ));
    assert!(matches!(
        output.ast.node(setter.unwrap()).as_stat(),
        Some(StatKind::PropertySetter {
            param: Some(_),
            body: Some(_)
        })
    ));
}

#[test]
fn test_class_members() {
    let source = "class Sprite extends Layer {\n  var x;\n  const y = 2;\n  function Sprite() {}\n  property z { getter { return 0; } }\n  ;\n}";
    let (output, id) = first_stat(source);
    let Some(StatKind::Class {
        name,
        extends,
        members,
    }) = output.ast.node(id).as_stat()
    else {
        panic!("expected class");
    };
    assert!(name.is_some());
    assert_eq!(extends.len(), 1);
    let names: Vec<_> = members
        .iter()
        .map(|member| output.ast.node(*member).kind.name())
        .collect();
    assert_eq!(names, vec!["Var", "Var", "Function", "Property", "Empty"]);
    assert!(output.ast.is_completed(id));
}

#[test]
fn test_statement_ranges() {
    let output = parse_chunk("test.tjs", "var a = 1;\n  while (a) a--;");
    let stats = top_level(&output);
    assert_eq!(stats.len(), 2);
    assert_eq!(output.ast.node(stats[0]).range.to_string(), "1:1-1:11");
    assert_eq!(output.ast.node(stats[1]).range.to_string(), "2:3-2:17");
}
