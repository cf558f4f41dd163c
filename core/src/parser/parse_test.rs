use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::parser::{ParseErrorKind, parse, parse_stubs};
use crate::tree::{ClassKind, ExprKind, LiteralValue, Modifier, StatementKind};

#[test]
fn test_parse_compilation_unit_header() {
    let unit = parse(indoc! {r#"
        package com.example;

        import java.util.List;
        import static org.apache.commons.lang3.StringUtils.isEmpty;
        import org.apache.http.*;

        class A {}
    "#})
    .unwrap();

    assert_eq!(unit.package.as_deref(), Some("com.example"));
    assert_eq!(unit.imports.len(), 3);
    assert!(!unit.imports[0].is_static);
    assert!(unit.imports[1].is_static);
    assert_eq!(unit.imports[1].container(), "org.apache.commons.lang3.StringUtils");
    assert!(unit.imports[2].is_wildcard());
    assert_eq!(unit.classes.len(), 1);
}

#[test]
fn test_parse_class_members() {
    let unit = parse(indoc! {r#"
        public class A extends B implements C {
            private static final int X = 1;

            A() {
            }

            @Override
            public String toString() {
                return "a";
            }

            interface Inner {
                void m();
            }
        }
    "#})
    .unwrap();

    let class = &unit.classes[0];
    assert_eq!(&*class.name, "A");
    assert_eq!(class.modifiers, vec![Modifier::Public]);
    assert_eq!(class.extends.as_ref().map(|t| &*t.name), Some("B"));
    assert_eq!(class.implements.len(), 1);

    let members = &class.body.statements;
    assert_eq!(members.len(), 4);
    assert!(matches!(members[0].kind, StatementKind::VarDecls(_)));
    assert!(!members[0].blank_line_before);
    assert!(members[1].blank_line_before);
    match &members[2].kind {
        StatementKind::Method(m) => {
            assert_eq!(&*m.name, "toString");
            assert_eq!(m.annotations.len(), 1);
            assert!(m.body.is_some());
        }
        other => panic!("expected method, got {:?}", other),
    }
    match &members[3].kind {
        StatementKind::Class(c) => assert_eq!(c.kind, ClassKind::Interface),
        other => panic!("expected class, got {:?}", other),
    }
}

#[test]
fn test_blank_lines_and_comments_between_statements() {
    let unit = parse(indoc! {r#"
        class A {
            void m() {
                a();
                b();

                // then
                c();
            }
        }
    "#})
    .unwrap();

    let StatementKind::Method(method) = &unit.classes[0].body.statements[0].kind else {
        panic!("expected method");
    };
    let body = method.body.as_ref().unwrap();
    let flags: Vec<bool> = body.statements.iter().map(|s| s.blank_line_before).collect();
    assert_eq!(flags, vec![false, false, true]);
    assert_eq!(body.statements[2].comments.len(), 1);
    assert_eq!(&*body.statements[2].comments[0].text, " then");
}

#[test]
fn test_trivia_after_if_without_else() {
    let unit = parse(indoc! {r#"
        class A {
            void m(int n) {
                if (n == 0)
                    return;

                // keep me
                {
                    n = 1;
                }
            }
        }
    "#})
    .unwrap();

    let StatementKind::Method(method) = &unit.classes[0].body.statements[0].kind else {
        panic!("expected method");
    };
    let nested = &method.body.as_ref().unwrap().statements[1];
    assert!(matches!(nested.kind, StatementKind::Block(_)));
    assert!(nested.blank_line_before);
    assert_eq!(nested.comments.len(), 1);
    assert_eq!(&*nested.comments[0].text, " keep me");
}

#[test]
fn test_generic_declarations() {
    let unit = parse(indoc! {r#"
        class Box<T, K extends Comparable<K> & Cloneable> extends Base<T> {
            <R> R map(T value) {
                return null;
            }

            <U> Box(U seed) {
            }
        }
    "#})
    .unwrap();

    let class = &unit.classes[0];
    assert_eq!(&*class.name, "Box");
    let names: Vec<&str> = class.type_params.iter().map(|p| &*p.name).collect();
    assert_eq!(names, vec!["T", "K"]);
    assert!(class.type_params[0].bounds.is_empty());
    let bounds: Vec<&str> = class.type_params[1].bounds.iter().map(|b| &*b.name).collect();
    assert_eq!(bounds, vec!["Comparable", "Cloneable"]);
    assert_eq!(class.extends.as_ref().map(|t| &*t.name), Some("Base"));

    let methods: Vec<(&str, Vec<&str>)> = class
        .body
        .statements
        .iter()
        .filter_map(|m| match &m.kind {
            StatementKind::Method(m) => Some((
                &*m.name,
                m.type_params.iter().map(|p| &*p.name).collect(),
            )),
            _ => None,
        })
        .collect();
    assert_eq!(methods, vec![("map", vec!["R"]), ("Box", vec!["U"])]);
}

#[test]
fn test_wrapped_method_select() {
    let unit = parse(indoc! {r#"
        class A {
            void m() {
                getLogger()
                    .info("x");
                getLogger().info("y");
            }
        }
    "#})
    .unwrap();

    let StatementKind::Method(method) = &unit.classes[0].body.statements[0].kind else {
        panic!("expected method");
    };
    let wraps: Vec<bool> = method
        .body
        .as_ref()
        .unwrap()
        .statements
        .iter()
        .map(|s| s.as_expr().and_then(|e| e.as_invocation()).map(|mi| mi.wrap).unwrap())
        .collect();
    assert_eq!(wraps, vec![true, false]);
}

#[test]
fn test_literals() {
    let unit = parse(indoc! {r#"
        class A {
            void m() {
                f(1, 2L, 1.5, 'c', "s\\d", true, null);
            }
        }
    "#})
    .unwrap();

    let StatementKind::Method(method) = &unit.classes[0].body.statements[0].kind else {
        panic!("expected method");
    };
    let call = method.body.as_ref().unwrap().statements[0]
        .as_expr()
        .unwrap()
        .clone();
    let values: Vec<LiteralValue> = call
        .as_invocation()
        .unwrap()
        .args
        .iter()
        .map(|a| a.as_literal().unwrap().value.clone())
        .collect();
    assert_eq!(
        values,
        vec![
            LiteralValue::Int(1),
            LiteralValue::Long(2),
            LiteralValue::Float(1.5),
            LiteralValue::Char('c'),
            LiteralValue::String("s\\d".to_string()),
            LiteralValue::Bool(true),
            LiteralValue::Null,
        ]
    );
}

#[test]
fn test_cast_and_class_literal() {
    let unit = parse("class A { void m() { f((short) 700, A.class); } }").unwrap();
    let StatementKind::Method(method) = &unit.classes[0].body.statements[0].kind else {
        panic!("expected method");
    };
    let stmt = &method.body.as_ref().unwrap().statements[0];
    let args = &stmt.as_expr().unwrap().as_invocation().unwrap().args;
    assert!(matches!(args[0].kind, ExprKind::Cast(_)));
    assert_eq!(args[0].int_value(), Some(700));
    assert!(matches!(args[1].kind, ExprKind::ClassLiteral(_)));
}

#[test]
fn test_stub_bundle_has_one_unit_per_package() {
    let units = parse_stubs(indoc! {r#"
        package a;
        public class A { public A(); }

        package b;
        import a.A;
        public class B extends A { public static B create(); }
    "#})
    .unwrap();

    assert_eq!(units.len(), 2);
    assert_eq!(units[1].package.as_deref(), Some("b"));
    assert_eq!(units[1].imports.len(), 1);
}

#[test]
fn test_placeholder_rejected_outside_templates() {
    let err = parse("class A { void m() { #{0}.x(); } }").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedPlaceholder);
}

#[test]
fn test_parse_error_reports_position() {
    let source = "class A { void m() { int x = ; } }";
    let err = parse(source).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
    assert!(err.span.0.start > 0 && err.span.0.start <= source.len());
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("P001"));
}
