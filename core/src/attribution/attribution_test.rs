use std::sync::Arc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::classpath::Classpath;
use crate::parser::parse;
use crate::tree::{ExprKind, Statement, StatementKind, Symbol};

fn attributed(source: &str) -> Attribution {
    let unit = parse(source).expect("parses");
    let classpath = Classpath::jdk().expect("jdk stubs");
    attribute(&unit, &classpath)
}

/// Statements of the first method named `name` in the first class.
fn body(attribution: &Attribution, name: &str) -> Vec<Arc<Statement>> {
    attribution.unit.classes[0]
        .body
        .statements
        .iter()
        .find_map(|member| match &member.kind {
            StatementKind::Method(m) if &*m.name == name => {
                m.body.as_ref().map(|b| b.statements.clone())
            }
            _ => None,
        })
        .expect("method with a body")
}

fn expr_of(statement: &Statement) -> Arc<Expr> {
    match &statement.kind {
        StatementKind::Expr(e) => e.clone(),
        StatementKind::Return(Some(e)) => e.clone(),
        StatementKind::VarDecls(vd) => vd.vars[0].init.clone().expect("initializer"),
        other => panic!("no expression in {:?}", other),
    }
}

#[test]
fn locals_fields_and_calls() {
    let attribution = attributed(indoc! {r#"
        package com.acme;

        class A {
            private String name;

            int size(String first) {
                String trimmed = first.trim();
                boolean empty = name.isEmpty();
                return trimmed.length();
            }
        }
    "#});
    assert!(attribution.report.is_clean(), "{:?}", attribution.report);
    let statements = body(&attribution, "size");

    let trim = expr_of(&statements[0]);
    assert_eq!(trim.ty, JavaType::string());
    let mi = trim.as_invocation().expect("call");
    let select = mi.select.as_ref().expect("receiver");
    assert_eq!(select.as_ident().map(|i| &i.symbol), Some(&Symbol::Local));
    assert_eq!(
        mi.method_type.as_ref().map(|m| m.to_string()),
        Some("java.lang.String trim()".to_string())
    );

    let is_empty = expr_of(&statements[1]);
    let receiver = is_empty.as_invocation().and_then(|mi| mi.select.clone()).expect("receiver");
    assert_eq!(
        receiver.as_ident().map(|i| i.symbol.clone()),
        Some(Symbol::Field {
            owner: Arc::from("com.acme.A"),
            is_static: false
        })
    );
    assert_eq!(expr_of(&statements[2]).ty, JavaType::int());
}

#[test]
fn qualified_names_resolve_to_types() {
    let attribution = attributed(indoc! {r#"
        class A {
            Object unit() {
                Object a = java.util.concurrent.TimeUnit.SECONDS;
                Object b = java.nio.charset.StandardCharsets.UTF_8;
                return String.valueOf(1);
            }
        }
    "#});
    assert!(attribution.report.is_clean(), "{:?}", attribution.report);
    let statements = body(&attribution, "unit");

    let seconds = expr_of(&statements[0]);
    assert_eq!(seconds.ty, JavaType::class("java.util.concurrent.TimeUnit"));
    let owner = seconds.as_field_access().map(|fa| fa.target.clone()).expect("access");
    assert_eq!(owner.as_field_access().map(|fa| fa.symbol.clone()), Some(Symbol::Type));

    assert_eq!(
        expr_of(&statements[1]).ty,
        JavaType::class("java.nio.charset.Charset")
    );

    let value_of = expr_of(&statements[2]);
    let method = value_of.method_type().expect("bound");
    assert!(method.is_static);
    assert_eq!(value_of.ty, JavaType::string());
}

#[test]
fn operators_and_literals() {
    let attribution = attributed(indoc! {r#"
        class A {
            void ops(String s, byte[] data, Integer boxed) {
                Object a = s + 1;
                Object b = 1 + 2L;
                Object c = s == null || s.isEmpty();
                Object d = data.length;
                Object e = -boxed;
                Object f = (short) 700;
                Object g = 1.5f;
                Object h = true ? s : null;
                Object i = A.class;
            }
        }
    "#});
    let types: Vec<String> = body(&attribution, "ops")
        .iter()
        .map(|s| expr_of(s).ty.to_string())
        .collect();
    assert_eq!(
        types,
        vec![
            "java.lang.String",
            "long",
            "boolean",
            "int",
            "int",
            "short",
            "float",
            "java.lang.String",
            "java.lang.Class",
        ]
    );
}

#[test]
fn unqualified_calls_search_enclosing_classes_then_static_imports() {
    let attribution = attributed(indoc! {r#"
        import static java.util.Objects.requireNonNull;
        import static java.util.Objects.toString;

        class Outer {
            String label() {
                return "x";
            }

            class Inner {
                Object run(Object o) {
                    Object a = label();
                    Object b = requireNonNull(o);
                    return toString(o, "none");
                }
            }
        }
    "#});
    let inner = attribution.unit.classes[0]
        .body
        .statements
        .iter()
        .find_map(|m| match &m.kind {
            StatementKind::Class(c) => Some(c.clone()),
            _ => None,
        })
        .expect("inner class");
    assert_eq!(inner.ty, JavaType::class("Outer.Inner"));
    let statements = inner
        .body
        .statements
        .iter()
        .find_map(|m| match &m.kind {
            StatementKind::Method(m) => m.body.clone(),
            _ => None,
        })
        .expect("body")
        .statements
        .clone();

    let label = expr_of(&statements[0]);
    assert_eq!(label.method_type().map(|m| &*m.declaring), Some("Outer"));
    let require = expr_of(&statements[1]);
    assert_eq!(
        require.method_type().map(|m| &*m.declaring),
        Some("java.util.Objects")
    );
    let to_string = expr_of(&statements[2]);
    assert_eq!(to_string.method_type().map(|m| m.params.len()), Some(2));
    assert_eq!(to_string.ty, JavaType::string());
}

#[test]
fn unresolved_names_are_reported() {
    let attribution = attributed(indoc! {r#"
        import org.example.Missing;

        class A {
            void run() {
                Missing m = Missing.create();
                Object x = unknownLocal;
                m.go();
            }
        }
    "#});
    let statements = body(&attribution, "run");
    let create = expr_of(&statements[0]);
    assert!(create.ty.is_unknown());
    assert!(create.method_type().is_none());
    assert_eq!(
        attribution.report.unresolved_names(),
        vec!["create", "unknownLocal", "go"]
    );
    assert!(attribution
        .report
        .warnings()
        .iter()
        .all(|d| d.code.as_deref().is_some_and(|c| c.starts_with('A'))));
    match &statements[1].kind {
        StatementKind::VarDecls(vd) => {
            let init = vd.vars[0].init.as_ref().expect("init");
            assert!(matches!(
                &init.kind,
                ExprKind::Ident(i) if i.symbol == Symbol::Unresolved
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn attribution_keeps_node_ids() {
    let unit = parse("class A { void f() { g(); } void g() {} }").expect("parses");
    let before = unit.classes[0].id;
    let attribution = attribute(&unit, &Classpath::jdk().expect("jdk"));
    assert_eq!(attribution.unit.classes[0].id, before);
    assert_eq!(attribution.unit.classes[0].ty, JavaType::class("A"));
}
