use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::parser::parse;

fn round_trip(source: &str) {
    let unit = parse(source).expect("parses");
    assert_eq!(print(&unit), source);
}

#[test]
fn prints_header_and_import_groups() {
    round_trip(indoc! {r#"
        package com.acme;

        import org.apache.http.HttpHost;
        import org.apache.http.client.config.RequestConfig;

        import java.util.List;
        import javax.net.ssl.SSLContext;

        import static java.util.Objects.requireNonNull;

        public class A {
        }
    "#});
}

#[test]
fn prints_members_with_blank_lines_and_comments() {
    round_trip(indoc! {r#"
        @Deprecated
        public abstract class A extends B implements C, D {
            private static final int SIZE = 10;
            private String a, b = "x";

            // note
            public A(String a) throws Exception {
                this.a = a;
            }

            protected abstract void run(String[] args);

            static class Inner {
            }
        }
    "#});
}

#[test]
fn prints_interfaces_and_enums() {
    round_trip(indoc! {r#"
        interface Shape extends Comparable<Shape>, Cloneable {
            double area();
        }

        enum Color {
            RED, GREEN;

            int rgb() {
                return 0;
            }
        }
    "#});
}

#[test]
fn prints_statements() {
    round_trip(indoc! {r#"
        class A {
            int f(String s, int n) {
                if (s == null || s.isEmpty()) {
                    return -1;
                } else if (n > 0) {
                    throw new IllegalArgumentException("n");
                }
                if (n == 0)
                    return 0;

                /* checked */
                {
                    n = n + 1;
                }
                return n;
            }
        }
    "#});
}

#[test]
fn prints_generic_declarations() {
    round_trip(indoc! {r#"
        public class Box<T extends Comparable<T> & Cloneable> implements Supplier<T> {
            public static <K, V> Map<K, V> of(K key, V value) {
                return null;
            }

            <U> Box(U seed) {
            }
        }

        interface Source<T> {
            T next();
        }
    "#});
}

#[test]
fn prints_expressions() {
    round_trip(indoc! {r#"
        class A {
            void f() {
                Object a = !(x == null || x.isEmpty());
                Object b = (short) 700;
                Object c = flag ? "a" : "b";
                Object d = String.class;
                Object e = list.forEach(item -> item.run());
                Object f = map.compute((k, v) -> v);
                Object g = new StringBuilder(s).reverse().toString();
                Object h = 'c' + 1L + 2.5f + 0x1F;
            }
        }
    "#});
}

#[test]
fn prints_wrapped_chains_on_continuation_lines() {
    round_trip(indoc! {r#"
        class A {
            void f() {
                RequestConfig config = RequestConfig.custom()
                        .setConnectTimeout(100)
                        .build();
            }
        }
    "#});
}

#[test]
fn expression_comments_print_inline() {
    use crate::tree::Comment;

    let unit = parse("class A { void f() { int x = g(); } }").expect("parses");
    let class = &unit.classes[0];
    let StatementKind::Method(method) = &class.body.statements[0].kind else {
        panic!("method expected");
    };
    let statement = &method.body.as_ref().expect("body").statements[0];
    let StatementKind::VarDecls(vd) = &statement.kind else {
        panic!("declaration expected");
    };
    let init = vd.vars[0].init.as_ref().expect("init");
    let commented = init.with_comments(vec![Comment::new(" TODO: check ")]);
    assert_eq!(print_expr(&commented), "/* TODO: check */ g()");
    assert_eq!(print_statement(statement, 1), "    int x = g();");
}

#[test]
fn import_groups() {
    assert_eq!(ImportGroup::of(&Import::new("java.io.File")), ImportGroup::Java);
    assert_eq!(ImportGroup::of(&Import::new("javax.net.ssl.SSLContext")), ImportGroup::Java);
    assert_eq!(ImportGroup::of(&Import::new("org.slf4j.Logger")), ImportGroup::Other);
    let mut static_import = Import::new("java.util.Objects.equals");
    static_import.is_static = true;
    assert_eq!(ImportGroup::of(&static_import), ImportGroup::Static);
}
