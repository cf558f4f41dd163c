use std::sync::Arc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::printer::print;
use crate::recipe::ExecutionContext;
use crate::test_utils::attributed;
use crate::tree::{JavaType, MethodInvocation, Symbol};

const STUBS: &str = indoc! {r#"
    package com.acme;

    public class Config {
        public static Config load();
        public void start();
    }

    public class Util {
        public static String name();
    }
"#};

fn visit(source: &str, visitor: &mut dyn JavaVisitor) -> (Arc<CompilationUnit>, Arc<CompilationUnit>) {
    let (unit, classpath) = attributed(source, &[("acme", STUBS)]);
    let exec = ExecutionContext::new(classpath);
    let mut ctx = VisitContext::new(&exec, &unit);
    let after = visit_unit(visitor, &unit, &mut ctx);
    let after = ctx.finish(after);
    (unit, after)
}

const SOURCE: &str = indoc! {r#"
    import com.acme.Config;

    class A {
        void run() {
            Config config = Config.load();
            config.start();
        }
    }
"#};

struct Noop;

impl JavaVisitor for Noop {}

#[test]
fn untouched_unit_is_returned_as_is() {
    let (before, after) = visit(SOURCE, &mut Noop);
    assert!(Arc::ptr_eq(&before, &after));
}

#[derive(Default)]
struct Enclosing(Vec<(String, Option<String>, usize)>);

impl JavaVisitor for Enclosing {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let name = expr.simple_name().unwrap_or_default().to_string();
        let method = ctx.cursor.first_enclosing_method().map(|m| m.name.to_string());
        self.0.push((name, method, ctx.cursor.visible_locals().len()));
        super_method_invocation(self, expr, ctx)
    }
}

#[test]
fn cursor_knows_the_enclosing_method_and_locals() {
    let mut visitor = Enclosing::default();
    visit(SOURCE, &mut visitor);
    assert_eq!(
        visitor.0,
        vec![
            ("load".to_string(), Some("run".to_string()), 0),
            ("start".to_string(), Some("run".to_string()), 1),
        ]
    );
}

/// Counts the calls of each method through a message on the method's frame.
#[derive(Default)]
struct CallsPerMethod(Vec<(String, usize)>);

const CALLS: &str = "calls";

impl JavaVisitor for CallsPerMethod {
    fn visit_method(&mut self, method: &Arc<MethodDecl>, ctx: &mut VisitContext<'_>) -> Arc<MethodDecl> {
        ctx.cursor.put_message(CALLS, 0usize);
        let method = super_method(self, method, ctx);
        let calls = ctx.cursor.poll_nearest_message::<usize>(CALLS).unwrap_or_default();
        self.0.push((method.name.to_string(), calls));
        assert!(ctx.cursor.get_nearest_message::<usize>(CALLS).is_none());
        method
    }

    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if let Some(calls) = ctx.cursor.get_nearest_message_mut::<usize>(CALLS) {
            *calls += 1;
        }
        super_method_invocation(self, expr, ctx)
    }
}

#[test]
fn method_messages_reach_nested_invocations() {
    let source = indoc! {r#"
        import com.acme.Config;
        import com.acme.Util;

        class A {
            void run() {
                Config config = Config.load();
                config.start();
            }

            String name() {
                return Util.name();
            }
        }
    "#};
    let mut visitor = CallsPerMethod::default();
    visit(source, &mut visitor);
    assert_eq!(
        visitor.0,
        vec![("run".to_string(), 2), ("name".to_string(), 1)]
    );
}

struct DropStarts;

impl JavaVisitor for DropStarts {
    fn visit_statement(
        &mut self,
        statement: &Arc<Statement>,
        ctx: &mut VisitContext<'_>,
    ) -> Option<Arc<Statement>> {
        let statement = super_statement(self, statement, ctx)?;
        let is_start = statement
            .as_expr()
            .and_then(|e| e.as_invocation())
            .is_some_and(|mi| &*mi.name == "start");
        (!is_start).then_some(statement)
    }
}

#[test]
fn returning_none_removes_the_statement() {
    let (_, after) = visit(SOURCE, &mut DropStarts);
    assert_eq!(
        print(&after),
        indoc! {r#"
            import com.acme.Config;

            class A {
                void run() {
                    Config config = Config.load();
                }
            }
        "#}
    );
}

/// Replaces `config.start()` with `Util.name()`, leaving the import to the
/// import edits.
struct StartToName {
    queue_follow_up: bool,
}

impl JavaVisitor for StartToName {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        if expr.simple_name() != Some("start") {
            return expr;
        }
        let util = Expr::ident("Util", Symbol::Type, JavaType::class("com.acme.Util"));
        ctx.maybe_add_import("com.acme.Util");
        if self.queue_follow_up {
            ctx.do_after_visit(Box::new(DropStarts));
        }
        Arc::new(expr.with_kind(ExprKind::MethodInvocation(MethodInvocation {
            select: Some(Arc::new(util)),
            name: Arc::from("name"),
            args: Vec::new(),
            method_type: None,
            wrap: false,
        })))
    }
}

#[test]
fn requested_import_is_added_in_order() {
    let (_, after) = visit(SOURCE, &mut StartToName { queue_follow_up: false });
    assert_eq!(
        print(&after),
        indoc! {r#"
            import com.acme.Config;
            import com.acme.Util;

            class A {
                void run() {
                    Config config = Config.load();
                    Util.name();
                }
            }
        "#}
    );
}

struct RemoveConfigImport;

impl JavaVisitor for RemoveConfigImport {
    fn visit_compilation_unit(
        &mut self,
        unit: &Arc<CompilationUnit>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<CompilationUnit> {
        ctx.maybe_remove_import("com.acme.Config");
        ctx.maybe_remove_import("com.acme.Util");
        super_compilation_unit(self, unit, ctx)
    }
}

#[test]
fn referenced_import_survives_removal() {
    let (before, after) = visit(SOURCE, &mut RemoveConfigImport);
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn follow_up_visitor_sees_the_rewritten_unit() {
    let (_, after) = visit(SOURCE, &mut StartToName { queue_follow_up: true });
    // The follow-up drops `start()` calls, of which none remain.
    assert!(print(&after).contains("Util.name();"));
}

/// Queues itself again on every pass.
struct Requeue;

impl JavaVisitor for Requeue {
    fn visit_compilation_unit(
        &mut self,
        unit: &Arc<CompilationUnit>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<CompilationUnit> {
        ctx.do_after_visit(Box::new(Requeue));
        super_compilation_unit(self, unit, ctx)
    }
}

#[test]
fn follow_up_rounds_are_bounded() {
    let (before, after) = visit(SOURCE, &mut Requeue);
    assert!(Arc::ptr_eq(&before, &after));
}
