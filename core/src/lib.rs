//! Engine for source-to-source migrations of Java code.
//!
//! Sources are parsed into an immutable [`tree`], typed against a
//! [`classpath`] by [`attribution`], rewritten by [`recipe`]s and printed
//! back with [`printer`]. Recipes are built from [`matcher`]s, [`search`]
//! preconditions, [`template`]s and [`visitor`]s.

pub mod api;
pub mod attribution;
pub mod classpath;
pub mod errors;
pub mod matcher;
pub mod parser;
pub mod printer;
pub mod recipe;
pub mod search;
pub mod template;
pub mod tree;
pub mod visitor;

pub use errors::{ClasspathError, Error, PatternSyntaxError, TemplateError};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    use std::sync::Arc;

    use crate::attribution::attribute;
    use crate::classpath::Classpath;
    use crate::parser::parse;
    use crate::recipe::ExecutionContext;
    use crate::tree::{CompilationUnit, Expr};
    use crate::visitor::{
        JavaVisitor, VisitContext, super_method_invocation, super_new_class, visit_unit,
    };

    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_rewrite() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    /// The JDK subset plus the given `(artifact, source)` stub bundles.
    pub fn classpath(stubs: &[(&str, &str)]) -> Arc<Classpath> {
        let mut builder = Classpath::builder().with_jdk().expect("jdk stubs");
        for (artifact, source) in stubs {
            builder = builder.stubs(artifact, source).expect("test stubs");
        }
        Arc::new(builder.build())
    }

    /// Parses and attributes `source`.
    pub fn attributed(
        source: &str,
        stubs: &[(&str, &str)],
    ) -> (Arc<CompilationUnit>, Arc<Classpath>) {
        let classpath = classpath(stubs);
        let unit = parse(source).expect("source parses");
        (attribute(&unit, &classpath).unit, classpath)
    }

    /// Method invocations and `new` expressions, outermost first.
    pub fn invocations(unit: &Arc<CompilationUnit>, classpath: &Arc<Classpath>) -> Vec<Arc<Expr>> {
        #[derive(Default)]
        struct Collect(Vec<Arc<Expr>>);

        impl JavaVisitor for Collect {
            fn visit_method_invocation(
                &mut self,
                expr: &Arc<Expr>,
                ctx: &mut VisitContext<'_>,
            ) -> Arc<Expr> {
                self.0.push(expr.clone());
                super_method_invocation(self, expr, ctx)
            }

            fn visit_new_class(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
                self.0.push(expr.clone());
                super_new_class(self, expr, ctx)
            }
        }

        let exec = ExecutionContext::new(classpath.clone());
        let mut ctx = VisitContext::new(&exec, unit);
        let mut collect = Collect::default();
        visit_unit(&mut collect, unit, &mut ctx);
        collect.0
    }
}
