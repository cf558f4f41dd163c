use std::sync::Arc;

use tracing::{debug, warn};

use rewrite_apache_core::matcher::MethodMatcher;
use rewrite_apache_core::recipe::{Recipe, RecipeDescriptor};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::template::{Coordinates, JavaTemplate, TemplateArg};
use rewrite_apache_core::tree::{Block, Expr, JavaType, MethodDecl, Statement, Symbol, Tree};
use rewrite_apache_core::visitor::{
    JavaVisitor, VisitContext, super_method, super_method_invocation, super_statement, walk_block,
};

use super::descriptor;
use crate::Error;

const POOLING_4: &str = "org.apache.http.impl.conn.PoolingHttpClientConnectionManager";
const POOLING_5: &str = "org.apache.hc.client5.http.impl.io.PoolingHttpClientConnectionManager";
const TIME_VALUE: &str = "org.apache.hc.core5.util.TimeValue";
const MANAGER_VAR: &str = "poolingHttpClientConnectionManager";
/// Cursor message on a method frame: whether its body disabled the stale
/// check.
const STALE_CHECK_DISABLED: &str = "stale-check-disabled";

/// Moves a disabled stale connection check from `RequestConfig` to the
/// connection manager.
///
/// 5.x dropped `setStaleConnectionCheckEnabled`; connections are validated
/// after a period of inactivity instead, set on the pool. In a method that
/// calls `setStaleConnectionCheckEnabled(false)` the call is removed and
/// the pool declared in the method body gets
/// `setValidateAfterInactivity(TimeValue.NEG_ONE_MILLISECOND)`. Without such
/// a pool one is declared at the top of the body and handed to every
/// `HttpClientBuilder.setDefaultRequestConfig` call of the method.
#[derive(Debug, Clone)]
pub struct MigrateRequestConfig {
    stale_check: [MethodMatcher; 2],
    set_default_request_config: MethodMatcher,
    create_manager: JavaTemplate,
    validate: JavaTemplate,
    set_connection_manager: JavaTemplate,
}

impl MigrateRequestConfig {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            stale_check: [
                MethodMatcher::new(
                    "org.apache.http.client.config.RequestConfig.Builder setStaleConnectionCheckEnabled(boolean)",
                )?,
                MethodMatcher::new(
                    "org.apache.hc.client5.http.config.RequestConfig.Builder setStaleConnectionCheckEnabled(boolean)",
                )?,
            ],
            set_default_request_config: MethodMatcher::new("*..HttpClientBuilder setDefaultRequestConfig(..)")?,
            create_manager: JavaTemplate::builder(
                "PoolingHttpClientConnectionManager poolingHttpClientConnectionManager = new PoolingHttpClientConnectionManager();",
            )
            .imports(&[POOLING_5])
            .build()?,
            validate: JavaTemplate::builder("#{any()}.setValidateAfterInactivity(TimeValue.NEG_ONE_MILLISECOND);")
                .imports(&[TIME_VALUE])
                .build()?,
            set_connection_manager: JavaTemplate::builder("#{any()}.setConnectionManager(#{any()})").build()?,
        })
    }

    fn is_stale_check_disabled(&self, expr: &Expr, ctx: &VisitContext<'_>) -> bool {
        expr.as_invocation()
            .is_some_and(|mi| mi.args.first().is_some_and(|arg| arg.is_bool_literal(false)))
            && self
                .stale_check
                .iter()
                .any(|matcher| matcher.matches_invocation_in(expr, ctx.classpath()))
    }
}

impl Recipe for MigrateRequestConfig {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "MigrateRequestConfig",
            "Migrate `RequestConfig` to httpclient5",
            "Replace `setStaleConnectionCheckEnabled(false)` with \
             `setValidateAfterInactivity(TimeValue.NEG_ONE_MILLISECOND)` on the connection manager.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::any(
            self.stale_check
                .iter()
                .map(|matcher| Precondition::uses_method(matcher.clone()))
                .collect(),
        )
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(StaleCheck { recipe: self.clone() })
    }
}

struct StaleCheck {
    recipe: MigrateRequestConfig,
}

impl StaleCheck {
    /// Records on the enclosing method that its stale check goes away.
    fn mark_disabled(ctx: &mut VisitContext<'_>) {
        if let Some(disabled) = ctx.cursor.get_nearest_message_mut::<bool>(STALE_CHECK_DISABLED) {
            *disabled = true;
        }
    }

    /// `(name, type)` of a pool declared at the top level of `body`.
    fn declared_manager(body: &Block) -> Option<(Arc<str>, JavaType)> {
        body.statements.iter().find_map(|statement| {
            let decls = statement.as_var_decls()?;
            if !(decls.is_of_class(POOLING_4) || decls.is_of_class(POOLING_5)) {
                return None;
            }
            let var = decls.vars.first()?;
            Some((var.name.clone(), var.ty.clone()))
        })
    }

    fn apply_to_block(template: &JavaTemplate, ctx: &VisitContext<'_>, coordinates: Coordinates, args: &[TemplateArg]) -> Option<Arc<Block>> {
        match template.apply(ctx, coordinates, args) {
            Ok(Tree::Block(block)) => Some(block),
            Ok(_) => None,
            Err(err) => {
                warn!(template = %template.code(), error = %err, "Template skipped");
                None
            }
        }
    }

    /// `body` with the pool validating idle connections, plus whether the
    /// pool had to be declared.
    fn validate_after_inactivity(&self, body: &Arc<Block>, ctx: &mut VisitContext<'_>) -> Option<(Arc<Block>, bool)> {
        let (body, name, ty, created) = match StaleCheck::declared_manager(body) {
            Some((name, ty)) => (body.clone(), name, ty, false),
            None => {
                let body = StaleCheck::apply_to_block(
                    &self.recipe.create_manager,
                    ctx,
                    Coordinates::FirstStatement(body.clone()),
                    &[],
                )?;
                ctx.maybe_add_import(POOLING_5);
                (body, Arc::from(MANAGER_VAR), JavaType::class(POOLING_5), true)
            }
        };
        let anchor = body.statements.iter().find(|statement| {
            statement
                .as_var_decls()
                .is_some_and(|decls| decls.declares(&name))
        })?;
        let manager = Expr::ident(name, Symbol::Local, ty);
        let body = StaleCheck::apply_to_block(
            &self.recipe.validate,
            ctx,
            Coordinates::after(&body, anchor),
            &[TemplateArg::from(Arc::new(manager))],
        )?;
        ctx.maybe_add_import(TIME_VALUE);
        Some((body, created))
    }
}

impl JavaVisitor for StaleCheck {
    fn visit_method(&mut self, method: &Arc<MethodDecl>, ctx: &mut VisitContext<'_>) -> Arc<MethodDecl> {
        ctx.cursor.put_message(STALE_CHECK_DISABLED, false);
        let method = super_method(self, method, ctx);
        let disabled = ctx.cursor.poll_nearest_message::<bool>(STALE_CHECK_DISABLED);
        if disabled != Some(true) {
            return method;
        }
        let Some(body) = &method.body else {
            return method;
        };
        let Some((mut body, created)) = self.validate_after_inactivity(body, ctx) else {
            return method;
        };
        debug!(method = %method.name, created, "Validating pooled connections after inactivity");
        if created {
            let mut hand_over = HandOverManager {
                matcher: &self.recipe.set_default_request_config,
                template: &self.recipe.set_connection_manager,
            };
            body = walk_block(&mut hand_over, &body, ctx);
        }
        let mut rewritten = MethodDecl::clone(&method);
        rewritten.body = Some(body);
        Arc::new(rewritten)
    }

    fn visit_statement(&mut self, statement: &Arc<Statement>, ctx: &mut VisitContext<'_>) -> Option<Arc<Statement>> {
        if let Some(expr) = statement.as_expr()
            && self.recipe.is_stale_check_disabled(expr, ctx)
            && expr
                .as_invocation()
                .and_then(|mi| mi.select.as_ref())
                .is_some_and(|select| select.as_invocation().is_none())
        {
            StaleCheck::mark_disabled(ctx);
            return None;
        }
        super_statement(self, statement, ctx)
    }

    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        if !self.recipe.is_stale_check_disabled(&expr, ctx) {
            return expr;
        }
        let Some(select) = expr.as_invocation().and_then(|mi| mi.select.clone()) else {
            return expr;
        };
        if !ctx.classpath().is_assignable(&select.ty, &expr.ty) {
            return expr;
        }
        StaleCheck::mark_disabled(ctx);
        select
    }
}

/// Appends `.setConnectionManager(poolingHttpClientConnectionManager)` to
/// `setDefaultRequestConfig` calls.
struct HandOverManager<'r> {
    matcher: &'r MethodMatcher,
    template: &'r JavaTemplate,
}

impl JavaVisitor for HandOverManager<'_> {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        if !self.matcher.matches_invocation_in(&expr, ctx.classpath()) {
            return expr;
        }
        let manager = Expr::ident(MANAGER_VAR, Symbol::Local, JavaType::class(POOLING_5));
        self.template
            .replace(ctx, &expr, &[TemplateArg::from(&expr), TemplateArg::from(Arc::new(manager))])
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{artifacts, rewrite};

    fn run(source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        let recipe = MigrateRequestConfig::new().expect("recipe");
        rewrite(&recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn declares_a_validating_pool_when_none_exists() {
        let before = indoc! {r#"
            import org.apache.http.client.config.RequestConfig;
            import org.apache.http.impl.client.CloseableHttpClient;
            import org.apache.http.impl.client.HttpClientBuilder;

            class A {
                CloseableHttpClient client() {
                    RequestConfig requestConfig = RequestConfig.custom().setStaleConnectionCheckEnabled(false).build();

                    return HttpClientBuilder.create()
                            .setDefaultRequestConfig(requestConfig)
                            .build();
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import org.apache.hc.client5.http.impl.io.PoolingHttpClientConnectionManager;
                import org.apache.hc.core5.util.TimeValue;
                import org.apache.http.client.config.RequestConfig;
                import org.apache.http.impl.client.CloseableHttpClient;
                import org.apache.http.impl.client.HttpClientBuilder;

                class A {
                    CloseableHttpClient client() {
                        PoolingHttpClientConnectionManager poolingHttpClientConnectionManager = new PoolingHttpClientConnectionManager();
                        poolingHttpClientConnectionManager.setValidateAfterInactivity(TimeValue.NEG_ONE_MILLISECOND);
                        RequestConfig requestConfig = RequestConfig.custom().build();

                        return HttpClientBuilder.create()
                                .setDefaultRequestConfig(requestConfig).setConnectionManager(poolingHttpClientConnectionManager)
                                .build();
                    }
                }
            "#}
        );
    }

    #[test]
    fn configures_the_pool_already_declared() {
        let before = indoc! {r#"
            import org.apache.http.client.config.RequestConfig;
            import org.apache.http.impl.conn.PoolingHttpClientConnectionManager;

            class A {
                RequestConfig config() {
                    PoolingHttpClientConnectionManager cm = new PoolingHttpClientConnectionManager();
                    cm.setMaxTotal(10);
                    RequestConfig.Builder builder = RequestConfig.custom();
                    builder.setStaleConnectionCheckEnabled(false);
                    return builder.build();
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import org.apache.hc.core5.util.TimeValue;
                import org.apache.http.client.config.RequestConfig;
                import org.apache.http.impl.conn.PoolingHttpClientConnectionManager;

                class A {
                    RequestConfig config() {
                        PoolingHttpClientConnectionManager cm = new PoolingHttpClientConnectionManager();
                        cm.setValidateAfterInactivity(TimeValue.NEG_ONE_MILLISECOND);
                        cm.setMaxTotal(10);
                        RequestConfig.Builder builder = RequestConfig.custom();
                        return builder.build();
                    }
                }
            "#}
        );
    }

    #[test]
    fn only_the_method_disabling_the_check_gets_a_pool() {
        let before = indoc! {r#"
            import org.apache.http.client.config.RequestConfig;
            import org.apache.http.impl.conn.PoolingHttpClientConnectionManager;

            class A {
                void pool() {
                    PoolingHttpClientConnectionManager cm = new PoolingHttpClientConnectionManager();
                }

                void config(PoolingHttpClientConnectionManager shared, RequestConfig.Builder builder) {
                    PoolingHttpClientConnectionManager local = shared;
                    builder.setStaleConnectionCheckEnabled(false);
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import org.apache.hc.core5.util.TimeValue;
                import org.apache.http.client.config.RequestConfig;
                import org.apache.http.impl.conn.PoolingHttpClientConnectionManager;

                class A {
                    void pool() {
                        PoolingHttpClientConnectionManager cm = new PoolingHttpClientConnectionManager();
                    }

                    void config(PoolingHttpClientConnectionManager shared, RequestConfig.Builder builder) {
                        PoolingHttpClientConnectionManager local = shared;
                        local.setValidateAfterInactivity(TimeValue.NEG_ONE_MILLISECOND);
                    }
                }
            "#}
        );
    }

    #[test]
    fn enabled_stale_check_is_left_alone() {
        let before = indoc! {r#"
            import org.apache.http.client.config.RequestConfig;

            class A {
                RequestConfig config() {
                    return RequestConfig.custom().setStaleConnectionCheckEnabled(true).build();
                }
            }
        "#};
        assert_eq!(run(before), before);
    }
}
