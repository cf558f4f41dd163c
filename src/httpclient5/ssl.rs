use std::sync::Arc;

use tracing::{debug, warn};

use rewrite_apache_core::matcher::MethodMatcher;
use rewrite_apache_core::recipe::{Recipe, RecipeDescriptor};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::template::{Coordinates, JavaTemplate, TemplateArg};
use rewrite_apache_core::tree::{
    Block, Expr, ExprKind, Ident, JavaType, MethodInvocation, Statement, Symbol, Tree,
};
use rewrite_apache_core::visitor::{
    JavaVisitor, VisitContext, super_block, super_method_invocation, walk_block, walk_statement,
};

use rewrite_apache_core::TemplateError;

use super::{calls, descriptor};
use crate::Error;

const FACTORY_4: &str = "org.apache.http.conn.ssl.SSLConnectionSocketFactory";
const FACTORY_5: &str = "org.apache.hc.client5.http.ssl.SSLConnectionSocketFactory";
const TLS_STRATEGY: &str = "org.apache.hc.client5.http.ssl.TlsSocketStrategy";
const DEFAULT_TLS_STRATEGY: &str = "org.apache.hc.client5.http.ssl.DefaultClientTlsStrategy";
const CONNECTION_MANAGER: &str = "org.apache.hc.client5.http.io.HttpClientConnectionManager";
const POOLING_BUILDER: &str = "org.apache.hc.client5.http.impl.io.PoolingHttpClientConnectionManagerBuilder";
const TLS_VAR: &str = "tlsSocketStrategy";
const MANAGER_VAR: &str = "cm";

/// Replaces an `SSLConnectionSocketFactory` handed to
/// `HttpClientBuilder.setSSLSocketFactory` with a `TlsSocketStrategy` set
/// on a pooling connection manager:
///
/// ```java
/// SSLConnectionSocketFactory factory = new SSLConnectionSocketFactory(sslContext);
/// return HttpClients.custom().setSSLSocketFactory(factory).build();
/// ```
///
/// becomes
///
/// ```java
/// TlsSocketStrategy tlsSocketStrategy = new DefaultClientTlsStrategy(sslContext);
/// HttpClientConnectionManager cm = PoolingHttpClientConnectionManagerBuilder.create().setTlsSocketStrategy(tlsSocketStrategy).build();
/// return HttpClients.custom().setConnectionManager(cm).build();
/// ```
///
/// A connection manager already declared in the block is reused.
#[derive(Debug, Clone)]
pub struct MigrateSSLConnectionSocketFactory {
    set_ssl_socket_factory: MethodMatcher,
    /// By constructor arity: the context alone, or with a hostname verifier.
    strategy: [JavaTemplate; 2],
    manager: JavaTemplate,
}

impl MigrateSSLConnectionSocketFactory {
    pub fn new() -> Result<Self, Error> {
        let strategy = |args: &str| {
            JavaTemplate::builder(&format!(
                "TlsSocketStrategy {TLS_VAR} = new DefaultClientTlsStrategy({args});"
            ))
            .imports(&[TLS_STRATEGY, DEFAULT_TLS_STRATEGY])
            .build()
        };
        Ok(Self {
            set_ssl_socket_factory: MethodMatcher::new("*..HttpClientBuilder setSSLSocketFactory(..)")?,
            strategy: [
                strategy("#{any(javax.net.ssl.SSLContext)}")?,
                strategy("#{any(javax.net.ssl.SSLContext)}, #{any()}")?,
            ],
            manager: JavaTemplate::builder(&format!(
                "HttpClientConnectionManager {MANAGER_VAR} = PoolingHttpClientConnectionManagerBuilder.create()\
                 .setTlsSocketStrategy(#{{any({TLS_STRATEGY})}}).build();"
            ))
            .imports(&[CONNECTION_MANAGER, POOLING_BUILDER])
            .build()?,
        })
    }
}

impl Recipe for MigrateSSLConnectionSocketFactory {
    fn descriptor(&self) -> RecipeDescriptor {
        descriptor(
            "MigrateSSLConnectionSocketFactory",
            "Migrate `SSLConnectionSocketFactory` to `DefaultClientTlsStrategy`",
            "`HttpClientBuilder.setSSLSocketFactory` is gone in 5.x. TLS is configured with a \
             `TlsSocketStrategy` on the connection manager.",
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::any(vec![
            Precondition::uses_type(FACTORY_4),
            Precondition::uses_type(FACTORY_5),
            Precondition::uses_type(TLS_STRATEGY),
        ])
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(TlsStrategy { recipe: self.clone() })
    }
}

struct TlsStrategy {
    recipe: MigrateSSLConnectionSocketFactory,
}

/// The single variable `statement` declares, if any.
fn declared(statement: &Statement) -> Option<(&Arc<str>, &JavaType, Option<&Arc<Expr>>)> {
    let decls = statement.as_var_decls()?;
    let [var] = decls.vars.as_slice() else {
        return None;
    };
    Some((&var.name, &var.ty, var.init.as_ref()))
}

fn declares(statements: &[Arc<Statement>], name: &str) -> bool {
    statements
        .iter()
        .any(|statement| statement.as_var_decls().is_some_and(|decls| decls.declares(name)))
}

fn to_block(result: Result<Tree, TemplateError>, template: &JavaTemplate) -> Option<Arc<Block>> {
    match result {
        Ok(Tree::Block(block)) => Some(block),
        Ok(_) => None,
        Err(err) => {
            warn!(template = %template.code(), error = %err, "Template skipped");
            None
        }
    }
}

impl TlsStrategy {
    /// `TlsSocketStrategy tlsSocketStrategy = new DefaultClientTlsStrategy(..)`
    /// in place of a factory declaration.
    fn replace_factories(&self, block: Arc<Block>, ctx: &mut VisitContext<'_>) -> Arc<Block> {
        let mut statements = block.statements.clone();
        let mut changed = false;
        for index in 0..statements.len() {
            if declares(&statements, TLS_VAR) {
                break;
            }
            let Some((name, ty, Some(init))) = declared(&statements[index]) else {
                continue;
            };
            if !(ty.is_of_class(FACTORY_4) || ty.is_of_class(FACTORY_5)) {
                continue;
            }
            let Some(args) = init.as_new_class().map(|nc| nc.args.clone()) else {
                continue;
            };
            let Some(template) = args.len().checked_sub(1).and_then(|i| self.recipe.strategy.get(i)) else {
                continue;
            };
            let old_name = name.clone();
            let args: Vec<TemplateArg> = args.iter().map(TemplateArg::from).collect();
            let replaced = match template.apply(ctx, Coordinates::replace_statement(&statements[index]), &args) {
                Ok(Tree::Statement(statement)) => statement,
                Ok(_) => continue,
                Err(err) => {
                    warn!(template = %template.code(), error = %err, "Template skipped");
                    continue;
                }
            };
            debug!(var = %old_name, "Replaced SSLConnectionSocketFactory with DefaultClientTlsStrategy");
            statements[index] = replaced;
            changed = true;

            let mut rename = RenameLocal {
                from: old_name,
                to: Arc::from(TLS_VAR),
                ty: JavaType::class(TLS_STRATEGY),
            };
            for later in statements.iter_mut().skip(index + 1) {
                if let Some(renamed) = walk_statement(&mut rename, later, ctx) {
                    *later = renamed;
                }
            }
            ctx.maybe_add_import(TLS_STRATEGY);
            ctx.maybe_add_import(DEFAULT_TLS_STRATEGY);
            ctx.maybe_remove_import(FACTORY_4);
            ctx.maybe_remove_import(FACTORY_5);
        }
        if !changed {
            return block;
        }
        Arc::new(block.with_statements(statements))
    }

    /// The block's TLS strategy variable, if it declares one.
    fn strategy_var(block: &Block) -> Option<(usize, Arc<str>, JavaType)> {
        block.statements.iter().enumerate().find_map(|(index, statement)| {
            let (name, ty, _) = declared(statement)?;
            ty.is_of_class(TLS_STRATEGY)
                .then(|| (index, name.clone(), ty.clone()))
        })
    }

    /// The block's connection manager variable, if it declares one.
    fn manager_var(block: &Block, ctx: &VisitContext<'_>) -> Option<(Arc<str>, JavaType)> {
        block.statements.iter().find_map(|statement| {
            let (name, ty, _) = declared(statement)?;
            ctx.classpath()
                .is_assignable(ty, &JavaType::class(CONNECTION_MANAGER))
                .then(|| (name.clone(), ty.clone()))
        })
    }

    /// Declares a pooling manager with the TLS strategy in front of the
    /// first `setSSLSocketFactory` call that follows the strategy.
    fn declare_manager(&self, block: Arc<Block>, ctx: &mut VisitContext<'_>) -> Arc<Block> {
        let Some((index, name, ty)) = TlsStrategy::strategy_var(&block) else {
            return block;
        };
        if TlsStrategy::manager_var(&block, ctx).is_some() {
            return block;
        }
        let Some(anchor) = block
            .statements
            .iter()
            .skip(index + 1)
            .find(|statement| calls(statement, &self.recipe.set_ssl_socket_factory, ctx))
            .cloned()
        else {
            return block;
        };
        let strategy = Arc::new(Expr::ident(name, Symbol::Local, ty));
        let template = &self.recipe.manager;
        let result = template.apply(ctx, Coordinates::before(&block, &anchor), &[TemplateArg::from(strategy)]);
        let Some(declared) = to_block(result, template) else {
            return block;
        };
        ctx.maybe_add_import(CONNECTION_MANAGER);
        ctx.maybe_add_import(POOLING_BUILDER);
        declared
    }

    /// `setSSLSocketFactory(strategy)` to `setConnectionManager(cm)`.
    fn hand_over_manager(&self, block: Arc<Block>, ctx: &mut VisitContext<'_>) -> Arc<Block> {
        let Some((name, ty)) = TlsStrategy::manager_var(&block, ctx) else {
            return block;
        };
        let mut hand_over = HandOverManager {
            matcher: &self.recipe.set_ssl_socket_factory,
            manager: Arc::new(Expr::ident(name, Symbol::Local, ty)),
        };
        walk_block(&mut hand_over, &block, ctx)
    }
}

impl JavaVisitor for TlsStrategy {
    fn visit_block(&mut self, block: &Arc<Block>, ctx: &mut VisitContext<'_>) -> Arc<Block> {
        let block = super_block(self, block, ctx);
        let block = self.replace_factories(block, ctx);
        if TlsStrategy::strategy_var(&block).is_none() {
            return block;
        }
        let block = self.declare_manager(block, ctx);
        self.hand_over_manager(block, ctx)
    }
}

/// Renames reads of a local variable.
struct RenameLocal {
    from: Arc<str>,
    to: Arc<str>,
    ty: JavaType,
}

impl JavaVisitor for RenameLocal {
    fn visit_ident(&mut self, expr: &Arc<Expr>, _ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        match expr.as_ident() {
            Some(ident) if ident.name == self.from && ident.symbol == Symbol::Local => {
                let renamed = expr.with_kind(ExprKind::Ident(Ident {
                    name: self.to.clone(),
                    symbol: Symbol::Local,
                }));
                Arc::new(renamed.with_ty(self.ty.clone()))
            }
            _ => expr.clone(),
        }
    }
}

struct HandOverManager<'r> {
    matcher: &'r MethodMatcher,
    manager: Arc<Expr>,
}

impl JavaVisitor for HandOverManager<'_> {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        if !self.matcher.matches_invocation_in(&expr, ctx.classpath()) {
            return expr;
        }
        let Some(mi) = expr.as_invocation() else {
            return expr;
        };
        if !mi.args.first().is_some_and(|arg| arg.ty.is_of_class(TLS_STRATEGY)) {
            return expr;
        }
        let method_type = mi
            .select
            .as_ref()
            .and_then(|select| select.ty.fqn())
            .and_then(|owner| {
                ctx.classpath()
                    .find_method(owner, "setConnectionManager", &[self.manager.ty.clone()])
            });
        let ty = method_type.as_ref().map_or_else(|| expr.ty.clone(), |m| m.ret.clone());
        let rewritten = expr.with_kind(ExprKind::MethodInvocation(MethodInvocation {
            name: Arc::from("setConnectionManager"),
            args: vec![self.manager.clone()],
            method_type,
            ..mi.clone()
        }));
        Arc::new(rewritten.with_ty(ty))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::httpclient5::relocated;
    use crate::{artifacts, rewrite};

    fn run(source: &str) -> String {
        let classpath = artifacts::bundled().expect("bundled classpath");
        let recipe = relocated(MigrateSSLConnectionSocketFactory::new().expect("recipe"));
        rewrite(&recipe, source, &classpath).expect("rewrite")
    }

    #[test]
    fn factory_becomes_strategy_on_a_new_manager() {
        let before = indoc! {r#"
            import javax.net.ssl.SSLContext;

            import org.apache.http.conn.ssl.SSLConnectionSocketFactory;
            import org.apache.http.impl.client.CloseableHttpClient;
            import org.apache.http.impl.client.HttpClients;

            class A {
                CloseableHttpClient client(SSLContext sslContext) {
                    SSLConnectionSocketFactory sslSocketFactory = new SSLConnectionSocketFactory(sslContext);
                    return HttpClients.custom().setSSLSocketFactory(sslSocketFactory).build();
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import javax.net.ssl.SSLContext;

                import org.apache.hc.client5.http.impl.classic.CloseableHttpClient;
                import org.apache.hc.client5.http.impl.classic.HttpClients;
                import org.apache.hc.client5.http.impl.io.PoolingHttpClientConnectionManagerBuilder;
                import org.apache.hc.client5.http.io.HttpClientConnectionManager;
                import org.apache.hc.client5.http.ssl.DefaultClientTlsStrategy;
                import org.apache.hc.client5.http.ssl.TlsSocketStrategy;

                class A {
                    CloseableHttpClient client(SSLContext sslContext) {
                        TlsSocketStrategy tlsSocketStrategy = new DefaultClientTlsStrategy(sslContext);
                        HttpClientConnectionManager cm = PoolingHttpClientConnectionManagerBuilder.create().setTlsSocketStrategy(tlsSocketStrategy).build();
                        return HttpClients.custom().setConnectionManager(cm).build();
                    }
                }
            "#}
        );
    }

    #[test]
    fn lone_factory_becomes_strategy() {
        let before = indoc! {r#"
            import javax.net.ssl.HostnameVerifier;
            import javax.net.ssl.SSLContext;

            import org.apache.http.conn.ssl.SSLConnectionSocketFactory;

            class A {
                void f(SSLContext sslContext, HostnameVerifier verifier) {
                    SSLConnectionSocketFactory factory = new SSLConnectionSocketFactory(sslContext, verifier);
                }
            }
        "#};
        assert_eq!(
            run(before),
            indoc! {r#"
                import org.apache.hc.client5.http.ssl.DefaultClientTlsStrategy;
                import org.apache.hc.client5.http.ssl.TlsSocketStrategy;

                import javax.net.ssl.HostnameVerifier;
                import javax.net.ssl.SSLContext;

                class A {
                    void f(SSLContext sslContext, HostnameVerifier verifier) {
                        TlsSocketStrategy tlsSocketStrategy = new DefaultClientTlsStrategy(sslContext, verifier);
                    }
                }
            "#}
        );
    }
}
