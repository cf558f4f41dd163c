use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use rewrite_apache_core::matcher::MethodMatcher;
use rewrite_apache_core::recipe::{ChangeMethodName, ChangeType, Recipe, RecipeDescriptor};
use rewrite_apache_core::search::Precondition;
use rewrite_apache_core::tree::{
    ClassDecl, Expr, ExprKind, JavaType, MethodInvocation, Modifier, NamedVariable, NodeId, Statement,
    StatementKind, Symbol, TypeTree, VariableDeclarations,
};
use rewrite_apache_core::visitor::{
    JavaVisitor, VisitContext, super_class, super_method_invocation, super_statement,
};

use crate::Error;

const ABSTRACT_LOG_ENABLED: &str = "org.codehaus.plexus.logging.AbstractLogEnabled";
const PLEXUS_LOGGER: &str = "org.codehaus.plexus.logging.Logger";
const SLF4J_LOGGER: &str = "org.slf4j.Logger";
const LOGGER_FACTORY: &str = "org.slf4j.LoggerFactory";
const FIELD: &str = "logger";

/// Moves classes off Plexus `AbstractLogEnabled` onto an SLF4J logger
/// field.
///
/// ```java
/// class A extends AbstractLogEnabled {
///     void run() { getLogger().fatalError("boom"); }
/// }
/// ```
///
/// becomes
///
/// ```java
/// class A {
///     private static final Logger logger = LoggerFactory.getLogger(A.class);
///
///     void run() { logger.error("boom"); }
/// }
/// ```
///
/// Local variables named `logger` are dropped in favour of the field.
#[derive(Debug, Clone)]
pub struct AbstractLogEnabledToSlf4j {
    get_logger: MethodMatcher,
    plexus_logger: MethodMatcher,
}

impl AbstractLogEnabledToSlf4j {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            get_logger: MethodMatcher::new(&format!("{ABSTRACT_LOG_ENABLED} getLogger()"))?
                .match_overrides(true),
            plexus_logger: MethodMatcher::new(&format!("{PLEXUS_LOGGER} *(..)"))?,
        })
    }
}

impl Recipe for AbstractLogEnabledToSlf4j {
    fn descriptor(&self) -> RecipeDescriptor {
        RecipeDescriptor::new(
            "codehaus.plexus.AbstractLogEnabledToSlf4j",
            "Migrate from Plexus `AbstractLogEnabled` to SLF4J",
            "Introduce a SLF4J `Logger` field and replace calls to `getLogger()` with calls to the field.",
        )
        .with_tags(&["plexus", "slf4j", "logging"])
        .with_effort(Duration::from_secs(5 * 60))
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_type(ABSTRACT_LOG_ENABLED)
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(LoggerFieldVisitor {
            recipe: self.clone(),
            classes: Vec::new(),
            queued: false,
        })
    }
}

struct LoggerFieldVisitor {
    recipe: AbstractLogEnabledToSlf4j,
    /// Classes being migrated, innermost last.
    classes: Vec<Arc<str>>,
    queued: bool,
}

impl LoggerFieldVisitor {
    fn migrates(&self, class: &ClassDecl, ctx: &VisitContext<'_>) -> bool {
        let direct = class
            .extends
            .as_ref()
            .is_some_and(|tree| tree.ty.is_of_class(ABSTRACT_LOG_ENABLED));
        direct
            || class
                .ty
                .fqn()
                .is_some_and(|fqn| ctx.classpath().is_subtype(fqn, ABSTRACT_LOG_ENABLED))
    }

    /// `logger` read as the static field of the class being migrated.
    fn field_ref(&self, owner: &Arc<str>) -> Expr {
        Expr::ident(
            FIELD,
            Symbol::Field {
                owner: owner.clone(),
                is_static: true,
            },
            JavaType::class(PLEXUS_LOGGER),
        )
    }

    /// `private static final Logger logger = LoggerFactory.getLogger(A.class);`
    fn field(&self, class: &ClassDecl, ctx: &VisitContext<'_>) -> Statement {
        let class_literal = Expr::new(
            ExprKind::ClassLiteral(TypeTree::new(class.name.clone(), class.ty.clone())),
            JavaType::class("java.lang.Class"),
        );
        let factory = Expr::ident("LoggerFactory", Symbol::Type, JavaType::class(LOGGER_FACTORY));
        let method_type = ctx
            .classpath()
            .find_method(LOGGER_FACTORY, "getLogger", &[class_literal.ty.clone()]);
        let init = Expr::new(
            ExprKind::MethodInvocation(MethodInvocation {
                select: Some(Arc::new(factory)),
                name: Arc::from("getLogger"),
                args: vec![Arc::new(class_literal)],
                method_type,
                wrap: false,
            }),
            JavaType::class(SLF4J_LOGGER),
        );
        Statement::new(StatementKind::VarDecls(Arc::new(VariableDeclarations {
            id: NodeId::fresh(),
            modifiers: vec![Modifier::Private, Modifier::Static, Modifier::Final],
            type_tree: TypeTree::new("Logger", JavaType::class(SLF4J_LOGGER)),
            vars: vec![NamedVariable {
                name: Arc::from(FIELD),
                init: Some(Arc::new(init)),
                ty: JavaType::class(SLF4J_LOGGER),
            }],
        })))
    }

    /// Queues the renames and the type change that finish the migration.
    fn queue_follow_ups(&mut self, ctx: &mut VisitContext<'_>) {
        if self.queued {
            return;
        }
        self.queued = true;
        let renames = [
            ("fatalError(..)", "error"),
            ("isFatalErrorEnabled(..)", "isErrorEnabled"),
        ];
        for (method, new_name) in renames {
            match ChangeMethodName::new(&format!("{PLEXUS_LOGGER} {method}"), new_name) {
                Ok(rename) => ctx.do_after_visit(rename.visitor()),
                Err(err) => debug!(%err, "Skipping logger method rename"),
            }
        }
        ctx.do_after_visit(ChangeType::new(PLEXUS_LOGGER, SLF4J_LOGGER).visitor());
        ctx.maybe_add_import(SLF4J_LOGGER);
        ctx.maybe_add_import(LOGGER_FACTORY);
        ctx.maybe_remove_import(PLEXUS_LOGGER);
    }
}

fn declares_logger(statement: &Statement) -> bool {
    statement
        .as_var_decls()
        .is_some_and(|decls| decls.declares(FIELD))
}

impl JavaVisitor for LoggerFieldVisitor {
    fn visit_class(&mut self, class: &Arc<ClassDecl>, ctx: &mut VisitContext<'_>) -> Arc<ClassDecl> {
        if !self.migrates(class, ctx) {
            return super_class(self, class, ctx);
        }
        let Some(fqn) = class.ty.fqn().map(Arc::<str>::from) else {
            return super_class(self, class, ctx);
        };
        debug!(class = %fqn, "Migrating AbstractLogEnabled subclass");

        self.classes.push(fqn);
        let visited = super_class(self, class, ctx);
        self.classes.pop();

        let mut class = ClassDecl::clone(&visited);
        if class
            .extends
            .as_ref()
            .is_some_and(|tree| tree.ty.is_of_class(ABSTRACT_LOG_ENABLED))
        {
            class.extends = None;
            ctx.maybe_remove_import(ABSTRACT_LOG_ENABLED);
        }

        let mut members: Vec<Arc<Statement>> = Vec::with_capacity(class.body.statements.len() + 1);
        members.push(Arc::new(self.field(&class, ctx)));
        for (i, member) in class.body.statements.iter().enumerate() {
            if i == 0 && !member.blank_line_before {
                members.push(Arc::new(member.with_blank_line_before(true)));
            } else {
                members.push(member.clone());
            }
        }
        class.body = Arc::new(class.body.with_statements(members));

        self.queue_follow_ups(ctx);
        Arc::new(class)
    }

    fn visit_statement(
        &mut self,
        statement: &Arc<Statement>,
        ctx: &mut VisitContext<'_>,
    ) -> Option<Arc<Statement>> {
        if !self.classes.is_empty() && declares_logger(statement) {
            debug!("Dropping logger variable");
            return None;
        }
        super_statement(self, statement, ctx)
    }

    fn visit_ident(&mut self, expr: &Arc<Expr>, _ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let Some(owner) = self.classes.last() else {
            return expr.clone();
        };
        match expr.as_ident() {
            Some(ident) if &*ident.name == FIELD && ident.symbol == Symbol::Local => {
                Arc::new(self.field_ref(owner))
            }
            _ => expr.clone(),
        }
    }

    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        let Some(owner) = self.classes.last() else {
            return expr;
        };
        if self.recipe.get_logger.matches_invocation_in(&expr, ctx.classpath()) {
            return Arc::new(self.field_ref(owner));
        }
        match expr.as_invocation() {
            Some(mi) if mi.wrap && self.recipe.plexus_logger.matches_invocation_in(&expr, ctx.classpath()) => {
                Arc::new(expr.with_kind(ExprKind::MethodInvocation(MethodInvocation {
                    wrap: false,
                    ..mi.clone()
                })))
            }
            _ => expr,
        }
    }
}
