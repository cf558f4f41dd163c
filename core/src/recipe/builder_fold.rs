use std::sync::Arc;

use tracing::debug;

use crate::errors::PatternSyntaxError;
use crate::matcher::MethodMatcher;
use crate::recipe::{Recipe, RecipeDescriptor};
use crate::search::Precondition;
use crate::tree::{
    Block, Expr, ExprKind, JavaType, MethodInvocation, Statement, StatementKind, Symbol,
    VariableDeclarations,
};
use crate::visitor::{JavaVisitor, VisitContext, super_block};

/// Moves setter calls on an object fresh out of a builder into the builder
/// chain that made it.
///
/// In a block, a declaration `X x = <chain>.build()` opens a run; each
/// following statement `x.setter(args)` whose setter has a builder
/// counterpart joins it. The first other statement closes the run, and
/// nothing after it folds. Folded calls go before `.build()` in their
/// original order, with their argument trees unchanged.
#[derive(Debug, Clone)]
pub struct FoldIntoBuilder {
    descriptor: RecipeDescriptor,
    builder: Arc<str>,
    build: MethodMatcher,
    /// `(method on the built object, builder method)`.
    setters: Arc<[(Arc<str>, Arc<str>)]>,
}

impl FoldIntoBuilder {
    pub fn new(
        descriptor: RecipeDescriptor,
        builder: &str,
        setters: &[(&str, &str)],
    ) -> Result<Self, PatternSyntaxError> {
        Ok(Self {
            descriptor,
            builder: Arc::from(builder),
            build: MethodMatcher::new(&format!("{builder} build()"))?,
            setters: setters
                .iter()
                .map(|(from, to)| (Arc::from(*from), Arc::from(*to)))
                .collect(),
        })
    }
}

impl Recipe for FoldIntoBuilder {
    fn descriptor(&self) -> RecipeDescriptor {
        self.descriptor.clone()
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_type(&self.builder)
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(Fold {
            recipe: self.clone(),
        })
    }
}

struct Run {
    /// Position of the declaration in the output statements.
    index: usize,
    var: Arc<str>,
    calls: Vec<(Arc<str>, Vec<Arc<Expr>>)>,
    /// The statements `calls` came from, put back if the fold fails.
    folded: Vec<Arc<Statement>>,
}

struct Fold {
    recipe: FoldIntoBuilder,
}

impl Fold {
    /// The variable `statement` declares from a matching `build()` call.
    fn built_variable(&self, statement: &Statement, ctx: &VisitContext<'_>) -> Option<Arc<str>> {
        let decls = statement.as_var_decls()?;
        decls
            .vars
            .iter()
            .filter(|var| {
                var.init
                    .as_ref()
                    .is_some_and(|init| self.recipe.build.matches_invocation_in(init, ctx.classpath()))
            })
            .map(|var| var.name.clone())
            .next_back()
    }

    /// `var.setter(args)` as the builder call it folds into.
    fn foldable(&self, statement: &Statement, var: &str) -> Option<(Arc<str>, Vec<Arc<Expr>>)> {
        let mi = statement.as_expr()?.as_invocation()?;
        let receiver = mi.select.as_ref()?.as_ident()?;
        if &*receiver.name != var || receiver.symbol != Symbol::Local {
            return None;
        }
        let (_, builder_method) = self.recipe.setters.iter().find(|(from, _)| *from == mi.name)?;
        Some((builder_method.clone(), mi.args.clone()))
    }

    /// `init` with `calls` chained in front of its `build()`.
    fn rethread(
        &self,
        init: &Arc<Expr>,
        calls: Vec<(Arc<str>, Vec<Arc<Expr>>)>,
        ctx: &VisitContext<'_>,
    ) -> Option<Arc<Expr>> {
        let build = init.as_invocation()?;
        let mut chain = build.select.clone()?;
        for (name, args) in calls {
            let arg_types: Vec<JavaType> = args.iter().map(|arg| arg.ty.clone()).collect();
            let method_type = ctx.classpath().find_method(&self.recipe.builder, &name, &arg_types);
            let ty = method_type
                .as_ref()
                .map_or_else(|| JavaType::class(self.recipe.builder.clone()), |m| m.ret.clone());
            chain = Arc::new(Expr::new(
                ExprKind::MethodInvocation(MethodInvocation {
                    select: Some(chain),
                    name,
                    args,
                    method_type,
                    wrap: true,
                }),
                ty,
            ));
        }
        Some(Arc::new(init.with_kind(ExprKind::MethodInvocation(MethodInvocation {
            select: Some(chain),
            wrap: true,
            ..build.clone()
        }))))
    }

    /// Rewrites the declaration that opened `run`. Returns whether anything
    /// folded.
    fn close(&self, statements: &mut Vec<Arc<Statement>>, run: Option<Run>, ctx: &VisitContext<'_>) -> bool {
        let Some(run) = run else {
            return false;
        };
        if run.calls.is_empty() {
            return false;
        }
        match self.fold(&statements[run.index], &run.var, run.calls, ctx) {
            Some(folded) => {
                debug!(var = %run.var, "Folded setters into builder chain");
                statements[run.index] = folded;
                true
            }
            None => {
                statements.extend(run.folded);
                false
            }
        }
    }

    fn fold(
        &self,
        declaration: &Statement,
        var: &str,
        calls: Vec<(Arc<str>, Vec<Arc<Expr>>)>,
        ctx: &VisitContext<'_>,
    ) -> Option<Arc<Statement>> {
        let mut decls = VariableDeclarations::clone(declaration.as_var_decls()?);
        let target = decls.vars.iter_mut().find(|v| &*v.name == var)?;
        target.init = Some(self.rethread(target.init.as_ref()?, calls, ctx)?);
        Some(Arc::new(declaration.with_kind(StatementKind::VarDecls(Arc::new(decls)))))
    }
}

impl JavaVisitor for Fold {
    fn visit_block(&mut self, block: &Arc<Block>, ctx: &mut VisitContext<'_>) -> Arc<Block> {
        let block = super_block(self, block, ctx);
        let mut statements: Vec<Arc<Statement>> = Vec::with_capacity(block.statements.len());
        let mut run: Option<Run> = None;
        let mut changed = false;

        for statement in &block.statements {
            if let Some(open) = &mut run
                && let Some(call) = self.foldable(statement, &open.var)
            {
                open.calls.push(call);
                open.folded.push(statement.clone());
                continue;
            }
            changed |= self.close(&mut statements, run.take(), ctx);
            if let Some(var) = self.built_variable(statement, ctx) {
                run = Some(Run {
                    index: statements.len(),
                    var,
                    calls: Vec::new(),
                    folded: Vec::new(),
                });
            }
            statements.push(statement.clone());
        }
        changed |= self.close(&mut statements, run.take(), ctx);

        if !changed {
            return block;
        }
        Arc::new(block.with_statements(statements))
    }
}
