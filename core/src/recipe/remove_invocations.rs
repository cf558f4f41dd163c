use std::sync::Arc;

use tracing::debug;

use crate::errors::PatternSyntaxError;
use crate::matcher::MethodMatcher;
use crate::recipe::{Recipe, RecipeDescriptor};
use crate::search::Precondition;
use crate::tree::{Expr, ExprKind, MethodInvocation, Statement, StatementKind};
use crate::visitor::{JavaVisitor, VisitContext, super_method_invocation, super_statement};

/// Deletes calls a method pattern matches.
///
/// In a fluent chain the call is cut out when its receiver can stand in for
/// its result, so `b.setX(1).setY(2)` without `setX` reads `b.setY(2)`. A
/// matching call that is a whole statement on a plain receiver removes the
/// statement; on a call receiver only the receiver is kept.
#[derive(Debug, Clone)]
pub struct RemoveMethodInvocations {
    matcher: MethodMatcher,
}

impl RemoveMethodInvocations {
    pub fn new(pattern: &str) -> Result<Self, PatternSyntaxError> {
        Ok(Self {
            matcher: MethodMatcher::new(pattern)?,
        })
    }
}

impl Recipe for RemoveMethodInvocations {
    fn descriptor(&self) -> RecipeDescriptor {
        RecipeDescriptor::new(
            "rewrite.RemoveMethodInvocations",
            "Remove method invocations",
            format!("Remove calls to `{}`.", self.matcher.pattern()),
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_method(self.matcher.clone())
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(Remove {
            matcher: self.matcher.clone(),
        })
    }
}

struct Remove {
    matcher: MethodMatcher,
}

impl Remove {
    /// The receiver of `expr` when `expr` is a matching chain link.
    fn unlink(&self, expr: &Expr, ctx: &VisitContext<'_>) -> Option<Arc<Expr>> {
        let select = expr.as_invocation()?.select.as_ref()?;
        let fluent = ctx.classpath().is_assignable(&select.ty, &expr.ty);
        (fluent && self.matcher.matches_invocation_in(expr, ctx.classpath())).then(|| select.clone())
    }
}

impl JavaVisitor for Remove {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        let ExprKind::MethodInvocation(mi) = &expr.kind else {
            return expr;
        };
        let Some(select) = &mi.select else {
            return expr;
        };
        let mut receiver = select.clone();
        while let Some(inner) = self.unlink(&receiver, ctx) {
            debug!(call = ?receiver.simple_name(), "Removing chained call");
            receiver = inner;
        }
        if Arc::ptr_eq(&receiver, select) {
            return expr;
        }
        Arc::new(expr.with_kind(ExprKind::MethodInvocation(MethodInvocation {
            select: Some(receiver),
            ..mi.clone()
        })))
    }

    fn visit_statement(
        &mut self,
        statement: &Arc<Statement>,
        ctx: &mut VisitContext<'_>,
    ) -> Option<Arc<Statement>> {
        let statement = super_statement(self, statement, ctx)?;
        let StatementKind::Expr(expr) = &statement.kind else {
            return Some(statement);
        };
        let Some(mi) = expr.as_invocation() else {
            return Some(statement);
        };
        if !self.matcher.matches_invocation_in(expr, ctx.classpath()) {
            return Some(statement);
        }
        match mi.select.as_ref().map(|s| &s.kind) {
            None | Some(ExprKind::Ident(_) | ExprKind::FieldAccess(_)) => {
                debug!(call = %mi.name, "Removing statement");
                None
            }
            Some(ExprKind::MethodInvocation(_) | ExprKind::NewClass(_)) => {
                let kept = mi.select.clone().map(StatementKind::Expr)?;
                Some(Arc::new(statement.with_kind(kept)))
            }
            Some(_) => Some(statement),
        }
    }
}
