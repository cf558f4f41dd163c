use std::sync::Arc;

use tracing::trace;

use crate::errors::PatternSyntaxError;
use crate::matcher::MethodMatcher;
use crate::recipe::{Recipe, RecipeDescriptor};
use crate::search::Precondition;
use crate::tree::{Expr, ExprKind, MethodDecl, MethodInvocation};
use crate::visitor::{JavaVisitor, VisitContext, super_method, super_method_invocation};

/// Renames the calls a method pattern matches, and the declarations of
/// matching methods.
#[derive(Debug, Clone)]
pub struct ChangeMethodName {
    matcher: MethodMatcher,
    new_name: Arc<str>,
}

impl ChangeMethodName {
    pub fn new(pattern: &str, new_name: &str) -> Result<Self, PatternSyntaxError> {
        Ok(Self {
            matcher: MethodMatcher::new(pattern)?,
            new_name: Arc::from(new_name),
        })
    }

    /// Also rename calls that resolve to overrides of the matched method.
    pub fn match_overrides(mut self) -> Self {
        self.matcher = self.matcher.match_overrides(true);
        self
    }
}

impl Recipe for ChangeMethodName {
    fn descriptor(&self) -> RecipeDescriptor {
        RecipeDescriptor::new(
            "rewrite.ChangeMethodName",
            "Change method name",
            format!("Rename `{}` to `{}`.", self.matcher.pattern(), self.new_name),
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_method(self.matcher.clone())
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(Rename {
            matcher: self.matcher.clone(),
            new_name: self.new_name.clone(),
        })
    }
}

struct Rename {
    matcher: MethodMatcher,
    new_name: Arc<str>,
}

impl JavaVisitor for Rename {
    fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_method_invocation(self, expr, ctx);
        let ExprKind::MethodInvocation(mi) = &expr.kind else {
            return expr;
        };
        if mi.name == self.new_name || !self.matcher.matches_invocation_in(&expr, ctx.classpath()) {
            return expr;
        }
        trace!(from = %mi.name, to = %self.new_name, "Renaming call");
        Arc::new(expr.with_kind(ExprKind::MethodInvocation(MethodInvocation {
            name: self.new_name.clone(),
            method_type: mi
                .method_type
                .as_ref()
                .map(|m| Arc::new(m.with_name(self.new_name.clone()))),
            ..mi.clone()
        })))
    }

    fn visit_method(&mut self, method: &Arc<MethodDecl>, ctx: &mut VisitContext<'_>) -> Arc<MethodDecl> {
        let method = super_method(self, method, ctx);
        let Some(method_type) = &method.method_type else {
            return method;
        };
        if method.name == self.new_name || !self.matcher.matches_method_in(method_type, ctx.classpath()) {
            return method;
        }
        Arc::new(MethodDecl {
            name: self.new_name.clone(),
            method_type: Some(Arc::new(method_type.with_name(self.new_name.clone()))),
            ..MethodDecl::clone(&method)
        })
    }
}
