//! Cheap whole-unit checks that gate a recipe's traversal.
//!
//! A precondition may accept a unit the recipe then leaves alone, but must
//! never reject one the recipe would change.

use core::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::matcher::{MethodMatcher, TypePattern};
use crate::tree::{CompilationUnit, Expr, JavaType, MethodDecl, TypeTree};
use crate::visitor::{
    JavaVisitor, VisitContext, super_expr, super_method, super_type_tree, visit_unit,
};

pub type UnitPredicate = Arc<dyn Fn(&CompilationUnit) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Precondition {
    Always,
    /// Some import, type reference, expression type or call binding names
    /// a class the pattern matches.
    UsesType(TypePattern),
    /// Some call, `new` expression or method declaration matches.
    UsesMethod(MethodMatcher),
    And(Vec<Precondition>),
    Or(Vec<Precondition>),
    Not(Box<Precondition>),
    Predicate(UnitPredicate),
}

impl Precondition {
    /// `UsesType` from a type pattern. A malformed pattern accepts every unit.
    pub fn uses_type(pattern: &str) -> Precondition {
        match TypePattern::new(pattern) {
            Some(pattern) => Precondition::UsesType(pattern),
            None => {
                debug!(pattern, "Malformed type pattern, precondition always holds");
                Precondition::Always
            }
        }
    }

    pub fn uses_method(matcher: MethodMatcher) -> Precondition {
        Precondition::UsesMethod(matcher)
    }

    pub fn any(conditions: Vec<Precondition>) -> Precondition {
        Precondition::Or(conditions)
    }

    pub fn all(conditions: Vec<Precondition>) -> Precondition {
        Precondition::And(conditions)
    }

    pub fn negate(condition: Precondition) -> Precondition {
        Precondition::Not(Box::new(condition))
    }

    pub fn predicate(f: impl Fn(&CompilationUnit) -> bool + Send + Sync + 'static) -> Precondition {
        Precondition::Predicate(Arc::new(f))
    }

    pub fn check(&self, unit: &Arc<CompilationUnit>, ctx: &mut VisitContext<'_>) -> bool {
        match self {
            Precondition::Always => true,
            Precondition::UsesType(pattern) => {
                let uses_import = unit.imports.iter().any(|import| {
                    let name = if import.is_static {
                        import.container()
                    } else {
                        &import.name
                    };
                    pattern.matches(name)
                });
                uses_import || {
                    let mut search = UsesType {
                        pattern,
                        found: false,
                    };
                    visit_unit(&mut search, unit, ctx);
                    search.found
                }
            }
            Precondition::UsesMethod(matcher) => {
                let mut search = UsesMethod {
                    matcher,
                    found: false,
                };
                visit_unit(&mut search, unit, ctx);
                search.found
            }
            Precondition::And(conditions) => conditions.iter().all(|c| c.check(unit, ctx)),
            Precondition::Or(conditions) => conditions.iter().any(|c| c.check(unit, ctx)),
            Precondition::Not(condition) => !condition.check(unit, ctx),
            Precondition::Predicate(f) => f(&**unit),
        }
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Always => f.write_str("Always"),
            Precondition::UsesType(pattern) => f.debug_tuple("UsesType").field(pattern).finish(),
            Precondition::UsesMethod(matcher) => {
                f.debug_tuple("UsesMethod").field(&matcher.pattern()).finish()
            }
            Precondition::And(c) => f.debug_tuple("And").field(c).finish(),
            Precondition::Or(c) => f.debug_tuple("Or").field(c).finish(),
            Precondition::Not(c) => f.debug_tuple("Not").field(c).finish(),
            Precondition::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

struct UsesType<'p> {
    pattern: &'p TypePattern,
    found: bool,
}

impl UsesType<'_> {
    fn mentions(&self, ty: &JavaType) -> bool {
        ty.base().fqn().is_some_and(|fqn| self.pattern.matches(fqn))
    }
}

impl JavaVisitor for UsesType<'_> {
    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> TypeTree {
        self.found |= self.mentions(&tree.ty);
        super_type_tree(self, tree, ctx)
    }

    fn visit_expr(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if self.found {
            return expr.clone();
        }
        self.found |= self.mentions(&expr.ty)
            || expr.method_type().is_some_and(|m| {
                self.pattern.matches(&m.declaring) || m.params.iter().any(|p| self.mentions(p))
            });
        super_expr(self, expr, ctx)
    }
}

struct UsesMethod<'m> {
    matcher: &'m MethodMatcher,
    found: bool,
}

impl JavaVisitor for UsesMethod<'_> {
    fn visit_method(&mut self, method: &Arc<MethodDecl>, ctx: &mut VisitContext<'_>) -> Arc<MethodDecl> {
        self.found |= method
            .method_type
            .as_ref()
            .is_some_and(|m| self.matcher.matches_method_in(m, ctx.classpath()));
        super_method(self, method, ctx)
    }

    fn visit_expr(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if self.found {
            return expr.clone();
        }
        self.found |= self.matcher.matches_invocation_in(expr, ctx.classpath());
        super_expr(self, expr, ctx)
    }
}

#[cfg(test)]
mod search_test;
