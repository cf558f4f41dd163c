//! Depth-first traversal and rewriting of Java trees.
//!
//! A [`JavaVisitor`] has one `visit_*` method per node kind. Each default
//! delegates to the matching `super_*` function, which visits the children
//! and rebuilds the node only when a child changed. Overriding a method and
//! calling `super_*` from it gives pre- or post-order hooks:
//!
//! ```
//! use std::sync::Arc;
//! use rewrite_apache_core::tree::Expr;
//! use rewrite_apache_core::visitor::{JavaVisitor, VisitContext, super_method_invocation};
//!
//! struct CountCalls(usize);
//!
//! impl JavaVisitor for CountCalls {
//!     fn visit_method_invocation(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
//!         self.0 += 1;
//!         super_method_invocation(self, expr, ctx)
//!     }
//! }
//! ```
//!
//! The cursor in [`VisitContext`] is pushed by the traversal: inside a
//! `visit_*` method it points at the node being visited.

mod context;
mod cursor;
mod imports;

use std::sync::Arc;

use crate::tree::{
    Assign, Binary, Block, Cast, ClassDecl, CompilationUnit, Expr, ExprKind, FieldAccess, If,
    Lambda, MethodDecl, MethodInvocation, NamedVariable, NewClass, Statement, StatementKind,
    Ternary, Tree, TypeTree, Unary, VariableDeclarations,
};

pub use context::VisitContext;
pub use cursor::Cursor;
pub use imports::{ImportEdits, TypeReferences};

pub trait JavaVisitor {
    fn visit_compilation_unit(
        &mut self,
        unit: &Arc<CompilationUnit>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<CompilationUnit> {
        super_compilation_unit(self, unit, ctx)
    }

    fn visit_class(&mut self, class: &Arc<ClassDecl>, ctx: &mut VisitContext<'_>) -> Arc<ClassDecl> {
        super_class(self, class, ctx)
    }

    fn visit_method(
        &mut self,
        method: &Arc<MethodDecl>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<MethodDecl> {
        super_method(self, method, ctx)
    }

    fn visit_block(&mut self, block: &Arc<Block>, ctx: &mut VisitContext<'_>) -> Arc<Block> {
        super_block(self, block, ctx)
    }

    /// Returning `None` removes the statement from its block.
    fn visit_statement(
        &mut self,
        statement: &Arc<Statement>,
        ctx: &mut VisitContext<'_>,
    ) -> Option<Arc<Statement>> {
        super_statement(self, statement, ctx)
    }

    fn visit_var_decls(
        &mut self,
        decls: &Arc<VariableDeclarations>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<VariableDeclarations> {
        super_var_decls(self, decls, ctx)
    }

    fn visit_type_tree(&mut self, tree: &TypeTree, ctx: &mut VisitContext<'_>) -> TypeTree {
        super_type_tree(self, tree, ctx)
    }

    fn visit_expr(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_expr(self, expr, ctx)
    }

    fn visit_literal(&mut self, expr: &Arc<Expr>, _ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        expr.clone()
    }

    fn visit_ident(&mut self, expr: &Arc<Expr>, _ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        expr.clone()
    }

    fn visit_field_access(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_field_access(self, expr, ctx)
    }

    fn visit_method_invocation(
        &mut self,
        expr: &Arc<Expr>,
        ctx: &mut VisitContext<'_>,
    ) -> Arc<Expr> {
        super_method_invocation(self, expr, ctx)
    }

    fn visit_new_class(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_new_class(self, expr, ctx)
    }

    fn visit_binary(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_binary(self, expr, ctx)
    }

    fn visit_unary(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_unary(self, expr, ctx)
    }

    fn visit_parens(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_parens(self, expr, ctx)
    }

    fn visit_ternary(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_ternary(self, expr, ctx)
    }

    fn visit_cast(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_cast(self, expr, ctx)
    }

    fn visit_assign(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_assign(self, expr, ctx)
    }

    fn visit_lambda(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_lambda(self, expr, ctx)
    }

    fn visit_class_literal(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        super_class_literal(self, expr, ctx)
    }
}

// ============================================================================
// Walking: push the child on the cursor, visit it, pop.
// ============================================================================

/// Visits a whole compilation unit.
pub fn visit_unit<V: JavaVisitor + ?Sized>(
    v: &mut V,
    unit: &Arc<CompilationUnit>,
    ctx: &mut VisitContext<'_>,
) -> Arc<CompilationUnit> {
    ctx.cursor.push(Tree::CompilationUnit(unit.clone()));
    let result = v.visit_compilation_unit(unit, ctx);
    ctx.cursor.pop();
    result
}

pub fn walk_class<V: JavaVisitor + ?Sized>(
    v: &mut V,
    class: &Arc<ClassDecl>,
    ctx: &mut VisitContext<'_>,
) -> Arc<ClassDecl> {
    ctx.cursor.push(Tree::Class(class.clone()));
    let result = v.visit_class(class, ctx);
    ctx.cursor.pop();
    result
}

pub fn walk_method<V: JavaVisitor + ?Sized>(
    v: &mut V,
    method: &Arc<MethodDecl>,
    ctx: &mut VisitContext<'_>,
) -> Arc<MethodDecl> {
    ctx.cursor.push(Tree::Method(method.clone()));
    let result = v.visit_method(method, ctx);
    ctx.cursor.pop();
    result
}

pub fn walk_block<V: JavaVisitor + ?Sized>(
    v: &mut V,
    block: &Arc<Block>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Block> {
    ctx.cursor.push(Tree::Block(block.clone()));
    let result = v.visit_block(block, ctx);
    ctx.cursor.pop();
    result
}

pub fn walk_statement<V: JavaVisitor + ?Sized>(
    v: &mut V,
    statement: &Arc<Statement>,
    ctx: &mut VisitContext<'_>,
) -> Option<Arc<Statement>> {
    ctx.cursor.push(Tree::Statement(statement.clone()));
    let result = v.visit_statement(statement, ctx);
    ctx.cursor.pop();
    result
}

pub fn walk_var_decls<V: JavaVisitor + ?Sized>(
    v: &mut V,
    decls: &Arc<VariableDeclarations>,
    ctx: &mut VisitContext<'_>,
) -> Arc<VariableDeclarations> {
    ctx.cursor.push(Tree::VarDecls(decls.clone()));
    let result = v.visit_var_decls(decls, ctx);
    ctx.cursor.pop();
    result
}

pub fn walk_expr<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    ctx.cursor.push(Tree::Expr(expr.clone()));
    let result = v.visit_expr(expr, ctx);
    ctx.cursor.pop();
    result
}

fn walk_exprs<V: JavaVisitor + ?Sized>(
    v: &mut V,
    exprs: &[Arc<Expr>],
    ctx: &mut VisitContext<'_>,
) -> Option<Vec<Arc<Expr>>> {
    let visited: Vec<Arc<Expr>> = exprs.iter().map(|e| walk_expr(v, e, ctx)).collect();
    (!same_all(exprs, &visited)).then_some(visited)
}

fn walk_type_trees<V: JavaVisitor + ?Sized>(
    v: &mut V,
    trees: &[TypeTree],
    ctx: &mut VisitContext<'_>,
) -> Vec<TypeTree> {
    trees.iter().map(|t| v.visit_type_tree(t, ctx)).collect()
}

/// Whether two child lists hold the very same nodes.
pub fn same_all<T>(a: &[Arc<T>], b: &[Arc<T>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
}

fn same_opt<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

// ============================================================================
// Declarations
// ============================================================================

pub fn super_compilation_unit<V: JavaVisitor + ?Sized>(
    v: &mut V,
    unit: &Arc<CompilationUnit>,
    ctx: &mut VisitContext<'_>,
) -> Arc<CompilationUnit> {
    let classes: Vec<Arc<ClassDecl>> = unit.classes.iter().map(|c| walk_class(v, c, ctx)).collect();
    if same_all(&unit.classes, &classes) {
        return unit.clone();
    }
    Arc::new(CompilationUnit {
        classes,
        ..CompilationUnit::clone(unit)
    })
}

pub fn super_class<V: JavaVisitor + ?Sized>(
    v: &mut V,
    class: &Arc<ClassDecl>,
    ctx: &mut VisitContext<'_>,
) -> Arc<ClassDecl> {
    let extends = class.extends.as_ref().map(|t| v.visit_type_tree(t, ctx));
    let implements = walk_type_trees(v, &class.implements, ctx);
    let body = walk_block(v, &class.body, ctx);
    if extends == class.extends && implements == class.implements && Arc::ptr_eq(&body, &class.body) {
        return class.clone();
    }
    Arc::new(ClassDecl {
        extends,
        implements,
        body,
        ..ClassDecl::clone(class)
    })
}

pub fn super_method<V: JavaVisitor + ?Sized>(
    v: &mut V,
    method: &Arc<MethodDecl>,
    ctx: &mut VisitContext<'_>,
) -> Arc<MethodDecl> {
    let return_type = method.return_type.as_ref().map(|t| v.visit_type_tree(t, ctx));
    let params: Vec<Arc<VariableDeclarations>> = method
        .params
        .iter()
        .map(|p| walk_var_decls(v, p, ctx))
        .collect();
    let throws = walk_type_trees(v, &method.throws, ctx);
    let body = method.body.as_ref().map(|b| walk_block(v, b, ctx));
    if return_type == method.return_type
        && same_all(&method.params, &params)
        && throws == method.throws
        && same_opt(&method.body, &body)
    {
        return method.clone();
    }
    Arc::new(MethodDecl {
        return_type,
        params,
        throws,
        body,
        ..MethodDecl::clone(method)
    })
}

pub fn super_block<V: JavaVisitor + ?Sized>(
    v: &mut V,
    block: &Arc<Block>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Block> {
    let statements: Vec<Arc<Statement>> = block
        .statements
        .iter()
        .filter_map(|s| walk_statement(v, s, ctx))
        .collect();
    if same_all(&block.statements, &statements) {
        return block.clone();
    }
    Arc::new(block.with_statements(statements))
}

pub fn super_var_decls<V: JavaVisitor + ?Sized>(
    v: &mut V,
    decls: &Arc<VariableDeclarations>,
    ctx: &mut VisitContext<'_>,
) -> Arc<VariableDeclarations> {
    let type_tree = v.visit_type_tree(&decls.type_tree, ctx);
    let mut changed = type_tree != decls.type_tree;
    let vars: Vec<NamedVariable> = decls
        .vars
        .iter()
        .map(|var| {
            let init = var.init.as_ref().map(|e| walk_expr(v, e, ctx));
            changed |= !same_opt(&var.init, &init);
            NamedVariable {
                init,
                ..var.clone()
            }
        })
        .collect();
    if !changed {
        return decls.clone();
    }
    Arc::new(VariableDeclarations {
        type_tree,
        vars,
        ..VariableDeclarations::clone(decls)
    })
}

pub fn super_type_tree<V: JavaVisitor + ?Sized>(
    v: &mut V,
    tree: &TypeTree,
    ctx: &mut VisitContext<'_>,
) -> TypeTree {
    match &tree.type_args {
        Some(args) => TypeTree {
            type_args: Some(walk_type_trees(v, args, ctx)),
            ..tree.clone()
        },
        None => tree.clone(),
    }
}

// ============================================================================
// Statements
// ============================================================================

/// A removed branch of an `if` becomes an empty block.
fn branch<V: JavaVisitor + ?Sized>(
    v: &mut V,
    statement: &Arc<Statement>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Statement> {
    walk_statement(v, statement, ctx).unwrap_or_else(|| {
        Arc::new(statement.with_kind(StatementKind::Block(Arc::new(Block::new(Vec::new())))))
    })
}

pub fn super_statement<V: JavaVisitor + ?Sized>(
    v: &mut V,
    statement: &Arc<Statement>,
    ctx: &mut VisitContext<'_>,
) -> Option<Arc<Statement>> {
    let kind = match &statement.kind {
        StatementKind::Expr(e) => {
            let visited = walk_expr(v, e, ctx);
            if Arc::ptr_eq(e, &visited) {
                return Some(statement.clone());
            }
            StatementKind::Expr(visited)
        }
        StatementKind::VarDecls(vd) => {
            let visited = walk_var_decls(v, vd, ctx);
            if Arc::ptr_eq(vd, &visited) {
                return Some(statement.clone());
            }
            StatementKind::VarDecls(visited)
        }
        StatementKind::Return(e) => {
            let visited = e.as_ref().map(|e| walk_expr(v, e, ctx));
            if same_opt(e, &visited) {
                return Some(statement.clone());
            }
            StatementKind::Return(visited)
        }
        StatementKind::Throw(e) => {
            let visited = walk_expr(v, e, ctx);
            if Arc::ptr_eq(e, &visited) {
                return Some(statement.clone());
            }
            StatementKind::Throw(visited)
        }
        StatementKind::If(if_) => {
            let cond = walk_expr(v, &if_.cond, ctx);
            let then = branch(v, &if_.then, ctx);
            let otherwise = if_.otherwise.as_ref().map(|s| branch(v, s, ctx));
            if Arc::ptr_eq(&cond, &if_.cond)
                && Arc::ptr_eq(&then, &if_.then)
                && same_opt(&if_.otherwise, &otherwise)
            {
                return Some(statement.clone());
            }
            StatementKind::If(If {
                cond,
                then,
                otherwise,
            })
        }
        StatementKind::Block(b) => {
            let visited = walk_block(v, b, ctx);
            if Arc::ptr_eq(b, &visited) {
                return Some(statement.clone());
            }
            StatementKind::Block(visited)
        }
        StatementKind::Method(m) => {
            let visited = walk_method(v, m, ctx);
            if Arc::ptr_eq(m, &visited) {
                return Some(statement.clone());
            }
            StatementKind::Method(visited)
        }
        StatementKind::Class(c) => {
            let visited = walk_class(v, c, ctx);
            if Arc::ptr_eq(c, &visited) {
                return Some(statement.clone());
            }
            StatementKind::Class(visited)
        }
    };
    Some(Arc::new(statement.with_kind(kind)))
}

// ============================================================================
// Expressions
// ============================================================================

pub fn super_expr<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Placeholder(_) => v.visit_literal(expr, ctx),
        ExprKind::Ident(_) => v.visit_ident(expr, ctx),
        ExprKind::FieldAccess(_) => v.visit_field_access(expr, ctx),
        ExprKind::MethodInvocation(_) => v.visit_method_invocation(expr, ctx),
        ExprKind::NewClass(_) => v.visit_new_class(expr, ctx),
        ExprKind::Binary(_) => v.visit_binary(expr, ctx),
        ExprKind::Unary(_) => v.visit_unary(expr, ctx),
        ExprKind::Parens(_) => v.visit_parens(expr, ctx),
        ExprKind::Ternary(_) => v.visit_ternary(expr, ctx),
        ExprKind::Cast(_) => v.visit_cast(expr, ctx),
        ExprKind::Assign(_) => v.visit_assign(expr, ctx),
        ExprKind::Lambda(_) => v.visit_lambda(expr, ctx),
        ExprKind::ClassLiteral(_) => v.visit_class_literal(expr, ctx),
    }
}

fn rebuilt(expr: &Arc<Expr>, kind: ExprKind) -> Arc<Expr> {
    Arc::new(expr.with_kind(kind))
}

pub fn super_field_access<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::FieldAccess(fa) = &expr.kind else {
        return expr.clone();
    };
    let target = walk_expr(v, &fa.target, ctx);
    if Arc::ptr_eq(&target, &fa.target) {
        return expr.clone();
    }
    rebuilt(
        expr,
        ExprKind::FieldAccess(FieldAccess {
            target,
            ..fa.clone()
        }),
    )
}

pub fn super_method_invocation<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::MethodInvocation(mi) = &expr.kind else {
        return expr.clone();
    };
    let select = mi.select.as_ref().map(|s| walk_expr(v, s, ctx));
    let args = walk_exprs(v, &mi.args, ctx);
    if same_opt(&mi.select, &select) && args.is_none() {
        return expr.clone();
    }
    rebuilt(
        expr,
        ExprKind::MethodInvocation(MethodInvocation {
            select,
            args: args.unwrap_or_else(|| mi.args.clone()),
            ..mi.clone()
        }),
    )
}

pub fn super_new_class<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::NewClass(nc) = &expr.kind else {
        return expr.clone();
    };
    let class = v.visit_type_tree(&nc.class, ctx);
    let args = walk_exprs(v, &nc.args, ctx);
    if class == nc.class && args.is_none() {
        return expr.clone();
    }
    rebuilt(
        expr,
        ExprKind::NewClass(NewClass {
            class,
            args: args.unwrap_or_else(|| nc.args.clone()),
            constructor: nc.constructor.clone(),
        }),
    )
}

pub fn super_binary<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::Binary(b) = &expr.kind else {
        return expr.clone();
    };
    let left = walk_expr(v, &b.left, ctx);
    let right = walk_expr(v, &b.right, ctx);
    if Arc::ptr_eq(&left, &b.left) && Arc::ptr_eq(&right, &b.right) {
        return expr.clone();
    }
    rebuilt(expr, ExprKind::Binary(Binary { op: b.op, left, right }))
}

pub fn super_unary<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::Unary(u) = &expr.kind else {
        return expr.clone();
    };
    let operand = walk_expr(v, &u.operand, ctx);
    if Arc::ptr_eq(&operand, &u.operand) {
        return expr.clone();
    }
    rebuilt(expr, ExprKind::Unary(Unary { op: u.op, operand }))
}

pub fn super_parens<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::Parens(inner) = &expr.kind else {
        return expr.clone();
    };
    let visited = walk_expr(v, inner, ctx);
    if Arc::ptr_eq(&visited, inner) {
        return expr.clone();
    }
    rebuilt(expr, ExprKind::Parens(visited))
}

pub fn super_ternary<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::Ternary(t) = &expr.kind else {
        return expr.clone();
    };
    let cond = walk_expr(v, &t.cond, ctx);
    let then = walk_expr(v, &t.then, ctx);
    let otherwise = walk_expr(v, &t.otherwise, ctx);
    if Arc::ptr_eq(&cond, &t.cond) && Arc::ptr_eq(&then, &t.then) && Arc::ptr_eq(&otherwise, &t.otherwise) {
        return expr.clone();
    }
    rebuilt(
        expr,
        ExprKind::Ternary(Ternary {
            cond,
            then,
            otherwise,
        }),
    )
}

pub fn super_cast<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::Cast(c) = &expr.kind else {
        return expr.clone();
    };
    let class = v.visit_type_tree(&c.class, ctx);
    let inner = walk_expr(v, &c.expr, ctx);
    if class == c.class && Arc::ptr_eq(&inner, &c.expr) {
        return expr.clone();
    }
    rebuilt(expr, ExprKind::Cast(Cast { class, expr: inner }))
}

pub fn super_assign<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::Assign(a) = &expr.kind else {
        return expr.clone();
    };
    let target = walk_expr(v, &a.target, ctx);
    let value = walk_expr(v, &a.value, ctx);
    if Arc::ptr_eq(&target, &a.target) && Arc::ptr_eq(&value, &a.value) {
        return expr.clone();
    }
    rebuilt(expr, ExprKind::Assign(Assign { target, value }))
}

pub fn super_lambda<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::Lambda(l) = &expr.kind else {
        return expr.clone();
    };
    let body = walk_expr(v, &l.body, ctx);
    if Arc::ptr_eq(&body, &l.body) {
        return expr.clone();
    }
    rebuilt(
        expr,
        ExprKind::Lambda(Lambda {
            body,
            ..l.clone()
        }),
    )
}

pub fn super_class_literal<V: JavaVisitor + ?Sized>(
    v: &mut V,
    expr: &Arc<Expr>,
    ctx: &mut VisitContext<'_>,
) -> Arc<Expr> {
    let ExprKind::ClassLiteral(tree) = &expr.kind else {
        return expr.clone();
    };
    let visited = v.visit_type_tree(tree, ctx);
    if visited == *tree {
        return expr.clone();
    }
    rebuilt(expr, ExprKind::ClassLiteral(visited))
}

#[cfg(test)]
mod visitor_test;
