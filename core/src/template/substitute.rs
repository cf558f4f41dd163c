//! Filling placeholders of an attributed fragment with argument trees.

use std::sync::Arc;

use crate::tree::{
    Assign, Binary, BinaryOp, Cast, Expr, ExprKind, FieldAccess, If, Lambda,
    MethodInvocation, NamedVariable, NewClass, NodeId, Statement, StatementKind, Ternary, Unary,
    VariableDeclarations,
};

/// Binding strength of an expression's outermost operator. Higher binds
/// tighter; primaries are 15.
pub(crate) fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Lambda(_) => 0,
        ExprKind::Assign(_) => 1,
        ExprKind::Ternary(_) => 2,
        ExprKind::Binary(b) => match b.op {
            BinaryOp::Or => 3,
            BinaryOp::And => 4,
            BinaryOp::Eq | BinaryOp::Ne => 8,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 9,
            BinaryOp::Add | BinaryOp::Sub => 11,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 12,
        },
        ExprKind::Unary(_) | ExprKind::Cast(_) => 13,
        _ => 15,
    }
}

/// Lowest precedence an expression may have to sit as child `child` of
/// `parent` without parentheses.
pub(crate) fn required_precedence(parent: &Expr, child: NodeId) -> u8 {
    match &parent.kind {
        ExprKind::Binary(b) if b.left.id == child => precedence(parent),
        ExprKind::Binary(_) => precedence(parent) + 1,
        ExprKind::Unary(_) | ExprKind::Cast(_) => 13,
        ExprKind::MethodInvocation(mi) => match &mi.select {
            Some(select) if select.id == child => 15,
            _ => 0,
        },
        ExprKind::FieldAccess(_) => 15,
        ExprKind::Ternary(t) if t.cond.id == child => 3,
        ExprKind::Ternary(_) => 2,
        ExprKind::Assign(a) if a.target.id == child => 15,
        ExprKind::Assign(_) => 1,
        _ => 0,
    }
}

pub(crate) fn has_child(parent: &Expr, id: NodeId) -> bool {
    let is = |e: &Arc<Expr>| e.id == id;
    match &parent.kind {
        ExprKind::FieldAccess(fa) => is(&fa.target),
        ExprKind::MethodInvocation(mi) => mi.select.as_ref().is_some_and(is) || mi.args.iter().any(is),
        ExprKind::NewClass(nc) => nc.args.iter().any(is),
        ExprKind::Binary(b) => is(&b.left) || is(&b.right),
        ExprKind::Unary(u) => is(&u.operand),
        ExprKind::Parens(inner) => is(inner),
        ExprKind::Ternary(t) => is(&t.cond) || is(&t.then) || is(&t.otherwise),
        ExprKind::Cast(c) => is(&c.expr),
        ExprKind::Assign(a) => is(&a.target) || is(&a.value),
        ExprKind::Lambda(l) => is(&l.body),
        _ => false,
    }
}

/// Wraps `expr` in parentheses when it binds looser than `required`.
pub(crate) fn parenthesize(expr: Arc<Expr>, required: u8) -> Arc<Expr> {
    if precedence(&expr) >= required {
        return expr;
    }
    let ty = expr.ty.clone();
    Arc::new(Expr::new(ExprKind::Parens(expr), ty))
}

/// Replaces `#{N}` nodes with `args[N]`. Argument trees are shared, not
/// copied.
pub(crate) struct Filler<'a> {
    pub args: &'a [Option<Arc<Expr>>],
}

impl Filler<'_> {
    pub fn expr(&self, expr: &Arc<Expr>, required: u8) -> Arc<Expr> {
        let kind = match &expr.kind {
            ExprKind::Placeholder(index) => {
                return match self.args.get(*index).cloned().flatten() {
                    Some(arg) => parenthesize(arg, required),
                    None => expr.clone(),
                };
            }
            ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::ClassLiteral(_) => {
                return expr.clone();
            }
            ExprKind::FieldAccess(fa) => ExprKind::FieldAccess(FieldAccess {
                target: self.expr(&fa.target, 15),
                ..fa.clone()
            }),
            ExprKind::MethodInvocation(mi) => ExprKind::MethodInvocation(MethodInvocation {
                select: mi.select.as_ref().map(|s| self.expr(s, 15)),
                args: self.exprs(&mi.args),
                ..mi.clone()
            }),
            ExprKind::NewClass(nc) => ExprKind::NewClass(NewClass {
                args: self.exprs(&nc.args),
                ..nc.clone()
            }),
            ExprKind::Binary(b) => {
                let p = precedence(expr);
                ExprKind::Binary(Binary {
                    op: b.op,
                    left: self.expr(&b.left, p),
                    right: self.expr(&b.right, p + 1),
                })
            }
            ExprKind::Unary(u) => ExprKind::Unary(Unary {
                op: u.op,
                operand: self.expr(&u.operand, 13),
            }),
            ExprKind::Parens(inner) => ExprKind::Parens(self.expr(inner, 0)),
            ExprKind::Ternary(t) => ExprKind::Ternary(Ternary {
                cond: self.expr(&t.cond, 3),
                then: self.expr(&t.then, 2),
                otherwise: self.expr(&t.otherwise, 2),
            }),
            ExprKind::Cast(c) => ExprKind::Cast(Cast {
                class: c.class.clone(),
                expr: self.expr(&c.expr, 13),
            }),
            ExprKind::Assign(a) => ExprKind::Assign(Assign {
                target: self.expr(&a.target, 15),
                value: self.expr(&a.value, 1),
            }),
            ExprKind::Lambda(l) => ExprKind::Lambda(Lambda {
                body: self.expr(&l.body, 0),
                ..l.clone()
            }),
        };
        Arc::new(expr.with_kind(kind))
    }

    pub fn exprs(&self, exprs: &[Arc<Expr>]) -> Vec<Arc<Expr>> {
        exprs.iter().map(|e| self.expr(e, 0)).collect()
    }

    pub fn statement(&self, statement: &Arc<Statement>) -> Arc<Statement> {
        let kind = match &statement.kind {
            StatementKind::Expr(e) => StatementKind::Expr(self.expr(e, 0)),
            StatementKind::VarDecls(vd) => StatementKind::VarDecls(Arc::new(VariableDeclarations {
                vars: vd
                    .vars
                    .iter()
                    .map(|var| NamedVariable {
                        init: var.init.as_ref().map(|e| self.expr(e, 0)),
                        ..var.clone()
                    })
                    .collect(),
                ..VariableDeclarations::clone(vd)
            })),
            StatementKind::Return(e) => StatementKind::Return(e.as_ref().map(|e| self.expr(e, 0))),
            StatementKind::Throw(e) => StatementKind::Throw(self.expr(e, 0)),
            StatementKind::If(if_) => StatementKind::If(If {
                cond: self.expr(&if_.cond, 0),
                then: self.statement(&if_.then),
                otherwise: if_.otherwise.as_ref().map(|s| self.statement(s)),
            }),
            StatementKind::Block(b) => StatementKind::Block(Arc::new(
                b.with_statements(b.statements.iter().map(|s| self.statement(s)).collect()),
            )),
            StatementKind::Method(_) | StatementKind::Class(_) => return statement.clone(),
        };
        Arc::new(statement.with_kind(kind))
    }
}
