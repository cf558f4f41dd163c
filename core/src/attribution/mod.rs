//! Name and type resolution over a parsed compilation unit.
//!
//! Attribution rebuilds the tree with every expression typed, every name
//! bound to a [`Symbol`] and every call bound to a [`MethodType`]. Node ids
//! and spans are kept. What cannot be resolved stays `Unknown` and is
//! recorded as a warning on the [`AttributionReport`]; matchers treat such
//! nodes as non-matching.

mod report;

use std::sync::Arc;

use tracing::trace;

use crate::classpath::{Classpath, FieldInfo, OBJECT, TypeScope};
use crate::tree::{
    Assign, Binary, BinaryOp, Block, Cast, ClassDecl, CompilationUnit, Expr, ExprKind,
    FieldAccess, Ident, If, JavaType, Lambda, Literal, LiteralValue, MethodDecl,
    MethodInvocation, MethodType, NamedVariable, NewClass, Primitive, Statement, StatementKind,
    Symbol, Ternary, TypeTree, Unary, UnaryOp, VariableDeclarations,
};

pub use report::AttributionReport;

/// An attributed compilation unit together with what could not be resolved.
#[derive(Debug, Clone)]
pub struct Attribution {
    pub unit: Arc<CompilationUnit>,
    pub report: AttributionReport,
}

/// Attributes `unit` against `classpath`. The unit's own classes are added as
/// an overlay first.
pub fn attribute(unit: &CompilationUnit, classpath: &Classpath) -> Attribution {
    let classpath = classpath.with_overlay(&[unit]);
    let mut attributor = Attributor::new(TypeScope::for_unit(&classpath, unit), &[]);
    let unit = attributor.unit(unit);
    Attribution {
        unit: Arc::new(unit),
        report: attributor.into_report(),
    }
}

/// Walks a tree, resolving it in a [`TypeScope`] plus a stack of local
/// variable frames.
pub(crate) struct Attributor<'a> {
    scope: TypeScope<'a>,
    locals: Vec<Vec<(Arc<str>, JavaType)>>,
    /// Types of template slots, indexed by placeholder number.
    placeholders: &'a [JavaType],
    report: AttributionReport,
}

/// How a name in qualifier position was resolved.
#[derive(PartialEq)]
enum Qualifier {
    Value,
    Type,
    Package,
}

impl<'a> Attributor<'a> {
    pub(crate) fn new(scope: TypeScope<'a>, placeholders: &'a [JavaType]) -> Self {
        Self {
            scope,
            locals: vec![Vec::new()],
            placeholders,
            report: AttributionReport::default(),
        }
    }

    /// Makes variables of an enclosing context visible.
    pub(crate) fn declare_locals(&mut self, locals: impl IntoIterator<Item = (Arc<str>, JavaType)>) {
        if let Some(frame) = self.locals.last_mut() {
            frame.extend(locals);
        }
    }

    pub(crate) fn into_report(self) -> AttributionReport {
        self.report
    }

    fn lookup_local(&self, name: &str) -> Option<&JavaType> {
        self.locals
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(n, _)| &**n == name)
            .map(|(_, ty)| ty)
    }

    fn declare(&mut self, name: Arc<str>, ty: JavaType) {
        if let Some(frame) = self.locals.last_mut() {
            frame.push((name, ty));
        }
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.locals.push(Vec::new());
        let result = f(self);
        self.locals.pop();
        result
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub(crate) fn unit(&mut self, unit: &CompilationUnit) -> CompilationUnit {
        let classes = unit
            .classes
            .iter()
            .map(|class| {
                let fqn: Arc<str> = Arc::from(unit.qualify(&class.name));
                Arc::new(self.class_decl(class, fqn))
            })
            .collect();
        CompilationUnit {
            classes,
            ..unit.clone()
        }
    }

    fn class_decl(&mut self, class: &ClassDecl, fqn: Arc<str>) -> ClassDecl {
        self.scope.declare_type_params(&class.type_params);
        let extends = class.extends.as_ref().map(|t| self.type_tree(t));
        let implements = class.implements.iter().map(|t| self.type_tree(t)).collect();
        self.scope.enter(fqn.clone());
        let statements = class
            .body
            .statements
            .iter()
            .map(|member| {
                let kind = match &member.kind {
                    StatementKind::Class(nested) => {
                        let nested_fqn: Arc<str> = Arc::from(format!("{}.{}", fqn, nested.name));
                        StatementKind::Class(Arc::new(self.class_decl(nested, nested_fqn)))
                    }
                    StatementKind::Method(method) => {
                        StatementKind::Method(Arc::new(self.method_decl(method, &fqn)))
                    }
                    StatementKind::VarDecls(fields) => {
                        StatementKind::VarDecls(Arc::new(self.scoped(|a| a.var_decls(fields, false))))
                    }
                    _ => return member.clone(),
                };
                Arc::new(member.with_kind(kind))
            })
            .collect();
        self.scope.exit();
        self.scope.forget_type_params(class.type_params.len());
        ClassDecl {
            extends,
            implements,
            body: Arc::new(class.body.with_statements(statements)),
            ty: JavaType::Class(fqn),
            ..class.clone()
        }
    }

    fn method_decl(&mut self, method: &MethodDecl, owner: &Arc<str>) -> MethodDecl {
        self.scope.declare_type_params(&method.type_params);
        let return_type = method.return_type.as_ref().map(|t| self.type_tree(t));
        let throws = method.throws.iter().map(|t| self.type_tree(t)).collect();
        let method = self.scoped(|a| {
            let params: Vec<Arc<VariableDeclarations>> = method
                .params
                .iter()
                .map(|p| Arc::new(a.var_decls(p, true)))
                .collect();
            let param_types: Vec<JavaType> =
                params.iter().map(|p| p.type_tree.ty.clone()).collect();
            let method_type = a.declared_method(owner, method, &param_types);
            let body = method
                .body
                .as_ref()
                .map(|body| Arc::new(a.block(body)));
            MethodDecl {
                return_type,
                params,
                throws,
                body,
                method_type,
                ..method.clone()
            }
        });
        self.scope.forget_type_params(method.type_params.len());
        method
    }

    fn declared_method(
        &self,
        owner: &str,
        method: &MethodDecl,
        params: &[JavaType],
    ) -> Option<Arc<MethodType>> {
        let info = self.scope.classpath().class(owner)?;
        let candidates = if method.is_constructor() {
            &info.constructors
        } else {
            &info.methods
        };
        candidates
            .iter()
            .find(|m| (method.is_constructor() || m.name == method.name) && m.params == params)
            .cloned()
    }

    fn var_decls(&mut self, decls: &VariableDeclarations, local: bool) -> VariableDeclarations {
        let type_tree = self.type_tree(&decls.type_tree);
        let ty = type_tree.ty.clone();
        let vars = decls
            .vars
            .iter()
            .map(|var| {
                let init = var.init.as_ref().map(|e| self.expr(e));
                if local {
                    self.declare(var.name.clone(), ty.clone());
                }
                NamedVariable {
                    name: var.name.clone(),
                    init,
                    ty: ty.clone(),
                }
            })
            .collect();
        VariableDeclarations {
            type_tree,
            vars,
            ..decls.clone()
        }
    }

    fn type_tree(&mut self, tree: &TypeTree) -> TypeTree {
        let ty = self.scope.resolve_type_tree(tree);
        if ty.base().is_unknown() && !tree.name.starts_with('?') {
            self.report.unresolved_type(&tree.name, None);
        }
        TypeTree {
            type_args: tree
                .type_args
                .as_ref()
                .map(|args| args.iter().map(|a| self.type_tree(a)).collect()),
            ty,
            ..tree.clone()
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub(crate) fn block(&mut self, block: &Block) -> Block {
        self.scoped(|a| {
            let statements = block.statements.iter().map(|s| a.statement(s)).collect();
            block.with_statements(statements)
        })
    }

    pub(crate) fn statement(&mut self, statement: &Statement) -> Arc<Statement> {
        let kind = match &statement.kind {
            StatementKind::Expr(e) => StatementKind::Expr(self.expr(e)),
            StatementKind::VarDecls(vd) => StatementKind::VarDecls(Arc::new(self.var_decls(vd, true))),
            StatementKind::Return(e) => StatementKind::Return(e.as_ref().map(|e| self.expr(e))),
            StatementKind::Throw(e) => StatementKind::Throw(self.expr(e)),
            StatementKind::If(if_) => {
                let cond = self.expr(&if_.cond);
                let then = self.scoped(|a| a.statement(&if_.then));
                let otherwise = if_
                    .otherwise
                    .as_ref()
                    .map(|s| self.scoped(|a| a.statement(s)));
                StatementKind::If(If {
                    cond,
                    then,
                    otherwise,
                })
            }
            StatementKind::Block(b) => StatementKind::Block(Arc::new(self.block(b))),
            StatementKind::Method(m) => match self.scope.current_class().cloned() {
                Some(owner) => StatementKind::Method(Arc::new(self.method_decl(m, &owner))),
                None => StatementKind::Method(m.clone()),
            },
            StatementKind::Class(c) => {
                let fqn: Arc<str> = match self.scope.current_class() {
                    Some(outer) => Arc::from(format!("{}.{}", outer, c.name)),
                    None => c.name.clone(),
                };
                StatementKind::Class(Arc::new(self.class_decl(c, fqn)))
            }
        };
        Arc::new(statement.with_kind(kind))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub(crate) fn expr(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        match &expr.kind {
            ExprKind::Ident(_) | ExprKind::FieldAccess(_) => self.name(expr, false).0,
            _ => self.compound(expr),
        }
    }

    fn typed(expr: &Expr, kind: ExprKind, ty: JavaType) -> Arc<Expr> {
        Arc::new(Expr {
            kind,
            ty,
            ..expr.clone()
        })
    }

    fn compound(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        match &expr.kind {
            ExprKind::Literal(lit) => Self::typed(expr, expr.kind.clone(), literal_type(lit)),
            ExprKind::Ident(_) | ExprKind::FieldAccess(_) => self.expr(expr),
            ExprKind::MethodInvocation(mi) => self.invocation(expr, mi),
            ExprKind::NewClass(nc) => {
                let class = self.type_tree(&nc.class);
                let args: Vec<Arc<Expr>> = nc.args.iter().map(|a| self.expr(a)).collect();
                let arg_types: Vec<JavaType> = args.iter().map(|a| a.ty.clone()).collect();
                let constructor = class
                    .ty
                    .fqn()
                    .and_then(|fqn| self.scope.classpath().find_constructor(fqn, &arg_types));
                let ty = class.ty.clone();
                Self::typed(
                    expr,
                    ExprKind::NewClass(NewClass {
                        class,
                        args,
                        constructor,
                    }),
                    ty,
                )
            }
            ExprKind::Binary(b) => {
                let left = self.expr(&b.left);
                let right = self.expr(&b.right);
                let ty = binary_type(b.op, &left.ty, &right.ty);
                Self::typed(
                    expr,
                    ExprKind::Binary(Binary {
                        op: b.op,
                        left,
                        right,
                    }),
                    ty,
                )
            }
            ExprKind::Unary(u) => {
                let operand = self.expr(&u.operand);
                let ty = match u.op {
                    UnaryOp::Not => JavaType::boolean(),
                    UnaryOp::Neg | UnaryOp::Plus => match primitive_of(&operand.ty) {
                        Some(p) => Primitive::promote(p, Primitive::Int)
                            .map(JavaType::Primitive)
                            .unwrap_or(JavaType::Unknown),
                        None => JavaType::Unknown,
                    },
                };
                Self::typed(expr, ExprKind::Unary(Unary { op: u.op, operand }), ty)
            }
            ExprKind::Parens(inner) => {
                let inner = self.expr(inner);
                let ty = inner.ty.clone();
                Self::typed(expr, ExprKind::Parens(inner), ty)
            }
            ExprKind::Ternary(t) => {
                let cond = self.expr(&t.cond);
                let then = self.expr(&t.then);
                let otherwise = self.expr(&t.otherwise);
                let ty = match (&then.ty, &otherwise.ty) {
                    (a, b) if a == b => a.clone(),
                    (JavaType::Null, other) | (other, JavaType::Null) => other.clone(),
                    (a, b) => match (primitive_of(a), primitive_of(b)) {
                        (Some(p), Some(q)) => Primitive::promote(p, q)
                            .map(JavaType::Primitive)
                            .unwrap_or_else(|| a.clone()),
                        _ => a.clone(),
                    },
                };
                Self::typed(
                    expr,
                    ExprKind::Ternary(Ternary {
                        cond,
                        then,
                        otherwise,
                    }),
                    ty,
                )
            }
            ExprKind::Cast(c) => {
                let class = self.type_tree(&c.class);
                let inner = self.expr(&c.expr);
                let ty = class.ty.clone();
                Self::typed(expr, ExprKind::Cast(Cast { class, expr: inner }), ty)
            }
            ExprKind::Assign(a) => {
                let target = self.expr(&a.target);
                let value = self.expr(&a.value);
                let ty = target.ty.clone();
                Self::typed(expr, ExprKind::Assign(Assign { target, value }), ty)
            }
            ExprKind::Lambda(l) => {
                let body = self.scoped(|a| {
                    for param in &l.params {
                        a.declare(param.clone(), JavaType::Unknown);
                    }
                    a.expr(&l.body)
                });
                Self::typed(
                    expr,
                    ExprKind::Lambda(Lambda {
                        body,
                        ..l.clone()
                    }),
                    JavaType::Unknown,
                )
            }
            ExprKind::ClassLiteral(tree) => {
                let tree = self.type_tree(tree);
                Self::typed(
                    expr,
                    ExprKind::ClassLiteral(tree),
                    JavaType::class("java.lang.Class"),
                )
            }
            ExprKind::Placeholder(index) => {
                let ty = self
                    .placeholders
                    .get(*index)
                    .cloned()
                    .unwrap_or(JavaType::Unknown);
                Self::typed(expr, expr.kind.clone(), ty)
            }
        }
    }

    /// Attributes an identifier or field access chain.
    ///
    /// In qualifier position a name that resolves to nothing may still be a
    /// package prefix; the decision is left to the enclosing access.
    fn name(&mut self, expr: &Arc<Expr>, qualifier: bool) -> (Arc<Expr>, Qualifier) {
        match &expr.kind {
            ExprKind::Ident(ident) => self.ident(expr, ident, qualifier),
            ExprKind::FieldAccess(fa) => self.field_access(expr, fa, qualifier),
            _ => (self.compound(expr), Qualifier::Value),
        }
    }

    fn ident(&mut self, expr: &Expr, ident: &Ident, qualifier: bool) -> (Arc<Expr>, Qualifier) {
        let bind = |symbol, ty| {
            Self::typed(
                expr,
                ExprKind::Ident(Ident {
                    name: ident.name.clone(),
                    symbol,
                }),
                ty,
            )
        };
        let name = &*ident.name;
        if name == "this" {
            let ty = self
                .scope
                .current_class()
                .map(|c| JavaType::Class(c.clone()))
                .unwrap_or(JavaType::Unknown);
            return (bind(Symbol::Local, ty), Qualifier::Value);
        }
        if let Some(ty) = self.lookup_local(name) {
            return (bind(Symbol::Local, ty.clone()), Qualifier::Value);
        }
        if let Some((owner, field)) = self.field_in_scope(name) {
            let symbol = Symbol::Field {
                owner,
                is_static: field.is_static,
            };
            return (bind(symbol, field.ty), Qualifier::Value);
        }
        if let Some(fqn) = self.scope.resolve(name) {
            return (bind(Symbol::Type, JavaType::Class(fqn)), Qualifier::Type);
        }
        if qualifier {
            return (bind(Symbol::Package, JavaType::Unknown), Qualifier::Package);
        }
        self.report.unresolved_symbol(name, expr.span.clone());
        (bind(Symbol::Unresolved, JavaType::Unknown), Qualifier::Value)
    }

    /// A field visible by simple name: declared on an enclosing class or its
    /// supertypes, or statically imported.
    fn field_in_scope(&self, name: &str) -> Option<(Arc<str>, FieldInfo)> {
        let classpath = self.scope.classpath();
        self.scope
            .enclosing()
            .iter()
            .rev()
            .find_map(|class| classpath.find_field(class, name))
            .or_else(|| {
                self.scope
                    .static_import_owners(name)
                    .iter()
                    .find_map(|owner| classpath.find_field(owner, name).filter(|(_, f)| f.is_static))
            })
    }

    fn field_access(
        &mut self,
        expr: &Expr,
        fa: &FieldAccess,
        qualifier: bool,
    ) -> (Arc<Expr>, Qualifier) {
        let (target, target_kind) = self.name(&fa.target, true);
        let bind = |target: Arc<Expr>, symbol, ty| {
            Self::typed(
                expr,
                ExprKind::FieldAccess(FieldAccess {
                    target,
                    name: fa.name.clone(),
                    symbol,
                }),
                ty,
            )
        };
        let classpath = self.scope.classpath();

        match target_kind {
            Qualifier::Value => {
                if target.ty.element().is_some() && &*fa.name == "length" {
                    let symbol = Symbol::Field {
                        owner: Arc::from("[]"),
                        is_static: false,
                    };
                    return (bind(target, symbol, JavaType::int()), Qualifier::Value);
                }
                if let Some(fqn) = target.ty.fqn()
                    && let Some((owner, field)) = classpath.find_field(fqn, &fa.name)
                {
                    let symbol = Symbol::Field {
                        owner,
                        is_static: field.is_static,
                    };
                    return (bind(target, symbol, field.ty), Qualifier::Value);
                }
            }
            Qualifier::Type => {
                if let Some(fqn) = target.ty.fqn() {
                    if let Some((owner, field)) = classpath.find_field(fqn, &fa.name) {
                        let symbol = Symbol::Field {
                            owner,
                            is_static: field.is_static,
                        };
                        return (bind(target, symbol, field.ty), Qualifier::Value);
                    }
                    if let Some(member) = self.scope.member_class(fqn, &fa.name) {
                        return (
                            bind(target, Symbol::Type, JavaType::Class(member)),
                            Qualifier::Type,
                        );
                    }
                }
            }
            Qualifier::Package => {
                if let Some(qualified) = expr.qualified_name()
                    && classpath.contains(&qualified)
                {
                    return (
                        bind(target, Symbol::Type, JavaType::class(qualified)),
                        Qualifier::Type,
                    );
                }
                if qualifier {
                    return (bind(target, Symbol::Package, JavaType::Unknown), Qualifier::Package);
                }
            }
        }

        let shown = expr.qualified_name().unwrap_or_else(|| fa.name.to_string());
        self.report.unresolved_symbol(&shown, expr.span.clone());
        (bind(target, Symbol::Unresolved, JavaType::Unknown), Qualifier::Value)
    }

    fn invocation(&mut self, expr: &Expr, mi: &MethodInvocation) -> Arc<Expr> {
        let select = mi.select.as_ref().map(|s| self.name(s, true));
        let args: Vec<Arc<Expr>> = mi.args.iter().map(|a| self.expr(a)).collect();
        let arg_types: Vec<JavaType> = args.iter().map(|a| a.ty.clone()).collect();
        let classpath = self.scope.classpath();

        let method_type = match &select {
            None => self
                .scope
                .enclosing()
                .iter()
                .rev()
                .find_map(|class| classpath.find_method(class, &mi.name, &arg_types))
                .or_else(|| {
                    self.scope
                        .static_import_owners(&mi.name)
                        .iter()
                        .find_map(|owner| classpath.find_method(owner, &mi.name, &arg_types))
                }),
            Some((target, _)) => match &target.ty {
                JavaType::Class(fqn) => classpath.find_method(fqn, &mi.name, &arg_types),
                JavaType::Array(_) => classpath.find_method(OBJECT, &mi.name, &arg_types),
                _ => None,
            },
        };

        // A package-only qualifier never names a receiver.
        let select = select.map(|(target, kind)| {
            if kind == Qualifier::Package {
                let shown = target.qualified_name().unwrap_or_default();
                self.report.unresolved_symbol(&shown, target.span.clone());
            }
            target
        });

        let ty = match &method_type {
            Some(m) => m.ret.clone(),
            None => {
                trace!(method = %mi.name, "Unresolved invocation");
                self.report.unresolved_method(&mi.name, expr.span.clone());
                JavaType::Unknown
            }
        };
        Self::typed(
            expr,
            ExprKind::MethodInvocation(MethodInvocation {
                select,
                name: mi.name.clone(),
                args,
                method_type,
                wrap: mi.wrap,
            }),
            ty,
        )
    }
}

fn literal_type(lit: &Literal) -> JavaType {
    match &lit.value {
        LiteralValue::Null => JavaType::Null,
        LiteralValue::Bool(_) => JavaType::boolean(),
        LiteralValue::Int(_) => JavaType::int(),
        LiteralValue::Long(_) => JavaType::Primitive(Primitive::Long),
        LiteralValue::Float(_) if lit.raw.ends_with(['f', 'F']) => {
            JavaType::Primitive(Primitive::Float)
        }
        LiteralValue::Float(_) => JavaType::Primitive(Primitive::Double),
        LiteralValue::Char(_) => JavaType::Primitive(Primitive::Char),
        LiteralValue::String(_) => JavaType::string(),
    }
}

/// The primitive a type denotes or unboxes to.
fn primitive_of(ty: &JavaType) -> Option<Primitive> {
    match ty {
        JavaType::Primitive(p) => Some(*p),
        JavaType::Class(fqn) => Some(match &**fqn {
            "java.lang.Integer" => Primitive::Int,
            "java.lang.Long" => Primitive::Long,
            "java.lang.Short" => Primitive::Short,
            "java.lang.Byte" => Primitive::Byte,
            "java.lang.Character" => Primitive::Char,
            "java.lang.Float" => Primitive::Float,
            "java.lang.Double" => Primitive::Double,
            "java.lang.Boolean" => Primitive::Boolean,
            _ => return None,
        }),
        _ => None,
    }
}

fn binary_type(op: BinaryOp, left: &JavaType, right: &JavaType) -> JavaType {
    match op {
        BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::Le
        | BinaryOp::Ge
        | BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::And
        | BinaryOp::Or => JavaType::boolean(),
        BinaryOp::Add if left.is_of_class("java.lang.String") || right.is_of_class("java.lang.String") => {
            JavaType::string()
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            match (primitive_of(left), primitive_of(right)) {
                (Some(a), Some(b)) => Primitive::promote(a, b)
                    .map(JavaType::Primitive)
                    .unwrap_or(JavaType::Unknown),
                _ => JavaType::Unknown,
            }
        }
    }
}

#[cfg(test)]
mod attribution_test;
