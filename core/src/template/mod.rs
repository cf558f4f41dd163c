//! Java snippets with typed holes, compiled against the tree being rewritten.
//!
//! ```
//! use rewrite_apache_core::template::JavaTemplate;
//!
//! let template = JavaTemplate::builder("#{s:any(java.lang.String)} == null || #{s}.isEmpty()")
//!     .build()
//!     .unwrap();
//! assert_eq!(template.arity(), 1);
//! ```
//!
//! A template is parsed when applied, after the argument trees are known:
//! placeholders become typed holes, the snippet is attributed in the scope
//! of the coordinates and the holes are then filled with the arguments
//! themselves. Any failure leaves the tree alone; see [`TemplateError`].

mod coordinates;
mod placeholder;
mod substitute;

use std::sync::Arc;

use tracing::{trace, warn};

use crate::attribution::Attributor;
use crate::classpath::{Classpath, TypeScope, unit_classes};
use crate::errors::TemplateError;
use crate::matcher::RepeatableArgumentMatcher;
use crate::parser::{Fragment, parse_fragment};
use crate::printer::print_expr;
use crate::tree::{Comment, Expr, ExprKind, Import, JavaType, NodeId, Tree};
use crate::visitor::VisitContext;

pub use coordinates::Coordinates;
use placeholder::{Piece, Placeholders, SlotKind};
use substitute::{Filler, has_child, parenthesize, required_precedence};

/// What fills a placeholder.
#[derive(Debug, Clone)]
pub enum TemplateArg {
    Tree(Arc<Expr>),
    /// Source text for a `#{}` slot.
    Text(String),
}

impl From<Arc<Expr>> for TemplateArg {
    fn from(expr: Arc<Expr>) -> Self {
        TemplateArg::Tree(expr)
    }
}

impl From<&Arc<Expr>> for TemplateArg {
    fn from(expr: &Arc<Expr>) -> Self {
        TemplateArg::Tree(expr.clone())
    }
}

impl From<String> for TemplateArg {
    fn from(text: String) -> Self {
        TemplateArg::Text(text)
    }
}

impl From<&str> for TemplateArg {
    fn from(text: &str) -> Self {
        TemplateArg::Text(text.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct JavaTemplate {
    code: Arc<str>,
    placeholders: Placeholders,
    imports: Vec<Import>,
    context_sensitive: bool,
    skip_type_validation: bool,
    flag_duplication: Option<Arc<str>>,
}

#[derive(Debug, Clone)]
pub struct JavaTemplateBuilder {
    code: String,
    imports: Vec<Import>,
    context_sensitive: bool,
    skip_type_validation: bool,
    flag_duplication: Option<Arc<str>>,
}

impl JavaTemplateBuilder {
    /// Types the snippet may name by simple name.
    pub fn imports(mut self, fqns: &[&str]) -> Self {
        self.imports.extend(fqns.iter().map(|fqn| Import::new(*fqn)));
        self
    }

    /// `owner.member` static members the snippet may call unqualified.
    pub fn static_imports(mut self, members: &[&str]) -> Self {
        self.imports.extend(members.iter().map(|member| Import {
            is_static: true,
            name: Arc::from(*member),
        }));
        self
    }

    /// Resolve names against the enclosing classes and the local variables
    /// visible at the coordinates.
    pub fn context_sensitive(mut self) -> Self {
        self.context_sensitive = true;
        self
    }

    pub fn skip_type_validation(mut self) -> Self {
        self.skip_type_validation = true;
        self
    }

    /// Allow side-effecting arguments in repeated slots; the output carries
    /// `comment` for a reviewer.
    pub fn flag_duplication(mut self, comment: &str) -> Self {
        self.flag_duplication = Some(Arc::from(comment));
        self
    }

    pub fn build(self) -> Result<JavaTemplate, TemplateError> {
        let placeholders = Placeholders::scan(&self.code)?;
        Ok(JavaTemplate {
            code: Arc::from(self.code),
            placeholders,
            imports: self.imports,
            context_sensitive: self.context_sensitive,
            skip_type_validation: self.skip_type_validation,
            flag_duplication: self.flag_duplication,
        })
    }
}

impl JavaTemplate {
    pub fn builder(code: &str) -> JavaTemplateBuilder {
        JavaTemplateBuilder {
            code: code.to_string(),
            imports: Vec::new(),
            context_sensitive: false,
            skip_type_validation: false,
            flag_duplication: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Imports the snippet was compiled with; the caller adds those the
    /// output ends up using.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Number of arguments `apply` expects.
    pub fn arity(&self) -> usize {
        self.placeholders.slots.len()
    }

    /// Compiles the template at `coordinates` with `args` and returns the
    /// new tree. The caller splices it in and maintains imports.
    pub fn apply(
        &self,
        ctx: &VisitContext<'_>,
        coordinates: Coordinates,
        args: &[TemplateArg],
    ) -> Result<Tree, TemplateError> {
        let slots = &self.placeholders.slots;
        if args.len() != slots.len() {
            return Err(TemplateError::ArgumentCount {
                expected: slots.len(),
                actual: args.len(),
            });
        }

        let mut types = Vec::with_capacity(slots.len());
        let mut trees: Vec<Option<Arc<Expr>>> = Vec::with_capacity(slots.len());
        let mut raw: Vec<Option<String>> = Vec::with_capacity(slots.len());
        for (index, (slot, arg)) in slots.iter().zip(args).enumerate() {
            match (&slot.kind, arg) {
                (SlotKind::Raw, TemplateArg::Text(text)) => {
                    types.push(JavaType::Unknown);
                    trees.push(None);
                    raw.push(Some(text.clone()));
                }
                (SlotKind::Raw, TemplateArg::Tree(expr)) => {
                    types.push(JavaType::Unknown);
                    trees.push(None);
                    raw.push(Some(print_expr(expr)));
                }
                (SlotKind::Tree(_), TemplateArg::Text(_)) => {
                    return Err(TemplateError::ArgumentKind {
                        index,
                        expected: "an expression",
                    });
                }
                (SlotKind::Tree(expected), TemplateArg::Tree(expr)) => {
                    let ty = match expected {
                        Some(expected) => {
                            if !self.skip_type_validation
                                && !ctx.classpath().is_assignable(&expr.ty, expected)
                            {
                                return Err(TemplateError::ArgumentType {
                                    index,
                                    expected: expected.to_string(),
                                    actual: expr.ty.to_string(),
                                });
                            }
                            expected.clone()
                        }
                        None => expr.ty.clone(),
                    };
                    types.push(ty);
                    trees.push(Some(expr.clone()));
                    raw.push(None);
                }
            }
        }

        let flag = self.check_duplication(&trees, &types, ctx.classpath())?;

        let mut source = String::with_capacity(self.code.len());
        for piece in &self.placeholders.pieces {
            match piece {
                Piece::Text(text) => source.push_str(text),
                Piece::Slot(index) => match &raw[*index] {
                    Some(text) => source.push_str(text),
                    None => source.push_str(&format!("#{{{}}}", index)),
                },
            }
        }
        trace!(template = %self.code, source, "Compiling template");
        let fragment = parse_fragment(&source, coordinates.fragment_kind()?)?;

        // The template's own imports shadow the unit's on a simple name clash.
        let unit = ctx.unit();
        let mut imports = self.imports.clone();
        imports.extend(unit.imports.iter().cloned());
        let mut scope = TypeScope::new(
            ctx.classpath(),
            unit.package.as_deref(),
            &imports,
            unit_classes(unit),
        );
        if self.context_sensitive {
            scope = scope.within(&ctx.cursor.enclosing_class_names());
        }
        let mut attributor = Attributor::new(scope, &types);
        if self.context_sensitive {
            attributor.declare_locals(ctx.cursor.visible_locals());
        }
        let fragment = match fragment {
            Fragment::Expression(expr) => Fragment::Expression(attributor.expr(&expr)),
            Fragment::Statements(statements) => Fragment::Statements(
                statements.iter().map(|s| attributor.statement(s)).collect(),
            ),
            Fragment::Arguments(args) => {
                Fragment::Arguments(args.iter().map(|a| attributor.expr(a)).collect())
            }
        };
        let report = attributor.into_report();
        if !report.is_clean() {
            return Err(TemplateError::Unresolved(
                report.unresolved_names().into_iter().map(String::from).collect(),
            ));
        }

        let filler = Filler { args: &trees };
        match (coordinates, fragment) {
            (Coordinates::Replace(Tree::Expr(target)), Fragment::Expression(expr)) => {
                let required = parent_of(ctx, target.id)
                    .map(|parent| required_precedence(parent, target.id))
                    .unwrap_or(0);
                let filled = parenthesize(filler.expr(&expr, 0), required);
                let mut comments = target.comments.clone();
                comments.extend(flag);
                if comments.is_empty() {
                    return Ok(Tree::Expr(filled));
                }
                let mut outer = Expr::clone(&filled);
                comments.extend(outer.comments);
                outer.comments = comments;
                Ok(Tree::Expr(Arc::new(outer)))
            }
            (Coordinates::Replace(Tree::Statement(target)), Fragment::Statements(statements)) => {
                let [statement] = statements.as_slice() else {
                    return Err(TemplateError::Coordinates(
                        "a statement must be replaced by exactly one statement",
                    ));
                };
                let filled = filler.statement(statement);
                let mut replaced = target.with_kind(filled.kind.clone());
                replaced.comments.extend(filled.comments.iter().cloned());
                replaced.comments.extend(flag);
                Ok(Tree::Statement(Arc::new(replaced)))
            }
            (Coordinates::ReplaceArguments(call), Fragment::Arguments(args)) => {
                let args = filler.exprs(&args);
                let mut rebound = self.rebind(ctx, &call, args)?;
                rebound.comments.extend(flag);
                Ok(Tree::Expr(Arc::new(rebound)))
            }
            (coordinates, Fragment::Statements(statements)) => {
                let statements = statements.iter().map(|s| filler.statement(s)).collect();
                coordinates::insert(&coordinates, statements, flag).map(Tree::Block)
            }
            _ => Err(TemplateError::Coordinates("fragment does not fit the coordinates")),
        }
    }

    /// Applies an expression template in place of `expr`. On failure the
    /// error is logged and `expr` comes back unchanged.
    pub fn replace(
        &self,
        ctx: &VisitContext<'_>,
        expr: &Arc<Expr>,
        args: &[TemplateArg],
    ) -> Arc<Expr> {
        match self.apply(ctx, Coordinates::replace(expr), args) {
            Ok(Tree::Expr(replaced)) => replaced,
            Ok(_) => expr.clone(),
            Err(err) => {
                warn!(template = %self.code, error = %err, "Template skipped");
                expr.clone()
            }
        }
    }

    /// Refuses an opaque argument in a slot used more than once, or turns it
    /// into the review comment when duplication is flagged.
    fn check_duplication(
        &self,
        trees: &[Option<Arc<Expr>>],
        types: &[JavaType],
        classpath: &Classpath,
    ) -> Result<Option<Comment>, TemplateError> {
        let mut flag = None;
        for (index, tree) in trees.iter().enumerate() {
            let Some(tree) = tree else { continue };
            if self.placeholders.occurrences(index) < 2 {
                continue;
            }
            let class = RepeatableArgumentMatcher::new(types[index].clone()).classify(tree, classpath);
            if class.is_repeatable() {
                continue;
            }
            match &self.flag_duplication {
                Some(comment) => flag = Some(Comment::new(comment.clone())),
                None => return Err(TemplateError::UnsafeDuplication(index)),
            }
        }
        Ok(flag)
    }

    /// `call` with `args` in place of its arguments, bound to the overload
    /// those arguments select.
    fn rebind(
        &self,
        ctx: &VisitContext<'_>,
        call: &Expr,
        args: Vec<Arc<Expr>>,
    ) -> Result<Expr, TemplateError> {
        let arg_types: Vec<JavaType> = args.iter().map(|a| a.ty.clone()).collect();
        let classpath = ctx.classpath();
        match &call.kind {
            ExprKind::MethodInvocation(mi) => {
                let owner = mi
                    .select
                    .as_ref()
                    .and_then(|s| s.ty.fqn().map(str::to_string))
                    .or_else(|| mi.method_type.as_ref().map(|m| m.declaring.to_string()));
                let method_type = owner
                    .and_then(|owner| classpath.find_method(&owner, &mi.name, &arg_types));
                let ty = method_type
                    .as_ref()
                    .map(|m| m.ret.clone())
                    .unwrap_or_else(|| call.ty.clone());
                let mut mi = mi.clone();
                mi.args = args;
                mi.method_type = method_type;
                Ok(Expr {
                    ty,
                    ..call.with_kind(ExprKind::MethodInvocation(mi))
                })
            }
            ExprKind::NewClass(nc) => {
                let mut nc = nc.clone();
                nc.constructor = nc
                    .class
                    .ty
                    .fqn()
                    .and_then(|owner| classpath.find_constructor(owner, &arg_types));
                nc.args = args;
                Ok(call.with_kind(ExprKind::NewClass(nc)))
            }
            _ => Err(TemplateError::Coordinates("arguments belong to a call or `new`")),
        }
    }
}

/// The expression that holds node `id`, looked up on the cursor. A node
/// built during the visit is taken to sit under the node being visited, or
/// in its place.
fn parent_of<'c>(ctx: &'c VisitContext<'_>, id: NodeId) -> Option<&'c Expr> {
    let mut ancestors = ctx.cursor.ancestors().peekable();
    while let Some(tree) = ancestors.next() {
        if tree.as_expr().is_some_and(|e| e.id == id) {
            return ancestors.peek().and_then(|t| t.as_expr()).map(|e| &**e);
        }
    }
    match ctx.cursor.value() {
        Some(Tree::Expr(current)) if has_child(current, id) => Some(current),
        Some(Tree::Expr(_)) => ctx.cursor.parent().and_then(Tree::as_expr).map(|e| &**e),
        _ => None,
    }
}
