use std::sync::Arc;

use tracing::trace;

use crate::errors::TemplateError;
use crate::recipe::{Recipe, RecipeDescriptor};
use crate::search::Precondition;
use crate::template::JavaTemplate;
use crate::tree::{Expr, ExprKind, Symbol};
use crate::visitor::{JavaVisitor, VisitContext, super_field_access};

/// Replaces reads of the static field `owner.field` with an expression
/// template taking no arguments, whether written qualified or through a
/// static import.
///
/// ```
/// use rewrite_apache_core::recipe::ReplaceConstant;
/// use rewrite_apache_core::template::JavaTemplate;
///
/// let template = JavaTemplate::builder("StandardCharsets.UTF_8")
///     .imports(&["java.nio.charset.StandardCharsets"])
///     .build()
///     .unwrap();
/// let recipe = ReplaceConstant::new("org.apache.commons.io.Charsets", "UTF_8", template).unwrap();
/// assert_eq!(recipe.field(), "UTF_8");
/// ```
#[derive(Debug, Clone)]
pub struct ReplaceConstant {
    owner: Arc<str>,
    field: Arc<str>,
    template: JavaTemplate,
}

impl ReplaceConstant {
    pub fn new(owner: &str, field: &str, template: JavaTemplate) -> Result<Self, TemplateError> {
        if template.arity() != 0 {
            return Err(TemplateError::ArgumentCount {
                expected: 0,
                actual: template.arity(),
            });
        }
        Ok(Self {
            owner: Arc::from(owner),
            field: Arc::from(field),
            template,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Recipe for ReplaceConstant {
    fn descriptor(&self) -> RecipeDescriptor {
        RecipeDescriptor::new(
            "rewrite.ReplaceConstant",
            "Replace constant",
            format!(
                "Replace `{}.{}` with `{}`.",
                self.owner,
                self.field,
                self.template.code()
            ),
        )
    }

    fn precondition(&self) -> Precondition {
        Precondition::uses_type(&self.owner)
    }

    fn visitor(&self) -> Box<dyn JavaVisitor> {
        Box::new(ReplaceConstantVisitor {
            recipe: self.clone(),
        })
    }
}

struct ReplaceConstantVisitor {
    recipe: ReplaceConstant,
}

impl ReplaceConstantVisitor {
    fn reads_constant(&self, expr: &Expr) -> bool {
        let (name, symbol) = match &expr.kind {
            ExprKind::Ident(ident) => (&ident.name, &ident.symbol),
            ExprKind::FieldAccess(fa) => (&fa.name, &fa.symbol),
            _ => return false,
        };
        *name == self.recipe.field
            && matches!(
                symbol,
                Symbol::Field { owner, is_static: true } if *owner == self.recipe.owner
            )
    }

    fn replace(&self, expr: Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        if !self.reads_constant(&expr) {
            return expr;
        }
        let replaced = self.recipe.template.replace(ctx, &expr, &[]);
        if Arc::ptr_eq(&replaced, &expr) {
            return expr;
        }
        trace!(owner = %self.recipe.owner, field = %self.recipe.field, "Replacing constant");
        for import in self.recipe.template.imports() {
            if import.is_static {
                ctx.maybe_add_static_import(import.container(), import.member());
            } else {
                ctx.maybe_add_import(&import.name);
            }
        }
        ctx.maybe_remove_import(&self.recipe.owner);
        replaced
    }
}

impl JavaVisitor for ReplaceConstantVisitor {
    fn visit_ident(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        self.replace(expr.clone(), ctx)
    }

    fn visit_field_access(&mut self, expr: &Arc<Expr>, ctx: &mut VisitContext<'_>) -> Arc<Expr> {
        let expr = super_field_access(self, expr, ctx);
        self.replace(expr, ctx)
    }
}
